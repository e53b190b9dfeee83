//! Integration tests for reading an account's records while writes race the read

mod common;

use ::common::collaborators::LocalSigner;
use ::common::crypto::SecretKey;
use ::common::devnet::Devnet;
use ::common::protocol::{ClientConfig, RecordClient};
use ::common::record::{RecordStore, RecordStoreError};

fn client_over<S: RecordStore>(
    store: S,
    key: &SecretKey,
) -> RecordClient<S, Devnet, Devnet, LocalSigner> {
    let devnet = Devnet::new(common::CHAIN_ID, common::contract());
    RecordClient::new(
        store,
        devnet.clone(),
        devnet,
        LocalSigner::new(key.clone()),
        ClientConfig::new(common::contract()),
    )
}

#[tokio::test]
async fn test_empty_listing() {
    let (client, _devnet, _key) = common::setup_test_env();

    let listing = client.list_records().await.unwrap();
    assert!(listing.entries.is_empty());
    assert_eq!(listing.initial_count, 0);
    assert!(!listing.drifted());
}

#[tokio::test]
async fn test_listing_in_submission_order() {
    let (client, _devnet, _key) = common::setup_test_env();
    for name in ["a.txt", "b.txt", "c.txt"] {
        client.submit_file(name, name.as_bytes().to_vec()).await.unwrap();
    }

    let listing = client.list_records().await.unwrap();
    let names: Vec<_> = listing.entries.iter().map(|e| e.record.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    let indices: Vec<_> = listing.entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(listing.entries.iter().all(|e| e.cid.is_none()));
    assert!(!listing.drifted());
}

#[tokio::test]
async fn test_write_racing_listing() {
    let key = SecretKey::generate();
    let store = common::RacingStore::new(2);
    store.seed(key.address(), &["one", "two", "three"]).await;
    let client = client_over(store, &key);

    let listing = client.list_records().await.unwrap();

    // no index skipped, none seen twice, in order
    let indices: Vec<_> = listing.entries.iter().map(|e| e.index).collect();
    let expected: Vec<_> = (0..listing.entries.len() as u64).collect();
    assert_eq!(indices, expected);

    // the records present at count time were all read
    assert_eq!(listing.initial_count, 3);
    assert_eq!(listing.entries.len(), 3);

    // the concurrent appends show up as drift, not as an error
    assert_eq!(listing.final_count, 5);
    assert!(listing.drifted());

    // a fresh read sees everything
    let listing = client.list_records().await.unwrap();
    assert_eq!(listing.entries.len(), 5);
    assert!(!listing.drifted());
}

#[tokio::test]
async fn test_concurrent_submissions_get_distinct_indices() {
    let (client, devnet, key) = common::setup_test_env();
    let other = common::client_for(&devnet, &key);

    let (a, b) = tokio::join!(
        client.submit_file("left", b"left".to_vec()),
        other.submit_file("right", b"right".to_vec())
    );
    let (a, _) = a.unwrap();
    let (b, _) = b.unwrap();
    assert_ne!(a, b);

    let listing = client.list_records().await.unwrap();
    assert_eq!(listing.entries.len(), 2);
}

#[tokio::test]
async fn test_records_vanishing_mid_listing() {
    let key = SecretKey::generate();
    let store = common::ShrinkingStore::new(1);
    store.seed(key.address(), &["one", "two", "three"]).await;
    let client = client_over(store, &key);

    let listing = client.list_records().await.unwrap();

    assert_eq!(listing.initial_count, 3);
    assert_eq!(listing.entries.len(), 1);
    assert_eq!(listing.entries[0].record.name, "one");
    assert!(listing.drifted());
}

#[tokio::test]
async fn test_inflated_count_is_not_trusted() {
    let key = SecretKey::generate();
    let store = common::ShrinkingStore::new(0).reporting_count(u64::MAX);
    let client = client_over(store.clone(), &key);

    let listing = client.list_records().await.unwrap();
    assert_eq!(listing.initial_count, u64::MAX);
    assert!(listing.entries.is_empty());
    assert!(listing.drifted());

    assert!(matches!(
        store.names(key.address()).await,
        Err(RecordStoreError::IndexOutOfRange { index: 0, .. })
    ));
}
