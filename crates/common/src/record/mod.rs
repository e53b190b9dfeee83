//! The ledger boundary: where encrypted records live
//!
//! The ledger itself is external. [`RecordStore`] is the shape this crate
//! expects of it; [`MemoryRecordStore`] is the in-process provider.

mod memory;
mod provider;
mod types;

pub use memory::{LedgerSnapshot, MemoryRecordStore, MemoryRecordStoreError};
pub use provider::{RecordStore, RecordStoreError};
pub use types::{Binding, EncryptedInput, Handle, Record, HANDLE_SIZE};
