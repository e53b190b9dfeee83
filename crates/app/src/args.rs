pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cfile")]
#[command(about = "Keep IPFS file pointers on a confidential ledger and reveal them on demand")]
pub struct Args {
    /// Path to the cipherfile config directory (defaults to ~/.cipherfile)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
