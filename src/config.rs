use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rdelta", version, about = "Block-level binary signatures and deltas", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress non-error messages
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the block signature of a target file
    Signature {
        /// File to sign
        target: PathBuf,
        /// Where to write the signature (must not exist)
        output: PathBuf,
        /// Block size in bytes; derived from the file size when omitted
        #[arg(short, long)]
        block_size: Option<u64>,
    },
    /// Compute the delta from a signature to a source file
    Delta {
        /// Signature of the file the receiver currently holds
        signature: PathBuf,
        /// File the receiver should end up with
        source: PathBuf,
        /// Where to write the delta (must not exist)
        output: PathBuf,
    },
}
