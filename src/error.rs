use thiserror::Error;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum RdeltaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("rolling hash window is empty; write_all must precede roll")]
    EmptyWindow,

    #[error("block size {block_size} cannot split a {file_size} byte target into at least 2 chunks")]
    InvalidBlockSize { block_size: u64, file_size: u64 },

    #[error("output file already exists: {0}")]
    OutputExists(PathBuf),

    #[error("container format error: {0}")]
    Format(String),
}
