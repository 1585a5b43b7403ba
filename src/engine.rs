use crate::delta::block_level::Differ;
use crate::delta::strong::Blake3;
use crate::protocol::{self, DeltaFile, SignatureFile};
use crate::{RdeltaError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;
use tracing::{debug, info};

/// Block size used when none is given and the target is small.
pub const DEFAULT_BLOCK_SIZE: u64 = 700;
/// Upper bound for dynamically chosen block sizes.
pub const MAX_BLOCK_SIZE: u64 = 131072;

/// File-level wrapper around the block differ: resolves the block-size
/// policy, owns the file handles, and reads and writes the on-disk
/// containers.
pub struct Engine {
    block_size: Option<u64>,
}

impl Engine {
    /// `block_size: None` selects a size from the target length.
    pub fn new(block_size: Option<u64>) -> Self {
        Self { block_size }
    }

    /// Compute the signature of `target` and write it to `output`, which
    /// must not already exist.
    pub fn signature(&self, target: &Path, output: &Path) -> Result<()> {
        let target_file = File::open(target)?;
        let file_size = target_file.metadata()?.len();
        let block_size = self.resolve_block_size(file_size)?;
        debug!(
            "Signing {:?} ({} bytes) with block size {}",
            target, file_size, block_size
        );

        let mut reader = BufReader::new(target_file);
        let mut differ = Differ::new(block_size as usize, Blake3::new());
        let blocks = differ.compute_signature(&mut reader)?;
        info!("Computed {} block signatures", blocks.len());

        let out = create_new(output)?;
        protocol::write_signature(BufWriter::new(out), &SignatureFile::new(block_size, blocks))
    }

    /// Compute the delta that turns the signed target into `source` and
    /// write it to `output`, which must not already exist.
    pub fn delta(&self, signature: &Path, source: &Path, output: &Path) -> Result<()> {
        let sig = protocol::read_signature(BufReader::new(File::open(signature)?))?;
        debug!(
            "Loaded signature: {} blocks of {} bytes",
            sig.blocks.len(),
            sig.block_size
        );

        let mut reader = BufReader::new(File::open(source)?);
        let mut differ = Differ::new(sig.block_size as usize, Blake3::new());
        let operations = differ.compute_delta(&mut reader, &sig.blocks)?;
        info!("Computed delta with {} operations", operations.len());

        let out = create_new(output)?;
        protocol::write_delta(BufWriter::new(out), &DeltaFile::new(operations))
    }

    /// An explicit block size must split the target into at least two
    /// chunks; a dynamic one falls back to half the file when the
    /// heuristic result cannot.
    fn resolve_block_size(&self, file_size: u64) -> Result<u64> {
        match self.block_size {
            Some(block_size) => {
                if block_size == 0 || chunk_count(file_size, block_size) < 2 {
                    return Err(RdeltaError::InvalidBlockSize {
                        block_size,
                        file_size,
                    });
                }
                Ok(block_size)
            }
            None => {
                let mut block_size = dynamic_block_size(file_size);
                if chunk_count(file_size, block_size) < 2 {
                    block_size = file_size / 2;
                }
                if block_size == 0 || chunk_count(file_size, block_size) < 2 {
                    return Err(RdeltaError::InvalidBlockSize {
                        block_size,
                        file_size,
                    });
                }
                Ok(block_size)
            }
        }
    }
}

/// Block size for a target when none was requested: 700 for small files,
/// otherwise a multiple of 8 near the square root of the file size,
/// assembled greedily from power-of-two components and clamped so the
/// largest possible result is 131064. E.g. 10_000_000 -> 3160.
pub fn dynamic_block_size(file_size: u64) -> u64 {
    if file_size <= DEFAULT_BLOCK_SIZE * DEFAULT_BLOCK_SIZE {
        return DEFAULT_BLOCK_SIZE;
    }

    // Leading power-of-two component, roughly 2^ceil(log4(file_size)).
    let mut component = 1u64;
    let mut remaining = file_size;
    loop {
        remaining >>= 2;
        if remaining == 0 {
            break;
        }
        component <<= 1;
    }
    if component >= MAX_BLOCK_SIZE {
        component = MAX_BLOCK_SIZE >> 1;
    }

    // Keep any component that does not push the square past the file
    // size; stopping at 8 rounds the result to a multiple of 8.
    let mut block_size = 0u64;
    while component >= 8 {
        block_size |= component;
        if file_size < block_size * block_size {
            block_size &= !component;
        }
        component >>= 1;
    }

    block_size.max(DEFAULT_BLOCK_SIZE)
}

fn chunk_count(file_size: u64, block_size: u64) -> u64 {
    file_size.div_ceil(block_size)
}

fn create_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                RdeltaError::OutputExists(path.to_path_buf())
            } else {
                RdeltaError::Io(e)
            }
        })
}
