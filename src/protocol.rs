use crate::delta::block_level::{Block, Operation};
use crate::{RdeltaError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// First bytes of a signature file.
pub const SIGNATURE_MAGIC: [u8; 4] = *b"RDSG";
/// First bytes of a delta file.
pub const DELTA_MAGIC: [u8; 4] = *b"RDDT";
/// Bumped on any incompatible container change.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk signature container. Carries the block size so the delta side
/// needs no out-of-band agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureFile {
    pub version: u32,
    pub block_size: u64,
    pub blocks: Vec<Block>,
}

/// On-disk delta container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaFile {
    pub version: u32,
    pub operations: Vec<Operation>,
}

impl SignatureFile {
    pub fn new(block_size: u64, blocks: Vec<Block>) -> Self {
        Self {
            version: FORMAT_VERSION,
            block_size,
            blocks,
        }
    }
}

impl DeltaFile {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            version: FORMAT_VERSION,
            operations,
        }
    }
}

pub fn write_signature<W: Write>(mut output: W, signature: &SignatureFile) -> Result<()> {
    output.write_all(&SIGNATURE_MAGIC)?;
    bincode::serialize_into(&mut output, signature)?;
    output.flush()?;
    Ok(())
}

pub fn read_signature<R: Read>(mut input: R) -> Result<SignatureFile> {
    check_magic(&mut input, &SIGNATURE_MAGIC, "signature")?;
    let signature: SignatureFile = bincode::deserialize_from(&mut input)?;
    check_version(signature.version)?;
    Ok(signature)
}

pub fn write_delta<W: Write>(mut output: W, delta: &DeltaFile) -> Result<()> {
    output.write_all(&DELTA_MAGIC)?;
    bincode::serialize_into(&mut output, delta)?;
    output.flush()?;
    Ok(())
}

pub fn read_delta<R: Read>(mut input: R) -> Result<DeltaFile> {
    check_magic(&mut input, &DELTA_MAGIC, "delta")?;
    let delta: DeltaFile = bincode::deserialize_from(&mut input)?;
    check_version(delta.version)?;
    Ok(delta)
}

fn check_magic<R: Read>(input: &mut R, expected: &[u8; 4], kind: &str) -> Result<()> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if &magic != expected {
        return Err(RdeltaError::Format(format!("not a {} file", kind)));
    }
    Ok(())
}

fn check_version(version: u32) -> Result<()> {
    if version != FORMAT_VERSION {
        return Err(RdeltaError::Format(format!(
            "unsupported format version {}",
            version
        )));
    }
    Ok(())
}
