use crate::delta::rolling::RollingAdler32;
use crate::delta::strong::StrongHasher;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{ErrorKind, Read};

/// Signature of a single target block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Rolling Adler-32 of the block bytes.
    pub weak: u32,
    /// Strong digest of the block bytes.
    pub strong: Vec<u8>,
}

/// One instruction of a delta. Applied in order against the target's
/// blocks, the sequence rebuilds the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Target block `index` appears unchanged in the source.
    Keep { index: u32 },
    /// Target block `index` appears in the source, preceded by literal
    /// bytes that match no block.
    Update { index: u32, data: Vec<u8> },
    /// Target block `index` has no match anywhere in the source.
    Remove { index: u32 },
    /// Trailing literal bytes at the end of the source.
    New { data: Vec<u8> },
}

struct Candidate {
    strong: Vec<u8>,
    index: u32,
}

/// Lookup from weak hash to the target blocks carrying it, in target
/// order. Entries are consumed on a confirmed match so duplicated target
/// blocks bind to source occurrences lowest index first.
struct BlockIndex {
    buckets: HashMap<u32, Vec<Candidate>>,
}

impl BlockIndex {
    fn build(blocks: &[Block]) -> Self {
        let mut buckets: HashMap<u32, Vec<Candidate>> = HashMap::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            buckets.entry(block.weak).or_default().push(Candidate {
                strong: block.strong.clone(),
                index: i as u32,
            });
        }
        Self { buckets }
    }

    /// Cheap pre-check so the strong hash is only computed on weak hits.
    fn contains(&self, weak: u32) -> bool {
        self.buckets.contains_key(&weak)
    }

    /// Remove and return the first candidate under `weak` whose strong
    /// digest matches.
    fn take_match(&mut self, weak: u32, strong: &[u8]) -> Option<u32> {
        let bucket = self.buckets.get_mut(&weak)?;
        let pos = bucket.iter().position(|c| c.strong == strong)?;
        Some(bucket.remove(pos).index)
    }
}

/// Signature and delta builder over fixed-size blocks.
///
/// Bundles the block size with one rolling hash and one strong hash; both
/// are reset at the top of each call, so a single instance can serve any
/// number of invocations.
pub struct Differ<S: StrongHasher> {
    block_size: usize,
    weak: RollingAdler32,
    strong: S,
}

impl<S: StrongHasher> Differ<S> {
    pub fn new(block_size: usize, strong: S) -> Self {
        Self {
            block_size,
            weak: RollingAdler32::new(),
            strong,
        }
    }

    /// Split `target` into `block_size` chunks (the last possibly
    /// shorter) and emit the weak and strong hash of each.
    pub fn compute_signature<R: Read>(&mut self, target: &mut R) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut buf = vec![0u8; self.block_size];
        self.weak.reset();
        loop {
            let n = read_full(target, &mut buf)?;
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];
            self.strong.reset();
            self.strong.update(chunk);
            self.weak.write_all(chunk);
            blocks.push(Block {
                weak: self.weak.sum32(),
                strong: self.strong.finalize(),
            });
        }
        Ok(blocks)
    }

    /// Stream `source` against the target's block list and emit the
    /// ordered operation list that rebuilds the source from the target.
    pub fn compute_delta<R: Read>(
        &mut self,
        source: &mut R,
        target_blocks: &[Block],
    ) -> Result<Vec<Operation>> {
        let mut index = BlockIndex::build(target_blocks);
        let mut pending: HashMap<u32, Operation> = HashMap::with_capacity(target_blocks.len());
        let mut literal: Vec<u8> = Vec::new();
        let mut buf = vec![0u8; self.block_size];
        let mut rolling = false;
        self.weak.reset();

        loop {
            // After a match the window refills with a whole block; while
            // searching it slides one byte at a time.
            let want = if rolling { 1 } else { self.block_size };
            let n = read_full(source, &mut buf[..want])?;
            if n == 0 {
                break;
            }

            if rolling {
                let evicted = self.weak.roll(buf[0])?;
                literal.push(evicted);
            } else {
                self.weak.write_all(&buf[..n]);
            }

            if let Some(matched) = self.search(&mut index) {
                rolling = false;
                pending.insert(matched, take_literal_operation(matched, &mut literal));
                continue;
            }
            rolling = true;
        }

        // A window still sliding at end of stream was neither matched nor
        // evicted into the literal buffer.
        if rolling {
            literal.extend(self.weak.window_content());
        }

        Ok(assemble(target_blocks.len(), pending, literal))
    }

    /// Two-level probe: bucket presence on the weak hash first, then a
    /// strong-hash scan of the bucket. A confirmed match consumes the
    /// index entry.
    fn search(&mut self, index: &mut BlockIndex) -> Option<u32> {
        let weak = self.weak.sum32();
        if !index.contains(weak) {
            return None;
        }
        self.strong.reset();
        self.strong.update(&self.weak.window_content());
        let digest = self.strong.finalize();
        index.take_match(weak, &digest)
    }
}

/// `Keep` when the match was immediate, `Update` carrying the literal run
/// that preceded it otherwise. Drains the literal buffer.
fn take_literal_operation(index: u32, literal: &mut Vec<u8>) -> Operation {
    if literal.is_empty() {
        Operation::Keep { index }
    } else {
        Operation::Update {
            index,
            data: std::mem::take(literal),
        }
    }
}

/// Walk the target block indices in order, emitting the pending operation
/// or a `Remove`, then append the trailing literal block if any.
fn assemble(
    target_len: usize,
    mut pending: HashMap<u32, Operation>,
    literal: Vec<u8>,
) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(target_len + 1);
    for i in 0..target_len as u32 {
        operations.push(match pending.remove(&i) {
            Some(op) => op,
            None => Operation::Remove { index: i },
        });
    }
    if !literal.is_empty() {
        operations.push(Operation::New { data: literal });
    }
    operations
}

/// Read until `buf` is full or the stream ends. A short count can only
/// happen at end of stream, which keeps block boundaries exact even over
/// readers that return partial reads.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
