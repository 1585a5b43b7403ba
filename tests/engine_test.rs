use rdelta::delta::block_level::Operation;
use rdelta::engine::Engine;
use rdelta::protocol;
use rdelta::RdeltaError;
use std::fs;
use std::path::{Path, PathBuf};

fn temp_workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rdelta_{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn target_block(target: &[u8], block_size: usize, index: u32) -> &[u8] {
    let start = index as usize * block_size;
    let end = (start + block_size).min(target.len());
    &target[start..end]
}

/// Rebuild the source from the target bytes and the delta operations.
fn apply_operations(target: &[u8], block_size: usize, operations: &[Operation]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in operations {
        match op {
            Operation::Keep { index } => {
                out.extend_from_slice(target_block(target, block_size, *index));
            }
            Operation::Update { index, data } => {
                out.extend_from_slice(data);
                out.extend_from_slice(target_block(target, block_size, *index));
            }
            Operation::Remove { .. } => {}
            Operation::New { data } => out.extend_from_slice(data),
        }
    }
    out
}

/// Run signature then delta through real files and return the decoded
/// delta operations together with the signed block size.
fn run_pipeline(
    dir: &Path,
    target: &[u8],
    source: &[u8],
    block_size: Option<u64>,
) -> (u64, Vec<Operation>) {
    let target_path = dir.join("target.bin");
    let source_path = dir.join("source.bin");
    let sig_path = dir.join("target.sig");
    let delta_path = dir.join("source.delta");
    fs::write(&target_path, target).unwrap();
    fs::write(&source_path, source).unwrap();

    Engine::new(block_size)
        .signature(&target_path, &sig_path)
        .unwrap();
    Engine::new(None)
        .delta(&sig_path, &source_path, &delta_path)
        .unwrap();

    let sig = protocol::read_signature(fs::File::open(&sig_path).unwrap()).unwrap();
    let delta = protocol::read_delta(fs::File::open(&delta_path).unwrap()).unwrap();
    (sig.block_size, delta.operations)
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

#[test]
fn test_modified_middle_round_trip() {
    let dir = temp_workspace("modified_middle");
    let target = patterned(40_000);
    let mut source = target.clone();
    source.splice(9_000..9_400, [0x42; 100]);

    let (block_size, operations) = run_pipeline(&dir, &target, &source, None);
    assert_eq!(block_size, 700);
    assert_eq!(
        apply_operations(&target, block_size as usize, &operations),
        source
    );
    assert!(operations
        .iter()
        .any(|op| matches!(op, Operation::Keep { .. })));
}

#[test]
fn test_appended_tail_round_trip() {
    let dir = temp_workspace("appended_tail");
    let target = patterned(5_000);
    let mut source = target.clone();
    source.extend_from_slice(b"fresh bytes at the end");

    let (block_size, operations) = run_pipeline(&dir, &target, &source, Some(512));
    assert_eq!(block_size, 512);
    assert_eq!(
        apply_operations(&target, block_size as usize, &operations),
        source
    );
    assert!(matches!(operations.last(), Some(Operation::New { .. })));
}

#[test]
fn test_identical_files_keep_everything() {
    let dir = temp_workspace("identical");
    let data = patterned(10_000);

    let (block_size, operations) = run_pipeline(&dir, &data, &data, None);
    assert!(operations
        .iter()
        .all(|op| matches!(op, Operation::Keep { .. })));
    assert_eq!(
        apply_operations(&data, block_size as usize, &operations),
        data
    );
}

#[test]
fn test_tiny_file_uses_fallback_block_size() {
    let dir = temp_workspace("tiny");
    let target = b"abcdef".to_vec();
    let source = b"abcxyzdef".to_vec();

    let (block_size, operations) = run_pipeline(&dir, &target, &source, None);
    assert_eq!(block_size, 3);
    assert_eq!(
        apply_operations(&target, block_size as usize, &operations),
        source
    );
}

#[test]
fn test_block_size_without_two_chunks_rejected() {
    let dir = temp_workspace("one_chunk");
    let target_path = dir.join("target.bin");
    fs::write(&target_path, patterned(100)).unwrap();

    let result = Engine::new(Some(100)).signature(&target_path, &dir.join("out.sig"));
    assert!(matches!(
        result,
        Err(RdeltaError::InvalidBlockSize {
            block_size: 100,
            file_size: 100,
        })
    ));
}

#[test]
fn test_existing_output_rejected() {
    let dir = temp_workspace("no_clobber");
    let target_path = dir.join("target.bin");
    let sig_path = dir.join("target.sig");
    fs::write(&target_path, patterned(2_000)).unwrap();
    fs::write(&sig_path, b"already here").unwrap();

    let result = Engine::new(None).signature(&target_path, &sig_path);
    assert!(matches!(result, Err(RdeltaError::OutputExists(_))));
    // The pre-existing file is left untouched.
    assert_eq!(fs::read(&sig_path).unwrap(), b"already here");
}

#[test]
fn test_garbage_signature_rejected() {
    let dir = temp_workspace("garbage_sig");
    let sig_path = dir.join("bogus.sig");
    let source_path = dir.join("source.bin");
    fs::write(&sig_path, b"this is not a signature container").unwrap();
    fs::write(&source_path, patterned(1_000)).unwrap();

    let result = Engine::new(None).delta(&sig_path, &source_path, &dir.join("out.delta"));
    assert!(matches!(result, Err(RdeltaError::Format(_))));
}

#[test]
fn test_missing_target_surfaces_io_error() {
    let dir = temp_workspace("missing_target");
    let result = Engine::new(None).signature(&dir.join("absent.bin"), &dir.join("out.sig"));
    assert!(matches!(result, Err(RdeltaError::Io(_))));
}
