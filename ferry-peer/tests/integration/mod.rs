pub mod signaling_tests;

use ferry_peer::{FileReceiver, FileSender, PeerConfig, SaveLocation};
use std::path::Path;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Deterministic, non-repeating-looking file content.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) % 251) as u8).collect()
}

pub fn write_sample(dir: &Path, name: &str, len: usize) -> (std::path::PathBuf, Vec<u8>) {
    let path = dir.join(name);
    let data = sample_bytes(len);
    std::fs::write(&path, &data).unwrap();
    (path, data)
}

pub fn sender_for(path: &Path, file_id: &str) -> FileSender {
    FileSender::new(path, PeerConfig::default()).with_file_id(file_id)
}

pub fn receiver_into(dir: &Path, file_id: &str) -> FileReceiver {
    FileReceiver::new(file_id, SaveLocation::new(dir), PeerConfig::default())
}
