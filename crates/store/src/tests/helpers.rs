use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Configuration, StoreReader, StoreWriter};

/// Builds a store file from `pairs` and returns the directory guard plus
/// the store path.
pub fn build_store(config: Configuration, pairs: &[(Vec<u8>, Vec<u8>)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.basalt");
    let file = File::create(&path).unwrap();

    let mut writer = StoreWriter::new(config, file).unwrap();
    for (key, value) in pairs {
        writer.put(key, value).unwrap();
    }
    writer.close().unwrap();

    (dir, path)
}

pub fn open_store(path: &Path) -> StoreReader {
    StoreReader::open(path).unwrap()
}

pub fn pair(key: &str, value: &str) -> (Vec<u8>, Vec<u8>) {
    (key.as_bytes().to_vec(), value.as_bytes().to_vec())
}
