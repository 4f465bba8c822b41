//! Error taxonomy for store building and reading.
//!
//! Every error is fatal to the in-progress operation: the builder never
//! retries or recovers locally, it surfaces the failure and lets the
//! caller discard the partial output. Temp state is removed on the way
//! out regardless.

use std::io;
use thiserror::Error;
use varint::VarintError;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors produced by the store builder and reader.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A configuration value or call argument is out of its legal range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was called on a writer that is no longer accepting it,
    /// e.g. `put` after `close`.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Two distinct puts supplied bytewise-equal keys.
    #[error("a duplicate key has been found for key bytes {0:02x?}")]
    DuplicateKey(Vec<u8>),

    /// The merged store would consume too much of the remaining disk.
    #[error("not enough free disk space: store needs {needed} bytes, {usable} usable")]
    OutOfDiskSpace { needed: u64, usable: u64 },

    /// Any underlying read, write or mmap failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The bytes on disk do not decode as a well-formed store.
    #[error("corrupt store: {0}")]
    CorruptFormat(String),

    /// The file carries a format-version tag this reader does not know.
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(String),
}

impl From<VarintError> for StoreError {
    fn from(e: VarintError) -> Self {
        match e {
            VarintError::Io(e) => StoreError::Io(e),
            VarintError::Overflow => {
                StoreError::CorruptFormat("varint continuation overflow".to_string())
            }
        }
    }
}
