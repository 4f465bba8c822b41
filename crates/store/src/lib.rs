//! # Store - write-once/read-many key-value files
//!
//! The central crate of BasaltKV: builds an immutable store file in a
//! single pass over an unordered stream of `(key, value)` byte pairs, and
//! reads it back with O(1) point lookups through a memory map.
//!
//! ## Build pipeline
//!
//! ```text
//! put(key, value)
//!   |
//!   v
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        StoreWriter                            │
//! │                                                               │
//! │ write.rs → per-key-length temp streams                        │
//! │            temp_index<L>.dat: key ∥ packed data offset        │
//! │            data<L>.dat:       varint size ∥ value bytes       │
//! │              |                                                │
//! │              |  close()                                       │
//! │              v                                                │
//! │ index.rs → per-key-length open-addressing hash table,         │
//! │            written through an mmap segment array              │
//! │              |                                                │
//! │              v                                                │
//! │ metadata.rs → header + directory into metadata.dat            │
//! │              |                                                │
//! │              v                                                │
//! │ close.rs → disk-space check, then                             │
//! │            metadata ∥ index files ∥ data files → output sink  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The build never holds the key set in memory: puts stream to disk, and
//! the index build re-reads each per-key-length temp file exactly once.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ METADATA (big-endian)                                         │
//! │                                                               │
//! │ version tag (u16 len + UTF-8) | build time ms (u64)           │
//! │ key count (u64)                                               │
//! │ bloom bit size (u32) | bloom words (u32) | bloom hashes (u32) │
//! │ [bloom word array (u64 × words)]                              │
//! │ distinct key lengths (u32) | max key length (u32)             │
//! │ directory entries, ascending key length                       │
//! │ index region start (u64) | data region start (u64)            │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX REGION — per key length L, ascending                    │
//! │                                                               │
//! │ num_slots fixed slots of (L key bytes ∥ packed data offset);  │
//! │ an all-zero offset field marks an empty slot                  │
//! ├───────────────────────────────────────────────────────────────┤
//! │ DATA REGION — per key length L, ascending                     │
//! │                                                               │
//! │ one reserved zero byte, then varint size ∥ value bytes per    │
//! │ distinct stored value (adjacent duplicates stored once)       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module        | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | [`lib.rs`]    | `StoreWriter` state, constructor, accessors        |
//! | [`write`]     | `put()`: temp streams, duplicate-value compression |
//! | [`index`]     | segment-buffer array + hash-table construction     |
//! | [`metadata`]  | header serialization                               |
//! | [`close`]     | orchestration: build, check, merge, clean up       |
//! | [`reader`]    | `StoreReader`: mmap load + point lookups           |
//! | [`config`]    | string-keyed configuration bag + fluent builder    |
//! | [`format`]    | on-disk constants and framing helpers              |
//! | [`error`]     | `StoreError` taxonomy                              |

mod close;
mod config;
mod error;
mod format;
mod index;
mod metadata;
mod reader;
mod write;

pub use config::{ConfigBuilder, Configuration};
pub use error::{Result, StoreError};
pub use format::{DirectoryEntry, FORMAT_VERSION};
pub use reader::StoreReader;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tempfile::TempDir;

/// Builds one store file from a stream of `put` calls.
///
/// # Usage
///
/// 1. [`StoreWriter::new`] with a [`Configuration`] and an output sink.
/// 2. [`put`](StoreWriter::put) every pair; order only affects physical
///    layout and adjacent-duplicate compression, never lookup results.
/// 3. [`close`](StoreWriter::close) exactly once: builds the hash tables,
///    writes the file into the sink and removes all temp state.
///
/// A writer is single-owner and synchronous; it is not `Sync` and has no
/// background threads. Dropping an unclosed writer removes the temp
/// directory without producing output.
pub struct StoreWriter<W: Write> {
    /// Pass-through bag; the builder consumes four keys, upstream layers
    /// and the reader own the rest.
    config: Configuration,
    load_factor: f64,
    segment_size: u64,
    bloom_enabled: bool,
    bloom_error_factor: f64,

    /// Exclusively-owned scratch directory, removed on close and on drop.
    temp_dir: Option<TempDir>,
    out: Option<BufWriter<W>>,

    // Per-key-length state, all indexed by key length in bytes and grown
    // together when a longer key first appears.
    index_files: Vec<Option<PathBuf>>,
    index_streams: Vec<Option<BufWriter<File>>>,
    data_files: Vec<Option<PathBuf>>,
    data_streams: Vec<Option<BufWriter<File>>>,
    last_values: Vec<Option<Vec<u8>>>,
    last_value_lengths: Vec<u64>,
    data_lengths: Vec<u64>,
    max_offset_lengths: Vec<usize>,
    key_counts: Vec<u64>,

    key_count: u64,
    value_count: u64,
    collisions: u64,
    indexes_length: u64,
    closed: bool,
}

impl<W: Write> StoreWriter<W> {
    /// Creates a writer that will emit the finished store into `sink`.
    ///
    /// The sink is wrapped in a [`BufWriter`]; nothing reaches it until
    /// [`close`](StoreWriter::close). A scratch directory is created under
    /// the OS temp root and owned exclusively by this writer.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `load_factor` or `bloom_error_factor` is
    /// outside (0, 1), `mmap_segment_size` is zero, or any configured
    /// value fails to parse.
    pub fn new(config: Configuration, sink: W) -> Result<Self> {
        let load_factor = config.get_double(Configuration::LOAD_FACTOR)?;
        if load_factor <= 0.0 || load_factor >= 1.0 {
            return Err(StoreError::InvalidArgument(format!(
                "illegal load factor {}, should be strictly between 0.0 and 1.0",
                load_factor
            )));
        }

        let segment_size = config.get_long(Configuration::MMAP_SEGMENT_SIZE)?;
        if segment_size == 0 {
            return Err(StoreError::InvalidArgument(
                "mmap segment size must be positive".to_string(),
            ));
        }

        let bloom_enabled = config.get_bool(Configuration::BLOOM_ENABLED)?;
        let bloom_error_factor = config.get_double(Configuration::BLOOM_ERROR_FACTOR)?;
        if bloom_enabled && (bloom_error_factor <= 0.0 || bloom_error_factor >= 1.0) {
            return Err(StoreError::InvalidArgument(format!(
                "illegal bloom error factor {}, should be strictly between 0.0 and 1.0",
                bloom_error_factor
            )));
        }

        let temp_dir = tempfile::Builder::new().prefix("basaltkv").tempdir()?;
        tracing::info!(path = %temp_dir.path().display(), "created temporary build directory");

        Ok(Self {
            config,
            load_factor,
            segment_size,
            bloom_enabled,
            bloom_error_factor,
            temp_dir: Some(temp_dir),
            out: Some(BufWriter::new(sink)),
            index_files: Vec::new(),
            index_streams: Vec::new(),
            data_files: Vec::new(),
            data_streams: Vec::new(),
            last_values: Vec::new(),
            last_value_lengths: Vec::new(),
            data_lengths: Vec::new(),
            max_offset_lengths: Vec::new(),
            key_counts: Vec::new(),
            key_count: 0,
            value_count: 0,
            collisions: 0,
            indexes_length: 0,
            closed: false,
        })
    }

    /// Returns the configuration bag this writer was created with.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Total keys put so far.
    #[must_use]
    pub fn key_count(&self) -> u64 {
        self.key_count
    }

    /// Distinct stored values so far (adjacent duplicates count once).
    #[must_use]
    pub fn value_count(&self) -> u64 {
        self.value_count
    }

    /// Keys that needed at least one extra probe during index build.
    /// Populated by [`close`](StoreWriter::close).
    #[must_use]
    pub fn collisions(&self) -> u64 {
        self.collisions
    }
}

impl<W: Write> std::fmt::Debug for StoreWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreWriter")
            .field("load_factor", &self.load_factor)
            .field("segment_size", &self.segment_size)
            .field("bloom_enabled", &self.bloom_enabled)
            .field("key_count", &self.key_count)
            .field("value_count", &self.value_count)
            .field("collisions", &self.collisions)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests;
