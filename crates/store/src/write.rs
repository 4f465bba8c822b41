//! Write path: `put()` and the per-key-length temp streams behind it.
//!
//! Each distinct key length owns an index temp file (raw key bytes
//! followed by the varint-packed data offset, in insertion order) and a
//! data temp file (varint value size followed by the value bytes). Both
//! are created lazily the first time a key of that length arrives.
//!
//! Values equal to the immediately preceding value of the same key length
//! are not written again; the index entry points at the previous copy's
//! offset instead. One bytewise compare buys the whole optimization.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::{Result, StoreError};
use crate::format;
use crate::StoreWriter;

impl<W: Write> StoreWriter<W> {
    /// Adds one `(key, value)` pair to the store being built.
    ///
    /// Keys must be non-empty; values may be empty. Duplicate keys are not
    /// detected here — the index build during [`close`](StoreWriter::close)
    /// finds them and fails the build.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the writer is already closed.
    /// - `InvalidArgument` if `key` is empty.
    /// - `Io` on any temp-file failure.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.closed {
            return Err(StoreError::InvalidState("put on a closed store writer"));
        }
        if key.is_empty() {
            return Err(StoreError::InvalidArgument(
                "key must not be empty".to_string(),
            ));
        }

        let key_length = key.len();
        self.grow_to(key_length);
        self.ensure_streams(key_length)?;

        let Some(index_stream) = self.index_streams[key_length].as_mut() else {
            return Err(StoreError::InvalidState("index stream not initialized"));
        };

        // Key bytes go to the index temp file as-is; the fixed key length
        // of the file is the record delimiter.
        index_stream.write_all(key)?;

        let same_value = match &self.last_values[key_length] {
            Some(last) => last.as_slice() == value,
            None => false,
        };

        // A repeated value points back at the previous copy.
        let mut offset = self.data_lengths[key_length];
        if same_value {
            offset -= self.last_value_lengths[key_length];
        }

        let offset_length = varint::pack_long(index_stream, offset)?;
        self.max_offset_lengths[key_length] =
            self.max_offset_lengths[key_length].max(offset_length);

        if !same_value {
            let Some(data_stream) = self.data_streams[key_length].as_mut() else {
                return Err(StoreError::InvalidState("data stream not initialized"));
            };

            let size_length = varint::pack_int(data_stream, value.len() as u32)?;
            data_stream.write_all(value)?;

            let encoded = size_length as u64 + value.len() as u64;
            self.data_lengths[key_length] += encoded;
            self.last_values[key_length] = Some(value.to_vec());
            self.last_value_lengths[key_length] = encoded;
            self.value_count += 1;
        }

        self.key_count += 1;
        self.key_counts[key_length] += 1;
        Ok(())
    }

    /// Grows every per-key-length vector so index `key_length` is valid.
    fn grow_to(&mut self, key_length: usize) {
        if self.key_counts.len() > key_length {
            return;
        }
        let len = key_length + 1;
        self.index_files.resize(len, None);
        self.index_streams.resize_with(len, || None);
        self.data_files.resize(len, None);
        self.data_streams.resize_with(len, || None);
        self.last_values.resize(len, None);
        self.last_value_lengths.resize(len, 0);
        self.data_lengths.resize(len, 0);
        self.max_offset_lengths.resize(len, 0);
        self.key_counts.resize(len, 0);
    }

    /// Creates the index and data temp files for `key_length` on first use.
    ///
    /// The data file starts with one zero byte so that no real value ever
    /// sits at offset 0 — an all-zero offset field in an index slot can
    /// then only mean "empty".
    fn ensure_streams(&mut self, key_length: usize) -> Result<()> {
        if self.index_streams[key_length].is_some() {
            return Ok(());
        }
        let Some(temp_dir) = self.temp_dir.as_ref() else {
            return Err(StoreError::InvalidState("temp directory already removed"));
        };

        let index_path = temp_dir.path().join(format::temp_index_file_name(key_length));
        let data_path = temp_dir.path().join(format::data_file_name(key_length));
        tracing::debug!(key_length, "opening temp streams for new key length");

        let index_stream = BufWriter::new(File::create(&index_path)?);
        let mut data_stream = BufWriter::new(File::create(&data_path)?);
        data_stream.write_all(&[0])?;

        self.index_files[key_length] = Some(index_path);
        self.index_streams[key_length] = Some(index_stream);
        self.data_files[key_length] = Some(data_path);
        self.data_streams[key_length] = Some(data_stream);
        self.data_lengths[key_length] += 1;
        Ok(())
    }
}
