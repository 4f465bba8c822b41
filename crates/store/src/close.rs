//! Close path: turn the accumulated temp state into the final store file.
//!
//! Order matters: streams are flushed so the temp files are complete, the
//! per-key-length hash tables are built (feeding the bloom filter), the
//! metadata block is written with the final totals, free disk space is
//! checked, and only then does anything reach the output sink. The temp
//! directory disappears on every exit path.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use bloom::BloomFilter;

use crate::error::{Result, StoreError};
use crate::StoreWriter;

/// Abort the merge when the inputs would consume at least this share of
/// the usable free disk space.
const FREE_SPACE_LIMIT: f64 = 0.66;

impl<W: Write> StoreWriter<W> {
    /// Finishes the build: constructs the hash tables, writes metadata,
    /// merges everything into the output sink and deletes the temp
    /// directory.
    ///
    /// Must be called exactly once; a second call (or a later `put`)
    /// fails with `InvalidState`. On error the sink may hold a partial
    /// file — removing or truncating it is the caller's responsibility.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(StoreError::InvalidState("store writer already closed"));
        }
        self.closed = true;

        let result = self.finish();

        // Success or failure, the sink gets flushed and the temp state
        // goes away.
        let flushed = match self.out.take() {
            Some(mut out) => out.flush().map_err(StoreError::from),
            None => Ok(()),
        };
        if let Some(temp_dir) = self.temp_dir.take() {
            let path = temp_dir.path().to_path_buf();
            match temp_dir.close() {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "deleted temporary build directory");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete temporary build directory");
                }
            }
        }

        result.and(flushed)
    }

    fn finish(&mut self) -> Result<()> {
        // Flush and drop every append stream; the temp files are read
        // back from disk from here on.
        for stream in &mut self.index_streams {
            if let Some(mut s) = stream.take() {
                s.flush()?;
            }
        }
        for stream in &mut self.data_streams {
            if let Some(mut s) = stream.take() {
                s.flush()?;
            }
        }

        tracing::info!(
            keys = self.key_count,
            values = self.value_count,
            "building store"
        );

        let mut bloom = if self.bloom_enabled {
            Some(BloomFilter::new(self.key_count, self.bloom_error_factor))
        } else {
            None
        };

        // Hash tables first (they feed the bloom filter), ascending key
        // length — the merge order and the directory order must agree.
        let mut files_to_merge = Vec::new();
        for key_length in 0..self.key_counts.len() {
            if self.key_counts[key_length] > 0 {
                files_to_merge.push(self.build_index(key_length, &mut bloom)?);
            }
        }

        tracing::info!(collisions = self.collisions, "hash tables built");

        let metadata = self.write_metadata(bloom.as_ref())?;
        tracing::debug!(
            index_region_bytes = self.indexes_length,
            "metadata written"
        );
        files_to_merge.insert(0, metadata);

        for data_file in self.data_files.iter().flatten() {
            files_to_merge.push(data_file.clone());
        }

        self.check_free_disk_space(&files_to_merge)?;
        self.merge_files(&files_to_merge)
    }

    /// Fails if the merged store would eat 2/3 or more of the free space.
    fn check_free_disk_space(&self, files: &[PathBuf]) -> Result<()> {
        let mut total_size = 0u64;
        let mut usable = u64::MAX;
        for file in files {
            if let Ok(meta) = std::fs::metadata(file) {
                total_size += meta.len();
                usable = fs2::available_space(file)?;
            }
        }

        tracing::info!(total_size, usable, "pre-merge disk space check");
        if total_size as f64 / usable as f64 >= FREE_SPACE_LIMIT {
            return Err(StoreError::OutOfDiskSpace {
                needed: total_size,
                usable,
            });
        }
        Ok(())
    }

    /// Concatenates the temp files into the output sink, in order.
    fn merge_files(&mut self, files: &[PathBuf]) -> Result<()> {
        let Some(out) = self.out.as_mut() else {
            return Err(StoreError::InvalidState("output sink already taken"));
        };

        for file in files {
            match File::open(file) {
                Ok(f) => {
                    let size = f.metadata()?.len();
                    tracing::debug!(file = %file.display(), size, "merging");
                    io::copy(&mut BufReader::new(f), out)?;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(file = %file.display(), "skip merging missing file");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
