//! Metadata serialization.
//!
//! The header is assembled in memory first: the two trailing fields are
//! the absolute offsets where the index and data regions begin, and both
//! fall out of the buffer length once everything before them is written.

use byteorder::{BigEndian, WriteBytesExt};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use bloom::BloomFilter;

use crate::error::{Result, StoreError};
use crate::format::{self, DirectoryEntry};
use crate::StoreWriter;

impl<W: Write> StoreWriter<W> {
    /// Writes the metadata block to `metadata.dat` and returns its path.
    ///
    /// Also fixes the total index-region length, which the merge step and
    /// the trailing region-start fields both depend on.
    pub(crate) fn write_metadata(&mut self, bloom: Option<&BloomFilter>) -> Result<PathBuf> {
        let mut buf = Vec::new();

        format::write_version_tag(&mut buf, format::FORMAT_VERSION)?;

        let build_time_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        buf.write_u64::<BigEndian>(build_time_ms)?;

        buf.write_u64::<BigEndian>(self.key_count)?;

        match bloom {
            Some(filter) => {
                buf.write_u32::<BigEndian>(filter.bit_size() as u32)?;
                buf.write_u32::<BigEndian>(filter.words().len() as u32)?;
                buf.write_u32::<BigEndian>(filter.hash_functions())?;
                for word in filter.words() {
                    buf.write_u64::<BigEndian>(*word)?;
                }
            }
            None => {
                buf.write_u32::<BigEndian>(0)?;
                buf.write_u32::<BigEndian>(0)?;
                buf.write_u32::<BigEndian>(0)?;
            }
        }

        let distinct_key_lengths =
            self.key_counts.iter().filter(|&&count| count > 0).count() as u32;
        let max_key_length = self.key_counts.len().saturating_sub(1) as u32;
        buf.write_u32::<BigEndian>(distinct_key_lengths)?;
        buf.write_u32::<BigEndian>(max_key_length)?;

        // Directory entries carry region-relative offsets; the running
        // totals advance as each key length is emitted.
        let mut indexes_length = 0u64;
        let mut datas_length = 0u64;
        for key_length in 0..self.key_counts.len() {
            let count = self.key_counts[key_length];
            if count == 0 {
                continue;
            }
            let num_slots = (count as f64 / self.load_factor).round() as u64;
            let slot_size = (key_length + self.max_offset_lengths[key_length]) as u32;

            DirectoryEntry {
                key_length: key_length as u32,
                key_count: count,
                num_slots,
                slot_size,
                index_offset: indexes_length,
                data_offset: datas_length,
            }
            .write_to(&mut buf)?;

            indexes_length += num_slots * u64::from(slot_size);
            datas_length += self.data_lengths[key_length];
        }
        self.indexes_length = indexes_length;

        // The index region begins right after these two trailing fields.
        let index_region_start = buf.len() as u64 + 16;
        buf.write_u64::<BigEndian>(index_region_start)?;
        buf.write_u64::<BigEndian>(index_region_start + indexes_length)?;

        let Some(temp_dir) = self.temp_dir.as_ref() else {
            return Err(StoreError::InvalidState("temp directory already removed"));
        };
        let path = temp_dir.path().join(format::METADATA_FILE_NAME);
        let mut file = File::create(&path)?;
        file.write_all(&buf)?;

        tracing::debug!(
            bytes = buf.len(),
            distinct_key_lengths,
            index_region_start,
            "wrote metadata file"
        );
        Ok(path)
    }
}
