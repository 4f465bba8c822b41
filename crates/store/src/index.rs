//! Index build: one open-addressing hash table per key length, written
//! directly into a memory-mapped file.
//!
//! The table file can exceed what a single mapping may cover, so it is
//! mapped as an array of fixed-size segments. Slot reads and writes that
//! straddle a segment boundary are split across consecutive mappings;
//! segments are normally far larger than a slot, so at most one split
//! occurs, but the copy loops keep going if a slot outspans a segment.
//!
//! Every slot is `key_length + max_offset_length` bytes: the raw key
//! followed by the varint-packed data offset, zero-padded. Offset 0 never
//! refers to a real value (the data file reserves it), so a decoded 0
//! identifies an empty slot.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use bloom::BloomFilter;
use memmap2::{MmapMut, MmapOptions};

use crate::error::{Result, StoreError};
use crate::format;
use crate::StoreWriter;

/// A logical read-write byte array over a file, backed by one or more
/// fixed-size mmap segments.
pub(crate) struct SegmentedBuffer {
    segments: Vec<MmapMut>,
    segment_size: u64,
}

impl SegmentedBuffer {
    /// Extends `file` to `total_size` bytes and maps it as
    /// `⌈total_size / segment_size⌉` disjoint segments.
    pub(crate) fn create(file: &File, total_size: u64, segment_size: u64) -> io::Result<Self> {
        file.set_len(total_size)?;

        let mut segments = Vec::new();
        let mut offset = 0u64;
        while offset < total_size {
            let len = segment_size.min(total_size - offset) as usize;
            // Safety: the file was created and sized by this build and is
            // not accessed through any other handle while mapped.
            let segment = unsafe {
                MmapOptions::new().offset(offset).len(len).map_mut(file)?
            };
            segments.push(segment);
            offset += segment_size;
        }

        Ok(Self {
            segments,
            segment_size,
        })
    }

    /// Copies `buf.len()` bytes starting at logical `offset` into `buf`,
    /// crossing segment boundaries as needed.
    pub(crate) fn read(&self, offset: u64, buf: &mut [u8]) {
        let mut segment = (offset / self.segment_size) as usize;
        let mut pos = (offset % self.segment_size) as usize;
        let mut filled = 0;
        while filled < buf.len() {
            let src = &self.segments[segment];
            let n = (buf.len() - filled).min(src.len() - pos);
            buf[filled..filled + n].copy_from_slice(&src[pos..pos + n]);
            filled += n;
            segment += 1;
            pos = 0;
        }
    }

    /// Copies `bytes` to logical `offset`, crossing segment boundaries as
    /// needed.
    pub(crate) fn write(&mut self, offset: u64, bytes: &[u8]) {
        let mut segment = (offset / self.segment_size) as usize;
        let mut pos = (offset % self.segment_size) as usize;
        let mut written = 0;
        while written < bytes.len() {
            let dst = &mut self.segments[segment];
            let n = (bytes.len() - written).min(dst.len() - pos);
            dst[pos..pos + n].copy_from_slice(&bytes[written..written + n]);
            written += n;
            segment += 1;
            pos = 0;
        }
    }

    /// Flushes every segment to the backing file.
    pub(crate) fn flush(&self) -> io::Result<()> {
        for segment in &self.segments {
            segment.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> StoreWriter<W> {
    /// Builds the hash table for one key length from its temp index file.
    ///
    /// Returns the path of the finished table file, ready to be merged.
    /// The temp index file is deleted before returning; the mappings are
    /// flushed and dropped so the table file can be re-read as a plain
    /// stream during the merge.
    pub(crate) fn build_index(
        &mut self,
        key_length: usize,
        bloom: &mut Option<BloomFilter>,
    ) -> Result<PathBuf> {
        let count = self.key_counts[key_length];
        let num_slots = (count as f64 / self.load_factor).round() as u64;
        let offset_length = self.max_offset_lengths[key_length];
        let slot_size = key_length + offset_length;

        let Some(temp_dir) = self.temp_dir.as_ref() else {
            return Err(StoreError::InvalidState("temp directory already removed"));
        };
        let index_path = temp_dir.path().join(format::index_file_name(key_length));
        let index_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&index_path)?;
        let mut buffers = SegmentedBuffer::create(
            &index_file,
            num_slots * slot_size as u64,
            self.segment_size,
        )?;

        let Some(temp_index_path) = self.index_files[key_length].clone() else {
            return Err(StoreError::InvalidState("temp index file missing"));
        };
        let mut temp_index = BufReader::new(File::open(&temp_index_path)?);

        let mut key_buffer = vec![0u8; key_length];
        let mut slot_buffer = vec![0u8; slot_size];
        let mut offset_buffer = vec![0u8; offset_length];

        for _ in 0..count {
            temp_index.read_exact(&mut key_buffer)?;
            let data_offset = varint::unpack_long(&mut temp_index)?;

            let hash = hash::location_hash(&key_buffer);
            if let Some(filter) = bloom.as_mut() {
                filter.add(&key_buffer);
            }

            let mut collision = false;
            let mut placed = false;
            for probe in 0..num_slots {
                let slot = (hash + probe) % num_slots;
                let slot_offset = slot * slot_size as u64;
                buffers.read(slot_offset, &mut slot_buffer);

                if varint::unpack_long_at(&slot_buffer, key_length)? == 0 {
                    // Empty slot: key bytes first, then the packed offset.
                    // The tail of the offset field stays zero; the varint
                    // terminator stops the decoder before the padding.
                    buffers.write(slot_offset, &key_buffer);
                    let packed = varint::pack_long_into(&mut offset_buffer, data_offset);
                    buffers.write(slot_offset + key_length as u64, &offset_buffer[..packed]);
                    placed = true;
                    break;
                }

                collision = true;
                if slot_buffer[..key_length] == key_buffer[..] {
                    return Err(StoreError::DuplicateKey(key_buffer.clone()));
                }
            }
            if !placed {
                // num_slots ≥ count, so an empty slot always exists.
                return Err(StoreError::CorruptFormat(
                    "hash table probing exhausted all slots".to_string(),
                ));
            }
            if collision {
                self.collisions += 1;
            }
        }

        tracing::debug!(
            key_length,
            num_slots,
            slot_size,
            offset_length,
            "built index file"
        );

        // The mappings must be released before the merge re-opens this
        // file as a plain stream.
        buffers.flush()?;
        drop(buffers);

        if let Some(path) = self.index_files[key_length].take() {
            if std::fs::remove_file(&path).is_ok() {
                tracing::debug!(path = %path.display(), "deleted temporary index file");
            }
        }

        Ok(index_path)
    }
}
