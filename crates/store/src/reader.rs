//! Reading a finished store: mmap load and point lookups.
//!
//! [`open`](StoreReader::open) maps the whole file read-only and parses
//! the metadata block once: version check, bloom reconstruction, and the
//! per-key-length directory. A lookup then costs a bloom test (when
//! embedded) plus a linear probe over the fixed-width slots of one hash
//! table — no allocation, values are returned as slices borrowed from
//! the map.

use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use bloom::BloomFilter;
use memmap2::Mmap;

use crate::error::{Result, StoreError};
use crate::format::{self, DirectoryEntry};

/// Read side of a store file.
pub struct StoreReader {
    mmap: Mmap,
    key_count: u64,
    build_time_ms: u64,
    bloom: Option<BloomFilter>,
    /// Directory indexed by key length; `None` for lengths the store
    /// holds no keys of.
    directory: Vec<Option<DirectoryEntry>>,
    index_region_start: u64,
    data_region_start: u64,
}

impl StoreReader {
    /// Opens a store file and parses its metadata.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVersion` if the version tag is not this layout.
    /// - `CorruptFormat` if the header does not parse or points outside
    ///   the file.
    /// - `Io` on open/mmap failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // Safety: store files are write-once; nothing mutates them after
        // the build, and this handle is read-only.
        let mmap = unsafe { Mmap::map(&file)? };

        let mut cursor = Cursor::new(&mmap[..]);

        let version = format::read_version_tag(&mut cursor)?;
        if version != format::FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }

        let build_time_ms = cursor.read_u64::<BigEndian>()?;
        let key_count = cursor.read_u64::<BigEndian>()?;

        let bloom_bit_size = cursor.read_u32::<BigEndian>()?;
        let bloom_word_count = cursor.read_u32::<BigEndian>()?;
        let bloom_hash_functions = cursor.read_u32::<BigEndian>()?;
        let bloom = if bloom_bit_size > 0 {
            let mut words = Vec::with_capacity(bloom_word_count as usize);
            for _ in 0..bloom_word_count {
                words.push(cursor.read_u64::<BigEndian>()?);
            }
            Some(BloomFilter::from_parts(
                u64::from(bloom_bit_size),
                bloom_hash_functions,
                words,
            ))
        } else {
            None
        };

        let distinct_key_lengths = cursor.read_u32::<BigEndian>()?;
        let max_key_length = cursor.read_u32::<BigEndian>()? as usize;

        let mut directory = vec![None; max_key_length + 1];
        for _ in 0..distinct_key_lengths {
            let entry = DirectoryEntry::read_from(&mut cursor)?;
            let key_length = entry.key_length as usize;
            let Some(slot) = directory.get_mut(key_length) else {
                return Err(StoreError::CorruptFormat(format!(
                    "directory entry for key length {} exceeds the declared maximum {}",
                    key_length, max_key_length
                )));
            };
            *slot = Some(entry);
        }

        let index_region_start = cursor.read_u64::<BigEndian>()?;
        let data_region_start = cursor.read_u64::<BigEndian>()?;

        if index_region_start != cursor.position() {
            return Err(StoreError::CorruptFormat(format!(
                "index region start {} does not follow the metadata (position {})",
                index_region_start,
                cursor.position()
            )));
        }
        if data_region_start < index_region_start || data_region_start > mmap.len() as u64 {
            return Err(StoreError::CorruptFormat(
                "data region start points outside the file".to_string(),
            ));
        }

        Ok(Self {
            mmap,
            key_count,
            build_time_ms,
            bloom,
            directory,
            index_region_start,
            data_region_start,
        })
    }

    /// Looks up `key`, returning the stored value bytes if present.
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        let Some(entry) = self.directory.get(key.len()).and_then(Option::as_ref) else {
            return Ok(None);
        };

        if let Some(filter) = &self.bloom {
            if !filter.may_contain(key) {
                return Ok(None);
            }
        }

        let slot_size = u64::from(entry.slot_size);
        let table_start = self.index_region_start + entry.index_offset;
        let hash = hash::location_hash(key);

        for probe in 0..entry.num_slots {
            let slot = (hash + probe) % entry.num_slots;
            let start = (table_start + slot * slot_size) as usize;
            let Some(slot_bytes) = self.mmap.get(start..start + slot_size as usize) else {
                return Err(StoreError::CorruptFormat(
                    "index slot points outside the file".to_string(),
                ));
            };

            let offset = varint::unpack_long_at(slot_bytes, key.len())?;
            if offset == 0 {
                // Empty slot ends the probe sequence: the key was never
                // inserted.
                return Ok(None);
            }
            if &slot_bytes[..key.len()] == key {
                return self.read_value(entry, offset).map(Some);
            }
        }
        Ok(None)
    }

    /// Decodes the value stored at `offset` within this entry's data
    /// region.
    fn read_value(&self, entry: &DirectoryEntry, offset: u64) -> Result<&[u8]> {
        let start = (self.data_region_start + entry.data_offset + offset) as usize;
        let Some(mut rest) = self.mmap.get(start..) else {
            return Err(StoreError::CorruptFormat(
                "data offset points outside the file".to_string(),
            ));
        };

        let size = varint::unpack_int(&mut rest)? as usize;
        let Some(value) = rest.get(..size) else {
            return Err(StoreError::CorruptFormat(
                "value length exceeds the data region".to_string(),
            ));
        };
        Ok(value)
    }

    /// Total number of keys in the store.
    #[must_use]
    pub fn key_count(&self) -> u64 {
        self.key_count
    }

    /// Build timestamp, milliseconds since the Unix epoch.
    #[must_use]
    pub fn build_time_ms(&self) -> u64 {
        self.build_time_ms
    }

    /// The embedded bloom filter, when the store was built with one.
    #[must_use]
    pub fn bloom_filter(&self) -> Option<&BloomFilter> {
        self.bloom.as_ref()
    }

    /// The per-key-length directory entries, ascending key length.
    pub fn directory(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.directory.iter().flatten()
    }

    /// Absolute file offset where the index region begins.
    #[must_use]
    pub fn index_region_start(&self) -> u64 {
        self.index_region_start
    }

    /// Absolute file offset where the data region begins.
    #[must_use]
    pub fn data_region_start(&self) -> u64 {
        self.data_region_start
    }

    /// Total file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.mmap.len() as u64
    }
}

impl std::fmt::Debug for StoreReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreReader")
            .field("key_count", &self.key_count)
            .field("bloom", &self.bloom.is_some())
            .field("key_lengths", &self.directory.iter().flatten().count())
            .field("file_size", &self.mmap.len())
            .finish()
    }
}
