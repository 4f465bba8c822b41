//! On-disk format constants and framing helpers shared by the metadata
//! writer and the reader.
//!
//! All header integers are big-endian. The version tag is a length-prefixed
//! UTF-8 string (2-byte big-endian length) so future layouts can be told
//! apart before anything else is parsed.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::{Result, StoreError};

/// Layout identifier written at byte 0 of every store file.
pub const FORMAT_VERSION: &str = "BASALT_V1";

/// Metadata temp file name inside the build directory.
pub const METADATA_FILE_NAME: &str = "metadata.dat";

/// Per-key-length temp file holding `key ∥ packed offset` records in
/// insertion order, consumed by the index build.
pub fn temp_index_file_name(key_length: usize) -> String {
    format!("temp_index{}.dat", key_length)
}

/// Per-key-length temp file holding the encoded values.
pub fn data_file_name(key_length: usize) -> String {
    format!("data{}.dat", key_length)
}

/// Per-key-length built hash-table file, merged into the final store.
pub fn index_file_name(key_length: usize) -> String {
    format!("index{}.dat", key_length)
}

/// Writes the length-prefixed version tag.
pub fn write_version_tag<W: Write>(w: &mut W, tag: &str) -> io::Result<()> {
    w.write_u16::<BigEndian>(tag.len() as u16)?;
    w.write_all(tag.as_bytes())
}

/// Reads a length-prefixed version tag.
pub fn read_version_tag<R: Read>(r: &mut R) -> Result<String> {
    let len = r.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|_| StoreError::CorruptFormat("version tag is not UTF-8".to_string()))
}

/// One per-key-length record in the metadata directory.
///
/// `index_offset` and `data_offset` are relative to the start of the index
/// and data regions respectively; the two absolute region-start fields at
/// the end of the metadata anchor them in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub key_length: u32,
    pub key_count: u64,
    pub num_slots: u64,
    pub slot_size: u32,
    pub index_offset: u64,
    pub data_offset: u64,
}

impl DirectoryEntry {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<BigEndian>(self.key_length)?;
        w.write_u64::<BigEndian>(self.key_count)?;
        w.write_u64::<BigEndian>(self.num_slots)?;
        w.write_u32::<BigEndian>(self.slot_size)?;
        w.write_u64::<BigEndian>(self.index_offset)?;
        w.write_u64::<BigEndian>(self.data_offset)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            key_length: r.read_u32::<BigEndian>()?,
            key_count: r.read_u64::<BigEndian>()?,
            num_slots: r.read_u64::<BigEndian>()?,
            slot_size: r.read_u32::<BigEndian>()?,
            index_offset: r.read_u64::<BigEndian>()?,
            data_offset: r.read_u64::<BigEndian>()?,
        })
    }
}
