//! Store configuration.
//!
//! Settings travel as a string-keyed bag so that the builder, the reader
//! and any upstream typed layers all agree on one set of contract-stable
//! key names. The builder consumes four of them; the rest ride along in
//! the bag untouched (the reader and higher layers interpret those).

use std::collections::BTreeMap;

use crate::error::{Result, StoreError};

/// String-keyed configuration bag with typed accessors.
///
/// A fresh bag carries the documented defaults; [`set`](Configuration::set)
/// overrides them. Unknown keys are kept verbatim so upstream layers can
/// stash their own settings without the build core caring.
#[derive(Debug, Clone)]
pub struct Configuration {
    values: BTreeMap<String, String>,
}

impl Configuration {
    /// Target fill ratio of each per-key-length hash table, in (0, 1).
    pub const LOAD_FACTOR: &'static str = "load_factor";
    /// Maximum size in bytes of one mmap segment during index build.
    pub const MMAP_SEGMENT_SIZE: &'static str = "mmap_segment_size";
    /// Whether to build and embed a bloom filter.
    pub const BLOOM_ENABLED: &'static str = "bloom_enabled";
    /// Target bloom false-positive probability, in (0, 1).
    pub const BLOOM_ERROR_FACTOR: &'static str = "bloom_error_factor";
    /// Reader-side: whether the data region is accessed through the mmap.
    pub const MMAP_DATA_ENABLED: &'static str = "mmap_data_enabled";
    /// Upstream API surface; not consumed by the build core.
    pub const ALLOW_DUPLICATES: &'static str = "allow_duplicates";
    /// Upstream API surface; not consumed by the build core.
    pub const WRITE_BUFFER_ELEMENTS: &'static str = "write_buffer_elements";
    /// Upstream API surface; not consumed by the build core.
    pub const COMPRESSION_ENABLED: &'static str = "compression_enabled";

    pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
    pub const DEFAULT_MMAP_SEGMENT_SIZE: u64 = 1024 * 1024 * 1024;
    pub const DEFAULT_BLOOM_ERROR_FACTOR: f64 = 0.01;

    /// Creates a bag holding the documented defaults.
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert(
            Self::LOAD_FACTOR.to_string(),
            Self::DEFAULT_LOAD_FACTOR.to_string(),
        );
        values.insert(
            Self::MMAP_SEGMENT_SIZE.to_string(),
            Self::DEFAULT_MMAP_SEGMENT_SIZE.to_string(),
        );
        values.insert(Self::BLOOM_ENABLED.to_string(), "false".to_string());
        values.insert(
            Self::BLOOM_ERROR_FACTOR.to_string(),
            Self::DEFAULT_BLOOM_ERROR_FACTOR.to_string(),
        );
        Self { values }
    }

    /// Sets `key` to the string form of `value`, replacing any previous
    /// setting.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Returns the raw string value for `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns `key` parsed as a float.
    pub fn get_double(&self, key: &str) -> Result<f64> {
        self.parse(key)
    }

    /// Returns `key` parsed as an unsigned integer.
    pub fn get_long(&self, key: &str) -> Result<u64> {
        self.parse(key)
    }

    /// Returns `key` parsed as a boolean (`"true"` / `"false"`).
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.parse(key)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.values.get(key).ok_or_else(|| {
            StoreError::InvalidArgument(format!("missing configuration key `{}`", key))
        })?;
        raw.parse().map_err(|_| {
            StoreError::InvalidArgument(format!(
                "malformed value `{}` for configuration key `{}`",
                raw, key
            ))
        })
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent construction for [`Configuration`].
///
/// ```rust
/// use store::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .with_load_factor(0.5)
///     .with_bloom_filter(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Configuration,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Configuration::new(),
        }
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.config.set(Configuration::LOAD_FACTOR, load_factor);
        self
    }

    pub fn with_segment_size(mut self, bytes: u64) -> Self {
        self.config.set(Configuration::MMAP_SEGMENT_SIZE, bytes);
        self
    }

    pub fn with_bloom_filter(mut self, enabled: bool) -> Self {
        self.config.set(Configuration::BLOOM_ENABLED, enabled);
        self
    }

    pub fn with_bloom_error_factor(mut self, error_factor: f64) -> Self {
        self.config.set(Configuration::BLOOM_ERROR_FACTOR, error_factor);
        self
    }

    pub fn with_mmap_data(mut self, enabled: bool) -> Self {
        self.config.set(Configuration::MMAP_DATA_ENABLED, enabled);
        self
    }

    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.config.set(Configuration::ALLOW_DUPLICATES, allow);
        self
    }

    pub fn with_write_buffer_elements(mut self, elements: u64) -> Self {
        self.config.set(Configuration::WRITE_BUFFER_ELEMENTS, elements);
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.set(Configuration::COMPRESSION_ENABLED, enabled);
        self
    }

    pub fn build(self) -> Configuration {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
