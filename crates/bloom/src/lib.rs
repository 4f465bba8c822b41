//! # Bloom Filter
//!
//! A space-efficient probabilistic data structure for set membership
//! testing.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the
//! set (no false negatives), but may occasionally report that a key **is**
//! in the set when it isn't (false positives). The false positive rate
//! depends on the number of bits and hash functions used.
//!
//! ## Usage in BasaltKV
//!
//! The store builder sizes one filter from the final key count after all
//! puts are in, fills it while the hash tables are built, and embeds the
//! raw word array in the store's metadata block. At lookup time the reader
//! checks the filter first — a negative answer skips the hash-table probe
//! entirely.
//!
//! The bit array is kept as `u64` words because that is the unit the
//! metadata serializes: the header records the bit size, the word count
//! and the hash-function count, followed by the words themselves.
//!
//! ## Example
//!
//! ```rust
//! use bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::new(1000, 0.01);
//! bf.add(b"hello");
//! assert!(bf.may_contain(b"hello"));
//! ```

/// A bloom filter backed by a `u64` word array with `k` hash functions.
///
/// Uses double hashing: `g_i = h1 + i * h2` where `h1` and `h2` are the
/// two 64-bit halves of the MurmurHash3 x64-128 digest of the key — the
/// same digest family the store uses for slot placement, so builder and
/// reader agree bit-for-bit.
pub struct BloomFilter {
    /// The bit array, 64 bits per word.
    words: Vec<u64>,
    /// Number of bits in the filter.
    bit_size: u64,
    /// Number of hash functions (k).
    hash_functions: u32,
}

impl BloomFilter {
    /// Creates a filter sized for `expected_items` with the given target
    /// `false_positive_rate`.
    ///
    /// An `expected_items` of zero is treated as one so that an empty
    /// build with the filter enabled still produces a well-formed (tiny)
    /// filter.
    ///
    /// # Panics
    ///
    /// Panics if `false_positive_rate` is not in `(0, 1)`; the store
    /// validates the configured rate before constructing a filter.
    pub fn new(expected_items: u64, false_positive_rate: f64) -> Self {
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        // Optimal number of bits: m = -n * ln(p) / (ln(2)^2)
        let n = expected_items.max(1) as f64;
        let m = (-n * false_positive_rate.ln() / (std::f64::consts::LN_2.powi(2))).ceil() as u64;
        let m = m.max(64);

        // Optimal number of hashes: k = (m/n) * ln(2)
        let k = ((m as f64 / n) * std::f64::consts::LN_2).ceil() as u32;
        let k = k.max(1);

        let word_len = ((m + 63) / 64) as usize;

        Self {
            words: vec![0u64; word_len],
            bit_size: m,
            hash_functions: k,
        }
    }

    /// Reconstructs a filter from the values stored in a store's metadata
    /// block (used by the reader).
    pub fn from_parts(bit_size: u64, hash_functions: u32, words: Vec<u64>) -> Self {
        Self {
            words,
            bit_size,
            hash_functions,
        }
    }

    /// Inserts a key into the filter.
    pub fn add(&mut self, key: &[u8]) {
        let (h1, h2) = hash::murmur3_128(key, hash::FORMAT_SEED);
        for i in 0..self.hash_functions {
            let idx = self.bit_index(h1, h2, i);
            self.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** be in the set, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        let (h1, h2) = hash::murmur3_128(key, hash::FORMAT_SEED);
        for i in 0..self.hash_functions {
            let idx = self.bit_index(h1, h2, i);
            if !self.get_bit(idx) {
                return false;
            }
        }
        true
    }

    /// Returns the number of bits in the filter.
    #[must_use]
    pub fn bit_size(&self) -> u64 {
        self.bit_size
    }

    /// Returns the number of hash functions.
    #[must_use]
    pub fn hash_functions(&self) -> u32 {
        self.hash_functions
    }

    /// Returns the backing word array, the unit the metadata serializes.
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    // ---- Internal helpers ----

    /// Double hashing: g(i) = (h1 + i * h2) mod bit_size.
    fn bit_index(&self, h1: u64, h2: u64, i: u32) -> u64 {
        h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % self.bit_size
    }

    fn set_bit(&mut self, idx: u64) {
        let word = (idx / 64) as usize;
        let bit = idx % 64;
        self.words[word] |= 1 << bit;
    }

    fn get_bit(&self, idx: u64) -> bool {
        let word = (idx / 64) as usize;
        let bit = idx % 64;
        (self.words[word] >> bit) & 1 == 1
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bit_size", &self.bit_size)
            .field("hash_functions", &self.hash_functions)
            .field("words", &self.words.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
