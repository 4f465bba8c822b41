//! # Hash — MurmurHash3 for slot placement and bloom filters
//!
//! The store format fixes MurmurHash3 (x64, 128-bit variant) as its key
//! hash: the builder places each key in its hash table with it and the
//! reader must probe with the identical function, so the seed is a format
//! constant and must never change for existing store files.
//!
//! Two consumers share the digest:
//!
//! - the index builder and reader use [`location_hash`] (the low 64 bits,
//!   masked into the positive range so `hash + probe` arithmetic cannot
//!   overflow) to pick a slot;
//! - the bloom filter derives its double-hashing pair from the two 64-bit
//!   halves returned by [`murmur3_128`].

/// Seed baked into the store format. Changing it breaks every existing file.
pub const FORMAT_SEED: u32 = 0x9747_b28c;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// MurmurHash3 x64-128 over `data`, returning the two 64-bit halves.
pub fn murmur3_128(data: &[u8], seed: u32) -> (u64, u64) {
    let mut h1 = u64::from(seed);
    let mut h2 = u64::from(seed);

    let nblocks = data.len() / 16;
    for block in 0..nblocks {
        let base = block * 16;
        let mut k1 = u64::from_le_bytes(data[base..base + 8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(data[base + 8..base + 16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];
    if tail.len() > 8 {
        let mut k2 = 0u64;
        for i in (8..tail.len()).rev() {
            k2 ^= u64::from(tail[i]) << (8 * (i - 8));
        }
        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
    }
    if !tail.is_empty() {
        let mut k1 = 0u64;
        for i in (0..tail.len().min(8)).rev() {
            k1 ^= u64::from(tail[i]) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

/// Slot-placement hash: low half of the format-seeded digest, kept in the
/// positive `i64` range so `(hash + probe) % num_slots` stays exact.
pub fn location_hash(data: &[u8]) -> u64 {
    murmur3_128(data, FORMAT_SEED).0 & 0x7fff_ffff_ffff_ffff
}

/// Finalization mix, forces all bits of the halves to avalanche.
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}
