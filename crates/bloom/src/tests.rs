use super::*;

// -------------------- Construction --------------------

#[test]
fn new_creates_valid_filter() {
    let bf = BloomFilter::new(100, 0.01);
    assert!(bf.bit_size() > 0);
    assert!(bf.hash_functions() > 0);
    assert!(!bf.words().is_empty());
}

#[test]
#[should_panic(expected = "false_positive_rate must be in (0, 1)")]
fn new_panics_on_zero_fpr() {
    BloomFilter::new(100, 0.0);
}

#[test]
#[should_panic(expected = "false_positive_rate must be in (0, 1)")]
fn new_panics_on_one_fpr() {
    BloomFilter::new(100, 1.0);
}

#[test]
fn zero_expected_items_is_clamped() {
    let mut bf = BloomFilter::new(0, 0.01);
    assert!(bf.bit_size() >= 64);
    bf.add(b"x");
    assert!(bf.may_contain(b"x"));
}

#[test]
fn sizing_follows_standard_formulas() {
    let n = 10_000u64;
    let p = 0.01f64;
    let bf = BloomFilter::new(n, p);

    let m = (-(n as f64) * p.ln() / std::f64::consts::LN_2.powi(2)).ceil() as u64;
    let k = ((m as f64 / n as f64) * std::f64::consts::LN_2).ceil() as u32;

    assert_eq!(bf.bit_size(), m);
    assert_eq!(bf.hash_functions(), k);
    assert_eq!(bf.words().len() as u64, (m + 63) / 64);
}

// -------------------- Add / Contains --------------------

#[test]
fn added_key_is_found() {
    let mut bf = BloomFilter::new(100, 0.01);
    bf.add(b"hello");
    assert!(bf.may_contain(b"hello"));
}

#[test]
fn missing_key_is_not_found() {
    let bf = BloomFilter::new(100, 0.01);
    assert!(!bf.may_contain(b"hello"));
}

#[test]
fn many_keys_all_found() {
    let mut bf = BloomFilter::new(1000, 0.01);
    for i in 0..1000u64 {
        bf.add(&i.to_le_bytes());
    }
    for i in 0..1000u64 {
        assert!(
            bf.may_contain(&i.to_le_bytes()),
            "key {} should be found",
            i
        );
    }
}

#[test]
fn false_positive_rate_is_reasonable() {
    let n = 10_000;
    let fpr = 0.01;
    let mut bf = BloomFilter::new(n, fpr);

    // Insert n keys
    for i in 0..n {
        bf.add(&i.to_le_bytes());
    }

    // Test n keys that were NOT inserted
    let mut false_positives = 0;
    let test_count = 10_000;
    for i in n..(n + test_count) {
        if bf.may_contain(&i.to_le_bytes()) {
            false_positives += 1;
        }
    }

    let actual_fpr = false_positives as f64 / test_count as f64;
    // Allow up to 3x the target FPR (statistical variance)
    assert!(
        actual_fpr < fpr * 3.0,
        "FPR too high: {:.4} (target {:.4})",
        actual_fpr,
        fpr
    );
}

#[test]
fn empty_key() {
    let mut bf = BloomFilter::new(10, 0.01);
    bf.add(b"");
    assert!(bf.may_contain(b""));
}

#[test]
fn binary_key() {
    let mut bf = BloomFilter::new(10, 0.01);
    let key = vec![0u8, 1, 2, 255, 254, 253];
    bf.add(&key);
    assert!(bf.may_contain(&key));
}

// -------------------- Word-array reconstruction --------------------

#[test]
fn from_parts_preserves_membership() {
    let mut bf = BloomFilter::new(500, 0.01);
    for i in 0..500u64 {
        bf.add(&i.to_le_bytes());
    }

    // What the metadata block stores and the reader gets back.
    let bf2 = BloomFilter::from_parts(
        bf.bit_size(),
        bf.hash_functions(),
        bf.words().to_vec(),
    );

    for i in 0..500u64 {
        assert!(
            bf2.may_contain(&i.to_le_bytes()),
            "key {} missing after reconstruction",
            i
        );
    }
}

// -------------------- Debug --------------------

#[test]
fn debug_impl_works() {
    let bf = BloomFilter::new(100, 0.01);
    let debug = format!("{:?}", bf);
    assert!(debug.contains("BloomFilter"));
    assert!(debug.contains("bit_size"));
    assert!(debug.contains("hash_functions"));
}

// -------------------- Edge cases --------------------

#[test]
fn single_item_filter() {
    let mut bf = BloomFilter::new(1, 0.01);
    bf.add(b"only");
    assert!(bf.may_contain(b"only"));
}

#[test]
fn very_low_fpr() {
    let bf = BloomFilter::new(100, 0.0001);
    // Should have many bits and hashes
    assert!(bf.bit_size() > 1000);
    assert!(bf.hash_functions() > 5);
}

#[test]
fn high_fpr_still_works() {
    let mut bf = BloomFilter::new(100, 0.5);
    bf.add(b"test");
    assert!(bf.may_contain(b"test"));
}
