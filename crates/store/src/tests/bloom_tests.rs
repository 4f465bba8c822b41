use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::helpers::{build_store, open_store};
use crate::ConfigBuilder;

// -------------------- Metadata plumbing --------------------

#[test]
fn disabled_by_default() {
    let (_dir, path) = build_store(
        ConfigBuilder::new().build(),
        &[(b"key".to_vec(), b"value".to_vec())],
    );
    assert!(open_store(&path).bloom_filter().is_none());
}

#[test]
fn embedded_filter_round_trips_through_the_metadata() {
    let pairs: Vec<_> = (0..2000u64)
        .map(|i| (i.to_be_bytes().to_vec(), format!("{}", i).into_bytes()))
        .collect();
    let (_dir, path) = build_store(
        ConfigBuilder::new().with_bloom_filter(true).build(),
        &pairs,
    );
    let reader = open_store(&path);

    let filter = reader.bloom_filter().expect("bloom filter embedded");
    assert!(filter.bit_size() > 0);
    assert!(filter.hash_functions() > 0);

    for (key, _) in &pairs {
        assert!(filter.may_contain(key), "inserted key must test positive");
    }
}

#[test]
fn bloom_enabled_empty_store_still_opens() {
    let (_dir, path) = build_store(ConfigBuilder::new().with_bloom_filter(true).build(), &[]);
    let reader = open_store(&path);
    assert!(reader.bloom_filter().is_some());
    assert_eq!(reader.get(b"k").unwrap(), None);
}

// -------------------- Soundness and error rate --------------------

#[test]
fn no_false_negatives_and_bounded_false_positives() {
    const TARGET_ERROR: f64 = 0.01;
    const KEYS: usize = 100_000;
    const PROBES: usize = 1_000_000;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut inserted = HashSet::new();
    while inserted.len() < KEYS {
        inserted.insert(rng.gen::<u64>());
    }

    let pairs: Vec<_> = inserted
        .iter()
        .map(|&k| (k.to_be_bytes().to_vec(), k.to_le_bytes().to_vec()))
        .collect();

    let config = ConfigBuilder::new()
        .with_bloom_filter(true)
        .with_bloom_error_factor(TARGET_ERROR)
        .build();
    let (_dir, path) = build_store(config, &pairs);
    let reader = open_store(&path);
    let filter = reader.bloom_filter().expect("bloom filter embedded");

    // No false negatives: every inserted key tests positive, and the
    // full lookup finds its value.
    for (key, value) in pairs.iter().take(10_000) {
        assert!(filter.may_contain(key));
        assert_eq!(reader.get(key).unwrap(), Some(value.as_slice()));
    }

    // False positives stay within 2x the configured target.
    let mut false_positives = 0usize;
    let mut probed = 0usize;
    while probed < PROBES {
        let candidate = rng.gen::<u64>();
        if inserted.contains(&candidate) {
            continue;
        }
        probed += 1;
        if filter.may_contain(&candidate.to_be_bytes()) {
            false_positives += 1;
        }
    }
    let rate = false_positives as f64 / PROBES as f64;
    assert!(
        rate <= TARGET_ERROR * 2.0,
        "false positive rate {:.4} exceeds twice the target {:.4}",
        rate,
        TARGET_ERROR
    );

    // Misses still answer None through the full lookup path.
    assert_eq!(reader.get(b"not-a-key").unwrap(), None);
}
