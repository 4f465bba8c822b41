use super::*;

// -------------------- Round trips --------------------

#[test]
fn long_roundtrip_small_values() {
    for v in 0..=300u64 {
        let mut buf = Vec::new();
        pack_long(&mut buf, v).unwrap();
        assert_eq!(unpack_long(&mut &buf[..]).unwrap(), v, "value {}", v);
    }
}

#[test]
fn long_roundtrip_group_boundaries() {
    // Each 7-bit group boundary changes the encoded length by one byte.
    for shift in 1..9u32 {
        let boundary = 1u64 << (7 * shift);
        for v in [boundary - 1, boundary, boundary + 1] {
            let mut buf = Vec::new();
            let n = pack_long(&mut buf, v).unwrap();
            assert_eq!(n, buf.len());
            assert_eq!(unpack_long(&mut &buf[..]).unwrap(), v, "value {}", v);
        }
    }
}

#[test]
fn long_roundtrip_largest_supported() {
    let v = (1u64 << 63) - 1;
    let mut buf = Vec::new();
    let n = pack_long(&mut buf, v).unwrap();
    assert_eq!(n, MAX_LONG_BYTES);
    assert_eq!(unpack_long(&mut &buf[..]).unwrap(), v);
}

#[test]
fn int_roundtrip() {
    for v in [0u32, 1, 127, 128, 16_383, 16_384, 1 << 21, u32::MAX] {
        let mut buf = Vec::new();
        let n = pack_int(&mut buf, v).unwrap();
        assert!(n <= MAX_INT_BYTES);
        assert_eq!(unpack_int(&mut &buf[..]).unwrap(), v, "value {}", v);
    }
}

// -------------------- Encoded lengths --------------------

#[test]
fn encoded_length_matches_bytes_written() {
    for v in [0u64, 127, 128, 300, 1 << 14, 1 << 21, 1 << 42, 1 << 62] {
        let mut buf = Vec::new();
        let n = pack_long(&mut buf, v).unwrap();
        assert_eq!(n, buf.len(), "value {}", v);
    }
}

#[test]
fn single_byte_values() {
    for v in 0..=0x7Fu64 {
        let mut buf = Vec::new();
        assert_eq!(pack_long(&mut buf, v).unwrap(), 1);
    }
}

// -------------------- Buffer form --------------------

#[test]
fn buffer_roundtrip_at_offset() {
    // Decode must not depend on buffer length or what precedes the value.
    let mut buf = vec![0xFFu8; 4];
    let mut encoded = Vec::new();
    pack_long(&mut encoded, 1_234_567).unwrap();
    buf.extend_from_slice(&encoded);
    buf.extend_from_slice(&[0xAA; 8]);

    assert_eq!(unpack_long_at(&buf, 4).unwrap(), 1_234_567);
}

#[test]
fn pack_into_matches_stream_form() {
    for v in [0u64, 5, 130, 99_999, 1 << 40] {
        let mut stream = Vec::new();
        let n_stream = pack_long(&mut stream, v).unwrap();

        let mut buf = [0u8; MAX_LONG_BYTES];
        let n_buf = pack_long_into(&mut buf, v);

        assert_eq!(n_stream, n_buf);
        assert_eq!(&stream[..], &buf[..n_buf]);
    }
}

#[test]
fn zero_padded_tail_is_ignored() {
    // A slot offset field wider than the encoding is zero-padded; the
    // terminator byte must stop the decoder before the padding.
    let mut field = [0u8; 6];
    pack_long_into(&mut field, 300);
    assert_eq!(unpack_long_at(&field, 0).unwrap(), 300);
}

// -------------------- Error cases --------------------

#[test]
fn overflow_is_rejected() {
    let buf = [0x80u8; MAX_LONG_BYTES + 1];
    assert!(matches!(
        unpack_long(&mut &buf[..]),
        Err(VarintError::Overflow)
    ));
    assert!(matches!(
        unpack_long_at(&buf, 0),
        Err(VarintError::Overflow)
    ));

    let buf = [0x80u8; MAX_INT_BYTES + 1];
    assert!(matches!(unpack_int(&mut &buf[..]), Err(VarintError::Overflow)));
}

#[test]
fn truncated_stream_is_io_error() {
    let buf = [0x80u8, 0x80];
    assert!(matches!(unpack_long(&mut &buf[..]), Err(VarintError::Io(_))));
}

#[test]
fn out_of_bounds_buffer_read_is_io_error() {
    let buf = [0x80u8, 0x80];
    assert!(matches!(unpack_long_at(&buf, 0), Err(VarintError::Io(_))));
    assert!(matches!(unpack_long_at(&buf, 5), Err(VarintError::Io(_))));
}
