use super::*;

#[test]
fn test_varint() {
    let mut buf = vec![];
    for val in [0_u64, 1, 127, 128, 300, 16_383, 16_384, u64::MAX].iter() {
        buf.clear();
        encode_varint(*val, &mut buf);
        let (got, n) = decode_varint(&buf).unwrap();
        assert_eq!(got, *val);
        assert_eq!(n, buf.len());
    }
}

#[test]
fn test_varint_truncated() {
    let mut buf = vec![];
    encode_varint(16_384, &mut buf);
    assert!(decode_varint(&buf[..1]).is_err());
}

#[test]
fn test_increment_bytes() {
    assert_eq!(increment_bytes(b"abc").unwrap(), b"abd".to_vec());
    assert_eq!(increment_bytes(&[0x61, 0xff]).unwrap(), vec![0x62]);
    assert_eq!(increment_bytes(&[0xff, 0xff]), None);
    assert_eq!(increment_bytes(b""), None);
}

#[test]
fn test_cbor_roundtrip() {
    let val = "hello world".to_string();
    let data = into_cbor_bytes(val.clone()).unwrap();
    let (got, n) = from_cbor_bytes::<String>(&data).unwrap();
    assert_eq!(got, val);
    assert_eq!(n, data.len());
}
