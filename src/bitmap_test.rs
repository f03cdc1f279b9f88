use super::*;

#[test]
fn test_basic() {
    let mut bitmap = DeleteBitmap::new();
    assert!(bitmap.is_empty());

    bitmap.add(3);
    bitmap.add(7);
    bitmap.add(3);
    assert_eq!(bitmap.cardinality(), 2);
    assert!(bitmap.contains(3));
    assert!(!bitmap.contains(4));
    assert_eq!(bitmap.to_vec(), vec![3, 7]);
}

#[test]
fn test_bytes_roundtrip() {
    let bitmap: DeleteBitmap = (0..1000_u32).filter(|n| n % 3 == 0).collect();
    let bytes = bitmap.to_bytes();
    let got = DeleteBitmap::from_bytes(&bytes);
    assert_eq!(got, bitmap);
    assert_eq!(got.cardinality(), 334);
}

#[test]
fn test_or_andnot() {
    let a: DeleteBitmap = vec![1_u32, 2, 3].into_iter().collect();
    let b: DeleteBitmap = vec![3_u32, 4].into_iter().collect();

    let union = a.or(&b);
    assert_eq!(union.to_vec(), vec![1, 2, 3, 4]);

    // deletions that landed after a point in time
    let extra = union.andnot(&a);
    assert_eq!(extra.to_vec(), vec![4]);
}
