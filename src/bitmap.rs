//! Module `bitmap` implement the deleted-documents bitmap carried by every
//! segment of a [snapshot][crate::index::Snapshot], backed by a
//! [roaring bitmap][roaring-bitmap].
//!
//! A document is visible iff its local number is absent from the bitmap.
//! Bitmaps are immutable once attached to a snapshot; deletions accumulate by
//! building a new bitmap as the union of the old one and the fresh deletions.
//!
//! [roaring-bitmap]: https://roaringbitmap.org

use croaring::Bitmap;

use std::fmt;

/// Set of locally-numbered documents suppressed from a segment.
#[derive(Clone)]
pub struct DeleteBitmap {
    bitmap: Bitmap,
}

impl Default for DeleteBitmap {
    fn default() -> DeleteBitmap {
        DeleteBitmap::new()
    }
}

impl fmt::Debug for DeleteBitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DeleteBitmap<{}>", self.bitmap.cardinality())
    }
}

impl PartialEq for DeleteBitmap {
    fn eq(&self, other: &DeleteBitmap) -> bool {
        self.bitmap == other.bitmap
    }
}

impl DeleteBitmap {
    pub fn new() -> DeleteBitmap {
        DeleteBitmap {
            bitmap: Bitmap::create(),
        }
    }

    #[inline]
    pub fn add(&mut self, doc: u32) {
        self.bitmap.add(doc)
    }

    #[inline]
    pub fn contains(&self, doc: u32) -> bool {
        self.bitmap.contains(doc)
    }

    #[inline]
    pub fn cardinality(&self) -> u64 {
        self.bitmap.cardinality()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Union of both bitmaps, as a fresh value.
    pub fn or(&self, other: &DeleteBitmap) -> DeleteBitmap {
        DeleteBitmap {
            bitmap: self.bitmap.or(&other.bitmap),
        }
    }

    /// Documents present in self but not in `other`. Used to recover the
    /// deletions that landed while a merge was running.
    pub fn andnot(&self, other: &DeleteBitmap) -> DeleteBitmap {
        DeleteBitmap {
            bitmap: self.bitmap.andnot(&other.bitmap),
        }
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.bitmap.to_vec()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bitmap.serialize()
    }

    pub fn from_bytes(buf: &[u8]) -> DeleteBitmap {
        DeleteBitmap {
            bitmap: Bitmap::deserialize(buf),
        }
    }
}

impl std::iter::FromIterator<u32> for DeleteBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> DeleteBitmap {
        let mut val = DeleteBitmap::new();
        for doc in iter {
            val.add(doc);
        }
        val
    }
}

#[cfg(test)]
#[path = "bitmap_test.rs"]
mod bitmap_test;
