//! Content equality (spec §4.6, component C6).
//!
//! Compares the full extent of two stores (the `readRemaining()` of a store
//! in isolation is its whole `size()`; a cursor that has narrowed its
//! readable range would slice before calling in, which this module does not
//! need to know about). Trailing-zero extension lets a shorter store still
//! compare equal to a longer one whose tail is all zero bytes (spec's S4
//! scenario).

use crate::config::config;
use crate::error::{BufferError, Result};
use crate::store::ByteStore;

/// `true` if `a` and `b` hold the same content under zero-extension
/// equality: equal bytes over the shorter length, and an all-zero tail on
/// whichever store is longer.
pub fn content_equals(a: &dyn ByteStore, b: &dyn ByteStore) -> Result<bool> {
    if a.is_released() || b.is_released() {
        return Err(BufferError::Released);
    }

    let (len_a, len_b) = (a.size(), b.size());
    let common = len_a.min(len_b);

    let common_equal = match (a.unchecked_view(), b.unchecked_view()) {
        (Some(va), Some(vb)) => unchecked_equal(va.as_slice(), vb.as_slice(), common),
        _ => checked_equal(a, b, common)?,
    };
    if !common_equal {
        return Ok(false);
    }

    if len_a > common {
        tail_is_zero(a, common, len_a)
    } else if len_b > common {
        tail_is_zero(b, common, len_b)
    } else {
        Ok(true)
    }
}

/// The vectorized-when-available comparison over `[0, common)` when both
/// stores expose the unchecked random-input capability (spec §4.4.2, §4.6).
fn unchecked_equal(a: &[u8], b: &[u8], common: usize) -> bool {
    let (a, b) = (&a[..common], &b[..common]);
    if !config().vectorized_equals_disabled && common > 7 && common <= i32::MAX as usize {
        // A direct slice comparison: LLVM lowers this to a vectorized
        // `memcmp`, the Rust-native equivalent of spec's "vectorized
        // memory-comparison primitive".
        return a == b;
    }
    word_stride_equal(a, b, common)
}

/// Word-stride-then-byte-stride comparison for the non-vectorized path,
/// reading through each store's checked offset API.
fn checked_equal(a: &dyn ByteStore, b: &dyn ByteStore, common: usize) -> Result<bool> {
    let mut offset = 0usize;
    while offset + 8 <= common {
        if a.read_u64(offset)? != b.read_u64(offset)? {
            return Ok(false);
        }
        offset += 8;
    }
    while offset < common {
        if a.read_u8(offset)? != b.read_u8(offset)? {
            return Ok(false);
        }
        offset += 1;
    }
    Ok(true)
}

fn word_stride_equal(a: &[u8], b: &[u8], common: usize) -> bool {
    let mut offset = 0usize;
    while offset + 8 <= common {
        let wa = u64::from_ne_bytes(a[offset..offset + 8].try_into().unwrap());
        let wb = u64::from_ne_bytes(b[offset..offset + 8].try_into().unwrap());
        if wa != wb {
            return false;
        }
        offset += 8;
    }
    a[offset..common] == b[offset..common]
}

/// Whether `store[from..to)` is all zero bytes (the zero-extension rule).
fn tail_is_zero(store: &dyn ByteStore, from: usize, to: usize) -> Result<bool> {
    if let Some(view) = store.unchecked_view() {
        return Ok(view.as_slice()[from..to].iter().all(|&b| b == 0));
    }
    let mut offset = from;
    while offset < to {
        if store.read_u8(offset)? != 0 {
            return Ok(false);
        }
        offset += 1;
    }
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::{HeapStore, NativeStore};

    #[test]
    fn equal_bytes_are_equal() {
        let a = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
        let b = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
        assert!(content_equals(&a, &b).unwrap());
    }

    #[test]
    fn trailing_zeros_extend_equality() {
        let a = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
        let b = HeapStore::wrap(vec![1, 2, 3, 4, 5, 0, 0, 0]);
        assert!(content_equals(&a, &b).unwrap());
        assert!(content_equals(&b, &a).unwrap());
    }

    #[test]
    fn nonzero_tail_breaks_equality() {
        let a = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
        let b = HeapStore::wrap(vec![1, 2, 3, 4, 5, 0, 9, 0]);
        assert!(!content_equals(&a, &b).unwrap());
    }

    #[test]
    fn differing_bytes_are_unequal() {
        let a = HeapStore::wrap(vec![1, 2, 3]);
        let b = HeapStore::wrap(vec![1, 2, 4]);
        assert!(!content_equals(&a, &b).unwrap());
    }

    #[test]
    fn heap_and_native_stores_compare_across_backings() {
        let a = HeapStore::wrap(vec![9u8; 40]);
        let b = NativeStore::fixed_capacity(40, true).unwrap();
        b.write_bytes(0, &[9u8; 40]).unwrap();
        assert!(content_equals(&a, &b).unwrap());
    }

    #[test]
    fn released_store_fails() {
        let a = HeapStore::fixed_capacity(4);
        let owner = crate::refcount::OwnerToken::new();
        a.reserve(owner).unwrap();
        a.release(owner);
        let b = HeapStore::fixed_capacity(4);
        assert_eq!(content_equals(&a, &b), Err(BufferError::Released));
    }
}
