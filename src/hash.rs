//! The content-hash capability (spec §4.5, component C5).
//!
//! A length-conditioned 64-bit mixer over a store range, with two
//! specializations selected automatically: when the store hands back a
//! native address via [`ByteStore::address_for_read`] the hash runs directly
//! off that pointer (spec's "optimized" path); otherwise it falls back to the
//! store's logical read API (spec's "vanilla" path). Both funnel through the
//! same [`hash_core`] so the two variants can never drift apart.
//!
//! The eight domain constants (`K0..K3`, `M0..M3`) are fixed by literal
//! values in the source the spec distills; only their structural role — four
//! 32-bit "key" constants used for re-mixing between blocks, four 32-bit
//! "mix" constants used in the per-block update — survives distillation. The
//! values below are the xxHash/MurmurHash finalizer family of odd 32-bit
//! mixing constants, widened to `u64`; any other well-distributed odd 32-bit
//! constants would serve the same structural role.

use crate::error::{BufferError, Result};
use crate::memory;
use crate::store::ByteStore;

const K0: u64 = 0x9E37_79B1;
const K1: u64 = 0x85EB_CA77;
const K2: u64 = 0xC2B2_AE3D;
const K3: u64 = 0x27D4_EB2F;

const M0: u64 = 0x1656_67B1;
const M1: u64 = 0x1B87_3593;
const M2: u64 = 0xCC9E_2D51;
const M3: u64 = 0xE654_6B64;

/// `x XOR rotl(x, 26) XOR rotr(x, 17)` (spec §4.5).
#[inline]
fn agitate(x: u64) -> u64 {
    x ^ x.rotate_left(26) ^ x.rotate_right(17)
}

/// A source of 64-bit words for [`hash_core`]: either a raw native address
/// (optimized path) or a store's logical offset API (vanilla path).
trait HashSource {
    /// Reads a full 8-byte word at `offset` (relative to the hashed range).
    fn read_u64(&self, offset: usize) -> Result<u64>;
    /// Assembles a zero-extended word from `len` (`1..=7`) available bytes at
    /// `offset`.
    fn read_tail(&self, offset: usize, len: usize) -> Result<u64>;
}

struct NativeSource {
    base: *const u8,
}

impl HashSource for NativeSource {
    fn read_u64(&self, offset: usize) -> Result<u64> {
        // SAFETY: the caller (`hash`) only constructs this source after
        // confirming `address_for_read` succeeded for the full `[offset,
        // offset + len)` range being hashed.
        Ok(unsafe { memory::read_u64(self.base.add(offset).cast()) })
    }

    fn read_tail(&self, offset: usize, len: usize) -> Result<u64> {
        debug_assert!((1..8).contains(&len));
        let mut buf = [0u8; 7];
        // SAFETY: same range guarantee as `read_u64`.
        unsafe { core::ptr::copy_nonoverlapping(self.base.add(offset), buf.as_mut_ptr(), len) };
        Ok(memory::assemble_incomplete_long(&buf[..len]))
    }
}

struct StoreSource<'a> {
    store: &'a dyn ByteStore,
    base: usize,
}

impl HashSource for StoreSource<'_> {
    fn read_u64(&self, offset: usize) -> Result<u64> {
        self.store.read_u64(self.base + offset)
    }

    fn read_tail(&self, offset: usize, len: usize) -> Result<u64> {
        debug_assert!((1..8).contains(&len));
        let mut buf = [0u8; 7];
        self.store.read_bytes(self.base + offset, &mut buf[..len])?;
        Ok(memory::assemble_incomplete_long(&buf[..len]))
    }
}

/// Reads an 8-byte word at `offset`, falling back to a zero-extended partial
/// read when fewer than 8 bytes remain before `len`.
fn read_word(src: &impl HashSource, offset: usize, available: usize) -> Result<u64> {
    if available == 0 {
        Ok(0)
    } else if available >= 8 {
        src.read_u64(offset)
    } else {
        src.read_tail(offset, available)
    }
}

/// The shared length-conditioned mixer (spec §4.5 steps 1-6).
fn hash_core(len: usize, src: &impl HashSource) -> Result<u64> {
    if len == 0 {
        return Ok(0);
    }
    if len <= 8 {
        let l = read_word(src, 0, len)?;
        return Ok(agitate(l.wrapping_mul(K0).wrapping_add((l >> 32).wrapping_mul(K1))));
    }

    let mut h0 = (len as u64).wrapping_mul(K0);
    let mut h1 = 0u64;
    let mut h2 = 0u64;
    let mut h3 = 0u64;
    let mut offset = 0usize;
    let mut first_block = true;

    let mut mix = |h0: &mut u64, h1: &mut u64, h2: &mut u64, h3: &mut u64| {
        if !first_block {
            *h0 = h0.wrapping_mul(K0);
            *h1 = h1.wrapping_mul(K1);
            *h2 = h2.wrapping_mul(K2);
            *h3 = h3.wrapping_mul(K3);
        }
        first_block = false;
    };

    while len - offset >= 32 {
        mix(&mut h0, &mut h1, &mut h2, &mut h3);

        let l0 = src.read_u64(offset)?;
        let l1 = src.read_u64(offset + 8)?;
        let l2 = src.read_u64(offset + 16)?;
        let l3 = src.read_u64(offset + 24)?;
        let (hi0, hi1, hi2, hi3) = (l0 >> 32, l1 >> 32, l2 >> 32, l3 >> 32);

        h0 = h0.wrapping_add(l0.wrapping_add(hi1).wrapping_sub(hi2).wrapping_mul(M0));
        h1 = h1.wrapping_add(l1.wrapping_add(hi2).wrapping_sub(hi3).wrapping_mul(M1));
        h2 = h2.wrapping_add(l2.wrapping_add(hi3).wrapping_sub(hi0).wrapping_mul(M2));
        h3 = h3.wrapping_add(l3.wrapping_add(hi0).wrapping_sub(hi1).wrapping_mul(M3));

        offset += 32;
    }

    let remaining = len - offset;
    if remaining > 0 {
        mix(&mut h0, &mut h1, &mut h2, &mut h3);

        let a0 = remaining.min(8);
        let a1 = remaining.saturating_sub(8).min(8);
        let a2 = remaining.saturating_sub(16).min(8);
        let a3 = remaining.saturating_sub(24).min(8);

        let l0 = read_word(src, offset, a0)?;
        let l1 = read_word(src, offset + 8, a1)?;
        let l2 = read_word(src, offset + 16, a2)?;
        let l3 = read_word(src, offset + 24, a3)?;
        let (hi0, hi1, hi2, hi3) = (l0 >> 32, l1 >> 32, l2 >> 32, l3 >> 32);

        h0 = h0.wrapping_add(l0.wrapping_add(hi1).wrapping_sub(hi2).wrapping_mul(M0));
        h1 = h1.wrapping_add(l1.wrapping_add(hi2).wrapping_sub(hi3).wrapping_mul(M1));
        h2 = h2.wrapping_add(l2.wrapping_add(hi3).wrapping_sub(hi0).wrapping_mul(M2));
        h3 = h3.wrapping_add(l3.wrapping_add(hi0).wrapping_sub(hi1).wrapping_mul(M3));
    }

    Ok(agitate(h0) ^ agitate(h1) ^ agitate(h2) ^ agitate(h3))
}

/// Hashes `len` bytes of `store` starting at `offset` (spec §4.5). Rejects a
/// released store and an out-of-range request the same way random access
/// does.
pub fn hash(store: &dyn ByteStore, offset: usize, len: usize) -> Result<u64> {
    if store.is_released() {
        return Err(BufferError::Released);
    }
    let end = offset.checked_add(len).ok_or(BufferError::Bounds {
        offset,
        advance: len,
        low: 0,
        high: store.size(),
    })?;
    if end > store.size() {
        return Err(BufferError::Bounds {
            offset,
            advance: len,
            low: 0,
            high: store.size(),
        });
    }

    match store.address_for_read(offset) {
        Ok(base) => hash_core(len, &NativeSource { base }),
        Err(_) => hash_core(len, &StoreSource { store, base: offset }),
    }
}

/// Folds the 64-bit hash to 32 bits: `(int)(h XOR (h >> 32))`.
pub fn hash32(h: u64) -> i32 {
    (h ^ (h >> 32)) as i32
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::{HeapStore, NativeStore};

    fn sequential_bytes(n: usize) -> Vec<u8> {
        (0..n).map(|i| i as u8).collect()
    }

    #[test]
    fn empty_range_hashes_to_zero() {
        let store = HeapStore::fixed_capacity(0);
        assert_eq!(hash(&store, 0, 0).unwrap(), 0);
    }

    #[test]
    fn heap_and_native_stores_agree_on_the_same_bytes() {
        let payload = sequential_bytes(32);
        let heap = HeapStore::wrap(payload.clone());
        let native = NativeStore::fixed_capacity(32, false).unwrap();
        native.write_bytes(0, &payload).unwrap();

        let heap_hash = hash(&heap, 0, 32).unwrap();
        let native_hash = hash(&native, 0, 32).unwrap();
        assert_eq!(heap_hash, native_hash);
    }

    #[test]
    fn single_byte_mutation_changes_the_hash() {
        let store = HeapStore::wrap(sequential_bytes(32));
        let h1 = hash(&store, 0, 32).unwrap();

        let mutated = HeapStore::wrap({
            let mut v = sequential_bytes(32);
            v[17] ^= 0xFF;
            v
        });
        let h2 = hash(&mutated, 0, 32).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash32_folds_both_halves() {
        let h: u64 = 0x1234_5678_9ABC_DEF0;
        assert_eq!(hash32(h), (h ^ (h >> 32)) as i32);
    }

    #[test]
    fn odd_length_tail_is_stable_across_calls() {
        let store = HeapStore::wrap(sequential_bytes(41));
        let a = hash(&store, 0, 41).unwrap();
        let b = hash(&store, 0, 41).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn released_store_fails() {
        let store = HeapStore::fixed_capacity(8);
        let owner = crate::refcount::OwnerToken::new();
        store.reserve(owner).unwrap();
        store.release(owner);
        assert_eq!(hash(&store, 0, 8), Err(BufferError::Released));
    }
}
