//! End-to-end scenarios (spec §8, S1-S6), exercised against the public API.

use zbytes::{content_equals, hash, hash32, AtomicPrimitives, Bytes, ByteStore, HeapStore, RandomInput, RandomOutput};

#[test]
fn s1_heap_round_trip() {
    let c = Bytes::wrap_heap(vec![0u8; 1024]).unwrap();

    c.store().write_u8(1, 0x0a).unwrap();
    c.store().write_u16(2, 0xAA).unwrap();
    c.store().write_u32(4, 0xABCD).unwrap();
    c.store().write_u64(8, 0xFF_ABCD).unwrap();
    c.store().write_f32(16, 255.0).unwrap();
    c.store().write_f64(20, 0xFF_FFFF as f64).unwrap();

    assert_eq!(c.store().read_u8(1).unwrap(), 0x0a);
    assert_eq!(c.store().read_u16(2).unwrap(), 0xAA);
    assert_eq!(c.store().read_u32(4).unwrap(), 0xABCD);
    assert_eq!(c.store().read_u64(8).unwrap(), 0xFF_ABCD);
    assert_eq!(c.store().read_f32(16).unwrap(), 255.0);
    assert_eq!(c.store().read_f64(20).unwrap(), 0xFF_FFFF as f64);

    assert_eq!(c.read_limit(), 1024);
}

#[test]
fn s2_sequential_cursor() {
    let c = Bytes::fixed_capacity(64, true).unwrap();

    c.write_u8(0x0a).unwrap();
    c.write_u16(0xAA).unwrap();
    c.write_u32(0xABCD).unwrap();
    c.write_u64(0xFF_ABCD).unwrap();
    c.write_f32(255.0).unwrap();
    c.write_f64(0xFF_FFFF as f64).unwrap();

    assert_eq!(c.write_position(), 27);
    assert_eq!(c.read_position(), 0);

    assert_eq!(c.read_u8().unwrap(), 0x0a);
    assert_eq!(c.read_u16().unwrap(), 0xAA);
    assert_eq!(c.read_u32().unwrap(), 0xABCD);
    assert_eq!(c.read_u64().unwrap(), 0xFF_ABCD);
    assert_eq!(c.read_f32().unwrap(), 255.0);
    assert_eq!(c.read_f64().unwrap(), 0xFF_FFFF as f64);

    assert_eq!(c.read_position(), 27);
}

#[test]
fn s3_elastic_growth() {
    let c = Bytes::elastic_buffer(1024, Some(65536)).unwrap();

    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    c.write_bytes(&payload).unwrap();
    assert_eq!(c.write_position(), 5000);
    assert!(c.store().size() >= 5000);

    c.set_read_position(0).unwrap();
    let mut out = vec![0u8; 5000];
    c.read_bytes(&mut out).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn s4_content_equality_with_trailing_zeros() {
    let a = HeapStore::wrap(vec![1, 2, 3, 4, 5]);
    let b = HeapStore::wrap(vec![1, 2, 3, 4, 5, 0, 0, 0]);
    assert!(content_equals(&a, &b).unwrap());

    let b_nonzero_tail = HeapStore::wrap(vec![1, 2, 3, 4, 5, 0, 1, 0]);
    assert!(!content_equals(&a, &b_nonzero_tail).unwrap());
}

#[test]
fn s5_cas_contention_single_writer() {
    let store = HeapStore::fixed_capacity(4);
    store.write_u32(0, 0).unwrap();
    for _ in 0..1_000_000 {
        store.add_and_get_i32(0, 1).unwrap();
    }
    assert_eq!(store.read_u32_volatile(0).unwrap(), 1_000_000);
}

#[test]
fn s6_hash_stability() {
    let bytes: Vec<u8> = (0u8..32).collect();
    let store = HeapStore::wrap(bytes.clone());
    let h1 = hash(&store, 0, 32).unwrap();

    for i in 0..bytes.len() {
        let mut mutated = bytes.clone();
        mutated[i] ^= 0xFF;
        let mutated_store = HeapStore::wrap(mutated);
        assert_ne!(hash(&mutated_store, 0, 32).unwrap(), h1, "byte {i} mutation did not change the hash");
    }

    assert_eq!(hash32(h1), (h1 ^ (h1 >> 32)) as i32);
}
