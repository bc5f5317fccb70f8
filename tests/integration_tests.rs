use std::collections::HashSet;
use std::mem;

use stratum::prelude::*;

fn encode<T: Copy, const N: usize>(keys: &[T], to_bytes: fn(T) -> [u8; N]) -> Vec<u8> {
    keys.iter().flat_map(|&k| to_bytes(k)).collect()
}

fn sort_packed(base: &mut [u8], count: usize, key_type: KeyType, order: SortOrder) {
    let mut scratch = vec![0u8; base.len()];
    radix_sort(
        base,
        &mut scratch,
        count,
        RecordLayout::packed(key_type),
        key_type,
        order,
    );
}

fn words(buffer: &mut [u64]) -> &mut [u8] {
    let len = mem::size_of_val(buffer);
    unsafe { std::slice::from_raw_parts_mut(buffer.as_mut_ptr().cast::<u8>(), len) }
}

#[test]
fn test_signed_32_ascending() {
    let keys = [i32::MAX, 0, -1, i32::MIN, 1, -2, 5];
    let mut base = encode(&keys, i32::to_ne_bytes);

    sort_packed(&mut base, keys.len(), KeyType::I32, SortOrder::Ascending);

    let sorted: Vec<i32> = base
        .chunks_exact(4)
        .map(|b| i32::from_ne_bytes(b.try_into().unwrap()))
        .collect();
    assert_eq!(sorted, vec![i32::MIN, -2, -1, 0, 1, 5, i32::MAX]);
}

#[test]
fn test_float64_ascending_with_infinities_and_zeros() {
    let keys = [
        f64::INFINITY,
        f64::NEG_INFINITY,
        0.0,
        -0.0,
        1.0,
        -1.0,
        4.9406564584124654e-324,
    ];
    let mut base = encode(&keys, f64::to_ne_bytes);

    sort_packed(&mut base, keys.len(), KeyType::F64, SortOrder::Ascending);

    let sorted: Vec<f64> = base
        .chunks_exact(8)
        .map(|b| f64::from_ne_bytes(b.try_into().unwrap()))
        .collect();

    assert_eq!(sorted[0], f64::NEG_INFINITY);
    assert_eq!(sorted[1], -1.0);
    // Both zeros present exactly once, negative zero first.
    assert!(sorted[2] == 0.0 && sorted[2].is_sign_negative());
    assert!(sorted[3] == 0.0 && sorted[3].is_sign_positive());
    assert_eq!(sorted[4], 4.9406564584124654e-324);
    assert_eq!(sorted[5], 1.0);
    assert_eq!(sorted[6], f64::INFINITY);
}

#[test]
fn test_descending_unsigned_8() {
    let mut base = vec![0u8, 255, 128, 1, 200];
    sort_packed(&mut base, 5, KeyType::U8, SortOrder::Descending);
    assert_eq!(base, vec![255, 200, 128, 1, 0]);
}

#[test]
fn test_multi_field_records_sorted_by_float_field() {
    // 32-byte records: [id: u32][a: u32][b: u32][score: f32][payload: 16 bytes]
    const STRIDE: usize = 32;
    let scores = [3.5f32, -2.0, 0.0, 9.25, -0.5, 1e-3, -7.75, 2.0, f32::MAX, -0.0];

    let mut base = Vec::with_capacity(scores.len() * STRIDE);
    for (id, &score) in scores.iter().enumerate() {
        let id = id as u32;
        base.extend_from_slice(&id.to_ne_bytes());
        base.extend_from_slice(&(id * 3).to_ne_bytes());
        base.extend_from_slice(&(id ^ 0xABCD).to_ne_bytes());
        base.extend_from_slice(&score.to_ne_bytes());
        base.extend_from_slice(&[id as u8; 16]);
    }
    let before: Vec<Vec<u8>> = base.chunks_exact(STRIDE).map(<[u8]>::to_vec).collect();

    let mut scratch = vec![0u8; base.len()];
    radix_sort(
        &mut base,
        &mut scratch,
        scores.len(),
        RecordLayout::new(STRIDE, 12),
        KeyType::F32,
        SortOrder::Ascending,
    );

    let field =
        |record: &[u8], at: usize| u32::from_ne_bytes(record[at..at + 4].try_into().unwrap());
    let sorted_scores: Vec<f32> = base
        .chunks_exact(STRIDE)
        .map(|r| f32::from_bits(field(r, 12)))
        .collect();
    assert!(
        sorted_scores.windows(2).all(|w| w[0].total_cmp(&w[1]).is_le()),
        "{sorted_scores:?}"
    );

    // Every other field travelled with its key.
    for record in base.chunks_exact(STRIDE) {
        let id = field(record, 0);
        assert_eq!(field(record, 4), id * 3);
        assert_eq!(field(record, 8), id ^ 0xABCD);
        assert_eq!(f32::from_bits(field(record, 12)).to_bits(), scores[id as usize].to_bits());
        assert!(record[16..].iter().all(|&b| b == id as u8));
    }

    let mut after: Vec<Vec<u8>> = base.chunks_exact(STRIDE).map(<[u8]>::to_vec).collect();
    let mut before = before;
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[test]
fn test_pool_exhaustion() {
    let mut buffer = [0u64; 10];
    let mut pool = Pool::new(8, 10, words(&mut buffer)).unwrap();

    let slots: Vec<_> = (0..10).map(|_| pool.alloc()).collect();
    assert!(slots.iter().all(Option::is_some));
    assert!(pool.alloc().is_none());

    let slots: Vec<_> = slots.into_iter().flatten().collect();
    pool.free(slots[4]);
    assert_eq!(pool.alloc(), Some(slots[4]));

    slots.iter().for_each(|&slot| pool.free(slot));
    assert_eq!(pool.live(), 0);

    let again: Vec<_> = (0..10).map(|_| pool.alloc()).collect();
    assert!(again.iter().all(Option::is_some));
    assert!(pool.alloc().is_none());
}

#[test]
fn test_arena_across_block_boundaries() {
    let mut arena = Arena::new(50).unwrap();

    let first: Vec<usize> = (0..1000)
        .map(|_| arena.alloc(8, 8).unwrap().as_ptr() as usize)
        .collect();

    assert!(first.iter().all(|addr| addr % 8 == 0));
    let mut spans = first.clone();
    spans.sort_unstable();
    assert!(spans.windows(2).all(|w| w[0] + 8 <= w[1]), "overlapping spans");
    assert!(arena.block_count() > 1);

    let blocks = arena.block_count();
    let capacity = arena.capacity();
    arena.reset();

    let second: Vec<usize> = (0..1000)
        .map(|_| arena.alloc(8, 8).unwrap().as_ptr() as usize)
        .collect();

    assert_eq!(arena.block_count(), blocks);
    assert_eq!(arena.capacity(), capacity);
    assert!(second.iter().all(|&addr| arena.contains(addr as *const u8)));
    let reserved: HashSet<usize> = first.into_iter().collect();
    assert!(second.iter().all(|addr| reserved.contains(addr)));
}

#[test]
fn test_arena_values_survive_reset_replay() {
    let mut arena = Arena::new(64).unwrap();
    let sizes = [3usize, 40, 17, 128, 1, 9, 300];

    let run = |arena: &mut Arena| -> Vec<*mut u8> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let ptr = arena.alloc(size, 1 << (i % 4)).unwrap().as_ptr();
                unsafe { ptr.write_bytes(i as u8 + 1, size) };
                ptr
            })
            .collect()
    };

    let before = run(&mut arena);
    arena.reset();
    let after = run(&mut arena);
    assert_eq!(before, after);

    for (i, (&ptr, &size)) in after.iter().zip(&sizes).enumerate() {
        let bytes = unsafe { std::slice::from_raw_parts(ptr, size) };
        assert!(bytes.iter().all(|&b| b == i as u8 + 1));
    }
}

#[test]
fn test_static_arena_exhaustion_and_reset() {
    let mut buffer = [0u64; 8];
    let mut arena = StaticArena::new(words(&mut buffer));

    let a = arena.alloc(32, 8).unwrap();
    assert!(arena.alloc(32, 8).is_some());
    assert!(arena.alloc(1, 1).is_none());

    arena.reset();
    assert_eq!(arena.alloc(32, 8), Some(a));
}

#[test]
fn test_sort_with_arena_scratch() {
    let keys: Vec<u64> = (0..500u64).map(|i| (i * 7919) % 1000).collect();
    let mut base = encode(&keys, u64::to_ne_bytes);
    let mut arena = Arena::new(256).unwrap();

    radix_sort_with(
        &mut arena,
        &mut base,
        keys.len(),
        RecordLayout::packed(KeyType::U64),
        KeyType::U64,
        SortOrder::Ascending,
    )
    .unwrap();

    let layout = RecordLayout::packed(KeyType::U64);
    let order = SortOrder::Ascending;
    assert!(stratum::is_sorted(&base, keys.len(), layout, KeyType::U64, order).unwrap());
    assert!(arena.used() >= base.len());
}
