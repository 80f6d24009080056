// Integration tests for the Pool handle API
// Tests cover: handle semantics, allocation policy, compaction, errors, tickets

use strpool::{MAX_STRING_LEN, Pool, PoolConfig, PoolError, RECORD_OVERHEAD, pool_format};

fn small_config() -> PoolConfig {
    PoolConfig::default()
        .with_initial_capacity(128)
        .with_handle_slack(8)
}

/// Record size of a non-empty payload.
fn record(len: usize) -> usize {
    len + RECORD_OVERHEAD
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_hello_dolly() {
    let mut pool = Pool::new();

    pool.assign(4, b"Hello ").unwrap();
    pool.append(4, b"Dolly").unwrap();
    assert_eq!(pool.get(4).unwrap(), b"Hello Dolly");

    // Copies are independent of their source.
    pool.copy(5, 4).unwrap();
    pool.set_byte(4, 0, b'J').unwrap();
    assert_eq!(pool.get(5).unwrap(), b"Hello Dolly");
    assert_eq!(pool.get(4).unwrap(), b"Jello Dolly");

    assert_eq!(pool.find(5, b"Doll").unwrap(), Some(6));

    let content = pool.to_bytes(4).unwrap();
    pool.substring(7, &content, 6, 5).unwrap();
    assert_eq!(pool.get(7).unwrap(), b"Dolly");

    assert_eq!(pool.count(), 8);
}

#[test]
fn test_unwritten_handles_below_count_read_empty() {
    let mut pool = Pool::new();
    pool.assign(20, b"far").unwrap();

    assert_eq!(pool.count(), 21);
    for h in 0..20 {
        assert_eq!(pool.get(h).unwrap(), b"", "handle {h} should be empty");
        assert_eq!(pool.len(h).unwrap(), 0);
        assert!(pool.is_empty(h).unwrap());
    }
}

#[test]
fn test_read_at_or_above_count_is_invalid() {
    let mut pool = Pool::new();
    pool.assign(2, b"x").unwrap();

    for h in [3, 4, 1000] {
        assert!(
            matches!(pool.get(h), Err(PoolError::InvalidHandle { limit: 3, .. })),
            "handle {h} should be rejected"
        );
    }
    assert!(pool.len(3).is_err());
    assert!(pool.byte_at(3, 0).is_err());
    assert!(pool.copy(0, 3).is_err());
    assert_eq!(pool.count(), 3, "failed copy must not extend count");
}

#[test]
fn test_assign_until_nul() {
    let mut pool = Pool::new();
    pool.assign_until_nul(0, b"abc\0def").unwrap();
    pool.assign_until_nul(1, b"no terminator").unwrap();
    pool.assign_until_nul(2, b"\0").unwrap();

    assert_eq!(pool.get(0).unwrap(), b"abc");
    assert_eq!(pool.get(1).unwrap(), b"no terminator");
    assert_eq!(pool.get(2).unwrap(), b"");
}

#[test]
fn test_append_from_self_doubles() {
    let mut pool = Pool::new();
    pool.assign(0, b"ab").unwrap();
    pool.append_from(0, 0).unwrap();
    pool.append_from(0, 0).unwrap();
    assert_eq!(pool.get(0).unwrap(), b"abababab");
}

#[test]
fn test_append_from_other_handle() {
    let mut pool = Pool::new();
    pool.assign(0, b"left ").unwrap();
    pool.assign(1, b"right").unwrap();
    pool.append_from(0, 1).unwrap();
    pool.append_from(9, 1).unwrap();

    assert_eq!(pool.get(0).unwrap(), b"left right");
    assert_eq!(pool.get(9).unwrap(), b"right");
    assert_eq!(pool.get(1).unwrap(), b"right");
}

#[test]
fn test_substring_of_overlapping_self() {
    let mut pool = Pool::new();
    pool.assign(0, b"0123456789").unwrap();
    pool.assign(1, b"pad").unwrap();

    // Not on top: rewritten in place with an overlapping source.
    pool.substring_of(0, 0, 2, 6).unwrap();
    assert_eq!(pool.get(0).unwrap(), b"234567");

    pool.substring_of(2, 0, 6, 0).unwrap();
    assert_eq!(pool.get(2).unwrap(), b"");
}

// ============================================================================
// Format
// ============================================================================

#[test]
fn test_format_writes_output() {
    let mut pool = Pool::new();
    pool.format(3, format_args!("{}:{:04x}", "id", 255)).unwrap();
    assert_eq!(pool.get(3).unwrap(), b"id:00ff");
}

#[test]
fn test_format_may_read_the_pool() {
    let mut pool = Pool::new();
    pool.assign(0, b"Dolly").unwrap();
    pool_format!(pool, 0, "Hello {}", String::from_utf8_lossy(pool.get(0).unwrap())).unwrap();
    assert_eq!(pool.get(0).unwrap(), b"Hello Dolly");
}

#[test]
fn test_format_too_long_leaves_target_unchanged() {
    let config = PoolConfig::default().with_format_capacity(8);
    let mut pool = Pool::with_config(config).unwrap();
    pool.assign(0, b"before").unwrap();

    pool.format(0, format_args!("{}", "12345678")).unwrap();
    assert_eq!(pool.get(0).unwrap(), b"12345678");

    let err = pool.format(0, format_args!("{}", "123456789")).unwrap_err();
    assert!(matches!(err, PoolError::FormatTooLong { max: 8 }));
    assert_eq!(pool.get(0).unwrap(), b"12345678");
}

// ============================================================================
// Length and Bounds
// ============================================================================

#[test]
fn test_max_length_string() {
    let mut pool = Pool::new();
    let longest = vec![b'm'; MAX_STRING_LEN];
    pool.assign(0, &longest).unwrap();
    assert_eq!(pool.len(0).unwrap(), MAX_STRING_LEN);

    let err = pool.append(0, b"!").unwrap_err();
    assert!(matches!(
        err,
        PoolError::StringTooLong { len, max } if len == MAX_STRING_LEN + 1 && max == MAX_STRING_LEN
    ));
    assert_eq!(pool.len(0).unwrap(), MAX_STRING_LEN, "failed append must not truncate");
}

#[test]
fn test_too_long_assign_does_not_extend_count() {
    let mut pool = Pool::new();
    let err = pool.assign(5, &vec![0u8; MAX_STRING_LEN + 1]).unwrap_err();
    assert!(matches!(err, PoolError::StringTooLong { .. }));
    assert_eq!(pool.count(), 0);
}

#[test]
fn test_self_append_too_long() {
    let mut pool = Pool::new();
    pool.assign(0, &vec![b'h'; MAX_STRING_LEN / 2 + 1]).unwrap();
    assert!(matches!(
        pool.append_from(0, 0),
        Err(PoolError::StringTooLong { .. })
    ));
}

#[test]
fn test_substring_out_of_bounds() {
    let mut pool = Pool::new();
    pool.assign(0, b"short").unwrap();

    assert!(matches!(
        pool.substring(1, b"short", 3, 3),
        Err(PoolError::OutOfBounds { end: 6, len: 5 })
    ));
    assert!(matches!(
        pool.substring_of(1, 0, usize::MAX, 1),
        Err(PoolError::OutOfBounds { .. })
    ));
    assert!(matches!(
        pool.byte_at(0, 5),
        Err(PoolError::OutOfBounds { end: 6, len: 5 })
    ));
    assert_eq!(pool.byte_at(0, 4).unwrap(), b't');
    assert_eq!(pool.count(), 1);
}

// ============================================================================
// Allocation Policy and Compaction
// ============================================================================

#[test]
fn test_tail_growth_compacts_logarithmically() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    pool.assign(0, b"neighbour").unwrap();

    for _ in 0..40_000 {
        pool.append(1, b"g").unwrap();
    }

    assert_eq!(pool.len(1).unwrap(), 40_000);
    let compactions = pool.stats().compactions;
    // Capacity at least doubles per compaction: 128 -> 40k takes ~9 rounds.
    assert!(compactions <= 12, "too many compactions: {compactions}");
    assert_eq!(pool.get(0).unwrap(), b"neighbour");
}

#[test]
fn test_many_handles_compact_logarithmically() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    for h in 0..20_000 {
        pool.format(h, format_args!("string #{h}")).unwrap();
    }

    let compactions = pool.stats().compactions;
    assert!(compactions <= 16, "too many compactions: {compactions}");
    assert_eq!(pool.get(12_345).unwrap(), b"string #12345");
    assert!(pool.stats().handle_capacity >= 20_000);
}

#[test]
fn test_erasure_isolation() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    for h in 0..50 {
        pool.format(h, format_args!("value {h}")).unwrap();
    }

    for h in (0..50).step_by(3) {
        pool.assign(h, b"").unwrap();
    }
    // Push through a few compactions.
    for h in 50..200 {
        pool.assign(h, &[b'f'; 40]).unwrap();
    }

    for h in 0..50 {
        let expected = if h % 3 == 0 {
            Vec::new()
        } else {
            format!("value {h}").into_bytes()
        };
        assert_eq!(pool.get(h).unwrap(), &expected[..], "handle {h}");
    }
}

#[test]
fn test_compact_leaves_exact_data_size() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    pool.assign(0, b"one").unwrap();
    pool.assign(1, b"two two").unwrap();
    pool.assign(2, b"three").unwrap();
    pool.assign(0, b"").unwrap();
    pool.assign(1, b"2").unwrap();
    pool.append(3, b"four").unwrap();

    pool.compact().unwrap();

    let stats = pool.stats();
    assert_eq!(stats.garbage_size, 0);
    assert_eq!(
        stats.data_size,
        RECORD_OVERHEAD + record(1) + record(5) + record(4)
    );
    assert_eq!(stats.live_bytes, stats.data_size);
}

#[test]
fn test_stats_account_for_reuse_slack() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    pool.assign(0, b"0123456789").unwrap();
    pool.assign(1, b"top").unwrap();
    pool.assign(0, b"01").unwrap();

    let stats = pool.stats();
    assert_eq!(stats.garbage_size, 8);
    assert_eq!(
        stats.live_bytes,
        RECORD_OVERHEAD + record(2) + record(3)
    );
}

#[test]
fn test_reserve_avoids_compaction() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    pool.reserve(64 * 1024).unwrap();
    pool.reserve_handles(1000).unwrap();

    for h in 0..1000 {
        pool.assign(h, b"0123456789").unwrap();
    }
    assert_eq!(pool.stats().compactions, 0);
}

// ============================================================================
// Clear and Release
// ============================================================================

#[test]
fn test_clear_then_reuse() {
    let mut pool = Pool::with_config(small_config()).unwrap();
    for h in 0..10 {
        pool.assign(h, b"data").unwrap();
    }
    let capacity = pool.stats().capacity;

    pool.clear();
    assert_eq!(pool.count(), 10);
    assert_eq!(pool.stats().data_size, RECORD_OVERHEAD);
    assert_eq!(pool.stats().capacity, capacity);
    assert!((0..10).all(|h| pool.get(h).unwrap().is_empty()));

    pool.assign(3, b"fresh").unwrap();
    assert_eq!(pool.get(3).unwrap(), b"fresh");
    assert_eq!(pool.stats().data_size, RECORD_OVERHEAD + record(5));
}

#[test]
fn test_release_then_reuse() {
    let mut pool = Pool::new();
    pool.assign(0, b"data").unwrap();
    pool.release();
    let stats = pool.stats();
    assert_eq!(pool.count(), 0);
    assert_eq!(stats.capacity, 0);
    assert_eq!(stats.handle_capacity, 0);
    assert_eq!(stats.data_size, 0);

    pool.assign(1, b"again").unwrap();
    assert_eq!(pool.get(0).unwrap(), b"");
    assert_eq!(pool.get(1).unwrap(), b"again");
}

// ============================================================================
// Tickets
// ============================================================================

#[test]
fn test_ticket_survives_tail_growth() {
    let mut pool = Pool::new();
    pool.assign(0, b"grow").unwrap();
    let ticket = pool.ticket(0).unwrap();

    pool.append(0, b"ing").unwrap();
    assert_eq!(pool.resolve(&ticket).unwrap(), b"growing");
}

#[test]
fn test_ticket_stale_after_compaction() {
    let mut pool = Pool::new();
    pool.assign(0, b"kept").unwrap();
    let ticket = pool.ticket(0).unwrap();

    pool.compact().unwrap();
    let err = pool.resolve(&ticket).unwrap_err();
    assert!(matches!(err, PoolError::StaleTicket { handle: 0, .. }));
    assert_eq!(pool.get(0).unwrap(), b"kept");
}

#[test]
fn test_ticket_stale_after_erase_and_clear() {
    let mut pool = Pool::new();
    pool.assign(0, b"a").unwrap();
    pool.assign(1, b"b").unwrap();

    let t0 = pool.ticket(0).unwrap();
    pool.assign(1, b"").unwrap();
    assert!(pool.resolve(&t0).is_err());

    let t1 = pool.ticket(0).unwrap();
    pool.clear();
    assert!(pool.resolve(&t1).is_err());
}

#[test]
fn test_ticket_for_unknown_handle() {
    let pool = Pool::new();
    assert!(matches!(
        pool.ticket(0),
        Err(PoolError::InvalidHandle { .. })
    ));
}

// ============================================================================
// Model Comparison
// ============================================================================

/// Small deterministic generator so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

#[test]
fn test_random_operations_match_model() {
    let mut rng = XorShift(0x5eed_1234_abcd_ef01);
    let mut pool = Pool::with_config(small_config()).unwrap();
    let mut model: Vec<Vec<u8>> = vec![b"seed".to_vec()];
    pool.assign(0, b"seed").unwrap();

    for step in 0..5_000 {
        // Sources must already be addressable in the pool.
        let src = rng.below(model.len());
        let h = rng.below(24);
        if model.len() <= h {
            model.resize(h + 1, Vec::new());
        }
        let fill = vec![b'a' + (step % 26) as u8; rng.below(40)];

        match rng.below(6) {
            0 => {
                pool.assign(h, &fill).unwrap();
                model[h] = fill;
            }
            1 => {
                pool.append(h, &fill).unwrap();
                model[h].extend_from_slice(&fill);
            }
            2 => {
                pool.copy(h, src).unwrap();
                model[h] = model[src].clone();
            }
            3 => {
                if model[h].len() + model[src].len() <= 2_000 {
                    pool.append_from(h, src).unwrap();
                    let tail = model[src].clone();
                    model[h].extend_from_slice(&tail);
                } else {
                    pool.append(h, b"").unwrap();
                }
            }
            4 => {
                let len = model[src].len();
                let start = rng.below(len + 1);
                let n = rng.below(len - start + 1);
                pool.substring_of(h, src, start, n).unwrap();
                model[h] = model[src][start..start + n].to_vec();
            }
            _ => {
                pool.assign(h, b"").unwrap();
                model[h].clear();
            }
        }

        if step % 97 == 0 {
            pool.compact().unwrap();
        }
    }

    assert_eq!(pool.count(), model.len());
    for (h, expected) in model.iter().enumerate() {
        assert_eq!(pool.get(h).unwrap(), &expected[..], "handle {h}");
    }

    let live: usize = model
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| record(s.len()))
        .sum();
    assert_eq!(pool.stats().live_bytes, RECORD_OVERHEAD + live);
}
