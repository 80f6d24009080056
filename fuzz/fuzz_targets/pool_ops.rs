#![no_main]

use libfuzzer_sys::fuzz_target;
use strpool::{MAX_STRING_LEN, Pool, PoolConfig, RECORD_OVERHEAD};

const HANDLES: usize = 16;

fuzz_target!(|data: &[u8]| {
    // Tiny slack so compaction runs constantly
    let config = PoolConfig::default()
        .with_initial_capacity(16)
        .with_handle_slack(1);
    let mut pool = Pool::with_config(config).unwrap();
    let mut model: Vec<Vec<u8>> = Vec::new();

    for op in data.chunks(4) {
        let [kind, a, b, c] = match *op {
            [kind, a, b, c] => [kind, a, b, c],
            _ => break,
        };
        let h = a as usize % HANDLES;
        let src = b as usize % HANDLES;
        let n = c as usize;
        let readable = |m: &Vec<Vec<u8>>, h: usize| h < m.len();

        match kind % 8 {
            0 => {
                let bytes = vec![b; n];
                pool.assign(h, &bytes).unwrap();
                grow(&mut model, h);
                model[h] = bytes;
            }
            1 => {
                let bytes = vec![b; n];
                let too_long = readable(&model, h) && model[h].len() + n > MAX_STRING_LEN;
                if too_long {
                    assert!(pool.append(h, &bytes).is_err());
                } else {
                    pool.append(h, &bytes).unwrap();
                    grow(&mut model, h);
                    model[h].extend_from_slice(&bytes);
                }
            }
            2 => {
                let result = pool.copy(h, src);
                if readable(&model, src) {
                    result.unwrap();
                    grow(&mut model, h);
                    model[h] = model[src].clone();
                } else {
                    assert!(result.is_err());
                }
            }
            3 => {
                let result = pool.append_from(h, src);
                if !readable(&model, src) {
                    assert!(result.is_err());
                    continue;
                }
                let own = if readable(&model, h) { model[h].len() } else { 0 };
                if own + model[src].len() > MAX_STRING_LEN {
                    assert!(result.is_err());
                } else {
                    result.unwrap();
                    grow(&mut model, h);
                    let tail = model[src].clone();
                    model[h].extend_from_slice(&tail);
                }
            }
            4 => {
                let start = n % 8;
                let len = n / 8;
                let result = pool.substring_of(h, src, start, len);
                match model.get(src) {
                    Some(s) if start + len <= s.len() => {
                        result.unwrap();
                        let cut = s[start..start + len].to_vec();
                        grow(&mut model, h);
                        model[h] = cut;
                    }
                    _ => assert!(result.is_err()),
                }
            }
            5 => {
                let result = pool.set_byte(h, n, b);
                match model.get_mut(h) {
                    Some(s) if n < s.len() => {
                        result.unwrap();
                        s[n] = b;
                    }
                    _ => assert!(result.is_err()),
                }
            }
            6 => pool.compact().unwrap(),
            _ => {
                pool.clear();
                model.iter_mut().for_each(Vec::clear);
            }
        }

        assert_eq!(pool.count(), model.len());
    }

    // Verify: every handle matches the model
    for (h, expected) in model.iter().enumerate() {
        assert_eq!(pool.get(h).unwrap(), &expected[..]);
    }

    // Verify: accounting is exact
    let live: usize = model
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.len() + RECORD_OVERHEAD)
        .sum();
    let stats = pool.stats();
    if stats.capacity > 0 {
        assert_eq!(stats.live_bytes, RECORD_OVERHEAD + live);
    }
});

fn grow(model: &mut Vec<Vec<u8>>, h: usize) {
    if model.len() <= h {
        model.resize(h + 1, Vec::new());
    }
}
