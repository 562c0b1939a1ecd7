#![cfg(feature = "rle")]

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

pub fn test_input_sizes() -> Vec<usize> {
    let mut sizes = vec![0, 1, 2, 63, 64, 65];
    sizes.extend((1..=8).map(|exp| (1usize << exp) * 128));
    sizes
}

pub fn get_test_cases(n: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(14);

    vec![
        // Zeroes
        vec![0u8; n],
        // Same non-zero
        vec![14u8; n],
        // Ascending values, no two neighbours equal
        (0..n).map(|i| i as u8).collect::<Vec<u8>>(),
        // Short runs of growing length
        (0..n)
            .map(|i| (((i as f64) * 2.0).sqrt() as u8))
            .collect::<Vec<u8>>(),
        // Alternating pair
        (0..n)
            .map(|i| if i % 2 == 0 { 0xAA } else { 0x55 })
            .collect::<Vec<u8>>(),
        // Random bytes
        (0..n).map(|_| rng.random::<u8>()).collect::<Vec<u8>>(),
        // Sparse: mostly zero with occasional noise
        (0..n)
            .map(|_| {
                if rng.random_bool(0.95) {
                    0
                } else {
                    rng.random()
                }
            })
            .collect::<Vec<u8>>(),
        // Spike in the middle
        (0..n)
            .map(|i| if i == n / 2 { u8::MAX } else { 1 })
            .collect::<Vec<u8>>(),
        // An empty vector
        Vec::new(),
    ]
}
