//! Throughput of the encoder across levels; level 9 is the scoring path.

use tgzorder_deflate::{deflate, inflate};

fn main() {
    let test_cases = vec![
        ("small_random", generate_random(1024)),
        ("window_random", generate_random(32 * 1024)),
        ("large_random", generate_random(256 * 1024)),
        ("window_text", generate_text_like(32 * 1024)),
        ("large_text", generate_text_like(256 * 1024)),
    ];

    println!("DEFLATE Benchmarks");
    println!("==================\n");

    for (name, data) in &test_cases {
        println!("Test: {} ({} bytes)", name, data.len());

        for level in [1, 6, 9] {
            let start = std::time::Instant::now();
            let compressed = deflate(data, level);
            let elapsed = start.elapsed();

            let throughput = data.len() as f64 / elapsed.as_secs_f64() / 1024.0 / 1024.0;
            let ratio = data.len() as f64 / compressed.len() as f64;

            println!(
                "  Level {}: {:6.2} MB/s, {:7} bytes, {:.2}x ratio, {:7} µs",
                level,
                throughput,
                compressed.len(),
                ratio,
                elapsed.as_micros()
            );

            match inflate(&compressed) {
                Ok(round) if round == *data => {}
                _ => println!("  Level {}: round trip FAILED", level),
            }
        }
        println!();
    }
}

fn generate_random(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed = 12345u32;
    for _ in 0..size {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((seed >> 16) as u8);
    }
    data
}

fn generate_text_like(size: usize) -> Vec<u8> {
    let words: &[&[u8]] = &[
        b"the", b"quick", b"brown", b"fox", b"jumps", b"over", b"lazy", b"dog", b"and", b"runs",
        b"through", b"forest", b"near", b"river", b"under", b"blue", b"sky", b"with", b"wind",
        b"blowing",
    ];
    let mut data = Vec::with_capacity(size);
    let mut seed = 42u32;

    while data.len() < size {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        let word_idx = (seed as usize) % words.len();
        data.extend_from_slice(words[word_idx]);
        data.push(b' ');
    }
    data.truncate(size);
    data
}
