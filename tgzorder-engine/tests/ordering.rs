//! Both orderers on archives whose best ordering is known.

use tgzorder_archive::{ArchiveCodec, TarEntry, TarGzCodec, TarHeader};
use tgzorder_engine::{HALF_WINDOW, Mode, OptimizeOptions, optimize};

fn xorshift_bytes(size: usize, mut seed: u64) -> Vec<u8> {
    (0..size)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 24) as u8
        })
        .collect()
}

fn file(name: &str, data: Vec<u8>) -> TarEntry {
    TarEntry::new(TarHeader::new_file(name, 0, 0o644), data)
}

fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = a.to_vec();
    out.extend_from_slice(b);
    out
}

/// A 128-byte random unit repeated out to `len` bytes.
fn repeated(len: usize, seed: u64) -> Vec<u8> {
    xorshift_bytes(128, seed).into_iter().cycle().take(len).collect()
}

/// Two pairs and two noise files whose best order is known, with the
/// partners of each pair apart in input order.
///
/// - `a` (17 KiB) and `b` (36 KiB) share a 16 KiB run; `b` starts with it
///   and `a` ends 1 KiB after it, so only `a` then `b` keeps it within reach
/// - `c` (36 KiB) and `d` (17 KiB) share their tail window; only `c` then
///   `d` keeps it within reach
/// - `noise1` is shorter than a window, so its tail is the least
///   compressible and it starts the chain
/// - `noise2`, `c` and `a` open with 3, 2 and 1 KiB of repeated bytes, so
///   after an unrelated tail the longest run is the cheapest follow-up
///
/// Every greedy step has one clear winner and the chain it builds,
/// `noise1 noise2 c d a b`, is also the smallest archive.
fn pair_fixture() -> Vec<u8> {
    const KIB: usize = 1024;
    let shared_head = xorshift_bytes(HALF_WINDOW, 1);
    let shared_tail = xorshift_bytes(HALF_WINDOW, 2);

    let entries = vec![
        file(
            "a",
            concat(&concat(&repeated(KIB, 20), &shared_head), &xorshift_bytes(KIB, 10)),
        ),
        file("noise1", xorshift_bytes(12 * KIB, 11)),
        file(
            "c",
            concat(&concat(&repeated(2 * KIB, 21), &xorshift_bytes(18 * KIB, 12)), &shared_tail),
        ),
        file("noise2", concat(&repeated(3 * KIB, 22), &xorshift_bytes(21 * KIB, 13))),
        file("b", concat(&shared_head, &xorshift_bytes(20 * KIB, 14))),
        file("d", concat(&xorshift_bytes(KIB, 15), &shared_tail)),
    ];
    let refs: Vec<&TarEntry> = entries.iter().collect();
    TarGzCodec::default().encode(&refs).unwrap()
}

fn adjacent(order: &[String], x: &str, y: &str) -> bool {
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    pos(x).abs_diff(pos(y)) == 1
}

#[test]
fn test_pairs_become_adjacent() {
    let input = pair_fixture();
    let codec = TarGzCodec::default();

    let window = optimize(&input, &OptimizeOptions::new(Mode::Window), &codec).unwrap();
    let exhaustive = optimize(&input, &OptimizeOptions::new(Mode::Exhaustive), &codec).unwrap();

    for report in [&window.report, &exhaustive.report] {
        assert!(adjacent(&report.order, "a", "b"), "{:?}", report.order);
        assert!(adjacent(&report.order, "c", "d"), "{:?}", report.order);
        assert!(report.after_size_bytes < report.before_size_bytes);
    }

    // Every greedy link is forced, so the chain is the exact optimum.
    assert_eq!(window.report.order, exhaustive.report.order);
    assert_eq!(window.report.after_size_bytes, exhaustive.report.after_size_bytes);
    assert_eq!(window.archive, exhaustive.archive);
}

#[test]
fn test_shared_runs_only_link_forward() {
    let input = pair_fixture();
    let codec = TarGzCodec::default();
    let order = optimize(&input, &OptimizeOptions::new(Mode::Window), &codec)
        .unwrap()
        .report
        .order;

    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert_eq!(pos("a") + 1, pos("b"), "{:?}", order);
    assert_eq!(pos("c") + 1, pos("d"), "{:?}", order);
    assert_eq!(order[0], "noise1");
}

#[test]
fn test_window_parallel_matches_sequential() {
    let input = pair_fixture();
    let codec = TarGzCodec::default();

    let parallel = optimize(&input, &OptimizeOptions::new(Mode::Window), &codec).unwrap();
    let sequential = optimize(
        &input,
        &OptimizeOptions::new(Mode::Window).with_parallel(false),
        &codec,
    )
    .unwrap();
    assert_eq!(parallel.report.order, sequential.report.order);
    assert_eq!(parallel.archive, sequential.archive);
}

#[test]
fn test_exhaustive_parallel_matches_sequential() {
    let entries = vec![
        file("x", b"shared prefix, then x ".repeat(40)),
        file("y", xorshift_bytes(700, 3)),
        file("z", b"shared prefix, then z ".repeat(40)),
        file("w", xorshift_bytes(700, 4)),
    ];
    let refs: Vec<&TarEntry> = entries.iter().collect();
    let codec = TarGzCodec::default();
    let input = codec.encode(&refs).unwrap();

    let parallel = optimize(&input, &OptimizeOptions::new(Mode::Exhaustive), &codec).unwrap();
    let sequential = optimize(
        &input,
        &OptimizeOptions::new(Mode::Exhaustive).with_parallel(false),
        &codec,
    )
    .unwrap();
    assert_eq!(parallel.report.order, sequential.report.order);
    assert_eq!(parallel.archive, sequential.archive);
}

#[test]
fn test_exhaustive_is_a_fixed_point() {
    let entries = vec![
        file("one", concat(&xorshift_bytes(900, 7), b"common trailer text")),
        file("two", xorshift_bytes(900, 8)),
        file("three", concat(b"common trailer text", &xorshift_bytes(900, 7))),
        file("four", b"plain text that compresses well ".repeat(30)),
    ];
    let refs: Vec<&TarEntry> = entries.iter().collect();
    let codec = TarGzCodec::default();
    let options = OptimizeOptions::new(Mode::Exhaustive);

    let first = optimize(&codec.encode(&refs).unwrap(), &options, &codec).unwrap();
    let second = optimize(&first.archive, &options, &codec).unwrap();

    assert!(first.report.after_size_bytes <= first.report.before_size_bytes);
    assert!(second.report.after_size_bytes <= first.report.after_size_bytes);
    assert_eq!(second.report.before_size_bytes, first.report.after_size_bytes);
}

#[test]
fn test_window_second_pass_keeps_contents() {
    let input = pair_fixture();
    let codec = TarGzCodec::default();
    let options = OptimizeOptions::default();

    let first = optimize(&input, &options, &codec).unwrap();
    let second = optimize(&first.archive, &options, &codec).unwrap();

    let mut a = first.report.order.clone();
    let mut b = second.report.order.clone();
    a.sort();
    b.sort();
    assert_eq!(a, b);
    assert!(adjacent(&second.report.order, "a", "b"));
    assert!(adjacent(&second.report.order, "c", "d"));
}

#[test]
fn test_only_regular_entries_move() {
    let entries = vec![
        TarEntry::new(TarHeader::new_directory("src", 0o755), Vec::new()),
        file("src/main.rs", b"fn main() { println!(\"hi\"); }\n".repeat(20)),
        TarEntry::new(TarHeader::new_symlink("src/lib.rs", "main.rs"), Vec::new()),
        file("README", xorshift_bytes(2000, 9)),
        TarEntry::new(TarHeader::new_directory("docs", 0o755), Vec::new()),
    ];
    let refs: Vec<&TarEntry> = entries.iter().collect();
    let codec = TarGzCodec::default();
    let input = codec.encode(&refs).unwrap();

    for mode in [Mode::Window, Mode::Exhaustive] {
        let report = optimize(&input, &OptimizeOptions::new(mode), &codec)
            .unwrap()
            .report;
        assert_eq!(report.reordered_count, 2);
        assert_eq!(&report.order[2..], ["src/", "src/lib.rs", "docs/"]);
    }
}
