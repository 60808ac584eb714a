//! tar.gz streams produced by other tools, and our own output read back.

use tgzorder_archive::{ArchiveCodec, EntryKind, TarEntry, TarGzCodec, TarHeader, gzip};

const PAX_FIXTURE: &[u8] = include_bytes!("data/pax.tar.gz");
const GNU_FIXTURE: &[u8] = include_bytes!("data/gnu.tar.gz");
const XATTR_FIXTURE: &[u8] = include_bytes!("data/xattr.tar.gz");

fn nested_name() -> String {
    format!("project/{}file.txt", "deep/".repeat(30))
}

fn check_fixture(entries: &[TarEntry]) {
    let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
    let nested = nested_name();
    assert_eq!(
        names,
        vec![
            "project/",
            "project/README.md",
            nested.as_str(),
            "project/link",
            "project/empty"
        ]
    );

    let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EntryKind::Other,
            EntryKind::Regular,
            EntryKind::Regular,
            EntryKind::Symlink,
            EntryKind::Regular
        ]
    );

    assert_eq!(entries[1].data, b"# Project\n\nSome text. ".repeat(20));
    assert_eq!(entries[2].data, b"nested content\n");
    assert_eq!(entries[3].header.linkname, "README.md");
    assert!(entries[4].data.is_empty());

    for entry in entries {
        assert_eq!(entry.header.mtime, 1_700_000_000);
        assert_eq!(entry.header.uid, 1000);
        assert_eq!(entry.header.uname, "dev");
        assert_eq!(entry.header.size, entry.data.len() as u64);
    }
    assert_eq!(entries[2].header.mode, 0o600);
}

#[test]
fn test_decode_pax_fixture() {
    let entries = TarGzCodec::default().decode(PAX_FIXTURE).unwrap();
    check_fixture(&entries);
}

#[test]
fn test_decode_gnu_fixture() {
    let entries = TarGzCodec::default().decode(GNU_FIXTURE).unwrap();
    check_fixture(&entries);
}

#[test]
fn test_reencode_preserves_entries() {
    let codec = TarGzCodec::default();
    let entries = codec.decode(PAX_FIXTURE).unwrap();
    let refs: Vec<&TarEntry> = entries.iter().collect();

    let encoded = codec.encode(&refs).unwrap();
    let decoded = codec.decode(&encoded).unwrap();
    assert_eq!(decoded, entries);

    // Headers survive a second pass byte for byte.
    for (a, b) in entries.iter().zip(&decoded) {
        assert_eq!(a.header.to_bytes().unwrap(), b.header.to_bytes().unwrap());
    }
}

fn check_xattr_entry(entry: &TarEntry) {
    let records = &entry.header.pax_records;
    assert_eq!(entry.name(), "a.txt");
    assert_eq!(entry.header.mtime, 1_700_000_000);
    assert_eq!(records["SCHILY.xattr.user.note"], b"keep-me");
    assert_eq!(records["mtime"], b"1700000000.123456789");
    assert_eq!(records["atime"], b"1700000001");
}

#[test]
fn test_decode_keeps_pax_records() {
    let entries = TarGzCodec::default().decode(XATTR_FIXTURE).unwrap();
    assert_eq!(entries.len(), 2);
    check_xattr_entry(&entries[0]);
    assert!(entries[1].header.pax_records.is_empty());
}

#[test]
fn test_pax_records_survive_reordering() {
    let codec = TarGzCodec::default();
    let entries = codec.decode(XATTR_FIXTURE).unwrap();
    let reversed: Vec<&TarEntry> = entries.iter().rev().collect();

    let decoded = codec.decode(&codec.encode(&reversed).unwrap()).unwrap();
    assert_eq!(decoded[0], entries[1]);
    assert_eq!(decoded[1], entries[0]);
    check_xattr_entry(&decoded[1]);
    assert_eq!(
        decoded[1].header.to_bytes().unwrap(),
        entries[0].header.to_bytes().unwrap()
    );
}

#[test]
fn test_reordered_encode() {
    let codec = TarGzCodec::default();
    let entries = codec.decode(GNU_FIXTURE).unwrap();
    let reversed: Vec<&TarEntry> = entries.iter().rev().collect();

    let decoded = codec.decode(&codec.encode(&reversed).unwrap()).unwrap();
    let expected: Vec<TarEntry> = entries.iter().rev().cloned().collect();
    assert_eq!(decoded, expected);
}

#[test]
fn test_empty_archive() {
    let codec = TarGzCodec::default();
    let encoded = codec.encode(&[]).unwrap();
    assert!(codec.decode(&encoded).unwrap().is_empty());
}

#[test]
fn test_truncated_archive_is_rejected() {
    let codec = TarGzCodec::default();
    let entry = TarEntry::new(
        TarHeader::new_file("data.bin", 0, 0o644),
        (0..4096u32).map(|i| (i * 7 % 251) as u8).collect(),
    );
    let encoded = codec.encode(&[&entry]).unwrap();

    assert!(codec.decode(&encoded[..encoded.len() / 2]).is_err());
    assert!(codec.decode(&encoded[..encoded.len() - 1]).is_err());
}

#[test]
fn test_truncated_tar_inside_valid_gzip() {
    let codec = TarGzCodec::default();
    let entry = TarEntry::new(TarHeader::new_file("data.bin", 0, 0o644), vec![9u8; 3000]);
    let tar = gzip::decompress(&codec.encode(&[&entry]).unwrap()).unwrap();

    let cut = gzip::compress(&tar[..512 + 1000], 9);
    assert!(codec.decode(&cut).is_err());
}

#[test]
fn test_not_gzip() {
    assert!(TarGzCodec::default().decode(b"plain text, not an archive").is_err());
    assert!(TarGzCodec::default().decode(&[]).is_err());
}
