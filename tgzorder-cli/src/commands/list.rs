//! List command implementation.

use crate::utils::matches_filters;
use serde::Serialize;
use std::path::PathBuf;
use tgzorder_archive::{ArchiveCodec, EntryKind, TarEntry, TarGzCodec};

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson<'a> {
    name: &'a str,
    kind: &'static str,
    size: u64,
    mode: u32,
    mtime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_target: Option<&'a str>,
}

impl<'a> EntryJson<'a> {
    fn from_entry(entry: &'a TarEntry) -> Self {
        let header = &entry.header;
        Self {
            name: &header.name,
            kind: header.kind().as_str(),
            size: header.size,
            mode: header.mode,
            mtime: header.mtime,
            link_target: (header.kind() == EntryKind::Symlink).then_some(header.linkname.as_str()),
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson<'a> {
    archive: String,
    compressed_size: u64,
    entries: Vec<EntryJson<'a>>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &PathBuf, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(archive)?;
    let entries = TarGzCodec::default().decode(&data)?;
    let filtered: Vec<&TarEntry> = entries
        .iter()
        .filter(|e| matches_filters(e.name(), options.include, options.exclude))
        .collect();

    if options.json {
        let output = ArchiveListJson {
            archive: archive.display().to_string(),
            compressed_size: data.len() as u64,
            entries: filtered.iter().map(|e| EntryJson::from_entry(e)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !options.verbose {
        for entry in &filtered {
            println!("{}", entry.name());
        }
        return Ok(());
    }

    println!("Archive: {} ({} bytes)", archive.display(), data.len());
    println!();
    println!("{:>10} {:>8} {:>7}  Name", "Size", "Kind", "Mode");
    println!("{}", "-".repeat(50));

    let mut total_size = 0u64;
    for entry in &filtered {
        let header = &entry.header;
        let name = match header.kind() {
            EntryKind::Symlink => format!("{} -> {}", header.name, header.linkname),
            _ => header.name.clone(),
        };
        println!(
            "{:>10} {:>8} {:>7o}  {}",
            header.size,
            header.kind(),
            header.mode,
            name
        );
        total_size += header.size;
    }

    println!("{}", "-".repeat(50));
    println!("{:>10} {:>8}          {} entries", total_size, "", filtered.len());
    Ok(())
}
