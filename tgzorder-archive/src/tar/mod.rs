//! TAR archive format support.
//!
//! Reads and writes in-memory TAR streams with support for:
//! - UStar format (POSIX.1-1988) and pre-POSIX v7 headers
//! - PAX extended headers (POSIX.1-2001), local and global
//! - GNU long name / long link records
//!
//! Every entry's payload is read in full, whatever its type, so an archive
//! can be re-serialized without losing anything the header describes.
//!
//! ## Header layout
//!
//! ```text
//! offset  size  field
//!      0   100  name
//!    100     8  mode        (octal)
//!    108     8  uid         (octal)
//!    116     8  gid         (octal)
//!    124    12  size        (octal)
//!    136    12  mtime       (octal)
//!    148     8  checksum
//!    156     1  typeflag
//!    157   100  linkname
//!    257     6  magic       "ustar\0"
//!    263     2  version     "00"
//!    265    32  uname
//!    297    32  gname
//!    329     8  devmajor    (octal)
//!    337     8  devminor    (octal)
//!    345   155  prefix
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use tgzorder_core::error::{ArchiveError, Result};
use tracing::warn;

/// TAR block size.
pub const BLOCK_SIZE: usize = 512;

/// PAX typeflag for extended header (applies to next file only).
const PAX_HEADER: u8 = b'x';

/// PAX typeflag for global extended header (applies to all subsequent files).
const PAX_GLOBAL_HEADER: u8 = b'g';

/// GNU LongName typeflag.
const GNU_LONGNAME: u8 = b'L';

/// GNU LongLink typeflag.
const GNU_LONGLINK: u8 = b'K';

/// Largest value an 11-digit octal field can hold.
const MAX_OCTAL_11: u64 = 0o77777777777;

/// Largest value a 7-digit octal field can hold.
const MAX_OCTAL_7: u64 = 0o7777777;

/// Width of the ustar user and group name fields.
const NAME_FIELD: usize = 32;

/// PAX records keyed by name. Values are raw bytes; xattrs may be binary.
pub type PaxRecords = BTreeMap<String, Vec<u8>>;

/// What an entry is, as far as reordering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file with content.
    Regular,
    /// A symbolic link.
    Symlink,
    /// Directories, hard links, devices, FIFOs and anything else.
    Other,
}

impl EntryKind {
    /// Short lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// TAR header, with any PAX or GNU long-name records already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    /// Full path name.
    pub name: String,
    /// File mode.
    pub mode: u32,
    /// Owner UID.
    pub uid: u64,
    /// Owner GID.
    pub gid: u64,
    /// Payload size in bytes.
    pub size: u64,
    /// Modification time (Unix seconds).
    pub mtime: u64,
    /// Type flag.
    pub typeflag: u8,
    /// Link target.
    pub linkname: String,
    /// Owner name.
    pub uname: String,
    /// Group name.
    pub gname: String,
    /// Device major number.
    pub devmajor: u32,
    /// Device minor number.
    pub devminor: u32,
    /// PAX records with no typed field, written back on output.
    ///
    /// Holds extended attributes, access and change times, ACLs, vendor
    /// keys, and `mtime` when it has a fractional part.
    pub pax_records: PaxRecords,
}

impl TarHeader {
    /// Create a header for a regular file.
    pub fn new_file(name: &str, size: u64, mode: u32) -> Self {
        Self {
            name: name.to_string(),
            mode,
            uid: 0,
            gid: 0,
            size,
            mtime: 0,
            typeflag: b'0',
            linkname: String::new(),
            uname: String::new(),
            gname: String::new(),
            devmajor: 0,
            devminor: 0,
            pax_records: PaxRecords::new(),
        }
    }

    /// Create a header for a directory.
    pub fn new_directory(name: &str, mode: u32) -> Self {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };
        Self {
            typeflag: b'5',
            ..Self::new_file(&name, 0, mode)
        }
    }

    /// Create a header for a symlink.
    pub fn new_symlink(name: &str, target: &str) -> Self {
        Self {
            typeflag: b'2',
            linkname: target.to_string(),
            ..Self::new_file(name, 0, 0o777)
        }
    }

    /// Set the modification time.
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Entry kind derived from the type flag.
    pub fn kind(&self) -> EntryKind {
        match self.typeflag {
            b'0' | 0 | b'7' => EntryKind::Regular,
            b'2' => EntryKind::Symlink,
            _ => EntryKind::Other,
        }
    }

    /// Parse one 512-byte header block.
    ///
    /// Returns `None` for an all-zero block (end of archive). The checksum
    /// is verified; both the unsigned and the historic signed sums are
    /// accepted.
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> Result<Option<Self>> {
        if block.iter().all(|&b| b == 0) {
            return Ok(None);
        }

        let stored = parse_numeric(&block[148..156], "checksum")?;
        let (unsigned, signed) = header_checksums(block);
        if stored != unsigned as u64 && stored as i64 != signed {
            return Err(ArchiveError::invalid_header(format!(
                "TAR checksum mismatch: stored {:o}, computed {:o}",
                stored, unsigned
            )));
        }

        // GNU headers carry "ustar  \0" and keep other fields where POSIX
        // puts the name prefix.
        let ustar = &block[257..262] == b"ustar";
        let posix = &block[257..263] == b"ustar\0";
        let name = parse_string(&block[0..100]);
        let prefix = if posix {
            parse_string(&block[345..500])
        } else {
            String::new()
        };

        let mut header = Self {
            name: if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            },
            mode: parse_numeric(&block[100..108], "mode")? as u32,
            uid: parse_numeric(&block[108..116], "uid")?,
            gid: parse_numeric(&block[116..124], "gid")?,
            size: parse_numeric(&block[124..136], "size")?,
            mtime: parse_numeric(&block[136..148], "mtime")?,
            typeflag: block[156],
            linkname: parse_string(&block[157..257]),
            uname: if ustar { parse_string(&block[265..297]) } else { String::new() },
            gname: if ustar { parse_string(&block[297..329]) } else { String::new() },
            devmajor: if ustar { parse_numeric(&block[329..337], "devmajor")? as u32 } else { 0 },
            devminor: if ustar { parse_numeric(&block[337..345], "devminor")? as u32 } else { 0 },
            pax_records: PaxRecords::new(),
        };

        // GNU access and change times are kept as their PAX equivalents.
        if ustar && !posix {
            for (key, field) in [("atime", &block[345..357]), ("ctime", &block[357..369])] {
                if let Ok(t @ 1..) = parse_numeric(field, "gnu time") {
                    header.pax_records.insert(key.to_string(), t.to_string().into_bytes());
                }
            }
        }

        Ok(Some(header))
    }

    /// Apply PAX extended attributes to this header.
    ///
    /// Keys with a typed field update that field; every other record is
    /// kept in [`pax_records`](Self::pax_records). A value that does not
    /// parse is kept verbatim rather than lost.
    pub fn apply_pax_attrs(&mut self, attrs: &PaxRecords) {
        for (key, value) in attrs {
            let text = String::from_utf8_lossy(value);
            let parsed = match key.as_str() {
                "path" => {
                    self.name = text.into_owned();
                    true
                }
                "linkpath" => {
                    self.linkname = text.into_owned();
                    true
                }
                "uname" => {
                    self.uname = text.into_owned();
                    true
                }
                "gname" => {
                    self.gname = text.into_owned();
                    true
                }
                "size" => text.parse().map(|v| self.size = v).is_ok(),
                "uid" => text.parse().map(|v| self.uid = v).is_ok(),
                "gid" => text.parse().map(|v| self.gid = v).is_ok(),
                "mtime" => {
                    let whole = text.split('.').next().unwrap_or_default();
                    // Whole seconds go in the typed field; the record keeps
                    // the exact value.
                    whole.parse().map(|t| self.mtime = t).is_ok() && !text.contains('.')
                }
                _ => false,
            };
            if parsed {
                self.pax_records.remove(key);
            } else {
                self.pax_records.insert(key.clone(), value.clone());
            }
        }
    }

    /// Parse PAX extended header data.
    /// Format: "length key=value\n" repeated
    pub fn parse_pax_data(data: &[u8]) -> Result<PaxRecords> {
        let mut attrs = PaxRecords::new();
        let mut pos = 0;

        while pos < data.len() {
            let space_pos = data[pos..]
                .iter()
                .position(|&b| b == b' ')
                .map(|p| pos + p)
                .ok_or_else(|| ArchiveError::invalid_header("PAX record without length"))?;

            let record_len: usize = std::str::from_utf8(&data[pos..space_pos])
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| ArchiveError::invalid_header("PAX record length is not a number"))?;

            let record_end = pos + record_len;
            if record_len == 0 || record_end > data.len() || record_end <= space_pos {
                return Err(ArchiveError::invalid_header("PAX record length out of range"));
            }

            let mut value_end = record_end;
            if data[value_end - 1] == b'\n' {
                value_end -= 1;
            }
            let record = &data[space_pos + 1..value_end];

            if let Some(eq_pos) = record.iter().position(|&b| b == b'=') {
                let key = String::from_utf8_lossy(&record[..eq_pos]).into_owned();
                attrs.insert(key, record[eq_pos + 1..].to_vec());
            }

            pos = record_end;
        }

        Ok(attrs)
    }

    /// Serialize this header as it will appear in an archive.
    ///
    /// Returns one ustar block, preceded by a PAX extended header when the
    /// header carries extra records or a field does not fit its ustar slot.
    /// Records are written sorted by key. The `size` field is written as
    /// stored in the header.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut records: BTreeMap<&str, Vec<u8>> = self
            .pax_records
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        // An exact mtime that no longer agrees with the typed field is stale.
        if records.get("mtime").is_some_and(|v| {
            let text = String::from_utf8_lossy(v);
            let whole = text.split('.').next().unwrap_or_default();
            whole.parse::<u64>().is_ok_and(|t| t != self.mtime)
        }) {
            records.remove("mtime");
        }

        let (prefix, name) = match split_ustar_name(&self.name) {
            Some(split) => split,
            None => {
                records.insert("path", self.name.clone().into_bytes());
                ("", truncate_bytes(&self.name, 100))
            }
        };

        let linkname = if self.linkname.len() > 100 {
            records.insert("linkpath", self.linkname.clone().into_bytes());
            truncate_bytes(&self.linkname, 100)
        } else {
            self.linkname.as_str()
        };

        for (key, value) in [("uname", &self.uname), ("gname", &self.gname)] {
            if value.len() > NAME_FIELD {
                records.insert(key, value.clone().into_bytes());
            }
        }
        let uname = truncate_bytes(&self.uname, NAME_FIELD);
        let gname = truncate_bytes(&self.gname, NAME_FIELD);

        let mut numeric = |key: &'static str, value: u64, max: u64| -> u64 {
            if value > max {
                // A kept exact mtime already says more than the integer.
                if key != "mtime" || !records.contains_key(key) {
                    records.insert(key, value.to_string().into_bytes());
                }
                0
            } else {
                value
            }
        };
        let size = numeric("size", self.size, MAX_OCTAL_11);
        let mtime = numeric("mtime", self.mtime, MAX_OCTAL_11);
        let uid = numeric("uid", self.uid, MAX_OCTAL_7);
        let gid = numeric("gid", self.gid, MAX_OCTAL_7);

        for (field, value) in [
            ("mode", self.mode as u64),
            ("devmajor", self.devmajor as u64),
            ("devminor", self.devminor as u64),
        ] {
            if value > MAX_OCTAL_7 {
                return Err(ArchiveError::field_overflow(field, value));
            }
        }

        let mut block = [0u8; BLOCK_SIZE];
        write_string(&mut block[0..100], name);
        write_octal(&mut block[100..108], self.mode as u64);
        write_octal(&mut block[108..116], uid);
        write_octal(&mut block[116..124], gid);
        write_octal(&mut block[124..136], size);
        write_octal(&mut block[136..148], mtime);
        block[156] = self.typeflag;
        write_string(&mut block[157..257], linkname);
        block[257..263].copy_from_slice(b"ustar\0");
        block[263..265].copy_from_slice(b"00");
        write_string(&mut block[265..297], uname);
        write_string(&mut block[297..329], gname);
        write_octal(&mut block[329..337], self.devmajor as u64);
        write_octal(&mut block[337..345], self.devminor as u64);
        write_string(&mut block[345..500], prefix);
        seal_checksum(&mut block);

        let pax: Vec<u8> = records
            .iter()
            .flat_map(|(key, value)| format_pax_record(key, value))
            .collect();

        let mut out = Vec::with_capacity(BLOCK_SIZE * 3);
        if !pax.is_empty() {
            let mut pax_block = [0u8; BLOCK_SIZE];
            write_string(&mut pax_block[0..100], "PaxHeader");
            write_octal(&mut pax_block[100..108], 0o644);
            write_octal(&mut pax_block[108..116], 0);
            write_octal(&mut pax_block[116..124], 0);
            write_octal(&mut pax_block[124..136], pax.len() as u64);
            write_octal(&mut pax_block[136..148], 0);
            pax_block[156] = PAX_HEADER;
            pax_block[257..263].copy_from_slice(b"ustar\0");
            pax_block[263..265].copy_from_slice(b"00");
            seal_checksum(&mut pax_block);

            out.extend_from_slice(&pax_block);
            out.extend_from_slice(&pax);
            out.resize(out.len() + padding(pax.len()), 0);
        }
        out.extend_from_slice(&block);
        Ok(out)
    }
}

/// Split a long name into ustar `(prefix, name)` if it fits.
fn split_ustar_name(name: &str) -> Option<(&str, &str)> {
    if name.len() <= 100 {
        return Some(("", name));
    }
    let bytes = name.as_bytes();
    // The prefix may hold up to 155 bytes; the slash itself is implicit.
    let search_end = bytes.len().min(156);
    let slash = bytes[..search_end].iter().rposition(|&b| b == b'/')?;
    let (prefix, rest) = (&name[..slash], &name[slash + 1..]);
    if slash == 0 || rest.is_empty() || rest.len() > 100 {
        return None;
    }
    Some((prefix, rest))
}

/// Longest prefix of `s` that fits `max` bytes on a char boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Zero bytes needed to pad `len` to a block boundary.
fn padding(len: usize) -> usize {
    (BLOCK_SIZE - len % BLOCK_SIZE) % BLOCK_SIZE
}

/// Unsigned and signed byte sums with the checksum field read as spaces.
fn header_checksums(block: &[u8; BLOCK_SIZE]) -> (u32, i64) {
    let mut unsigned = 0u32;
    let mut signed = 0i64;
    for (i, &b) in block.iter().enumerate() {
        let b = if (148..156).contains(&i) { b' ' } else { b };
        unsigned += b as u32;
        signed += b as i8 as i64;
    }
    (unsigned, signed)
}

fn seal_checksum(block: &mut [u8; BLOCK_SIZE]) {
    block[148..156].copy_from_slice(b"        ");
    let (checksum, _) = header_checksums(block);
    let field = format!("{:06o}\0 ", checksum);
    block[148..156].copy_from_slice(field.as_bytes());
}

/// Parse a NUL-terminated string field.
fn parse_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Parse an octal field, or a GNU base-256 field when the high bit is set.
fn parse_numeric(data: &[u8], field: &'static str) -> Result<u64> {
    if data.first().is_some_and(|&b| b & 0x80 != 0) {
        if data[0] & 0x40 != 0 {
            return Err(ArchiveError::invalid_header(format!("negative {} field", field)));
        }
        let mut value = (data[0] & 0x3F) as u64;
        for &b in &data[1..] {
            value = value
                .checked_mul(256)
                .map(|v| v | b as u64)
                .ok_or_else(|| ArchiveError::invalid_header(format!("{} field overflows", field)))?;
        }
        return Ok(value);
    }

    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let text = std::str::from_utf8(&data[..end])
        .map_err(|_| ArchiveError::invalid_header(format!("non-ASCII {} field", field)))?
        .trim_matches(|c| c == ' ' || c == '\0');
    if text.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(text, 8)
        .map_err(|_| ArchiveError::invalid_header(format!("invalid octal in {} field: {:?}", field, text)))
}

/// Write a string field. A string filling the whole field carries no NUL.
fn write_string(field: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}

/// Write a zero-padded octal field followed by a NUL.
fn write_octal(field: &mut [u8], value: u64) {
    let s = format!("{:0width$o}", value, width = field.len() - 1);
    field[..s.len()].copy_from_slice(s.as_bytes());
}

/// Format a single PAX record: "len key=value\n"
fn format_pax_record(key: &str, value: &[u8]) -> Vec<u8> {
    // The length prefix counts its own digits.
    let base_len = key.len() + value.len() + 3;
    let mut total_len = base_len + 1;
    loop {
        let expected = base_len + total_len.to_string().len();
        if expected == total_len {
            break;
        }
        total_len = expected;
    }
    let mut record = format!("{} {}=", total_len, key).into_bytes();
    record.extend_from_slice(value);
    record.push(b'\n');
    record
}

/// One archive entry: its header and its full payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Parsed header.
    pub header: TarHeader,
    /// Payload bytes (`header.size` of them).
    pub data: Vec<u8>,
}

impl TarEntry {
    /// Create an entry, setting the header size from the payload.
    pub fn new(mut header: TarHeader, data: Vec<u8>) -> Self {
        header.size = data.len() as u64;
        Self { header, data }
    }

    /// Entry path.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Entry kind.
    pub fn kind(&self) -> EntryKind {
        self.header.kind()
    }
}

/// TAR archive writer.
pub struct TarWriter<W: Write> {
    writer: W,
    finished: bool,
}

impl<W: Write> TarWriter<W> {
    /// Create a new TAR writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            finished: false,
        }
    }

    /// Append an entry: header blocks, payload, then block padding.
    pub fn append(&mut self, entry: &TarEntry) -> Result<()> {
        if entry.header.size != entry.data.len() as u64 {
            return Err(ArchiveError::invalid_header(format!(
                "entry {} declares {} bytes but carries {}",
                entry.header.name,
                entry.header.size,
                entry.data.len()
            )));
        }
        self.writer.write_all(&entry.header.to_bytes()?)?;
        self.writer.write_all(&entry.data)?;
        let pad = padding(entry.data.len());
        if pad > 0 {
            self.writer.write_all(&[0u8; BLOCK_SIZE][..pad])?;
        }
        Ok(())
    }

    /// Finish the archive by writing two zero blocks.
    pub fn finish(&mut self) -> Result<()> {
        if !self.finished {
            self.writer.write_all(&[0u8; BLOCK_SIZE])?;
            self.writer.write_all(&[0u8; BLOCK_SIZE])?;
            self.writer.flush()?;
            self.finished = true;
        }
        Ok(())
    }

    /// Finish the archive and return the inner writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.writer)
    }
}

/// TAR archive reader over an in-memory stream.
#[derive(Debug)]
pub struct TarReader<'a> {
    data: &'a [u8],
}

impl<'a> TarReader<'a> {
    /// Create a new TAR reader.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Take `len` bytes at `offset`, then skip to the next block boundary.
    fn payload(&self, offset: &mut usize, len: u64) -> Result<&'a [u8]> {
        let len = usize::try_from(len).map_err(|_| ArchiveError::field_overflow("size", len))?;
        let available = self.data.len() - *offset;
        if len > available {
            return Err(ArchiveError::unexpected_eof(len - available));
        }
        let bytes = &self.data[*offset..*offset + len];
        *offset = (*offset + len + padding(len)).min(self.data.len());
        Ok(bytes)
    }

    /// Read every entry in stored order.
    pub fn entries(&self) -> Result<Vec<TarEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0usize;
        let mut pax_attrs = PaxRecords::new();
        let mut global_pax_attrs = PaxRecords::new();
        let mut gnu_longname: Option<String> = None;
        let mut gnu_longlink: Option<String> = None;

        loop {
            let remaining = self.data.len() - offset;
            if remaining == 0 {
                warn!(entries = entries.len(), "TAR stream ended without an end-of-archive block");
                break;
            }
            if remaining < BLOCK_SIZE {
                return Err(ArchiveError::unexpected_eof(BLOCK_SIZE - remaining));
            }

            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(&self.data[offset..offset + BLOCK_SIZE]);
            offset += BLOCK_SIZE;

            let Some(mut header) = TarHeader::from_block(&block)? else {
                break;
            };

            match header.typeflag {
                PAX_HEADER | PAX_GLOBAL_HEADER => {
                    let data = self.payload(&mut offset, header.size)?;
                    let attrs = TarHeader::parse_pax_data(data)?;
                    if header.typeflag == PAX_GLOBAL_HEADER {
                        global_pax_attrs.extend(attrs);
                    } else {
                        pax_attrs = attrs;
                    }
                    continue;
                }
                GNU_LONGNAME | GNU_LONGLINK => {
                    let data = self.payload(&mut offset, header.size)?;
                    let text = String::from_utf8_lossy(data).trim_end_matches('\0').to_string();
                    if header.typeflag == GNU_LONGNAME {
                        gnu_longname = Some(text);
                    } else {
                        gnu_longlink = Some(text);
                    }
                    continue;
                }
                _ => {}
            }

            // Global first, then local PAX, then GNU records.
            if !global_pax_attrs.is_empty() {
                header.apply_pax_attrs(&global_pax_attrs);
            }
            if !pax_attrs.is_empty() {
                header.apply_pax_attrs(&pax_attrs);
                pax_attrs.clear();
            }
            if let Some(name) = gnu_longname.take() {
                header.name = name;
            }
            if let Some(link) = gnu_longlink.take() {
                header.linkname = link;
            }

            let data = self.payload(&mut offset, header.size)?.to_vec();
            entries.push(TarEntry { header, data });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(entries: &[TarEntry]) -> Vec<u8> {
        let mut writer = TarWriter::new(Vec::new());
        for entry in entries {
            writer.append(entry).unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_header_roundtrip_exact() {
        let mut header = TarHeader::new_file("dir/file.txt", 5, 0o640).with_mtime(1_700_000_000);
        header.uid = 1000;
        header.gid = 100;
        header.uname = "alice".to_string();
        header.gname = "users".to_string();

        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), BLOCK_SIZE);

        let block: [u8; BLOCK_SIZE] = bytes[..].try_into().unwrap();
        let parsed = TarHeader::from_block(&block).unwrap().unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_checksum_is_verified() {
        let mut block: [u8; BLOCK_SIZE] = TarHeader::new_file("a", 0, 0o644)
            .to_bytes()
            .unwrap()[..]
            .try_into()
            .unwrap();
        block[0] = b'b';
        assert!(TarHeader::from_block(&block).is_err());
    }

    #[test]
    fn test_entry_kinds() {
        assert_eq!(TarHeader::new_file("f", 0, 0o644).kind(), EntryKind::Regular);
        assert_eq!(TarHeader::new_symlink("l", "f").kind(), EntryKind::Symlink);
        assert_eq!(TarHeader::new_directory("d", 0o755).kind(), EntryKind::Other);

        let mut header = TarHeader::new_file("f", 0, 0o644);
        header.typeflag = 0;
        assert_eq!(header.kind(), EntryKind::Regular);
        header.typeflag = b'7';
        assert_eq!(header.kind(), EntryKind::Regular);
        header.typeflag = b'1';
        assert_eq!(header.kind(), EntryKind::Other);
    }

    #[test]
    fn test_read_back_entries() {
        let entries = vec![
            TarEntry::new(TarHeader::new_directory("docs", 0o755), Vec::new()),
            TarEntry::new(TarHeader::new_file("docs/a.txt", 0, 0o644), b"alpha".to_vec()),
            TarEntry::new(TarHeader::new_symlink("latest", "docs/a.txt"), Vec::new()),
            TarEntry::new(TarHeader::new_file("docs/b.bin", 0, 0o600), vec![7u8; 1500]),
        ];
        let bytes = archive(&entries);
        assert_eq!(bytes.len() % BLOCK_SIZE, 0);

        let read = TarReader::new(&bytes).entries().unwrap();
        assert_eq!(read, entries);
    }

    #[test]
    fn test_long_name_uses_prefix() {
        let name = format!("{}/{}", "p".repeat(120), "file.txt");
        let header = TarHeader::new_file(&name, 0, 0o644);
        assert_eq!(header.to_bytes().unwrap().len(), BLOCK_SIZE);

        let entries = vec![TarEntry::new(header, b"x".to_vec())];
        let read = TarReader::new(&archive(&entries)).entries().unwrap();
        assert_eq!(read[0].name(), name);
    }

    #[test]
    fn test_very_long_name_uses_pax() {
        let name = "n".repeat(300);
        let target = "t".repeat(150);
        let mut header = TarHeader::new_symlink(&name, &target);
        header.mtime = 1 << 40;

        let bytes = header.to_bytes().unwrap();
        assert!(bytes.len() > BLOCK_SIZE);

        let entries = vec![TarEntry::new(header.clone(), Vec::new())];
        let read = TarReader::new(&archive(&entries)).entries().unwrap();
        assert_eq!(read[0].header, header);
        assert_eq!(read[0].header.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_gnu_longname() {
        let long = "g".repeat(200);
        let mut record = TarHeader::new_file("././@LongLink", 0, 0o644);
        record.typeflag = GNU_LONGNAME;
        let mut name_data = long.clone().into_bytes();
        name_data.push(0);

        let entries = vec![
            TarEntry::new(record, name_data),
            TarEntry::new(TarHeader::new_file("short", 0, 0o644), b"data".to_vec()),
        ];
        let read = TarReader::new(&archive(&entries)).entries().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].name(), long);
        assert_eq!(read[0].data, b"data");
    }

    #[test]
    fn test_pax_global_applies_to_later_entries() {
        let mut global = TarHeader::new_file("pax_global_header", 0, 0o644);
        global.typeflag = PAX_GLOBAL_HEADER;
        let records = format_pax_record("uname", b"builder");

        let entries = vec![
            TarEntry::new(global, records),
            TarEntry::new(TarHeader::new_file("one", 0, 0o644), b"1".to_vec()),
            TarEntry::new(TarHeader::new_file("two", 0, 0o644), b"2".to_vec()),
        ];
        let read = TarReader::new(&archive(&entries)).entries().unwrap();
        assert_eq!(read.len(), 2);
        assert!(read.iter().all(|e| e.header.uname == "builder"));
    }

    #[test]
    fn test_pax_records_roundtrip() {
        let mut header = TarHeader::new_file("f.txt", 3, 0o644).with_mtime(1_700_000_000);
        header
            .pax_records
            .insert("SCHILY.xattr.user.bin".to_string(), vec![0, 0xFF, b'\n', 7]);
        header
            .pax_records
            .insert("mtime".to_string(), b"1700000000.5".to_vec());

        let bytes = header.to_bytes().unwrap();
        assert!(bytes.len() > BLOCK_SIZE);

        let entries = vec![TarEntry::new(header.clone(), b"abc".to_vec())];
        let read = TarReader::new(&archive(&entries)).entries().unwrap();
        assert_eq!(read[0].header, header);
        assert_eq!(read[0].header.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_apply_pax_attrs_keeps_unknown_records() {
        let data = [
            format_pax_record("path", b"renamed.txt"),
            format_pax_record("mtime", b"1700000000.25"),
            format_pax_record("atime", b"1700000001"),
            format_pax_record("uid", b"not-a-number"),
        ]
        .concat();
        let attrs = TarHeader::parse_pax_data(&data).unwrap();

        let mut header = TarHeader::new_file("f", 0, 0o644);
        header.apply_pax_attrs(&attrs);
        assert_eq!(header.name, "renamed.txt");
        assert_eq!(header.mtime, 1_700_000_000);
        assert_eq!(header.uid, 0);
        let keys: Vec<&str> = header.pax_records.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["atime", "mtime", "uid"]);

        // A whole-second mtime replaces the exact one.
        let mut later = PaxRecords::new();
        later.insert("mtime".to_string(), b"1700000002".to_vec());
        header.apply_pax_attrs(&later);
        assert_eq!(header.mtime, 1_700_000_002);
        assert!(!header.pax_records.contains_key("mtime"));
    }

    #[test]
    fn test_stale_exact_mtime_is_dropped() {
        let mut header = TarHeader::new_file("f", 0, 0o644).with_mtime(10);
        header
            .pax_records
            .insert("mtime".to_string(), b"10.75".to_vec());
        assert!(header.to_bytes().unwrap().len() > BLOCK_SIZE);

        let moved = header.with_mtime(20);
        assert_eq!(moved.to_bytes().unwrap().len(), BLOCK_SIZE);
    }

    #[test]
    fn test_long_owner_names_use_pax() {
        let mut header = TarHeader::new_file("f", 0, 0o644);
        header.uname = "u".repeat(40);
        header.gname = "g".repeat(33);

        let entries = vec![TarEntry::new(header.clone(), Vec::new())];
        let read = TarReader::new(&archive(&entries)).entries().unwrap();
        assert_eq!(read[0].header.uname, header.uname);
        assert_eq!(read[0].header.gname, header.gname);
        assert!(read[0].header.pax_records.is_empty());
    }

    #[test]
    fn test_gnu_times_become_pax_records() {
        let mut block: [u8; BLOCK_SIZE] = TarHeader::new_file("f", 0, 0o644)
            .to_bytes()
            .unwrap()[..]
            .try_into()
            .unwrap();
        block[257..265].copy_from_slice(b"ustar  \0");
        write_octal(&mut block[345..357], 1_700_000_001);
        write_octal(&mut block[357..369], 1_700_000_002);
        seal_checksum(&mut block);

        let header = TarHeader::from_block(&block).unwrap().unwrap();
        assert_eq!(header.name, "f");
        assert_eq!(header.pax_records["atime"], b"1700000001");
        assert_eq!(header.pax_records["ctime"], b"1700000002");
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let entries = vec![TarEntry::new(TarHeader::new_file("f", 0, 0o644), vec![1u8; 2000])];
        let bytes = archive(&entries);
        let err = TarReader::new(&bytes[..BLOCK_SIZE + 1000]).entries().unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_missing_end_marker_is_tolerated() {
        let entries = vec![TarEntry::new(TarHeader::new_file("f", 0, 0o644), b"abc".to_vec())];
        let bytes = archive(&entries);
        let read = TarReader::new(&bytes[..2 * BLOCK_SIZE]).entries().unwrap();
        assert_eq!(read, entries);
    }

    #[test]
    fn test_partial_header_block_is_error() {
        let entries = vec![TarEntry::new(TarHeader::new_file("f", 0, 0o644), b"abc".to_vec())];
        let bytes = archive(&entries);
        assert!(TarReader::new(&bytes[..2 * BLOCK_SIZE + 10]).entries().is_err());
    }

    #[test]
    fn test_base256_numeric() {
        let mut field = [0u8; 12];
        field[0] = 0x80;
        field[11] = 0x2A;
        assert_eq!(parse_numeric(&field, "size").unwrap(), 42);
    }

    #[test]
    fn test_pax_record_length() {
        assert_eq!(format_pax_record("path", b"abc"), b"12 path=abc\n");
        let long = "x".repeat(95);
        let record = String::from_utf8(format_pax_record("path", long.as_bytes())).unwrap();
        assert_eq!(record.len(), record.split(' ').next().unwrap().parse::<usize>().unwrap());
    }
}
