//! GZIP member header, trailer and stream framing.

use tgzorder_core::Crc32;
use tgzorder_core::error::{ArchiveError, Result};
use tgzorder_deflate::{deflate, inflate_prefix};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// OS byte written by the encoder (unknown).
pub const OS_UNKNOWN: u8 = 255;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// GZIP member header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    /// Flags.
    pub flags: u8,
    /// Modification time (Unix timestamp).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// Extra field (if FEXTRA flag set).
    pub extra: Option<Vec<u8>>,
    /// Original filename (if FNAME flag set).
    pub filename: Option<String>,
    /// Comment (if FCOMMENT flag set).
    pub comment: Option<String>,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            flags: 0,
            mtime: 0,
            xfl: 0,
            os: OS_UNKNOWN,
            extra: None,
            filename: None,
            comment: None,
        }
    }
}

impl GzipHeader {
    /// Header for a member compressed at `level`.
    ///
    /// The timestamp is zero so identical payloads produce identical bytes.
    pub fn for_level(level: u8) -> Self {
        let xfl = match level {
            9 => 2,
            0 | 1 => 4,
            _ => 0,
        };
        Self {
            xfl,
            ..Self::default()
        }
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut flags = self.flags & !(flags::FEXTRA | flags::FNAME | flags::FCOMMENT | flags::FHCRC);
        if self.extra.is_some() {
            flags |= flags::FEXTRA;
        }
        if self.filename.is_some() {
            flags |= flags::FNAME;
        }
        if self.comment.is_some() {
            flags |= flags::FCOMMENT;
        }

        let mut out = Vec::with_capacity(10);
        out.extend_from_slice(&GZIP_MAGIC);
        out.push(CM_DEFLATE);
        out.push(flags);
        out.extend_from_slice(&self.mtime.to_le_bytes());
        out.push(self.xfl);
        out.push(self.os);

        if let Some(ref extra) = self.extra {
            out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            out.extend_from_slice(extra);
        }
        if let Some(ref filename) = self.filename {
            out.extend_from_slice(filename.as_bytes());
            out.push(0);
        }
        if let Some(ref comment) = self.comment {
            out.extend_from_slice(comment.as_bytes());
            out.push(0);
        }
        out
    }

    /// Parse a header from the start of `data`.
    ///
    /// Returns the header and the number of bytes it occupies.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let fixed = take(data, 0, 10)?;

        if fixed[0..2] != GZIP_MAGIC {
            return Err(ArchiveError::invalid_magic(
                GZIP_MAGIC.to_vec(),
                fixed[0..2].to_vec(),
            ));
        }
        if fixed[2] != CM_DEFLATE {
            return Err(ArchiveError::unsupported_method(format!(
                "GZIP method {}",
                fixed[2]
            )));
        }

        let header_flags = fixed[3];
        if header_flags & flags::RESERVED != 0 {
            return Err(ArchiveError::invalid_header(format!(
                "reserved GZIP flag bits set: {:#04x}",
                header_flags
            )));
        }

        let mut header = Self {
            flags: header_flags,
            mtime: u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]),
            xfl: fixed[8],
            os: fixed[9],
            extra: None,
            filename: None,
            comment: None,
        };
        let mut pos = 10;

        if header_flags & flags::FEXTRA != 0 {
            let len_bytes = take(data, pos, 2)?;
            let len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
            header.extra = Some(take(data, pos + 2, len)?.to_vec());
            pos += 2 + len;
        }
        if header_flags & flags::FNAME != 0 {
            let (text, next) = zero_terminated(data, pos)?;
            header.filename = Some(text);
            pos = next;
        }
        if header_flags & flags::FCOMMENT != 0 {
            let (text, next) = zero_terminated(data, pos)?;
            header.comment = Some(text);
            pos = next;
        }
        if header_flags & flags::FHCRC != 0 {
            let stored = take(data, pos, 2)?;
            let stored = u16::from_le_bytes([stored[0], stored[1]]);
            let computed = (Crc32::compute(&data[..pos]) & 0xFFFF) as u16;
            if stored != computed {
                return Err(ArchiveError::crc_mismatch(stored as u32, computed as u32));
            }
            pos += 2;
        }

        Ok((header, pos))
    }
}

fn take(data: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    let end = pos.saturating_add(len);
    if end > data.len() {
        return Err(ArchiveError::unexpected_eof(end - data.len().max(pos)));
    }
    Ok(&data[pos..end])
}

fn zero_terminated(data: &[u8], pos: usize) -> Result<(String, usize)> {
    let rest = data.get(pos..).unwrap_or_default();
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ArchiveError::unexpected_eof(1))?;
    // RFC 1952 strings are ISO 8859-1.
    let text = rest[..nul].iter().map(|&b| b as char).collect();
    Ok((text, pos + nul + 1))
}

/// Compress `data` into a single GZIP member.
pub fn compress(data: &[u8], level: u8) -> Vec<u8> {
    let mut out = GzipHeader::for_level(level).to_bytes();
    out.extend_from_slice(&deflate(data, level));
    out.extend_from_slice(&Crc32::compute(data).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out
}

/// Decode one member at the start of `data`.
///
/// Returns the member payload and the number of bytes consumed.
pub fn decompress_member(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (_, header_len) = GzipHeader::parse(data)?;
    let (payload, body_len) = inflate_prefix(&data[header_len..])?;

    let trailer_pos = header_len + body_len;
    let trailer = take(data, trailer_pos, 8)?;
    let expected_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let expected_size = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

    let computed_crc = Crc32::compute(&payload);
    if computed_crc != expected_crc {
        return Err(ArchiveError::crc_mismatch(expected_crc, computed_crc));
    }
    if payload.len() as u32 != expected_size {
        return Err(ArchiveError::corrupted(
            trailer_pos as u64 + 4,
            format!(
                "ISIZE mismatch: trailer says {}, decoded {}",
                expected_size,
                payload.len() as u32
            ),
        ));
    }

    Ok((payload, trailer_pos + 8))
}

/// Decompress a GZIP stream.
///
/// Concatenated members decode to the concatenation of their payloads.
/// Anything after the last member that is not another member is an error.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let (mut output, mut pos) = decompress_member(data)?;
    while pos < data.len() {
        if !data[pos..].starts_with(&GZIP_MAGIC) {
            return Err(ArchiveError::corrupted(
                pos as u64,
                format!("{} bytes of trailing data after GZIP member", data.len() - pos),
            ));
        }
        let (payload, used) = decompress_member(&data[pos..])?;
        output.extend_from_slice(&payload);
        pos += used;
    }
    Ok(output)
}
