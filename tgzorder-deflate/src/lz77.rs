//! LZ77 match finding for DEFLATE.
//!
//! The whole input is held in memory, so positions are absolute offsets into
//! it. Hash chains index every 3-byte prefix inside a 32 KiB sliding window,
//! and lazy matching defers a match by one byte when the next position
//! promises a longer one.
//!
//! # Levels
//!
//! | level | good | lazy | nice | chain |
//! |-------|------|------|------|-------|
//! | 1     | 4    | 4    | 8    | 4     |
//! | 6     | 8    | 16   | 128  | 128   |
//! | 9     | 32   | 258  | 258  | 4096  |

/// Maximum window size for DEFLATE (32KB).
pub const WINDOW_SIZE: usize = 32768;

/// Minimum match length.
pub const MIN_MATCH: usize = 3;

/// Maximum match length.
pub const MAX_MATCH: usize = 258;

/// Furthest back a match may reach.
const MAX_DIST: usize = WINDOW_SIZE - MAX_MATCH - MIN_MATCH - 1;

/// 3-byte matches further than this cost more than three literals.
const TOO_FAR: usize = 4096;

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// Empty hash slot.
const NIL: u32 = u32::MAX;

/// A token produced by LZ77 compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Token {
    /// A literal byte.
    Literal(u8),
    /// A back-reference to previously seen data.
    Match {
        /// Number of bytes to copy (3-258).
        length: u16,
        /// Distance back into the window (1-32768).
        distance: u16,
    },
}

impl Lz77Token {
    /// Number of input bytes this token covers.
    #[inline]
    pub fn input_len(&self) -> usize {
        match self {
            Self::Literal(_) => 1,
            Self::Match { length, .. } => *length as usize,
        }
    }
}

/// Search parameters for one compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParams {
    /// Once the previous match is this long, search a quarter of the chain.
    pub good_length: usize,
    /// Skip the lazy search once the previous match is this long.
    pub max_lazy: usize,
    /// Stop searching once a match is this long.
    pub nice_length: usize,
    /// Maximum number of chain links followed per search.
    pub max_chain: usize,
}

impl MatchParams {
    /// Parameters for a compression level (0-9, clamped).
    pub fn for_level(level: u8) -> Self {
        let (good_length, max_lazy, nice_length, max_chain) = match level.min(9) {
            0 => (0, 0, 0, 0),
            1 => (4, 4, 8, 4),
            2 => (4, 5, 16, 8),
            3 => (4, 6, 32, 32),
            4 => (4, 4, 16, 16),
            5 => (8, 16, 32, 32),
            6 => (8, 16, 128, 128),
            7 => (8, 32, 128, 256),
            8 => (32, 128, 258, 1024),
            _ => (32, 258, 258, 4096),
        };
        Self {
            good_length,
            max_lazy,
            nice_length,
            max_chain,
        }
    }
}

/// LZ77 encoder for DEFLATE compression.
#[derive(Debug)]
pub struct Lz77Encoder {
    params: MatchParams,
    /// Most recent position for each hash.
    head: Vec<u32>,
    /// Previous position with the same hash, indexed by `pos & WINDOW_MASK`.
    prev: Vec<u32>,
}

impl Lz77Encoder {
    /// Create a new LZ77 encoder with the specified compression level (0-9).
    pub fn with_level(level: u8) -> Self {
        Self {
            params: MatchParams::for_level(level),
            head: vec![NIL; HASH_SIZE],
            prev: vec![NIL; WINDOW_SIZE],
        }
    }

    /// Compress all data at once (convenience method).
    pub fn compress_all(input: &[u8], level: u8) -> Vec<Lz77Token> {
        Self::with_level(level).compress(input)
    }

    #[inline(always)]
    fn hash(data: &[u8], pos: usize) -> usize {
        let v = (data[pos] as u32) | (data[pos + 1] as u32) << 8 | (data[pos + 2] as u32) << 16;
        (v.wrapping_mul(0x9E3779B1) >> (32 - HASH_BITS)) as usize
    }

    /// Link `pos` into its hash chain and return the previous chain head.
    #[inline]
    fn insert(&mut self, data: &[u8], pos: usize) -> u32 {
        if pos + MIN_MATCH > data.len() {
            return NIL;
        }
        let h = Self::hash(data, pos);
        let previous = self.head[h];
        self.prev[pos & WINDOW_MASK] = previous;
        self.head[h] = pos as u32;
        previous
    }

    /// Longest match at `pos` that beats `prev_len`, walking the chain from `start`.
    ///
    /// Returns `(prev_len, 0)` when nothing better is found.
    fn longest_match(&self, data: &[u8], pos: usize, start: u32, prev_len: usize) -> (usize, usize) {
        let max_len = MAX_MATCH.min(data.len() - pos);
        let mut best_len = prev_len;
        let mut best_dist = 0;
        if max_len < MIN_MATCH || best_len >= max_len {
            return (best_len, best_dist);
        }

        let mut chain = if prev_len >= self.params.good_length {
            self.params.max_chain >> 2
        } else {
            self.params.max_chain
        };
        let nice = self.params.nice_length.min(max_len);
        let limit = pos.saturating_sub(MAX_DIST);

        let window = &data[pos..pos + max_len];
        let mut candidate = start;
        while candidate != NIL && chain > 0 {
            let cand = candidate as usize;
            if cand < limit || cand >= pos {
                break;
            }

            let other = &data[cand..];
            // Cheap rejection on the byte that would extend the best match.
            if other[best_len] == window[best_len] && other[0] == window[0] {
                let len = window
                    .iter()
                    .zip(other)
                    .take_while(|(a, b)| a == b)
                    .count();
                if len > best_len {
                    best_len = len;
                    best_dist = pos - cand;
                    if len >= nice {
                        break;
                    }
                }
            }

            let next = self.prev[cand & WINDOW_MASK];
            if next != NIL && next as usize >= cand {
                break;
            }
            candidate = next;
            chain -= 1;
        }

        (best_len, best_dist)
    }

    /// Compress input data to LZ77 tokens.
    pub fn compress(&mut self, data: &[u8]) -> Vec<Lz77Token> {
        let mut tokens = Vec::with_capacity(data.len() / 2 + 16);

        if self.params.max_chain == 0 {
            tokens.extend(data.iter().map(|&b| Lz77Token::Literal(b)));
            return tokens;
        }

        let mut pos = 0;
        let mut prev_len = MIN_MATCH - 1;
        let mut prev_dist = 0;
        let mut match_available = false;

        while pos < data.len() {
            let chain_head = self.insert(data, pos);

            let mut cur_len = MIN_MATCH - 1;
            let mut cur_dist = 0;
            if chain_head != NIL && prev_len < self.params.max_lazy {
                (cur_len, cur_dist) = self.longest_match(data, pos, chain_head, prev_len);
                if cur_dist == 0 || (cur_len == MIN_MATCH && cur_dist > TOO_FAR) {
                    cur_len = MIN_MATCH - 1;
                }
            }

            if prev_len >= MIN_MATCH && cur_len <= prev_len {
                tokens.push(Lz77Token::Match {
                    length: prev_len as u16,
                    distance: prev_dist as u16,
                });
                // The match started at pos - 1; pos is already hashed.
                let end = pos - 1 + prev_len;
                for p in pos + 1..end {
                    self.insert(data, p);
                }
                pos = end;
                match_available = false;
                prev_len = MIN_MATCH - 1;
                continue;
            }

            if match_available {
                tokens.push(Lz77Token::Literal(data[pos - 1]));
            }
            match_available = true;
            prev_len = cur_len;
            prev_dist = cur_dist;
            pos += 1;
        }

        if match_available {
            tokens.push(Lz77Token::Literal(data[pos - 1]));
        }

        tokens
    }
}
