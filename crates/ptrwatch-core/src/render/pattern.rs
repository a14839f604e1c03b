use memchr::{memchr_iter, memmem};

use crate::error::{Error, Result};

/// A track-terminator byte pattern with single-byte wildcards (`??`).
///
/// Byte tokens may be separated by commas or whitespace, so the original
/// `-E ff,2f` style and signature-style `D4 ?? 00` both parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndPattern {
    bytes: Vec<Option<u8>>,
}

impl EndPattern {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in spec.split([',', ' ']).filter(|t| !t.is_empty()) {
            if token == "??" || token == "?" {
                bytes.push(None);
                continue;
            }
            let value = u8::from_str_radix(token, 16)
                .map_err(|e| Error::InvalidPattern(format!("bad byte token '{token}': {e}")))?;
            bytes.push(Some(value));
        }
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_owned()));
        }
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The pattern as raw bytes, if it contains no wildcards.
    fn as_literal(&self) -> Option<Vec<u8>> {
        self.bytes.iter().copied().collect()
    }

    fn matches_at(&self, hay: &[u8], pos: usize) -> bool {
        if hay.len() - pos < self.bytes.len() {
            return false;
        }
        hay[pos..]
            .iter()
            .zip(&self.bytes)
            .all(|(b, m)| m.is_none() || *m == Some(*b))
    }

    /// Position of the earliest match, scanning forward.
    pub fn find_first(&self, hay: &[u8]) -> Option<usize> {
        let n = self.bytes.len();
        if n == 0 || hay.len() < n {
            return None;
        }
        if let Some(literal) = self.as_literal() {
            return memmem::find(hay, &literal);
        }
        match self.bytes[0] {
            Some(first) => memchr_iter(first, &hay[..hay.len() - n + 1])
                .find(|&pos| self.matches_at(hay, pos)),
            None => (0..=hay.len() - n).find(|&pos| self.matches_at(hay, pos)),
        }
    }

    /// Position of the latest match, scanning backward.
    pub fn find_last(&self, hay: &[u8]) -> Option<usize> {
        let n = self.bytes.len();
        if n == 0 || hay.len() < n {
            return None;
        }
        if let Some(literal) = self.as_literal() {
            return memmem::rfind(hay, &literal);
        }
        (0..=hay.len() - n).rev().find(|&pos| self.matches_at(hay, pos))
    }
}

impl std::fmt::Display for EndPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for byte in &self.bytes {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            match byte {
                Some(value) => write!(f, "{value:02X}")?,
                None => write!(f, "??")?,
            }
        }
        Ok(())
    }
}

/// Parse one pattern per spec string.
pub fn parse_patterns<S: AsRef<str>>(specs: &[S]) -> Result<Vec<EndPattern>> {
    specs.iter().map(|s| EndPattern::parse(s.as_ref())).collect()
}

/// Earliest match across all patterns: `(start, matched length)`.
pub(crate) fn earliest_match(patterns: &[EndPattern], hay: &[u8]) -> Option<(usize, usize)> {
    patterns
        .iter()
        .filter_map(|p| p.find_first(hay).map(|start| (start, p.len())))
        .min_by_key(|&(start, _)| start)
}

/// Latest match across all patterns: `(start, matched length)`.
pub(crate) fn latest_match(patterns: &[EndPattern], hay: &[u8]) -> Option<(usize, usize)> {
    patterns
        .iter()
        .filter_map(|p| p.find_last(hay).map(|start| (start, p.len())))
        .max_by_key(|&(start, _)| start)
}
