// Tue Jan 20 2026 - Alex

use crate::pattern::compiler::{self, ShiftTable};
use crate::pattern::{ParseError, Token};
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// A parsed pattern together with its search tables.
///
/// The value is immutable once built and is shared freely between threads. It is released by
/// dropping it; there is no other teardown. Callers on the C side of the boundary go through
/// [`crate::capi`], where releasing twice or scanning after release is undefined behaviour.
pub struct CompiledPattern {
    tokens: Box<[Token]>,
    anchor: Option<Anchor>,
    shifts: ShiftTable,
}

/// The last fixed token, which every scan window is tested against first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub index: usize,
    pub byte: u8,
}

impl CompiledPattern {
    /// Parses `source` and builds the search tables for it.
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        compiler::compile(source)
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::Empty);
        }

        let anchor = tokens.iter()
            .enumerate()
            .rev()
            .find_map(|(index, t)| t.to_byte().map(|byte| Anchor { index, byte }));

        let shifts = ShiftTable::build(&tokens, anchor.map(|a| a.index));

        Ok(Self {
            tokens: tokens.into_boxed_slice(),
            anchor,
            shifts,
        })
    }

    /// A pattern with no wildcards.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        Self::from_tokens(bytes.iter().copied().map(Token::Fixed).collect())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    pub(crate) fn shift(&self, byte: u8) -> usize {
        self.shifts.get(byte)
    }

    /// Pattern bytes with wildcard positions as `0x00`.
    pub fn bytes(&self) -> Vec<u8> {
        self.tokens.iter().map(|t| t.to_byte().unwrap_or(0)).collect()
    }

    /// `0xFF` for fixed positions, `0x00` for wildcards.
    pub fn masks(&self) -> Vec<u8> {
        self.tokens.iter().map(Token::mask).collect()
    }

    pub fn fixed_count(&self) -> usize {
        self.tokens.iter().filter(|t| !t.is_wildcard()).count()
    }

    pub fn wildcard_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_wildcard()).count()
    }

    pub fn is_all_wildcards(&self) -> bool {
        self.anchor.is_none()
    }

    pub fn to_hex_string(&self) -> String {
        self.tokens.iter().join(" ")
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("pattern", &self.to_hex_string())
            .field("len", &self.len())
            .field("anchor", &self.anchor)
            .finish()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for CompiledPattern {}

impl FromStr for CompiledPattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl TryFrom<&str> for CompiledPattern {
    type Error = ParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspection() {
        let pattern = CompiledPattern::compile("48 8b ? 05 ??").unwrap();

        assert_eq!(pattern.len(), 5);
        assert_eq!(pattern.fixed_count(), 3);
        assert_eq!(pattern.wildcard_count(), 2);
        assert_eq!(pattern.bytes(), vec![0x48, 0x8B, 0x00, 0x05, 0x00]);
        assert_eq!(pattern.masks(), vec![0xFF, 0xFF, 0x00, 0xFF, 0x00]);
        assert_eq!(pattern.anchor(), Some(Anchor { index: 3, byte: 0x05 }));
    }

    #[test]
    fn test_display_is_canonical() {
        let pattern: CompiledPattern = "  de ad\t? BE\nef ".parse().unwrap();
        assert_eq!(pattern.to_string(), "DE AD ?? BE EF");
    }

    #[test]
    fn test_display_reparses_to_same_pattern() {
        let pattern = CompiledPattern::compile("0f 1f ? 44 ?? 00").unwrap();
        let reparsed = CompiledPattern::compile(&pattern.to_string()).unwrap();
        assert_eq!(pattern, reparsed);
    }

    #[test]
    fn test_all_wildcards_has_no_anchor() {
        let pattern = CompiledPattern::compile("?? ?").unwrap();
        assert!(pattern.is_all_wildcards());
        assert_eq!(pattern.anchor(), None);
    }

    #[test]
    fn test_from_tokens_rejects_empty() {
        assert_eq!(CompiledPattern::from_tokens(Vec::new()).unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn test_from_bytes() {
        let pattern = CompiledPattern::from_bytes(&[0xC3, 0xCC]).unwrap();
        assert_eq!(pattern.to_string(), "C3 CC");
        assert_eq!(pattern.wildcard_count(), 0);
    }

    #[test]
    fn test_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledPattern>();
    }
}
