// Tue Jan 20 2026 - Alex

use crate::pattern::CompiledPattern;
use std::iter::FusedIterator;

/// Scans `data` for up to `max_results` occurrences of `pattern`.
///
/// `max_results == 0` yields no matches; use [`CompiledPattern::scan_all`] for an unbounded scan.
pub fn scan(pattern: &CompiledPattern, data: &[u8], max_results: usize) -> Vec<usize> {
    pattern.scan(data, max_results)
}

impl CompiledPattern {
    /// Lazily yields every match offset in `data`, in ascending order, overlapping matches
    /// included.
    pub fn matches<'p, 'd>(&'p self, data: &'d [u8]) -> Matches<'p, 'd> {
        Matches {
            pattern: self,
            data,
            pos: 0,
        }
    }

    /// Returns at most `max_results` match offsets, leftmost first. Scanning stops as soon as
    /// the limit is reached.
    pub fn scan(&self, data: &[u8], max_results: usize) -> Vec<usize> {
        self.matches(data).take(max_results).collect()
    }

    /// Writes match offsets into `results` and returns how many were written. The length of
    /// `results` is the match limit; nothing past it is ever touched.
    pub fn scan_into(&self, data: &[u8], results: &mut [usize]) -> usize {
        let mut count = 0;

        // `results` drives the zip so no match beyond the limit is searched for.
        for (slot, offset) in results.iter_mut().zip(self.matches(data)) {
            *slot = offset;
            count += 1;
        }

        count
    }

    pub fn scan_all(&self, data: &[u8]) -> Vec<usize> {
        self.matches(data).collect()
    }

    pub fn find_first(&self, data: &[u8]) -> Option<usize> {
        self.matches(data).next()
    }

    pub fn count_in(&self, data: &[u8]) -> usize {
        self.matches(data).count()
    }

    /// Checks a single position. Out-of-range offsets never match.
    pub fn is_match_at(&self, data: &[u8], offset: usize) -> bool {
        match offset.checked_add(self.len()) {
            Some(end) if end <= data.len() => self.verify(&data[offset..end]),
            _ => false,
        }
    }

    /// Compares `window` against every token in pattern order. `window` must be exactly
    /// `len()` bytes.
    #[inline]
    fn verify(&self, window: &[u8]) -> bool {
        self.tokens()
            .iter()
            .zip(window)
            .all(|(token, &byte)| token.matches(byte))
    }
}

/// Iterator over match offsets, returned by [`CompiledPattern::matches`].
///
/// Windows are tested on the anchor byte first and then verified token by token. After every
/// window, matched or not, the position advances by the shift for the byte seen at the anchor,
/// which never passes over a possible match.
pub struct Matches<'p, 'd> {
    pattern: &'p CompiledPattern,
    data: &'d [u8],
    pos: usize,
}

impl<'p, 'd> Matches<'p, 'd> {
    /// One past the last start offset that still leaves room for the whole pattern.
    fn end(&self) -> usize {
        match self.data.len().checked_sub(self.pattern.len()) {
            Some(last) => last + 1,
            None => 0,
        }
    }
}

impl<'p, 'd> Iterator for Matches<'p, 'd> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let end = self.end();
        let len = self.pattern.len();

        let Some(anchor) = self.pattern.anchor() else {
            // Nothing to skip on: every viable offset matches.
            if self.pos >= end {
                return None;
            }
            let offset = self.pos;
            self.pos += 1;
            return Some(offset);
        };

        while self.pos < end {
            let offset = self.pos;
            let byte = self.data[offset + anchor.index];

            self.pos += self.pattern.shift(byte);

            if byte == anchor.byte && self.pattern.verify(&self.data[offset..offset + len]) {
                return Some(offset);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end().saturating_sub(self.pos)))
    }
}

impl FusedIterator for Matches<'_, '_> {}
