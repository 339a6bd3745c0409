// Tue Jan 20 2026 - Alex

use crate::pattern::{CompiledPattern, ParseError, Token};

/// Parses `source` into a [`CompiledPattern`].
///
/// The grammar is a whitespace-separated list of tokens, each either two hex digits or a `?`/`??`
/// wildcard. Nothing is returned unless every token is valid.
pub fn compile(source: &str) -> Result<CompiledPattern, ParseError> {
    let tokens = parse(source)?;
    let compiled = CompiledPattern::from_tokens(tokens)?;

    log::trace!(
        "Compiled pattern \"{}\": {} tokens, anchor {:?}",
        compiled,
        compiled.len(),
        compiled.anchor()
    );

    Ok(compiled)
}

/// Tokenizes `source` without building search tables.
pub fn parse(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();

    for (index, (position, text)) in split_tokens(source).enumerate() {
        let token = Token::parse(text).ok_or_else(|| ParseError::InvalidToken {
            token: text.to_string(),
            index,
            position,
        })?;
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(tokens)
}

/// Like `split_whitespace`, but also yields the byte column of every token.
fn split_tokens(source: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut start = None;
    let mut chars = source.char_indices().chain(std::iter::once((source.len(), ' ')));

    std::iter::from_fn(move || {
        for (i, c) in chars.by_ref() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    start = None;
                    return Some((s, &source[s..i]));
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        None
    })
}

/// Bad-character shifts for a Horspool search anchored on the last fixed token.
///
/// `get(b)` is the smallest distance `k >= 1` such that the token `k` places before the anchor
/// could equal `b`; a window whose anchor byte is `b` cannot be followed by a match any closer.
/// Wildcards match every byte, so the nearest wildcard before the anchor bounds every shift.
pub(crate) struct ShiftTable {
    shifts: Box<[usize; 256]>,
}

impl ShiftTable {
    pub(crate) fn build(tokens: &[Token], anchor: Option<usize>) -> Self {
        let Some(anchor) = anchor else {
            return Self { shifts: Box::new([1; 256]) };
        };

        let prefix = &tokens[..anchor];
        let last_wildcard = prefix.iter().rposition(Token::is_wildcard);

        let default = match last_wildcard {
            Some(w) => anchor - w,
            None => anchor + 1,
        };

        let mut shifts = Box::new([default; 256]);
        let first = last_wildcard.map_or(0, |w| w + 1);

        for (i, token) in prefix.iter().enumerate().skip(first) {
            if let Token::Fixed(byte) = *token {
                shifts[byte as usize] = anchor - i;
            }
        }

        Self { shifts }
    }

    #[inline]
    pub(crate) fn get(&self, byte: u8) -> usize {
        self.shifts[byte as usize]
    }
}
