// Tue Jan 20 2026 - Alex

use std::fmt;

/// One byte position of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Fixed(u8),
    Wildcard,
}

impl Token {
    pub fn matches(&self, byte: u8) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Fixed(b) => *b == byte,
        }
    }

    /// Parses a single whitespace-free token. `?` and `??` are both a full-byte wildcard,
    /// anything else must be exactly two hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        match s.as_bytes() {
            b"?" | b"??" => Some(Self::Wildcard),
            [hi, lo] => {
                let hi = hex_value(*hi)?;
                let lo = hex_value(*lo)?;
                Some(Self::Fixed((hi << 4) | lo))
            }
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    pub fn to_byte(&self) -> Option<u8> {
        match self {
            Self::Wildcard => None,
            Self::Fixed(b) => Some(*b),
        }
    }

    pub fn mask(&self) -> u8 {
        match self {
            Self::Wildcard => 0x00,
            Self::Fixed(_) => 0xFF,
        }
    }
}

// u8::from_str_radix would also accept a leading '+', which is not a valid pattern byte.
fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl From<u8> for Token {
    fn from(byte: u8) -> Self {
        Self::Fixed(byte)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(b) => write!(f, "{:02X}", b),
            Self::Wildcard => write!(f, "??"),
        }
    }
}
