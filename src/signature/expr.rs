// Tue Jan 20 2026 - Alex

//! Address expressions applied to each match of a signature.
//!
//! Expressions are infix with hexadecimal literals (`10` is sixteen, a `0x` prefix is allowed):
//!
//! - `$` (or `$here`, `here`) is the address of the match,
//! - `+ - * / % & ^ |` are wrapping 64-bit operators, `*` `/` `%` binding tightest and `|` loosest,
//! - `( )` groups,
//! - `[expr]` loads an integer from the scanned regions. A suffix picks the width: `.b`, `.w`,
//!   `.d`, `.q` (no suffix reads 8 bytes). `.s` before the width sign-extends the value, and
//!   `.r` adds the value to the load address (`.r` alone reads a signed dword).
//!
//! A rel32 call target is `[$+1].r+4`; a RIP-relative `mov rax, [rip+disp]` is `[$+3].r+4`.

use crate::memory::Region;
use crate::signature::ExprError;
use std::fmt;
use std::str::FromStr;

const POINTER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Xor,
    Or,
}

impl BinOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            '%' => Some(Self::Mod),
            '&' => Some(Self::And),
            '^' => Some(Self::Xor),
            '|' => Some(Self::Or),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Mod => 6,
            Self::Add | Self::Sub => 5,
            Self::And => 4,
            Self::Xor => 3,
            Self::Or => 2,
        }
    }

    fn apply(self, lhs: u64, rhs: u64) -> Result<u64, ExprError> {
        match self {
            Self::Add => Ok(lhs.wrapping_add(rhs)),
            Self::Sub => Ok(lhs.wrapping_sub(rhs)),
            Self::Mul => Ok(lhs.wrapping_mul(rhs)),
            Self::Div => lhs.checked_div(rhs).ok_or(ExprError::DivideByZero),
            Self::Mod => lhs.checked_rem(rhs).ok_or(ExprError::DivideByZero),
            Self::And => Ok(lhs & rhs),
            Self::Xor => Ok(lhs ^ rhs),
            Self::Or => Ok(lhs | rhs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Load {
    size: usize,
    signed: bool,
    relative: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Number(u64),
    Here,
    Binary(BinOp, Box<Node>, Box<Node>),
    Load(Load, Box<Node>),
}

/// A parsed `ops` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let mut parser = Parser { source, pos: 0 };
        let root = parser.expr(0)?;

        if let Some(found) = parser.peek() {
            return Err(ExprError::Unexpected { found, position: parser.pos });
        }

        Ok(Self {
            source: source.trim().to_string(),
            root,
        })
    }

    /// Evaluates the expression for a match at `here`, reading memory from `regions`.
    pub fn evaluate(&self, here: u64, regions: &[Region<'_>]) -> Result<u64, ExprError> {
        eval(&self.root, here, regions)
    }
}

impl FromStr for Expression {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval(node: &Node, here: u64, regions: &[Region<'_>]) -> Result<u64, ExprError> {
    match node {
        Node::Number(value) => Ok(*value),
        Node::Here => Ok(here),
        Node::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, here, regions)?;
            let rhs = eval(rhs, here, regions)?;
            op.apply(lhs, rhs)
        }
        Node::Load(load, address) => {
            let address = eval(address, here, regions)?;
            let raw = regions.iter()
                .find_map(|region| region.read_uint(address, load.size))
                .ok_or(ExprError::Unreadable { address, size: load.size })?;

            let value = if load.signed { sign_extend(raw, load.size * 8) } else { raw };
            Ok(if load.relative { address.wrapping_add(value) } else { value })
        }
    }
}

fn sign_extend(value: u64, bits: usize) -> u64 {
    if bits >= 64 {
        return value;
    }
    let sign = 1u64 << (bits - 1);
    (value ^ sign).wrapping_sub(sign)
}

struct Parser<'s> {
    source: &'s str,
    pos: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        let rest = &self.source[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Next non-whitespace character, not consumed.
    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.source[self.pos..].chars().next()
    }

    /// Consumes `c` if it is the very next character.
    fn eat(&mut self, c: char) -> bool {
        if self.source[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, c: char) -> Result<(), ExprError> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(ExprError::Unexpected { found, position: self.pos }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn word(&mut self) -> &str {
        let rest = &self.source[self.pos..];
        let len = rest.find(|c: char| !c.is_ascii_alphanumeric() && c != '_').unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn expr(&mut self, min_precedence: u8) -> Result<Node, ExprError> {
        let mut lhs = self.atom()?;

        while let Some(op) = self.peek().and_then(BinOp::from_char) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.expr(precedence + 1)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn atom(&mut self) -> Result<Node, ExprError> {
        self.skip_whitespace();
        let position = self.pos;

        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let inner = self.expr(0)?;
                self.expect_char(')')?;
                Ok(inner)
            }
            Some('[') => {
                self.pos += 1;
                let inner = self.expr(0)?;
                self.expect_char(']')?;
                let load = self.load_suffix()?;
                Ok(Node::Load(load, Box::new(inner)))
            }
            Some('$') => {
                self.pos += 1;
                match self.word() {
                    "" | "here" => Ok(Node::Here),
                    name => Err(ExprError::UnknownSymbol { name: name.to_string(), position }),
                }
            }
            Some(c) if c.is_ascii_alphanumeric() => {
                let word = self.word();
                if word == "here" {
                    return Ok(Node::Here);
                }
                let digits = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")).unwrap_or(word);
                u64::from_str_radix(digits, 16)
                    .map(Node::Number)
                    .map_err(|_| ExprError::InvalidNumber { text: word.to_string(), position })
            }
            Some(found) => Err(ExprError::Unexpected { found, position }),
        }
    }

    fn load_suffix(&mut self) -> Result<Load, ExprError> {
        let mut load = Load {
            size: POINTER_SIZE,
            signed: false,
            relative: false,
        };

        if !self.eat('.') {
            return Ok(load);
        }

        load.relative = self.eat('r');
        load.signed = self.eat('s');

        let position = self.pos;
        load.size = if self.eat('b') {
            1
        } else if self.eat('w') {
            2
        } else if self.eat('d') {
            4
        } else if self.eat('q') {
            8
        } else if load.relative {
            load.signed = true;
            4
        } else {
            return Err(ExprError::InvalidLoadSize { position });
        };

        Ok(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_at(source: &str, here: u64, regions: &[Region<'_>]) -> Result<u64, ExprError> {
        Expression::parse(source)?.evaluate(here, regions)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_at("$ + 10", 0x1000, &[]), Ok(0x1010));
        assert_eq!(eval_at("here - 1", 0x1000, &[]), Ok(0xFFF));
        assert_eq!(eval_at("2 + 3 * 4", 0, &[]), Ok(14));
        assert_eq!(eval_at("(2 + 3) * 4", 0, &[]), Ok(20));
        assert_eq!(eval_at("10 - 4 - 2", 0, &[]), Ok(10));
        assert_eq!(eval_at("0xF0 | 0F & 3", 0, &[]), Ok(0xF3));
        assert_eq!(eval_at("$here - 1", 0, &[]), Ok(u64::MAX));
    }

    #[test]
    fn test_rel32_call_target() {
        // call 0x2000 at 0x1000, then call 0x800 at 0x1005
        let code = [0xE8, 0xFB, 0x0F, 0x00, 0x00, 0xE8, 0xF6, 0xF7, 0xFF, 0xFF];
        let regions = [Region::new(0x1000, &code)];

        assert_eq!(eval_at("[$+1].r+4", 0x1000, &regions), Ok(0x2000));
        assert_eq!(eval_at("[$+1].r+4", 0x1005, &regions), Ok(0x800));
    }

    #[test]
    fn test_rip_relative_load() {
        // mov rax, [rip+0x10] at 0x4000
        let code = [0x48, 0x8B, 0x05, 0x10, 0x00, 0x00, 0x00];
        let regions = [Region::new(0x4000, &code)];
        assert_eq!(eval_at("[$+3].r+4", 0x4000, &regions), Ok(0x4017));
    }

    #[test]
    fn test_load_widths() {
        let data = [0xFE, 0xFF, 0x34, 0x12, 0x00, 0x00, 0x00, 0x80];
        let regions = [Region::new(0x10, &data)];

        assert_eq!(eval_at("[10].b", 0, &regions), Ok(0xFE));
        assert_eq!(eval_at("[10].sb", 0, &regions), Ok((-2i64) as u64));
        assert_eq!(eval_at("[10].w", 0, &regions), Ok(0xFFFE));
        assert_eq!(eval_at("[12].d", 0, &regions), Ok(0x1234));
        assert_eq!(eval_at("[10]", 0, &regions), Ok(0x8000_0000_1234_FFFE));
        assert_eq!(eval_at("[10].q", 0, &regions), eval_at("[10]", 0, &regions));
    }

    #[test]
    fn test_unreadable_memory() {
        let data = [0u8; 4];
        let regions = [Region::new(0x10, &data)];
        assert_eq!(
            eval_at("[12].d", 0, &regions),
            Err(ExprError::Unreadable { address: 0x12, size: 4 })
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_at("$ / 0", 5, &[]), Err(ExprError::DivideByZero));
        assert_eq!(eval_at("$ % 0", 5, &[]), Err(ExprError::DivideByZero));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Expression::parse(""), Err(ExprError::UnexpectedEnd));
        assert_eq!(Expression::parse("$ +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(Expression::parse("($ + 1"), Err(ExprError::UnexpectedEnd));
        assert_eq!(Expression::parse("$ 1"), Err(ExprError::Unexpected { found: '1', position: 2 }));
        assert_eq!(Expression::parse("[$].x"), Err(ExprError::InvalidLoadSize { position: 4 }));
        assert!(matches!(Expression::parse("$base"), Err(ExprError::UnknownSymbol { .. })));
        assert!(matches!(Expression::parse("zz"), Err(ExprError::InvalidNumber { .. })));
    }

    #[test]
    fn test_display_keeps_source() {
        let expression: Expression = "  [$+1].r + 4 ".parse().unwrap();
        assert_eq!(expression.to_string(), "[$+1].r + 4");
    }
}
