// Tue Jan 20 2026 - Alex

use std::fmt;

/// A borrowed block of bytes that lives at `base` in some address space.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    name: &'a str,
    base: u64,
    data: &'a [u8],
}

impl<'a> Region<'a> {
    pub fn new(base: u64, data: &'a [u8]) -> Self {
        Self { name: "", base, data }
    }

    pub fn with_name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.data.len() as u64)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    /// Reads a little-endian unsigned integer of 1 to 8 bytes at `address`.
    pub fn read_uint(&self, address: u64, size: usize) -> Option<u64> {
        if size == 0 || size > 8 {
            return None;
        }
        let offset = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let bytes = self.data.get(offset..offset.checked_add(size)?)?;
        Some(bytes.iter().rev().fold(0, |value, &byte| (value << 8) | byte as u64))
    }
}

impl fmt::Display for Region<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{} ", self.name)?;
        }
        write!(f, "[0x{:X} - 0x{:X}]", self.base, self.end())
    }
}
