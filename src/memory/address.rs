// Tue Jan 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address {
    value: u64,
}

impl Address {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn as_u64(&self) -> u64 {
        self.value
    }

    /// Parses `0x1234`, `1234h` or plain hex text, the way addresses are
    /// usually pasted out of a disassembly listing.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .or_else(|| text.strip_suffix('h'))
            .unwrap_or(text);
        u64::from_str_radix(digits, 16).ok().map(Self::new)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.value)
    }
}

/// Slot stepping.
impl Add<u64> for Address {
    type Output = Self;
    fn add(self, rhs: u64) -> Self::Output {
        Self::new(self.value.wrapping_add(rhs))
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(Address::parse("0x401000"), Some(Address::new(0x401000)));
        assert_eq!(Address::parse("401000h"), Some(Address::new(0x401000)));
        assert_eq!(Address::parse("dead"), Some(Address::new(0xdead)));
        assert_eq!(Address::parse("xyz"), None);
    }

    #[test]
    fn test_address_display_is_upper_hex() {
        assert_eq!(Address::new(0xabc).to_string(), "0xABC");
    }
}
