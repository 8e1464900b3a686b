//! Tag identity: 96-bit EPC identifiers, bit prefixes and ground-truth tags.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// EPC
// ============================================================================

/// A 96-bit Electronic Product Code.
///
/// Stored right-aligned in a `u128`; the upper 32 bits are always zero.
/// Numeric order equals the lexicographic order of the zero-padded 96-bit
/// binary string, so sorting EPCs groups identifiers with long shared
/// prefixes next to each other.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Epc(u128);

impl Epc {
    /// Width of an EPC in bits.
    pub const BITS: u32 = 96;

    const MASK: u128 = (1u128 << Self::BITS) - 1;

    /// Creates an EPC from its integer value.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not fit in 96 bits.
    pub fn new(value: u128) -> Self {
        assert!(
            value & !Self::MASK == 0,
            "EPC value {value:#x} exceeds {} bits",
            Self::BITS
        );
        Self(value)
    }

    /// Returns the integer value used for keyed hashing.
    pub fn value(self) -> u128 {
        self.0
    }

    /// Returns bit `index`, counted from the most significant of the 96 bits.
    pub fn bit(self, index: u32) -> bool {
        debug_assert!(index < Self::BITS);
        (self.0 >> (Self::BITS - 1 - index)) & 1 == 1
    }

    /// Number of leading bits shared with `other` (96 when equal).
    pub fn common_prefix_len(self, other: Epc) -> u32 {
        let diff = self.0 ^ other.0;
        if diff == 0 {
            Self::BITS
        } else {
            diff.leading_zeros() - (u128::BITS - Self::BITS)
        }
    }

    /// Returns the leading `len` bits of this EPC as a prefix.
    pub fn prefix(self, len: u32) -> EpcPrefix {
        EpcPrefix::of(self, len)
    }

    /// Returns the 96-character binary representation.
    pub fn to_bit_string(self) -> String {
        format!("{:096b}", self.0)
    }
}

impl Debug for Epc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epc({self})")
    }
}

impl Display for Epc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:024X}", self.0)
    }
}

/// Error parsing an EPC from hex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EpcParseError {
    #[error("EPC is empty")]
    Empty,

    #[error("EPC has {0} hex digits, at most 24 are allowed")]
    TooLong(usize),

    #[error("EPC contains a non-hex character: {0:?}")]
    InvalidDigit(String),
}

impl FromStr for Epc {
    type Err = EpcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("0x");
        if digits.is_empty() {
            return Err(EpcParseError::Empty);
        }
        if digits.len() > 24 {
            return Err(EpcParseError::TooLong(digits.len()));
        }
        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| EpcParseError::InvalidDigit(s.to_string()))
    }
}

impl TryFrom<String> for Epc {
    type Error = EpcParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Epc> for String {
    fn from(epc: Epc) -> Self {
        epc.to_string()
    }
}

// ============================================================================
// EPC Prefix
// ============================================================================

/// The leading `len` bits of an EPC, used to address a contiguous range of
/// sorted tags with a single downlink field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpcPrefix {
    /// Prefix bits, left-aligned in the 96-bit space; trailing bits are zero.
    bits: u128,
    len: u32,
}

impl EpcPrefix {
    /// The zero-length prefix, matched by every EPC.
    pub const EMPTY: EpcPrefix = EpcPrefix { bits: 0, len: 0 };

    /// Takes the leading `len` bits of `epc`.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`Epc::BITS`].
    pub fn of(epc: Epc, len: u32) -> Self {
        assert!(len <= Epc::BITS, "prefix length {len} exceeds EPC width");
        Self {
            bits: epc.value() & Self::mask(len),
            len,
        }
    }

    fn mask(len: u32) -> u128 {
        if len == 0 {
            0
        } else {
            Epc::MASK & !((1u128 << (Epc::BITS - len)) - 1)
        }
    }

    /// Prefix length in bits.
    pub fn len(self) -> u32 {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns true if `epc` starts with this prefix.
    pub fn matches(self, epc: Epc) -> bool {
        epc.value() & Self::mask(self.len) == self.bits
    }
}

impl Debug for EpcPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpcPrefix({self})")
    }
}

impl Display for EpcPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            return f.write_str("*");
        }
        let full = format!("{:096b}", self.bits);
        write!(f, "{}/{}", &full[..self.len as usize], self.len)
    }
}

// ============================================================================
// Tag
// ============================================================================

/// A physical tag in one simulated run. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub epc: Epc,
    /// Ground truth: is the tag physically in the reader's field?
    pub present: bool,
    /// Received signal strength at the reader, used only for capture arbitration.
    pub rssi_dbm: f64,
}

impl Tag {
    /// Signal strength assigned when none is specified.
    pub const DEFAULT_RSSI_DBM: f64 = -60.0;

    pub fn new(epc: Epc, present: bool, rssi_dbm: f64) -> Self {
        Self {
            epc,
            present,
            rssi_dbm,
        }
    }

    pub fn present(epc: Epc) -> Self {
        Self::new(epc, true, Self::DEFAULT_RSSI_DBM)
    }

    pub fn missing(epc: Epc) -> Self {
        Self::new(epc, false, Self::DEFAULT_RSSI_DBM)
    }

    pub fn with_rssi(mut self, rssi_dbm: f64) -> Self {
        self.rssi_dbm = rssi_dbm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn display_is_24_hex_digits() {
        let epc = Epc::new(0xE200_001D_4500_0000_0000_0001);
        assert_eq!(epc.to_string(), "E200001D4500000000000001");
        assert_eq!("E200001D4500000000000001".parse::<Epc>(), Ok(epc));
    }

    #[test]
    fn short_hex_is_zero_padded() {
        let epc: Epc = "E2000000".parse().expect("valid hex");
        assert_eq!(epc.to_string(), "0000000000000000E2000000");
    }

    #[test_case("" => EpcParseError::Empty ; "empty")]
    #[test_case("E200001D45000000000000011" => EpcParseError::TooLong(25) ; "too long")]
    #[test_case("E2G0" => EpcParseError::InvalidDigit("E2G0".into()) ; "bad digit")]
    fn rejects_malformed_hex(input: &str) -> EpcParseError {
        input.parse::<Epc>().expect_err("must fail")
    }

    #[test]
    #[should_panic(expected = "exceeds 96 bits")]
    fn rejects_values_wider_than_96_bits() {
        let _ = Epc::new(1u128 << 96);
    }

    #[test]
    fn bit_indexes_from_most_significant() {
        let epc = Epc::new(1u128 << 95 | 1);
        assert!(epc.bit(0));
        assert!(!epc.bit(1));
        assert!(epc.bit(95));
    }

    #[test_case(0b1000, 0b1011 => 94)]
    #[test_case(0, 0 => 96)]
    #[test_case(0, 1u128 << 95 => 0)]
    fn common_prefix_len(a: u128, b: u128) -> u32 {
        Epc::new(a).common_prefix_len(Epc::new(b))
    }

    #[test]
    fn empty_prefix_matches_everything() {
        assert!(EpcPrefix::EMPTY.matches(Epc::new(0)));
        assert!(EpcPrefix::EMPTY.matches(Epc::new(Epc::MASK)));
    }

    #[test]
    fn prefix_display_shows_bits_and_length() {
        let prefix = Epc::new(0b101 << 93).prefix(3);
        assert_eq!(prefix.to_string(), "101/3");
        assert_eq!(EpcPrefix::EMPTY.to_string(), "*");
    }

    #[test]
    fn serde_uses_hex_form() {
        let epc = Epc::new(0xABCDEF);
        let json = serde_json::to_string(&epc).expect("serialize");
        assert_eq!(json, "\"000000000000000000ABCDEF\"");
        let back: Epc = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, epc);
    }

    proptest! {
        #[test]
        fn prefix_of_lcp_matches_both(a in 0u128..(1u128 << 96), b in 0u128..(1u128 << 96)) {
            let (a, b) = (Epc::new(a), Epc::new(b));
            let lcp = a.common_prefix_len(b);
            let prefix = a.prefix(lcp);
            prop_assert!(prefix.matches(a));
            prop_assert!(prefix.matches(b));
            if lcp < Epc::BITS {
                prop_assert!(!a.prefix(lcp + 1).matches(b));
            }
        }

        #[test]
        fn numeric_order_matches_bit_string_order(a in 0u128..(1u128 << 96), b in 0u128..(1u128 << 96)) {
            let (a, b) = (Epc::new(a), Epc::new(b));
            prop_assert_eq!(a.cmp(&b), a.to_bit_string().cmp(&b.to_bit_string()));
        }
    }
}
