//! Compact difficulty targets
//!
//! The compact form packs a 256-bit target into 32 bits: the top byte is the
//! length of the target in bytes and the low three bytes are its most
//! significant digits. Bit 0x00800000 is a sign bit; targets are never
//! negative, so decoding drops it from the magnitude and only reports it.

use crate::hash::Hash256;
use crate::{Error, Result};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Target in compact form
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactTarget(u32);

/// Result of expanding compact bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTarget {
    /// Magnitude of the target with the sign bit cleared
    pub target: U256,
    /// Sign bit was set on a non-zero mantissa
    pub negative: bool,
    /// Target does not fit in 256 bits; `target` is zero in that case
    pub overflow: bool,
}

impl CompactTarget {
    /// Wrap the raw `bits` header field
    pub const fn from_consensus(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw `bits` value
    pub const fn to_consensus(self) -> u32 {
        self.0
    }

    /// Expand to a 256-bit target
    pub fn decode(self) -> DecodedTarget {
        let size = self.0 >> 24;
        let mut word = self.0 & MANTISSA_MASK;
        if size <= 3 {
            word >>= 8 * (3 - size);
        }

        // Both flags look at the mantissa left after the shift above.
        let negative = word != 0 && (self.0 & SIGN_BIT) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        let target = if overflow || word == 0 {
            U256::zero()
        } else if size <= 3 {
            U256::from(word)
        } else {
            U256::from(word) << ((8 * (size - 3)) as usize)
        };

        DecodedTarget {
            target,
            negative,
            overflow,
        }
    }

    /// Expand to a usable target, rejecting zero and overflowing encodings
    ///
    /// The sign bit is ignored here: a set sign bit still yields the
    /// magnitude of the mantissa.
    pub fn to_target(self) -> Result<U256> {
        let decoded = self.decode();
        if decoded.overflow || decoded.target.is_zero() {
            return Err(Error::InvalidCompactBits(self.0));
        }
        Ok(decoded.target)
    }

    /// Compress a 256-bit target, rounding toward zero
    pub fn from_target(target: U256) -> Self {
        let mut size = ((target.bits() + 7) / 8) as u32;
        let mut compact = if size <= 3 {
            (target.low_u64() << (8 * (3 - size))) as u32
        } else {
            (target >> ((8 * (size - 3)) as usize)).low_u64() as u32
        };

        // Keep the sign bit clear by moving one byte into the exponent.
        if compact & SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        Self(compact | (size << 24))
    }
}

impl fmt::Debug for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactTarget({:#010x})", self.0)
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Whether `hash` satisfies `bits` under a network's proof-of-work limit
///
/// Fails for negative, zero or overflowing encodings and for targets easier
/// than `pow_limit`.
pub fn check_proof_of_work(hash: &Hash256, bits: u32, pow_limit: U256) -> bool {
    let decoded = CompactTarget::from_consensus(bits).decode();
    if decoded.negative || decoded.overflow || decoded.target.is_zero() {
        return false;
    }
    if decoded.target > pow_limit {
        return false;
    }
    hash.to_u256() <= decoded.target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(hex: &str) -> U256 {
        U256::from_str_radix(hex, 16).unwrap()
    }

    #[test]
    fn test_decode_main_bits() {
        let target = CompactTarget::from_consensus(0x1f00ffff).to_target().unwrap();
        assert_eq!(target, U256::from(0xffffu64) << 224);
    }

    #[test]
    fn test_decode_regtest_bits() {
        let target = CompactTarget::from_consensus(0x207fffff).to_target().unwrap();
        assert_eq!(target, U256::from(0x7fffffu64) << 232);
    }

    #[test]
    fn test_decode_small_exponents() {
        assert_eq!(
            CompactTarget::from_consensus(0x0112_3456).decode().target,
            U256::from(0x12u64)
        );
        assert_eq!(
            CompactTarget::from_consensus(0x0212_3456).decode().target,
            U256::from(0x1234u64)
        );
        assert_eq!(
            CompactTarget::from_consensus(0x0312_3456).decode().target,
            U256::from(0x12_3456u64)
        );
        assert_eq!(
            CompactTarget::from_consensus(0x0412_3456).decode().target,
            U256::from(0x1234_5600u64)
        );
    }

    #[test]
    fn test_sign_bit_is_reported_but_ignored() {
        let decoded = CompactTarget::from_consensus(0x0492_3456).decode();
        assert!(decoded.negative);
        assert_eq!(decoded.target, U256::from(0x1234_5600u64));
        assert_eq!(
            CompactTarget::from_consensus(0x0492_3456).to_target().unwrap(),
            U256::from(0x1234_5600u64)
        );
    }

    #[test]
    fn test_sign_bit_on_shifted_out_mantissa() {
        let decoded = CompactTarget::from_consensus(0x0180_3456).decode();
        assert!(!decoded.negative);
        assert!(!decoded.overflow);
        assert!(decoded.target.is_zero());

        let decoded = CompactTarget::from_consensus(0x0280_3456).decode();
        assert!(decoded.negative);
        assert_eq!(decoded.target, U256::from(0x34u64));
    }

    #[test]
    fn test_overflow_and_zero_are_rejected() {
        let decoded = CompactTarget::from_consensus(0xff12_3456).decode();
        assert!(decoded.overflow);
        assert!(CompactTarget::from_consensus(0xff12_3456).to_target().is_err());
        assert!(CompactTarget::from_consensus(0x0100_0000).to_target().is_err());
    }

    #[test]
    fn test_from_target_matches_network_bits() {
        let main_limit = limit("0000ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
        assert_eq!(CompactTarget::from_target(main_limit).to_consensus(), 0x1f00ffff);

        let regtest_limit =
            limit("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
        assert_eq!(CompactTarget::from_target(regtest_limit).to_consensus(), 0x207fffff);

        assert_eq!(CompactTarget::from_target(U256::from(0x12u64)).to_consensus(), 0x0112_0000);
        assert_eq!(CompactTarget::from_target(U256::from(0x80u64)).to_consensus(), 0x0200_8000);
    }

    #[test]
    fn test_check_proof_of_work_bounds() {
        let main_limit = limit("0000ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
        let good: Hash256 = "0000b21284e2a7a29d1320a6007977c67044e3c4f5bbef132f19f2095187d3c9"
            .parse()
            .unwrap();
        let bad: Hash256 = "0843c2f4603770b9a0612a5367a9196d449ce9b0423484ad9e93796c97606a0e"
            .parse()
            .unwrap();

        assert!(check_proof_of_work(&good, 0x1f00ffff, main_limit));
        assert!(!check_proof_of_work(&bad, 0x1f00ffff, main_limit));
        // Regtest bits are easier than the main limit allows.
        assert!(!check_proof_of_work(&good, 0x207fffff, main_limit));
        // Negative encodings never pass.
        assert!(!check_proof_of_work(&good, 0x1f80ffff, main_limit));
    }
}
