//! 256-bit hashes
//!
//! Hashes are stored in the byte order produced by SHA-256 and shown, parsed
//! and serialized in reversed order, the way block explorers and node RPCs
//! print block and transaction ids.

use crate::{Error, Result};
use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 256-bit hash in internal (little-endian) byte order
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The null hash
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Wrap raw bytes in internal byte order
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes in internal byte order
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether every byte is zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Interpret the hash as an unsigned 256-bit integer
    pub fn to_u256(&self) -> U256 {
        U256::from_little_endian(&self.0)
    }

    /// Build a hash from an unsigned 256-bit integer
    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_little_endian(&mut bytes);
        Self(bytes)
    }
}

/// Double SHA-256
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    Hash256(second.into())
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

impl FromStr for Hash256 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 64 {
            return Err(Error::InvalidHash(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::InvalidHash(e.to_string()))?;
        bytes.reverse();
        Ok(Self(bytes))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_GENESIS: &str = "0000b21284e2a7a29d1320a6007977c67044e3c4f5bbef132f19f2095187d3c9";

    #[test]
    fn test_display_round_trips_reversed_hex() {
        let hash: Hash256 = MAIN_GENESIS.parse().unwrap();
        assert_eq!(hash.to_string(), MAIN_GENESIS);
        // Internal order is reversed: leading zeros of the display are the last bytes.
        assert_eq!(hash.as_bytes()[31], 0x00);
        assert_eq!(hash.as_bytes()[0], 0xc9);
    }

    #[test]
    fn test_to_u256_uses_display_order() {
        let hash: Hash256 = MAIN_GENESIS.parse().unwrap();
        let expected = U256::from_str_radix(MAIN_GENESIS, 16).unwrap();
        assert_eq!(hash.to_u256(), expected);
        assert_eq!(Hash256::from_u256(expected), hash);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("1234".parse::<Hash256>().is_err());
        assert!("zz".repeat(32).parse::<Hash256>().is_err());
    }

    #[test]
    fn test_sha256d_empty() {
        assert_eq!(
            sha256d(b"").to_string(),
            "56944c5d3f98413ef45cf54545538103cc9f298e0575820ad3591376e2e0f65d"
        );
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let hash: Hash256 = MAIN_GENESIS.parse().unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", MAIN_GENESIS));
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
