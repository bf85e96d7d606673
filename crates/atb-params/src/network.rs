//! Network identities, address prefixes and seeds

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    /// Main network
    #[serde(rename = "main")]
    Main,
    /// Public test network
    #[serde(rename = "test")]
    Test,
    /// Regression test (local development)
    #[serde(rename = "regtest")]
    Regtest,
}

impl NetworkType {
    /// Every network, in registry order
    pub const ALL: [NetworkType; 3] = [NetworkType::Main, NetworkType::Test, NetworkType::Regtest];

    /// Name used on the command line and in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            NetworkType::Main => "main",
            NetworkType::Test => "test",
            NetworkType::Regtest => "regtest",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "main" => Ok(NetworkType::Main),
            "test" => Ok(NetworkType::Test),
            "regtest" => Ok(NetworkType::Regtest),
            other => Err(Error::InvalidNetwork(other.to_string())),
        }
    }
}

/// Kinds of base58-encoded data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Base58Type {
    /// Pay-to-pubkey-hash address
    PubkeyAddress,
    /// Pay-to-script-hash address
    ScriptAddress,
    /// Private key (WIF)
    SecretKey,
    /// BIP32 extended public key
    ExtPublicKey,
    /// BIP32 extended private key
    ExtSecretKey,
}

/// Version bytes prepended before base58 encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Base58Prefixes {
    /// Pay-to-pubkey-hash address prefix
    pub pubkey_address: Vec<u8>,
    /// Pay-to-script-hash address prefix
    pub script_address: Vec<u8>,
    /// Private key prefix
    pub secret_key: Vec<u8>,
    /// Extended public key prefix
    pub ext_public_key: Vec<u8>,
    /// Extended private key prefix
    pub ext_secret_key: Vec<u8>,
}

impl Base58Prefixes {
    /// Prefix for one kind
    pub fn get(&self, kind: Base58Type) -> &[u8] {
        match kind {
            Base58Type::PubkeyAddress => &self.pubkey_address,
            Base58Type::ScriptAddress => &self.script_address,
            Base58Type::SecretKey => &self.secret_key,
            Base58Type::ExtPublicKey => &self.ext_public_key,
            Base58Type::ExtSecretKey => &self.ext_secret_key,
        }
    }

    /// Base58Check encoding of `payload` under the prefix for `kind`
    pub fn encode_check(&self, kind: Base58Type, payload: &[u8]) -> String {
        let mut data = Vec::with_capacity(self.get(kind).len() + payload.len());
        data.extend_from_slice(self.get(kind));
        data.extend_from_slice(payload);
        bs58::encode(data).with_check().into_string()
    }
}

/// DNS seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsSeed {
    /// Display name
    pub name: String,
    /// Hostname queried for peer addresses
    pub host: String,
}

impl DnsSeed {
    /// Seed whose name and host are the same string
    pub fn new(host: &str) -> Self {
        Self {
            name: host.to_string(),
            host: host.to_string(),
        }
    }
}

/// Hard-coded peer address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixedSeed {
    /// IPv6 or IPv4-mapped address bytes
    pub addr: [u8; 16],
    /// TCP port
    pub port: u16,
}

impl FixedSeed {
    /// Socket address, unwrapping IPv4-mapped addresses
    pub fn to_socket_addr(&self) -> SocketAddr {
        let v6 = Ipv6Addr::from(self.addr);
        let ip = match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        };
        SocketAddr::new(ip, self.port)
    }
}
