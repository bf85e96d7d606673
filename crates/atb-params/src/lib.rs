//! Aitibicoin network parameters and genesis construction
//!
//! This crate defines the consensus rules, genesis blocks, seeds, checkpoints
//! and address prefixes of the main, test and regression-test networks, the
//! registry used to select one of them at startup, and the proof-of-work
//! search used to discover genesis nonces for new networks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chainparams;
pub mod checkpoints;
pub mod config;
pub mod consensus;
pub mod genesis;
pub mod hash;
pub mod miner;
pub mod network;
pub mod pow;
pub mod primitives;
pub mod registry;
pub mod script;

pub use chainparams::ChainParams;
pub use checkpoints::CheckpointData;
pub use config::ChainConfig;
pub use consensus::{ConsensusParams, Deployment, DeploymentPos};
pub use genesis::{create_genesis_block, GenesisSpec};
pub use hash::Hash256;
pub use miner::{GenesisMiner, MinerOptions, Solution};
pub use network::{Base58Prefixes, Base58Type, DnsSeed, FixedSeed, NetworkType};
pub use pow::{check_proof_of_work, CompactTarget, DecodedTarget};
pub use primitives::{Block, BlockHeader, OutPoint, Transaction, TxIn, TxOut};
pub use registry::ChainRegistry;
pub use script::Script;

/// Amounts are expressed in the smallest unit; one coin is 10^8 units.
pub type Amount = i64;

/// Number of base units in one coin.
pub const COIN: Amount = 100_000_000;

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown network name
    #[error("Unknown chain {0}")]
    InvalidNetwork(String),

    /// A built genesis block does not match the hard-coded definition
    #[error("Genesis {field} mismatch on {network}: expected {expected}, computed {computed}")]
    GenesisMismatch {
        /// Network whose definition failed
        network: NetworkType,
        /// Which genesis field differed
        field: &'static str,
        /// Hard-coded value
        expected: Hash256,
        /// Value produced by the genesis builder
        computed: Hash256,
    },

    /// Active parameters were requested before any network was selected
    #[error("No network has been selected")]
    NetworkNotSelected,

    /// Checkpoint not found
    #[error("No checkpoint found for height {0}")]
    CheckpointNotFound(u32),

    /// Checkpoint table is not strictly increasing or misses the genesis entry
    #[error("Invalid checkpoint table: {0}")]
    InvalidCheckpoints(String),

    /// Malformed 256-bit hash
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    /// Compact difficulty bits are negative, zero or overflow 256 bits
    #[error("Invalid compact bits {0:#010x}")]
    InvalidCompactBits(u32),

    /// Decoded target is easier than the network allows
    #[error("Target of bits {bits:#010x} exceeds the proof-of-work limit")]
    TargetAboveLimit {
        /// Offending compact bits
        bits: u32,
    },

    /// Two deployments claim the same version bit
    #[error("Deployment bit {0} is assigned more than once")]
    DuplicateDeploymentBit(u8),

    /// Proof-of-work search stopped by its cancellation flag
    #[error("Search cancelled after {0} attempts")]
    SearchCancelled(u64),

    /// Proof-of-work search hit its attempt ceiling
    #[error("Search exhausted after {0} attempts")]
    SearchExhausted(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error must abort startup rather than be reported and retried
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::GenesisMismatch { .. }
                | Error::NetworkNotSelected
                | Error::InvalidCheckpoints(_)
                | Error::DuplicateDeploymentBit(_)
        )
    }
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
