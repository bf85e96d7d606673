//! Per-network chain parameters
//!
//! Each network is a plain data record built from literals. Building one also
//! rebuilds its genesis block and compares the hash and merkle root with the
//! values written next to the literals; a mismatch means the definition is
//! broken and is returned as a fatal error.

use crate::checkpoints::CheckpointData;
use crate::consensus::{ConsensusParams, Deployment};
use crate::genesis::{GenesisSpec, GENESIS_REWARD};
use crate::hash::Hash256;
use crate::network::{Base58Prefixes, DnsSeed, FixedSeed, NetworkType};
use crate::primitives::Block;
use crate::{Amount, Error, Result};
use primitive_types::U256;
use serde::Serialize;
use tracing::{debug, error, info};

/// Network message prefix shared by all three networks
pub const MESSAGE_START: [u8; 4] = [0x61, 0x74, 0x62, 0x63];

/// Timeout used by regtest deployments
const REGTEST_DEPLOYMENT_TIMEOUT: i64 = 999_999_999_999;

/// Parameters of one network
#[derive(Debug, Clone, Serialize)]
pub struct ChainParams {
    /// Which network these parameters describe
    pub network: NetworkType,
    /// Consensus rules
    pub consensus: ConsensusParams,
    /// Magic bytes prefixed to every peer message
    pub message_start: [u8; 4],
    /// Default peer-to-peer port
    pub default_port: u16,
    /// Blocks below this height are never pruned
    pub prune_after_height: u64,
    /// Genesis block
    pub genesis: Block,
    /// Base58 version bytes
    pub base58_prefixes: Base58Prefixes,
    /// DNS seeds
    pub dns_seeds: Vec<DnsSeed>,
    /// Hard-coded peer addresses
    pub fixed_seeds: Vec<FixedSeed>,
    /// Checkpoints
    pub checkpoints: CheckpointData,
    /// Mining needs connected peers
    pub mining_requires_peers: bool,
    /// Run expensive consistency checks by default
    pub default_consistency_checks: bool,
    /// Relay only standard transactions
    pub require_standard: bool,
    /// Blocks may be generated on request (regtest)
    pub mine_blocks_on_demand: bool,
    /// Report the legacy `testnet` field in RPC results
    pub testnet_to_be_deprecated_field_rpc: bool,
    /// Last height at which proof-of-work blocks are accepted
    pub last_pow_block: u32,
}

/// Genesis literals and their expected results
struct GenesisDefinition {
    time: u32,
    nonce: u32,
    bits: u32,
    version: i32,
    reward: Amount,
    hash: &'static str,
    merkle_root: &'static str,
}

const GENESIS_TIME: u32 = 1495548862;
const GENESIS_MERKLE_ROOT: &str =
    "8b84fb784ad17de6c112871615c9a9c93c87cc645ee9de490524f6986700b163";

const POW_LIMIT: &str = "0000ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
const REGTEST_POW_LIMIT: &str = "7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

const MAIN_GENESIS: GenesisDefinition = GenesisDefinition {
    time: GENESIS_TIME,
    nonce: 158_421_284,
    bits: 0x1f00ffff,
    version: 1,
    reward: GENESIS_REWARD,
    hash: "0000b21284e2a7a29d1320a6007977c67044e3c4f5bbef132f19f2095187d3c9",
    merkle_root: GENESIS_MERKLE_ROOT,
};

const TEST_GENESIS: GenesisDefinition = GenesisDefinition {
    time: GENESIS_TIME,
    nonce: 194_097,
    bits: 0x1f00ffff,
    version: 1,
    reward: GENESIS_REWARD,
    hash: "00002378030638c4563c434e4fb29e298240325fc49101d00b3c549ca7266375",
    merkle_root: GENESIS_MERKLE_ROOT,
};

const REGTEST_GENESIS: GenesisDefinition = GenesisDefinition {
    time: GENESIS_TIME,
    nonce: 1,
    bits: 0x207fffff,
    version: 1,
    reward: GENESIS_REWARD,
    hash: "0843c2f4603770b9a0612a5367a9196d449ce9b0423484ad9e93796c97606a0e",
    merkle_root: GENESIS_MERKLE_ROOT,
};

fn parse_limit(hex: &str) -> Result<U256> {
    U256::from_str_radix(hex, 16).map_err(|e| Error::InvalidHash(format!("{}: {:?}", hex, e)))
}

/// Build the genesis block and compare it with the expected hash and merkle root
fn build_genesis(network: NetworkType, def: &GenesisDefinition) -> Result<Block> {
    let block =
        GenesisSpec::standard(def.time, def.nonce, def.bits, def.version, def.reward)?.build();

    let expected_hash: Hash256 = def.hash.parse()?;
    let computed_hash = block.hash();
    if computed_hash != expected_hash {
        error!(
            "Genesis hash mismatch on {}: expected {}, computed {}",
            network, expected_hash, computed_hash
        );
        return Err(Error::GenesisMismatch {
            network,
            field: "hash",
            expected: expected_hash,
            computed: computed_hash,
        });
    }

    let expected_merkle: Hash256 = def.merkle_root.parse()?;
    if block.header.merkle_root != expected_merkle {
        error!(
            "Genesis merkle root mismatch on {}: expected {}, computed {}",
            network, expected_merkle, block.header.merkle_root
        );
        return Err(Error::GenesisMismatch {
            network,
            field: "merkle root",
            expected: expected_merkle,
            computed: block.header.merkle_root,
        });
    }

    debug!(
        "Genesis for {} verified: hash {} merkle {}",
        network, computed_hash, block.header.merkle_root
    );
    Ok(block)
}

fn main_base58() -> Base58Prefixes {
    Base58Prefixes {
        pubkey_address: vec![0],
        script_address: vec![5],
        secret_key: vec![128],
        ext_public_key: vec![0x04, 0x88, 0xB2, 0x1E],
        ext_secret_key: vec![0x04, 0x88, 0xAD, 0xE4],
    }
}

fn test_base58() -> Base58Prefixes {
    Base58Prefixes {
        pubkey_address: vec![111],
        script_address: vec![196],
        secret_key: vec![239],
        ext_public_key: vec![0x04, 0x35, 0x87, 0xCF],
        ext_secret_key: vec![0x04, 0x35, 0x83, 0x94],
    }
}

// Start times are the literal 0 (signal from genesis), not calendar dates.
fn deployments(timeout: i64) -> [Deployment; 3] {
    [
        Deployment {
            bit: 28,
            start_time: 0,
            timeout,
        },
        Deployment {
            bit: 0,
            start_time: 0,
            timeout,
        },
        Deployment {
            bit: 1,
            start_time: 0,
            timeout,
        },
    ]
}

impl ChainParams {
    /// Get mainnet parameters
    pub fn mainnet() -> Result<Self> {
        let network = NetworkType::Main;
        let genesis = build_genesis(network, &MAIN_GENESIS)?;
        let genesis_hash = genesis.hash();

        let consensus = ConsensusParams {
            subsidy_halving_interval: 420_480,
            majority_enforce_block_upgrade: 750,
            majority_reject_block_outdated: 950,
            majority_window: 1000,
            bip34_height: Some(227_931),
            bip34_hash: "0000b21284e2a7a29d1320a6007977c67044e3c4f5bbef132f19f2095187d3c9".parse()?,
            pow_averaging_window: 17,
            pow_max_adjust_down: 32,
            pow_max_adjust_up: 16,
            pow_limit: parse_limit(POW_LIMIT)?,
            pos_limit: parse_limit(POW_LIMIT)?,
            target_timespan: 150,
            target_spacing: 150,
            pow_allow_min_difficulty_blocks: false,
            pow_no_retargeting: false,
            rule_change_activation_threshold: 14, // 95% of 15
            miner_confirmation_window: 15,
            deployments: deployments(0),
            genesis_hash,
            genesis_merkle_root: genesis.header.merkle_root,
        };

        Self {
            network,
            consensus,
            message_start: MESSAGE_START,
            default_port: 15442,
            prune_after_height: 100_000,
            genesis,
            base58_prefixes: main_base58(),
            dns_seeds: vec![
                DnsSeed::new("n1.aitibicoin.com"),
                DnsSeed::new("n2.aitibicoin.com"),
                DnsSeed::new("n3.aitibicoin.com"),
            ],
            fixed_seeds: Vec::new(),
            checkpoints: CheckpointData::genesis_only(genesis_hash),
            mining_requires_peers: true,
            default_consistency_checks: false,
            require_standard: true,
            mine_blocks_on_demand: false,
            testnet_to_be_deprecated_field_rpc: false,
            last_pow_block: 1001,
        }
        .checked()
    }

    /// Get testnet parameters
    pub fn testnet() -> Result<Self> {
        let network = NetworkType::Test;
        let genesis = build_genesis(network, &TEST_GENESIS)?;
        let genesis_hash = genesis.hash();

        let consensus = ConsensusParams {
            subsidy_halving_interval: 0,
            majority_enforce_block_upgrade: 51,
            majority_reject_block_outdated: 75,
            majority_window: 100,
            bip34_height: Some(21_111),
            bip34_hash: "00002378030638c4563c434e4fb29e298240325fc49101d00b3c549ca7266375".parse()?,
            pow_averaging_window: 17,
            pow_max_adjust_down: 32,
            pow_max_adjust_up: 16,
            pow_limit: parse_limit(POW_LIMIT)?,
            pos_limit: parse_limit(POW_LIMIT)?,
            target_timespan: 16 * 60,
            target_spacing: 64,
            pow_allow_min_difficulty_blocks: true,
            pow_no_retargeting: false,
            rule_change_activation_threshold: 11, // 75% for testchains
            miner_confirmation_window: 15,
            deployments: deployments(0),
            genesis_hash,
            genesis_merkle_root: genesis.header.merkle_root,
        };

        Self {
            network,
            consensus,
            message_start: MESSAGE_START,
            default_port: 25443,
            prune_after_height: 1000,
            genesis,
            base58_prefixes: test_base58(),
            dns_seeds: vec![
                DnsSeed::new("78.46.248.224"),
                DnsSeed::new("n1.aitibicoin.com"),
                DnsSeed::new("n2.aitibicoin.com"),
                DnsSeed::new("n3.aitibicoin.com"),
            ],
            fixed_seeds: Vec::new(),
            checkpoints: CheckpointData::genesis_only(genesis_hash),
            mining_requires_peers: true,
            default_consistency_checks: false,
            require_standard: false,
            mine_blocks_on_demand: false,
            testnet_to_be_deprecated_field_rpc: true,
            last_pow_block: 50,
        }
        .checked()
    }

    /// Get regtest parameters
    pub fn regtest() -> Result<Self> {
        let network = NetworkType::Regtest;
        let genesis = build_genesis(network, &REGTEST_GENESIS)?;
        let genesis_hash = genesis.hash();

        let consensus = ConsensusParams {
            subsidy_halving_interval: 0,
            majority_enforce_block_upgrade: 750,
            majority_reject_block_outdated: 950,
            majority_window: 1000,
            // BIP34 has not necessarily activated on regtest
            bip34_height: None,
            bip34_hash: Hash256::ZERO,
            pow_averaging_window: 17,
            pow_max_adjust_down: 32,
            pow_max_adjust_up: 16,
            pow_limit: parse_limit(REGTEST_POW_LIMIT)?,
            pos_limit: parse_limit(REGTEST_POW_LIMIT)?,
            target_timespan: 16 * 60,
            target_spacing: 64,
            pow_allow_min_difficulty_blocks: true,
            pow_no_retargeting: true,
            rule_change_activation_threshold: 7,
            miner_confirmation_window: 10,
            deployments: deployments(REGTEST_DEPLOYMENT_TIMEOUT),
            genesis_hash,
            genesis_merkle_root: genesis.header.merkle_root,
        };

        Self {
            network,
            consensus,
            message_start: MESSAGE_START,
            default_port: 35442,
            prune_after_height: 1000,
            genesis,
            base58_prefixes: test_base58(),
            dns_seeds: Vec::new(),
            fixed_seeds: Vec::new(),
            checkpoints: CheckpointData::genesis_only(genesis_hash),
            mining_requires_peers: false,
            default_consistency_checks: true,
            require_standard: false,
            mine_blocks_on_demand: true,
            testnet_to_be_deprecated_field_rpc: false,
            last_pow_block: 0x7fff_ffff,
        }
        .checked()
    }

    /// Get parameters by network type
    pub fn from_network(network: NetworkType) -> Result<Self> {
        match network {
            NetworkType::Main => Self::mainnet(),
            NetworkType::Test => Self::testnet(),
            NetworkType::Regtest => Self::regtest(),
        }
    }

    /// Structural checks shared by every network
    fn checked(self) -> Result<Self> {
        self.consensus.validate_deployments()?;
        self.checkpoints.validate(&self.consensus.genesis_hash)?;
        info!(
            "Built {} chain parameters: genesis {} port {}",
            self.network, self.consensus.genesis_hash, self.default_port
        );
        Ok(self)
    }

    /// Network identifier string
    pub fn network_id(&self) -> &'static str {
        self.network.as_str()
    }

    /// Genesis block hash
    pub fn genesis_hash(&self) -> Hash256 {
        self.consensus.genesis_hash
    }

    /// Whether proof-of-work blocks are still accepted at `height`
    pub fn is_pow_allowed(&self, height: u32) -> bool {
        height <= self.last_pow_block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::check_proof_of_work;

    #[test]
    fn test_mainnet_params() {
        let params = ChainParams::mainnet().unwrap();
        assert_eq!(params.network_id(), "main");
        assert_eq!(params.default_port, 15442);
        assert_eq!(params.message_start, [0x61, 0x74, 0x62, 0x63]);
        assert_eq!(params.consensus.subsidy_halving_interval, 420_480);
        assert_eq!(params.consensus.target_spacing, 150);
        assert_eq!(params.dns_seeds.len(), 3);
        assert!(params.require_standard);
        assert!(params.is_pow_allowed(1001));
        assert!(!params.is_pow_allowed(1002));
    }

    #[test]
    fn test_testnet_params() {
        let params = ChainParams::testnet().unwrap();
        assert_eq!(params.network_id(), "test");
        assert_eq!(params.default_port, 25443);
        assert_eq!(params.consensus.target_timespan, 960);
        assert!(params.consensus.pow_allow_min_difficulty_blocks);
        assert!(params.testnet_to_be_deprecated_field_rpc);
        assert_eq!(params.dns_seeds[0].host, "78.46.248.224");
        assert_eq!(params.last_pow_block, 50);
    }

    #[test]
    fn test_regtest_params() {
        let params = ChainParams::regtest().unwrap();
        assert_eq!(params.network_id(), "regtest");
        assert_eq!(params.default_port, 35442);
        assert!(params.consensus.pow_no_retargeting);
        assert!(params.mine_blocks_on_demand);
        assert!(params.dns_seeds.is_empty());
        assert!(params.fixed_seeds.is_empty());
        assert_eq!(params.consensus.bip34_height, None);
        assert_eq!(params.consensus.miner_confirmation_window, 10);
        for deployment in &params.consensus.deployments {
            assert_eq!(deployment.start_time, 0);
            assert_eq!(deployment.timeout, 999_999_999_999);
        }
    }

    #[test]
    fn test_deployment_start_times_are_literal_zero() {
        for params in [ChainParams::mainnet().unwrap(), ChainParams::testnet().unwrap()] {
            for deployment in &params.consensus.deployments {
                assert_eq!(deployment.start_time, 0);
                assert_eq!(deployment.timeout, 0);
            }
        }
    }

    #[test]
    fn test_genesis_meets_own_pow_limit() {
        for network in NetworkType::ALL {
            let params = ChainParams::from_network(network).unwrap();
            assert!(check_proof_of_work(
                &params.genesis_hash(),
                params.genesis.header.bits,
                params.consensus.pow_limit
            ));
        }
    }

    #[test]
    fn test_mismatched_definition_is_fatal() {
        let broken = GenesisDefinition {
            nonce: 158_421_285,
            ..MAIN_GENESIS
        };
        let err = build_genesis(NetworkType::Main, &broken).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, Error::GenesisMismatch { field: "hash", .. }));
    }

    #[test]
    fn test_mismatched_merkle_root_is_fatal() {
        let broken = GenesisDefinition {
            merkle_root: "0000000000000000000000000000000000000000000000000000000000000001",
            ..MAIN_GENESIS
        };
        let err = build_genesis(NetworkType::Main, &broken).unwrap_err();
        assert!(matches!(err, Error::GenesisMismatch { field: "merkle root", .. }));
    }

    #[test]
    fn test_params_serialize_to_json() {
        let params = ChainParams::regtest().unwrap();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["network"], "regtest");
        assert_eq!(json["default_port"], 35442);
        assert_eq!(
            json["consensus"]["genesis_hash"],
            "0843c2f4603770b9a0612a5367a9196d449ce9b0423484ad9e93796c97606a0e"
        );
    }
}
