//! Consensus parameters

use crate::hash::Hash256;
use crate::{Amount, Error, Result, COIN};
use primitive_types::U256;
use serde::Serialize;
use std::collections::HashSet;

/// Highest version bit a deployment may use
pub const MAX_DEPLOYMENT_BIT: u8 = 28;

/// Subsidy paid at height zero
pub const INITIAL_SUBSIDY: Amount = 50 * COIN;

/// Named soft-fork deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPos {
    /// Reserved for testing the signalling machinery
    TestDummy,
    /// Relative lock-time (BIP68, BIP112, BIP113)
    Csv,
    /// Segregated witness (BIP141, BIP143)
    Segwit,
}

impl DeploymentPos {
    /// Every deployment, in table order
    pub const ALL: [DeploymentPos; 3] = [
        DeploymentPos::TestDummy,
        DeploymentPos::Csv,
        DeploymentPos::Segwit,
    ];

    /// Index into the deployment table
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Versionbits parameters of one deployment
///
/// A start time of zero means the deployment may signal from genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deployment {
    /// Version bit used for signalling
    pub bit: u8,
    /// Median time past at which signalling starts
    pub start_time: i64,
    /// Median time past after which the deployment fails
    pub timeout: i64,
}

/// Consensus parameters
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusParams {
    /// Blocks between subsidy halvings; zero means the subsidy never halves
    pub subsidy_halving_interval: u32,
    /// Upgraded blocks in the window needed to enforce new-version rules
    pub majority_enforce_block_upgrade: u32,
    /// Upgraded blocks in the window needed to reject outdated versions
    pub majority_reject_block_outdated: u32,
    /// Window for the two majority counts
    pub majority_window: u32,
    /// BIP34 activation height, if it ever activates
    pub bip34_height: Option<u32>,
    /// Expected block hash at the BIP34 height
    pub bip34_hash: Hash256,
    /// Blocks averaged by the difficulty adjustment
    pub pow_averaging_window: u32,
    /// Maximum downward adjustment, in percent
    pub pow_max_adjust_down: u32,
    /// Maximum upward adjustment, in percent
    pub pow_max_adjust_up: u32,
    /// Easiest allowed proof-of-work target
    pub pow_limit: U256,
    /// Easiest allowed proof-of-stake target
    pub pos_limit: U256,
    /// Target timespan in seconds
    pub target_timespan: u32,
    /// Target spacing between blocks in seconds
    pub target_spacing: u32,
    /// Minimum difficulty blocks may be mined after a long gap
    pub pow_allow_min_difficulty_blocks: bool,
    /// Difficulty never changes
    pub pow_no_retargeting: bool,
    /// Signalling blocks per window needed to lock in a deployment
    pub rule_change_activation_threshold: u32,
    /// Blocks per signalling window
    pub miner_confirmation_window: u32,
    /// Deployment table, indexed by [`DeploymentPos::index`]
    pub deployments: [Deployment; 3],
    /// Hash of the genesis block
    pub genesis_hash: Hash256,
    /// Merkle root of the genesis block
    pub genesis_merkle_root: Hash256,
}

impl ConsensusParams {
    /// Parameters of one deployment
    pub fn deployment(&self, pos: DeploymentPos) -> &Deployment {
        &self.deployments[pos.index()]
    }

    /// Check that every deployment bit is in range and used only once
    pub fn validate_deployments(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for deployment in &self.deployments {
            if deployment.bit > MAX_DEPLOYMENT_BIT || !seen.insert(deployment.bit) {
                return Err(Error::DuplicateDeploymentBit(deployment.bit));
            }
        }
        Ok(())
    }

    /// Blocks between difficulty adjustments
    pub fn difficulty_adjustment_interval(&self) -> u32 {
        self.target_timespan / self.target_spacing
    }

    /// Timespan covered by the averaging window
    pub fn averaging_window_timespan(&self) -> i64 {
        self.pow_averaging_window as i64 * self.target_spacing as i64
    }

    /// Shortest actual timespan the adjustment accepts
    pub fn min_actual_timespan(&self) -> i64 {
        self.averaging_window_timespan() * (100 - self.pow_max_adjust_up as i64) / 100
    }

    /// Longest actual timespan the adjustment accepts
    pub fn max_actual_timespan(&self) -> i64 {
        self.averaging_window_timespan() * (100 + self.pow_max_adjust_down as i64) / 100
    }

    /// Whether BIP34 rules apply at `height`
    pub fn is_bip34_active(&self, height: u32) -> bool {
        self.bip34_height.is_some_and(|activation| height >= activation)
    }

    /// Block subsidy at given height
    pub fn block_subsidy(&self, height: u32) -> Amount {
        if self.subsidy_halving_interval == 0 {
            return INITIAL_SUBSIDY;
        }

        let halvings = height / self.subsidy_halving_interval;
        if halvings >= 64 {
            return 0;
        }
        INITIAL_SUBSIDY >> halvings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConsensusParams {
        ConsensusParams {
            subsidy_halving_interval: 420_480,
            majority_enforce_block_upgrade: 750,
            majority_reject_block_outdated: 950,
            majority_window: 1000,
            bip34_height: Some(227_931),
            bip34_hash: Hash256::ZERO,
            pow_averaging_window: 17,
            pow_max_adjust_down: 32,
            pow_max_adjust_up: 16,
            pow_limit: U256::MAX >> 16,
            pos_limit: U256::MAX >> 16,
            target_timespan: 150,
            target_spacing: 150,
            pow_allow_min_difficulty_blocks: false,
            pow_no_retargeting: false,
            rule_change_activation_threshold: 14,
            miner_confirmation_window: 15,
            deployments: [
                Deployment {
                    bit: 28,
                    start_time: 0,
                    timeout: 0,
                },
                Deployment {
                    bit: 0,
                    start_time: 0,
                    timeout: 0,
                },
                Deployment {
                    bit: 1,
                    start_time: 0,
                    timeout: 0,
                },
            ],
            genesis_hash: Hash256::ZERO,
            genesis_merkle_root: Hash256::ZERO,
        }
    }

    #[test]
    fn test_block_subsidy() {
        let params = params();

        // Initial subsidy
        assert_eq!(params.block_subsidy(0), 50 * COIN);

        // After first halving
        assert_eq!(params.block_subsidy(420_480), 25 * COIN);

        // After second halving
        assert_eq!(params.block_subsidy(840_960), 1_250_000_000);

        assert_eq!(params.block_subsidy(420_480 * 64), 0);
    }

    #[test]
    fn test_zero_halving_interval_never_halves() {
        let params = ConsensusParams {
            subsidy_halving_interval: 0,
            ..params()
        };
        assert_eq!(params.block_subsidy(10_000_000), 50 * COIN);
    }

    #[test]
    fn test_timespan_bounds() {
        let params = params();
        assert_eq!(params.difficulty_adjustment_interval(), 1);
        assert_eq!(params.averaging_window_timespan(), 17 * 150);
        assert_eq!(params.min_actual_timespan(), 17 * 150 * 84 / 100);
        assert_eq!(params.max_actual_timespan(), 17 * 150 * 132 / 100);
    }

    #[test]
    fn test_deployment_bits() {
        let mut params = params();
        assert!(params.validate_deployments().is_ok());
        assert_eq!(params.deployment(DeploymentPos::TestDummy).bit, 28);
        assert_eq!(params.deployment(DeploymentPos::Segwit).bit, 1);

        params.deployments[DeploymentPos::Segwit.index()].bit = 0;
        assert!(matches!(
            params.validate_deployments(),
            Err(Error::DuplicateDeploymentBit(0))
        ));

        params.deployments[DeploymentPos::Segwit.index()].bit = 29;
        assert!(params.validate_deployments().is_err());
    }

    #[test]
    fn test_bip34_activation() {
        let mut params = params();
        assert!(!params.is_bip34_active(227_930));
        assert!(params.is_bip34_active(227_931));

        params.bip34_height = None;
        assert!(!params.is_bip34_active(u32::MAX));
    }
}
