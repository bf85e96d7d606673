//! Blockchain checkpoints

use crate::hash::Hash256;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Checkpoints plus the chain statistics recorded alongside the last one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointData {
    checkpoints: BTreeMap<u32, Hash256>,
    /// Timestamp (Unix epoch) of the last checkpoint block
    pub last_checkpoint_time: i64,
    /// Transactions between genesis and the last checkpoint
    pub total_transactions: u64,
    /// Estimated transactions per day after the last checkpoint
    pub transactions_per_day: f64,
}

impl CheckpointData {
    /// Table holding only the genesis entry, with zeroed statistics
    pub fn genesis_only(genesis_hash: Hash256) -> Self {
        Self::new([(0, genesis_hash)], 0, 0, 0.0)
    }

    /// Create a checkpoint table
    pub fn new(
        checkpoints: impl IntoIterator<Item = (u32, Hash256)>,
        last_checkpoint_time: i64,
        total_transactions: u64,
        transactions_per_day: f64,
    ) -> Self {
        Self {
            checkpoints: checkpoints.into_iter().collect(),
            last_checkpoint_time,
            total_transactions,
            transactions_per_day,
        }
    }

    /// Check that the table starts at the given genesis hash
    ///
    /// Heights are kept sorted and unique by construction.
    pub fn validate(&self, genesis_hash: &Hash256) -> Result<()> {
        match self.checkpoints.get(&0) {
            Some(hash) if hash == genesis_hash => Ok(()),
            Some(hash) => Err(Error::InvalidCheckpoints(format!(
                "height 0 is {} but genesis is {}",
                hash, genesis_hash
            ))),
            None => Err(Error::InvalidCheckpoints("missing height 0".to_string())),
        }
    }

    /// Hash recorded at exactly `height`
    pub fn get(&self, height: u32) -> Option<&Hash256> {
        self.checkpoints.get(&height)
    }

    /// Whether a block at `height` agrees with the table
    ///
    /// Heights without a checkpoint always agree.
    pub fn check_block(&self, height: u32, hash: &Hash256) -> bool {
        self.checkpoints
            .get(&height)
            .map_or(true, |expected| expected == hash)
    }

    /// Get checkpoint at or before given height
    pub fn checkpoint_at_height(&self, height: u32) -> Result<(u32, &Hash256)> {
        self.checkpoints
            .range(..=height)
            .next_back()
            .map(|(h, hash)| (*h, hash))
            .ok_or(Error::CheckpointNotFound(height))
    }

    /// Iterate checkpoints in increasing height order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Hash256)> {
        self.checkpoints.iter().map(|(h, hash)| (*h, hash))
    }

    /// Get latest checkpoint
    pub fn latest(&self) -> Option<(u32, &Hash256)> {
        self.checkpoints.iter().next_back().map(|(h, hash)| (*h, hash))
    }

    /// Get checkpoint count
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}
