//! Proof-of-work search for genesis blocks
//!
//! An offline tool: given a candidate genesis block it looks for a nonce (and,
//! if the nonce space runs out, a later time) whose header hash is at or below
//! the target encoded in the header's bits. The values it finds are pasted
//! into the network definitions; nothing on the validation path calls it.
//!
//! Only header fields change. The coinbase keeps its original timestamp, so
//! the merkle root stays valid when the block time is bumped.

use crate::hash::{sha256d, Hash256};
use crate::pow::CompactTarget;
use crate::primitives::{Block, BlockHeader};
use crate::{Error, Result};
use parking_lot::Mutex;
use primitive_types::U256;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Hashes between checks of the cancellation flag and attempt counters
const CHECK_INTERVAL: u64 = 1024;

const NONCE_SPACE: u64 = 1 << 32;

/// Search tuning
#[derive(Debug, Clone)]
pub struct MinerOptions {
    /// Worker threads; 1 runs the plain sequential search
    pub threads: usize,
    /// Give up after this many hashes
    pub max_attempts: Option<u64>,
    /// Stop as soon as this flag is raised
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for MinerOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            max_attempts: None,
            cancel: None,
        }
    }
}

/// A header assignment meeting the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    /// Winning nonce
    pub nonce: u32,
    /// Block time at which the nonce was found
    pub time: u32,
    /// Resulting block hash
    pub hash: Hash256,
    /// Hashes computed
    pub attempts: u64,
    /// Wall-clock search time
    pub elapsed: Duration,
}

impl Solution {
    /// Hashes per second
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

/// Brute-force genesis nonce search
#[derive(Debug)]
pub struct GenesisMiner {
    pow_limit: U256,
    options: MinerOptions,
    attempts: Arc<AtomicU64>,
}

impl GenesisMiner {
    /// Sequential miner bounded by a proof-of-work limit
    pub fn new(pow_limit: U256) -> Self {
        Self::with_options(pow_limit, MinerOptions::default())
    }

    /// Miner with explicit options
    pub fn with_options(pow_limit: U256, options: MinerOptions) -> Self {
        Self {
            pow_limit,
            options,
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Running hash count, for progress reporting from another thread
    pub fn attempts_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.attempts)
    }

    /// Target for `bits`, checked against the proof-of-work limit
    pub fn target_for(&self, bits: u32) -> Result<U256> {
        let target = CompactTarget::from_consensus(bits).to_target()?;
        if target > self.pow_limit {
            return Err(Error::TargetAboveLimit { bits });
        }
        Ok(target)
    }

    /// Search from the block's current nonce and time
    ///
    /// On success the winning nonce and time are written into the header.
    #[tracing::instrument(skip(self, block), fields(threads = self.options.threads))]
    pub fn solve(&self, block: &mut Block) -> Result<Solution> {
        let target = self.target_for(block.header.bits)?;
        info!(
            "Mining for target {:#x} from nonce {} time {}",
            target, block.header.nonce, block.header.time
        );

        self.attempts.store(0, Ordering::Relaxed);
        let started = Instant::now();
        let (nonce, time, hash) = if self.options.threads <= 1 {
            self.search_sequential(&block.header, target)?
        } else {
            self.search_parallel(&block.header, target)?
        };

        block.header.nonce = nonce;
        block.header.time = time;

        let solution = Solution {
            nonce,
            time,
            hash,
            attempts: self.attempts.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        };
        info!(
            "Found nonce {} time {} hash {} after {} attempts",
            nonce, time, hash, solution.attempts
        );
        Ok(solution)
    }

    fn cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn search_sequential(&self, header: &BlockHeader, target: U256) -> Result<(u32, u32, Hash256)> {
        let mut buf = header.serialize();
        let mut nonce = header.nonce;
        let mut time = header.time;
        let mut attempts = 0u64;

        loop {
            if let Some(max) = self.options.max_attempts {
                if attempts >= max {
                    self.attempts.store(attempts, Ordering::Relaxed);
                    return Err(Error::SearchExhausted(attempts));
                }
            }
            if attempts % CHECK_INTERVAL == 0 {
                self.attempts.store(attempts, Ordering::Relaxed);
                if self.cancelled() {
                    return Err(Error::SearchCancelled(attempts));
                }
            }

            write_nonce_time(&mut buf, nonce, time);
            let hash = sha256d(&buf);
            attempts += 1;

            if hash.to_u256() <= target {
                self.attempts.store(attempts, Ordering::Relaxed);
                return Ok((nonce, time, hash));
            }

            nonce = nonce.wrapping_add(1);
            if nonce == 0 {
                time = time.wrapping_add(1);
                info!("Nonce wrapped, incrementing time to {}", time);
            }
        }
    }

    /// Split each time value's nonce range into contiguous chunks, one per worker
    fn search_parallel(&self, header: &BlockHeader, target: U256) -> Result<(u32, u32, Hash256)> {
        let threads = self.options.threads as u64;
        let mut time = header.time;
        let mut start = header.nonce as u64;

        loop {
            let found: Mutex<Option<(u32, Hash256)>> = Mutex::new(None);
            let stop = AtomicBool::new(false);
            let chunk = (NONCE_SPACE - start).div_ceil(threads);
            debug!("Searching time {} nonces {}.. in chunks of {}", time, start, chunk);

            std::thread::scope(|scope| {
                for worker in 0..threads {
                    let lo = start + worker * chunk;
                    let hi = (lo + chunk).min(NONCE_SPACE);
                    if lo >= hi {
                        continue;
                    }
                    let found = &found;
                    let stop = &stop;
                    scope.spawn(move || {
                        self.search_range(header, target, time, lo, hi, found, stop)
                    });
                }
            });

            if let Some((nonce, hash)) = found.into_inner() {
                return Ok((nonce, time, hash));
            }

            let attempts = self.attempts.load(Ordering::Relaxed);
            if self.cancelled() {
                return Err(Error::SearchCancelled(attempts));
            }
            if let Some(max) = self.options.max_attempts {
                if attempts >= max {
                    return Err(Error::SearchExhausted(attempts));
                }
            }

            time = time.wrapping_add(1);
            start = 0;
            info!("Nonce wrapped, incrementing time to {}", time);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search_range(
        &self,
        header: &BlockHeader,
        target: U256,
        time: u32,
        lo: u64,
        hi: u64,
        found: &Mutex<Option<(u32, Hash256)>>,
        stop: &AtomicBool,
    ) {
        let mut buf = header.serialize();
        let mut pending = 0u64;

        for n in lo..hi {
            if pending == CHECK_INTERVAL {
                let total = self.attempts.fetch_add(pending, Ordering::Relaxed) + pending;
                pending = 0;
                let exhausted = self.options.max_attempts.is_some_and(|max| total >= max);
                if exhausted || self.cancelled() {
                    stop.store(true, Ordering::Relaxed);
                }
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }

            let nonce = n as u32;
            write_nonce_time(&mut buf, nonce, time);
            let hash = sha256d(&buf);
            pending += 1;

            if hash.to_u256() <= target {
                let mut slot = found.lock();
                if slot.is_none() {
                    *slot = Some((nonce, hash));
                }
                stop.store(true, Ordering::Relaxed);
                break;
            }
        }

        self.attempts.fetch_add(pending, Ordering::Relaxed);
    }
}

fn write_nonce_time(buf: &mut [u8; crate::primitives::HEADER_SIZE], nonce: u32, time: u32) {
    let time_at = BlockHeader::TIME_OFFSET;
    let nonce_at = BlockHeader::NONCE_OFFSET;
    buf[time_at..time_at + 4].copy_from_slice(&time.to_le_bytes());
    buf[nonce_at..nonce_at + 4].copy_from_slice(&nonce.to_le_bytes());
}
