//! Genesis block construction
//!
//! The genesis block holds a single coinbase transaction whose input script
//! carries a fixed number, a fixed script number and a human-readable
//! message. The script is never executed; it only makes the transaction
//! unique and the message auditable.

use crate::hash::Hash256;
use crate::primitives::{Block, BlockHeader, OutPoint, Transaction, TxIn, TxOut};
use crate::script::{Script, OP_CHECKSIG};
use crate::{Amount, Result, COIN};
use serde::Serialize;

/// Message embedded in every network's genesis coinbase
pub const GENESIS_MESSAGE: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

/// Uncompressed public key paid by the genesis coinbase
pub const GENESIS_OUTPUT_PUBKEY: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

/// First number pushed by the coinbase input script
pub const COINBASE_SCRIPT_BITS: i64 = 486_604_799;

/// Script number pushed after [`COINBASE_SCRIPT_BITS`]
pub const COINBASE_SCRIPT_EXTRA: i64 = 4;

/// Reward paid by every network's genesis coinbase
pub const GENESIS_REWARD: Amount = 50 * COIN;

/// Inputs of a genesis block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenesisSpec {
    /// Message carried by the coinbase input
    pub message: Vec<u8>,
    /// Script paid by the coinbase output
    pub output_script: Script,
    /// Coinbase output value
    pub reward: Amount,
    /// Block and coinbase timestamp
    pub time: u32,
    /// Header nonce
    pub nonce: u32,
    /// Compact difficulty bits
    pub bits: u32,
    /// Block version
    pub version: i32,
}

impl GenesisSpec {
    /// Standard message and output script with the given header fields
    pub fn standard(
        time: u32,
        nonce: u32,
        bits: u32,
        version: i32,
        reward: Amount,
    ) -> Result<Self> {
        Ok(Self {
            message: GENESIS_MESSAGE.as_bytes().to_vec(),
            output_script: genesis_output_script()?,
            reward,
            time,
            nonce,
            bits,
            version,
        })
    }

    /// Build the block
    pub fn build(&self) -> Block {
        create_genesis_block(
            &self.message,
            &self.output_script,
            self.time,
            self.nonce,
            self.bits,
            self.version,
            self.reward,
        )
    }
}

/// Pay-to-pubkey script for [`GENESIS_OUTPUT_PUBKEY`]
pub fn genesis_output_script() -> Result<Script> {
    let pubkey = hex::decode(GENESIS_OUTPUT_PUBKEY)
        .map_err(|e| crate::Error::InvalidConfig(format!("genesis output key: {}", e)))?;
    Ok(Script::builder()
        .push_slice(&pubkey)
        .push_opcode(OP_CHECKSIG)
        .into_script())
}

/// Coinbase input script: `<486604799> <4> <message>`
pub fn coinbase_script(message: &[u8]) -> Script {
    Script::builder()
        .push_int(COINBASE_SCRIPT_BITS)
        .push_script_num(COINBASE_SCRIPT_EXTRA)
        .push_slice(message)
        .into_script()
}

/// Build a genesis block from fixed inputs
///
/// The result depends only on the arguments: the same inputs always produce
/// the same block and hash.
pub fn create_genesis_block(
    message: &[u8],
    output_script: &Script,
    time: u32,
    nonce: u32,
    bits: u32,
    version: i32,
    reward: Amount,
) -> Block {
    let coinbase = Transaction {
        version: 1,
        inputs: vec![TxIn {
            prevout: OutPoint::NULL,
            script_sig: coinbase_script(message),
            sequence: u32::MAX,
        }],
        outputs: vec![TxOut {
            value: reward,
            script_pubkey: output_script.clone(),
        }],
        lock_time: 0,
        time,
    };

    // One transaction: the merkle root is its id.
    let merkle_root = coinbase.txid();

    Block {
        header: BlockHeader {
            version,
            prev_blockhash: Hash256::ZERO,
            merkle_root,
            time,
            bits,
            nonce,
        },
        transactions: vec![coinbase],
    }
}
