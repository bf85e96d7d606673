//! Transactions, headers and blocks in their consensus encoding
//!
//! Transactions on this chain carry a 32-bit timestamp after the lock time.
//! The genesis coinbase sets it to the block time, and it is part of the
//! transaction id, so it is also part of the genesis merkle root.

use crate::hash::{sha256d, Hash256};
use crate::script::Script;
use crate::Amount;
use serde::Serialize;

/// Size of a serialized block header
pub const HEADER_SIZE: usize = 80;

/// Append a variable-length integer (CompactSize)
pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_script(out: &mut Vec<u8>, script: &Script) {
    write_compact_size(out, script.len() as u64);
    out.extend_from_slice(script.as_bytes());
}

/// Reference to a previous transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutPoint {
    /// Previous transaction id
    pub txid: Hash256,
    /// Output index
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint used by coinbase inputs
    pub const NULL: OutPoint = OutPoint {
        txid: Hash256::ZERO,
        vout: u32::MAX,
    };

    /// Whether this is the coinbase null reference
    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxIn {
    /// Spent output
    pub prevout: OutPoint,
    /// Unlocking script
    pub script_sig: Script,
    /// Sequence number
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOut {
    /// Amount in base units
    pub value: Amount,
    /// Locking script
    pub script_pubkey: Script,
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Transaction format version
    pub version: i32,
    /// Inputs
    pub inputs: Vec<TxIn>,
    /// Outputs
    pub outputs: Vec<TxOut>,
    /// Lock time
    pub lock_time: u32,
    /// Transaction timestamp
    pub time: u32,
}

impl Transaction {
    /// Whether the transaction has the single null-input shape of a coinbase
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Consensus encoding
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        out.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(input.prevout.txid.as_bytes());
            out.extend_from_slice(&input.prevout.vout.to_le_bytes());
            write_script(&mut out, &input.script_sig);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_script(&mut out, &output.script_pubkey);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out.extend_from_slice(&self.time.to_le_bytes());
        out
    }

    /// Transaction id
    pub fn txid(&self) -> Hash256 {
        sha256d(&self.serialize())
    }
}

/// Block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    /// Block version
    pub version: i32,
    /// Parent block hash
    pub prev_blockhash: Hash256,
    /// Merkle root of the block's transactions
    pub merkle_root: Hash256,
    /// Block timestamp
    pub time: u32,
    /// Compact difficulty target
    pub bits: u32,
    /// Proof-of-work nonce
    pub nonce: u32,
}

impl BlockHeader {
    /// Offset of the time field in the serialized header
    pub const TIME_OFFSET: usize = 68;
    /// Offset of the nonce field in the serialized header
    pub const NONCE_OFFSET: usize = 76;

    /// Consensus encoding
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev_blockhash.as_bytes());
        out[36..68].copy_from_slice(self.merkle_root.as_bytes());
        out[Self::TIME_OFFSET..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[Self::NONCE_OFFSET..HEADER_SIZE].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Block hash
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.serialize())
    }
}

/// Block: header plus transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Header
    pub header: BlockHeader,
    /// Transactions, coinbase first
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Block hash
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    /// Merkle root recomputed from the transactions
    pub fn compute_merkle_root(&self) -> Hash256 {
        let txids: Vec<Hash256> = self.transactions.iter().map(Transaction::txid).collect();
        merkle_root(&txids)
    }

    /// Consensus encoding: header, transaction count, transactions
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + 256 * self.transactions.len());
        out.extend_from_slice(&self.header.serialize());
        write_compact_size(&mut out, self.transactions.len() as u64);
        for tx in &self.transactions {
            out.extend_from_slice(&tx.serialize());
        }
        out
    }
}

/// Merkle root over leaf hashes
///
/// Each level pairs adjacent hashes and double-hashes their concatenation;
/// an odd last hash is paired with itself. A single leaf is its own root and
/// an empty list yields the null hash.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::ZERO;
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                let mut buf = [0u8; 64];
                buf[..32].copy_from_slice(left.as_bytes());
                buf[32..].copy_from_slice(right.as_bytes());
                sha256d(&buf)
            })
            .collect();
    }
    level[0]
}
