//! Script construction
//!
//! Only the subset needed to build coinbase inputs and simple output scripts:
//! integer and data pushes with minimal encodings, plus raw opcodes. Nothing
//! here executes scripts.

use serde::{Serialize, Serializer};
use std::fmt;

/// Push the number zero
pub const OP_0: u8 = 0x00;
/// Next byte holds the push length
pub const OP_PUSHDATA1: u8 = 0x4c;
/// Next two bytes hold the push length
pub const OP_PUSHDATA2: u8 = 0x4d;
/// Next four bytes hold the push length
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number -1
pub const OP_1NEGATE: u8 = 0x4f;
/// Push the number 1; OP_2..OP_16 follow contiguously
pub const OP_1: u8 = 0x51;
/// Verify a signature against a public key
pub const OP_CHECKSIG: u8 = 0xac;

/// Serialized script bytes
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    /// Start a builder
    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    /// Raw script bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Script length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script has no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

/// Incremental script builder
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    /// Append a raw opcode
    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.bytes.push(opcode);
        self
    }

    /// Push an integer, using the small-integer opcodes for -1 and 0..=16
    pub fn push_int(self, n: i64) -> Self {
        match n {
            -1 => self.push_opcode(OP_1NEGATE),
            0 => self.push_opcode(OP_0),
            1..=16 => self.push_opcode(OP_1 + (n as u8) - 1),
            _ => {
                let encoded = script_num(n);
                self.push_slice(&encoded)
            }
        }
    }

    /// Push an integer as serialized number bytes, never as a small-int opcode
    pub fn push_script_num(self, n: i64) -> Self {
        let encoded = script_num(n);
        self.push_slice(&encoded)
    }

    /// Push data with the shortest length prefix
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.bytes.push(len as u8);
        } else if len <= 0xff {
            self.bytes.push(OP_PUSHDATA1);
            self.bytes.push(len as u8);
        } else if len <= 0xffff {
            self.bytes.push(OP_PUSHDATA2);
            self.bytes.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.bytes.push(OP_PUSHDATA4);
            self.bytes.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.bytes.extend_from_slice(data);
        self
    }

    /// Finish the script
    pub fn into_script(self) -> Script {
        Script(self.bytes)
    }
}

/// Minimal little-endian sign-magnitude encoding of a script number
pub fn script_num(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }

    // The top bit of the last byte carries the sign; add a byte if it is taken.
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}
