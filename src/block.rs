//! Block structure and the genesis constant.

use crate::codec::{write_seq, Wire};
use crate::error::Result;
use crate::hashable::{Hashable, Sha256Hash};
use crate::transaction::Transaction;
use once_cell::sync::Lazy;

/// The distinguished first block: zero parent, zero nonce, zero
/// timestamp, no transactions. Its content hash bypasses proof-of-work
/// and parent checks.
pub static GENESIS_HASH: Lazy<Sha256Hash> = Lazy::new(|| Block::genesis().hash());

/// An ordered transaction list plus proof-of-work header fields.
/// Immutable once appended; the miner mutates it only through
/// `CandidateBlock`, which owns the hash cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub parent: Sha256Hash,
    pub nonce: u32,
    pub timestamp: u32,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub const FIELDS: &'static [&'static str] = &["nonce", "parent", "timestamp", "transactions"];

    pub fn genesis() -> Block {
        Block {
            parent: [0u8; 32],
            nonce: 0,
            timestamp: 0,
            transactions: Vec::new(),
        }
    }

    pub fn hash(&self) -> Sha256Hash {
        self.content_hash()
    }

    /// The content hash this block would have under a different nonce.
    /// Used by the nonce search so candidates need not be mutated per
    /// attempt.
    pub fn hash_with_nonce(&self, nonce: u32) -> Sha256Hash {
        let mut out = Vec::new();
        self.write_with_nonce(nonce, &mut out);
        crate::hashable::sha256(&out)
    }

    /// Find a transaction in this block by its content hash.
    pub fn transaction(&self, hash: &Sha256Hash) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| &tx.hash() == hash)
    }

    fn write_with_nonce(&self, nonce: u32, out: &mut Vec<u8>) {
        nonce.write(out);
        self.parent.write(out);
        self.timestamp.write(out);
        write_seq(&self.transactions, out);
    }
}

impl Wire for Block {
    fn write(&self, out: &mut Vec<u8>) {
        self.write_with_nonce(self.nonce, out);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (nonce, rest) = u32::read(input)?;
        let (parent, rest) = <[u8; 32]>::read(rest)?;
        let (timestamp, rest) = u32::read(rest)?;
        let (transactions, rest) = Vec::<Transaction>::read(rest)?;
        Ok((
            Block {
                parent,
                nonce,
                timestamp,
                transactions,
            },
            rest,
        ))
    }
}

impl Hashable for Block {}

/// The first four bytes of a block hash as a little-endian unsigned
/// integer. A block is acceptable when this falls below the current
/// difficulty.
pub fn work_prefix(hash: &Sha256Hash) -> u32 {
    u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]])
}
