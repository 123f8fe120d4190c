//! Block-level consensus rules, evaluated against the chain a block
//! targets. Validity is all-or-nothing: any failing rule rejects the
//! whole block and the chain stays unchanged.

use crate::block::{work_prefix, Block, GENESIS_HASH};
use crate::error::{ChainError, Result};
use crate::ledger::Chain;
use crate::transaction::{Transaction, BLOCK_REWARD};

impl Chain {
    /// A block is valid iff it is the genesis block, or all of: parent
    /// linkage, reward cap, proof of work, and transaction validity.
    pub fn validate_block(&self, block: &Block) -> Result<()> {
        let hash = block.hash();

        // Genesis exception: bypasses every other check.
        if hash == *GENESIS_HASH {
            return Ok(());
        }

        match self.head_opt()? {
            Some(head) if head == block.parent => {}
            Some(head) => {
                return Err(ChainError::Validation(format!(
                    "parent mismatch: block links {}, chain head is {}",
                    hex::encode(block.parent),
                    hex::encode(head)
                )))
            }
            None => {
                return Err(ChainError::Validation(
                    "only the genesis block may start an empty chain".to_string(),
                ))
            }
        }

        let coinbase = match block.transactions.first() {
            Some(Transaction::Coinbase(tx)) => tx,
            _ => {
                return Err(ChainError::Validation(
                    "first transaction must be the coinbase".to_string(),
                ))
            }
        };

        let mut fees = 0.0;
        for tx in &block.transactions[1..] {
            match tx {
                Transaction::Regular(tx) => fees += self.regular_fee(tx)?,
                Transaction::Coinbase(_) => {
                    return Err(ChainError::Validation(
                        "coinbase allowed only in the first slot".to_string(),
                    ))
                }
            }
        }
        // The cap is a strict inequality: a payout equal to the
        // issuance is rejected.
        let payout = coinbase.total_out() + fees;
        if !(payout < BLOCK_REWARD) {
            return Err(ChainError::Validation(format!(
                "reward overcap: coinbase plus fees pay {}, cap is {}",
                payout, BLOCK_REWARD
            )));
        }

        let difficulty = self.current_difficulty()?;
        let prefix = work_prefix(&hash) as u64;
        if prefix >= difficulty {
            return Err(ChainError::Validation(format!(
                "insufficient proof of work: prefix {} is not below target {}",
                prefix, difficulty
            )));
        }

        for tx in &block.transactions[1..] {
            tx.validate(self)?;
        }

        Ok(())
    }
}
