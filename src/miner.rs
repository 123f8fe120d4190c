//! Proof-of-work mining.
//!
//! The miner searches bounded batches of random nonces against the
//! current difficulty. Between batches it refreshes the candidate's
//! timestamp and re-samples the ledger head, so a tip that advanced
//! during the search is picked up instead of being raced. The search is
//! cancellable at any point through a shared flag.

use crate::block::{work_prefix, Block};
use crate::crypto::Address;
use crate::error::{ChainError, Result};
use crate::hashable::{Hashable, Sha256Hash};
use crate::ledger::Ledger;
use crate::transaction::{CoinbaseTx, RegularTx, Transaction};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rand::Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

pub const DEFAULT_BATCH_SIZE: u32 = 10_000;

/// A block under construction: coinbase first, mutable fields, cached
/// hash invalidated on every mutation.
pub struct CandidateBlock {
    block: Block,
    cached_hash: Option<Sha256Hash>,
}

impl CandidateBlock {
    pub fn new(beneficiary: Address, reward: f64, parent: Sha256Hash, timestamp: u32) -> Self {
        CandidateBlock {
            block: Block {
                parent,
                nonce: 0,
                timestamp,
                transactions: vec![Transaction::Coinbase(CoinbaseTx::with_amount(
                    beneficiary,
                    reward,
                ))],
            },
            cached_hash: None,
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Append a transaction and collect its fee into the coinbase.
    pub fn push_transaction(&mut self, tx: RegularTx, fee: f64) {
        if let Some(Transaction::Coinbase(coinbase)) = self.block.transactions.first_mut() {
            coinbase.add_fee(fee);
        }
        self.block.transactions.push(Transaction::Regular(tx));
        self.cached_hash = None;
    }

    pub fn set_nonce(&mut self, nonce: u32) {
        self.block.nonce = nonce;
        self.cached_hash = None;
    }

    pub fn set_timestamp(&mut self, timestamp: u32) {
        self.block.timestamp = timestamp;
        self.cached_hash = None;
    }

    pub fn set_parent(&mut self, parent: Sha256Hash) {
        self.block.parent = parent;
        self.cached_hash = None;
    }

    pub fn hash(&mut self) -> Sha256Hash {
        if let Some(hash) = self.cached_hash {
            return hash;
        }
        let hash = self.block.content_hash();
        self.cached_hash = Some(hash);
        hash
    }

    pub fn into_block(self) -> Block {
        self.block
    }
}

pub struct Miner {
    ledger: Arc<Ledger>,
    beneficiary: Address,
    reward: f64,
    batch_size: u32,
    cancel: Arc<AtomicBool>,
    pending: Mutex<Vec<RegularTx>>,
}

impl Miner {
    pub fn new(ledger: Arc<Ledger>, beneficiary: Address, reward: f64, batch_size: u32) -> Self {
        Miner {
            ledger,
            beneficiary,
            reward,
            batch_size: batch_size.max(1),
            cancel: Arc::new(AtomicBool::new(false)),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Shared flag that interrupts the search when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Queue a transaction for inclusion in the next candidate.
    pub fn submit_transaction(&self, tx: RegularTx) {
        self.pending.lock().push(tx);
    }

    fn build_candidate(&self) -> Result<CandidateBlock> {
        let parent = self.ledger.head()?;
        let mut candidate = CandidateBlock::new(self.beneficiary, self.reward, parent, now());

        let pending = std::mem::take(&mut *self.pending.lock());
        for tx in pending {
            let wrapped = Transaction::Regular(tx.clone());
            match self
                .ledger
                .validate_transaction(&wrapped)
                .and_then(|_| self.ledger.transaction_fee(&tx))
            {
                Ok(fee) => candidate.push_transaction(tx, fee),
                Err(reason) => {
                    tracing::warn!(%reason, "dropping queued transaction");
                }
            }
        }
        Ok(candidate)
    }

    /// Search for one acceptable block and append it. Returns the
    /// appended hash, or `None` if cancelled first.
    pub fn mine_one(&self) -> Result<Option<Sha256Hash>> {
        let mut candidate = self.build_candidate()?;
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }

            let difficulty = self.ledger.current_difficulty()?;
            let block = candidate.block();
            let found = (0..self.batch_size).into_par_iter().find_map_any(|_| {
                if self.cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let nonce = rand::thread_rng().gen::<u32>();
                let hash = block.hash_with_nonce(nonce);
                ((work_prefix(&hash) as u64) < difficulty).then_some(nonce)
            });

            if let Some(nonce) = found {
                candidate.set_nonce(nonce);
                tracing::debug!(nonce, hash = %hex::encode(candidate.hash()), "found nonce");
                match self.ledger.append(candidate.block().clone()) {
                    Ok(hash) => return Ok(Some(hash)),
                    Err(ChainError::Validation(reason)) => {
                        // Lost the race for this head (or a queued
                        // transaction went stale). Rebuild and continue.
                        tracing::warn!(%reason, "candidate rejected, rebuilding");
                        candidate = self.build_candidate()?;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            // Batch exhausted: refresh and re-sample the head.
            candidate.set_timestamp(now());
            candidate.set_parent(self.ledger.head()?);
        }
    }

    /// Mine until cancelled, reporting each appended block hash.
    pub fn run(&self, events: Sender<Sha256Hash>) -> Result<()> {
        while !self.cancel.load(Ordering::Relaxed) {
            match self.mine_one()? {
                Some(hash) => {
                    let _ = events.send(hash);
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Run the mining loop on its own thread; mined block hashes arrive
    /// on the returned channel.
    pub fn spawn(self: Arc<Self>) -> (thread::JoinHandle<Result<()>>, Receiver<Sha256Hash>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = thread::spawn(move || self.run(sender));
        (handle, receiver)
    }
}

fn now() -> u32 {
    chrono::Utc::now().timestamp().max(0) as u32
}
