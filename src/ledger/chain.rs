use crate::block::{work_prefix, Block};
use crate::cache::BlockCache;
use crate::codec::Wire;
use crate::crypto::Address;
use crate::error::{ChainError, Result};
use crate::hashable::{Hashable, Sha256Hash};
use crate::storage::Store;
use crate::transaction::{Input, Output, OutputRef, RegularTx, Transaction};
use parking_lot::{Mutex, RwLock};

/// Difficulty is estimated over the most recent window of this many blocks.
pub const DIFFICULTY_WINDOW: usize = 1000;

/// Target seconds between blocks.
pub const TARGET_INTERVAL_SECS: u64 = 600;

/// The most recent blocks considered not yet final. Informational only;
/// no reorg mechanism exists.
pub const UNTRUSTED_WINDOW: usize = 6;

/// With fewer than two blocks the interval term is undefined, so every
/// 32-bit work prefix is accepted until there is interval evidence.
pub const BOOTSTRAP_DIFFICULTY: u64 = 1 << 32;

/// Difficulty retarget over a window of work prefixes and timestamps.
///
/// Slower recent blocks raise the acceptance threshold (easier), faster
/// blocks lower it (harder). Requires at least two samples.
pub fn retarget(prefixes: &[u32], timestamps: &[u32]) -> u64 {
    let count = prefixes.len();
    let average_hash =
        prefixes.iter().map(|prefix| *prefix as f64).sum::<f64>() / count as f64;
    let min = timestamps.iter().min().copied().unwrap_or(0);
    let max = timestamps.iter().max().copied().unwrap_or(0);
    let average_interval = (max - min) as f64 / (count - 1) as f64;
    (average_hash * average_interval / TARGET_INTERVAL_SECS as f64).round() as u64
}

/// The chain state machine: single writer, no interior chain mutation
/// outside `append`. `Ledger` wraps it for concurrent use.
pub struct Chain {
    store: Box<dyn Store>,
    blocks: BlockCache,
    difficulty: Mutex<Option<u64>>,
}

impl Chain {
    /// Open a chain over the given store, appending the genesis block
    /// if the store is empty.
    pub fn open(store: Box<dyn Store>) -> Result<Self> {
        let mut chain = Chain {
            store,
            blocks: BlockCache::default(),
            difficulty: Mutex::new(None),
        };
        if chain.store.block_count()? == 0 {
            tracing::info!("store is empty, appending genesis block");
            chain.append(Block::genesis())?;
        }
        Ok(chain)
    }

    /// The current chain tip hash.
    pub fn head(&self) -> Result<Sha256Hash> {
        self.store
            .head()?
            .ok_or_else(|| ChainError::Storage("chain is empty".to_string()))
    }

    pub(crate) fn head_opt(&self) -> Result<Option<Sha256Hash>> {
        self.store.head()
    }

    pub fn len(&self) -> Result<u64> {
        self.store.block_count()
    }

    /// Load a block body by hash, verifying its content digest.
    pub fn block(&self, hash: &Sha256Hash) -> Result<Block> {
        if let Some(block) = self.blocks.get(hash) {
            return Ok(block);
        }
        let bytes = self.store.block_bytes(hash)?.ok_or_else(|| {
            ChainError::Resolution(format!("block {} not found", hex::encode(hash)))
        })?;
        let block = Block::unseal(&bytes)?;
        self.blocks.put(*hash, block.clone());
        Ok(block)
    }

    /// Resolve an output reference to the output it names.
    pub fn resolve_ref(&self, reference: &OutputRef) -> Result<Output> {
        let block = self.block(&reference.block_hash)?;
        let tx = block
            .transaction(&reference.transaction_hash)
            .ok_or_else(|| {
                ChainError::Resolution(format!(
                    "transaction {} not found in block {}",
                    hex::encode(reference.transaction_hash),
                    hex::encode(reference.block_hash)
                ))
            })?;
        tx.outputs()
            .get(reference.output_index as usize)
            .cloned()
            .ok_or_else(|| {
                ChainError::Resolution(format!(
                    "output index {} out of range for transaction {}",
                    reference.output_index,
                    hex::encode(reference.transaction_hash)
                ))
            })
    }

    pub fn resolve_input(&self, input: &Input) -> Result<Output> {
        self.resolve_ref(&input.output_ref())
    }

    /// Membership test against the tracked unspent-output set.
    pub fn is_unspent(&self, reference: &OutputRef) -> Result<bool> {
        self.store.is_open(&reference.to_bytes())
    }

    /// fee = total out - total resolved in.
    pub fn regular_fee(&self, tx: &RegularTx) -> Result<f64> {
        let mut total_in = 0.0;
        for input in &tx.inputs {
            total_in += self.resolve_input(input)?.amount;
        }
        Ok(tx.total_out() - total_in)
    }

    /// Sum of unspent outputs owned by the address.
    pub fn balance(&self, address: &Address) -> Result<f64> {
        let mut total = 0.0;
        for member in self.store.open_members()? {
            let reference = OutputRef::from_bytes(&member)?;
            let output = self.resolve_ref(&reference)?;
            if &output.address == address {
                total += output.amount;
            }
        }
        Ok(total)
    }

    /// The proof-of-work acceptance threshold, computed lazily over the
    /// recent window and cached until the next append.
    pub fn current_difficulty(&self) -> Result<u64> {
        if let Some(cached) = *self.difficulty.lock() {
            return Ok(cached);
        }
        let hashes = self.store.tail_hashes(DIFFICULTY_WINDOW)?;
        let difficulty = if hashes.len() < 2 {
            BOOTSTRAP_DIFFICULTY
        } else {
            let prefixes: Vec<u32> = hashes.iter().map(work_prefix).collect();
            let mut timestamps = Vec::with_capacity(hashes.len());
            for hash in &hashes {
                timestamps.push(self.block(hash)?.timestamp);
            }
            retarget(&prefixes, &timestamps)
        };
        *self.difficulty.lock() = Some(difficulty);
        Ok(difficulty)
    }

    /// Hashes of the most recent blocks, not yet considered final.
    pub fn untrusted_tip(&self) -> Result<Vec<Sha256Hash>> {
        self.store.tail_hashes(UNTRUSTED_WINDOW)
    }

    /// Validate and append a block. All-or-nothing: on any validation
    /// failure the chain is unchanged. On success the block body, the
    /// hash-list append and the open-set delta commit atomically, and
    /// the difficulty cache is invalidated.
    pub fn append(&mut self, block: Block) -> Result<Sha256Hash> {
        self.validate_block(&block)?;

        let hash = block.hash();
        let mut spent = Vec::new();
        let mut created = Vec::new();
        for tx in &block.transactions {
            for input in tx.inputs() {
                spent.push(input.output_ref().to_bytes());
            }
            let tx_hash = tx.hash();
            for index in 0..tx.outputs().len() {
                created.push(
                    OutputRef {
                        block_hash: hash,
                        transaction_hash: tx_hash,
                        output_index: index as u32,
                    }
                    .to_bytes(),
                );
            }
        }

        self.store.commit_block(&hash, &block.seal(), &spent, &created)?;
        *self.difficulty.lock() = None;
        self.blocks.put(hash, block);
        tracing::info!(hash = %hex::encode(hash), "appended block");
        Ok(hash)
    }
}

/// Concurrency wrapper over `Chain`: `append` is the single writer and
/// excludes readers for its duration; queries share a read lock and so
/// observe a consistent snapshot, never a half-applied append.
pub struct Ledger {
    chain: RwLock<Chain>,
}

impl Ledger {
    pub fn open(store: Box<dyn Store>) -> Result<Self> {
        Ok(Ledger {
            chain: RwLock::new(Chain::open(store)?),
        })
    }

    pub fn append(&self, block: Block) -> Result<Sha256Hash> {
        self.chain.write().append(block)
    }

    pub fn head(&self) -> Result<Sha256Hash> {
        self.chain.read().head()
    }

    pub fn len(&self) -> Result<u64> {
        self.chain.read().len()
    }

    pub fn block(&self, hash: &Sha256Hash) -> Result<Block> {
        self.chain.read().block(hash)
    }

    pub fn resolve_input(&self, input: &Input) -> Result<Output> {
        self.chain.read().resolve_input(input)
    }

    pub fn is_unspent(&self, reference: &OutputRef) -> Result<bool> {
        self.chain.read().is_unspent(reference)
    }

    pub fn transaction_fee(&self, tx: &RegularTx) -> Result<f64> {
        self.chain.read().regular_fee(tx)
    }

    pub fn validate_transaction(&self, tx: &Transaction) -> Result<()> {
        tx.validate(&self.chain.read())
    }

    pub fn balance(&self, address: &Address) -> Result<f64> {
        self.chain.read().balance(address)
    }

    pub fn current_difficulty(&self) -> Result<u64> {
        self.chain.read().current_difficulty()
    }

    pub fn untrusted_tip(&self) -> Result<Vec<Sha256Hash>> {
        self.chain.read().untrusted_tip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::GENESIS_HASH;
    use crate::storage::MemoryStore;

    #[test]
    fn test_open_appends_genesis() {
        let ledger = Ledger::open(Box::new(MemoryStore::new())).unwrap();
        assert_eq!(ledger.len().unwrap(), 1);
        assert_eq!(ledger.head().unwrap(), *GENESIS_HASH);
        assert_eq!(ledger.untrusted_tip().unwrap(), vec![*GENESIS_HASH]);
    }

    #[test]
    fn test_open_is_idempotent_over_a_store() {
        let chain = Chain::open(Box::new(MemoryStore::new())).unwrap();
        assert_eq!(chain.len().unwrap(), 1);
        // Reopening over the same populated store appends nothing.
        let store = chain.store;
        let chain = Chain::open(store).unwrap();
        assert_eq!(chain.len().unwrap(), 1);
    }

    #[test]
    fn test_bootstrap_difficulty() {
        let ledger = Ledger::open(Box::new(MemoryStore::new())).unwrap();
        assert_eq!(ledger.current_difficulty().unwrap(), BOOTSTRAP_DIFFICULTY);
    }

    #[test]
    fn test_genesis_block_loads_back() {
        let ledger = Ledger::open(Box::new(MemoryStore::new())).unwrap();
        let genesis = ledger.block(&GENESIS_HASH).unwrap();
        assert_eq!(genesis.hash(), *GENESIS_HASH);
        assert!(genesis.transactions.is_empty());
    }

    #[test]
    fn test_missing_block_is_resolution_error() {
        let ledger = Ledger::open(Box::new(MemoryStore::new())).unwrap();
        assert!(matches!(
            ledger.block(&[0xEE; 32]),
            Err(ChainError::Resolution(_))
        ));
    }

    #[test]
    fn test_retarget_scales_with_interval() {
        let prefixes = vec![1_000_000u32; 11];
        let narrow: Vec<u32> = (0..11).map(|i| i * 600).collect();
        let wide: Vec<u32> = (0..11).map(|i| i * 1200).collect();

        let base = retarget(&prefixes, &narrow);
        let doubled = retarget(&prefixes, &wide);

        // Interval doubles, difficulty doubles (within integer rounding).
        assert_eq!(base, 1_000_000);
        assert_eq!(doubled, 2_000_000);
    }

    #[test]
    fn test_retarget_scales_with_average_hash() {
        let timestamps: Vec<u32> = (0..5).map(|i| i * 600).collect();
        let low = retarget(&[100u32; 5], &timestamps);
        let high = retarget(&[400u32; 5], &timestamps);
        assert_eq!(low, 100);
        assert_eq!(high, 400);
    }
}
