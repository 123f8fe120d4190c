//! Caching layer for frequently accessed chain data.
//!
//! Blocks are immutable once appended, so a decoded block can be cached
//! by hash indefinitely; the LRU bound only caps memory.

use crate::block::Block;
use crate::hashable::Sha256Hash;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

pub const DEFAULT_BLOCK_CACHE_SIZE: usize = 100;

pub struct BlockCache {
    inner: Mutex<LruCache<Sha256Hash, Block>>,
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        BlockCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, hash: &Sha256Hash) -> Option<Block> {
        self.inner.lock().get(hash).cloned()
    }

    pub fn put(&self, hash: Sha256Hash, block: Block) {
        self.inner.lock().put(hash, block);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_and_eviction() {
        let cache = BlockCache::new(2);
        assert!(cache.is_empty());

        let a = Block::genesis();
        let mut b = Block::genesis();
        b.nonce = 1;
        let mut c = Block::genesis();
        c.nonce = 2;

        cache.put(a.hash(), a.clone());
        cache.put(b.hash(), b.clone());
        assert_eq!(cache.get(&a.hash()), Some(a.clone()));

        // Capacity 2: inserting a third evicts the least recently used.
        cache.put(c.hash(), c.clone());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&b.hash()).is_none());
        assert_eq!(cache.get(&c.hash()), Some(c));
    }
}
