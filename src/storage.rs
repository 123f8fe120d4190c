//! Storage backends for the ledger.
//!
//! The chain treats its store as three dumb structures: an ordered list
//! of block hashes (canonical chain order), a keyed blob store
//! (`BLOCK:<hash>` → sealed block bytes), and a membership set of
//! serialized open-output references. `commit_block` applies one
//! block's worth of changes to all three atomically.

use crate::error::{ChainError, Result};
use crate::hashable::Sha256Hash;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};

/// Abstraction for storage backends. Implementations must apply
/// `commit_block` atomically: the hash-list append and the open-set
/// delta land together or not at all.
pub trait Store: Send + Sync {
    fn block_count(&self) -> Result<u64>;

    /// The newest hash in the canonical order, if any.
    fn head(&self) -> Result<Option<Sha256Hash>>;

    /// The most recent `n` hashes (or fewer), oldest first.
    fn tail_hashes(&self, n: usize) -> Result<Vec<Sha256Hash>>;

    fn block_bytes(&self, hash: &Sha256Hash) -> Result<Option<Vec<u8>>>;

    fn commit_block(
        &self,
        hash: &Sha256Hash,
        body: &[u8],
        spent: &[Vec<u8>],
        created: &[Vec<u8>],
    ) -> Result<()>;

    fn is_open(&self, member: &[u8]) -> Result<bool>;

    fn open_members(&self) -> Result<Vec<Vec<u8>>>;
}

fn block_key(hash: &Sha256Hash) -> String {
    format!("BLOCK:{}", hex::encode(hash))
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    hashes: Vec<Sha256Hash>,
    blobs: HashMap<String, Vec<u8>>,
    open: HashSet<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn block_count(&self) -> Result<u64> {
        Ok(self.inner.read().hashes.len() as u64)
    }

    fn head(&self) -> Result<Option<Sha256Hash>> {
        Ok(self.inner.read().hashes.last().copied())
    }

    fn tail_hashes(&self, n: usize) -> Result<Vec<Sha256Hash>> {
        let inner = self.inner.read();
        let start = inner.hashes.len().saturating_sub(n);
        Ok(inner.hashes[start..].to_vec())
    }

    fn block_bytes(&self, hash: &Sha256Hash) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().blobs.get(&block_key(hash)).cloned())
    }

    fn commit_block(
        &self,
        hash: &Sha256Hash,
        body: &[u8],
        spent: &[Vec<u8>],
        created: &[Vec<u8>],
    ) -> Result<()> {
        let mut inner = self.inner.write();
        inner.blobs.insert(block_key(hash), body.to_vec());
        inner.hashes.push(*hash);
        for member in spent {
            inner.open.remove(member);
        }
        for member in created {
            inner.open.insert(member.clone());
        }
        Ok(())
    }

    fn is_open(&self, member: &[u8]) -> Result<bool> {
        Ok(self.inner.read().open.contains(member))
    }

    fn open_members(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self.inner.read().open.iter().cloned().collect())
    }
}

/// SQLite-backed store for durable chains.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ChainError::Storage(format!("failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS hashes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                hash BLOB NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                body BLOB NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS open_transactions (
                member BLOB PRIMARY KEY
            )",
            [],
        )?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }
}

fn hash_from_row(bytes: Vec<u8>) -> Result<Sha256Hash> {
    bytes
        .try_into()
        .map_err(|_| ChainError::Storage("stored hash is not 32 bytes".to_string()))
}

impl Store for SqliteStore {
    fn block_count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM hashes", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn head(&self) -> Result<Option<Sha256Hash>> {
        let conn = self.conn.lock();
        let row: Option<Vec<u8>> = conn
            .query_row(
                "SELECT hash FROM hashes ORDER BY seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        row.map(hash_from_row).transpose()
    }

    fn tail_hashes(&self, n: usize) -> Result<Vec<Sha256Hash>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT hash FROM hashes ORDER BY seq DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![n as i64], |row| row.get::<_, Vec<u8>>(0))?;

        let mut hashes = Vec::new();
        for row in rows {
            hashes.push(hash_from_row(row?)?);
        }
        hashes.reverse();
        Ok(hashes)
    }

    fn block_bytes(&self, hash: &Sha256Hash) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock();
        let row: Option<Vec<u8>> = conn
            .query_row(
                "SELECT body FROM blobs WHERE key = ?1",
                params![block_key(hash)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row)
    }

    fn commit_block(
        &self,
        hash: &Sha256Hash,
        body: &[u8],
        spent: &[Vec<u8>],
        created: &[Vec<u8>],
    ) -> Result<()> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO blobs (key, body) VALUES (?1, ?2)",
            params![block_key(hash), body],
        )?;
        tx.execute(
            "INSERT INTO hashes (hash) VALUES (?1)",
            params![hash.to_vec()],
        )?;
        for member in spent {
            tx.execute(
                "DELETE FROM open_transactions WHERE member = ?1",
                params![member],
            )?;
        }
        for member in created {
            tx.execute(
                "INSERT OR IGNORE INTO open_transactions (member) VALUES (?1)",
                params![member],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn is_open(&self, member: &[u8]) -> Result<bool> {
        let conn = self.conn.lock();
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM open_transactions WHERE member = ?1)",
            params![member],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    fn open_members(&self) -> Result<Vec<Vec<u8>>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT member FROM open_transactions")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }
        Ok(members)
    }
}
