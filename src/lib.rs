//! Frostchain - A minimal proof-of-work ledger with content-addressed
//! blocks and UTXO accounting
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Wire Format
//! - [`codec`] - Binary encode/decode for primitives, byte strings,
//!   sequences and composite records (lexicographic field order)
//! - [`hashable`] - Content addressing: hash-on-serialize,
//!   hash-verify-on-deserialize
//!
//! ## Core Ledger
//! - [`transaction`] - Spend/output records and the coinbase variant
//! - [`block`] - Block structure and the genesis constant
//! - [`ledger`] - Chain state, validation rules, unspent-output
//!   tracking, difficulty adjustment
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work nonce search
//!
//! ## Cryptography
//! - [`crypto`] - Signatures, verification, address derivation
//!   (secp256k1)
//!
//! ## State Management
//! - [`storage`] - Store backends (in-memory, SQLite)
//! - [`cache`] - Block cache
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Wire Format
// ============================================================================
pub mod codec;
pub mod hashable;

// ============================================================================
// Core Ledger
// ============================================================================
pub mod block;
pub mod ledger;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// State Management
// ============================================================================
pub mod cache;
pub mod storage;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
