//! The ledger: an append-only sequence of validated blocks over a
//! store, with unspent-output tracking and difficulty adjustment.

pub mod chain;
pub mod validation;

pub use chain::{
    retarget, Chain, Ledger, BOOTSTRAP_DIFFICULTY, DIFFICULTY_WINDOW, TARGET_INTERVAL_SECS,
    UNTRUSTED_WINDOW,
};
