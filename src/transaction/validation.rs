/// Validation logic for transactions separated from type definitions
use crate::crypto::{address_to_string, derive_address, verify_signature};
use crate::error::{ChainError, Result};
use crate::ledger::Chain;
use crate::transaction::types::{Input, Output, RegularTx, Transaction};

impl Input {
    /// Ownership check against the resolved output: the public key must
    /// derive the output's address and the signature must verify over
    /// the referenced transaction hash.
    pub fn verify_ownership(&self, resolved: &Output) -> Result<()> {
        if derive_address(&self.public_key) != resolved.address {
            return Err(ChainError::Validation(format!(
                "input public key does not own output paid to {}",
                address_to_string(&resolved.address)
            )));
        }
        verify_signature(&self.public_key, &self.transaction_hash, &self.signature).map_err(
            |_| {
                ChainError::Validation(format!(
                    "input signature over transaction {} does not verify",
                    hex::encode(self.transaction_hash)
                ))
            },
        )
    }

    /// Full validity of a bound input: the reference resolves, the
    /// spender owns it, and it has not already been spent. The unspent
    /// check is a membership test against the tracked open set, never a
    /// chain walk.
    pub fn validate(&self, chain: &Chain) -> Result<()> {
        let resolved = chain.resolve_input(self)?;
        self.verify_ownership(&resolved)?;
        if !chain.is_unspent(&self.output_ref())? {
            return Err(ChainError::Validation(format!(
                "double spend: output {} of transaction {} is not in the open set",
                self.output_index,
                hex::encode(self.transaction_hash)
            )));
        }
        Ok(())
    }
}

impl RegularTx {
    /// Every input must resolve and be valid, and the fee must not be
    /// negative.
    pub fn validate(&self, chain: &Chain) -> Result<()> {
        for input in &self.inputs {
            input.validate(chain)?;
        }
        let fee = chain.regular_fee(self)?;
        if fee < 0.0 {
            return Err(ChainError::Validation(format!(
                "negative fee: outputs pay {} against {} resolved in",
                self.total_out(),
                self.total_out() - fee
            )));
        }
        Ok(())
    }
}

impl Transaction {
    /// Coinbase transactions skip input checks entirely; their validity
    /// is folded into block validity (the reward cap).
    pub fn validate(&self, chain: &Chain) -> Result<()> {
        match self {
            Transaction::Regular(tx) => tx.validate(chain),
            Transaction::Coinbase(_) => Ok(()),
        }
    }
}
