/// Transaction types for Frostchain
use crate::codec::{write_seq, Wire};
use crate::crypto::{Address, KeyPair};
use crate::error::Result;
use crate::hashable::{Hashable, Sha256Hash};

/// Fixed issuance per block. The reward cap compares against this with
/// a strict `<`, so a coinbase claiming the full amount is never
/// accepted (preserved behavior, see DESIGN.md).
pub const BLOCK_REWARD: f64 = 10.0;

/// A payable unit: an amount locked to an address.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub address: Address,
    pub amount: f64,
}

impl Output {
    /// Wire field names, lexicographically sorted. Part of the wire format.
    pub const FIELDS: &'static [&'static str] = &["address", "amount"];
}

impl Wire for Output {
    fn write(&self, out: &mut Vec<u8>) {
        self.address.write(out);
        self.amount.write(out);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (address, rest) = <[u8; 32]>::read(input)?;
        let (amount, rest) = f64::read(rest)?;
        Ok((Output { address, amount }, rest))
    }
}

impl Hashable for Output {}

/// A reference to a prior output plus proof of ownership. Not
/// self-valid: it must be resolved against the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub block_hash: Sha256Hash,
    pub transaction_hash: Sha256Hash,
    pub output_index: u32,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Input {
    pub const FIELDS: &'static [&'static str] = &[
        "block_hash",
        "output_index",
        "public_key",
        "signature",
        "transaction_hash",
    ];

    /// Build an input spending `output_index` of the given transaction,
    /// signed over the referenced transaction hash.
    pub fn new(
        block_hash: Sha256Hash,
        transaction_hash: Sha256Hash,
        output_index: u32,
        keypair: &KeyPair,
    ) -> Result<Self> {
        let signature = keypair.sign(&transaction_hash)?;
        Ok(Input {
            block_hash,
            transaction_hash,
            output_index,
            public_key: keypair.public_key_bytes().to_vec(),
            signature: signature.to_vec(),
        })
    }

    /// The open-set key this input consumes.
    pub fn output_ref(&self) -> OutputRef {
        OutputRef {
            block_hash: self.block_hash,
            transaction_hash: self.transaction_hash,
            output_index: self.output_index,
        }
    }
}

impl Wire for Input {
    fn write(&self, out: &mut Vec<u8>) {
        self.block_hash.write(out);
        self.output_index.write(out);
        self.public_key.write(out);
        self.signature.write(out);
        self.transaction_hash.write(out);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (block_hash, rest) = <[u8; 32]>::read(input)?;
        let (output_index, rest) = u32::read(rest)?;
        let (public_key, rest) = Vec::<u8>::read(rest)?;
        let (signature, rest) = Vec::<u8>::read(rest)?;
        let (transaction_hash, rest) = <[u8; 32]>::read(rest)?;
        Ok((
            Input {
                block_hash,
                transaction_hash,
                output_index,
                public_key,
                signature,
            },
            rest,
        ))
    }
}

/// Identifies one output of one transaction of one block. Serialized
/// members of the store's `open_transactions` set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub block_hash: Sha256Hash,
    pub transaction_hash: Sha256Hash,
    pub output_index: u32,
}

impl OutputRef {
    pub const FIELDS: &'static [&'static str] =
        &["block_hash", "output_index", "transaction_hash"];
}

impl Wire for OutputRef {
    fn write(&self, out: &mut Vec<u8>) {
        self.block_hash.write(out);
        self.output_index.write(out);
        self.transaction_hash.write(out);
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (block_hash, rest) = <[u8; 32]>::read(input)?;
        let (output_index, rest) = u32::read(rest)?;
        let (transaction_hash, rest) = <[u8; 32]>::read(rest)?;
        Ok((
            OutputRef {
                block_hash,
                transaction_hash,
                output_index,
            },
            rest,
        ))
    }
}

/// A transaction that can occur in a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Regular(RegularTx),
    Coinbase(CoinbaseTx),
}

impl Transaction {
    /// The wire record is untagged: inputs then outputs, like every
    /// composite. A record with zero inputs is a coinbase.
    pub const FIELDS: &'static [&'static str] = &["inputs", "outputs"];

    pub fn hash(&self) -> Sha256Hash {
        self.content_hash()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, Transaction::Coinbase(_))
    }

    pub fn inputs(&self) -> &[Input] {
        match self {
            Transaction::Regular(tx) => &tx.inputs,
            Transaction::Coinbase(_) => &[],
        }
    }

    pub fn outputs(&self) -> &[Output] {
        match self {
            Transaction::Regular(tx) => &tx.outputs,
            Transaction::Coinbase(tx) => std::slice::from_ref(&tx.output),
        }
    }

    pub fn total_out(&self) -> f64 {
        self.outputs().iter().map(|output| output.amount).sum()
    }
}

impl Wire for Transaction {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Transaction::Regular(tx) => {
                write_seq(&tx.inputs, out);
                write_seq(&tx.outputs, out);
            }
            Transaction::Coinbase(tx) => {
                write_seq::<Input>(&[], out);
                write_seq(std::slice::from_ref(&tx.output), out);
            }
        }
    }

    fn read(input: &[u8]) -> Result<(Self, &[u8])> {
        let (inputs, rest) = Vec::<Input>::read(input)?;
        let (mut outputs, rest) = Vec::<Output>::read(rest)?;
        if inputs.is_empty() {
            if outputs.len() != 1 {
                return Err(crate::error::ChainError::Decode(format!(
                    "coinbase must carry exactly one output, got {}",
                    outputs.len()
                )));
            }
            return Ok((
                Transaction::Coinbase(CoinbaseTx {
                    output: outputs.remove(0),
                }),
                rest,
            ));
        }
        Ok((Transaction::Regular(RegularTx { inputs, outputs }), rest))
    }
}

impl Hashable for Transaction {}

/// A spend: inputs consuming prior outputs, outputs creating new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularTx {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl RegularTx {
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        RegularTx { inputs, outputs }
    }

    pub fn total_out(&self) -> f64 {
        self.outputs.iter().map(|output| output.amount).sum()
    }
}

/// The reward-creating transaction, first in every block. No inputs,
/// exactly one output; collected fees accumulate into that output
/// while the block is under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinbaseTx {
    pub output: Output,
}

impl CoinbaseTx {
    pub fn new(address: Address) -> Self {
        Self::with_amount(address, BLOCK_REWARD)
    }

    pub fn with_amount(address: Address, amount: f64) -> Self {
        CoinbaseTx {
            output: Output { address, amount },
        }
    }

    pub fn add_fee(&mut self, fee: f64) {
        self.output.amount += fee;
    }

    pub fn total_out(&self) -> f64 {
        self.output.amount
    }
}
