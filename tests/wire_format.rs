//! Wire-format properties across the composite record types:
//! round-trips, hash stability, corruption detection.

use frostchain::block::Block;
use frostchain::codec::Wire;
use frostchain::crypto::KeyPair;
use frostchain::error::ChainError;
use frostchain::hashable::Hashable;
use frostchain::transaction::{CoinbaseTx, Input, Output, RegularTx, Transaction};

fn spend_with_outputs(outputs: Vec<Output>) -> RegularTx {
    let keypair = KeyPair::generate().unwrap();
    RegularTx::new(
        vec![Input::new([0x10; 32], [0x20; 32], 1, &keypair).unwrap()],
        outputs,
    )
}

fn three_output_spend() -> RegularTx {
    spend_with_outputs(
        (0u8..3)
            .map(|i| Output {
                address: frostchain::crypto::derive_address(&[i; 33]),
                amount: f64::from(i) + 0.5,
            })
            .collect(),
    )
}

#[test]
fn test_transaction_round_trip_with_zero_remainder() {
    let tx = Transaction::Regular(three_output_spend());
    let bytes = tx.to_bytes();
    let (decoded, rest) = Transaction::read(&bytes).unwrap();
    assert!(rest.is_empty());
    assert_eq!(decoded, tx);
}

#[test]
fn test_block_hash_stable_across_round_trip() {
    let miner = KeyPair::generate().unwrap();
    let block = Block {
        parent: [0x42; 32],
        nonce: 1337,
        timestamp: 1_700_000_000,
        transactions: vec![
            Transaction::Coinbase(CoinbaseTx::with_amount(miner.address(), 9.5)),
            Transaction::Regular(three_output_spend()),
        ],
    };
    let decoded = Block::unseal(&block.seal()).unwrap();
    assert_eq!(decoded.hash(), block.hash());
    assert_eq!(decoded, block);
}

#[test]
fn test_every_single_byte_corruption_is_detected() {
    let tx = Transaction::Coinbase(CoinbaseTx::with_amount(
        frostchain::crypto::derive_address(&[7; 33]),
        9.99,
    ));
    let sealed = tx.seal();
    for index in 0..sealed.len() {
        let mut corrupted = sealed.clone();
        corrupted[index] ^= 0x01;
        // Either the structure no longer parses (DecodeError) or the
        // digest no longer matches (IntegrityError); silence is a bug.
        assert!(
            Transaction::unseal(&corrupted).is_err(),
            "corruption at byte {} went undetected",
            index
        );
    }
}

#[test]
fn test_field_byte_flip_is_integrity_error() {
    let tx = Transaction::Coinbase(CoinbaseTx::with_amount(
        frostchain::crypto::derive_address(&[7; 33]),
        9.99,
    ));
    let mut sealed = tx.seal();
    // Wire layout: inputs count (4), outputs count (4), address length
    // prefix (4), then the address bytes. Flip an address byte.
    sealed[12] ^= 0x01;
    assert!(matches!(
        Transaction::unseal(&sealed),
        Err(ChainError::Integrity(_))
    ));
}

#[test]
fn test_corrupted_interior_length_prefix_is_decode_error() {
    // A composite holding a sequence of three sub-records, with one
    // interior length prefix corrupted.
    let tx = Transaction::Regular(three_output_spend());
    let mut sealed = tx.seal();

    let inputs = match &tx {
        Transaction::Regular(tx) => tx.inputs.clone(),
        Transaction::Coinbase(_) => unreachable!(),
    };
    // Offset of the second output's address length prefix: the inputs
    // sequence, the outputs count, then one 44-byte output record.
    let offset = inputs.to_bytes().len() + 4 + 44;
    assert_eq!(sealed[offset], 32);
    sealed[offset] = 33;

    assert!(matches!(
        Transaction::unseal(&sealed),
        Err(ChainError::Decode(_))
    ));
}

#[test]
fn test_oversized_count_prefix_is_decode_error() {
    let tx = Transaction::Regular(three_output_spend());
    let mut sealed = tx.seal();

    let inputs = match &tx {
        Transaction::Regular(tx) => tx.inputs.clone(),
        Transaction::Coinbase(_) => unreachable!(),
    };
    // Make the outputs count prefix promise ~4 billion entries.
    let offset = inputs.to_bytes().len() + 3;
    sealed[offset] = 0xFF;

    assert!(matches!(
        Transaction::unseal(&sealed),
        Err(ChainError::Decode(_))
    ));
}

#[test]
fn test_truncated_sealed_block_is_decode_error() {
    let block = Block::genesis();
    let sealed = block.seal();
    for cut in 0..sealed.len() {
        assert!(
            Block::unseal(&sealed[..cut]).is_err(),
            "truncation to {} bytes went undetected",
            cut
        );
    }
}

#[test]
fn test_genesis_encoding_is_stable() {
    // nonce (4) + parent (4 + 32) + timestamp (4) + empty tx seq (4).
    let genesis = Block::genesis();
    let bytes = genesis.to_bytes();
    assert_eq!(bytes.len(), 48);
    assert_eq!(Block::from_bytes(&bytes).unwrap(), genesis);
}
