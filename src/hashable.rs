//! Content addressing over the wire codec.
//!
//! A hashable record's serialized form is its canonical encoding
//! followed by the SHA-256 digest of exactly those bytes. The digest is
//! the record's identity; a mismatch on load means the record was
//! tampered with or corrupted and must be rejected.

use crate::codec::Wire;
use crate::error::{ChainError, Result};
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

pub const HASH_LEN: usize = 32;

pub fn sha256(bytes: &[u8]) -> Sha256Hash {
    Sha256::digest(bytes).into()
}

pub trait Hashable: Wire {
    /// SHA-256 over the canonical encoding. This is the record's identity.
    fn content_hash(&self) -> Sha256Hash {
        sha256(&self.to_bytes())
    }

    /// Canonical encoding with the content digest appended.
    fn seal(&self) -> Vec<u8> {
        let mut out = self.to_bytes();
        let digest = sha256(&out);
        out.extend_from_slice(&digest);
        out
    }

    /// Decode a sealed record, verifying the digest over exactly the
    /// consumed prefix bytes.
    fn unseal(input: &[u8]) -> Result<Self> {
        let (value, rest) = Self::read(input)?;
        if rest.len() < HASH_LEN {
            return Err(ChainError::Decode(
                "sealed record is missing its content digest".to_string(),
            ));
        }
        let consumed = input.len() - rest.len();
        let (digest, rest) = rest.split_at(HASH_LEN);
        let computed = sha256(&input[..consumed]);
        if computed.as_slice() != digest {
            return Err(ChainError::Integrity(format!(
                "content hash mismatch: record claims {}, encoding hashes to {}",
                hex::encode(digest),
                hex::encode(computed)
            )));
        }
        if !rest.is_empty() {
            return Err(ChainError::Decode(format!(
                "{} trailing bytes after sealed record",
                rest.len()
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Output;

    fn sample() -> Output {
        Output {
            address: [0x41u8; 32],
            amount: 4.25,
        }
    }

    #[test]
    fn test_seal_unseal_round_trip() {
        let output = sample();
        let sealed = output.seal();
        assert_eq!(sealed.len(), output.to_bytes().len() + HASH_LEN);
        assert_eq!(Output::unseal(&sealed).unwrap(), output);
    }

    #[test]
    fn test_hash_stable_across_round_trip() {
        let output = sample();
        let decoded = Output::unseal(&output.seal()).unwrap();
        assert_eq!(output.content_hash(), decoded.content_hash());
    }

    #[test]
    fn test_tampered_field_byte_detected() {
        let output = sample();
        let mut sealed = output.seal();
        // Flip one byte inside the address bytes (past the length prefix).
        sealed[6] ^= 0x01;
        assert!(matches!(
            Output::unseal(&sealed),
            Err(ChainError::Integrity(_))
        ));
    }

    #[test]
    fn test_tampered_digest_detected() {
        let output = sample();
        let mut sealed = output.seal();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(
            Output::unseal(&sealed),
            Err(ChainError::Integrity(_))
        ));
    }

    #[test]
    fn test_missing_digest_is_decode_error() {
        let output = sample();
        let bytes = output.to_bytes();
        assert!(matches!(
            Output::unseal(&bytes[..bytes.len() - 1]),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_after_seal_rejected() {
        let mut sealed = sample().seal();
        sealed.push(0);
        assert!(matches!(
            Output::unseal(&sealed),
            Err(ChainError::Decode(_))
        ));
    }
}
