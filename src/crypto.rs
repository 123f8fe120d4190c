//! Cryptographic primitives for Frostchain
//!
//! The ledger treats these as an opaque provider: `sign`, `verify_signature`
//! and `derive_address` are the whole contract. Signatures are compact
//! secp256k1 ECDSA over the SHA-256 of the message.

use crate::error::{ChainError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// A derived address: 24 raw bytes (20-byte public-key hash body plus a
/// 4-byte checksum) rendered as 32 bytes of base64 text. Storing the
/// text form keeps addresses fixed-size and printable.
pub type Address = [u8; 32];

pub const ADDRESS_LEN: usize = 32;

/// Derive the payable address for a public key.
///
/// body = SHA-256(public_key)[..20], check = SHA-256(SHA-256(body))[..4],
/// address = base64(body || check).
pub fn derive_address(public_key: &[u8]) -> Address {
    let digest = Sha256::digest(public_key);
    let body = &digest[..20];
    let check = Sha256::digest(Sha256::digest(body));

    let mut raw = [0u8; 24];
    raw[..20].copy_from_slice(body);
    raw[20..].copy_from_slice(&check[..4]);

    let text = BASE64.encode(raw);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(text.as_bytes());
    address
}

/// Render an address as its base64 text.
pub fn address_to_string(address: &Address) -> String {
    String::from_utf8_lossy(address).into_owned()
}

/// Parse an address from its base64 text, verifying the checksum.
pub fn address_from_string(text: &str) -> Result<Address> {
    if text.len() != ADDRESS_LEN {
        return Err(ChainError::Crypto(format!(
            "address must be {} characters, got {}",
            ADDRESS_LEN,
            text.len()
        )));
    }
    let raw = BASE64
        .decode(text)
        .map_err(|e| ChainError::Crypto(format!("invalid base64 address: {}", e)))?;
    if raw.len() != 24 {
        return Err(ChainError::Crypto(format!(
            "address must decode to 24 bytes, got {}",
            raw.len()
        )));
    }
    let check = Sha256::digest(Sha256::digest(&raw[..20]));
    if raw[20..] != check[..4] {
        return Err(ChainError::Crypto("address checksum mismatch".to_string()));
    }
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(text.as_bytes());
    Ok(address)
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Result<Self> {
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        Ok(KeyPair {
            secret_key,
            public_key,
        })
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::Crypto(format!(
                    "secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::Crypto(format!("invalid secret key bytes: {}", e))
            }
        })?;
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        Ok(KeyPair {
            secret_key,
            public_key,
        })
    }

    /// The address derived from this keypair's compressed public key.
    pub fn address(&self) -> Address {
        derive_address(&self.public_key.serialize())
    }

    /// Returns the compressed public key bytes.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    /// Signs a message (hashed with SHA-256 first) and returns the
    /// compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; COMPACT_SIGNATURE_SIZE]> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ChainError::Crypto(format!("failed to create message: {}", e)))?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Verifies an ECDSA signature given the raw public key bytes, message,
/// and compact signature bytes.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<()> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(ChainError::Crypto(format!(
            "public key must be exactly {} bytes (compressed), got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::Crypto(format!(
            "signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| ChainError::Crypto(format!("invalid public key: {}", e)))?;

    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| ChainError::Crypto(format!("failed to create message: {}", e)))?;
    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| ChainError::Crypto(format!("invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| ChainError::Crypto("signature verification failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let keypair = KeyPair::generate().unwrap();
        assert_eq!(keypair.public_key_bytes().len(), PUBLIC_KEY_SIZE);
        assert_eq!(keypair.secret_key.as_ref().len(), SECRET_KEY_SIZE);
    }

    #[test]
    fn test_address_derivation_and_checksum() {
        let keypair = KeyPair::generate().unwrap();
        let address = keypair.address();
        let text = address_to_string(&address);
        assert_eq!(text.len(), ADDRESS_LEN);

        // Round-trips through the text form, checksum intact.
        assert_eq!(address_from_string(&text).unwrap(), address);
    }

    #[test]
    fn test_address_checksum_rejects_corruption() {
        let keypair = KeyPair::generate().unwrap();
        let mut text = address_to_string(&keypair.address());
        // Swap a body character for a different base64 character.
        let replacement = if text.starts_with('A') { "B" } else { "A" };
        text.replace_range(0..1, replacement);
        assert!(address_from_string(&text).is_err());
    }

    #[test]
    fn test_derive_address_is_deterministic() {
        let keypair = KeyPair::generate().unwrap();
        let pubkey = keypair.public_key_bytes();
        assert_eq!(derive_address(&pubkey), derive_address(&pubkey));
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate().unwrap();
        let message = b"frostchain";
        let signature = keypair.sign(message).unwrap();
        assert_eq!(signature.len(), COMPACT_SIGNATURE_SIZE);
        assert!(verify_signature(&keypair.public_key_bytes(), message, &signature).is_ok());
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signer = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let message = b"frostchain";
        let signature = signer.sign(message).unwrap();
        assert!(verify_signature(&other.public_key_bytes(), message, &signature).is_err());
    }

    #[test]
    fn test_tampered_message_fails_verification() {
        let keypair = KeyPair::generate().unwrap();
        let signature = keypair.sign(b"original").unwrap();
        assert!(verify_signature(&keypair.public_key_bytes(), b"tampered", &signature).is_err());
    }
}
