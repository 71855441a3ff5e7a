//! Credential Encryption
//!
//! Provides AES-256-GCM encryption for panel credentials stored in the
//! database. This ensures that panel URLs and API keys are never stored in
//! plaintext. Keys are derived in memory at startup and never persisted
//! alongside ciphertexts.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

/// HKDF info string for credential key derivation.
const HKDF_INFO: &[u8] = b"talon-credential-key-v1";

/// HKDF salt for domain separation.
const HKDF_SALT: &[u8] = b"talon-credential-hkdf-salt";

/// Nonce size for GCM.
const NONCE_SIZE: usize = 12;

/// Encryption errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Blob written under unknown key id {0}")]
    UnknownKeyId(u8),

    #[error("Invalid encrypted data format")]
    InvalidFormat,

    #[error("Hex decoding failed: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("Too many retired secrets (at most 255)")]
    TooManyKeys,
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Derive a 32-byte AES key from an operator secret via HKDF-SHA256.
fn derive_cipher(secret: &str) -> CryptoResult<Aes256Gcm> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
    let mut key = [0u8; 32];
    hk.expand(HKDF_INFO, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    key.zeroize();

    Ok(cipher)
}

/// Cipher handle for credential fields.
///
/// Holds the active encryption key plus any retired keys kept around for
/// decrypting blobs written before a rotation. Every blob carries a
/// one-byte key id prefix; new blobs always use the active key.
///
/// Blob layout, hex-encoded for database storage:
/// `key_id(1) || nonce(12) || ciphertext || tag(16)`
#[derive(Clone)]
pub struct SecretCipher {
    /// Ciphers indexed by key id; the last entry is the active key.
    ciphers: Vec<Aes256Gcm>,
}

impl SecretCipher {
    /// Build a cipher from the operator master secret plus any retired
    /// secrets, oldest first.
    ///
    /// Rotation works by moving the previous master secret into the
    /// retired list: old blobs keep their key id and stay decryptable,
    /// and are re-encrypted under the active key whenever they are next
    /// written.
    pub fn new(master_secret: &str, retired_secrets: &[String]) -> CryptoResult<Self> {
        if retired_secrets.len() >= usize::from(u8::MAX) {
            return Err(CryptoError::TooManyKeys);
        }

        let mut ciphers = Vec::with_capacity(retired_secrets.len() + 1);
        for secret in retired_secrets {
            ciphers.push(derive_cipher(secret)?);
        }
        ciphers.push(derive_cipher(master_secret)?);

        Ok(Self { ciphers })
    }

    /// Key id new blobs are written under.
    #[must_use]
    pub fn active_key_id(&self) -> u8 {
        (self.ciphers.len() - 1) as u8
    }

    /// Encrypt a credential field under the active key.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let key_id = self.active_key_id();
        let cipher = &self.ciphers[usize::from(key_id)];

        // Random nonce per blob (12 bytes for GCM)
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        blob.push(key_id);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(hex::encode(blob))
    }

    /// Decrypt a blob produced by [`Self::encrypt`].
    ///
    /// Fails if the blob was written under a key this cipher does not
    /// hold, or if any byte of it has been altered (GCM tag check).
    pub fn decrypt(&self, blob: &str) -> CryptoResult<String> {
        let raw = hex::decode(blob)?;

        if raw.len() < 1 + NONCE_SIZE {
            return Err(CryptoError::InvalidFormat);
        }

        let key_id = raw[0];
        let cipher = self
            .ciphers
            .get(usize::from(key_id))
            .ok_or(CryptoError::UnknownKeyId(key_id))?;

        let (nonce_bytes, ciphertext) = raw[1..].split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {e}")))
    }
}
