use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use thiserror::Error;

const NONCE_SIZE: usize = 12;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("Credential key must be 32 bytes (64 hex characters)")]
    InvalidKey,
}

/// Seals credential strings at rest with AES-256-GCM.
/// Output is hex of `nonce || ciphertext`.
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn from_hex_key(key_hex: &str) -> Result<Self, EncryptionError> {
        let key = hex::decode(key_hex.trim()).map_err(|_| EncryptionError::InvalidKey)?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| EncryptionError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn seal(&self, plain_text: &str) -> Result<String, EncryptionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plain_text.as_bytes())
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    pub fn open(&self, sealed_hex: &str) -> Result<String, EncryptionError> {
        let sealed = hex::decode(sealed_hex)
            .map_err(|e| EncryptionError::DecryptionFailed(format!("invalid hex: {e}")))?;
        if sealed.len() < NONCE_SIZE {
            return Err(EncryptionError::DecryptionFailed(
                "too short to contain a nonce".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plain)
            .map_err(|e| EncryptionError::DecryptionFailed(format!("invalid UTF-8: {e}")))
    }
}
