//! Player-name codec
//!
//! Names are stored as `enc:` + base64(nonce || ciphertext) when a key is
//! configured. Values without the prefix are returned as-is, so rows written
//! before encryption was enabled stay readable.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

const PREFIX: &str = "enc:";
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Codec applied to player names on their way in and out of the store
#[derive(Default)]
pub enum NameCipher {
    #[default]
    Identity,
    Aes256Gcm(Box<Aes256Gcm>),
}

impl NameCipher {
    /// Identity codec without a key, AES-256-GCM with one
    pub fn from_key(key: Option<&str>) -> Result<Self, CipherError> {
        let Some(key) = key else {
            return Ok(Self::Identity);
        };
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
        Ok(Self::Aes256Gcm(Box::new(cipher)))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Aes256Gcm(_))
    }

    pub fn encode(&self, plain: &str) -> Result<String, CipherError> {
        match self {
            Self::Identity => Ok(plain.to_string()),
            Self::Aes256Gcm(cipher) => {
                let mut nonce = [0u8; NONCE_LEN];
                rand::thread_rng().fill_bytes(&mut nonce);
                let ciphertext = cipher
                    .encrypt(Nonce::from_slice(&nonce), plain.as_bytes())
                    .map_err(|_| CipherError::Encrypt)?;

                let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
                sealed.extend_from_slice(&nonce);
                sealed.extend_from_slice(&ciphertext);
                Ok(format!("{PREFIX}{}", STANDARD.encode(sealed)))
            }
        }
    }

    pub fn decode(&self, stored: &str) -> Result<String, CipherError> {
        let Some(encoded) = stored.strip_prefix(PREFIX) else {
            return Ok(stored.to_string());
        };
        let Self::Aes256Gcm(cipher) = self else {
            return Err(CipherError::MissingKey);
        };

        let sealed = STANDARD
            .decode(encoded)
            .map_err(|e| CipherError::Decode(e.to_string()))?;
        if sealed.len() < NONCE_LEN {
            return Err(CipherError::Decode("ciphertext too short".to_string()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plain).map_err(|e| CipherError::Decode(e.to_string()))
    }
}

impl fmt::Debug for NameCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("NameCipher::Identity"),
            Self::Aes256Gcm(_) => f.write_str("NameCipher::Aes256Gcm"),
        }
    }
}

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Encryption key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encrypted value found but no encryption key is configured")]
    MissingKey,

    #[error("Failed to encrypt value")]
    Encrypt,

    #[error("Failed to decrypt value")]
    Decrypt,

    #[error("Malformed encrypted value: {0}")]
    Decode(String),
}
