//! Encryption at rest for player names

mod name_cipher;

pub use name_cipher::{CipherError, NameCipher};
