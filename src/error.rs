use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("invalid base64 text: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("decrypted data is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("plaintext is {len} bytes, but at most {max} bytes fit this key size and padding")]
    PlaintextTooLarge { len: usize, max: usize },

    #[error("authentication failed: wrong key or tampered ciphertext")]
    AuthenticationFailure,

    #[error("invalid padding: wrong key or corrupted ciphertext")]
    Padding,

    #[error("invalid key material: {0}")]
    KeyFormat(String),

    #[error("decryption failed: wrong key, wrong padding scheme or corrupted ciphertext")]
    DecryptionFailure,

    #[error("OS random generator unavailable")]
    RandomGeneration,

    #[error("cipher backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("history entry {index} does not exist (history has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("history entry {id} is inconsistent: {reason}")]
    InvalidEntry { id: String, reason: &'static str },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to save history: {0:#}")]
    Persist(anyhow::Error),
}
