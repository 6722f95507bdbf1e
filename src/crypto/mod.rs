//! Cryptographic primitives for text encryption.
//!
//! Provides the algorithm catalog, the symmetric and RSA engines, the
//! key material codec and the randomness sources they draw from.

pub mod asymmetric;
pub mod catalog;
pub mod codec;
pub mod rng;
pub mod symmetric;

use zeroize::Zeroizing;

pub use catalog::{
    AlgorithmSelection, AsymmetricAlgorithm, BlockPadding, EncryptionType, ParseAlgorithmError,
    RsaKeySize, SymmetricAlgorithm, SymmetricParams, max_plaintext_len,
};
pub use rng::{OsRandom, SecureRandom, SeededRandom};

/// Length of every symmetric key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the nonce for AES-GCM and ChaCha20-Poly1305 (12 bytes).
pub const AEAD_NONCE_LEN: usize = 12;
/// Length of the authentication tag appended by AEAD modes (16 bytes).
pub const AEAD_TAG_LEN: usize = 16;
/// Length of the AES-CBC initialization vector (one AES block).
pub const CBC_IV_LEN: usize = 16;

/// Output of a single encryption.
///
/// The shape of `key_material` depends on the algorithm: the raw key for
/// AEAD modes, `key || iv` for AES-CBC, and a PKCS#1 DER private key for RSA.
pub struct EncryptionResult {
    pub ciphertext: Vec<u8>,
    pub key_material: Zeroizing<Vec<u8>>,
}
