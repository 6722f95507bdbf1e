//! Text in, text out: the boundary the front end talks to.
//!
//! Plaintext is UTF-8 text; ciphertext and key material travel as base64.

use zeroize::Zeroizing;

use crate::crypto::{AlgorithmSelection, SecureRandom, asymmetric, codec, symmetric};
use crate::error::CryptoError;

/// Base64 ciphertext plus the base64 key material needed to open it.
#[derive(Clone)]
pub struct SealedText {
    pub ciphertext: String,
    pub key_material: Zeroizing<String>,
}

/// Encrypt non-empty text with the selected algorithm.
pub fn encrypt(
    plaintext: &str,
    selection: AlgorithmSelection,
    rng: &mut dyn SecureRandom,
) -> Result<SealedText, CryptoError> {
    if plaintext.is_empty() {
        return Err(CryptoError::EmptyInput("plaintext"));
    }

    let result = match selection {
        AlgorithmSelection::Symmetric(algorithm) => {
            symmetric::encrypt(plaintext.as_bytes(), algorithm, rng)?
        }
        AlgorithmSelection::Asymmetric {
            algorithm,
            key_size,
        } => asymmetric::encrypt(plaintext.as_bytes(), algorithm, key_size, rng)?,
    };

    Ok(SealedText {
        ciphertext: codec::encode(&result.ciphertext),
        key_material: Zeroizing::new(codec::encode(&result.key_material)),
    })
}

/// Decrypt base64 ciphertext with base64 key material.
///
/// For RSA selections only the padding scheme is used; the key size comes from
/// the key material.
pub fn decrypt(
    ciphertext: &str,
    key_material: &str,
    selection: AlgorithmSelection,
) -> Result<Zeroizing<String>, CryptoError> {
    if ciphertext.trim().is_empty() {
        return Err(CryptoError::EmptyInput("ciphertext"));
    }
    if key_material.trim().is_empty() {
        return Err(CryptoError::EmptyInput("decryption key"));
    }

    let ciphertext = codec::decode(ciphertext)?;
    let key = Zeroizing::new(codec::decode(key_material)?);

    let plaintext = match selection {
        AlgorithmSelection::Symmetric(algorithm) => symmetric::decrypt(&ciphertext, &key, algorithm)?,
        AlgorithmSelection::Asymmetric { algorithm, .. } => {
            asymmetric::decrypt(&ciphertext, &key, algorithm)?
        }
    };

    let text = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::InvalidUtf8)?;
    Ok(Zeroizing::new(text.to_owned()))
}
