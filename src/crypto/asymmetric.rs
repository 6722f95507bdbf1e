//! RSA encryption under an ephemeral key pair.
//!
//! Each call generates a fresh key pair, encrypts a single block under the
//! public key and hands back the private key as PKCS#1 DER. Nothing is kept
//! between calls.

use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use super::rng::{SecureRandom, key_pair_rng};
use super::{AsymmetricAlgorithm, EncryptionResult, RsaKeySize, max_plaintext_len};
use crate::error::CryptoError;

/// Encrypt `plaintext` under a newly generated RSA key pair.
///
/// # Errors
///
/// Returns [`CryptoError::PlaintextTooLarge`] if the plaintext does not fit a
/// single block for the chosen padding. Input is never truncated.
pub fn encrypt(
    plaintext: &[u8],
    algorithm: AsymmetricAlgorithm,
    key_size: RsaKeySize,
    rng: &mut dyn SecureRandom,
) -> Result<EncryptionResult, CryptoError> {
    let max = max_plaintext_len(algorithm, key_size);
    if plaintext.len() > max {
        return Err(CryptoError::PlaintextTooLarge {
            len: plaintext.len(),
            max,
        });
    }

    let mut rng = key_pair_rng(rng)?;

    debug!(%algorithm, bits = key_size.bits(), "generating ephemeral RSA key pair");
    let private_key = RsaPrivateKey::new(&mut rng, key_size.bits())
        .map_err(|e| CryptoError::Backend(format!("RSA key generation failed: {e}")))?;
    let public_key = RsaPublicKey::from(&private_key);

    let ciphertext = match algorithm {
        AsymmetricAlgorithm::RsaPkcs1v15 => public_key.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext),
        AsymmetricAlgorithm::RsaOaepSha256 => {
            public_key.encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext)
        }
    }
    .map_err(|e| CryptoError::Backend(format!("RSA encryption failed: {e}")))?;
    drop(public_key);

    let der = private_key
        .to_pkcs1_der()
        .map_err(|e| CryptoError::KeyFormat(format!("cannot export private key: {e}")))?;

    Ok(EncryptionResult {
        ciphertext,
        key_material: Zeroizing::new(der.as_bytes().to_vec()),
    })
}

/// Decrypt with a PKCS#1 DER private key produced by [`encrypt`].
///
/// The key size is read from the key itself.
pub fn decrypt(
    ciphertext: &[u8],
    key_material: &[u8],
    algorithm: AsymmetricAlgorithm,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let private_key = RsaPrivateKey::from_pkcs1_der(key_material)
        .map_err(|e| CryptoError::KeyFormat(format!("not a PKCS#1 RSA private key: {e}")))?;

    debug!(%algorithm, ciphertext_len = ciphertext.len(), "RSA decrypt");

    let plaintext = match algorithm {
        AsymmetricAlgorithm::RsaPkcs1v15 => private_key.decrypt(Pkcs1v15Encrypt, ciphertext),
        AsymmetricAlgorithm::RsaOaepSha256 => private_key.decrypt(Oaep::new::<Sha256>(), ciphertext),
    }
    .map_err(|_| CryptoError::DecryptionFailure)?;

    Ok(Zeroizing::new(plaintext))
}
