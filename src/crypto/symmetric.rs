//! AES-256-GCM, ChaCha20-Poly1305 and AES-256-CBC with ephemeral keys.
//!
//! AEAD output is `nonce (12) || ciphertext || tag (16)`. AES-CBC output is the
//! bare ciphertext; its IV travels in the key material as `key || iv`.

use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use aes_gcm::Aes256Gcm;
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use chacha20poly1305::ChaCha20Poly1305;
use tracing::debug;
use zeroize::Zeroizing;

use super::rng::{SecureRandom, random_bytes};
use super::{AEAD_NONCE_LEN, AEAD_TAG_LEN, EncryptionResult, KEY_LEN, SymmetricAlgorithm};
use crate::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt under a freshly generated key.
///
/// Every call draws a new key and a new nonce or IV, so identical inputs never
/// produce identical output.
pub fn encrypt(
    plaintext: &[u8],
    algorithm: SymmetricAlgorithm,
    rng: &mut dyn SecureRandom,
) -> Result<EncryptionResult, CryptoError> {
    let params = algorithm.params();
    let key = random_bytes(rng, params.key_len)?;
    let nonce = random_bytes(rng, params.nonce_len)?;

    debug!(%algorithm, plaintext_len = plaintext.len(), "symmetric encrypt");

    match algorithm {
        SymmetricAlgorithm::AesGcm => Ok(EncryptionResult {
            ciphertext: seal::<Aes256Gcm>(&key, &nonce, plaintext)?,
            key_material: key,
        }),
        SymmetricAlgorithm::ChaCha20Poly1305 => Ok(EncryptionResult {
            ciphertext: seal::<ChaCha20Poly1305>(&key, &nonce, plaintext)?,
            key_material: key,
        }),
        SymmetricAlgorithm::AesCbc => {
            let ciphertext = Aes256CbcEnc::new_from_slices(&key, &nonce)
                .map_err(|_| CryptoError::Backend("invalid AES-CBC key or IV length".into()))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

            let mut key_material = Zeroizing::new(Vec::with_capacity(algorithm.key_material_len()));
            key_material.extend_from_slice(&key);
            key_material.extend_from_slice(&nonce);

            Ok(EncryptionResult {
                ciphertext,
                key_material,
            })
        }
    }
}

/// Decrypt with the key material returned by [`encrypt`].
pub fn decrypt(
    ciphertext: &[u8],
    key_material: &[u8],
    algorithm: SymmetricAlgorithm,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let expected = algorithm.key_material_len();
    if key_material.len() != expected {
        return Err(CryptoError::KeyFormat(format!(
            "{algorithm} expects {expected} bytes of key material, got {}",
            key_material.len()
        )));
    }

    debug!(%algorithm, ciphertext_len = ciphertext.len(), "symmetric decrypt");

    match algorithm {
        SymmetricAlgorithm::AesGcm => open::<Aes256Gcm>(key_material, ciphertext),
        SymmetricAlgorithm::ChaCha20Poly1305 => open::<ChaCha20Poly1305>(key_material, ciphertext),
        SymmetricAlgorithm::AesCbc => {
            let (key, iv) = key_material.split_at(KEY_LEN);
            // CBC carries no tag: a tampered ciphertext with valid padding
            // decrypts to garbage instead of failing.
            Aes256CbcDec::new_from_slices(key, iv)
                .map_err(|_| CryptoError::KeyFormat("invalid AES-CBC key or IV length".into()))?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map(Zeroizing::new)
                .map_err(|_| CryptoError::Padding)
        }
    }
}

fn seal<C: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::Backend("invalid AEAD key length".into()))?;

    let sealed = cipher
        .encrypt(Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Backend("AEAD encryption failed".into()))?;

    let mut out = Vec::with_capacity(nonce.len() + sealed.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

fn open<C: Aead + KeyInit>(key: &[u8], combined: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if combined.len() < AEAD_NONCE_LEN + AEAD_TAG_LEN {
        return Err(CryptoError::AuthenticationFailure);
    }

    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::KeyFormat("invalid AEAD key length".into()))?;
    let (nonce, sealed) = combined.split_at(AEAD_NONCE_LEN);

    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), sealed)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::rng::{FailingRandom, OsRandom, SeededRandom};

    fn sample_texts() -> Vec<Vec<u8>> {
        vec![
            Vec::new(),
            b"x".to_vec(),
            "grüße, 世界".as_bytes().to_vec(),
            "lorem ipsum dolor sit amet ".repeat(300).into_bytes(),
        ]
    }

    #[test]
    fn roundtrip_all_algorithms() {
        for algorithm in SymmetricAlgorithm::ALL {
            for text in sample_texts() {
                let result = encrypt(&text, algorithm, &mut OsRandom).unwrap();
                let plaintext = decrypt(&result.ciphertext, &result.key_material, algorithm).unwrap();
                assert_eq!(*plaintext, text, "{algorithm} with {} bytes", text.len());
            }
        }
    }

    #[test]
    fn output_shapes() {
        let text = b"sixteen byte msg";

        let gcm = encrypt(text, SymmetricAlgorithm::AesGcm, &mut OsRandom).unwrap();
        assert_eq!(gcm.ciphertext.len(), AEAD_NONCE_LEN + text.len() + AEAD_TAG_LEN);
        assert_eq!(gcm.key_material.len(), KEY_LEN);

        let cbc = encrypt(text, SymmetricAlgorithm::AesCbc, &mut OsRandom).unwrap();
        // a full block of padding is appended to block-aligned input
        assert_eq!(cbc.ciphertext.len(), 32);
        assert_eq!(cbc.key_material.len(), 48);
    }

    #[test]
    fn encryption_is_not_deterministic() {
        for algorithm in SymmetricAlgorithm::ALL {
            let a = encrypt(b"same text", algorithm, &mut OsRandom).unwrap();
            let b = encrypt(b"same text", algorithm, &mut OsRandom).unwrap();
            assert_ne!(a.ciphertext, b.ciphertext);
            assert_ne!(*a.key_material, *b.key_material);
        }
    }

    #[test]
    fn seeded_source_reproduces_output() {
        let a = encrypt(b"fixture", SymmetricAlgorithm::AesGcm, &mut SeededRandom::new(42)).unwrap();
        let b = encrypt(b"fixture", SymmetricAlgorithm::AesGcm, &mut SeededRandom::new(42)).unwrap();
        assert_eq!(a.ciphertext, b.ciphertext);
        assert_eq!(*a.key_material, *b.key_material);
    }

    #[test]
    fn tampering_is_detected_by_aead_modes() {
        for algorithm in [SymmetricAlgorithm::AesGcm, SymmetricAlgorithm::ChaCha20Poly1305] {
            let result = encrypt(b"attack at dawn", algorithm, &mut OsRandom).unwrap();
            for position in 0..result.ciphertext.len() {
                let mut tampered = result.ciphertext.clone();
                tampered[position] ^= 0x01;
                assert!(
                    matches!(
                        decrypt(&tampered, &result.key_material, algorithm),
                        Err(CryptoError::AuthenticationFailure)
                    ),
                    "{algorithm}: flip at byte {position} was not detected"
                );
            }
        }
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let result = encrypt(b"secret", SymmetricAlgorithm::ChaCha20Poly1305, &mut OsRandom).unwrap();
        let other_key = [7u8; KEY_LEN];
        assert!(matches!(
            decrypt(&result.ciphertext, &other_key, SymmetricAlgorithm::ChaCha20Poly1305),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn truncated_aead_blob_fails_authentication() {
        let key = [1u8; KEY_LEN];
        assert!(matches!(
            decrypt(&[0u8; 27], &key, SymmetricAlgorithm::AesGcm),
            Err(CryptoError::AuthenticationFailure)
        ));
    }

    #[test]
    fn wrong_key_length_is_a_key_format_error() {
        let result = encrypt(b"secret", SymmetricAlgorithm::AesCbc, &mut OsRandom).unwrap();
        for len in [0, 32, 47, 49, 64] {
            let material = vec![0u8; len];
            assert!(
                matches!(
                    decrypt(&result.ciphertext, &material, SymmetricAlgorithm::AesCbc),
                    Err(CryptoError::KeyFormat(_))
                ),
                "length {len} accepted"
            );
        }

        assert!(matches!(
            decrypt(&[0u8; 40], &[0u8; 16], SymmetricAlgorithm::AesGcm),
            Err(CryptoError::KeyFormat(_))
        ));
    }

    #[test]
    fn cbc_rejects_misaligned_ciphertext() {
        let result = encrypt(b"secret", SymmetricAlgorithm::AesCbc, &mut OsRandom).unwrap();
        let truncated = &result.ciphertext[..result.ciphertext.len() - 1];
        assert!(matches!(
            decrypt(truncated, &result.key_material, SymmetricAlgorithm::AesCbc),
            Err(CryptoError::Padding)
        ));
    }

    #[test]
    fn cbc_wrong_key_is_caught_by_padding_or_yields_garbage() {
        let result = encrypt(b"secret", SymmetricAlgorithm::AesCbc, &mut OsRandom).unwrap();
        let mut material = result.key_material.clone();
        material[0] ^= 0xff;
        match decrypt(&result.ciphertext, &material, SymmetricAlgorithm::AesCbc) {
            Err(CryptoError::Padding) => {}
            Ok(garbage) => assert_ne!(*garbage, b"secret"),
            Err(other) => panic!("expected Padding, got: {other:?}"),
        }
    }

    #[test]
    fn failing_random_source_aborts_encryption() {
        for algorithm in SymmetricAlgorithm::ALL {
            assert!(matches!(
                encrypt(b"secret", algorithm, &mut FailingRandom),
                Err(CryptoError::RandomGeneration)
            ));
        }
    }
}
