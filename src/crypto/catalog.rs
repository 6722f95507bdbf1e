//! Supported algorithms and their fixed parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AEAD_NONCE_LEN, AEAD_TAG_LEN, CBC_IV_LEN, KEY_LEN};

/// Returned when an algorithm, type or key size name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseAlgorithmError {
    kind: &'static str,
    value: String,
}

impl ParseAlgorithmError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Normalises user input so `AES-GCM`, `aes_gcm` and `aesgcm` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionType {
    #[serde(rename = "Symmetric")]
    Symmetric,
    #[serde(rename = "Asymmetric")]
    Asymmetric,
}

impl EncryptionType {
    pub fn label(self) -> &'static str {
        match self {
            EncryptionType::Symmetric => "Symmetric",
            EncryptionType::Asymmetric => "Asymmetric",
        }
    }
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EncryptionType {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "symmetric" | "sym" => Ok(EncryptionType::Symmetric),
            "asymmetric" | "asym" | "rsa" => Ok(EncryptionType::Asymmetric),
            _ => Err(ParseAlgorithmError::new("encryption type", s)),
        }
    }
}

/// Padding applied to the plaintext before a block cipher runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPadding {
    None,
    Pkcs7,
}

/// Fixed parameters of a symmetric algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricParams {
    pub key_len: usize,
    /// Nonce length for AEAD modes, IV length for CBC.
    pub nonce_len: usize,
    pub authenticated: bool,
    pub padding: BlockPadding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetricAlgorithm {
    #[serde(rename = "AES-GCM")]
    AesGcm,
    #[serde(rename = "ChaChaPoly")]
    ChaCha20Poly1305,
    #[serde(rename = "AES-CBC")]
    AesCbc,
}

impl SymmetricAlgorithm {
    pub const ALL: [SymmetricAlgorithm; 3] = [
        SymmetricAlgorithm::AesGcm,
        SymmetricAlgorithm::ChaCha20Poly1305,
        SymmetricAlgorithm::AesCbc,
    ];

    pub const fn params(self) -> SymmetricParams {
        match self {
            SymmetricAlgorithm::AesGcm | SymmetricAlgorithm::ChaCha20Poly1305 => SymmetricParams {
                key_len: KEY_LEN,
                nonce_len: AEAD_NONCE_LEN,
                authenticated: true,
                padding: BlockPadding::None,
            },
            SymmetricAlgorithm::AesCbc => SymmetricParams {
                key_len: KEY_LEN,
                nonce_len: CBC_IV_LEN,
                authenticated: false,
                padding: BlockPadding::Pkcs7,
            },
        }
    }

    /// Length of the key material handed back to the caller.
    ///
    /// AES-CBC ships the IV alongside the key, so its material is `key || iv`.
    pub const fn key_material_len(self) -> usize {
        let params = self.params();
        match self {
            SymmetricAlgorithm::AesCbc => params.key_len + params.nonce_len,
            _ => params.key_len,
        }
    }

    /// Smallest well-formed ciphertext for AEAD modes: nonce plus tag.
    pub const fn min_sealed_len(self) -> usize {
        let params = self.params();
        if params.authenticated {
            params.nonce_len + AEAD_TAG_LEN
        } else {
            0
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SymmetricAlgorithm::AesGcm => "AES-GCM",
            SymmetricAlgorithm::ChaCha20Poly1305 => "ChaChaPoly",
            SymmetricAlgorithm::AesCbc => "AES-CBC",
        }
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SymmetricAlgorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "aesgcm" | "aes256gcm" | "gcm" => Ok(SymmetricAlgorithm::AesGcm),
            "chachapoly" | "chacha20poly1305" | "chacha20" | "chacha" => {
                Ok(SymmetricAlgorithm::ChaCha20Poly1305)
            }
            "aescbc" | "aes256cbc" | "cbc" => Ok(SymmetricAlgorithm::AesCbc),
            _ => Err(ParseAlgorithmError::new("symmetric algorithm", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsymmetricAlgorithm {
    #[serde(rename = "RSA PKCS1")]
    RsaPkcs1v15,
    #[serde(rename = "RSA OAEP")]
    RsaOaepSha256,
}

impl AsymmetricAlgorithm {
    pub const ALL: [AsymmetricAlgorithm; 2] = [
        AsymmetricAlgorithm::RsaPkcs1v15,
        AsymmetricAlgorithm::RsaOaepSha256,
    ];

    /// Bytes of the modulus consumed by the padding scheme.
    ///
    /// OAEP with SHA-256 needs `2 * 32 + 2`.
    pub const fn padding_overhead(self) -> usize {
        match self {
            AsymmetricAlgorithm::RsaPkcs1v15 => 11,
            AsymmetricAlgorithm::RsaOaepSha256 => 66,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AsymmetricAlgorithm::RsaPkcs1v15 => "RSA PKCS1",
            AsymmetricAlgorithm::RsaOaepSha256 => "RSA OAEP",
        }
    }

    pub fn padding_name(self) -> &'static str {
        match self {
            AsymmetricAlgorithm::RsaPkcs1v15 => "PKCS#1 v1.5",
            AsymmetricAlgorithm::RsaOaepSha256 => "OAEP (SHA-256)",
        }
    }
}

impl fmt::Display for AsymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AsymmetricAlgorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "rsapkcs1" | "rsapkcs1v15" | "pkcs1" | "pkcs1v15" => {
                Ok(AsymmetricAlgorithm::RsaPkcs1v15)
            }
            "rsaoaep" | "rsaoaepsha256" | "oaep" | "oaepsha256" => {
                Ok(AsymmetricAlgorithm::RsaOaepSha256)
            }
            _ => Err(ParseAlgorithmError::new("asymmetric algorithm", s)),
        }
    }
}

/// RSA modulus sizes offered for ephemeral key pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RsaKeySize {
    #[default]
    Bits2048,
    Bits4096,
}

impl RsaKeySize {
    pub const ALL: [RsaKeySize; 2] = [RsaKeySize::Bits2048, RsaKeySize::Bits4096];

    pub const fn bits(self) -> usize {
        match self {
            RsaKeySize::Bits2048 => 2048,
            RsaKeySize::Bits4096 => 4096,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }
}

impl fmt::Display for RsaKeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl TryFrom<u32> for RsaKeySize {
    type Error = ParseAlgorithmError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            2048 => Ok(RsaKeySize::Bits2048),
            4096 => Ok(RsaKeySize::Bits4096),
            other => Err(ParseAlgorithmError::new("RSA key size", &other.to_string())),
        }
    }
}

impl From<RsaKeySize> for u32 {
    fn from(size: RsaKeySize) -> Self {
        size.bits() as u32
    }
}

impl FromStr for RsaKeySize {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits: u32 = s
            .trim()
            .parse()
            .map_err(|_| ParseAlgorithmError::new("RSA key size", s))?;
        RsaKeySize::try_from(bits)
    }
}

/// Largest plaintext, in bytes, that fits one RSA block with the given padding.
pub const fn max_plaintext_len(algorithm: AsymmetricAlgorithm, key_size: RsaKeySize) -> usize {
    key_size.bytes() - algorithm.padding_overhead()
}

/// The algorithm a caller picked for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmSelection {
    Symmetric(SymmetricAlgorithm),
    Asymmetric {
        algorithm: AsymmetricAlgorithm,
        key_size: RsaKeySize,
    },
}

impl AlgorithmSelection {
    pub fn encryption_type(&self) -> EncryptionType {
        match self {
            AlgorithmSelection::Symmetric(_) => EncryptionType::Symmetric,
            AlgorithmSelection::Asymmetric { .. } => EncryptionType::Asymmetric,
        }
    }
}

impl fmt::Display for AlgorithmSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmSelection::Symmetric(algorithm) => write!(f, "{algorithm}"),
            AlgorithmSelection::Asymmetric {
                algorithm,
                key_size,
            } => write!(f, "{algorithm} ({key_size}-bit)"),
        }
    }
}
