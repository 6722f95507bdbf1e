//! Encryption preferences, passed explicitly into every operation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crypto::{
    AlgorithmSelection, AsymmetricAlgorithm, EncryptionType, RsaKeySize, SymmetricAlgorithm,
};
use crate::storage::Storage;

/// Which algorithm `encrypt` uses for each encryption type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptionSettings {
    pub symmetric: SymmetricAlgorithm,
    pub asymmetric: AsymmetricAlgorithm,
    pub rsa_key_size: RsaKeySize,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            symmetric: SymmetricAlgorithm::AesGcm,
            asymmetric: AsymmetricAlgorithm::RsaPkcs1v15,
            rsa_key_size: RsaKeySize::Bits2048,
        }
    }
}

impl EncryptionSettings {
    pub fn selection(&self, kind: EncryptionType) -> AlgorithmSelection {
        match kind {
            EncryptionType::Symmetric => AlgorithmSelection::Symmetric(self.symmetric),
            EncryptionType::Asymmetric => AlgorithmSelection::Asymmetric {
                algorithm: self.asymmetric,
                key_size: self.rsa_key_size,
            },
        }
    }

    /// Reads settings from `storage`, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn load(storage: &Storage) -> Self {
        let parsed = storage.read().and_then(|data| match data {
            Some(data) => serde_json::from_slice::<Self>(&data)
                .map(Some)
                .context("invalid settings file"),
            None => Ok(None),
        });

        match parsed {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(path = %storage.path().display(), error = %reason, "ignoring unreadable settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &Storage) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        storage
            .write(&data)
            .with_context(|| format!("failed to write {}", storage.path().display()))
    }
}
