use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::{
    AlgorithmSelection, AsymmetricAlgorithm, EncryptionType, RsaKeySize, SymmetricAlgorithm,
};
use crate::engine::SealedText;
use crate::error::LedgerError;
use crate::storage::LedgerBackend;

/// One completed encryption. Entries are never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntryRecord", into = "EntryRecord")]
pub struct HistoryEntry {
    id: Uuid,
    timestamp: DateTime<Utc>,
    plaintext: String,
    ciphertext: String,
    key_material: String,
    algorithm: AlgorithmSelection,
}

impl HistoryEntry {
    pub fn new(plaintext: &str, sealed: &SealedText, algorithm: AlgorithmSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            plaintext: plaintext.to_string(),
            ciphertext: sealed.ciphertext.clone(),
            key_material: sealed.key_material.to_string(),
            algorithm,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn plaintext(&self) -> &str {
        &self.plaintext
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn key_material(&self) -> &str {
        &self.key_material
    }

    pub fn algorithm(&self) -> AlgorithmSelection {
        self.algorithm
    }

    pub fn encryption_type(&self) -> EncryptionType {
        self.algorithm.encryption_type()
    }
}

/// Flat on-disk shape of a [`HistoryEntry`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    id: Uuid,
    timestamp: DateTime<Utc>,
    plain_text: String,
    encrypted_text: String,
    decryption_key: String,
    encryption_type: EncryptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    symmetric_algorithm: Option<SymmetricAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rsa_key_size: Option<RsaKeySize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asymmetric_algorithm: Option<AsymmetricAlgorithm>,
}

impl From<HistoryEntry> for EntryRecord {
    fn from(entry: HistoryEntry) -> Self {
        let (symmetric_algorithm, rsa_key_size, asymmetric_algorithm) = match entry.algorithm {
            AlgorithmSelection::Symmetric(algorithm) => (Some(algorithm), None, None),
            AlgorithmSelection::Asymmetric {
                algorithm,
                key_size,
            } => (None, Some(key_size), Some(algorithm)),
        };

        Self {
            id: entry.id,
            timestamp: entry.timestamp,
            encryption_type: entry.algorithm.encryption_type(),
            plain_text: entry.plaintext,
            encrypted_text: entry.ciphertext,
            decryption_key: entry.key_material,
            symmetric_algorithm,
            rsa_key_size,
            asymmetric_algorithm,
        }
    }
}

impl TryFrom<EntryRecord> for HistoryEntry {
    type Error = LedgerError;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        let algorithm = match (
            record.encryption_type,
            record.symmetric_algorithm,
            record.rsa_key_size,
            record.asymmetric_algorithm,
        ) {
            (EncryptionType::Symmetric, Some(algorithm), None, None) => {
                AlgorithmSelection::Symmetric(algorithm)
            }
            (EncryptionType::Asymmetric, None, Some(key_size), Some(algorithm)) => {
                AlgorithmSelection::Asymmetric {
                    algorithm,
                    key_size,
                }
            }
            _ => {
                return Err(LedgerError::InvalidEntry {
                    id: record.id.to_string(),
                    reason: "algorithm fields do not match the encryption type",
                });
            }
        };

        Ok(Self {
            id: record.id,
            timestamp: record.timestamp,
            plaintext: record.plain_text,
            ciphertext: record.encrypted_text,
            key_material: record.decryption_key,
            algorithm,
        })
    }
}

/// Past encryptions, newest first, mirrored to a [`LedgerBackend`].
///
/// Mutation goes through `&mut self`; share a ledger between threads by
/// wrapping it in a `Mutex`.
pub struct HistoryLedger<B: LedgerBackend> {
    entries: Vec<HistoryEntry>,
    backend: B,
}

impl<B: LedgerBackend> HistoryLedger<B> {
    /// Loads the persisted history.
    ///
    /// Missing or unreadable history is treated as empty.
    pub fn load(backend: B) -> Self {
        let entries = match backend.fetch() {
            Ok(Some(data)) => match serde_json::from_slice::<Vec<HistoryEntry>>(&data) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "history is unreadable, starting with an empty history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "history could not be loaded, starting with an empty history");
                Vec::new()
            }
        };

        info!(entries = entries.len(), "history loaded");
        Self { entries, backend }
    }

    /// Records `entry` as the newest one and persists the history.
    ///
    /// If persisting fails the entry stays in memory.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), LedgerError> {
        info!(id = %entry.id(), "recording history entry");
        self.entries.insert(0, entry);
        self.persist()
    }

    /// Removes the entries at `indices` in one batch and persists once.
    ///
    /// Positions refer to the current order. If any position is out of range
    /// nothing is removed.
    pub fn remove_at<I>(&mut self, indices: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = usize>,
    {
        let indices: BTreeSet<usize> = indices.into_iter().collect();
        let len = self.entries.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(LedgerError::IndexOutOfRange { index, len });
        }

        for &index in indices.iter().rev() {
            self.entries.remove(index);
        }

        info!(removed = indices.len(), "history entries removed");
        self.persist()
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn persist(&self) -> Result<(), LedgerError> {
        let data = Zeroizing::new(serde_json::to_vec(&self.entries)?);
        self.backend.persist(&data).map_err(LedgerError::Persist)
    }
}
