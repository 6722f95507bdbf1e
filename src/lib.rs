pub mod capability;
pub mod crypto;
pub mod engine;
mod error;
pub mod history;
mod settings;
mod storage;

pub use crate::crypto::{
    AlgorithmSelection, AsymmetricAlgorithm, EncryptionType, OsRandom, RsaKeySize, SecureRandom,
    SeededRandom, SymmetricAlgorithm, max_plaintext_len,
};
pub use crate::engine::SealedText;
pub use crate::error::{CryptoError, LedgerError};
pub use crate::history::{HistoryEntry, HistoryLedger};
pub use crate::settings::EncryptionSettings;
pub use crate::storage::{LedgerBackend, MemoryStorage, Storage};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::warn;
use zeroize::Zeroizing;

/// An encryption session: settings, a randomness source and the history.
pub struct Textcrypt<B: LedgerBackend = Storage> {
    ledger: HistoryLedger<B>,
    settings: EncryptionSettings,
    rng: Box<dyn SecureRandom>,
}

impl<B: LedgerBackend> Textcrypt<B> {
    pub fn open(backend: B, settings: EncryptionSettings) -> Self {
        Self::with_rng(backend, settings, Box::new(OsRandom))
    }

    pub fn with_rng(backend: B, settings: EncryptionSettings, rng: Box<dyn SecureRandom>) -> Self {
        Self {
            ledger: HistoryLedger::load(backend),
            settings,
            rng,
        }
    }

    /// Encrypts with the algorithm the settings pick for `kind`.
    pub fn encrypt(
        &mut self,
        plaintext: &str,
        kind: EncryptionType,
    ) -> Result<SealedText, CryptoError> {
        let selection = self.settings.selection(kind);
        self.encrypt_with(plaintext, selection)
    }

    /// Encrypts and records the operation in the history.
    ///
    /// Failed encryptions are never recorded. Saving the history is best
    /// effort: a failed write is logged and the ciphertext is still returned.
    pub fn encrypt_with(
        &mut self,
        plaintext: &str,
        selection: AlgorithmSelection,
    ) -> Result<SealedText, CryptoError> {
        let sealed = engine::encrypt(plaintext, selection, self.rng.as_mut())?;

        let entry = HistoryEntry::new(plaintext, &sealed, selection);
        if let Err(e) = self.ledger.append(entry) {
            warn!(error = %e, "encryption succeeded but the history could not be saved");
        }

        Ok(sealed)
    }

    pub fn decrypt(
        &self,
        ciphertext: &str,
        key_material: &str,
        selection: AlgorithmSelection,
    ) -> Result<Zeroizing<String>, CryptoError> {
        engine::decrypt(ciphertext, key_material, selection)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.ledger.list()
    }

    pub fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.ledger.get(index)
    }

    pub fn remove_history<I>(&mut self, indices: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = usize>,
    {
        self.ledger.remove_at(indices)
    }

    pub fn settings(&self) -> &EncryptionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EncryptionSettings) {
        self.settings = settings;
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "textcrypt").context("could not determine platform directories")
}

pub fn default_history_storage() -> Result<Storage> {
    Ok(Storage::new(project_dirs()?.data_dir().join("history.json")))
}

pub fn default_settings_storage() -> Result<Storage> {
    Ok(Storage::new(project_dirs()?.config_dir().join("settings.json")))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn session(memory: &MemoryStorage) -> Textcrypt<&MemoryStorage> {
        Textcrypt::open(memory, EncryptionSettings::default())
    }

    #[test]
    fn encrypt_records_history_and_decrypts() {
        let memory = MemoryStorage::new();
        let mut tc = session(&memory);

        let sealed = tc.encrypt("top secret", EncryptionType::Symmetric).unwrap();

        assert_eq!(tc.history().len(), 1);
        let entry = tc.entry(0).unwrap();
        assert_eq!(entry.plaintext(), "top secret");
        assert_eq!(entry.ciphertext(), sealed.ciphertext);
        assert_eq!(entry.key_material(), sealed.key_material.as_str());
        assert_eq!(
            entry.algorithm(),
            AlgorithmSelection::Symmetric(SymmetricAlgorithm::AesGcm)
        );

        let plaintext = tc
            .decrypt(entry.ciphertext(), entry.key_material(), entry.algorithm())
            .unwrap();
        assert_eq!(plaintext.as_str(), "top secret");
    }

    #[test]
    fn failed_encryption_is_not_recorded() {
        let memory = MemoryStorage::new();
        let mut tc = session(&memory);

        assert!(tc.encrypt("", EncryptionType::Symmetric).is_err());

        let too_long = "x".repeat(300);
        assert!(matches!(
            tc.encrypt(&too_long, EncryptionType::Asymmetric),
            Err(CryptoError::PlaintextTooLarge { .. })
        ));

        assert!(tc.history().is_empty());
        assert_eq!(memory.writes(), 0);
    }

    #[test]
    fn settings_pick_the_algorithm() {
        let memory = MemoryStorage::new();
        let mut tc = session(&memory);
        tc.set_settings(EncryptionSettings {
            symmetric: SymmetricAlgorithm::AesCbc,
            ..EncryptionSettings::default()
        });

        let sealed = tc.encrypt("cbc please", EncryptionType::Symmetric).unwrap();
        assert_eq!(
            tc.entry(0).unwrap().algorithm(),
            AlgorithmSelection::Symmetric(SymmetricAlgorithm::AesCbc)
        );
        assert_eq!(crypto::codec::decode(&sealed.key_material).unwrap().len(), 48);
    }

    #[test]
    fn remove_history_deletes_entries() {
        let memory = MemoryStorage::new();
        let mut tc = session(&memory);
        tc.encrypt("A", EncryptionType::Symmetric).unwrap();
        tc.encrypt("B", EncryptionType::Symmetric).unwrap();

        tc.remove_history([1]).unwrap();
        assert_eq!(tc.history().len(), 1);
        assert_eq!(tc.history()[0].plaintext(), "B");
        assert!(tc.remove_history([3]).is_err());
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let first = MemoryStorage::new();
        let second = MemoryStorage::new();
        let settings = EncryptionSettings::default();

        let mut a = Textcrypt::with_rng(&first, settings, Box::new(SeededRandom::new(1)));
        let mut b = Textcrypt::with_rng(&second, settings, Box::new(SeededRandom::new(1)));

        let sealed_a = a.encrypt("fixture", EncryptionType::Symmetric).unwrap();
        let sealed_b = b.encrypt("fixture", EncryptionType::Symmetric).unwrap();
        assert_eq!(sealed_a.ciphertext, sealed_b.ciphertext);
        assert_eq!(sealed_a.key_material, sealed_b.key_material);
    }

    #[test]
    fn history_persists_across_sessions() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("history.json"));

        let mut tc = Textcrypt::open(storage.clone(), EncryptionSettings::default());
        tc.encrypt("remember me", EncryptionType::Symmetric).unwrap();

        let reopened = Textcrypt::open(storage, EncryptionSettings::default());
        assert_eq!(reopened.history().len(), 1);
        assert_eq!(reopened.history()[0].plaintext(), "remember me");
    }

    #[test]
    fn unwritable_history_does_not_lose_the_ciphertext() {
        let dir = tempdir().unwrap();
        // a directory where the history file should be makes every write fail
        let path = dir.path().join("history.json");
        std::fs::create_dir(&path).unwrap();

        let mut tc = Textcrypt::open(Storage::new(path), EncryptionSettings::default());
        let sealed = tc.encrypt("still here", EncryptionType::Symmetric).unwrap();
        assert!(!sealed.ciphertext.is_empty());
        assert_eq!(tc.history().len(), 1);
    }
}
