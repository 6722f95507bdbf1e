//! Persistence backends for the history ledger and settings.

use anyhow::{Context, Result, anyhow};
use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Where the history ledger keeps its serialized form.
///
/// The ledger calls [`fetch`](LedgerBackend::fetch) once when it is opened and
/// [`persist`](LedgerBackend::persist) after every mutation.
pub trait LedgerBackend {
    /// Returns `None` if nothing has been persisted yet.
    fn fetch(&self) -> Result<Option<Vec<u8>>>;

    /// Replaces the persisted form with `data`.
    fn persist(&self, data: &[u8]) -> Result<()>;
}

impl<T: LedgerBackend + ?Sized> LedgerBackend for &T {
    fn fetch(&self) -> Result<Option<Vec<u8>>> {
        (**self).fetch()
    }

    fn persist(&self, data: &[u8]) -> Result<()> {
        (**self).persist(data)
    }
}

/// A single file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file. A missing file is `Ok(None)`.
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    /// Replaces the file contents with `data`, creating parent directories.
    ///
    /// The data goes to a sibling temp file which is synced and then moved
    /// over the target, so a crash leaves either the old or the new contents.
    /// The temp file is removed if any step fails.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp_path = self.temp_path()?;
        let written = write_synced(&tmp_path, data).and_then(|()| self.replace_with(&tmp_path));
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written?;

        if let Some(parent) = parent {
            File::open(parent)?.sync_all()?;
        }

        Ok(())
    }

    /// `.<file name>.<16 hex chars>.tmp` next to the target.
    fn temp_path(&self) -> Result<PathBuf> {
        let mut suffix = [0u8; 8];
        fill(&mut suffix).map_err(|e| anyhow!("failed to name temporary file: {e}"))?;

        let file_name = self
            .path
            .file_name()
            .context("storage path has no file name")?
            .to_string_lossy();

        let mut name = format!(".{file_name}.");
        for byte in suffix {
            name.push_str(&format!("{byte:02x}"));
        }
        name.push_str(".tmp");

        Ok(self.path.with_file_name(name))
    }

    #[cfg(target_os = "windows")]
    fn replace_with(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{
            MOVEFILE_REPLACE_EXISTING, MOVEFILE_WRITE_THROUGH, MoveFileExW,
        };

        fn wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target = wide(self.path.as_os_str());
        let source = wide(tmp_path.as_os_str());

        // SAFETY: both buffers are NUL-terminated UTF-16 and outlive the call.
        let ok = unsafe {
            MoveFileExW(
                source.as_ptr(),
                target.as_ptr(),
                MOVEFILE_REPLACE_EXISTING | MOVEFILE_WRITE_THROUGH,
            )
        };

        if ok == 0 {
            return Err(io::Error::last_os_error()).context("atomic replace failed");
        }
        Ok(())
    }

    /// `rename` is atomic within one filesystem.
    #[cfg(not(target_os = "windows"))]
    fn replace_with(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))
    }
}

fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .context("failed to create temporary file")?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

impl LedgerBackend for Storage {
    fn fetch(&self) -> Result<Option<Vec<u8>>> {
        self.read()
    }

    fn persist(&self, data: &[u8]) -> Result<()> {
        self.write(data)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// In-memory storage that counts how often it was written.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `data` as the already persisted form.
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(Some(data)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of completed [`persist`](LedgerBackend::persist) calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.lock().ok().and_then(|data| data.clone())
    }
}

impl LedgerBackend for MemoryStorage {
    fn fetch(&self) -> Result<Option<Vec<u8>>> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(data.clone())
    }

    fn persist(&self, data: &[u8]) -> Result<()> {
        let mut stored = self
            .data
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        *stored = Some(data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn read_of_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("history.json"));

        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("history.json"));

        storage.write(b"[]").unwrap();
        storage.write(br#"[{"id":1}]"#).unwrap();

        assert_eq!(storage.read().unwrap().unwrap(), br#"[{"id":1}]"#);
        assert_eq!(dir_listing(dir.path()), ["history.json"]);
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("data").join("textcrypt").join("history.json");

        Storage::new(nested.clone()).write(b"[]").unwrap();

        assert!(nested.exists());
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(Storage::new(path).write(b"[]").is_err());
        assert_eq!(dir_listing(dir.path()), ["history.json"]);
    }

    #[test]
    fn temp_paths_are_hidden_siblings() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("settings.json"));

        let a = storage.temp_path().unwrap();
        let b = storage.temp_path().unwrap();

        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir.path()));
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".settings.json."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn storage_backend_fetches_what_it_persisted() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("history.json"));

        assert!(storage.fetch().unwrap().is_none());
        storage.persist(b"[]").unwrap();
        assert_eq!(storage.fetch().unwrap().as_deref(), Some(&b"[]"[..]));
    }

    #[test]
    fn memory_storage_counts_writes() {
        let memory = MemoryStorage::new();
        assert!(memory.fetch().unwrap().is_none());

        memory.persist(b"one").unwrap();
        memory.persist(b"two").unwrap();

        assert_eq!(memory.writes(), 2);
        assert_eq!(memory.data().as_deref(), Some(&b"two"[..]));
    }

    #[test]
    fn memory_storage_with_data_is_not_a_write() {
        let memory = MemoryStorage::with_data(b"seed".to_vec());
        assert_eq!(memory.fetch().unwrap().as_deref(), Some(&b"seed"[..]));
        assert_eq!(memory.writes(), 0);
    }
}
