use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Durable key → blob storage for persisted window records.
pub trait RecordStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn read_record(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn write_record(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl RecordStore for FileStore {
    fn read_record(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_record(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        write_atomically(&self.path_for(key), bytes)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.write_all(b"\n")?;
    file.sync_all()?;

    // replaces any previous record in one step, so readers see the old file or the new one
    fs::rename(tmp, path)?;
    Ok(())
}

/// Process-local store for ephemeral hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: impl Into<Vec<u8>>) {
        self.records.lock().insert(key.to_string(), bytes.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.records.lock().get(key).cloned()
    }
}

impl RecordStore for MemoryStore {
    fn read_record(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.get(key))
    }

    fn write_record(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.insert(key, bytes);
        Ok(())
    }
}
