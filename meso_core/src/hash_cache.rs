//! Persistent routine hash cache with file locking.
//!
//! Maps remote routine id to the SHA-256 of the last body successfully
//! written for it, stored as a flat JSON object. Entries are only recorded
//! after the write that produced them succeeded.

use crate::{Error, Result};
use fs2::FileExt;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Hex SHA-256 of the compact JSON encoding of `body`
pub fn content_hash<T: Serialize + ?Sized>(body: &T) -> Result<String> {
    let json = serde_json::to_vec(body)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(hex::encode(hasher.finalize()))
}

/// Routine id -> last written body hash
#[derive(Clone, Debug, Default)]
pub struct RoutineHashCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl RoutineHashCache {
    /// A cache that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache from a file with shared locking
    ///
    /// Returns an empty cache if the file doesn't exist.
    /// If the file is corrupted, logs a warning and starts empty.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cache = Self {
            path: Some(path.to_path_buf()),
            entries: BTreeMap::new(),
        };

        if !path.exists() {
            tracing::info!("No hash cache found at {:?}, starting empty", path);
            return Ok(cache);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open hash cache {:?}: {}. Starting empty.", path, e);
                return Ok(cache);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock hash cache {:?}: {}. Starting empty.", path, e);
            return Ok(cache);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read hash cache {:?}: {}. Starting empty.", path, e);
            return Ok(cache);
        }

        file.unlock()?;

        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => {
                tracing::debug!("Loaded {} routine hashes from {:?}", entries.len(), path);
                cache.entries = entries;
            }
            Err(e) => {
                tracing::warn!("Failed to parse hash cache {:?}: {}. Starting empty.", path, e);
            }
        }

        Ok(cache)
    }

    pub fn get(&self, routine_id: &str) -> Option<&str> {
        self.entries.get(routine_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the hash of a body that was just written, then persist
    pub fn record(&mut self, routine_id: &str, hash: &str) -> Result<()> {
        self.entries
            .insert(routine_id.to_string(), hash.to_string());
        self.save()
    }

    /// Atomically rewrite the cache file
    ///
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = NamedTempFile::new_in(dir)?;

        // Serialize concurrent writers on the temp file
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(&self.entries)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} routine hashes to {:?}", self.entries.len(), path);
        Ok(())
    }
}
