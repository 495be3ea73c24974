//! Filesystem-backed external cache.
//!
//! Each key is stored as its own gzip-compressed JSON file. Writes go to a
//! temp file first and are renamed into place, so an interrupted write never
//! leaves a corrupt entry behind. Corrupt entries found on read are removed
//! and reported as a miss.

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;

use super::ExternalCache;
use crate::config;
use crate::error::{CatalogError, Result};

struct Inner {
    cache_dir: PathBuf,
    max_age: Option<Duration>,
}

/// [`ExternalCache`] persisting entries under a directory.
///
/// Blocking filesystem work runs on the Tokio blocking pool via
/// [`tokio::task::spawn_blocking`].
#[derive(Clone)]
pub struct FileCache {
    inner: Arc<Inner>,
}

impl FileCache {
    /// Create a file cache rooted at `cache_dir`.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache
    /// directory. Creates the directory if it does not exist.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            inner: Arc::new(Inner {
                cache_dir: dir,
                max_age: None,
            }),
        })
    }

    /// Treat entries older than `max_age` as misses (and delete them).
    pub fn with_max_age(self, max_age: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache_dir: self.inner.cache_dir.clone(),
                max_age: Some(max_age),
            }),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        let dir = &self.inner.cache_dir;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Inner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| CatalogError::Cache(format!("Task join error: {e}")))?
    }
}

impl Inner {
    fn path_for(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json.gz", encode_key(key)))
    }

    fn is_expired(&self, path: &Path) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age >= max_age)
    }

    fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        if self.is_expired(&path) {
            tracing::debug!(key, "Cache file expired, removing");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        let file = fs::File::open(&path)?;
        let mut contents = String::new();
        let parsed = BufReader::new(GzDecoder::new(BufReader::new(file)))
            .read_to_string(&mut contents)
            .map_err(CatalogError::from)
            .and_then(|_| serde_json::from_str(&contents).map_err(CatalogError::from));

        match parsed {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt cache file, removing");
                let _ = fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        let dest = self.path_for(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        {
            let mut encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
            serde_json::to_writer(&mut encoder, value)?;
            encoder.finish()?.flush()?;
        }
        tmp.persist(&dest).map_err(|e| CatalogError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl ExternalCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = key.to_string();
        self.blocking(move |inner| inner.read(&key)).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<bool> {
        let key = key.to_string();
        self.blocking(move |inner| inner.write(&key, &value).map(|_| true))
            .await
    }

    async fn set_multiple(&self, items: HashMap<String, Value>) -> Result<bool> {
        self.blocking(move |inner| {
            for (key, value) in &items {
                inner.write(key, value)?;
            }
            Ok(true)
        })
        .await
    }
}

/// Map an arbitrary key onto a safe file name: ASCII alphanumerics, `-` and
/// `_` pass through; every other byte becomes `%XX`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
