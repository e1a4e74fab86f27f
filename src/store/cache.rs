//! File-based cache for store query answers.
//!
//! Spawning the store query tool once per artifact dominates run time on a
//! full system closure, and most of the closure is shared between runs. Store
//! paths are immutable, so answers can be kept on disk between invocations.

use crate::error::{ClosureDiffError, Result};
use crate::utils::content_hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// The kind of question asked of the store.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    References,
    Outputs,
    Deriver,
}

impl QueryKind {
    /// Command-line flag selecting this query.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::References => "--references",
            Self::Outputs => "--outputs",
            Self::Deriver => "--deriver",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Cache key for a store query.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub kind: QueryKind,
    pub path: String,
}

impl CacheKey {
    pub fn new(kind: QueryKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Convert to a filesystem-safe filename.
    #[must_use]
    pub fn to_filename(&self) -> String {
        let hash = content_hash(format!("{}|{}", self.kind, self.path).as_bytes());
        format!("{hash:016x}.json")
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    kind: QueryKind,
    path: String,
    lines: Vec<String>,
}

/// File-based cache with TTL support.
pub struct FileCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    /// Create a new file cache, creating the directory if needed.
    pub fn new(cache_dir: PathBuf, ttl: Duration) -> Result<Self> {
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)
                .map_err(|e| ClosureDiffError::io(&cache_dir, e))?;
        }
        Ok(Self { cache_dir, ttl })
    }

    /// Get cached answer lines for a key.
    ///
    /// Returns None if not cached, expired, or recorded for a different key
    /// (hash collision).
    pub fn get(&self, key: &CacheKey) -> Option<Vec<String>> {
        let path = self.cache_dir.join(key.to_filename());

        let metadata = fs::metadata(&path).ok()?;
        let age = metadata.modified().ok()?.elapsed().ok()?;
        if age > self.ttl {
            let _ = fs::remove_file(&path);
            return None;
        }

        let data = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&data).ok()?;
        (entry.kind == key.kind && entry.path == key.path).then_some(entry.lines)
    }

    /// Store answer lines in the cache.
    pub fn set(&self, key: &CacheKey, lines: &[String]) -> Result<()> {
        let path = self.cache_dir.join(key.to_filename());
        let entry = CacheEntry {
            kind: key.kind,
            path: key.path.clone(),
            lines: lines.to_vec(),
        };
        let data = serde_json::to_string(&entry)?;
        fs::write(&path, data).map_err(|e| ClosureDiffError::io(path, e))?;
        Ok(())
    }

    /// Clear all cached entries.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            for entry in fs::read_dir(&self.cache_dir)? {
                let entry = entry?;
                if entry.path().extension().is_some_and(|e| e == "json") {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }
        Ok(())
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return stats;
        };
        for entry in entries.flatten() {
            if !entry.path().extension().is_some_and(|e| e == "json") {
                continue;
            }
            stats.total_entries += 1;
            if let Ok(metadata) = entry.metadata() {
                stats.total_size += metadata.len();
                let expired = metadata
                    .modified()
                    .ok()
                    .and_then(|m| m.elapsed().ok())
                    .is_some_and(|age| age > self.ttl);
                if expired {
                    stats.expired_entries += 1;
                }
            }
        }

        stats
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Total number of cached entries
    pub total_entries: usize,
    /// Number of expired entries
    pub expired_entries: usize,
    /// Total size in bytes
    pub total_size: u64,
}
