// Cache store for reading and writing cached data.
// Keeps a hashed-key TTL map in memory and mirrors it to one JSON snapshot file.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::paths::cache_file_path;

/// Default TTL for cached API aggregates: 90 seconds.
pub const DEFAULT_TTL: Duration = Duration::from_secs(90);

/// Shortest TTL an entry can be stored with.
pub const MINIMUM_TTL: Duration = Duration::from_secs(1);

static TEMP_FILE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Source of the current time, in fractional Unix epoch seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// A cached value together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedValue {
    pub expires_at_unix_epoch_seconds: f64,
    pub value: Value,
}

impl CachedValue {
    /// Check if this entry has expired at `now`.
    pub fn is_expired(&self, now: f64) -> bool {
        self.expires_at_unix_epoch_seconds <= now
    }
}

/// Hash a readable cache key into the form used in memory and on disk.
pub fn hash_cache_key(cache_key: &str) -> String {
    hex::encode(Sha256::digest(cache_key.as_bytes()))
}

/// Persistent key/value store with per-entry expiry.
///
/// The snapshot file is loaded lazily on first access and never re-read for
/// the lifetime of the instance. Every mutation rewrites the whole file.
/// Storage failures are logged and swallowed: the in-memory map stays
/// authoritative and callers never see a cache I/O error.
///
/// There is no locking, neither in-process nor across processes. Two
/// instances sharing one file clobber each other's snapshot (last writer
/// wins).
pub struct TtlCache {
    file_path: PathBuf,
    default_ttl: Duration,
    entries: HashMap<String, CachedValue>,
    loaded: bool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("file_path", &self.file_path)
            .field("default_ttl", &self.default_ttl)
            .field("entries", &self.entries.len())
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl TtlCache {
    /// Create a store whose snapshot lives in `dir`.
    ///
    /// The directory is created if missing; failure to do so is logged and
    /// the store then behaves as an in-memory cache.
    pub fn new(dir: impl AsRef<Path>, default_ttl: Duration) -> Self {
        let dir = dir.as_ref();
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(?dir, error = %e, "failed to create cache directory");
        }

        Self {
            file_path: cache_file_path(dir),
            default_ttl: default_ttl.max(MINIMUM_TTL),
            entries: HashMap::new(),
            loaded: false,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up `key`, evicting it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.load_if_needed();
        let hashed_key = hash_cache_key(key);

        let expired = self.entries.get(&hashed_key)?.is_expired(self.clock.now());
        if expired {
            debug!(key, "cache entry expired");
            self.entries.remove(&hashed_key);
            self.persist();
            return None;
        }

        self.entries.get(&hashed_key).map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` for `ttl` (the store default if `None`).
    pub fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) {
        self.load_if_needed();
        let ttl = ttl.unwrap_or(self.default_ttl).max(MINIMUM_TTL);

        self.entries.insert(
            hash_cache_key(key),
            CachedValue {
                expires_at_unix_epoch_seconds: self.clock.now() + ttl.as_secs_f64(),
                value,
            },
        );
        self.persist();
    }

    /// Drop every entry and delete the snapshot file.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.loaded = true;

        match fs::remove_file(&self.file_path) {
            Ok(()) => debug!(path = ?self.file_path, "cache file deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.file_path, error = %e, "failed to delete cache file"),
        }
    }

    /// Whether an entry for `key` is held in memory, without checking expiry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&hash_cache_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load_if_needed(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(path = ?self.file_path, error = %e, "failed to read cache file");
                return;
            }
        };

        let snapshot: HashMap<String, Value> = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = ?self.file_path, error = %e, "ignoring corrupt cache file");
                return;
            }
        };

        for (hashed_key, raw_entry) in snapshot {
            match serde_json::from_value::<CachedValue>(raw_entry) {
                Ok(entry) => {
                    self.entries.insert(hashed_key, entry);
                }
                Err(e) => debug!(hashed_key, error = %e, "skipping malformed cache entry"),
            }
        }
        debug!(entries = self.entries.len(), "loaded cache file");
    }

    fn persist(&self) {
        if let Err(e) = self.write_snapshot() {
            warn!(path = ?self.file_path, error = %e, "failed to persist cache file");
        }
    }

    fn write_snapshot(&self) -> io::Result<()> {
        let now = self.clock.now();
        let live: HashMap<&String, &CachedValue> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .collect();
        let json = serde_json::to_string(&live)?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically via a temp file unique to this write
        let sequence = TEMP_FILE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let temp_path = self
            .file_path
            .with_extension(format!("{}.{}.tmp", std::process::id(), sequence));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.file_path)?;

        Ok(())
    }
}
