// Cache module for local filesystem caching.
// Stores aggregated GitHub API responses behind hashed, TTL-expiring keys.

pub mod paths;
pub mod store;

pub use paths::{cache_dir, cache_dir_or_temp, cache_file_path};
pub use store::{CachedValue, Clock, DEFAULT_TTL, SystemClock, TtlCache, hash_cache_key};
