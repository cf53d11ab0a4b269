// Cache path utilities.
// Resolves the per-user cache directory and the snapshot file inside it.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Application name used for the platform cache directory.
pub const APPLICATION_NAME: &str = "pr-status";

/// File name of the cache snapshot.
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Get the base cache directory (~/.cache/pr-status on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION_NAME).map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Cache directory, falling back to the system temp directory when no home
/// directory can be determined.
pub fn cache_dir_or_temp() -> PathBuf {
    cache_dir().unwrap_or_else(|| std::env::temp_dir().join(APPLICATION_NAME))
}

/// Path to the cache snapshot inside `dir`.
pub fn cache_file_path(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_path() {
        let path = cache_file_path(Path::new("/tmp/pr-status"));
        assert!(path.ends_with("pr-status/cache.json"));
    }

    #[test]
    fn test_cache_dir_or_temp_names_application() {
        let dir = cache_dir_or_temp();
        assert!(dir.to_string_lossy().contains(APPLICATION_NAME));
    }
}
