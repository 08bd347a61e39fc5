//! Single-slot disk cache of the unfiltered bookmark listing.
//!
//! Every failure on this path degrades silently: an unreadable, corrupt or
//! expired file is a miss, and a failed write is only logged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use markdex_core::Bookmark;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const CACHE_FILE: &str = "bookmarks.json";

#[derive(Deserialize)]
struct Entry {
    items: Vec<Bookmark>,
    ts: i64,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    items: &'a [Bookmark],
    ts: i64,
}

pub struct DiskCache {
    path: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    /// Cache at the platform cache directory (or `$MARKDEX_CACHE_DIR`).
    pub fn new() -> Self {
        Self::at(default_cache_dir().join(CACHE_FILE), DEFAULT_TTL)
    }

    pub fn at(path: PathBuf, ttl: Duration) -> Self {
        Self { path, ttl }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached items if the entry exists, parses and is no older than the TTL.
    pub fn read(&self) -> Option<Vec<Bookmark>> {
        self.read_at(Utc::now())
    }

    fn read_at(&self, now: DateTime<Utc>) -> Option<Vec<Bookmark>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let entry: Entry = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(e) => {
                debug!("ignoring unreadable cache {}: {e}", self.path.display());
                return None;
            }
        };
        let age = now.timestamp() - entry.ts;
        if age > self.ttl.as_secs() as i64 {
            debug!("cache expired ({age}s old)");
            return None;
        }
        Some(entry.items)
    }

    /// Overwrite the entry with `items` stamped now. Best effort.
    pub fn write(&self, items: &[Bookmark]) {
        if let Err(e) = self.try_write(items, Utc::now()) {
            warn!("cache write to {} failed: {e}", self.path.display());
        }
    }

    fn try_write(&self, items: &[Bookmark], now: DateTime<Utc>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entry = EntryRef {
            items,
            ts: now.timestamp(),
        };
        let content = serde_json::to_vec(&entry)?;
        std::fs::write(&self.path, content)
    }

    /// Remove the entry. A missing file is not an error.
    pub fn invalidate(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("cache invalidated"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("cache invalidation of {} failed: {e}", self.path.display()),
        }
    }
}

impl Default for DiskCache {
    fn default() -> Self {
        Self::new()
    }
}

fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MARKDEX_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    directories::ProjectDirs::from("dev", "markdex", "markdex")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".markdex-cache"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(dir: &tempfile::TempDir) -> DiskCache {
        DiskCache::at(dir.path().join("sub").join(CACHE_FILE), DEFAULT_TTL)
    }

    fn sample() -> Vec<Bookmark> {
        vec![Bookmark::new("zeta", "u1"), Bookmark::new("Alpha", "u2")]
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);
        cache.write(&sample());
        assert_eq!(cache.read(), Some(sample()));
    }

    #[test]
    fn test_missing_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(temp_cache(&dir).read(), None);
    }

    #[test]
    fn test_corrupt_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);
        std::fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        std::fs::write(cache.path(), "{not json").unwrap();
        assert_eq!(cache.read(), None);
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);
        std::fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        let eleven_minutes_ago = Utc::now().timestamp() - 11 * 60;
        let body = format!(r#"{{"items":[{{"title":"a","url":"u"}}],"ts":{eleven_minutes_ago}}}"#);
        std::fs::write(cache.path(), body).unwrap();
        assert_eq!(cache.read(), None);
    }

    #[test]
    fn test_entry_within_ttl_is_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);
        let captured = Utc::now() - chrono::Duration::minutes(4);
        cache.try_write(&sample(), captured).unwrap();
        assert_eq!(cache.read(), Some(sample()));
        assert_eq!(cache.read_at(captured + chrono::Duration::minutes(6)), None);
    }

    #[test]
    fn test_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);
        cache.write(&sample());
        cache.invalidate();
        assert_eq!(cache.read(), None);
        assert!(!cache.path().exists());
        // second invalidate on a missing file is a no-op
        cache.invalidate();
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // parent is a regular file, so create_dir_all fails
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let cache = DiskCache::at(blocker.join(CACHE_FILE), DEFAULT_TTL);
        cache.write(&sample());
        assert_eq!(cache.read(), None);
    }
}
