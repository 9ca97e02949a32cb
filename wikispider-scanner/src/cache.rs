use crate::wikitext::escape_title;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

pub const CACHE_EXTENSION: &str = "wiki";

/// On-disk copy of article bodies, one `<escaped title>.wiki` file per title.
#[derive(Debug, Clone)]
pub struct ArticleCache {
    dir: PathBuf,
    stale_before: Option<SystemTime>,
}

impl ArticleCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stale_before: None,
        }
    }

    /// Entries last modified at or before `cutoff` are ignored by `load`.
    pub fn with_stale_before(mut self, cutoff: Option<SystemTime>) -> Self {
        self.stale_before = cutoff;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", escape_title(title), CACHE_EXTENSION))
    }

    /// `None` on a miss (absent or stale), otherwise the result of reading
    /// the entry.
    pub async fn load(&self, title: &str) -> Option<io::Result<String>> {
        let path = self.path_for(title);
        if !self.is_fresh(&path).await {
            return None;
        }
        Some(tokio::fs::read_to_string(&path).await)
    }

    /// True if `load` would find an entry: present and not stale.
    pub async fn contains(&self, title: &str) -> bool {
        self.is_fresh(&self.path_for(title)).await
    }

    async fn is_fresh(&self, path: &Path) -> bool {
        let Ok(metadata) = tokio::fs::metadata(path).await else {
            return false;
        };
        match self.stale_before {
            None => true,
            Some(cutoff) => matches!(metadata.modified(), Ok(modified) if modified > cutoff),
        }
    }

    /// Best-effort write. Failures are logged and reported as `false`.
    pub async fn store(&self, title: &str, body: &str) -> bool {
        let path = self.path_for(title);
        match tokio::fs::write(&path, body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Couldn't write body of page {:?} to {}: {}",
                    title,
                    path.display(),
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_escapes_title() {
        let cache = ArticleCache::new("/tmp/pages");
        assert_eq!(
            cache.path_for("AC/DC live"),
            PathBuf::from("/tmp/pages/AC%2FDC+live.wiki")
        );
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());

        assert!(cache.load("Rust").await.is_none());
        assert!(cache.store("Rust", "systems language").await);
        assert!(cache.contains("Rust").await);

        let body = cache.load("Rust").await.unwrap().unwrap();
        assert_eq!(body, "systems language");
    }

    #[tokio::test]
    async fn test_stale_entries_are_misses() {
        let dir = TempDir::new().unwrap();
        let writer = ArticleCache::new(dir.path());
        assert!(writer.store("Old", "old body").await);

        let future = SystemTime::now() + Duration::from_secs(3600);
        let cache = ArticleCache::new(dir.path()).with_stale_before(Some(future));
        assert!(cache.load("Old").await.is_none());

        assert!(!cache.contains("Old").await);

        let past = SystemTime::now() - Duration::from_secs(3600);
        let cache = ArticleCache::new(dir.path()).with_stale_before(Some(past));
        assert!(cache.load("Old").await.is_some());
        assert!(cache.contains("Old").await);
    }

    #[tokio::test]
    async fn test_store_into_missing_dir_fails_softly() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path().join("missing"));
        assert!(!cache.store("Rust", "body").await);
    }
}
