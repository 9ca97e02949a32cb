use crate::cache::ArticleCache;
use crate::error::{Result, SpiderError};
use crate::fetch::Fetch;
use crate::limiter::RateLimiter;
use crate::wikitext::{self, escape_title, normalize_title};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Redirects followed before a fetch is abandoned.
pub const MAX_REDIRECTS: usize = 4;

/// Where a loaded article body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

#[derive(Debug, Clone, Default)]
pub struct Article {
    title: String,
    parent: String,
    body: Option<String>,
    redirects: usize,
    links: OnceLock<Vec<String>>,
    kinds: OnceLock<Vec<String>>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(title: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            parent: parent.into(),
            ..Self::default()
        }
    }

    /// An article whose body is already known, e.g. read from a dump.
    pub fn loaded(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.body.is_some()
    }

    pub fn redirects(&self) -> usize {
        self.redirects
    }

    /// Load the body from the cache, or fetch and cache it, following
    /// `#REDIRECT` directives up to [`MAX_REDIRECTS`] times.
    ///
    /// # Panics
    ///
    /// If the body is already loaded.
    pub async fn download<F: Fetch>(
        &mut self,
        cache: &ArticleCache,
        fetcher: &F,
        limiter: &RateLimiter,
    ) -> Result<Origin> {
        assert!(
            self.body.is_none(),
            "article {:?} already loaded",
            self.title
        );

        let (body, origin) = loop {
            let (body, origin) = match cache.load(&self.title).await {
                Some(Ok(body)) => (body, Origin::Cache),
                Some(Err(source)) => {
                    return Err(SpiderError::CacheRead {
                        title: self.title.clone(),
                        source,
                    });
                }
                None => {
                    limiter.acquire().await?;
                    let body = fetcher.fetch(&escape_title(&self.title)).await?;
                    cache.store(&self.title, &body).await;
                    (body, Origin::Network)
                }
            };

            let Some(target) = wikitext::redirect_target(&body) else {
                break (body, origin);
            };

            self.redirects += 1;
            if self.redirects > MAX_REDIRECTS {
                warn!("Too many redirects from {:?}", self.title);
                return Err(SpiderError::TooManyRedirects {
                    title: self.title.clone(),
                });
            }
            debug!("{:?} redirects to {:?}", self.title, target);
            self.title = target;
        };

        // a longer chain may already be a normalization loop, leave it alone
        if self.redirects <= 1 {
            let normalized = normalize_title(&self.title);
            if !normalized.is_empty() && normalized != self.title {
                if !cache.contains(&normalized).await {
                    cache.store(&normalized, &body).await;
                }
                self.title = normalized;
            }
        }

        self.body = Some(body);
        Ok(origin)
    }

    /// Outbound links, at most `max_count` of them (all when `None`).
    ///
    /// With `rank`, links are ordered by [`wikitext::most_common`] and
    /// deduplicated; otherwise they are truncated in document order.
    pub fn links(&self, max_count: Option<usize>, rank: bool) -> Vec<String> {
        let all = self
            .links
            .get_or_init(|| self.body().map(wikitext::extract_links).unwrap_or_default());
        let body = self.body().unwrap_or_default();

        match max_count {
            Some(n) if n < all.len() => {
                if rank {
                    wikitext::most_common(body, all, Some(n))
                } else {
                    all[..n].to_vec()
                }
            }
            _ if rank => wikitext::most_common(body, all, None),
            _ => all.clone(),
        }
    }

    pub fn kinds(&self) -> &[String] {
        self.kinds
            .get_or_init(|| self.body().map(wikitext::infobox_kinds).unwrap_or_default())
    }

    /// True if any of this article's infobox kinds is in `filter`.
    pub fn has_any_kind(&self, filter: &BTreeSet<String>) -> bool {
        self.kinds().iter().any(|kind| filter.contains(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::SystemTime;
    use tempfile::TempDir;

    /// Serves bodies from a map keyed by escaped title.
    #[derive(Default)]
    struct MapFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        fn with_page(mut self, title: &str, body: &str) -> Self {
            self.pages.insert(escape_title(title), body.to_string());
            self
        }
    }

    impl Fetch for MapFetcher {
        async fn fetch(&self, escaped_title: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(escaped_title.to_string());
            self.pages.get(escaped_title).cloned().ok_or_else(|| {
                SpiderError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    escaped_title.to_string(),
                ))
            })
        }
    }

    fn redirect_chain(hops: usize) -> MapFetcher {
        let mut fetcher = MapFetcher::default();
        for hop in 0..hops {
            fetcher = fetcher.with_page(
                &format!("Hop{hop}"),
                &format!("#REDIRECT [[Hop{}]]", hop + 1),
            );
        }
        fetcher.with_page(&format!("Hop{hops}"), "Final [[Target]]")
    }

    #[tokio::test]
    async fn test_download_is_idempotent_through_cache() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        let fetcher = MapFetcher::default().with_page("Rust", "Rust is [[Fast]]");

        let mut first = Article::new("Rust");
        assert_eq!(
            first.download(&cache, &fetcher, &limiter).await.unwrap(),
            Origin::Network
        );

        let mut second = Article::new("Rust");
        let mut third = Article::new("Rust");
        assert_eq!(
            second.download(&cache, &fetcher, &limiter).await.unwrap(),
            Origin::Cache
        );
        assert_eq!(
            third.download(&cache, &fetcher, &limiter).await.unwrap(),
            Origin::Cache
        );
        assert_eq!(second.body(), third.body());
        assert_eq!(second.body(), Some("Rust is [[Fast]]"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_four_redirects_resolve() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        let fetcher = redirect_chain(4);

        let mut article = Article::new("Hop0");
        article.download(&cache, &fetcher, &limiter).await.unwrap();

        assert_eq!(article.title(), "Hop4");
        assert_eq!(article.redirects(), 4);
        assert_eq!(article.body(), Some("Final [[Target]]"));
    }

    #[tokio::test]
    async fn test_five_redirects_fail() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        let fetcher = redirect_chain(5);

        let mut article = Article::new("Hop0");
        let err = article
            .download(&cache, &fetcher, &limiter)
            .await
            .unwrap_err();

        assert!(matches!(err, SpiderError::TooManyRedirects { .. }));
        assert!(!err.is_cached());
        assert!(!article.is_loaded());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_redirect_stub_served_from_cache_is_followed() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        cache.store("UK", "#REDIRECT [[United_Kingdom]]").await;
        let fetcher = MapFetcher::default().with_page("United_Kingdom", "Island [[Europe]]");

        let mut article = Article::new("UK");
        let origin = article.download(&cache, &fetcher, &limiter).await.unwrap();

        assert_eq!(origin, Origin::Network);
        assert_eq!(article.title(), "United_Kingdom");
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec!["United_Kingdom".to_string()]
        );
    }

    #[tokio::test]
    async fn test_normalized_title_is_cached_under_both_spellings() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        let fetcher = MapFetcher::default().with_page("bank of england", "Central bank");

        let mut article = Article::new("bank of england");
        article.download(&cache, &fetcher, &limiter).await.unwrap();

        assert_eq!(article.title(), "Bank_of_England");
        assert!(cache.contains("bank of england").await);
        assert!(cache.contains("Bank_of_England").await);
    }

    #[tokio::test]
    async fn test_stale_normalized_entry_is_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Bank_of_England.wiki"), "stale copy").unwrap();
        let cache = ArticleCache::new(dir.path()).with_stale_before(Some(SystemTime::now()));
        let limiter = RateLimiter::unthrottled();
        let fetcher = MapFetcher::default().with_page("bank of england", "fresh copy");

        let mut article = Article::new("bank of england");
        article.download(&cache, &fetcher, &limiter).await.unwrap();

        assert_eq!(article.title(), "Bank_of_England");
        assert_eq!(article.body(), Some("fresh copy"));
        let on_disk = std::fs::read_to_string(dir.path().join("Bank_of_England.wiki")).unwrap();
        assert_eq!(on_disk, "fresh copy");
    }

    #[tokio::test]
    async fn test_fresh_normalized_entry_is_kept() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        cache.store("Bank_of_England", "canonical copy").await;
        let limiter = RateLimiter::unthrottled();
        let fetcher = MapFetcher::default().with_page("bank of england", "alias copy");

        let mut article = Article::new("bank of england");
        article.download(&cache, &fetcher, &limiter).await.unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("Bank_of_England.wiki")).unwrap();
        assert_eq!(on_disk, "canonical copy");
    }

    #[tokio::test]
    async fn test_cache_write_failure_keeps_body() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path().join("missing"));
        let limiter = RateLimiter::unthrottled();
        let fetcher = MapFetcher::default().with_page("rust lang", "Rust [[Cargo]]");

        let mut article = Article::new("rust lang");
        let origin = article.download(&cache, &fetcher, &limiter).await.unwrap();

        assert_eq!(origin, Origin::Network);
        assert!(article.is_loaded());
        assert_eq!(article.title(), "Rust_Lang");
        assert_eq!(article.links(None, false), vec!["Cargo"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_caches_nothing() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        let fetcher = MapFetcher::default();

        let mut article = Article::new("Nowhere");
        let err = article
            .download(&cache, &fetcher, &limiter)
            .await
            .unwrap_err();

        assert!(!err.is_cached());
        assert!(!cache.contains("Nowhere").await);
    }

    #[tokio::test]
    async fn test_unreadable_cache_entry_is_reported_as_cached() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();
        std::fs::write(cache.path_for("Binary"), [0xff, 0xfe, 0x00]).unwrap();

        let mut article = Article::new("Binary");
        let err = article
            .download(&cache, &MapFetcher::default(), &limiter)
            .await
            .unwrap_err();

        assert!(err.is_cached());
    }

    #[tokio::test]
    #[should_panic(expected = "already loaded")]
    async fn test_download_twice_panics() {
        let dir = TempDir::new().unwrap();
        let cache = ArticleCache::new(dir.path());
        let limiter = RateLimiter::unthrottled();

        let mut article = Article::loaded("Rust", "body");
        let _ = article
            .download(&cache, &MapFetcher::default(), &limiter)
            .await;
    }

    #[test]
    fn test_links_truncate_or_rank() {
        let article = Article::loaded(
            "Page",
            "[[beta]] [[alpha]] [[gamma]] [[alpha]] alpha alpha beta",
        );

        assert_eq!(article.links(None, false), vec!["beta", "alpha", "gamma", "alpha"]);
        assert_eq!(article.links(Some(2), false), vec!["beta", "alpha"]);
        assert_eq!(article.links(Some(2), true), vec!["alpha", "beta"]);
        assert_eq!(article.links(None, true), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_kinds_and_filter() {
        let article = Article::loaded("Acme", "{{Infobox company\n| name = Acme}}");
        let filter: BTreeSet<String> = ["company".to_string()].into();
        let other: BTreeSet<String> = ["person".to_string()].into();

        assert_eq!(article.kinds(), ["company".to_string()]);
        assert!(article.has_any_kind(&filter));
        assert!(!article.has_any_kind(&other));
        assert!(!Article::loaded("Plain", "no box").has_any_kind(&filter));
    }
}
