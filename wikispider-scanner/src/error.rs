use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpiderError {
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Couldn't read {title:?} from disk: {source}")]
    CacheRead {
        title: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Too many redirects while resolving {title:?}")]
    TooManyRedirects { title: String },

    #[error("Couldn't open graph file {}: {source}", path.display())]
    GraphFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache directory error: {0}")]
    CacheDir(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Rate limiter stopped producing permits")]
    LimiterClosed,

    #[error("Visit relay closed")]
    RelayClosed,

    #[error("Download queue closed")]
    QueueClosed,
}

impl SpiderError {
    /// True when the failure happened after the article was found in the cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, SpiderError::CacheRead { .. })
    }
}

pub type Result<T> = std::result::Result<T, SpiderError>;
