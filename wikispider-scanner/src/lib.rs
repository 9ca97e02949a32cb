pub mod article;
pub mod barrier;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod limiter;
pub mod relay;
pub mod result;
pub mod spider;
pub mod wikitext;

pub use article::{Article, Origin};
pub use cache::ArticleCache;
pub use config::SpiderConfig;
pub use error::SpiderError;
pub use fetch::{Fetch, HttpFetcher};
pub use limiter::RateLimiter;
pub use result::{CrawlSummary, Edge};
pub use spider::{ProgressCallback, Spider};
