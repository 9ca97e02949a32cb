use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A discovered link from `parent` to `child`. Seeds have an empty parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub parent: String,
    pub child: String,
}

impl Edge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Articles successfully loaded, from cache or network.
    pub visited: usize,
    /// Articles fetched over the network during this run.
    pub downloaded: usize,
    pub errors: usize,
    pub edges: Vec<Edge>,
    pub graph_path: PathBuf,
    /// Deepest generation with a recorded article. Seeds are generation 1;
    /// 0 means nothing was recorded.
    pub max_depth_reached: usize,
}

/// Counters updated by the download workers.
#[derive(Debug, Default)]
pub(crate) struct CrawlStats {
    visited: AtomicUsize,
    downloaded: AtomicUsize,
    errors: AtomicUsize,
}

impl CrawlStats {
    pub(crate) fn record_success(&self, cached: bool) {
        self.visited.fetch_add(1, Ordering::Relaxed);
        if !cached {
            self.downloaded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> (usize, usize, usize) {
        (
            self.visited.load(Ordering::Relaxed),
            self.downloaded.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}
