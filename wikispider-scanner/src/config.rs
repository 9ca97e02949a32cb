use crate::error::{Result, SpiderError};
use crate::fetch::{DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Directory holding cached articles and the graph file.
    pub cache_dir: PathBuf,
    /// 0 downloads the seeds without recording or expanding them.
    pub max_depth: usize,
    /// Links followed per article, `None` for all of them.
    pub max_width: Option<usize>,
    pub pool_size: usize,
    /// Milliseconds between network fetches across the whole pool.
    pub delay_ms: u64,
    /// Only articles with one of these infobox kinds are recorded and
    /// expanded. Empty disables the filter.
    pub kinds: BTreeSet<String>,
    /// Rank links by prominence before applying `max_width`.
    pub rank: bool,
    /// Cache entries written at or before this instant are refetched.
    pub stale_before: Option<SystemTime>,
    pub endpoint: String,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub queue_capacity: usize,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("pages"),
            max_depth: 2,
            max_width: Some(3),
            pool_size: 4,
            delay_ms: 300,
            kinds: BTreeSet::new(),
            rank: true,
            stale_before: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 2,
            request_timeout_secs: 30,
            queue_capacity: 32,
        }
    }
}

impl SpiderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(SpiderError::InvalidConfig(
                "pool size must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(SpiderError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
