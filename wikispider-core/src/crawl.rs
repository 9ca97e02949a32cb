use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tracing::info;
use wikispider_scanner::error::{Result, SpiderError};
use wikispider_scanner::fetch::DEFAULT_ENDPOINT;
use wikispider_scanner::{CrawlSummary, ProgressCallback, Spider, SpiderConfig};

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub titles: Vec<String>,
    pub cache_dir: PathBuf,
    pub max_depth: usize,
    /// `None` follows every link
    pub max_width: Option<usize>,
    pub workers: usize,
    pub delay_ms: u64,
    pub kinds: BTreeSet<String>,
    pub rank: bool,
    /// Refetch cache entries written before this crawl started
    pub force: bool,
    pub endpoint: Option<String>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        let defaults = SpiderConfig::default();
        Self {
            titles: Vec::new(),
            cache_dir: defaults.cache_dir,
            max_depth: defaults.max_depth,
            max_width: defaults.max_width,
            workers: defaults.pool_size,
            delay_ms: defaults.delay_ms,
            kinds: BTreeSet::new(),
            rank: defaults.rank,
            force: false,
            endpoint: None,
            show_progress_bars: false,
        }
    }
}

impl CrawlOptions {
    pub fn to_config(&self, started: SystemTime) -> SpiderConfig {
        SpiderConfig {
            cache_dir: self.cache_dir.clone(),
            max_depth: self.max_depth,
            max_width: self.max_width,
            pool_size: self.workers,
            delay_ms: self.delay_ms,
            kinds: self.kinds.clone(),
            rank: self.rank,
            stale_before: self.force.then_some(started),
            endpoint: self
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ..SpiderConfig::default()
        }
    }
}

/// Split a comma separated `--kind` value into lowercase infobox kinds
pub fn parse_kinds(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(|kind| kind.trim().to_lowercase())
        .filter(|kind| !kind.is_empty())
        .collect()
}

/// Make sure the cache directory exists, creating it if needed
pub fn prepare_cache_dir(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        if !path.is_dir() {
            return Err(SpiderError::CacheDir(format!(
                "{} is not a directory",
                path.display()
            )));
        }
    } else {
        info!("Creating output directory {}", path.display());
        std::fs::create_dir_all(path).map_err(|e| {
            SpiderError::CacheDir(format!("couldn't create {}: {}", path.display(), e))
        })?;
    }
    Ok(path.to_path_buf())
}

/// Execute a crawl with the given options
/// Returns the crawl summary
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    let started = SystemTime::now();
    prepare_cache_dir(&options.cache_dir)?;
    let config = options.to_config(started);

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Crawling {} seed(s) into {}",
            options.titles.len(),
            options.cache_dir.display()
        ));
        if options.force {
            callback("Refetching cached articles".to_string());
        }
    }

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let mut spider = Spider::from_config(config)?;
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let count_clone = processed_count.clone();
        let callback: ProgressCallback = Arc::new(move |worker_id: usize, title: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            pb_clone.set_message(format!("[{}] worker {}: {}", count, worker_id, title));
        });
        spider = spider.with_progress_callback(callback);
    }

    let result = spider.crawl(&options.titles).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        match result {
            Ok(_) => pb.finish_with_message(format!("Crawl complete! {} articles processed", total)),
            Err(_) => pb.finish_and_clear(),
        }
    }

    if let (Some(callback), Ok(summary)) = (&progress_callback, &result) {
        callback(format!("Graph written to {}", summary.graph_path.display()));
    }

    result
}

/// Render the crawl summary for the terminal
pub fn generate_crawl_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str(&format!("{}\n\n", "━".repeat(52)));
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages visited: {}\n", summary.visited));
    report.push_str(&format!("  Newly downloaded: {}\n", summary.downloaded));

    let errors = summary.errors.to_string();
    let errors = if summary.errors > 0 {
        errors.red().to_string()
    } else {
        errors
    };
    report.push_str(&format!("  Errors: {}\n", errors));
    report.push_str(&format!("  Edges recorded: {}\n", summary.edges.len()));
    report.push_str(&format!("  Depth reached: {}\n", depth_reached_label(summary)));
    report.push_str(&format!("  Graph file: {}\n", summary.graph_path.display()));
    report.push_str(&format!("\n{}\n\n", "━".repeat(52)));

    // Group children under their parent, seeds first
    let mut by_parent: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in &summary.edges {
        by_parent
            .entry(edge.parent.as_str())
            .or_default()
            .push(edge.child.as_str());
    }

    for (parent, children) in by_parent.iter() {
        let heading = if parent.is_empty() { "(seeds)" } else { parent };
        report.push_str(&format!("## {}\n", heading.bold()));
        report.push_str(&format!("  {} links followed\n", children.len()));
        for child in children {
            report.push_str(&format!("  → {}\n", child));
        }
        report.push('\n');
    }

    report
}

/// Depth in link hops from the seeds, which count as depth 0
fn depth_reached_label(summary: &CrawlSummary) -> String {
    match summary.max_depth_reached {
        0 => "none".to_string(),
        generation => (generation - 1).to_string(),
    }
}

/// Render the crawl summary as pretty-printed JSON
pub fn crawl_summary_json(summary: &CrawlSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
