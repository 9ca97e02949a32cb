use crate::article::{Article, Origin};
use crate::barrier::PendingCounter;
use crate::cache::ArticleCache;
use crate::config::SpiderConfig;
use crate::error::{Result, SpiderError};
use crate::fetch::{Fetch, HttpFetcher};
use crate::graph::{GraphWriter, graph_file_name};
use crate::limiter::RateLimiter;
use crate::relay::{self, RelayReceiver, RelaySender};
use crate::result::{CrawlStats, CrawlSummary, Edge};
use crate::wikitext::normalize_title;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Items flowing from the workers back to the orchestrator.
#[derive(Debug)]
enum Visit {
    Article(Article),
    /// End of a generation.
    Boundary,
}

pub struct Spider<F: Fetch> {
    config: SpiderConfig,
    fetcher: Arc<F>,
    progress_callback: Option<ProgressCallback>,
}

impl Spider<HttpFetcher> {
    /// A spider fetching from `config.endpoint` over HTTP.
    pub fn from_config(config: SpiderConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_client_options(
            config.endpoint.clone(),
            &config.user_agent,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetch> Spider<F> {
    pub fn new(config: SpiderConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    /// Crawl breadth-first from `seeds`, caching every visited article and
    /// writing the discovered edges to the graph file in the cache directory.
    pub async fn crawl(&self, seeds: &[String]) -> Result<CrawlSummary> {
        self.config.validate()?;
        let config = &self.config;

        let seeds: Vec<String> = {
            let mut seen = HashSet::new();
            seeds
                .iter()
                .map(|seed| normalize_title(seed.trim()))
                .filter(|seed| !seed.is_empty() && seen.insert(seed.clone()))
                .collect()
        };
        if seeds.is_empty() {
            return Err(SpiderError::InvalidConfig(
                "at least one seed title is required".to_string(),
            ));
        }

        info!(
            "Starting crawl of {:?} with {} workers (depth {}, width {:?})",
            seeds, config.pool_size, config.max_depth, config.max_width
        );

        let graph_path = config
            .cache_dir
            .join(graph_file_name(&seeds, config.max_depth, config.max_width));
        let mut graph = GraphWriter::create(&graph_path).await?;

        let cache = Arc::new(
            ArticleCache::new(config.cache_dir.clone()).with_stale_before(config.stale_before),
        );
        let limiter = Arc::new(RateLimiter::from_millis(config.delay_ms));
        let pending = Arc::new(PendingCounter::new());
        let stats = Arc::new(CrawlStats::default());
        let (visits_tx, mut visits) = relay::unbounded::<Visit>();
        let (download_tx, download_rx) = mpsc::channel::<Article>(config.queue_capacity);
        let download_rx = Arc::new(Mutex::new(download_rx));

        let mut worker_handles = Vec::with_capacity(config.pool_size);
        for worker_id in 0..config.pool_size {
            let worker = DownloadWorker {
                id: worker_id,
                fetcher: self.fetcher.clone(),
                cache: cache.clone(),
                limiter: limiter.clone(),
                queue: download_rx.clone(),
                visits: visits_tx.clone(),
                pending: pending.clone(),
                stats: stats.clone(),
                progress_callback: self.progress_callback.clone(),
            };
            worker_handles.push(tokio::spawn(worker.run()));
        }

        let mut state = CrawlState::default();

        // generation 0 is empty, the seeds make up generation 1
        visits_tx.send(Visit::Boundary).await?;
        pending.add(seeds.len());
        for seed in &seeds {
            state.visited.insert(seed.clone());
            download_tx
                .send(Article::new(seed.clone()))
                .await
                .map_err(|_| SpiderError::QueueClosed)?;
        }

        self.run_generations(
            &mut state,
            &mut visits,
            &visits_tx,
            &download_tx,
            &pending,
            &mut graph,
        )
        .await?;

        let graph_path = graph.finish().await?;

        // no task is pending, so closing the queue lets every worker exit
        drop(download_tx);
        for handle in worker_handles {
            handle.await?;
        }

        let (visited, downloaded, errors) = stats.snapshot();
        info!(
            "Visited {} unique pages, downloaded {} pages, {} errors",
            visited, downloaded, errors
        );

        Ok(CrawlSummary {
            visited,
            downloaded,
            errors,
            edges: state.edges,
            graph_path,
            max_depth_reached: state.deepest,
        })
    }

    async fn run_generations(
        &self,
        state: &mut CrawlState,
        visits: &mut RelayReceiver<Visit>,
        visits_tx: &RelaySender<Visit>,
        download_tx: &mpsc::Sender<Article>,
        pending: &PendingCounter,
        graph: &mut GraphWriter,
    ) -> Result<()> {
        let config = &self.config;

        while let Some(visit) = visits.recv().await {
            match visit {
                Visit::Article(article) => {
                    if state.depth > config.max_depth {
                        continue;
                    }
                    if !config.kinds.is_empty() && !article.has_any_kind(&config.kinds) {
                        debug!("Skipping {:?}, kinds {:?}", article.title(), article.kinds());
                        continue;
                    }

                    let edge = Edge::new(article.parent(), article.title());
                    graph.write_edge(&edge).await?;
                    state.edges.push(edge);
                    state.deepest = state.depth;

                    if state.depth < config.max_depth {
                        let parent = article.title().to_string();
                        let links = article.links(config.max_width, config.rank);
                        for link in links {
                            if !state.visited.insert(link.clone()) {
                                continue;
                            }
                            pending.add(1);
                            download_tx
                                .send(Article::with_parent(link, parent.clone()))
                                .await
                                .map_err(|_| SpiderError::QueueClosed)?;
                        }
                    }
                }
                Visit::Boundary => {
                    if pending.pending() > 0 {
                        info!(
                            "Downloading generation {} ({} pending)",
                            state.depth + 1,
                            pending.pending()
                        );
                    }

                    // every article of the next generation is in the relay
                    // ahead of the marker pushed below once this returns
                    pending.wait().await;

                    if state.depth > config.max_depth {
                        break;
                    }
                    state.depth += 1;
                    visits_tx.send(Visit::Boundary).await?;
                }
            }
        }

        Ok(())
    }
}

/// Orchestrator-owned state, never shared with the workers.
#[derive(Debug, Default)]
struct CrawlState {
    depth: usize,
    /// Generation of the last recorded article, 0 until one is recorded.
    deepest: usize,
    visited: HashSet<String>,
    edges: Vec<Edge>,
}

struct DownloadWorker<F: Fetch> {
    id: usize,
    fetcher: Arc<F>,
    cache: Arc<ArticleCache>,
    limiter: Arc<RateLimiter>,
    queue: Arc<Mutex<mpsc::Receiver<Article>>>,
    visits: RelaySender<Visit>,
    pending: Arc<PendingCounter>,
    stats: Arc<CrawlStats>,
    progress_callback: Option<ProgressCallback>,
}

impl<F: Fetch> DownloadWorker<F> {
    async fn run(self) {
        debug!("Worker {} started", self.id);

        loop {
            let next = { self.queue.lock().await.recv().await };
            let Some(mut article) = next else { break };

            let requested = article.title().to_string();
            if let Some(ref callback) = self.progress_callback {
                callback(self.id, requested.clone());
            }

            match article
                .download(&self.cache, self.fetcher.as_ref(), &self.limiter)
                .await
            {
                Ok(origin) => {
                    let cached = origin == Origin::Cache;
                    self.stats.record_success(cached);
                    if cached {
                        debug!("Already have {:?}", article.title());
                    } else {
                        info!("Downloaded {:?}", article.title());
                    }
                    // deliver before `done` so the barrier sees it queued
                    if let Err(e) = self.visits.send(Visit::Article(article)).await {
                        warn!("Worker {} couldn't deliver {:?}: {}", self.id, requested, e);
                    }
                }
                Err(e) => {
                    self.stats.record_error();
                    warn!("Error downloading {:?}: {}", requested, e);
                }
            }

            self.pending.done();
        }

        debug!("Worker {} finished", self.id);
    }
}
