use crate::error::Result;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "http://en.wikipedia.org/w/index.php";
pub const DEFAULT_USER_AGENT: &str = concat!("Wikispider/", env!("CARGO_PKG_VERSION"));

/// Source of raw article text, keyed by the escaped title.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, escaped_title: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Fetches `?title=<escaped>&action=raw` from a MediaWiki `index.php`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
}

impl HttpFetcher {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(endpoint, Duration::from_secs(2), Duration::from_secs(30))
    }

    pub fn with_timeouts(
        endpoint: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        Self::with_client_options(endpoint, DEFAULT_USER_AGENT, connect_timeout, request_timeout)
    }

    pub fn with_client_options(
        endpoint: impl Into<String>,
        user_agent: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn raw_url(&self, escaped_title: &str) -> String {
        format!("{}?title={}&action=raw", self.endpoint, escaped_title)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, escaped_title: &str) -> Result<String> {
        let address = self.raw_url(escaped_title);
        debug!("Fetching {}", address);

        let response = self.client.get(&address).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
