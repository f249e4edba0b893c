//! Dataset fetching for one chart instance. The fetch is fire-and-forget
//! per mount: a direct request, then one proxy attempt only if the direct
//! request fails, and no retries beyond that. A generation counter lets a
//! caller discard a late response that arrives after a newer load began.

use crate::dataset::Dataset;
use crate::error::ChartError;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Fetch lifecycle owner for a single chart. Instances are independent;
/// nothing is shared between charts.
pub struct ChartFetcher {
    http: reqwest::Client,
    /// Base URL of the visual-data proxy, e.g. `/api/visual-data`.
    proxy_base: Option<String>,
    generation: AtomicU64,
}

impl ChartFetcher {
    pub fn new(http: reqwest::Client, proxy_base: Option<String>) -> Self {
        Self {
            http,
            proxy_base,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch and parse the dataset at `url`. Returns `Ok(None)` when a newer
    /// load superseded this one while it was in flight; the stale result
    /// must not be committed.
    pub async fn load(&self, url: &str) -> Result<Option<Dataset>, ChartError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let text = match self.fetch_text(url).await {
            Ok(text) => text,
            Err(direct_err) => match &self.proxy_base {
                Some(proxy) => {
                    warn!(%url, error = %direct_err, "direct fetch failed, trying proxy");
                    self.fetch_via_proxy(proxy, url).await?
                }
                None => return Err(direct_err),
            },
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(%url, "discarding stale fetch result");
            return Ok(None);
        }

        Dataset::from_delimited(&text).map(Some)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ChartError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ChartError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChartError::Fetch(format!("HTTP {}", response.status())));
        }
        response
            .text()
            .await
            .map_err(|e| ChartError::Fetch(e.to_string()))
    }

    async fn fetch_via_proxy(&self, proxy: &str, url: &str) -> Result<String, ChartError> {
        let response = self
            .http
            .get(proxy)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| ChartError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChartError::Fetch(format!(
                "proxy fetch failed: HTTP {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| ChartError::Fetch(e.to_string()))
    }
}
