use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::infra::pathway::types::{PathwayAnalytics, PathwayDashboard, UnifiedStream};
use anyhow::{Context, Result, anyhow, ensure};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};

/// How long the health check may take before the service counts as down.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct PathwayClient {
    http: Arc<dyn HttpClient>,
    base_url: Url,
}

impl PathwayClient {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let http = BasicClient::with_connect_timeout(connect_timeout)?;
        Self::with_client(base_url, Arc::new(http))
    }

    pub fn with_client(base_url: &str, http: Arc<dyn HttpClient>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid Pathway URL '{base_url}'"))?;
        ensure!(
            !base_url.cannot_be_a_base(),
            "Pathway URL '{base_url}' cannot have a path"
        );
        Ok(Self { http, base_url })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Pathway URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let path = url.path().to_string();
        let json = fetch_json(&*self.http, Request::new(Method::GET, url)).await?;
        serde_json::from_value(json).with_context(|| format!("unexpected response from {path}"))
    }

    /// True when `/health` answers with a success status within
    /// [`HEALTH_TIMEOUT`].
    #[tracing::instrument(skip(self))]
    pub async fn health(&self) -> bool {
        let url = match self.endpoint(&["health"]) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build health URL");
                return false;
            }
        };

        match tokio::time::timeout(HEALTH_TIMEOUT, self.http.execute(Request::new(Method::GET, url))).await {
            Ok(Ok(resp)) if resp.status().is_success() => {
                info!("Pathway service is up");
                true
            }
            Ok(Ok(resp)) => {
                warn!(status = %resp.status(), "Pathway health check failed");
                false
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Pathway service unreachable");
                false
            }
            Err(_) => {
                warn!(timeout = ?HEALTH_TIMEOUT, "Pathway health check timed out");
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self, location: &str) -> Result<PathwayDashboard> {
        let url = self.endpoint(&["api", "pathway", "dashboard", location])?;
        self.get(url).await
    }

    /// Dashboards of every tracked location, or only `location` when given.
    #[tracing::instrument(skip(self))]
    pub async fn unified_stream(&self, location: Option<&str>) -> Result<UnifiedStream> {
        let mut url = self.endpoint(&["api", "pathway", "unified-stream"])?;
        if let Some(location) = location {
            url.query_pairs_mut().append_pair("location", location);
        }
        let stream: UnifiedStream = self.get(url).await?;
        debug!(locations = stream.data.len(), status = %stream.pipeline_status, "Unified stream fetched");
        Ok(stream)
    }

    #[tracing::instrument(skip(self))]
    pub async fn analytics(&self) -> Result<PathwayAnalytics> {
        self.get(self.endpoint(&["api", "pathway", "analytics"])?).await
    }

    /// Per-source connection status, passed through as reported.
    #[tracing::instrument(skip(self))]
    pub async fn data_sources(&self) -> Result<Value> {
        self.get(self.endpoint(&["api", "pathway", "data-sources"])?).await
    }

    /// Fetches `location`'s dashboard every `every` and forwards each one that
    /// loaded. Failed polls are logged and skipped. Polling stops once the
    /// receiver is dropped.
    pub fn poll_dashboard(&self, location: &str, every: Duration) -> mpsc::Receiver<PathwayDashboard> {
        let client = self.clone();
        let location = location.to_string();
        let (tx, rx) = mpsc::channel(4);

        let span = tracing::info_span!("dashboard_poll", location = %location);
        tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if tx.is_closed() {
                        break;
                    }
                    match client.dashboard(&location).await {
                        Ok(dashboard) => {
                            if tx.send(dashboard).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Dashboard poll failed"),
                    }
                }
                debug!("Dashboard polling stopped");
            }
            .instrument(span),
        );

        rx
    }
}
