use crate::detection::{Detection, LocationReading, detections_from_node};
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::infra::firebase::stream::{StreamMessage, apply_patch, apply_put};
use crate::services::detection_store::{DetectionStore, Subscription};
use crate::services::locations::Location;
use anyhow::{Context, Result, anyhow, bail, ensure};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Request, Url};
use serde_json::Value;
use sse_stream::SseStream;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info};

/// Reads `locations/...` from a Realtime Database over REST.
#[derive(Clone)]
pub struct FirebaseClient {
    http: Arc<dyn HttpClient>,
    base_url: Url,
}

impl FirebaseClient {
    /// `auth_token` is sent as the `auth` query parameter on every request
    /// when present.
    pub fn new(
        database_url: &str,
        auth_token: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let base = BasicClient::with_connect_timeout(connect_timeout)?;
        let http: Arc<dyn HttpClient> = match auth_token {
            Some(token) => Arc::new(UrlParam::firebase_auth(base, token)),
            None => Arc::new(base),
        };
        Self::with_client(database_url, http)
    }

    pub fn with_client(database_url: &str, http: Arc<dyn HttpClient>) -> Result<Self> {
        let base_url = Url::parse(database_url)
            .with_context(|| format!("invalid database URL '{database_url}'"))?;
        ensure!(
            !base_url.cannot_be_a_base(),
            "database URL '{database_url}' cannot have a path"
        );
        Ok(Self { http, base_url })
    }

    /// REST URL of the node at `path`, e.g. `["locations", "Bangkok Thailand"]`
    /// becomes `<db>/locations/Bangkok%20Thailand.json`.
    pub fn node_url(&self, path: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("database URL cannot be a base"))?;
            segments.pop_if_empty();
            match path.split_last() {
                Some((last, parents)) => {
                    segments.extend(parents.iter());
                    segments.push(&format!("{last}.json"));
                }
                None => {
                    segments.push(".json");
                }
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Value> {
        fetch_json(&*self.http, Request::new(Method::GET, url)).await
    }
}

/// Child keys of an object node; `null` (absent) has none.
fn child_keys(node: Value) -> Result<Vec<String>> {
    match node {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.into_iter().map(|(k, _)| k).collect()),
        other => bail!("expected an object node, got {other}"),
    }
}

fn decode_reading(node: &Value) -> Option<LocationReading> {
    if node.is_null() {
        return None;
    }
    match serde_json::from_value(node.clone()) {
        Ok(reading) => Some(reading),
        Err(e) => {
            debug!(error = %e, "Latest node is not a reading");
            None
        }
    }
}

#[async_trait]
impl DetectionStore for FirebaseClient {
    #[tracing::instrument(skip(self))]
    async fn location_keys(&self) -> Result<Vec<String>> {
        let mut url = self.node_url(&["locations"])?;
        url.query_pairs_mut().append_pair("shallow", "true");
        child_keys(self.get(url).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn latest(&self, location: Location) -> Result<Option<LocationReading>> {
        let url = self.node_url(&["locations", location.store_key(), "latest"])?;
        let node = self.get(url).await?;
        if node.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(node).context("latest node is not a reading")?))
    }

    #[tracing::instrument(skip(self))]
    async fn detections(&self, location: Location, limit: usize) -> Result<Vec<Detection>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut url = self.node_url(&["locations", location.store_key(), "detections"])?;
        url.query_pairs_mut()
            .append_pair("orderBy", "\"$key\"")
            .append_pair("limitToLast", &limit.to_string());

        let node: BTreeMap<String, Value> = match self.get(url).await? {
            Value::Null => BTreeMap::new(),
            other => serde_json::from_value(other).context("detections node is not an object")?,
        };
        let detections = detections_from_node(node, limit);
        debug!(count = detections.len(), "Detections fetched");
        Ok(detections)
    }

    async fn subscribe_latest(&self, location: Location) -> Result<Subscription> {
        let url = self.node_url(&["locations", location.store_key(), "latest"])?;
        let http = self.http.clone();
        let (tx, rx) = mpsc::channel(16);

        let span = tracing::info_span!("latest_listener", location = %location);
        let task = tokio::spawn(
            async move {
                info!("Listening for latest readings");
                if let Err(e) = pump_latest(http, url, tx.clone()).await {
                    error!(error = %e, "Latest listener failed");
                    let _ = tx.send(None).await;
                }
            }
            .instrument(span),
        );

        Ok(Subscription::new(rx, Some(task)))
    }
}

/// Mirrors the streamed node and forwards its decoded value after every
/// change. Returns when the server closes the stream or the receiver is
/// dropped.
async fn pump_latest(
    http: Arc<dyn HttpClient>,
    url: Url,
    tx: mpsc::Sender<Option<LocationReading>>,
) -> Result<()> {
    let mut req = Request::new(Method::GET, url);
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

    let resp = http.execute(req).await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("stream request returned status {status}: {body}");
    }

    let mut events = std::pin::pin!(SseStream::from_bytes_stream(resp.bytes_stream()));
    let mut mirror = Value::Null;

    while let Some(sse) = events.next().await {
        let sse = sse?;
        let data = sse.data.as_deref().unwrap_or_default();
        match sse.event.as_deref() {
            Some(kind @ ("put" | "patch")) => {
                let msg: StreamMessage = serde_json::from_str(data)
                    .with_context(|| format!("malformed {kind} event"))?;
                if kind == "put" {
                    apply_put(&mut mirror, &msg.path, msg.data);
                } else {
                    apply_patch(&mut mirror, &msg.path, msg.data);
                }
                if tx.send(decode_reading(&mirror)).await.is_err() {
                    return Ok(());
                }
            }
            Some("keep-alive") => {}
            Some("cancel") => bail!("listener cancelled by server: {data}"),
            Some("auth_revoked") => bail!("listener credential revoked"),
            other => debug!(event = ?other, "Ignoring stream event"),
        }
    }

    debug!("Server closed latest stream");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::CannedClient;
    use serde_json::json;

    fn client(url: &str) -> FirebaseClient {
        FirebaseClient::with_client(url, Arc::new(BasicClient::new())).unwrap()
    }

    #[test]
    fn test_node_url_encodes_location_key() {
        let c = client("https://citysense-crono-default-rtdb.firebaseio.com");
        let url = c
            .node_url(&["locations", "Bangkok Thailand", "latest"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://citysense-crono-default-rtdb.firebaseio.com/locations/Bangkok%20Thailand/latest.json"
        );
    }

    #[test]
    fn test_node_url_with_trailing_slash_and_prefix() {
        let c = client("http://localhost:9000/ns/");
        assert_eq!(
            c.node_url(&["locations"]).unwrap().as_str(),
            "http://localhost:9000/ns/locations.json"
        );
        assert_eq!(c.node_url(&[]).unwrap().as_str(), "http://localhost:9000/ns/.json");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = FirebaseClient::with_client("mailto:ops@example.com", Arc::new(BasicClient::new()));
        assert!(result.is_err());
        let result = FirebaseClient::with_client("not a url", Arc::new(BasicClient::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_child_keys() {
        let keys = child_keys(json!({"Canmore Alberta": true, "Bangkok Thailand": true})).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(child_keys(Value::Null).unwrap().is_empty());
        assert!(child_keys(json!(42)).is_err());
    }

    #[test]
    fn test_decode_reading() {
        assert_eq!(decode_reading(&Value::Null), None);
        assert_eq!(decode_reading(&json!({"cars": 4})).map(|r| r.cars), Some(4));
        assert_eq!(decode_reading(&json!("oops")), None);
    }

    #[tokio::test]
    async fn test_zero_limit_skips_request() {
        let c = client("http://127.0.0.1:9");
        let detections = c.detections(Location::Canmore, 0).await.unwrap();
        assert!(detections.is_empty());
    }

    fn streamed(body: &str) -> FirebaseClient {
        FirebaseClient::with_client("http://localhost:9000", Arc::new(CannedClient::ok(body))).unwrap()
    }

    #[tokio::test]
    async fn test_subscription_applies_put_and_patch() {
        let body = "event: put\n\
                    data: {\"path\":\"/\",\"data\":{\"cars\":4,\"people\":2}}\n\n\
                    event: keep-alive\n\
                    data: null\n\n\
                    event: patch\n\
                    data: {\"path\":\"/\",\"data\":{\"cars\":9}}\n\n\
                    event: put\n\
                    data: {\"path\":\"/\",\"data\":null}\n\n";
        let mut sub = streamed(body).subscribe_latest(Location::Canmore).await.unwrap();

        let first = sub.next().await.flatten().unwrap();
        assert_eq!((first.cars, first.people), (4, 2));
        let second = sub.next().await.flatten().unwrap();
        assert_eq!((second.cars, second.people), (9, 2));
        assert_eq!(sub.next().await, Some(None));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_subscription_ends_on_cancel() {
        let body = "event: put\n\
                    data: {\"path\":\"/\",\"data\":{\"cars\":1}}\n\n\
                    event: cancel\n\
                    data: permission denied\n\n";
        let mut sub = streamed(body).subscribe_latest(Location::Bangkok).await.unwrap();

        assert_eq!(sub.next().await.flatten().map(|r| r.cars), Some(1));
        assert_eq!(sub.next().await, Some(None));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_subscription_ends_on_auth_revoked() {
        let body = "event: auth_revoked\n\
                    data: credential is no longer valid\n\n";
        let mut sub = streamed(body).subscribe_latest(Location::Bangkok).await.unwrap();

        assert_eq!(sub.next().await, Some(None));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_subscription_error_status_sends_none() {
        let http = Arc::new(CannedClient::with_status(401, "{\"error\":\"Permission denied\"}"));
        let c = FirebaseClient::with_client("http://localhost:9000", http.clone()).unwrap();
        let mut sub = c.subscribe_latest(Location::Canmore).await.unwrap();

        assert_eq!(sub.next().await, Some(None));
        assert_eq!(sub.next().await, None);
        assert_eq!(
            http.urls(),
            vec!["http://localhost:9000/locations/Canmore%20Alberta/latest.json"]
        );
    }

    #[tokio::test]
    async fn test_detections_query_and_decode() {
        let http = Arc::new(CannedClient::ok(
            r#"{"20240101_080000":{"cars":3},"20240101_090000":{"cars":5}}"#,
        ));
        let c = FirebaseClient::with_client("http://localhost:9000", http.clone()).unwrap();
        let detections = c.detections(Location::Canmore, 2).await.unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].timestamp_key, "20240101_090000");
        let url = &http.urls()[0];
        assert!(url.contains("orderBy=%22%24key%22"), "{url}");
        assert!(url.contains("limitToLast=2"), "{url}");
    }
}
