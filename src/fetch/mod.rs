mod basic;
mod client;
pub mod auth;
#[cfg(test)]
pub(crate) mod testing;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};

/// Executes a request through `client` and returns the response body as JSON.
///
/// Non-success statuses are turned into errors carrying the status and body.
pub async fn fetch_json<C: HttpClient + ?Sized>(
    client: &C,
    req: reqwest::Request,
) -> Result<serde_json::Value> {
    let url = req.url().path().to_string();
    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{url} returned status {status}: {body}");
    }

    Ok(resp.json().await?)
}
