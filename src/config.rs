//! Runtime settings read from the environment (and `.env`, via `dotenvy`).

use crate::analyzers::analyzer::DEFAULT_FETCH_LIMIT;
use crate::infra::groq::DEFAULT_MODEL;
use crate::infra::pathway::DEFAULT_POLL_INTERVAL;
use anyhow::{Context, Result, ensure};
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "https://citysense-crono-default-rtdb.firebaseio.com";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PATHWAY_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub auth_token: Option<String>,
    pub fetch_limit: usize,
    pub connect_timeout: Duration,
    /// Only needed by the chat commands.
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub groq_model: String,
    pub pathway_base_url: String,
    /// Delay between dashboard polls.
    pub pathway_poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth_token: None,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            groq_api_key: None,
            groq_base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            groq_model: DEFAULT_MODEL.to_string(),
            pathway_base_url: DEFAULT_PATHWAY_URL.to_string(),
            pathway_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let fetch_limit = match var("DETECTION_FETCH_LIMIT") {
            Some(v) => v
                .parse()
                .with_context(|| format!("DETECTION_FETCH_LIMIT must be a positive integer, got '{v}'"))?,
            None => defaults.fetch_limit,
        };
        let connect_timeout = match var("HTTP_CONNECT_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("HTTP_CONNECT_TIMEOUT_SECS must be an integer, got '{v}'"))?,
            ),
            None => defaults.connect_timeout,
        };
        let pathway_poll_interval = match var("PATHWAY_POLL_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .with_context(|| format!("PATHWAY_POLL_SECS must be an integer, got '{v}'"))?;
                ensure!(secs > 0, "PATHWAY_POLL_SECS must be at least 1");
                Duration::from_secs(secs)
            }
            None => defaults.pathway_poll_interval,
        };

        Ok(Self {
            database_url: var("FIREBASE_DATABASE_URL").unwrap_or(defaults.database_url),
            auth_token: var("FIREBASE_AUTH_TOKEN"),
            fetch_limit,
            connect_timeout,
            groq_api_key: var("GROQ_API_KEY"),
            groq_base_url: var("GROQ_BASE_URL").unwrap_or(defaults.groq_base_url),
            groq_model: var("GROQ_MODEL").unwrap_or(defaults.groq_model),
            pathway_base_url: var("PATHWAY_BASE_URL").unwrap_or(defaults.pathway_base_url),
            pathway_poll_interval,
        })
    }
}
