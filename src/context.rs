//! Everything a consumer needs, built once from [`Settings`] and passed by
//! reference.

use crate::analyzers::analyzer::DateFilterService;
use crate::analyzers::types::AvailableDateRange;
use crate::config::Settings;
use crate::infra::firebase::FirebaseClient;
use crate::infra::groq::ChatClient;
use crate::infra::pathway::PathwayClient;
use crate::services::detection_store::DetectionStore;
use crate::services::location_service::LocationService;
use crate::services::selection::SelectionTracker;
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tracing::info;

pub struct AppContext {
    settings: Settings,
    locations: LocationService,
    date_filter: DateFilterService,
    selection: SelectionTracker,
    chat: Option<ChatClient>,
    pathway: PathwayClient,
}

impl AppContext {
    /// Context backed by the Realtime Database named in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = FirebaseClient::new(
            &settings.database_url,
            settings.auth_token.clone(),
            settings.connect_timeout,
        )?;
        info!(database = %settings.database_url, "Using realtime database");
        Self::with_store(settings, Arc::new(store))
    }

    pub fn with_store(settings: Settings, store: Arc<dyn DetectionStore>) -> Result<Self> {
        let chat = match &settings.groq_api_key {
            Some(key) => Some(ChatClient::new(
                key,
                &settings.groq_base_url,
                &settings.groq_model,
                settings.connect_timeout,
            )?),
            None => None,
        };

        let pathway = PathwayClient::new(&settings.pathway_base_url, settings.connect_timeout)?;

        let locations = LocationService::new(store);
        let date_filter = DateFilterService::new(locations.clone(), settings.fetch_limit);

        Ok(Self {
            settings,
            locations,
            date_filter,
            selection: SelectionTracker::new(),
            chat,
            pathway,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locations(&self) -> &LocationService {
        &self.locations
    }

    pub fn date_filter(&self) -> &DateFilterService {
        &self.date_filter
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Fails when no chat API key was configured.
    pub fn chat(&self) -> Result<&ChatClient> {
        self.chat
            .as_ref()
            .ok_or_else(|| anyhow!("GROQ_API_KEY is not set; chat is unavailable"))
    }

    pub fn pathway(&self) -> &PathwayClient {
        &self.pathway
    }

    /// Selects `location` and loads its available range. Returns `None` if
    /// another selection was made while the load was in flight.
    pub async fn load_range(&self, location: &str) -> Option<AvailableDateRange> {
        let ticket = self.selection.begin(location);
        let range = self.date_filter.available_date_range(location).await;
        self.selection.accept(&ticket, range)
    }
}
