//! OpenCage forward geocoding client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{GeocodeError, Geocoder, PlaceSuggestion};
use crate::config::GeocodeConfig;

/// OpenCage API client
pub struct OpenCageClient {
    api_key: String,
    base_url: String,
    limit: u32,
    http: Client,
    timeout: Duration,
}

impl OpenCageClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable or file specified in config.
    pub fn from_config(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        debug!(base_url = %config.base_url, "OpenCageClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| GeocodeError::MissingCredentials(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(GeocodeError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limit: config.limit,
            http,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/geocode/v1/json", self.base_url)
    }
}

/// Reduce an OpenCage response to display suggestions
fn to_suggestions(response: OpenCageResponse) -> Vec<PlaceSuggestion> {
    response
        .results
        .into_iter()
        .filter(|r| !r.formatted.trim().is_empty())
        .map(|r| PlaceSuggestion {
            id: r.formatted.clone(),
            title: r.formatted,
            latitude: r.geometry.as_ref().map(|g| g.lat),
            longitude: r.geometry.as_ref().map(|g| g.lng),
        })
        .collect()
}

#[async_trait]
impl Geocoder for OpenCageClient {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        debug!(%query, "OpenCageClient::search: called");
        let limit = self.limit.to_string();

        let response = self
            .http
            .get(self.endpoint())
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("no_annotations", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout(self.timeout)
                } else {
                    GeocodeError::Network(e)
                }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            debug!(%status, "OpenCageClient::search: API error");
            let message = serde_json::from_str::<OpenCageResponse>(&text)
                .ok()
                .and_then(|r| r.status)
                .map(|s| s.message)
                .unwrap_or(text);
            return Err(GeocodeError::ApiError { status, message });
        }

        let parsed: OpenCageResponse = serde_json::from_str(&text)?;
        let suggestions = to_suggestions(parsed);
        debug!(count = suggestions.len(), "OpenCageClient::search: success");
        Ok(suggestions)
    }
}

// OpenCage API wire types

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
    #[serde(default)]
    status: Option<OpenCageStatus>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    #[serde(default)]
    formatted: String,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OpenCageStatus {
    message: String,
}
