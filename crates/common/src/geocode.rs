//! Reverse geocoding.
//!
//! Converts a coordinate pair into a human-readable place name via an
//! external lookup service. Lookups are best-effort: any failure degrades
//! to a sentinel value so callers never fail on a missing place name.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::config::GeocodingConfig;

/// Sentinel returned when a place name cannot be resolved.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Reverse geocoding resolver backed by a Nominatim-compatible service.
#[derive(Debug, Clone)]
pub struct GeocodingResolver {
    client: Client,
    endpoint: String,
}

/// Relevant subset of the reverse geocoding response.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

impl GeocodingResolver {
    /// Create a new resolver from configuration.
    ///
    /// The underlying client carries a bounded timeout and an identifying
    /// User-Agent, as the lookup service requires.
    #[must_use]
    pub fn new(config: &GeocodingConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }

    /// Resolve a coordinate pair into a place name.
    ///
    /// Single attempt, no retries. Timeouts, non-success statuses,
    /// malformed bodies, and empty `display_name` values all degrade to
    /// [`UNKNOWN_LOCATION`] rather than an error.
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> String {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Reverse geocoding request failed");
                return UNKNOWN_LOCATION.to_string();
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Reverse geocoding returned non-success status");
            return UNKNOWN_LOCATION.to_string();
        }

        match response.json::<ReverseResponse>().await {
            Ok(body) => place_name_from(body),
            Err(e) => {
                warn!(error = %e, "Failed to parse reverse geocoding response");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

/// Extract a usable place name, falling back to the sentinel.
fn place_name_from(body: ReverseResponse) -> String {
    match body.display_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => UNKNOWN_LOCATION.to_string(),
    }
}
