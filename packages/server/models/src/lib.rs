#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crash map server.
//!
//! Query parameter names and response keys match what the existing
//! frontend sends and reads, so they use `snake_case` (and the uppercase
//! ranking columns defined in the analytics models).

use crash_map_analytics_models::FilterParams;
use serde::{Deserialize, Serialize};

/// Default number of rows returned by the sample endpoint.
pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

/// Query parameters for the heatmap endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapQueryParams {
    /// Earliest crash date, inclusive.
    pub date_start: Option<String>,
    /// Latest crash date, inclusive.
    pub date_end: Option<String>,
    /// Comma-separated damage values.
    pub damage: Option<String>,
    /// Comma-separated crash types.
    pub crash_type: Option<String>,
    /// Comma-separated injury tags.
    pub injuries: Option<String>,
    /// Comma-separated cause classes.
    pub cause: Option<String>,
    /// Comma-separated lighting conditions.
    pub lighting: Option<String>,
}

/// Query parameters for the ranking endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQueryParams {
    /// `frequency`, `weighted` or `dangerous`.
    pub rank_type: Option<String>,
    /// `street` or `location`.
    pub group_by: Option<String>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Earliest crash date, inclusive.
    pub date_start: Option<String>,
    /// Latest crash date, inclusive.
    pub date_end: Option<String>,
    /// Comma-separated damage values.
    pub damage: Option<String>,
    /// Comma-separated crash types.
    pub crash_type: Option<String>,
    /// Comma-separated injury tags.
    pub injuries: Option<String>,
    /// Comma-separated cause classes.
    pub cause: Option<String>,
    /// Comma-separated lighting conditions.
    pub lighting: Option<String>,
}

impl RankingQueryParams {
    /// Ranking criterion, defaulting to `frequency`.
    #[must_use]
    pub fn rank_type(&self) -> &str {
        self.rank_type.as_deref().unwrap_or("frequency")
    }

    /// Grouping key, defaulting to `street`.
    #[must_use]
    pub fn group_by(&self) -> &str {
        self.group_by.as_deref().unwrap_or("street")
    }
}

impl From<&MapQueryParams> for FilterParams {
    fn from(p: &MapQueryParams) -> Self {
        Self {
            date_start: p.date_start.clone(),
            date_end: p.date_end.clone(),
            damage: p.damage.clone(),
            crash_type: p.crash_type.clone(),
            injuries: p.injuries.clone(),
            cause: p.cause.clone(),
            lighting: p.lighting.clone(),
        }
    }
}

impl From<&RankingQueryParams> for FilterParams {
    fn from(p: &RankingQueryParams) -> Self {
        Self {
            date_start: p.date_start.clone(),
            date_end: p.date_end.clone(),
            damage: p.damage.clone(),
            crash_type: p.crash_type.clone(),
            injuries: p.injuries.clone(),
            cause: p.cause.clone(),
            lighting: p.lighting.clone(),
        }
    }
}

/// Query parameters for the sample endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleQueryParams {
    /// Number of rows to return.
    pub limit: Option<usize>,
}

/// Root liveness response.
#[derive(Debug, Serialize)]
pub struct ApiStatus {
    /// Fixed status message.
    pub status: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Column listing.
#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    /// CSV header names in file order.
    pub columns: Vec<String>,
}

/// Raw row sample.
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    /// Rows keyed by column name.
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Error body shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body from anything printable.
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_defaults() {
        let params = RankingQueryParams::default();
        assert_eq!(params.rank_type(), "frequency");
        assert_eq!(params.group_by(), "street");
    }

    #[test]
    fn ranking_params_carry_filters() {
        let params = RankingQueryParams {
            rank_type: Some("weighted".to_string()),
            cause: Some("user".to_string()),
            date_end: Some("2024-01-01".to_string()),
            ..RankingQueryParams::default()
        };
        let filters = FilterParams::from(&params);
        assert_eq!(filters.cause.as_deref(), Some("user"));
        assert_eq!(filters.date_end.as_deref(), Some("2024-01-01"));
        assert_eq!(filters.damage, None);
    }

    #[test]
    fn error_body_shape() {
        let value = serde_json::to_value(ApiError::new("boom")).unwrap();
        assert_eq!(value, serde_json::json!({"error": "boom"}));
    }
}
