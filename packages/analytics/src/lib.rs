#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash filtering, spatial binning and ranking.
//!
//! [`filter`] selects crashes from the shared dataset; [`ranking`] groups
//! the selection by street or spatial bin and orders the groups. The
//! [`rank_crashes`] entry point chains both for the ranking endpoint.

pub mod filter;
pub mod ranking;

use crash_map_analytics_models::{FilterParams, GroupBy, RankType, RankingResult};
use crash_map_dataset::CrashDataset;
use thiserror::Error;

pub use ranking::RankingOptions;

/// Message returned alongside an empty ranking.
pub const NO_MATCHES_MESSAGE: &str = "No data matches your filter criteria";

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A date bound could not be parsed.
    #[error("Invalid date '{value}'. Expected format: YYYY-MM-DD")]
    InvalidDate {
        /// The rejected value.
        value: String,
    },
}

/// A ranking request as received from a caller.
#[derive(Debug, Clone)]
pub struct RankingRequest {
    /// Filter values.
    pub filters: FilterParams,
    /// Ranking criterion, echoed back verbatim.
    pub rank_type: String,
    /// Grouping key, echoed back verbatim.
    pub group_by: String,
    /// Maximum rows returned.
    pub limit: usize,
}

/// Filters `dataset` and ranks the matching crashes.
///
/// An empty selection yields an empty ranking with an explanatory message
/// rather than an error.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the filter values cannot be parsed.
pub fn rank_crashes(
    dataset: &CrashDataset,
    request: &RankingRequest,
    default_period: (chrono::NaiveDate, chrono::NaiveDate),
) -> Result<RankingResult, AnalyticsError> {
    let filter = filter::parse_filter(&request.filters)?;
    let selected = filter::apply_filter(dataset, &filter);

    if selected.is_empty() {
        log::debug!("No crashes match {filter:?}");
        return Ok(RankingResult {
            ranking: Vec::new(),
            rank_type: request.rank_type.clone(),
            group_by: request.group_by.clone(),
            total_crashes: 0,
            message: Some(NO_MATCHES_MESSAGE.to_string()),
        });
    }

    let options = RankingOptions {
        rank_type: RankType::from_param(&request.rank_type),
        group_by: GroupBy::from_param(&request.group_by),
        limit: request.limit,
        default_period,
    };
    let ranking = ranking::rank_records(&selected, filter.date, &options);

    Ok(RankingResult {
        ranking,
        rank_type: request.rank_type.clone(),
        group_by: request.group_by.clone(),
        total_crashes: selected.len(),
        message: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crash_map_dataset::progress::null_progress;

    const CSV: &str = "\
CRASH_DATE_ONLY,LATITUDE,LONGITUDE,INJURIES_FATAL,INJURY_SCORE,PRIM_CONTRIBUTORY_CAUSE,STREET_NAME
2023-01-10,41.8780,-87.6298,0,0,TEXTING,STATE ST
2023-01-11,41.8781,-87.6299,1,10,WEATHER,STATE ST
2023-02-01,41.9000,-87.7000,0,2,TEXTING,MADISON ST
2023-03-05,41.9000,-87.7000,0,8,EQUIPMENT - VEHICLE CONDITION,MADISON ST
2023-03-06,41.9500,-87.6500,0,3,UNABLE TO DETERMINE,HALSTED ST
";

    fn dataset() -> CrashDataset {
        CrashDataset::from_reader(CSV.as_bytes(), &null_progress()).unwrap()
    }

    fn period() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2017, 10, 24).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 24).unwrap(),
        )
    }

    fn request(rank_type: &str, group_by: &str, filters: FilterParams) -> RankingRequest {
        RankingRequest {
            filters,
            rank_type: rank_type.to_string(),
            group_by: group_by.to_string(),
            limit: 10,
        }
    }

    #[test]
    fn empty_selection_has_message() {
        let filters = FilterParams {
            date_start: Some("2030-01-01".to_string()),
            ..FilterParams::default()
        };
        let result = rank_crashes(&dataset(), &request("frequency", "street", filters), period())
            .unwrap();
        assert!(result.ranking.is_empty());
        assert_eq!(result.total_crashes, 0);
        assert!(result.message.is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn empty_selection_serializes_expected_shape() {
        let filters = FilterParams {
            injuries: Some("incapacitating".to_string()),
            ..FilterParams::default()
        };
        let result =
            rank_crashes(&dataset(), &request("weighted", "location", filters), period()).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ranking"], serde_json::json!([]));
        assert_eq!(value["total_crashes"], serde_json::json!(0));
        assert_eq!(value["message"], serde_json::json!(NO_MATCHES_MESSAGE));
        assert_eq!(value["rank_type"], serde_json::json!("weighted"));
    }

    #[test]
    fn unknown_rank_type_falls_back_to_dangerous() {
        let result = rank_crashes(
            &dataset(),
            &request("scariest", "street", FilterParams::default()),
            period(),
        )
        .unwrap();
        assert_eq!(result.rank_type, "scariest");
        let names: Vec<&str> = result.ranking.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["MADISON ST", "STATE ST", "HALSTED ST"]);
        assert_eq!(result.ranking[0].average_injury_score, Some(5.0));
    }

    #[test]
    fn cause_filter_then_rank() {
        let filters = FilterParams {
            cause: Some("user,vehicle".to_string()),
            date_start: Some("2023-01-01".to_string()),
            date_end: Some("2023-03-31".to_string()),
            ..FilterParams::default()
        };
        let result =
            rank_crashes(&dataset(), &request("frequency", "street", filters), period()).unwrap();
        assert_eq!(result.total_crashes, 3);
        assert_eq!(result.ranking[0].name, "MADISON ST");
        assert_eq!(result.ranking[0].count, 2);
        assert!((result.ranking[0].crashes_per_month - 0.67).abs() < 1e-9);
    }

    #[test]
    fn invalid_date_propagates() {
        let filters = FilterParams {
            date_end: Some("31/31/2023".to_string()),
            ..FilterParams::default()
        };
        assert!(
            rank_crashes(&dataset(), &request("frequency", "street", filters), period()).is_err()
        );
    }
}
