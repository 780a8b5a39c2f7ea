#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter, ranking and spatial-bin types for crash analytics.
//!
//! [`FilterParams`] carries the raw comma-separated strings received from
//! callers; [`CrashFilter`] is the parsed form applied to records. Ranking
//! output rows keep the upper-case column keys the web frontend reads.

use chrono::{Datelike, NaiveDate};
use crash_map_crash_models::{CauseClass, InjuryTag};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Spatial grid cell size in degrees (about 50 meters of latitude).
pub const BIN_SIZE: f64 = 0.00045;

/// Decimal places kept when displaying a bin center.
pub const BIN_DISPLAY_DECIMALS: i32 = 5;

/// Default number of ranking rows.
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// Raw filter values as received from a caller.
///
/// Multi-valued filters are comma-separated. Empty strings are treated the
/// same as absent values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    /// Inclusive start date.
    pub date_start: Option<String>,
    /// Inclusive end date.
    pub date_end: Option<String>,
    /// Accepted damage brackets.
    pub damage: Option<String>,
    /// Accepted crash types.
    pub crash_type: Option<String>,
    /// Injury tags (`none`, `non_incapacitating`, `incapacitating`, `fatal`).
    pub injuries: Option<String>,
    /// Cause classes (`user`, `non_user`, `vehicle`).
    pub cause: Option<String>,
    /// Accepted lighting conditions.
    pub lighting: Option<String>,
}

/// An inclusive calendar date range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest accepted date.
    pub start: Option<NaiveDate>,
    /// Latest accepted date.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a range from optional bounds.
    #[must_use]
    pub const fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether `date` lies in the range. A missing date never satisfies a
    /// bound, but passes an unbounded range.
    #[must_use]
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// Whether both bounds are set.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// Number of calendar months touched by `[start, end]`, counting both
/// boundary months. Never less than one.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn months_spanned(start: NaiveDate, end: NaiveDate) -> u32 {
    let months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32) + 1;
    u32::try_from(months).unwrap_or(0).max(1)
}

/// Parsed filter predicates. Empty lists mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrashFilter {
    /// Date bounds.
    pub date: DateRange,
    /// Accepted damage brackets.
    pub damage: Vec<String>,
    /// Accepted crash types.
    pub crash_types: Vec<String>,
    /// Injury tags, ORed together.
    pub injuries: Vec<InjuryTag>,
    /// Cause classes, ORed together.
    pub causes: Vec<CauseClass>,
    /// Accepted lighting conditions.
    pub lighting: Vec<String>,
}

impl CrashFilter {
    /// Whether no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date == DateRange::default()
            && self.damage.is_empty()
            && self.crash_types.is_empty()
            && self.injuries.is_empty()
            && self.causes.is_empty()
            && self.lighting.is_empty()
    }
}

/// Ranking criterion.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RankType {
    /// Most crashes first.
    Frequency,
    /// Highest summed injury score first.
    Weighted,
    /// Highest average injury score per crash first.
    Dangerous,
}

impl RankType {
    /// Parses a request value. Anything unrecognized ranks by
    /// [`RankType::Dangerous`].
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        value.trim().parse().unwrap_or(Self::Dangerous)
    }
}

/// Grouping key for rankings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupBy {
    /// Group by literal street name.
    Street,
    /// Group by [`SpatialBin`].
    Location,
}

impl GroupBy {
    /// Parses a request value. Anything other than `street` groups by
    /// [`GroupBy::Location`].
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        value.trim().parse().unwrap_or(Self::Location)
    }
}

/// A cell of the fixed-size spatial grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpatialBin {
    /// Latitude grid index.
    pub lat_index: i64,
    /// Longitude grid index.
    pub lon_index: i64,
}

impl SpatialBin {
    /// Bins a coordinate pair. Indices round half to even.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_index: (latitude / BIN_SIZE).round_ties_even() as i64,
            lon_index: (longitude / BIN_SIZE).round_ties_even() as i64,
        }
    }

    /// Center of the cell, rounded to [`BIN_DISPLAY_DECIMALS`] places.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self) -> (f64, f64) {
        (
            round_to(self.lat_index as f64 * BIN_SIZE, BIN_DISPLAY_DECIMALS),
            round_to(self.lon_index as f64 * BIN_SIZE, BIN_DISPLAY_DECIMALS),
        )
    }

    /// Display name of the cell: `"<lat>, <lon>"` of its center.
    #[must_use]
    pub fn label(self) -> String {
        let (lat, lon) = self.center();
        format!("{}, {}", format_coordinate(lat), format_coordinate(lon))
    }
}

/// Rounds `value` to `decimals` places, half to even.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Formats a coordinate with its shortest exact representation, always
/// keeping at least one decimal place (`41.0`, not `41`).
#[allow(clippy::float_cmp)]
fn format_coordinate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// One ranked group.
///
/// Columns that do not belong to the chosen [`RankType`] are left `None`
/// and omitted from the serialized row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RankingRow {
    /// Street name or bin label.
    #[serde(rename = "name")]
    pub name: String,
    /// Fatalities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injuries_fatal: Option<u64>,
    /// Incapacitating injuries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injuries_incapacitating: Option<u64>,
    /// Non-incapacitating injuries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injuries_non_incapacitating: Option<u64>,
    /// Number of crashes in the group.
    pub count: u64,
    /// Crashes per calendar month, two decimals.
    pub crashes_per_month: f64,
    /// Summed injury score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_score: Option<f64>,
    /// Injury score per crash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_injury_score: Option<f64>,
}

/// Result of a ranking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    /// Ranked rows, best first.
    pub ranking: Vec<RankingRow>,
    /// Ranking criterion as requested.
    pub rank_type: String,
    /// Grouping key as requested.
    pub group_by: String,
    /// Crashes that passed the filters.
    pub total_crashes: usize,
    /// Explanation when the ranking is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn months_are_inclusive() {
        assert_eq!(months_spanned(date("2023-01-01"), date("2023-03-31")), 3);
        assert_eq!(months_spanned(date("2023-01-15"), date("2023-01-20")), 1);
        assert_eq!(months_spanned(date("2017-10-24"), date("2025-10-24")), 97);
    }

    #[test]
    fn reversed_range_is_one_month() {
        assert_eq!(months_spanned(date("2024-05-01"), date("2023-01-01")), 1);
    }

    #[test]
    fn date_range_bounds() {
        let range = DateRange::new(Some(date("2023-01-01")), None);
        assert!(range.contains(Some(date("2023-01-01"))));
        assert!(!range.contains(Some(date("2022-12-31"))));
        assert!(!range.contains(None));
        assert!(DateRange::default().contains(None));
    }

    #[test]
    fn same_cell_same_bin() {
        let a = SpatialBin::from_coordinates(41.878_00, -87.629_80);
        let b = SpatialBin::from_coordinates(41.878_10, -87.629_90);
        assert_eq!(a, b);
    }

    #[test]
    fn adjacent_cells_differ() {
        let a = SpatialBin::from_coordinates(41.878_1, -87.629_8);
        let b = SpatialBin::from_coordinates(41.878_1 + BIN_SIZE, -87.629_8);
        let c = SpatialBin::from_coordinates(41.878_1, -87.629_8 - BIN_SIZE);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(b.lat_index - a.lat_index, 1);
    }

    #[test]
    fn bin_label_uses_center() {
        let bin = SpatialBin {
            lat_index: 93_062,
            lon_index: -194_733,
        };
        assert_eq!(bin.label(), "41.8779, -87.62985");
        assert_eq!(
            SpatialBin {
                lat_index: 0,
                lon_index: 0
            }
            .label(),
            "0.0, 0.0"
        );
    }

    #[test]
    fn unknown_rank_type_is_dangerous() {
        assert_eq!(RankType::from_param("frequency"), RankType::Frequency);
        assert_eq!(RankType::from_param("weighted"), RankType::Weighted);
        assert_eq!(RankType::from_param("worst"), RankType::Dangerous);
        assert_eq!(GroupBy::from_param("street"), GroupBy::Street);
        assert_eq!(GroupBy::from_param("grid"), GroupBy::Location);
    }

    #[test]
    fn frequency_row_omits_injury_columns() {
        let row = RankingRow {
            name: "STATE ST".to_string(),
            injuries_fatal: None,
            injuries_incapacitating: None,
            injuries_non_incapacitating: None,
            count: 4,
            crashes_per_month: 1.33,
            injury_score: None,
            average_injury_score: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "STATE ST", "COUNT": 4, "CRASHES_PER_MONTH": 1.33})
        );
    }
}
