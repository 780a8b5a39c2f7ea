//! Filter stage: parses raw filter values and selects matching crashes.
//!
//! All filters are ANDed together; the values inside one filter are ORed.
//! The result is a view of borrowed records, so the shared dataset is never
//! copied or mutated.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use crash_map_analytics_models::{CrashFilter, DateRange, FilterParams};
use crash_map_crash_models::{CauseClass, CrashRecord, InjuryTag};
use crash_map_dataset::CrashDataset;
use crash_map_dataset::parsing::parse_date;

use crate::AnalyticsError;

/// Parses raw filter values into a [`CrashFilter`].
///
/// Unknown injury tags and cause classes are ignored.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidDate`] if a date bound cannot be parsed.
pub fn parse_filter(params: &FilterParams) -> Result<CrashFilter, AnalyticsError> {
    Ok(CrashFilter {
        date: DateRange::new(
            parse_bound(params.date_start.as_deref())?,
            parse_bound(params.date_end.as_deref())?,
        ),
        damage: split_values(params.damage.as_deref()),
        crash_types: split_values(params.crash_type.as_deref()),
        injuries: split_tags::<InjuryTag>(params.injuries.as_deref()),
        causes: split_tags::<CauseClass>(params.cause.as_deref()),
        lighting: split_values(params.lighting.as_deref()),
    })
}

/// Parses one optional date bound. Blank values are treated as absent.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidDate`] if the value is not a date.
pub fn parse_bound(value: Option<&str>) -> Result<Option<NaiveDate>, AnalyticsError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| AnalyticsError::InvalidDate {
                value: s.to_string(),
            }),
    }
}

/// Dataset values whose text contains a comma followed by a space.
const SPACED_COMMA_VALUES: &[&str] = &["DARKNESS, LIGHTED ROAD"];

/// Splits a comma-separated list of literal dataset values.
///
/// Several dataset values contain commas themselves (`$501 - $1,500`,
/// `DARKNESS, LIGHTED ROAD`). A piece that starts with a digit is a
/// thousands group and is joined back onto the previous value. A piece that
/// starts with whitespace is joined back only when the result is one of the
/// known spaced values, so `DAYLIGHT, DUSK` still reads as two values.
#[must_use]
pub fn split_values(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    let mut values: Vec<String> = Vec::new();
    for piece in value.split(',') {
        let continues = values.last().is_some_and(|last| {
            piece.starts_with(|c: char| c.is_ascii_digit())
                || (piece.starts_with(char::is_whitespace)
                    && is_spaced_prefix(&format!("{},{piece}", last.trim_start())))
        });
        match values.last_mut() {
            Some(last) if continues => {
                last.push(',');
                last.push_str(piece);
            }
            _ => values.push(piece.to_string()),
        }
    }

    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn is_spaced_prefix(joined: &str) -> bool {
    SPACED_COMMA_VALUES.iter().any(|v| v.starts_with(joined))
}

/// Splits a comma-separated list of tags, dropping unknown ones.
fn split_tags<T: FromStr>(value: Option<&str>) -> Vec<T> {
    value
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .filter_map(|tag| {
                    let parsed = tag.parse().ok();
                    if parsed.is_none() {
                        log::debug!("Ignoring unknown filter tag {tag:?}");
                    }
                    parsed
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Applies `filter` to every crash in `dataset`.
///
/// Cause-class filters are skipped when the dataset has no cause column.
#[must_use]
pub fn apply_filter<'a>(dataset: &'a CrashDataset, filter: &CrashFilter) -> Vec<&'a CrashRecord> {
    filter_records(dataset.records(), filter, dataset.has_cause_column())
}

/// Applies `filter` to `records`.
///
/// `has_cause_column` tells whether cause strings were available at load
/// time; without them the cause filter imposes no constraint.
#[must_use]
pub fn filter_records<'a>(
    records: &'a [CrashRecord],
    filter: &CrashFilter,
    has_cause_column: bool,
) -> Vec<&'a CrashRecord> {
    if filter.is_empty() {
        return records.iter().collect();
    }

    let causes: Option<BTreeSet<&'static str>> = (has_cause_column && !filter.causes.is_empty())
        .then(|| {
            filter
                .causes
                .iter()
                .flat_map(|class| class.causes().iter().copied())
                .collect()
        });

    records
        .iter()
        .filter(|record| matches(record, filter, causes.as_ref()))
        .collect()
}

fn matches(
    record: &CrashRecord,
    filter: &CrashFilter,
    causes: Option<&BTreeSet<&'static str>>,
) -> bool {
    filter.date.contains(record.crash_date)
        && in_list(&filter.damage, record.damage.as_deref())
        && in_list(&filter.crash_types, record.crash_type.as_deref())
        && (filter.injuries.is_empty() || filter.injuries.iter().any(|tag| tag.matches(record)))
        && causes.is_none_or(|set| record.cause.as_deref().is_some_and(|c| set.contains(c)))
        && in_list(&filter.lighting, record.lighting.as_deref())
}

fn in_list(accepted: &[String], value: Option<&str>) -> bool {
    accepted.is_empty() || value.is_some_and(|v| accepted.iter().any(|a| a == v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crash_map_crash_models::{InjuryCounts, NON_USER_ERROR, USER_ERROR, VEHICLE_ERROR};
    use crash_map_dataset::progress::null_progress;

    fn record(cause: &str, injuries: InjuryCounts, score: f64) -> CrashRecord {
        CrashRecord {
            cause: Some(cause.to_string()),
            injuries,
            injury_score: score,
            ..CrashRecord::default()
        }
    }

    fn sample_records() -> Vec<CrashRecord> {
        vec![
            record(USER_ERROR[0], InjuryCounts::default(), 0.0),
            record(
                NON_USER_ERROR[0],
                InjuryCounts {
                    non_incapacitating: 1,
                    ..InjuryCounts::default()
                },
                1.0,
            ),
            record(
                VEHICLE_ERROR[0],
                InjuryCounts {
                    fatal: 1,
                    ..InjuryCounts::default()
                },
                10.0,
            ),
            record(
                "UNABLE TO DETERMINE",
                InjuryCounts {
                    non_incapacitating: 2,
                    fatal: 1,
                    ..InjuryCounts::default()
                },
                12.0,
            ),
        ]
    }

    fn params() -> FilterParams {
        FilterParams::default()
    }

    #[test]
    fn no_filters_returns_everything() {
        let records = sample_records();
        let filter = parse_filter(&params()).unwrap();
        let out = filter_records(&records, &filter, true);
        assert_eq!(out.len(), records.len());
    }

    #[test]
    fn injury_tags_are_ored() {
        let records = sample_records();
        let filter = parse_filter(&FilterParams {
            injuries: Some("non_incapacitating,fatal".to_string()),
            ..params()
        })
        .unwrap();
        let out = filter_records(&records, &filter, true);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.injury_score > 0.0));
    }

    #[test]
    fn none_tag_selects_zero_score() {
        let records = sample_records();
        let filter = parse_filter(&FilterParams {
            injuries: Some("none".to_string()),
            ..params()
        })
        .unwrap();
        let out = filter_records(&records, &filter, true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cause.as_deref(), Some(USER_ERROR[0]));
    }

    #[test]
    fn cause_classes_union() {
        let records = sample_records();
        let filter = parse_filter(&FilterParams {
            cause: Some("user,vehicle".to_string()),
            ..params()
        })
        .unwrap();
        let out = filter_records(&records, &filter, true);
        let causes: Vec<&str> = out.iter().filter_map(|r| r.cause.as_deref()).collect();
        assert_eq!(causes, vec![USER_ERROR[0], VEHICLE_ERROR[0]]);
    }

    #[test]
    fn cause_filter_ignored_without_cause_column() {
        let records = sample_records();
        let filter = parse_filter(&FilterParams {
            cause: Some("vehicle".to_string()),
            ..params()
        })
        .unwrap();
        assert_eq!(filter_records(&records, &filter, false).len(), records.len());
    }

    #[test]
    fn unknown_tags_impose_no_constraint() {
        let records = sample_records();
        let filter = parse_filter(&FilterParams {
            cause: Some("aliens".to_string()),
            injuries: Some("bruised".to_string()),
            ..params()
        })
        .unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter_records(&records, &filter, true).len(), records.len());
    }

    #[test]
    fn invalid_date_is_an_error() {
        let err = parse_filter(&FilterParams {
            date_start: Some("yesterday".to_string()),
            ..params()
        })
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidDate { .. }));
    }

    #[test]
    fn blank_dates_are_ignored() {
        let filter = parse_filter(&FilterParams {
            date_start: Some(String::new()),
            date_end: Some("  ".to_string()),
            ..params()
        })
        .unwrap();
        assert_eq!(filter.date, DateRange::default());
    }

    #[test]
    fn values_with_commas_survive_splitting() {
        assert_eq!(
            split_values(Some("$500 OR LESS,$501 - $1,500,OVER $1,500")),
            vec!["$500 OR LESS", "$501 - $1,500", "OVER $1,500"]
        );
        assert_eq!(
            split_values(Some("DAYLIGHT,DARKNESS, LIGHTED ROAD,DUSK")),
            vec!["DAYLIGHT", "DARKNESS, LIGHTED ROAD", "DUSK"]
        );
        assert_eq!(
            split_values(Some("DAYLIGHT, DUSK")),
            vec!["DAYLIGHT", "DUSK"]
        );
        assert_eq!(
            split_values(Some("DUSK, DARKNESS, LIGHTED ROAD")),
            vec!["DUSK", "DARKNESS, LIGHTED ROAD"]
        );
        assert!(split_values(Some("")).is_empty());
        assert!(split_values(None).is_empty());
    }

    #[test]
    fn filters_dataset_by_date_and_lighting() {
        let csv = "\
CRASH_DATE_ONLY,LIGHTING_CONDITION,DAMAGE
2022-12-31,DAYLIGHT,OVER $1500
2023-01-01,\"DARKNESS, LIGHTED ROAD\",OVER $1500
2023-02-15,DAYLIGHT,$500 OR LESS
2023-03-31,DUSK,OVER $1500
2023-04-01,DAYLIGHT,OVER $1500
,DAYLIGHT,OVER $1500
";
        let dataset = CrashDataset::from_reader(csv.as_bytes(), &null_progress()).unwrap();

        let filter = parse_filter(&FilterParams {
            date_start: Some("2023-01-01".to_string()),
            date_end: Some("2023-03-31".to_string()),
            ..params()
        })
        .unwrap();
        assert_eq!(apply_filter(&dataset, &filter).len(), 3);

        let filter = parse_filter(&FilterParams {
            date_start: Some("2023-01-01".to_string()),
            lighting: Some("DAYLIGHT,DARKNESS, LIGHTED ROAD".to_string()),
            damage: Some("OVER $1500".to_string()),
            ..params()
        })
        .unwrap();
        let out = apply_filter(&dataset, &filter);
        assert_eq!(out.len(), 2);
        for r in &out {
            assert!(dataset.records().iter().any(|base| std::ptr::eq(base, *r)));
        }

        let filter = parse_filter(&FilterParams {
            date_start: Some("2023-01-01".to_string()),
            lighting: Some("DAYLIGHT, DUSK".to_string()),
            ..params()
        })
        .unwrap();
        assert_eq!(filter.lighting, vec!["DAYLIGHT", "DUSK"]);
        assert_eq!(apply_filter(&dataset, &filter).len(), 3);
    }
}
