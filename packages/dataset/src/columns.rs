//! Column layout of the crash CSV.
//!
//! Header positions are resolved once when the file is opened. Every field
//! except the header row itself is optional: a missing column simply leaves
//! the corresponding [`CrashRecord`] field empty.

use crash_map_crash_models::{CrashRecord, InjuryCounts};

use crate::parsing::{parse_count, parse_date, parse_f64, parse_text};

pub const CRASH_RECORD_ID: &str = "CRASH_RECORD_ID";
pub const CRASH_DATE_ONLY: &str = "CRASH_DATE_ONLY";
pub const CRASH_DATE: &str = "CRASH_DATE";
pub const LATITUDE: &str = "LATITUDE";
pub const LONGITUDE: &str = "LONGITUDE";
pub const DAMAGE: &str = "DAMAGE";
pub const CRASH_TYPE: &str = "CRASH_TYPE";
pub const INJURIES_NO_INDICATION: &str = "INJURIES_NO_INDICATION";
pub const INJURIES_NON_INCAPACITATING: &str = "INJURIES_NON_INCAPACITATING";
pub const INJURIES_INCAPACITATING: &str = "INJURIES_INCAPACITATING";
pub const INJURIES_FATAL: &str = "INJURIES_FATAL";
pub const INJURY_SCORE: &str = "INJURY_SCORE";
pub const LIGHTING_CONDITION: &str = "LIGHTING_CONDITION";
pub const STREET_NAME: &str = "STREET_NAME";

/// Candidate names for the primary contributory cause column, in priority
/// order. Different exports of the dataset use different spellings.
pub const CAUSE_COLUMN_CANDIDATES: &[&str] = &[
    "PRIM_CONTRIBUTORY_CAUSE",
    "PRIMARY_CONTRIBUTORY_CAUSE",
    "PRIMARY_CAUSE",
];

/// Resolved header indices for every field the loader understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    id: Option<usize>,
    date: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    damage: Option<usize>,
    crash_type: Option<usize>,
    no_indication: Option<usize>,
    non_incapacitating: Option<usize>,
    incapacitating: Option<usize>,
    fatal: Option<usize>,
    injury_score: Option<usize>,
    cause: Option<usize>,
    lighting: Option<usize>,
    street_name: Option<usize>,
    cause_column: Option<String>,
}

impl ColumnLayout {
    /// Resolves column positions from the CSV header row.
    #[must_use]
    pub fn resolve(headers: &[String]) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let cause_column = CAUSE_COLUMN_CANDIDATES
            .iter()
            .find(|candidate| find(**candidate).is_some())
            .map(|candidate| (*candidate).to_owned());

        Self {
            id: find(CRASH_RECORD_ID),
            date: find(CRASH_DATE_ONLY).or_else(|| find(CRASH_DATE)),
            latitude: find(LATITUDE),
            longitude: find(LONGITUDE),
            damage: find(DAMAGE),
            crash_type: find(CRASH_TYPE),
            no_indication: find(INJURIES_NO_INDICATION),
            non_incapacitating: find(INJURIES_NON_INCAPACITATING),
            incapacitating: find(INJURIES_INCAPACITATING),
            fatal: find(INJURIES_FATAL),
            injury_score: find(INJURY_SCORE),
            cause: cause_column.as_deref().and_then(find),
            lighting: find(LIGHTING_CONDITION),
            street_name: find(STREET_NAME),
            cause_column,
        }
    }

    /// Name of the cause column that was found, if any.
    #[must_use]
    pub fn cause_column(&self) -> Option<&str> {
        self.cause_column.as_deref()
    }

    /// Names of well-known columns absent from the header row.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.date, CRASH_DATE_ONLY),
            (self.latitude, LATITUDE),
            (self.longitude, LONGITUDE),
            (self.damage, DAMAGE),
            (self.crash_type, CRASH_TYPE),
            (self.non_incapacitating, INJURIES_NON_INCAPACITATING),
            (self.incapacitating, INJURIES_INCAPACITATING),
            (self.fatal, INJURIES_FATAL),
            (self.injury_score, INJURY_SCORE),
            (self.lighting, LIGHTING_CONDITION),
            (self.street_name, STREET_NAME),
        ]
        .into_iter()
        .filter_map(|(idx, name)| idx.is_none().then_some(name))
        .collect()
    }

    /// Builds a typed [`CrashRecord`] from one CSV row.
    #[must_use]
    pub fn parse_record(&self, row: &csv::StringRecord) -> CrashRecord {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");

        CrashRecord {
            id: parse_text(cell(self.id)),
            crash_date: parse_date(cell(self.date)),
            latitude: parse_f64(cell(self.latitude)),
            longitude: parse_f64(cell(self.longitude)),
            damage: parse_text(cell(self.damage)),
            crash_type: parse_text(cell(self.crash_type)),
            injuries: InjuryCounts {
                no_indication: parse_count(cell(self.no_indication)),
                non_incapacitating: parse_count(cell(self.non_incapacitating)),
                incapacitating: parse_count(cell(self.incapacitating)),
                fatal: parse_count(cell(self.fatal)),
            },
            injury_score: parse_f64(cell(self.injury_score)).unwrap_or(0.0),
            cause: parse_text(cell(self.cause)),
            lighting: parse_text(cell(self.lighting)),
            street_name: parse_text(cell(self.street_name)),
        }
    }
}
