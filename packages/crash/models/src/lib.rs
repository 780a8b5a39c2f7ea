#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crash record types and contributory cause classification.
//!
//! Defines the in-memory shape of one traffic crash row, the injury
//! severity tags used by the injury filter, and the static tables that map
//! a recorded primary contributory cause onto one of three cause classes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Causes attributed to the driver or another road user.
pub const USER_ERROR: &[&str] = &[
    "DRIVING SKILLS/KNOWLEDGE/EXPERIENCE",
    "FAILING TO REDUCE SPEED TO AVOID CRASH",
    "IMPROPER OVERTAKING/PASSING",
    "FOLLOWING TOO CLOSELY",
    "DISTRACTION - FROM OUTSIDE VEHICLE",
    "FAILING TO YIELD RIGHT-OF-WAY",
    "DISREGARDING STOP SIGN",
    "IMPROPER LANE USAGE",
    "IMPROPER TURNING/NO SIGNAL",
    "OPERATING VEHICLE IN ERRATIC, RECKLESS, CARELESS, NEGLIGENT OR AGGRESSIVE MANNER",
    "IMPROPER BACKING",
    "DISTRACTION - FROM INSIDE VEHICLE",
    "DRIVING ON WRONG SIDE/WRONG WAY",
    "DISREGARDING TRAFFIC SIGNALS",
    "CELL PHONE USE OTHER THAN TEXTING",
    "PHYSICAL CONDITION OF DRIVER",
    "DISREGARDING OTHER TRAFFIC SIGNS",
    "RELATED TO BUS STOP",
    "DISREGARDING ROAD MARKINGS",
    "TURNING RIGHT ON RED",
    "UNDER THE INFLUENCE OF ALCOHOL/DRUGS (USE WHEN ARREST IS EFFECTED)",
    "HAD BEEN DRINKING (USE WHEN ARREST IS NOT MADE)",
    "TEXTING",
    "OBSTRUCTED CROSSWALKS",
    "DISTRACTION - OTHER ELECTRONIC DEVICE (NAVIGATION DEVICE, DVD PLAYER, ETC.)",
    "PASSING STOPPED SCHOOL BUS",
    "DISREGARDING YIELD SIGN",
    "BICYCLE ADVANCING LEGALLY ON RED LIGHT",
    "MOTORCYCLE ADVANCING LEGALLY ON RED LIGHT",
    "EXCEEDING AUTHORIZED SPEED LIMIT",
    "EXCEEDING SAFE SPEED FOR CONDITIONS",
];

/// Causes outside the control of any road user (environment, road, animals).
pub const NON_USER_ERROR: &[&str] = &[
    "ANIMAL",
    "ROAD ENGINEERING/SURFACE/MARKING DEFECTS",
    "VISION OBSCURED (SIGNS, TREE LIMBS, BUILDINGS, ETC.)",
    "EVASIVE ACTION DUE TO ANIMAL, OBJECT, NONMOTORIST",
    "WEATHER",
    "ROAD CONSTRUCTION/MAINTENANCE",
];

/// Causes attributed to the vehicle itself.
pub const VEHICLE_ERROR: &[&str] = &["EQUIPMENT - VEHICLE CONDITION"];

/// Classification of a crash's primary contributory cause.
///
/// Parsed from the `cause` query parameter values `user`, `non_user` and
/// `vehicle`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CauseClass {
    /// Driver or road-user error
    User,
    /// Environment, road condition, animal
    NonUser,
    /// Vehicle equipment failure
    Vehicle,
}

impl CauseClass {
    /// Returns the cause strings that belong to this class.
    #[must_use]
    pub const fn causes(self) -> &'static [&'static str] {
        match self {
            Self::User => USER_ERROR,
            Self::NonUser => NON_USER_ERROR,
            Self::Vehicle => VEHICLE_ERROR,
        }
    }

    /// Classifies a recorded cause string, or `None` if it belongs to no
    /// table (e.g. `UNABLE TO DETERMINE`).
    #[must_use]
    pub fn classify(cause: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|class| class.causes().contains(&cause))
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::User, Self::NonUser, Self::Vehicle]
    }
}

/// Injury severity tag accepted by the `injuries` filter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InjuryTag {
    /// No injury at all (injury score of exactly zero)
    None,
    /// At least one non-incapacitating injury
    NonIncapacitating,
    /// At least one incapacitating injury
    Incapacitating,
    /// At least one fatality
    Fatal,
}

impl InjuryTag {
    /// Whether `record` satisfies this tag.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(self, record: &CrashRecord) -> bool {
        match self {
            Self::None => record.injury_score == 0.0,
            Self::NonIncapacitating => record.injuries.non_incapacitating > 0,
            Self::Incapacitating => record.injuries.incapacitating > 0,
            Self::Fatal => record.injuries.fatal > 0,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::None,
            Self::NonIncapacitating,
            Self::Incapacitating,
            Self::Fatal,
        ]
    }
}

/// Per-severity injury counts for one crash or an aggregate of crashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryCounts {
    /// People with no indication of injury.
    pub no_indication: u32,
    /// Non-incapacitating injuries.
    pub non_incapacitating: u32,
    /// Incapacitating injuries.
    pub incapacitating: u32,
    /// Fatalities.
    pub fatal: u32,
}

/// One traffic crash as loaded from the source CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashRecord {
    /// Source crash identifier.
    pub id: Option<String>,
    /// Calendar date of the crash.
    pub crash_date: Option<NaiveDate>,
    /// Latitude. `None` or zero means the crash has no location.
    pub latitude: Option<f64>,
    /// Longitude. `None` or zero means the crash has no location.
    pub longitude: Option<f64>,
    /// Estimated damage bracket (e.g. `OVER $1,500`).
    pub damage: Option<String>,
    /// Crash type (e.g. `INJURY AND / OR TOW DUE TO CRASH`).
    pub crash_type: Option<String>,
    /// Injury counts by severity.
    pub injuries: InjuryCounts,
    /// Weighted injury severity score, computed upstream.
    pub injury_score: f64,
    /// Primary contributory cause.
    pub cause: Option<String>,
    /// Lighting condition at the time of the crash.
    pub lighting: Option<String>,
    /// Street the crash occurred on.
    pub street_name: Option<String>,
}

impl CrashRecord {
    /// Returns `(latitude, longitude)` if both are present and non-zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn location(&self) -> Option<(f64, f64)> {
        let latitude = self.latitude?;
        let longitude = self.longitude?;
        if latitude == 0.0 || longitude == 0.0 || latitude.is_nan() || longitude.is_nan() {
            return None;
        }
        Some((latitude, longitude))
    }
}
