//! Ranking stage: groups filtered crashes by street or spatial bin and
//! orders the groups by one of three criteria.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crash_map_analytics_models::{
    DateRange, GroupBy, RankType, RankingRow, SpatialBin, months_spanned, round_to,
};
use crash_map_crash_models::CrashRecord;

/// Inputs that shape a ranking besides the records themselves.
#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    /// Ordering criterion.
    pub rank_type: RankType,
    /// Grouping key.
    pub group_by: GroupBy,
    /// Maximum rows returned.
    pub limit: usize,
    /// Period used for crashes-per-month when the request does not give
    /// both date bounds.
    pub default_period: (NaiveDate, NaiveDate),
}

/// Running totals for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTotals {
    /// Crashes in the group.
    pub count: u64,
    /// Summed fatalities.
    pub fatal: u64,
    /// Summed incapacitating injuries.
    pub incapacitating: u64,
    /// Summed non-incapacitating injuries.
    pub non_incapacitating: u64,
    /// Summed injury score.
    pub injury_score: f64,
}

impl GroupTotals {
    fn add(&mut self, record: &CrashRecord) {
        self.count += 1;
        self.fatal += u64::from(record.injuries.fatal);
        self.incapacitating += u64::from(record.injuries.incapacitating);
        self.non_incapacitating += u64::from(record.injuries.non_incapacitating);
        self.injury_score += record.injury_score;
    }

    /// Injury score per crash.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_injury_score(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.injury_score / self.count as f64
        }
    }
}

/// Number of months used to normalize counts for `range`.
#[must_use]
pub fn normalization_months(range: DateRange, default_period: (NaiveDate, NaiveDate)) -> u32 {
    match (range.start, range.end) {
        (Some(start), Some(end)) => months_spanned(start, end),
        _ => months_spanned(default_period.0, default_period.1),
    }
}

/// Aggregates `records` into named groups, sorted by name.
///
/// Records without a street name (street grouping) or without a location
/// (location grouping) belong to no group.
#[must_use]
pub fn group_records(records: &[&CrashRecord], group_by: GroupBy) -> Vec<(String, GroupTotals)> {
    match group_by {
        GroupBy::Street => {
            let mut groups: BTreeMap<&str, GroupTotals> = BTreeMap::new();
            for record in records {
                if let Some(street) = record.street_name.as_deref() {
                    groups.entry(street).or_default().add(record);
                }
            }
            groups
                .into_iter()
                .map(|(name, totals)| (name.to_string(), totals))
                .collect()
        }
        GroupBy::Location => {
            let mut groups: BTreeMap<SpatialBin, GroupTotals> = BTreeMap::new();
            for record in records {
                if let Some((lat, lon)) = record.location() {
                    groups
                        .entry(SpatialBin::from_coordinates(lat, lon))
                        .or_default()
                        .add(record);
                }
            }
            let mut named: Vec<(String, GroupTotals)> = groups
                .into_iter()
                .map(|(bin, totals)| (bin.label(), totals))
                .collect();
            named.sort_by(|a, b| a.0.cmp(&b.0));
            named
        }
    }
}

/// Ranks `records` and returns at most `options.limit` rows, best first.
///
/// Ties on the ranking key keep ascending name order.
#[must_use]
pub fn rank_records(
    records: &[&CrashRecord],
    range: DateRange,
    options: &RankingOptions,
) -> Vec<RankingRow> {
    let months = normalization_months(range, options.default_period);
    let mut groups = group_records(records, options.group_by);
    log::debug!(
        "Ranking {} groups by {} over {months} month(s)",
        groups.len(),
        options.rank_type
    );

    let key = |totals: &GroupTotals| -> f64 { sort_key(options.rank_type, totals) };
    groups.sort_by(|a, b| key(&b.1).total_cmp(&key(&a.1)));
    groups.truncate(options.limit);

    groups
        .into_iter()
        .map(|(name, totals)| build_row(name, &totals, months, options.rank_type))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn sort_key(rank_type: RankType, totals: &GroupTotals) -> f64 {
    match rank_type {
        RankType::Frequency => totals.count as f64,
        RankType::Weighted => totals.injury_score,
        RankType::Dangerous => totals.average_injury_score(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn build_row(name: String, totals: &GroupTotals, months: u32, rank_type: RankType) -> RankingRow {
    let crashes_per_month = round_to(totals.count as f64 / f64::from(months), 2);
    let with_injuries = rank_type != RankType::Frequency;

    RankingRow {
        name,
        injuries_fatal: with_injuries.then_some(totals.fatal),
        injuries_incapacitating: with_injuries.then_some(totals.incapacitating),
        injuries_non_incapacitating: with_injuries.then_some(totals.non_incapacitating),
        count: totals.count,
        crashes_per_month,
        injury_score: with_injuries.then_some(totals.injury_score),
        average_injury_score: (rank_type == RankType::Dangerous)
            .then(|| totals.average_injury_score()),
    }
}
