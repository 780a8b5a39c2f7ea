#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Heatmap rendering for filtered crashes.
//!
//! Picks the points to draw (valid coordinates only, capped by a seeded
//! sample) and renders them into a standalone Leaflet page using the
//! `leaflet.heat` plugin.

pub mod html;

use crash_map_crash_models::CrashRecord;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

pub use html::{render_error, render_heatmap};

/// Map center used when no crash has a usable location (downtown Chicago).
pub const DEFAULT_CENTER: (f64, f64) = (41.878_1, -87.629_8);

/// Point selection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    /// Maximum number of points drawn.
    pub max_points: usize,
    /// Seed for the sampling RNG, so repeated requests draw the same map.
    pub sample_seed: u64,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            max_points: 10_000,
            sample_seed: 42,
        }
    }
}

/// Collects `(latitude, longitude)` pairs for `records` that have a valid
/// location.
///
/// When more than `options.max_points` qualify, a seeded random subset of
/// exactly that size is kept. Selected points stay in dataset order.
#[must_use]
pub fn select_points(records: &[&CrashRecord], options: HeatmapOptions) -> Vec<(f64, f64)> {
    let points: Vec<(f64, f64)> = records.iter().filter_map(|r| r.location()).collect();

    if points.len() <= options.max_points {
        return points;
    }

    log::debug!(
        "Sampling {} of {} heatmap points (seed {})",
        options.max_points,
        points.len(),
        options.sample_seed
    );

    let mut rng = StdRng::seed_from_u64(options.sample_seed);
    let mut indices = rand::seq::index::sample(&mut rng, points.len(), options.max_points).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|i| points[i]).collect()
}

/// Mean coordinate of `points`, or [`DEFAULT_CENTER`] if there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn center_of(points: &[(f64, f64)]) -> (f64, f64) {
    if points.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.0, lon + p.1));
    (lat / n, lon / n)
}
