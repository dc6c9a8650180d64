// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Tidal Windows
//!
//! Converts water level series into accessibility windows. A location is accessible for a craft
//! type while the gauge level is at or above `draft + under_keel_clearance - charted_depth`.
//! Crossings are interpolated linearly between the bounding samples and rounded to whole
//! seconds. Regions without data (explicit gap markers, or two known samples further apart than
//! the configured maximum gap) are never accessible.

use crate::err::InsufficientDataError;
use rayon::prelude::*;
use rescue_alloc_core::time::{TimeDelta, TimeInterval, TimePoint};
use rescue_alloc_model::{
    CombinedZone, CombinedZoneId, CraftTypeId, GaugeId, Instance, StationId, TidalConfig,
    TideSample, TideSeries,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

/// Gauge level at or above which a location with `charted_depth_m` is passable for a craft
/// with `draft_m`.
#[inline]
pub fn clearance_threshold(draft_m: f64, under_keel_clearance_m: f64, charted_depth_m: f64) -> f64 {
    draft_m + under_keel_clearance_m - charted_depth_m
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowScan {
    windows: Vec<TimeInterval<i64>>,
    discarded_short: usize,
    unknown: TimeDelta<i64>,
}

impl WindowScan {
    /// Accessibility windows inside the horizon, ordered and non-overlapping.
    #[inline]
    pub fn windows(&self) -> &[TimeInterval<i64>] {
        &self.windows
    }

    #[inline]
    pub fn into_windows(self) -> Vec<TimeInterval<i64>> {
        self.windows
    }

    /// Number of accessible runs dropped for being shorter than the minimum window.
    #[inline]
    pub fn discarded_short(&self) -> usize {
        self.discarded_short
    }

    /// Total time inside the horizon without usable data.
    #[inline]
    pub fn unknown(&self) -> TimeDelta<i64> {
        self.unknown
    }
}

/// Scans `series` for runs with level `>= threshold_m` inside `horizon`.
///
/// # Errors
///
/// Returns [`InsufficientDataError`] if the series has fewer than two known samples, or if the
/// first and last known samples do not bracket the horizon.
pub fn scan_windows(
    series: &TideSeries,
    threshold_m: f64,
    horizon: TimeInterval<i64>,
    cfg: &TidalConfig,
) -> Result<WindowScan, InsufficientDataError> {
    let samples = series.samples();
    let known: Vec<(TimePoint<i64>, f64)> = samples
        .iter()
        .filter_map(|s| known_level(s).map(|l| (s.time(), l)))
        .collect();
    let insufficient = || {
        InsufficientDataError::new(series.gauge(), horizon, series.span(), known.len())
    };
    let (Some(first), Some(last)) = (known.first(), known.last()) else {
        return Err(insufficient());
    };
    if known.len() < 2 || first.0 > horizon.start() || last.0 < horizon.end() {
        return Err(insufficient());
    }

    let mut runs: Vec<TimeInterval<i64>> = Vec::new();
    let mut unknown = TimeDelta::new(0);
    let mut push = |iv: TimeInterval<i64>| {
        let Some(iv) = iv.clamp(&horizon) else {
            return;
        };
        match runs.last_mut() {
            Some(prev) if prev.end() >= iv.start() => {
                *prev = TimeInterval::new(prev.start(), prev.end().max(iv.end()));
            }
            _ => runs.push(iv),
        }
    };

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (ta, tb) = (a.time(), b.time());
        if tb <= horizon.start() || ta >= horizon.end() {
            continue;
        }
        let (Some(la), Some(lb)) = (known_level(&a), known_level(&b)) else {
            unknown += overlap(TimeInterval::new(ta, tb), horizon);
            continue;
        };
        if tb - ta > cfg.max_sample_gap {
            unknown += overlap(TimeInterval::new(ta, tb), horizon);
            continue;
        }
        match (la >= threshold_m, lb >= threshold_m) {
            (true, true) => push(TimeInterval::new(ta, tb)),
            (true, false) => {
                let tc = crossing(ta, la, tb, lb, threshold_m);
                if tc > ta {
                    push(TimeInterval::new(ta, tc));
                }
            }
            (false, true) => {
                let tc = crossing(ta, la, tb, lb, threshold_m);
                if tc < tb {
                    push(TimeInterval::new(tc, tb));
                }
            }
            (false, false) => {}
        }
    }

    let before = runs.len();
    let windows: Vec<TimeInterval<i64>> = runs
        .into_iter()
        .filter(|w| w.length::<TimeDelta<i64>>() >= cfg.min_window)
        .collect();

    Ok(WindowScan {
        discarded_short: before - windows.len(),
        windows,
        unknown,
    })
}

/// Convenience wrapper around [`scan_windows`] returning only the windows.
pub fn accessibility_windows(
    series: &TideSeries,
    threshold_m: f64,
    horizon: TimeInterval<i64>,
    cfg: &TidalConfig,
) -> Result<Vec<TimeInterval<i64>>, InsufficientDataError> {
    scan_windows(series, threshold_m, horizon, cfg).map(WindowScan::into_windows)
}

/// Level of a sample, with non-finite readings treated as gaps.
#[inline]
fn known_level(sample: &TideSample) -> Option<f64> {
    sample.level_m().filter(|l| l.is_finite())
}

#[inline]
fn overlap(iv: TimeInterval<i64>, horizon: TimeInterval<i64>) -> TimeDelta<i64> {
    iv.intersection(&horizon)
        .map(|x| x.length::<TimeDelta<i64>>())
        .unwrap_or(TimeDelta::new(0))
}

/// Time at which the line through `(ta, la)` and `(tb, lb)` reaches `threshold`.
#[inline]
fn crossing(ta: TimePoint<i64>, la: f64, tb: TimePoint<i64>, lb: f64, threshold: f64) -> TimePoint<i64> {
    let frac = ((threshold - la) / (lb - la)).clamp(0.0, 1.0);
    let span = (tb - ta).value() as f64;
    TimePoint::new(ta.value() + (frac * span).round() as i64)
}

/// A location whose tidal state matters for coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessPoint {
    /// The exit route of a station.
    Station(StationId),
    /// The approach to a combined zone.
    Zone(CombinedZoneId),
}

/// Accessibility windows for every `(access point, craft type)` pair of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TidalAccessibility {
    horizon: TimeInterval<i64>,
    windows: BTreeMap<(AccessPoint, CraftTypeId), Vec<TimeInterval<i64>>>,
}

impl TidalAccessibility {
    pub fn new(
        horizon: TimeInterval<i64>,
        windows: BTreeMap<(AccessPoint, CraftTypeId), Vec<TimeInterval<i64>>>,
    ) -> Self {
        Self { horizon, windows }
    }

    #[inline]
    pub fn horizon(&self) -> TimeInterval<i64> {
        self.horizon
    }

    /// Windows of one pair. Unknown pairs have no windows.
    #[inline]
    pub fn windows(&self, point: AccessPoint, craft: CraftTypeId) -> &[TimeInterval<i64>] {
        self.windows
            .get(&(point, craft))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns `true` if `slice` lies completely inside one window of the pair.
    pub fn is_accessible(
        &self,
        point: AccessPoint,
        craft: CraftTypeId,
        slice: &TimeInterval<i64>,
    ) -> bool {
        let windows = self.windows(point, craft);
        let idx = windows.partition_point(|w| w.end() <= slice.start());
        windows
            .get(idx)
            .is_some_and(|w| w.contains_interval(slice))
    }

    /// All pairs in key order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&(AccessPoint, CraftTypeId), &Vec<TimeInterval<i64>>)> {
        self.windows.iter()
    }

    #[inline]
    pub fn pair_count(&self) -> usize {
        self.windows.len()
    }

    /// Sorted, deduplicated window boundaries, including the horizon bounds.
    pub fn breakpoints(&self) -> Vec<TimePoint<i64>> {
        let mut points: Vec<TimePoint<i64>> = self
            .windows
            .values()
            .flat_map(|ws| ws.iter().flat_map(|w| [w.start(), w.end()]))
            .chain([self.horizon.start(), self.horizon.end()])
            .collect();
        points.sort_unstable();
        points.dedup();
        points
    }
}

#[derive(Debug, Clone, Copy)]
struct Location {
    point: AccessPoint,
    gauge: GaugeId,
    depth_m: f64,
}

/// Computes accessibility for every station exit with each supported craft type and every
/// combined zone approach with each craft type.
///
/// Pairs sharing a gauge and a threshold are scanned once. Scans run in parallel.
#[instrument(skip_all, fields(stations = instance.stations().len(), zones = zones.len()), err(Display))]
pub fn compute_accessibility(
    instance: &Instance,
    zones: &[CombinedZone],
    horizon: TimeInterval<i64>,
    cfg: &TidalConfig,
) -> Result<TidalAccessibility, InsufficientDataError> {
    let mut pairs: Vec<(Location, CraftTypeId, f64)> = Vec::new();
    for station in instance.stations() {
        let loc = Location {
            point: AccessPoint::Station(station.id()),
            gauge: station.gauge(),
            depth_m: station.access_depth_m(),
        };
        for support in station.supported() {
            if let Some(craft) = instance.craft_type(support.craft()) {
                pairs.push((loc, craft.id(), craft.draft_m()));
            }
        }
    }
    for zone in zones {
        let loc = Location {
            point: AccessPoint::Zone(zone.id()),
            gauge: zone.gauge(),
            depth_m: zone.approach_depth_m(),
        };
        for craft in instance.craft_types() {
            pairs.push((loc, craft.id(), craft.draft_m()));
        }
    }

    let threshold_of =
        |loc: &Location, draft: f64| clearance_threshold(draft, cfg.under_keel_clearance_m, loc.depth_m);

    let mut unique: Vec<(GaugeId, u64)> = pairs
        .iter()
        .map(|(loc, _, draft)| (loc.gauge, threshold_of(loc, *draft).to_bits()))
        .collect();
    unique.sort_unstable();
    unique.dedup();

    let scans: Vec<Result<WindowScan, InsufficientDataError>> = unique
        .par_iter()
        .map(|&(gauge, bits)| match instance.tide(gauge) {
            Some(series) => scan_windows(series, f64::from_bits(bits), horizon, cfg),
            None => Err(InsufficientDataError::new(gauge, horizon, None, 0)),
        })
        .collect();

    let mut by_key: HashMap<(GaugeId, u64), Vec<TimeInterval<i64>>> =
        HashMap::with_capacity(unique.len());
    let mut discarded = 0usize;
    for (key, scan) in unique.iter().zip(scans) {
        let scan = scan?;
        discarded += scan.discarded_short();
        if scan.unknown().is_positive() {
            warn!(gauge = %key.0, unknown_secs = scan.unknown().value(), "Tide series has gaps inside the horizon");
        }
        debug!(gauge = %key.0, threshold = f64::from_bits(key.1), windows = scan.windows().len(), "Scanned tide series");
        by_key.insert(*key, scan.into_windows());
    }
    if discarded > 0 {
        warn!(discarded, "Discarded accessibility windows shorter than the minimum");
    }

    let mut windows = BTreeMap::new();
    for (loc, craft, draft) in &pairs {
        let key = (loc.gauge, threshold_of(loc, *draft).to_bits());
        let ws = by_key.get(&key).cloned().unwrap_or_default();
        windows.insert((loc.point, *craft), ws);
    }

    info!(
        pairs = windows.len(),
        scans = unique.len(),
        "Computed tidal accessibility"
    );
    Ok(TidalAccessibility::new(horizon, windows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(v: i64) -> TimePoint<i64> {
        TimePoint::new(v)
    }

    fn iv(a: i64, b: i64) -> TimeInterval<i64> {
        TimeInterval::new(tp(a), tp(b))
    }

    fn series(points: &[(i64, Option<f64>)]) -> TideSeries {
        TideSeries::new(
            GaugeId::new(1),
            points
                .iter()
                .map(|&(t, l)| match l {
                    Some(l) => TideSample::new(tp(t), l),
                    None => TideSample::gap(tp(t)),
                })
                .collect(),
        )
    }

    fn cfg(min_window: i64) -> TidalConfig {
        TidalConfig {
            min_window: TimeDelta::new(min_window),
            max_sample_gap: TimeDelta::new(3600),
            under_keel_clearance_m: 0.0,
        }
    }

    #[test]
    fn test_interpolated_crossings() {
        // Levels 2, 4, 1, 5 at ten-minute spacing with threshold 3.
        let s = series(&[(0, Some(2.0)), (600, Some(4.0)), (1200, Some(1.0)), (1800, Some(5.0))]);
        let windows = accessibility_windows(&s, 3.0, iv(0, 1800), &cfg(0)).unwrap();
        assert_eq!(windows, vec![iv(300, 800), iv(1500, 1800)]);
        // Boundaries lie strictly between the bounding samples.
        assert!(windows[0].start() > tp(0) && windows[0].start() < tp(600));
        assert!(windows[0].end() > tp(600) && windows[0].end() < tp(1200));
        assert!(windows[1].start() > tp(1200) && windows[1].start() < tp(1800));
    }

    #[test]
    fn test_short_windows_discarded() {
        let s = series(&[(0, Some(2.0)), (600, Some(4.0)), (1200, Some(1.0)), (1800, Some(5.0))]);
        let scan = scan_windows(&s, 3.0, iv(0, 1800), &cfg(400)).unwrap();
        assert_eq!(scan.windows(), &[iv(300, 800)]);
        assert_eq!(scan.discarded_short(), 1);
    }

    #[test]
    fn test_gap_marker_is_never_accessible() {
        let s = series(&[
            (0, Some(5.0)),
            (600, Some(5.0)),
            (1200, None),
            (1800, Some(5.0)),
            (2400, Some(5.0)),
        ]);
        let scan = scan_windows(&s, 3.0, iv(0, 2400), &cfg(0)).unwrap();
        assert_eq!(scan.windows(), &[iv(0, 600), iv(1800, 2400)]);
        assert_eq!(scan.unknown(), TimeDelta::new(1200));
    }

    #[test]
    fn test_non_finite_level_is_a_gap() {
        let s = series(&[(0, Some(1.0)), (600, Some(f64::NAN)), (1200, Some(5.0)), (1800, Some(1.0))]);
        let scan = scan_windows(&s, 3.0, iv(0, 1800), &cfg(0)).unwrap();
        assert_eq!(scan.windows(), &[iv(1200, 1500)]);
        assert_eq!(scan.unknown(), TimeDelta::new(1200));

        let s = series(&[
            (0, Some(5.0)),
            (600, Some(f64::INFINITY)),
            (1200, Some(f64::NEG_INFINITY)),
            (1800, Some(5.0)),
        ]);
        let scan = scan_windows(&s, 3.0, iv(0, 1800), &cfg(0)).unwrap();
        assert!(scan.windows().is_empty());
        assert_eq!(scan.unknown(), TimeDelta::new(1800));
    }

    #[test]
    fn test_wide_sample_spacing_is_unknown() {
        let s = series(&[(0, Some(5.0)), (600, Some(5.0)), (9000, Some(5.0))]);
        let scan = scan_windows(&s, 3.0, iv(0, 9000), &cfg(0)).unwrap();
        assert_eq!(scan.windows(), &[iv(0, 600)]);
        assert_eq!(scan.unknown(), TimeDelta::new(8400));
    }

    #[test]
    fn test_windows_clamped_to_horizon() {
        let s = series(&[(-600, Some(5.0)), (0, Some(5.0)), (600, Some(5.0)), (1200, Some(5.0))]);
        let windows = accessibility_windows(&s, 3.0, iv(0, 900), &cfg(0)).unwrap();
        assert_eq!(windows, vec![iv(0, 900)]);
    }

    #[test]
    fn test_insufficient_data() {
        let short = series(&[(0, Some(5.0)), (600, Some(5.0))]);
        let err = scan_windows(&short, 3.0, iv(0, 1200), &cfg(0)).unwrap_err();
        assert_eq!(err.gauge(), GaugeId::new(1));
        assert_eq!(err.usable_samples(), 2);
        assert_eq!(err.covered(), Some(iv(0, 600)));

        let single = series(&[(0, Some(5.0)), (1200, None)]);
        assert!(scan_windows(&single, 3.0, iv(0, 600), &cfg(0)).is_err());
    }

    #[test]
    fn test_threshold() {
        assert!((clearance_threshold(2.5, 0.5, 3.0) - 0.0).abs() < 1e-12);
        assert!((clearance_threshold(1.0, 0.5, 4.0) + 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_is_accessible_requires_containment() {
        let mut map = BTreeMap::new();
        let key = (AccessPoint::Station(StationId::new(1)), CraftTypeId::new(1));
        map.insert(key, vec![iv(0, 100), iv(200, 300)]);
        let acc = TidalAccessibility::new(iv(0, 300), map);
        assert!(acc.is_accessible(key.0, key.1, &iv(0, 100)));
        assert!(acc.is_accessible(key.0, key.1, &iv(210, 250)));
        assert!(!acc.is_accessible(key.0, key.1, &iv(50, 150)));
        assert!(!acc.is_accessible(key.0, key.1, &iv(100, 200)));
        assert!(!acc.is_accessible(key.0, CraftTypeId::new(2), &iv(0, 100)));
        assert_eq!(
            acc.breakpoints(),
            vec![tp(0), tp(100), tp(200), tp(300)]
        );
    }
}
