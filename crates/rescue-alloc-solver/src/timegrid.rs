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

//! # Time Discretization
//!
//! Splits the analysis horizon at every accessibility window boundary. The resulting elementary
//! slices have constant accessibility for every `(access point, craft type)` pair. Slices with
//! the same accessibility signature can be merged into one [`TimeWindow`], weighted by its total
//! duration.

use crate::tidal::TidalAccessibility;
use rayon::prelude::*;
use rescue_alloc_core::time::{TimeDelta, TimeInterval};
use rescue_alloc_model::TimeWindowId;
use std::collections::HashMap;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    id: TimeWindowId,
    slices: Vec<TimeInterval<i64>>,
    duration: TimeDelta<i64>,
}

impl TimeWindow {
    pub fn new(id: TimeWindowId, slices: Vec<TimeInterval<i64>>) -> Self {
        let duration = slices.iter().map(|s| s.length::<TimeDelta<i64>>()).sum();
        Self {
            id,
            slices,
            duration,
        }
    }

    #[inline]
    pub fn id(&self) -> TimeWindowId {
        self.id
    }

    /// Elementary slices in time order.
    #[inline]
    pub fn slices(&self) -> &[TimeInterval<i64>] {
        &self.slices
    }

    #[inline]
    pub fn duration(&self) -> TimeDelta<i64> {
        self.duration
    }

    /// A slice standing in for the whole window. All slices share the same accessibility.
    #[inline]
    pub fn representative(&self) -> Option<&TimeInterval<i64>> {
        self.slices.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeGrid {
    horizon: TimeInterval<i64>,
    windows: Vec<TimeWindow>,
}

impl TimeGrid {
    pub fn new(horizon: TimeInterval<i64>, windows: Vec<TimeWindow>) -> Self {
        Self { horizon, windows }
    }

    #[inline]
    pub fn horizon(&self) -> TimeInterval<i64> {
        self.horizon
    }

    /// Windows ordered by id, which is the order of their first slice in time.
    #[inline]
    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    #[inline]
    pub fn window(&self, id: TimeWindowId) -> Option<&TimeWindow> {
        self.windows.get(id.value())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Fraction of the horizon covered by `id`.
    pub fn share(&self, id: TimeWindowId) -> f64 {
        let total = self.horizon.length::<TimeDelta<i64>>().value();
        match self.window(id) {
            Some(w) if total > 0 => w.duration().value() as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// Builds the time grid of a run.
#[instrument(skip_all, fields(pairs = accessibility.pair_count(), merge = merge_equivalent))]
pub fn discretize(accessibility: &TidalAccessibility, merge_equivalent: bool) -> TimeGrid {
    let horizon = accessibility.horizon();
    let breakpoints = accessibility.breakpoints();
    let slices: Vec<TimeInterval<i64>> = breakpoints
        .windows(2)
        .map(|w| TimeInterval::new(w[0], w[1]))
        .filter(|s| !s.is_empty() && horizon.contains_interval(s))
        .collect();

    if !merge_equivalent {
        let windows: Vec<TimeWindow> = slices
            .iter()
            .enumerate()
            .map(|(i, s)| TimeWindow::new(TimeWindowId::new(i), vec![*s]))
            .collect();
        info!(slices = slices.len(), windows = windows.len(), "Discretized horizon");
        return TimeGrid::new(horizon, windows);
    }

    let keys: Vec<_> = accessibility.iter().map(|(k, _)| *k).collect();
    let signatures: Vec<Vec<u64>> = slices
        .par_iter()
        .map(|slice| {
            let mut bits = vec![0u64; keys.len().div_ceil(64)];
            for (i, (point, craft)) in keys.iter().enumerate() {
                if accessibility.is_accessible(*point, *craft, slice) {
                    bits[i / 64] |= 1u64 << (i % 64);
                }
            }
            bits
        })
        .collect();

    let mut group_of: HashMap<&[u64], usize> = HashMap::new();
    let mut groups: Vec<Vec<TimeInterval<i64>>> = Vec::new();
    for (slice, sig) in slices.iter().zip(&signatures) {
        let next = groups.len();
        let g = *group_of.entry(sig.as_slice()).or_insert(next);
        if g == next {
            groups.push(Vec::new());
        }
        groups[g].push(*slice);
    }

    let windows: Vec<TimeWindow> = groups
        .into_iter()
        .enumerate()
        .map(|(i, s)| TimeWindow::new(TimeWindowId::new(i), s))
        .collect();
    info!(slices = slices.len(), windows = windows.len(), "Discretized horizon");
    TimeGrid::new(horizon, windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tidal::AccessPoint;
    use rescue_alloc_core::time::TimePoint;
    use rescue_alloc_model::{CombinedZoneId, CraftTypeId, StationId};
    use std::collections::BTreeMap;

    fn iv(a: i64, b: i64) -> TimeInterval<i64> {
        TimeInterval::new(TimePoint::new(a), TimePoint::new(b))
    }

    fn accessibility() -> TidalAccessibility {
        let c = CraftTypeId::new(0);
        let mut map = BTreeMap::new();
        // Station open [0, 100) and [200, 300); zone open everywhere but [100, 150).
        map.insert(
            (AccessPoint::Station(StationId::new(0)), c),
            vec![iv(0, 100), iv(200, 300)],
        );
        map.insert(
            (AccessPoint::Zone(CombinedZoneId::new(0)), c),
            vec![iv(0, 100), iv(150, 400)],
        );
        TidalAccessibility::new(iv(0, 400), map)
    }

    #[test]
    fn test_slices_without_merging() {
        let grid = discretize(&accessibility(), false);
        let slices: Vec<_> = grid.windows().iter().map(|w| w.slices()[0]).collect();
        assert_eq!(
            slices,
            vec![iv(0, 100), iv(100, 150), iv(150, 200), iv(200, 300), iv(300, 400)]
        );
        let total: i64 = grid.windows().iter().map(|w| w.duration().value()).sum();
        assert_eq!(total, 400);
    }

    #[test]
    fn test_equivalent_slices_merge() {
        let grid = discretize(&accessibility(), true);
        // Signatures: [0,100) both, [100,150) none, [150,200) zone, [200,300) both, [300,400) zone.
        assert_eq!(grid.len(), 3);
        let w0 = grid.window(TimeWindowId::new(0)).unwrap();
        assert_eq!(w0.slices(), &[iv(0, 100), iv(200, 300)]);
        assert_eq!(w0.duration(), TimeDelta::new(200));
        assert!((grid.share(TimeWindowId::new(0)) - 0.5).abs() < 1e-12);
        let w2 = grid.window(TimeWindowId::new(2)).unwrap();
        assert_eq!(w2.slices(), &[iv(150, 200), iv(300, 400)]);
        let shares: f64 = grid.windows().iter().map(|w| grid.share(w.id())).sum();
        assert!((shares - 1.0).abs() < 1e-12);
    }
}
