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

//! # Coverage Facts
//!
//! A [`CoverageFact`] states that a craft type based at a station can answer one incident type in
//! a combined zone during a time window: the craft is equipped for the incident, reaches the zone
//! within its response bound, and both the station exit and the zone approach are accessible.
//! Only feasible facts are produced: a `(station, craft, zone)` triple that fails the geometric
//! test never reaches the per-window tidal test, and infeasible combinations are never
//! materialized.

use crate::{
    demand::DemandTable,
    tidal::{AccessPoint, TidalAccessibility},
    timegrid::TimeGrid,
};
use rayon::prelude::*;
use rescue_alloc_core::geo::GeoPoint;
use rescue_alloc_model::{
    CombinedZone, CombinedZoneId, CoverageConfig, CraftType, CraftTypeId, IncidentTypeId,
    Instance, Station, StationId, TimeWindowId,
};
use std::{
    collections::{BTreeMap, HashMap},
    ops::Range,
};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageFact {
    station: StationId,
    craft: CraftTypeId,
    zone: CombinedZoneId,
    incident: IncidentTypeId,
    window: TimeWindowId,
    travel_hours: f64,
}

/// A cover requirement: one incident type in one combined zone during one window.
pub type ResponseKey = (CombinedZoneId, IncidentTypeId, TimeWindowId);

impl CoverageFact {
    #[inline]
    pub fn new(
        station: StationId,
        craft: CraftTypeId,
        zone: CombinedZoneId,
        incident: IncidentTypeId,
        window: TimeWindowId,
        travel_hours: f64,
    ) -> Self {
        Self {
            station,
            craft,
            zone,
            incident,
            window,
            travel_hours,
        }
    }

    #[inline]
    pub fn station(&self) -> StationId {
        self.station
    }

    #[inline]
    pub fn craft(&self) -> CraftTypeId {
        self.craft
    }

    #[inline]
    pub fn zone(&self) -> CombinedZoneId {
        self.zone
    }

    #[inline]
    pub fn incident(&self) -> IncidentTypeId {
        self.incident
    }

    #[inline]
    pub fn window(&self) -> TimeWindowId {
        self.window
    }

    #[inline]
    pub fn response(&self) -> ResponseKey {
        (self.zone, self.incident, self.window)
    }

    #[inline]
    pub fn travel_hours(&self) -> f64 {
        self.travel_hours
    }

    #[inline]
    fn key(&self) -> (StationId, CraftTypeId, CombinedZoneId, IncidentTypeId, TimeWindowId) {
        (
            self.station,
            self.craft,
            self.zone,
            self.incident,
            self.window,
        )
    }
}

/// Sparse table of feasible coverage facts, indexed by `(station, craft)` and by
/// `(zone, incident, window)`.
#[derive(Debug, Clone, Default)]
pub struct CoverageTable {
    facts: Vec<CoverageFact>,
    by_pair: BTreeMap<(StationId, CraftTypeId), Range<usize>>,
    by_response: HashMap<ResponseKey, Vec<usize>>,
}

impl CoverageTable {
    /// Builds the table from arbitrary facts. Duplicate keys keep the first occurrence.
    pub fn from_facts(facts: Vec<CoverageFact>) -> Self {
        let mut facts = facts;
        facts.sort_by(|a, b| a.key().cmp(&b.key()));
        facts.dedup_by(|a, b| a.key() == b.key());

        let mut by_pair: BTreeMap<(StationId, CraftTypeId), Range<usize>> = BTreeMap::new();
        let mut by_response: HashMap<ResponseKey, Vec<usize>> = HashMap::new();
        for (i, f) in facts.iter().enumerate() {
            by_pair
                .entry((f.station, f.craft))
                .and_modify(|r| r.end = i + 1)
                .or_insert(i..i + 1);
            by_response.entry(f.response()).or_default().push(i);
        }
        Self {
            facts,
            by_pair,
            by_response,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// All facts ordered by `(station, craft, zone, incident, window)`.
    #[inline]
    pub fn facts(&self) -> &[CoverageFact] {
        &self.facts
    }

    #[inline]
    pub fn fact(&self, index: usize) -> Option<&CoverageFact> {
        self.facts.get(index)
    }

    /// `(station, craft)` pairs with at least one fact, in order.
    pub fn pairs(&self) -> impl Iterator<Item = (StationId, CraftTypeId)> + '_ {
        self.by_pair.keys().copied()
    }

    /// Facts of one `(station, craft)` pair together with the index of the first one.
    pub fn for_pair(&self, station: StationId, craft: CraftTypeId) -> (usize, &[CoverageFact]) {
        match self.by_pair.get(&(station, craft)) {
            Some(r) => (r.start, &self.facts[r.clone()]),
            None => (0, &[]),
        }
    }

    /// Indices of the facts able to answer `incident` in `zone` during `window`.
    pub fn for_response(
        &self,
        zone: CombinedZoneId,
        incident: IncidentTypeId,
        window: TimeWindowId,
    ) -> &[usize] {
        self.by_response
            .get(&(zone, incident, window))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cover requirements of `demand` without any feasible fact, in `(zone, incident, window)`
    /// order.
    pub fn uncoverable(&self, demand: &DemandTable, grid: &TimeGrid) -> Vec<ResponseKey> {
        let mut out = Vec::new();
        for d in demand.entries() {
            for w in grid.windows() {
                if self.for_response(d.zone(), d.incident(), w.id()).is_empty() {
                    out.push((d.zone(), d.incident(), w.id()));
                }
            }
        }
        out
    }
}

/// Geometric reachability of `target`, independent of the tide. Returns the travel time in hours.
pub fn reach_hours(
    station: &Station,
    craft: &CraftType,
    target: GeoPoint,
    cfg: &CoverageConfig,
) -> Option<f64> {
    let distance = station.position().distance_nm(&target);
    if cfg.respect_craft_range
        && let Some(range) = craft.range_nm()
        && 2.0 * distance > range
    {
        return None;
    }
    let hours = distance / craft.speed_knots();
    (hours <= craft.response_hours()).then_some(hours)
}

/// Produces the coverage table of a run, one parallel work unit per `(station, craft)` pair.
///
/// A zone is only answered for the incidents of `demand` the craft type is equipped for.
#[instrument(skip_all, fields(stations = instance.stations().len(), zones = zones.len(), windows = grid.len()))]
pub fn build_coverage(
    instance: &Instance,
    zones: &[CombinedZone],
    demand: &DemandTable,
    grid: &TimeGrid,
    accessibility: &TidalAccessibility,
    cfg: &CoverageConfig,
) -> CoverageTable {
    let units: Vec<(&Station, &CraftType)> = instance
        .stations()
        .iter()
        .flat_map(|s| {
            s.supported()
                .iter()
                .filter_map(move |sup| instance.craft_type(sup.craft()).map(|c| (s, c)))
        })
        .collect();

    let parts: Vec<Vec<CoverageFact>> = units
        .par_iter()
        .map(|&(station, craft)| {
            let exit = AccessPoint::Station(station.id());
            let mut facts = Vec::new();
            for zone in zones {
                let incidents: Vec<IncidentTypeId> = demand
                    .for_zone(zone.id())
                    .iter()
                    .map(|d| d.incident())
                    .filter(|&i| instance.incident_type(i).is_some_and(|t| t.allows(craft.id())))
                    .collect();
                if incidents.is_empty() {
                    continue;
                }
                let Some(hours) = reach_hours(station, craft, zone.position(), cfg) else {
                    continue;
                };
                let approach = AccessPoint::Zone(zone.id());
                for w in grid.windows() {
                    let open = w.representative().is_some_and(|slice| {
                        accessibility.is_accessible(exit, craft.id(), slice)
                            && accessibility.is_accessible(approach, craft.id(), slice)
                    });
                    if !open {
                        continue;
                    }
                    facts.extend(incidents.iter().map(|&i| {
                        CoverageFact::new(station.id(), craft.id(), zone.id(), i, w.id(), hours)
                    }));
                }
            }
            debug!(station = %station.id(), craft = %craft.id(), facts = facts.len(), "Coverage unit");
            facts
        })
        .collect();

    let table = CoverageTable::from_facts(parts.into_iter().flatten().collect());
    let dense = units.len() * demand.len() * grid.len();
    let density = if dense > 0 {
        table.len() as f64 / dense as f64
    } else {
        0.0
    };
    info!(facts = table.len(), dense, density, "Built coverage table");
    table
}
