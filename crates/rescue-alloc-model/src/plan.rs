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

//! # Allocation Plans
//!
//! The optimizer's output: how many craft of each type are based at each station, and for every
//! time window which based `(station, craft type)` pair answers for which incident type in which
//! combined zone.

use crate::id::{CombinedZoneId, CraftTypeId, IncidentTypeId, StationId, TimeWindowId};
use rescue_alloc_core::{
    cost::Cost,
    time::{TimeDelta, TimeInterval},
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// A feasible incumbent whose optimality was not proven.
    Feasible,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Feasible => write!(f, "feasible"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CraftBasing {
    station: StationId,
    craft: CraftTypeId,
    count: u32,
}

impl CraftBasing {
    #[inline]
    pub fn new(station: StationId, craft: CraftTypeId, count: u32) -> Self {
        Self {
            station,
            craft,
            count,
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
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Responder {
    station: StationId,
    craft: CraftTypeId,
    travel_hours: f64,
}

impl Responder {
    #[inline]
    pub fn new(station: StationId, craft: CraftTypeId, travel_hours: f64) -> Self {
        Self {
            station,
            craft,
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
    pub fn travel_hours(&self) -> f64 {
        self.travel_hours
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneCoverage {
    zone: CombinedZoneId,
    incident: IncidentTypeId,
    responder: Option<Responder>,
}

impl ZoneCoverage {
    #[inline]
    pub fn covered(zone: CombinedZoneId, incident: IncidentTypeId, responder: Responder) -> Self {
        Self {
            zone,
            incident,
            responder: Some(responder),
        }
    }

    #[inline]
    pub fn uncovered(zone: CombinedZoneId, incident: IncidentTypeId) -> Self {
        Self {
            zone,
            incident,
            responder: None,
        }
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
    fn key(&self) -> (CombinedZoneId, IncidentTypeId) {
        (self.zone, self.incident)
    }

    #[inline]
    pub fn responder(&self) -> Option<&Responder> {
        self.responder.as_ref()
    }

    #[inline]
    pub fn is_covered(&self) -> bool {
        self.responder.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCoverage {
    window: TimeWindowId,
    slices: Vec<TimeInterval<i64>>,
    duration: TimeDelta<i64>,
    share: f64,
    zones: Vec<ZoneCoverage>,
}

impl WindowCoverage {
    pub fn new(
        window: TimeWindowId,
        slices: Vec<TimeInterval<i64>>,
        duration: TimeDelta<i64>,
        share: f64,
        zones: Vec<ZoneCoverage>,
    ) -> Self {
        let mut zones = zones;
        zones.sort_by_key(|z| z.key());
        Self {
            window,
            slices,
            duration,
            share,
            zones,
        }
    }

    #[inline]
    pub fn window(&self) -> TimeWindowId {
        self.window
    }

    #[inline]
    pub fn slices(&self) -> &[TimeInterval<i64>] {
        &self.slices
    }

    #[inline]
    pub fn duration(&self) -> TimeDelta<i64> {
        self.duration
    }

    /// Fraction of the analysis horizon this window accounts for.
    #[inline]
    pub fn share(&self) -> f64 {
        self.share
    }

    /// Coverage per zone and incident type, sorted by `(zone, incident)`.
    #[inline]
    pub fn zones(&self) -> &[ZoneCoverage] {
        &self.zones
    }

    #[inline]
    pub fn coverage_of(
        &self,
        zone: CombinedZoneId,
        incident: IncidentTypeId,
    ) -> Option<&ZoneCoverage> {
        self.zones
            .binary_search_by_key(&(zone, incident), |z| z.key())
            .ok()
            .map(|i| &self.zones[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    status: SolveStatus,
    objective: f64,
    deployment_cost: Cost<i64>,
    basing: Vec<CraftBasing>,
    windows: Vec<WindowCoverage>,
}

impl AllocationPlan {
    /// Creates a plan. Basing entries with a zero count are dropped; all entries are sorted.
    pub fn new(
        status: SolveStatus,
        objective: f64,
        deployment_cost: Cost<i64>,
        basing: Vec<CraftBasing>,
        windows: Vec<WindowCoverage>,
    ) -> Self {
        let mut basing: Vec<CraftBasing> = basing.into_iter().filter(|b| b.count > 0).collect();
        basing.sort_by_key(|b| (b.station, b.craft));
        let mut windows = windows;
        windows.sort_by_key(|w| w.window());
        Self {
            status,
            objective,
            deployment_cost,
            basing,
            windows,
        }
    }

    #[inline]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    #[inline]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    #[inline]
    pub fn deployment_cost(&self) -> Cost<i64> {
        self.deployment_cost
    }

    /// Non-zero basing decisions sorted by `(station, craft)`.
    #[inline]
    pub fn basing(&self) -> &[CraftBasing] {
        &self.basing
    }

    #[inline]
    pub fn windows(&self) -> &[WindowCoverage] {
        &self.windows
    }

    pub fn based_count(&self, station: StationId, craft: CraftTypeId) -> u32 {
        self.basing
            .binary_search_by_key(&(station, craft), |b| (b.station, b.craft))
            .map(|i| self.basing[i].count)
            .unwrap_or(0)
    }

    pub fn station_total(&self, station: StationId) -> u32 {
        self.basing
            .iter()
            .filter(|b| b.station == station)
            .map(|b| b.count)
            .sum()
    }

    pub fn craft_total(&self, craft: CraftTypeId) -> u32 {
        self.basing
            .iter()
            .filter(|b| b.craft == craft)
            .map(|b| b.count)
            .sum()
    }

    /// All `(window, zone, incident)` triples left without a responder.
    pub fn uncovered(
        &self,
    ) -> impl Iterator<Item = (TimeWindowId, CombinedZoneId, IncidentTypeId)> + '_ {
        self.windows.iter().flat_map(|w| {
            w.zones
                .iter()
                .filter(|z| !z.is_covered())
                .map(move |z| (w.window, z.zone, z.incident))
        })
    }
}

impl Display for AllocationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "AllocationPlan ({}, objective {:.4}, {}):",
            self.status, self.objective, self.deployment_cost
        )?;
        for b in &self.basing {
            writeln!(f, "  {} <- {} x {}", b.station, b.count, b.craft)?;
        }
        writeln!(f, "  Windows: {}", self.windows.len())
    }
}
