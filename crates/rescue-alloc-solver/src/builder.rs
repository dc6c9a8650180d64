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

//! # Allocation Model Builder
//!
//! Translates a coverage table into a [`MipModel`]:
//!
//! - `n[s,c]`: integer number of craft type `c` based at station `s`, bounded by the berth
//!   capacity and the fleet size. Only pairs with at least one coverage fact get a column.
//! - `a[f]`: binary, the `(station, craft)` of fact `f` answers its incident in its zone during
//!   its window. Infeasible combinations have no column at all.
//! - `u[z,i,w]`: binary, incident `i` in zone `z` is left uncovered in window `w` (soft coverage
//!   only).
//!
//! Rows: exactly one responder (or the uncovered marker) per zone, incident and window; per
//! station, craft and window `sum a <= K * n` with
//! `K = min(max_responses_per_craft, responses reachable)`; berth capacity per station; fleet size
//! per craft type. Assignment and uncovered weights scale with the incident demand of the zone.

use crate::{
    coverage::{CoverageTable, ResponseKey},
    demand::DemandTable,
    err::ModelInfeasibleError,
    milp::{ColumnId, ColumnKind, MipModel, Sense},
    timegrid::TimeGrid,
};
use rescue_alloc_model::{
    CombinedZoneId, CoveragePolicy, CraftTypeId, IncidentTypeId, Instance, ObjectiveConfig,
    StationId, TimeWindowId,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// The `n[s,c]` column of a `(station, craft)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasingColumn {
    station: StationId,
    craft: CraftTypeId,
    column: ColumnId,
    unit_cost: i64,
    max_count: u32,
}

impl BasingColumn {
    #[inline]
    pub fn station(&self) -> StationId {
        self.station
    }

    #[inline]
    pub fn craft(&self) -> CraftTypeId {
        self.craft
    }

    #[inline]
    pub fn column(&self) -> ColumnId {
        self.column
    }

    /// Craft cost plus the station's operating cost for it.
    #[inline]
    pub fn unit_cost(&self) -> i64 {
        self.unit_cost
    }

    #[inline]
    pub fn max_count(&self) -> u32 {
        self.max_count
    }
}

/// How many `(zone, incident)` responses one based craft may answer for in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponderLimit {
    pub station: StationId,
    pub craft: CraftTypeId,
    pub window: TimeWindowId,
    pub responses_per_craft: usize,
}

/// A [`MipModel`] together with the meaning of its columns.
#[derive(Debug, Clone)]
pub struct AllocationModel {
    mip: MipModel,
    policy: CoveragePolicy,
    basing: Vec<BasingColumn>,
    basing_index: HashMap<(StationId, CraftTypeId), usize>,
    assignment: Vec<Option<ColumnId>>,
    uncovered: BTreeMap<ResponseKey, ColumnId>,
    limits: Vec<ResponderLimit>,
}

impl AllocationModel {
    #[inline]
    pub fn mip(&self) -> &MipModel {
        &self.mip
    }

    #[inline]
    pub fn policy(&self) -> CoveragePolicy {
        self.policy
    }

    /// Basing columns in `(station, craft)` order.
    #[inline]
    pub fn basing(&self) -> &[BasingColumn] {
        &self.basing
    }

    #[inline]
    pub fn basing_for(&self, station: StationId, craft: CraftTypeId) -> Option<&BasingColumn> {
        self.basing_index
            .get(&(station, craft))
            .map(|&i| &self.basing[i])
    }

    /// The `a[f]` column of the fact at `fact_index` in the coverage table.
    #[inline]
    pub fn assignment(&self, fact_index: usize) -> Option<ColumnId> {
        self.assignment.get(fact_index).copied().flatten()
    }

    #[inline]
    pub fn uncovered(
        &self,
        zone: CombinedZoneId,
        incident: IncidentTypeId,
        window: TimeWindowId,
    ) -> Option<ColumnId> {
        self.uncovered.get(&(zone, incident, window)).copied()
    }

    #[inline]
    pub fn limits(&self) -> &[ResponderLimit] {
        &self.limits
    }
}

/// Builds the allocation model.
///
/// # Errors
///
/// Under [`CoveragePolicy::Hard`] a cover requirement without any coverage fact makes the model
/// infeasible by construction; this is reported as a structural [`ModelInfeasibleError`] before
/// any solver is involved.
#[instrument(skip_all, fields(facts = table.len(), responses = demand.len(), windows = grid.len()), err(Display))]
pub fn build_model(
    instance: &Instance,
    demand: &DemandTable,
    grid: &TimeGrid,
    table: &CoverageTable,
    objective: &ObjectiveConfig,
) -> Result<AllocationModel, ModelInfeasibleError> {
    let policy = objective.policy;
    if !policy.is_soft() {
        let uncoverable = table.uncoverable(demand, grid);
        if !uncoverable.is_empty() {
            debug!(count = uncoverable.len(), "Responses without any feasible responder");
            return Err(ModelInfeasibleError::structural(uncoverable));
        }
    }

    let mut mip = MipModel::new();

    let mut basing = Vec::new();
    let mut basing_index = HashMap::new();
    for (station_id, craft_id) in table.pairs() {
        let (Some(station), Some(craft), Some(support)) = (
            instance.station(station_id),
            instance.craft_type(craft_id),
            instance
                .station(station_id)
                .and_then(|s| s.support_for(craft_id)),
        ) else {
            continue;
        };
        let max_count = station.berth_capacity().min(craft.fleet());
        let unit_cost = craft
            .cost()
            .value()
            .saturating_add(support.operating_cost().value());
        let column = mip.add_column(
            format!("n_{}_{}", station_id.value(), craft_id.value()),
            ColumnKind::Integer,
            0.0,
            max_count as f64,
            objective.cost_weight * unit_cost as f64,
        );
        basing_index.insert((station_id, craft_id), basing.len());
        basing.push(BasingColumn {
            station: station_id,
            craft: craft_id,
            column,
            unit_cost,
            max_count,
        });
    }

    let mut assignment = vec![None; table.len()];
    for (i, f) in table.facts().iter().enumerate() {
        let d = demand.demand(f.zone(), f.incident());
        if d <= 0.0 || !basing_index.contains_key(&(f.station(), f.craft())) {
            continue;
        }
        let weight = objective.response_weight * d * grid.share(f.window()) * f.travel_hours();
        assignment[i] = Some(mip.add_binary(
            format!(
                "a_{}_{}_{}_{}_{}",
                f.station().value(),
                f.craft().value(),
                f.zone().value(),
                f.incident().value(),
                f.window().value()
            ),
            weight,
        ));
    }

    let mut uncovered = BTreeMap::new();
    for entry in demand.entries() {
        let (zone, incident) = (entry.zone(), entry.incident());
        for window in grid.windows() {
            let mut terms: Vec<(ColumnId, f64)> = table
                .for_response(zone, incident, window.id())
                .iter()
                .filter_map(|&i| assignment[i])
                .map(|c| (c, 1.0))
                .collect();
            if let Some(penalty) = policy.uncovered_penalty() {
                let u = mip.add_binary(
                    format!(
                        "u_{}_{}_{}",
                        zone.value(),
                        incident.value(),
                        window.id().value()
                    ),
                    penalty * entry.demand() * grid.share(window.id()),
                );
                uncovered.insert((zone, incident, window.id()), u);
                terms.push((u, 1.0));
            }
            mip.add_row(
                format!(
                    "cover_{}_{}_{}",
                    zone.value(),
                    incident.value(),
                    window.id().value()
                ),
                terms,
                Sense::Eq,
                1.0,
            );
        }
    }

    let mut limits = Vec::new();
    for b in &basing {
        let (start, facts) = table.for_pair(b.station, b.craft);
        let mut by_window: BTreeMap<TimeWindowId, Vec<ColumnId>> = BTreeMap::new();
        for (offset, f) in facts.iter().enumerate() {
            if let Some(c) = assignment[start + offset] {
                by_window.entry(f.window()).or_default().push(c);
            }
        }
        for (window, cols) in by_window {
            let k = match objective.max_responses_per_craft {
                Some(max) => cols.len().min(max as usize),
                None => cols.len(),
            };
            let mut terms: Vec<(ColumnId, f64)> = cols.into_iter().map(|c| (c, 1.0)).collect();
            terms.push((b.column, -(k as f64)));
            mip.add_row(
                format!(
                    "link_{}_{}_{}",
                    b.station.value(),
                    b.craft.value(),
                    window.value()
                ),
                terms,
                Sense::Le,
                0.0,
            );
            limits.push(ResponderLimit {
                station: b.station,
                craft: b.craft,
                window,
                responses_per_craft: k,
            });
        }
    }

    let mut per_station: BTreeMap<StationId, Vec<ColumnId>> = BTreeMap::new();
    let mut per_craft: BTreeMap<CraftTypeId, Vec<ColumnId>> = BTreeMap::new();
    for b in &basing {
        per_station.entry(b.station).or_default().push(b.column);
        per_craft.entry(b.craft).or_default().push(b.column);
    }
    for (station, cols) in per_station {
        let capacity = instance
            .station(station)
            .map(|s| s.berth_capacity())
            .unwrap_or(0);
        mip.add_row(
            format!("berth_{}", station.value()),
            cols.into_iter().map(|c| (c, 1.0)).collect(),
            Sense::Le,
            capacity as f64,
        );
    }
    for (craft, cols) in per_craft {
        let fleet = instance.craft_type(craft).map(|c| c.fleet()).unwrap_or(0);
        mip.add_row(
            format!("fleet_{}", craft.value()),
            cols.into_iter().map(|c| (c, 1.0)).collect(),
            Sense::Le,
            fleet as f64,
        );
    }

    info!(
        model = %mip,
        basing = basing.len(),
        soft = policy.is_soft(),
        "Built allocation model"
    );
    Ok(AllocationModel {
        mip,
        policy,
        basing,
        basing_index,
        assignment,
        uncovered,
        limits,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A small hand-built instance with a known optimum.
    //!
    //! Three stations, two craft types, four combined zones with the general incident, one time
    //! window. Craft `A` (cost 10) reaches every zone from station 1. Craft `B` (cost 3) reaches
    //! zones 0 and 1 from station 0, zone 2 from station 1 and zone 3 from station 2. Every
    //! station berths one craft.

    use crate::{
        coverage::{CoverageFact, CoverageTable},
        demand::DemandTable,
        timegrid::{TimeGrid, TimeWindow},
    };
    use rescue_alloc_core::{
        cost::Cost,
        geo::GeoPoint,
        time::{TimeDelta, TimeInterval, TimePoint},
    };
    use rescue_alloc_model::{
        CombinedZone, CombinedZoneId, CraftSupport, CraftType, CraftTypeId, GENERAL_INCIDENT,
        GaugeId, Instance, InstanceBuilder, Station, StationId, TideSample, TideSeries,
        TimeWindowId, ZoneId,
    };

    pub const A: CraftTypeId = CraftTypeId::new(0);
    pub const B: CraftTypeId = CraftTypeId::new(1);

    pub fn instance(fleet_b: u32) -> Instance {
        builder(fleet_b).build().unwrap()
    }

    pub fn builder(fleet_b: u32) -> InstanceBuilder {
        let mut b = InstanceBuilder::new();
        b.add_craft_type(CraftType::new(
            A,
            "A",
            20.0,
            1.0,
            TimeDelta::new(3600),
            None,
            Cost::new(10),
            1,
        ))
        .unwrap();
        b.add_craft_type(CraftType::new(
            B,
            "B",
            20.0,
            1.0,
            TimeDelta::new(3600),
            None,
            Cost::new(3),
            fleet_b,
        ))
        .unwrap();
        b.add_tide_series(TideSeries::new(
            GaugeId::new(0),
            vec![
                TideSample::new(TimePoint::new(0), 5.0),
                TideSample::new(TimePoint::new(3600), 5.0),
            ],
        ))
        .unwrap();
        for s in 0..3u64 {
            b.add_station(Station::new(
                StationId::new(s),
                format!("S{s}"),
                GeoPoint::new(54.0 + 0.1 * s as f64, 8.0),
                GaugeId::new(0),
                5.0,
                vec![
                    CraftSupport::new(A, Cost::new(0)),
                    CraftSupport::new(B, Cost::new(0)),
                ],
            ))
            .unwrap();
        }
        b
    }

    pub fn zones() -> Vec<CombinedZone> {
        (0..4)
            .map(|z| {
                CombinedZone::new(
                    CombinedZoneId::new(z),
                    GeoPoint::new(54.0 + 0.05 * z as f64, 8.1),
                    1.0,
                    vec![ZoneId::new(z as u64)],
                    GaugeId::new(0),
                    5.0,
                )
            })
            .collect()
    }

    pub fn demand() -> DemandTable {
        DemandTable::single_incident(&zones(), GENERAL_INCIDENT)
    }

    pub fn grid() -> TimeGrid {
        let horizon = TimeInterval::new(TimePoint::new(0), TimePoint::new(3600));
        TimeGrid::new(
            horizon,
            vec![TimeWindow::new(TimeWindowId::new(0), vec![horizon])],
        )
    }

    pub fn table() -> CoverageTable {
        let fact = |s: u64, c: CraftTypeId, z: usize| {
            CoverageFact::new(
                StationId::new(s),
                c,
                CombinedZoneId::new(z),
                GENERAL_INCIDENT,
                TimeWindowId::new(0),
                0.25,
            )
        };
        CoverageTable::from_facts(vec![
            fact(1, A, 0),
            fact(1, A, 1),
            fact(1, A, 2),
            fact(1, A, 3),
            fact(0, B, 0),
            fact(0, B, 1),
            fact(1, B, 2),
            fact(2, B, 3),
        ])
    }
}
