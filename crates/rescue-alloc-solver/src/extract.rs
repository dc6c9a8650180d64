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

//! # Result Extraction
//!
//! Rounds integral columns within the integrality tolerance and rebuilds the
//! [`AllocationPlan`]. The plan is re-validated against capacity, fleet, support, equipment,
//! linking and coverage rules; any violation is a [`ConsistencyError`].

use crate::{
    adapter::SolvedModel,
    builder::AllocationModel,
    coverage::CoverageTable,
    demand::DemandTable,
    err::ConsistencyError,
    milp::ColumnId,
    timegrid::TimeGrid,
};
use rescue_alloc_core::cost::Cost;
use rescue_alloc_model::{
    AllocationPlan, CombinedZoneId, CraftTypeId, IncidentTypeId, Instance, StationId,
    TimeWindowId,
    plan::{CraftBasing, Responder, WindowCoverage, ZoneCoverage},
};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

/// Rounds every integral column of `solved`.
fn rounded_values(
    model: &AllocationModel,
    solved: &SolvedModel,
    tolerance: f64,
) -> Result<Vec<f64>, ConsistencyError> {
    model
        .mip()
        .columns()
        .iter()
        .zip(solved.values())
        .map(|(col, &v)| {
            if !col.kind().is_integral() {
                return Ok(v);
            }
            let r = v.round();
            if (v - r).abs() > tolerance || r < col.lower() || r > col.upper() {
                return Err(ConsistencyError::NonIntegral {
                    column: col.name().to_string(),
                    value: v,
                });
            }
            Ok(r)
        })
        .collect()
}

/// Reconstructs and validates the allocation plan of a solved model.
#[instrument(skip_all, fields(status = %solved.status()), err(Display))]
pub fn extract_plan(
    instance: &Instance,
    demand: &DemandTable,
    grid: &TimeGrid,
    table: &CoverageTable,
    model: &AllocationModel,
    solved: &SolvedModel,
    integrality_tolerance: f64,
) -> Result<AllocationPlan, ConsistencyError> {
    let values = rounded_values(model, solved, integrality_tolerance)?;
    let is_set = |c: ColumnId| values[c.index()] > 0.5;

    let mut counts: BTreeMap<(StationId, CraftTypeId), u32> = BTreeMap::new();
    let mut deployment = 0i64;
    for b in model.basing() {
        let count = values[b.column().index()] as u32;
        if count == 0 {
            continue;
        }
        counts.insert((b.station(), b.craft()), count);
        deployment = deployment.saturating_add(b.unit_cost().saturating_mul(count as i64));
    }
    check_basing(instance, &counts)?;

    let limits: HashMap<(StationId, CraftTypeId, TimeWindowId), usize> = model
        .limits()
        .iter()
        .map(|l| ((l.station, l.craft, l.window), l.responses_per_craft))
        .collect();

    let mut load: BTreeMap<(StationId, CraftTypeId, TimeWindowId), usize> = BTreeMap::new();
    let mut windows = Vec::with_capacity(grid.len());
    for window in grid.windows() {
        let mut coverage = Vec::with_capacity(demand.len());
        for entry in demand.entries() {
            let (zone, incident) = (entry.zone(), entry.incident());
            let responders: Vec<Responder> = table
                .for_response(zone, incident, window.id())
                .iter()
                .filter(|&&i| model.assignment(i).is_some_and(is_set))
                .filter_map(|&i| table.fact(i))
                .map(|f| Responder::new(f.station(), f.craft(), f.travel_hours()))
                .collect();
            let marked_uncovered = model
                .uncovered(zone, incident, window.id())
                .is_some_and(is_set);
            check_response(
                model,
                (zone, incident, window.id()),
                responders.len(),
                marked_uncovered,
            )?;

            match responders.first() {
                Some(r) => {
                    if !instance
                        .incident_type(incident)
                        .is_some_and(|t| t.allows(r.craft()))
                    {
                        return Err(ConsistencyError::CraftNotAllowed {
                            zone,
                            incident,
                            craft: r.craft(),
                        });
                    }
                    let count = counts.get(&(r.station(), r.craft())).copied().unwrap_or(0);
                    if count == 0 {
                        return Err(ConsistencyError::ResponderNotBased {
                            station: r.station(),
                            craft: r.craft(),
                            window: window.id(),
                        });
                    }
                    *load.entry((r.station(), r.craft(), window.id())).or_default() += 1;
                    coverage.push(ZoneCoverage::covered(zone, incident, *r));
                }
                None => coverage.push(ZoneCoverage::uncovered(zone, incident)),
            }
        }
        windows.push(WindowCoverage::new(
            window.id(),
            window.slices().to_vec(),
            window.duration(),
            grid.share(window.id()),
            coverage,
        ));
    }

    for (&(station, craft, window), &assigned) in &load {
        let count = counts.get(&(station, craft)).copied().unwrap_or(0) as usize;
        let per_craft = limits.get(&(station, craft, window)).copied().unwrap_or(0);
        let allowed = per_craft * count;
        if assigned > allowed {
            return Err(ConsistencyError::ResponderOverloaded {
                station,
                craft,
                window,
                assigned,
                allowed,
            });
        }
    }

    let basing: Vec<CraftBasing> = counts
        .iter()
        .map(|(&(s, c), &n)| CraftBasing::new(s, c, n))
        .collect();
    let plan = AllocationPlan::new(
        solved.status(),
        solved.objective(),
        Cost::new(deployment),
        basing,
        windows,
    );
    info!(
        based = plan.basing().iter().map(|b| b.count()).sum::<u32>(),
        uncovered = plan.uncovered().count(),
        deployment_cost = deployment,
        "Extracted plan"
    );
    Ok(plan)
}

fn check_basing(
    instance: &Instance,
    counts: &BTreeMap<(StationId, CraftTypeId), u32>,
) -> Result<(), ConsistencyError> {
    let mut per_station: BTreeMap<StationId, u32> = BTreeMap::new();
    let mut per_craft: BTreeMap<CraftTypeId, u32> = BTreeMap::new();
    for (&(station, craft), &n) in counts {
        if !instance.station(station).is_some_and(|s| s.supports(craft)) {
            return Err(ConsistencyError::UnsupportedCraft { station, craft });
        }
        *per_station.entry(station).or_default() += n;
        *per_craft.entry(craft).or_default() += n;
    }
    for (station, based) in per_station {
        let capacity = instance
            .station(station)
            .map(|s| s.berth_capacity())
            .unwrap_or(0);
        if based > capacity {
            return Err(ConsistencyError::BerthCapacityExceeded {
                station,
                based,
                capacity,
            });
        }
    }
    for (craft, based) in per_craft {
        let fleet = instance.craft_type(craft).map(|c| c.fleet()).unwrap_or(0);
        if based > fleet {
            return Err(ConsistencyError::FleetExceeded { craft, based, fleet });
        }
    }
    Ok(())
}

fn check_response(
    model: &AllocationModel,
    (zone, incident, window): (CombinedZoneId, IncidentTypeId, TimeWindowId),
    responders: usize,
    marked_uncovered: bool,
) -> Result<(), ConsistencyError> {
    if responders == 0 && !model.policy().is_soft() {
        return Err(ConsistencyError::UncoveredUnderHardPolicy {
            zone,
            incident,
            window,
        });
    }
    let total = responders + usize::from(marked_uncovered);
    if total != 1 {
        return Err(ConsistencyError::CoverageMultiplicity {
            zone,
            incident,
            window,
            responders,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::SolverAdapter,
        builder::{build_model, fixtures},
        cancel::CancellationToken,
        coverage::CoverageFact,
        demand::IncidentDemand,
        milp::{MipBackend, MipModel, MipOutcome, MipStatus},
        err::SolverError,
    };
    use rescue_alloc_model::{
        GENERAL_INCIDENT, IncidentType, ObjectiveConfig, SolveStatus, SolverParams,
    };
    use std::time::Duration;

    struct Fixed(Vec<f64>);

    impl MipBackend for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn solve(
            &self,
            model: &MipModel,
            _params: &SolverParams,
            _cancel: &CancellationToken,
        ) -> Result<MipOutcome, SolverError> {
            Ok(MipOutcome::with_solution(
                MipStatus::Optimal,
                self.0.clone(),
                model.objective_value(&self.0),
                Duration::ZERO,
            ))
        }
    }

    fn setup() -> (rescue_alloc_model::Instance, AllocationModel) {
        let instance = fixtures::instance(2);
        let objective = ObjectiveConfig {
            response_weight: 0.0,
            ..ObjectiveConfig::default()
        };
        let model = build_model(
            &instance,
            &fixtures::demand(),
            &fixtures::grid(),
            &fixtures::table(),
            &objective,
        )
        .unwrap();
        (instance, model)
    }

    fn solve_with(model: &AllocationModel, values: Vec<f64>) -> SolvedModel {
        SolverAdapter::new(Box::new(Fixed(values)))
            .solve(model.mip(), &SolverParams::default(), &CancellationToken::new())
            .unwrap()
    }

    /// Column values for: base A at S1 and answer for every zone from there.
    fn all_from_a(model: &AllocationModel) -> Vec<f64> {
        let table = fixtures::table();
        let mut v = vec![0.0; model.mip().num_columns()];
        let n = model.basing_for(StationId::new(1), fixtures::A).unwrap();
        v[n.column().index()] = 1.0 + 1e-9;
        for (i, f) in table.facts().iter().enumerate() {
            if f.craft() == fixtures::A {
                v[model.assignment(i).unwrap().index()] = 1.0;
            }
        }
        v
    }

    fn extract(model: &AllocationModel, instance: &Instance, values: Vec<f64>) -> Result<AllocationPlan, ConsistencyError> {
        extract_plan(
            instance,
            &fixtures::demand(),
            &fixtures::grid(),
            &fixtures::table(),
            model,
            &solve_with(model, values),
            1e-6,
        )
    }

    #[test]
    fn test_extracts_consistent_plan() {
        let (instance, model) = setup();
        let plan = extract(&model, &instance, all_from_a(&model)).unwrap();
        assert_eq!(plan.status(), SolveStatus::Optimal);
        assert_eq!(plan.based_count(StationId::new(1), fixtures::A), 1);
        assert_eq!(plan.deployment_cost(), Cost::new(10));
        assert_eq!(plan.uncovered().count(), 0);
        let w = &plan.windows()[0];
        let r = w
            .coverage_of(CombinedZoneId::new(3), GENERAL_INCIDENT)
            .unwrap()
            .responder()
            .unwrap();
        assert_eq!(r.station(), StationId::new(1));
    }

    fn solve_fixture(fleet_b: u32) -> AllocationPlan {
        let instance = fixtures::instance(fleet_b);
        let objective = ObjectiveConfig {
            response_weight: 0.0,
            ..ObjectiveConfig::default()
        };
        let (demand, grid, table) = (fixtures::demand(), fixtures::grid(), fixtures::table());
        let model = build_model(&instance, &demand, &grid, &table, &objective).unwrap();
        let params = SolverParams {
            relative_gap: 0.0,
            ..SolverParams::default()
        };
        let solved = SolverAdapter::for_choice(Default::default())
            .solve(model.mip(), &params, &CancellationToken::new())
            .unwrap();
        extract_plan(&instance, &demand, &grid, &table, &model, &solved, 1e-6).unwrap()
    }

    #[test]
    fn test_hand_computed_optimum() {
        // Two B craft cannot cover zones 0-1, 2 and 3 from three stations: A at S1 is cheapest.
        let plan = solve_fixture(2);
        assert!((plan.objective() - 10.0).abs() < 1e-6);
        assert_eq!(plan.deployment_cost(), Cost::new(10));
        assert_eq!(plan.based_count(StationId::new(1), fixtures::A), 1);
        assert_eq!(plan.craft_total(fixtures::B), 0);

        // A third B craft makes S0, S1 and S2 with B cheaper than A.
        let plan = solve_fixture(3);
        assert!((plan.objective() - 9.0).abs() < 1e-6);
        assert_eq!(plan.craft_total(fixtures::B), 3);
        assert_eq!(plan.craft_total(fixtures::A), 0);
        assert_eq!(plan.uncovered().count(), 0);
    }

    #[test]
    fn test_fractional_value_is_rejected() {
        let (instance, model) = setup();
        let mut v = all_from_a(&model);
        let n = model.basing_for(StationId::new(1), fixtures::A).unwrap();
        v[n.column().index()] = 0.6;
        assert!(matches!(
            extract(&model, &instance, v),
            Err(ConsistencyError::NonIntegral { .. })
        ));
    }

    #[test]
    fn test_responder_without_basing_is_rejected() {
        let (instance, model) = setup();
        let mut v = all_from_a(&model);
        let n = model.basing_for(StationId::new(1), fixtures::A).unwrap();
        v[n.column().index()] = 0.0;
        assert_eq!(
            extract(&model, &instance, v),
            Err(ConsistencyError::ResponderNotBased {
                station: StationId::new(1),
                craft: fixtures::A,
                window: TimeWindowId::new(0),
            })
        );
    }

    #[test]
    fn test_missing_cover_is_rejected_under_hard_policy() {
        let (instance, model) = setup();
        let mut v = all_from_a(&model);
        let table = fixtures::table();
        let idx = table.for_response(CombinedZoneId::new(2), GENERAL_INCIDENT, TimeWindowId::new(0));
        for &i in idx {
            v[model.assignment(i).unwrap().index()] = 0.0;
        }
        assert_eq!(
            extract(&model, &instance, v),
            Err(ConsistencyError::UncoveredUnderHardPolicy {
                zone: CombinedZoneId::new(2),
                incident: GENERAL_INCIDENT,
                window: TimeWindowId::new(0),
            })
        );
    }

    #[test]
    fn test_unequipped_responder_is_rejected() {
        let towing = IncidentTypeId::new(5);
        let mut b = fixtures::builder(2);
        b.add_incident_type(IncidentType::new(towing, "towing", vec![fixtures::B], 1.0, vec![]))
            .unwrap();
        let instance = b.build().unwrap();
        let zone = CombinedZoneId::new(0);
        let demand = DemandTable::from_entries(vec![IncidentDemand::new(zone, towing, 1.0)]);
        // A table that wrongly lets craft A answer the towing incident.
        let table = CoverageTable::from_facts(vec![CoverageFact::new(
            StationId::new(1),
            fixtures::A,
            zone,
            towing,
            TimeWindowId::new(0),
            0.25,
        )]);
        let grid = fixtures::grid();
        let model =
            build_model(&instance, &demand, &grid, &table, &ObjectiveConfig::default()).unwrap();
        let mut v = vec![0.0; model.mip().num_columns()];
        let n = model.basing_for(StationId::new(1), fixtures::A).unwrap();
        v[n.column().index()] = 1.0;
        v[model.assignment(0).unwrap().index()] = 1.0;
        let solved = solve_with(&model, v);
        assert_eq!(
            extract_plan(&instance, &demand, &grid, &table, &model, &solved, 1e-6),
            Err(ConsistencyError::CraftNotAllowed {
                zone,
                incident: towing,
                craft: fixtures::A,
            })
        );
    }

    #[test]
    fn test_double_cover_is_rejected() {
        let (instance, model) = setup();
        let mut v = all_from_a(&model);
        let n = model.basing_for(StationId::new(0), fixtures::B).unwrap();
        v[n.column().index()] = 1.0;
        let table = fixtures::table();
        for &i in table.for_response(CombinedZoneId::new(0), GENERAL_INCIDENT, TimeWindowId::new(0)) {
            v[model.assignment(i).unwrap().index()] = 1.0;
        }
        assert!(matches!(
            extract(&model, &instance, v),
            Err(ConsistencyError::CoverageMultiplicity { responders: 2, .. })
        ));
    }
}
