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

//! # Allocation Pipeline
//!
//! One optimization run, start to finish:
//!
//! 1. validate the configuration and restrict the instance to the selected water bodies,
//! 2. aggregate raw zones into combined zones and their per-incident demand,
//! 3. compute tidal accessibility windows and discretize the horizon,
//! 4. produce the sparse coverage table,
//! 5. build and solve the allocation model,
//! 6. extract, validate and evaluate the plan.
//!
//! Steps 1 to 4 fail before any solver is started. Every run owns its solver session, so runs
//! can execute concurrently.

use crate::{
    adapter::SolverAdapter,
    builder::build_model,
    cancel::CancellationToken,
    cluster::aggregate_zones,
    coverage::build_coverage,
    demand::aggregate_demand,
    err::{AllocError, InstanceError},
    evaluate::evaluate_plan,
    extract::extract_plan,
    tidal::compute_accessibility,
    timegrid::discretize,
};
use rescue_alloc_model::{
    Instance, RunConfig,
    report::{AllocationReport, RunSummary},
};
use std::time::Instant;
use tracing::{info, instrument};

/// Runs optimizations with one solver backend.
#[derive(Debug)]
pub struct AllocationEngine {
    adapter: SolverAdapter,
}

impl AllocationEngine {
    #[inline]
    pub fn new(adapter: SolverAdapter) -> Self {
        Self { adapter }
    }

    #[inline]
    pub fn adapter(&self) -> &SolverAdapter {
        &self.adapter
    }

    #[instrument(name = "run", skip_all, fields(seed = cfg.seed, water = %cfg.water, k = cfg.cluster.target_zones), err(Display))]
    pub fn run(
        &self,
        instance: &Instance,
        cfg: &RunConfig,
        cancel: &CancellationToken,
    ) -> Result<AllocationReport, AllocError> {
        let started = Instant::now();
        let instance = prepare(instance, cfg)?;

        let clustering = aggregate_zones(
            instance.zones(),
            cfg.cluster.target_zones,
            cfg.seed,
            &cfg.cluster,
        )?;
        let zones = clustering.zones();
        let demand = aggregate_demand(&instance, zones);

        let accessibility = compute_accessibility(&instance, zones, cfg.horizon, &cfg.tidal)?;
        let grid = discretize(&accessibility, cfg.coverage.merge_equivalent_slices);
        let table =
            build_coverage(&instance, zones, &demand, &grid, &accessibility, &cfg.coverage);
        let model = build_model(&instance, &demand, &grid, &table, &cfg.objective)?;

        let solved = self.adapter.solve(model.mip(), &cfg.solver, cancel)?;
        let plan = extract_plan(
            &instance,
            &demand,
            &grid,
            &table,
            &model,
            &solved,
            cfg.solver.integrality_tolerance,
        )?;
        let evaluation = evaluate_plan(
            &instance,
            &clustering,
            &plan,
            &grid,
            &accessibility,
            &cfg.coverage,
        );

        let run = RunSummary {
            seed: cfg.seed,
            water: cfg.water,
            raw_zone_count: instance.zones().len(),
            combined_zone_count: zones.len(),
            time_window_count: grid.len(),
            coverage_fact_count: table.len(),
            solver: cfg.solver.backend,
            status: plan.status(),
            objective: plan.objective(),
            runtime_ms: started.elapsed().as_millis() as u64,
            solve_ms: solved.elapsed().as_millis() as u64,
        };
        info!(
            status = %run.status,
            objective = run.objective,
            runtime_ms = run.runtime_ms,
            solve_ms = run.solve_ms,
            "Run finished"
        );
        Ok(AllocationReport {
            run,
            zones: clustering.into_zones(),
            plan,
            evaluation,
        })
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(SolverAdapter::for_choice(Default::default()))
    }
}

/// Runs one optimization with the backend selected in `cfg.solver`.
pub fn run(
    instance: &Instance,
    cfg: &RunConfig,
    cancel: &CancellationToken,
) -> Result<AllocationReport, AllocError> {
    AllocationEngine::new(SolverAdapter::for_choice(cfg.solver.backend)).run(instance, cfg, cancel)
}

fn prepare(instance: &Instance, cfg: &RunConfig) -> Result<Instance, InstanceError> {
    if cfg.horizon.is_empty() {
        return Err(InstanceError::EmptyHorizon(cfg.horizon));
    }
    if cfg.tidal.min_window.is_negative() {
        return Err(InstanceError::NegativeMinWindow(cfg.tidal.min_window));
    }
    let filtered = instance.filter_water(cfg.water);
    if filtered.stations().is_empty() {
        return Err(InstanceError::Empty("stations"));
    }
    if filtered.zones().is_empty() {
        return Err(InstanceError::Empty("zones"));
    }
    if filtered.craft_types().is_empty() {
        return Err(InstanceError::Empty("craft types"));
    }
    info!(
        stations = filtered.stations().len(),
        zones = filtered.zones().len(),
        craft_types = filtered.craft_types().len(),
        "Prepared instance"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::{InfeasibilitySource, ModelInfeasibleError};
    use rescue_alloc_core::{
        cost::Cost,
        geo::GeoPoint,
        time::{TimeDelta, TimeInterval, TimePoint},
    };
    use rescue_alloc_model::{
        CoveragePolicy, CraftSupport, CraftType, CraftTypeId, GaugeId, InstanceBuilder,
        ObjectiveConfig, SolveStatus, Station, StationId, TideSample, TideSeries, WaterSelection,
        Zone, ZoneId,
        generator::{InstanceGenerator, SyntheticConfig},
    };

    const HORIZON: i64 = 4 * 3600;

    /// Two stations 30 nm apart with one boat in the fleet and one zone next to each station.
    fn two_station_instance(fleet: u32) -> Instance {
        let mut b = InstanceBuilder::new();
        b.add_craft_type(CraftType::new(
            CraftTypeId::new(0),
            "boat",
            20.0,
            1.0,
            TimeDelta::new(1800),
            None,
            Cost::new(5),
            fleet,
        ))
        .unwrap();
        b.add_tide_series(TideSeries::new(
            GaugeId::new(0),
            vec![
                TideSample::new(TimePoint::new(0), 4.0),
                TideSample::new(TimePoint::new(HORIZON), 4.0),
            ],
        ))
        .unwrap();
        for s in 0..2u64 {
            let lat = 54.0 + 0.5 * s as f64;
            b.add_station(Station::new(
                StationId::new(s),
                format!("S{s}"),
                GeoPoint::new(lat, 8.0),
                GaugeId::new(0),
                5.0,
                vec![CraftSupport::new(CraftTypeId::new(0), Cost::new(0))],
            ))
            .unwrap();
            b.add_zone(Zone::new(
                ZoneId::new(s),
                GeoPoint::new(lat + 0.02, 8.0),
                1.0,
                GaugeId::new(0),
                10.0,
            ))
            .unwrap();
        }
        b.build().unwrap()
    }

    fn config() -> RunConfig {
        let mut cfg = RunConfig {
            horizon: TimeInterval::new(TimePoint::new(0), TimePoint::new(HORIZON)),
            ..RunConfig::default()
        }
        .with_target_zones(2);
        cfg.solver.relative_gap = 0.0;
        cfg
    }

    #[test]
    fn test_two_stations_need_two_boats() {
        let report = run(&two_station_instance(2), &config(), &CancellationToken::new()).unwrap();
        assert_eq!(report.run.status, SolveStatus::Optimal);
        assert_eq!(report.plan.craft_total(CraftTypeId::new(0)), 2);
        assert_eq!(report.plan.deployment_cost(), Cost::new(10));
        assert_eq!(report.plan.uncovered().count(), 0);
        assert_eq!(report.zones.len(), 2);
        assert_eq!(report.evaluation.uncovered_share, 0.0);
    }

    #[test]
    fn test_short_fleet_is_infeasible_under_hard_coverage() {
        let err = run(&two_station_instance(1), &config(), &CancellationToken::new()).unwrap_err();
        match err {
            AllocError::ModelInfeasible(e) => {
                assert_eq!(e.source_kind(), InfeasibilitySource::Solver)
            }
            other => panic!("expected infeasibility, got {other}"),
        }
    }

    #[test]
    fn test_soft_coverage_leaves_one_zone_uncovered() {
        let mut cfg = config();
        cfg.objective = ObjectiveConfig {
            policy: CoveragePolicy::Soft {
                uncovered_penalty: 100.0,
            },
            ..ObjectiveConfig::default()
        };
        let report = run(&two_station_instance(1), &cfg, &CancellationToken::new()).unwrap();
        assert_eq!(report.plan.craft_total(CraftTypeId::new(0)), 1);
        let uncovered = report.plan.uncovered().count();
        assert_eq!(uncovered, report.run.time_window_count);
        assert!((report.evaluation.uncovered_share - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unreachable_zone_is_reported_structurally() {
        let mut b = InstanceBuilder::new();
        let instance = two_station_instance(2);
        for c in instance.craft_types() {
            b.add_craft_type(c.clone()).unwrap();
        }
        for t in instance.tides() {
            b.add_tide_series(t.clone()).unwrap();
        }
        b.add_station(instance.stations()[0].clone()).unwrap();
        b.add_zone(instance.zones()[0].clone()).unwrap();
        b.add_zone(Zone::new(
            ZoneId::new(9),
            GeoPoint::new(56.0, 8.0),
            1.0,
            GaugeId::new(0),
            10.0,
        ))
        .unwrap();
        let err = run(&b.build().unwrap(), &config(), &CancellationToken::new()).unwrap_err();
        let AllocError::ModelInfeasible(e) = err else {
            panic!("expected infeasibility");
        };
        assert_eq!(e.source_kind(), InfeasibilitySource::Structural);
        assert!(!e.uncoverable().is_empty());
        assert_ne!(e, ModelInfeasibleError::reported_by_solver());
    }

    #[test]
    fn test_invalid_inputs_fail_before_solving() {
        let instance = two_station_instance(2);
        let empty_horizon = RunConfig {
            horizon: TimeInterval::new(TimePoint::new(5), TimePoint::new(5)),
            ..config()
        };
        assert!(matches!(
            run(&instance, &empty_horizon, &CancellationToken::new()),
            Err(AllocError::Instance(InstanceError::EmptyHorizon(_)))
        ));
        let baltic = config().with_water(WaterSelection::BalticSea);
        assert!(matches!(
            run(&instance, &baltic, &CancellationToken::new()),
            Err(AllocError::Instance(InstanceError::Empty("stations")))
        ));
        let zero_k = config().with_target_zones(0);
        assert!(matches!(
            run(&instance, &zero_k, &CancellationToken::new()),
            Err(AllocError::InvalidClusterCount(_))
        ));
        let long = RunConfig {
            horizon: TimeInterval::new(TimePoint::new(0), TimePoint::new(HORIZON + 3600)),
            ..config()
        };
        assert!(matches!(
            run(&instance, &long, &CancellationToken::new()),
            Err(AllocError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_cancelled_run_reports_no_incumbent() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            run(&two_station_instance(2), &config(), &token),
            Err(AllocError::Solver(crate::err::SolverError::NoIncumbent { .. }))
        ));
    }

    #[test]
    fn test_generated_runs_are_deterministic() {
        let synthetic = SyntheticConfig {
            stations: 2,
            raw_zones: 30,
            horizon: TimeInterval::new(TimePoint::new(0), TimePoint::new(6 * 3600)),
            ..SyntheticConfig::default()
        };
        let instance = InstanceGenerator::new(synthetic, 11).generate().unwrap();
        let mut cfg = RunConfig {
            horizon: synthetic.horizon,
            ..RunConfig::default()
        }
        .with_seed(11)
        .with_target_zones(3);
        cfg.objective.policy = CoveragePolicy::Soft {
            uncovered_penalty: 1_000.0,
        };
        let a = run(&instance, &cfg, &CancellationToken::new()).unwrap();
        let b = run(&instance, &cfg, &CancellationToken::new()).unwrap();
        assert_eq!(a.plan, b.plan);
        assert_eq!(a.zones, b.zones);
        assert_eq!(a.evaluation, b.evaluation);
    }
}
