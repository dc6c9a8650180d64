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

//! Evaluation of a plan against the raw, unclustered zones.
//!
//! An incident of a raw zone counts as covered in a window if some based `(station, craft)`
//! equipped for it reaches the zone's own position within the response bound while both the
//! station exit and the approach of the zone's combined zone are accessible. The fastest such
//! responder defines the response time. Samples are weighted by
//! `weight(incident) * probability(incident, zone) * share(window)`.

use crate::{
    cluster::Clustering,
    coverage::reach_hours,
    tidal::{AccessPoint, TidalAccessibility},
    timegrid::TimeGrid,
};
use rayon::prelude::*;
use rescue_alloc_model::{
    AllocationPlan, CoverageConfig, CraftType, Instance, Station, report::PlanEvaluation,
};
use statrs::statistics::{Data, OrderStatistics};
use tracing::{info, instrument};

fn quantile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    Data::new(samples.to_vec()).quantile(p)
}

#[instrument(skip_all, fields(raw = instance.zones().len(), windows = grid.len()))]
pub fn evaluate_plan(
    instance: &Instance,
    clustering: &Clustering,
    plan: &AllocationPlan,
    grid: &TimeGrid,
    accessibility: &TidalAccessibility,
    cfg: &CoverageConfig,
) -> PlanEvaluation {
    let based: Vec<(&Station, &CraftType)> = plan
        .basing()
        .iter()
        .filter_map(|b| Some((instance.station(b.station())?, instance.craft_type(b.craft())?)))
        .collect();

    // (weight, best travel hours) per raw zone, incident and window.
    let samples: Vec<(f64, Option<f64>)> = instance
        .zones()
        .par_iter()
        .flat_map_iter(|zone| {
            let combined = clustering.combined_of(zone.id());
            let reach: Vec<(&Station, &CraftType, f64)> = based
                .iter()
                .filter_map(|&(s, c)| {
                    reach_hours(s, c, zone.position(), cfg).map(|h| (s, c, h))
                })
                .collect();
            let mut out = Vec::new();
            for incident in instance.incident_types() {
                let demand = incident.demand(zone.id());
                if demand <= 0.0 {
                    continue;
                }
                for w in grid.windows() {
                    let best = match (combined, w.representative()) {
                        (Some(cz), Some(slice)) => reach
                            .iter()
                            .filter(|(s, c, _)| {
                                incident.allows(c.id())
                                    && accessibility.is_accessible(
                                        AccessPoint::Station(s.id()),
                                        c.id(),
                                        slice,
                                    )
                                    && accessibility.is_accessible(
                                        AccessPoint::Zone(cz),
                                        c.id(),
                                        slice,
                                    )
                            })
                            .map(|&(_, _, h)| h)
                            .min_by(f64::total_cmp),
                        _ => None,
                    };
                    out.push((demand * grid.share(w.id()), best));
                }
            }
            out
        })
        .collect();

    let total: f64 = samples.iter().map(|(w, _)| w).sum();
    let covered: f64 = samples.iter().filter(|(_, h)| h.is_some()).map(|(w, _)| w).sum();
    let weighted_hours: f64 = samples
        .iter()
        .filter_map(|(w, h)| h.map(|h| w * h))
        .sum();
    let hours: Vec<f64> = samples.iter().filter_map(|(_, h)| *h).collect();

    let evaluation = PlanEvaluation {
        raw_zone_count: instance.zones().len(),
        expected_response_hours: if covered > 0.0 {
            weighted_hours / covered
        } else {
            0.0
        },
        p50_response_hours: quantile(&hours, 0.5),
        p90_response_hours: quantile(&hours, 0.9),
        uncovered_share: if total > 0.0 {
            (total - covered) / total
        } else {
            0.0
        },
    };
    info!(
        expected_hours = evaluation.expected_response_hours,
        uncovered_share = evaluation.uncovered_share,
        "Evaluated plan on raw zones"
    );
    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cluster::aggregate_zones, tidal::compute_accessibility, timegrid::discretize};
    use rescue_alloc_core::{
        cost::Cost,
        geo::GeoPoint,
        time::{TimeDelta, TimeInterval, TimePoint},
    };
    use rescue_alloc_model::{
        ClusterConfig, CraftSupport, CraftTypeId, GaugeId, IncidentType, IncidentTypeId,
        InstanceBuilder, SolveStatus, StationId, TidalConfig, TideSample, TideSeries, Zone,
        ZoneId, plan::CraftBasing,
    };

    fn instance() -> Instance {
        builder().build().unwrap()
    }

    fn builder() -> InstanceBuilder {
        let mut b = InstanceBuilder::new();
        b.add_craft_type(CraftType::new(
            CraftTypeId::new(0),
            "boat",
            10.0,
            1.0,
            TimeDelta::new(3600),
            None,
            Cost::new(1),
            1,
        ))
        .unwrap();
        b.add_tide_series(TideSeries::new(
            GaugeId::new(0),
            vec![
                TideSample::new(TimePoint::new(0), 4.0),
                TideSample::new(TimePoint::new(7200), 4.0),
            ],
        ))
        .unwrap();
        b.add_station(Station::new(
            StationId::new(0),
            "S",
            GeoPoint::new(54.0, 8.0),
            GaugeId::new(0),
            5.0,
            vec![CraftSupport::new(CraftTypeId::new(0), Cost::new(0))],
        ))
        .unwrap();
        // Six nautical miles north (0.6 h) with demand 3; sixty miles north (out of reach).
        b.add_zone(Zone::new(
            ZoneId::new(0),
            GeoPoint::new(54.1, 8.0),
            3.0,
            GaugeId::new(0),
            10.0,
        ))
        .unwrap();
        b.add_zone(Zone::new(
            ZoneId::new(1),
            GeoPoint::new(55.0, 8.0),
            1.0,
            GaugeId::new(0),
            10.0,
        ))
        .unwrap();
        b
    }

    fn evaluate(basing: Vec<CraftBasing>) -> PlanEvaluation {
        evaluate_on(&instance(), basing)
    }

    fn evaluate_on(instance: &Instance, basing: Vec<CraftBasing>) -> PlanEvaluation {
        let clustering =
            aggregate_zones(instance.zones(), 10, 0, &ClusterConfig::default()).unwrap();
        let horizon = TimeInterval::new(TimePoint::new(0), TimePoint::new(7200));
        let acc =
            compute_accessibility(instance, clustering.zones(), horizon, &TidalConfig::default())
                .unwrap();
        let grid = discretize(&acc, true);
        let plan = AllocationPlan::new(SolveStatus::Optimal, 0.0, Cost::new(0), basing, vec![]);
        evaluate_plan(
            instance,
            &clustering,
            &plan,
            &grid,
            &acc,
            &CoverageConfig::default(),
        )
    }

    #[test]
    fn test_empty_plan_leaves_everything_uncovered() {
        let e = evaluate(vec![]);
        assert_eq!(e.raw_zone_count, 2);
        assert_eq!(e.uncovered_share, 1.0);
        assert_eq!(e.expected_response_hours, 0.0);
    }

    #[test]
    fn test_reachable_zone_is_covered() {
        let e = evaluate(vec![CraftBasing::new(StationId::new(0), CraftTypeId::new(0), 1)]);
        // Demand 3 of 4 is reachable.
        assert!((e.uncovered_share - 0.25).abs() < 1e-9);
        assert!((e.expected_response_hours - 0.6).abs() < 0.01);
        assert!((e.p50_response_hours - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_unequipped_craft_does_not_count() {
        // Towing in the reachable zone needs a craft type the fleet does not have; first aid in
        // the same zone can be answered by the boat.
        let mut b = builder();
        b.add_craft_type(CraftType::new(
            CraftTypeId::new(1),
            "tug",
            10.0,
            1.0,
            TimeDelta::new(3600),
            None,
            Cost::new(1),
            1,
        ))
        .unwrap();
        b.add_incident_type(IncidentType::new(
            IncidentTypeId::new(1),
            "towing",
            vec![CraftTypeId::new(1)],
            1.0,
            vec![(ZoneId::new(0), 0.5)],
        ))
        .unwrap();
        b.add_incident_type(IncidentType::new(
            IncidentTypeId::new(2),
            "first_aid",
            vec![CraftTypeId::new(0), CraftTypeId::new(1)],
            3.0,
            vec![(ZoneId::new(0), 0.5)],
        ))
        .unwrap();
        let instance = b.build().unwrap();
        let e = evaluate_on(
            &instance,
            vec![CraftBasing::new(StationId::new(0), CraftTypeId::new(0), 1)],
        );
        // Weighted demand 0.5 of 2.0 is towing, which the boat cannot answer.
        assert!((e.uncovered_share - 0.25).abs() < 1e-9);
        assert!((e.expected_response_hours - 0.6).abs() < 0.01);
    }
}
