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

//! # Incident Demand
//!
//! Aggregates the incident probabilities of raw zones onto combined zones. The demand of
//! combined zone `z` for incident `i` is `weight(i) * sum of probability(i, m)` over the members
//! `m` of `z`, so the total over all zones is preserved by clustering. Only entries with positive
//! demand are kept; each one becomes a cover requirement per time window.

use rescue_alloc_model::{CombinedZone, CombinedZoneId, IncidentTypeId, Instance};
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentDemand {
    zone: CombinedZoneId,
    incident: IncidentTypeId,
    demand: f64,
}

impl IncidentDemand {
    #[inline]
    pub fn new(zone: CombinedZoneId, incident: IncidentTypeId, demand: f64) -> Self {
        Self {
            zone,
            incident,
            demand,
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
    pub fn demand(&self) -> f64 {
        self.demand
    }

    #[inline]
    fn key(&self) -> (CombinedZoneId, IncidentTypeId) {
        (self.zone, self.incident)
    }
}

/// Positive `(zone, incident)` demands sorted by zone, then incident.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandTable {
    entries: Vec<IncidentDemand>,
    index: HashMap<(CombinedZoneId, IncidentTypeId), usize>,
}

impl DemandTable {
    /// Builds the table from arbitrary entries. Non-positive demands are dropped, duplicate keys
    /// keep the first occurrence.
    pub fn from_entries(entries: Vec<IncidentDemand>) -> Self {
        let mut entries: Vec<IncidentDemand> =
            entries.into_iter().filter(|e| e.demand > 0.0).collect();
        entries.sort_by_key(|e| e.key());
        entries.dedup_by_key(|e| e.key());
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key(), i))
            .collect();
        Self { entries, index }
    }

    /// The whole demand of every zone as one incident. For hand-built zones in tests and
    /// benchmarks whose instance has only the general incident.
    pub fn single_incident(zones: &[CombinedZone], incident: IncidentTypeId) -> Self {
        Self::from_entries(
            zones
                .iter()
                .map(|z| IncidentDemand::new(z.id(), incident, z.demand()))
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[IncidentDemand] {
        &self.entries
    }

    /// Entries of one combined zone.
    pub fn for_zone(&self, zone: CombinedZoneId) -> &[IncidentDemand] {
        let start = self.entries.partition_point(|e| e.zone < zone);
        let end = self.entries.partition_point(|e| e.zone <= zone);
        &self.entries[start..end]
    }

    #[inline]
    pub fn demand(&self, zone: CombinedZoneId, incident: IncidentTypeId) -> f64 {
        self.index
            .get(&(zone, incident))
            .map_or(0.0, |&i| self.entries[i].demand)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.demand).sum()
    }
}

/// Aggregates the incident demand of the raw members onto each combined zone.
#[instrument(skip_all, fields(zones = zones.len(), incidents = instance.incident_types().len()))]
pub fn aggregate_demand(instance: &Instance, zones: &[CombinedZone]) -> DemandTable {
    let mut entries = Vec::new();
    for zone in zones {
        for incident in instance.incident_types() {
            let probability: f64 = zone
                .members()
                .iter()
                .map(|&m| incident.probability(m))
                .sum();
            entries.push(IncidentDemand::new(
                zone.id(),
                incident.id(),
                incident.weight() * probability,
            ));
        }
    }
    let table = DemandTable::from_entries(entries);
    debug!(entries = table.len(), total = table.total(), "Aggregated incident demand");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescue_alloc_core::{
        cost::Cost,
        geo::GeoPoint,
        time::{TimeDelta, TimePoint},
    };
    use rescue_alloc_model::{
        CraftType, CraftTypeId, GENERAL_INCIDENT, GaugeId, IncidentType, InstanceBuilder,
        TideSample, TideSeries, Zone, ZoneId,
    };

    fn builder() -> InstanceBuilder {
        let mut b = InstanceBuilder::new();
        b.add_craft_type(CraftType::new(
            CraftTypeId::new(0),
            "boat",
            20.0,
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
                TideSample::new(TimePoint::new(0), 1.0),
                TideSample::new(TimePoint::new(600), 1.0),
            ],
        ))
        .unwrap();
        for (id, demand) in [(0, 2.0), (1, 0.5), (2, 1.0)] {
            b.add_zone(Zone::new(
                ZoneId::new(id),
                GeoPoint::new(54.0 + 0.01 * id as f64, 8.0),
                demand,
                GaugeId::new(0),
                10.0,
            ))
            .unwrap();
        }
        b
    }

    /// Zones 0 and 1 combined, zone 2 on its own.
    fn zones() -> Vec<CombinedZone> {
        vec![
            CombinedZone::new(
                CombinedZoneId::new(0),
                GeoPoint::new(54.005, 8.0),
                2.5,
                vec![ZoneId::new(0), ZoneId::new(1)],
                GaugeId::new(0),
                10.0,
            ),
            CombinedZone::new(
                CombinedZoneId::new(1),
                GeoPoint::new(54.02, 8.0),
                1.0,
                vec![ZoneId::new(2)],
                GaugeId::new(0),
                10.0,
            ),
        ]
    }

    #[test]
    fn test_general_incident_reproduces_zone_demand() {
        let instance = builder().build().unwrap();
        let table = aggregate_demand(&instance, &zones());
        assert_eq!(table.len(), 2);
        assert_eq!(table.demand(CombinedZoneId::new(0), GENERAL_INCIDENT), 2.5);
        assert_eq!(table.demand(CombinedZoneId::new(1), GENERAL_INCIDENT), 1.0);
        assert_eq!(table, DemandTable::single_incident(&zones(), GENERAL_INCIDENT));
    }

    #[test]
    fn test_weighted_member_probabilities_are_summed() {
        let mut b = builder();
        b.add_incident_type(IncidentType::new(
            IncidentTypeId::new(1),
            "pumping",
            vec![CraftTypeId::new(0)],
            0.5,
            vec![(ZoneId::new(0), 0.2), (ZoneId::new(1), 0.6)],
        ))
        .unwrap();
        b.add_incident_type(IncidentType::new(
            IncidentTypeId::new(2),
            "first_aid",
            vec![CraftTypeId::new(0)],
            2.0,
            vec![(ZoneId::new(2), 0.25)],
        ))
        .unwrap();
        let instance = b.build().unwrap();
        let table = aggregate_demand(&instance, &zones());

        // Zone 1 never sees pumping and zone 0 never needs first aid.
        assert_eq!(table.len(), 2);
        let first = table.for_zone(CombinedZoneId::new(0));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].incident(), IncidentTypeId::new(1));
        assert!((first[0].demand() - 0.4).abs() < 1e-12);
        assert!((table.demand(CombinedZoneId::new(1), IncidentTypeId::new(2)) - 0.5).abs() < 1e-12);
        assert_eq!(table.demand(CombinedZoneId::new(1), IncidentTypeId::new(1)), 0.0);
    }
}
