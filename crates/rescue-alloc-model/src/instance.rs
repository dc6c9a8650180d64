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

//! # Instances
//!
//! An [`Instance`] bundles the immutable input tables of one allocation problem: stations,
//! craft types, raw zones, incident types and tide series. Instances are only created through
//! [`InstanceBuilder`], which validates every table and every cross reference, so downstream
//! code can look up ids without re-checking them.

use crate::{
    craft::CraftType,
    err::{
        GaugeReference, InstanceBuildError, InvalidCraftTypeError, InvalidIncidentTypeError,
        InvalidPositionError, NonIncreasingTideError, UnknownCraftTypeError, UnknownGaugeError,
    },
    id::{CraftTypeId, GaugeId, IncidentTypeId, StationId, ZoneId},
    incident::{GENERAL_INCIDENT, IncidentType},
    station::Station,
    tide::TideSeries,
    water::WaterSelection,
    zone::Zone,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display, hash::Hash};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceStats {
    station_count: usize,
    craft_type_count: usize,
    zone_count: usize,
    total_fleet: u64,
    total_demand: f64,
    p50_zone_demand: f64,
    p90_zone_demand: f64,
}

impl InstanceStats {
    #[inline]
    pub fn station_count(&self) -> usize {
        self.station_count
    }

    #[inline]
    pub fn craft_type_count(&self) -> usize {
        self.craft_type_count
    }

    #[inline]
    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    #[inline]
    pub fn total_fleet(&self) -> u64 {
        self.total_fleet
    }

    #[inline]
    pub fn total_demand(&self) -> f64 {
        self.total_demand
    }

    #[inline]
    pub fn p50_zone_demand(&self) -> f64 {
        self.p50_zone_demand
    }

    #[inline]
    pub fn p90_zone_demand(&self) -> f64 {
        self.p90_zone_demand
    }
}

/// Flat, serializable form of an [`Instance`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    pub stations: Vec<Station>,
    pub craft_types: Vec<CraftType>,
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub incident_types: Vec<IncidentType>,
    pub tides: Vec<TideSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstanceData", into = "InstanceData")]
pub struct Instance {
    stations: Vec<Station>,
    station_index: HashMap<StationId, usize>,
    craft_types: Vec<CraftType>,
    craft_index: HashMap<CraftTypeId, usize>,
    zones: Vec<Zone>,
    zone_index: HashMap<ZoneId, usize>,
    incident_types: Vec<IncidentType>,
    incident_index: HashMap<IncidentTypeId, usize>,
    tides: Vec<TideSeries>,
    tide_index: HashMap<GaugeId, usize>,
    stats: InstanceStats,
}

impl Instance {
    /// Stations sorted by id.
    #[inline]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Craft types sorted by id.
    #[inline]
    pub fn craft_types(&self) -> &[CraftType] {
        &self.craft_types
    }

    /// Raw zones sorted by id.
    #[inline]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Incident types sorted by id. Never empty once built.
    #[inline]
    pub fn incident_types(&self) -> &[IncidentType] {
        &self.incident_types
    }

    /// Tide series sorted by gauge id.
    #[inline]
    pub fn tides(&self) -> &[TideSeries] {
        &self.tides
    }

    #[inline]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.station_index.get(&id).map(|&i| &self.stations[i])
    }

    #[inline]
    pub fn craft_type(&self, id: CraftTypeId) -> Option<&CraftType> {
        self.craft_index.get(&id).map(|&i| &self.craft_types[i])
    }

    #[inline]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zone_index.get(&id).map(|&i| &self.zones[i])
    }

    #[inline]
    pub fn incident_type(&self, id: IncidentTypeId) -> Option<&IncidentType> {
        self.incident_index.get(&id).map(|&i| &self.incident_types[i])
    }

    #[inline]
    pub fn tide(&self, gauge: GaugeId) -> Option<&TideSeries> {
        self.tide_index.get(&gauge).map(|&i| &self.tides[i])
    }

    #[inline]
    pub fn stats(&self) -> &InstanceStats {
        &self.stats
    }

    /// Restricts the instance to the stations and zones of the selected water bodies.
    ///
    /// Craft types are kept unchanged, tide series only if some remaining station or zone
    /// still references their gauge. Incident probabilities of dropped zones are removed.
    pub fn filter_water(&self, selection: WaterSelection) -> Instance {
        if selection == WaterSelection::Both {
            return self.clone();
        }
        let stations: Vec<Station> = self
            .stations
            .iter()
            .filter(|s| selection.includes(s.water()))
            .cloned()
            .collect();
        let zones: Vec<Zone> = self
            .zones
            .iter()
            .filter(|z| selection.includes(z.water()))
            .cloned()
            .collect();
        let mut gauges: Vec<GaugeId> = stations
            .iter()
            .map(|s| s.gauge())
            .chain(zones.iter().map(|z| z.gauge()))
            .collect();
        gauges.sort_unstable();
        gauges.dedup();
        let tides: Vec<TideSeries> = self
            .tides
            .iter()
            .filter(|t| gauges.binary_search(&t.gauge()).is_ok())
            .cloned()
            .collect();

        let zone_index = index_of(&zones, |z| z.id());
        let incident_types: Vec<IncidentType> = self
            .incident_types
            .iter()
            .cloned()
            .map(|mut i| {
                i.retain_zones(|z| zone_index.contains_key(&z));
                i
            })
            .collect();

        Instance::assemble(
            stations,
            self.craft_types.clone(),
            zones,
            incident_types,
            tides,
        )
    }

    fn assemble(
        stations: Vec<Station>,
        craft_types: Vec<CraftType>,
        zones: Vec<Zone>,
        incident_types: Vec<IncidentType>,
        tides: Vec<TideSeries>,
    ) -> Instance {
        let station_index = index_of(&stations, |s| s.id());
        let craft_index = index_of(&craft_types, |c| c.id());
        let zone_index = index_of(&zones, |z| z.id());
        let incident_index = index_of(&incident_types, |i| i.id());
        let tide_index = index_of(&tides, |t| t.gauge());

        let demands: Vec<f64> = zones.iter().map(|z| z.demand()).collect();
        let stats = InstanceStats {
            station_count: stations.len(),
            craft_type_count: craft_types.len(),
            zone_count: zones.len(),
            total_fleet: craft_types.iter().map(|c| c.fleet() as u64).sum(),
            total_demand: demands.iter().sum(),
            p50_zone_demand: stats::percentile(&demands, 0.50),
            p90_zone_demand: stats::percentile(&demands, 0.90),
        };

        Instance {
            stations,
            station_index,
            craft_types,
            craft_index,
            zones,
            zone_index,
            incident_types,
            incident_index,
            tides,
            tide_index,
            stats,
        }
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance:")?;
        writeln!(f, "  Stations ({}):", self.stations.len())?;
        for s in &self.stations {
            writeln!(f, "    {}", s)?;
        }
        writeln!(f, "  Craft types ({}):", self.craft_types.len())?;
        for c in &self.craft_types {
            writeln!(f, "    {}", c)?;
        }
        writeln!(f, "  Zones: {}", self.zones.len())?;
        writeln!(f, "  Incident types ({}):", self.incident_types.len())?;
        for i in &self.incident_types {
            writeln!(f, "    {}", i)?;
        }
        writeln!(f, "  Tide series: {}", self.tides.len())
    }
}

impl TryFrom<InstanceData> for Instance {
    type Error = InstanceBuildError;

    fn try_from(data: InstanceData) -> Result<Self, Self::Error> {
        let mut builder = InstanceBuilder::new();
        for craft in data.craft_types {
            builder.add_craft_type(craft)?;
        }
        for station in data.stations {
            builder.add_station(station)?;
        }
        for zone in data.zones {
            builder.add_zone(zone)?;
        }
        for incident in data.incident_types {
            builder.add_incident_type(incident)?;
        }
        for series in data.tides {
            builder.add_tide_series(series)?;
        }
        builder.build()
    }
}

impl From<Instance> for InstanceData {
    fn from(instance: Instance) -> Self {
        InstanceData {
            stations: instance.stations,
            craft_types: instance.craft_types,
            zones: instance.zones,
            incident_types: instance.incident_types,
            tides: instance.tides,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    stations: HashMap<StationId, Station>,
    craft_types: HashMap<CraftTypeId, CraftType>,
    zones: HashMap<ZoneId, Zone>,
    incident_types: HashMap<IncidentTypeId, IncidentType>,
    tides: HashMap<GaugeId, TideSeries>,
}

impl InstanceBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_station(&mut self, station: Station) -> Result<&mut Self, InstanceBuildError> {
        let id = station.id();
        if self.stations.contains_key(&id) {
            return Err(InstanceBuildError::DuplicateStation(id));
        }
        if !station.position().is_valid() {
            return Err(InvalidPositionError::new(
                GaugeReference::Station(id),
                station.position(),
            )
            .into());
        }
        let mut station = station;
        station.normalize();
        self.stations.insert(id, station);
        Ok(self)
    }

    pub fn add_craft_type(&mut self, craft: CraftType) -> Result<&mut Self, InstanceBuildError> {
        let id = craft.id();
        if self.craft_types.contains_key(&id) {
            return Err(InstanceBuildError::DuplicateCraftType(id));
        }
        if !(craft.speed_knots().is_finite() && craft.speed_knots() > 0.0) {
            return Err(InvalidCraftTypeError::new(id, "speed must be positive").into());
        }
        if !(craft.draft_m().is_finite() && craft.draft_m() >= 0.0) {
            return Err(InvalidCraftTypeError::new(id, "draft must be non-negative").into());
        }
        if !craft.response_time().is_positive() {
            return Err(InvalidCraftTypeError::new(id, "response time must be positive").into());
        }
        if let Some(range) = craft.range_nm()
            && !(range.is_finite() && range > 0.0)
        {
            return Err(InvalidCraftTypeError::new(id, "range must be positive").into());
        }
        if craft.cost().is_negative() {
            return Err(InvalidCraftTypeError::new(id, "cost must be non-negative").into());
        }
        if craft.fleet() == 0 {
            return Err(InvalidCraftTypeError::new(id, "fleet must be positive").into());
        }
        self.craft_types.insert(id, craft);
        Ok(self)
    }

    pub fn add_zone(&mut self, zone: Zone) -> Result<&mut Self, InstanceBuildError> {
        let id = zone.id();
        if self.zones.contains_key(&id) {
            return Err(InstanceBuildError::DuplicateZone(id));
        }
        if !zone.position().is_valid() {
            return Err(
                InvalidPositionError::new(GaugeReference::Zone(id), zone.position()).into(),
            );
        }
        if !(zone.demand().is_finite() && zone.demand() >= 0.0) {
            return Err(InstanceBuildError::InvalidDemand(id, zone.demand()));
        }
        self.zones.insert(id, zone);
        Ok(self)
    }

    /// Adds an incident type. Without any, [`InstanceBuilder::build`] synthesizes the
    /// [`GENERAL_INCIDENT`].
    pub fn add_incident_type(
        &mut self,
        incident: IncidentType,
    ) -> Result<&mut Self, InstanceBuildError> {
        let id = incident.id();
        if self.incident_types.contains_key(&id) {
            return Err(InstanceBuildError::DuplicateIncidentType(id));
        }
        if !(incident.weight().is_finite() && incident.weight() >= 0.0) {
            return Err(InvalidIncidentTypeError::new(id, "weight must be non-negative").into());
        }
        if incident.allowed_crafts().is_empty() {
            return Err(
                InvalidIncidentTypeError::new(id, "at least one craft type must be allowed").into(),
            );
        }
        let mut incident = incident;
        incident.normalize();
        if incident
            .probabilities()
            .iter()
            .any(|&(_, p)| !(p.is_finite() && p >= 0.0))
        {
            return Err(
                InvalidIncidentTypeError::new(id, "probabilities must be non-negative").into(),
            );
        }
        if incident
            .probabilities()
            .windows(2)
            .any(|w| w[0].0 == w[1].0)
        {
            return Err(
                InvalidIncidentTypeError::new(id, "zone listed more than once").into(),
            );
        }
        self.incident_types.insert(id, incident);
        Ok(self)
    }

    pub fn add_tide_series(
        &mut self,
        series: TideSeries,
    ) -> Result<&mut Self, InstanceBuildError> {
        let gauge = series.gauge();
        if self.tides.contains_key(&gauge) {
            return Err(InstanceBuildError::DuplicateGauge(gauge));
        }
        if let Some(index) = series
            .samples()
            .windows(2)
            .position(|w| w[0].time() >= w[1].time())
        {
            return Err(NonIncreasingTideError::new(gauge, index + 1).into());
        }
        if let Some(index) = series
            .samples()
            .iter()
            .position(|s| s.level_m().is_some_and(|l| !l.is_finite()))
        {
            return Err(InstanceBuildError::NonFiniteTideLevel(gauge, index));
        }
        self.tides.insert(gauge, series);
        Ok(self)
    }

    /// Validates cross references and materializes the instance in id order.
    pub fn build(&self) -> Result<Instance, InstanceBuildError> {
        let stations = materialize_sorted(&self.stations, |s| s.id());
        let craft_types = materialize_sorted(&self.craft_types, |c| c.id());
        let zones = materialize_sorted(&self.zones, |z| z.id());
        let mut incident_types = materialize_sorted(&self.incident_types, |i| i.id());
        let tides = materialize_sorted(&self.tides, |t| t.gauge());

        for station in &stations {
            for support in station.supported() {
                if !self.craft_types.contains_key(&support.craft()) {
                    return Err(UnknownCraftTypeError::new(station.id(), support.craft()).into());
                }
            }
            if !self.tides.contains_key(&station.gauge()) {
                return Err(UnknownGaugeError::new(
                    GaugeReference::Station(station.id()),
                    station.gauge(),
                )
                .into());
            }
        }
        for zone in &zones {
            if !self.tides.contains_key(&zone.gauge()) {
                return Err(
                    UnknownGaugeError::new(GaugeReference::Zone(zone.id()), zone.gauge()).into(),
                );
            }
        }

        for incident in &incident_types {
            if let Some(&craft) = incident
                .allowed_crafts()
                .iter()
                .find(|c| !self.craft_types.contains_key(c))
            {
                return Err(InstanceBuildError::UnknownIncidentCraft(incident.id(), craft));
            }
            if let Some(&(zone, _)) = incident
                .probabilities()
                .iter()
                .find(|(z, _)| !self.zones.contains_key(z))
            {
                return Err(InstanceBuildError::UnknownIncidentZone(incident.id(), zone));
            }
        }
        if incident_types.is_empty() {
            incident_types.push(general_incident(&craft_types, &zones));
        }

        Ok(Instance::assemble(
            stations,
            craft_types,
            zones,
            incident_types,
            tides,
        ))
    }
}

/// One incident answered by every craft type, with the zone demands as probabilities.
fn general_incident(craft_types: &[CraftType], zones: &[Zone]) -> IncidentType {
    IncidentType::new(
        GENERAL_INCIDENT,
        "general",
        craft_types.iter().map(|c| c.id()).collect(),
        1.0,
        zones
            .iter()
            .filter(|z| z.demand() > 0.0)
            .map(|z| (z.id(), z.demand()))
            .collect(),
    )
}

#[inline]
fn materialize_sorted<K, V, FId>(map: &HashMap<K, V>, id_of: FId) -> Vec<V>
where
    K: Copy + Eq + Hash + Ord,
    V: Clone,
    FId: Fn(&V) -> K,
{
    let mut items: Vec<V> = map.values().cloned().collect();
    items.sort_by_key(|v| id_of(v));
    items
}

#[inline]
fn index_of<K, V, FId>(items: &[V], id_of: FId) -> HashMap<K, usize>
where
    K: Eq + Hash,
    FId: Fn(&V) -> K,
{
    items
        .iter()
        .enumerate()
        .map(|(i, v)| (id_of(v), i))
        .collect()
}

mod stats {
    use statrs::statistics::{Data, OrderStatistics};

    pub fn percentile(data: &[f64], p: f64) -> f64 {
        let vals: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        if vals.is_empty() {
            return 0.0;
        }
        let mut d = Data::new(vals);
        d.quantile(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        station::CraftSupport,
        tide::TideSample,
        water::{WaterBody, WaterSelection},
    };
    use rescue_alloc_core::{
        cost::Cost,
        geo::GeoPoint,
        time::{TimeDelta, TimePoint},
    };

    fn craft(id: u64) -> CraftType {
        CraftType::new(
            CraftTypeId::new(id),
            format!("craft-{id}"),
            20.0,
            1.5,
            TimeDelta::new(3600),
            None,
            Cost::new(10),
            2,
        )
    }

    fn station(id: u64, lon: f64, gauge: u64, crafts: &[u64]) -> Station {
        Station::new(
            StationId::new(id),
            format!("station-{id}"),
            GeoPoint::new(54.0, lon),
            GaugeId::new(gauge),
            3.0,
            crafts
                .iter()
                .map(|&c| CraftSupport::new(CraftTypeId::new(c), Cost::new(0)))
                .collect(),
        )
    }

    fn zone(id: u64, lon: f64, gauge: u64) -> Zone {
        Zone::new(
            ZoneId::new(id),
            GeoPoint::new(54.2, lon),
            1.0,
            GaugeId::new(gauge),
            10.0,
        )
    }

    fn tide(gauge: u64) -> TideSeries {
        TideSeries::new(
            GaugeId::new(gauge),
            vec![
                TideSample::new(TimePoint::new(0), 1.0),
                TideSample::new(TimePoint::new(600), 1.0),
            ],
        )
    }

    fn builder() -> InstanceBuilder {
        let mut b = InstanceBuilder::new();
        b.add_craft_type(craft(1)).unwrap();
        b.add_station(station(1, 8.0, 1, &[1])).unwrap();
        b.add_station(station(2, 11.0, 2, &[1])).unwrap();
        b.add_zone(zone(1, 8.1, 1)).unwrap();
        b.add_zone(zone(2, 11.1, 2)).unwrap();
        b.add_tide_series(tide(1)).unwrap();
        b.add_tide_series(tide(2)).unwrap();
        b
    }

    #[test]
    fn test_build_sorts_and_indexes() {
        let instance = builder().build().unwrap();
        assert_eq!(instance.stations()[0].id(), StationId::new(1));
        assert_eq!(instance.stations()[1].id(), StationId::new(2));
        assert_eq!(
            instance.station(StationId::new(2)).unwrap().water(),
            WaterBody::BalticSea
        );
        assert_eq!(instance.stats().zone_count(), 2);
        assert_eq!(instance.stats().total_fleet(), 2);
        assert!((instance.stats().total_demand() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut b = builder();
        assert!(matches!(
            b.add_station(station(1, 8.0, 1, &[1])),
            Err(InstanceBuildError::DuplicateStation(_))
        ));
        assert!(matches!(
            b.add_zone(zone(2, 8.0, 1)),
            Err(InstanceBuildError::DuplicateZone(_))
        ));
    }

    #[test]
    fn test_unknown_references_rejected_on_build() {
        let mut b = builder();
        b.add_station(station(3, 8.0, 1, &[9])).unwrap();
        assert!(matches!(
            b.build(),
            Err(InstanceBuildError::UnknownCraftType(_))
        ));

        let mut b = builder();
        b.add_zone(zone(3, 8.0, 42)).unwrap();
        match b.build() {
            Err(InstanceBuildError::UnknownGauge(e)) => {
                assert_eq!(e.gauge(), GaugeId::new(42));
                assert_eq!(e.referenced_by(), GaugeReference::Zone(ZoneId::new(3)));
            }
            other => panic!("expected unknown gauge, got {other:?}"),
        }
    }

    #[test]
    fn test_non_increasing_tide_rejected() {
        let mut b = InstanceBuilder::new();
        let series = TideSeries::new(
            GaugeId::new(7),
            vec![
                TideSample::new(TimePoint::new(0), 1.0),
                TideSample::new(TimePoint::new(600), 1.0),
                TideSample::new(TimePoint::new(600), 1.2),
            ],
        );
        match b.add_tide_series(series) {
            Err(InstanceBuildError::NonIncreasingTide(e)) => assert_eq!(e.index(), 2),
            other => panic!("expected non-increasing tide, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_tide_level_rejected() {
        for level in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut b = InstanceBuilder::new();
            let series = TideSeries::new(
                GaugeId::new(7),
                vec![
                    TideSample::new(TimePoint::new(0), 1.0),
                    TideSample::new(TimePoint::new(600), level),
                    TideSample::gap(TimePoint::new(1200)),
                ],
            );
            match b.add_tide_series(series) {
                Err(InstanceBuildError::NonFiniteTideLevel(gauge, index)) => {
                    assert_eq!(gauge, GaugeId::new(7));
                    assert_eq!(index, 1);
                }
                other => panic!("expected non-finite tide level, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_fleet_rejected() {
        let mut b = InstanceBuilder::new();
        let idle = CraftType::new(
            CraftTypeId::new(3),
            "idle",
            20.0,
            1.5,
            TimeDelta::new(3600),
            None,
            Cost::new(10),
            0,
        );
        match b.add_craft_type(idle) {
            Err(InstanceBuildError::InvalidCraftType(e)) => {
                assert_eq!(e.craft(), CraftTypeId::new(3));
                assert_eq!(e.reason(), "fleet must be positive");
            }
            other => panic!("expected invalid craft type, got {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        let mut b = InstanceBuilder::new();
        let bad = CraftType::new(
            CraftTypeId::new(5),
            "bad",
            0.0,
            1.0,
            TimeDelta::new(60),
            None,
            Cost::new(1),
            1,
        );
        assert!(matches!(
            b.add_craft_type(bad),
            Err(InstanceBuildError::InvalidCraftType(_))
        ));
        assert!(matches!(
            b.add_station(station(1, 200.0, 1, &[])),
            Err(InstanceBuildError::InvalidPosition(_))
        ));
    }

    fn towing(crafts: &[u64], zones: &[(u64, f64)]) -> IncidentType {
        IncidentType::new(
            IncidentTypeId::new(4),
            "towing",
            crafts.iter().map(|&c| CraftTypeId::new(c)).collect(),
            2.0,
            zones.iter().map(|&(z, p)| (ZoneId::new(z), p)).collect(),
        )
    }

    #[test]
    fn test_general_incident_synthesized() {
        let instance = builder().build().unwrap();
        assert_eq!(instance.incident_types().len(), 1);
        let general = instance.incident_type(GENERAL_INCIDENT).unwrap();
        assert!(general.allows(CraftTypeId::new(1)));
        assert_eq!(general.weight(), 1.0);
        assert_eq!(general.probability(ZoneId::new(2)), 1.0);
    }

    #[test]
    fn test_explicit_incidents_replace_general() {
        let mut b = builder();
        b.add_incident_type(towing(&[1], &[(1, 0.4)])).unwrap();
        let instance = b.build().unwrap();
        assert_eq!(instance.incident_types().len(), 1);
        assert!(instance.incident_type(GENERAL_INCIDENT).is_none());
        let towing = instance.incident_type(IncidentTypeId::new(4)).unwrap();
        assert!((towing.demand(ZoneId::new(1)) - 0.8).abs() < 1e-12);
        assert_eq!(towing.demand(ZoneId::new(2)), 0.0);
    }

    #[test]
    fn test_invalid_incidents_rejected() {
        let mut b = builder();
        b.add_incident_type(towing(&[1], &[(1, 0.4)])).unwrap();
        assert!(matches!(
            b.add_incident_type(towing(&[1], &[])),
            Err(InstanceBuildError::DuplicateIncidentType(_))
        ));

        let mut b = builder();
        match b.add_incident_type(towing(&[1], &[(1, f64::NAN)])) {
            Err(InstanceBuildError::InvalidIncidentType(e)) => {
                assert_eq!(e.reason(), "probabilities must be non-negative");
            }
            other => panic!("expected invalid incident type, got {other:?}"),
        }
        assert!(matches!(
            b.add_incident_type(towing(&[], &[(1, 0.4)])),
            Err(InstanceBuildError::InvalidIncidentType(_))
        ));
        assert!(matches!(
            b.add_incident_type(towing(&[1], &[(1, 0.4), (1, 0.5)])),
            Err(InstanceBuildError::InvalidIncidentType(_))
        ));

        let mut b = builder();
        b.add_incident_type(towing(&[1, 7], &[(1, 0.4)])).unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            InstanceBuildError::UnknownIncidentCraft(IncidentTypeId::new(4), CraftTypeId::new(7))
        );

        let mut b = builder();
        b.add_incident_type(towing(&[1], &[(9, 0.4)])).unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            InstanceBuildError::UnknownIncidentZone(IncidentTypeId::new(4), ZoneId::new(9))
        );
    }

    #[test]
    fn test_filter_water_keeps_referenced_gauges() {
        let instance = builder().build().unwrap();
        let north = instance.filter_water(WaterSelection::NorthSea);
        assert_eq!(north.stations().len(), 1);
        assert_eq!(north.zones().len(), 1);
        assert_eq!(north.tides().len(), 1);
        assert!(north.tide(GaugeId::new(1)).is_some());
        assert!(north.tide(GaugeId::new(2)).is_none());
        assert_eq!(north.craft_types().len(), 1);
        let general = north.incident_type(GENERAL_INCIDENT).unwrap();
        assert_eq!(general.probabilities(), &[(ZoneId::new(1), 1.0)]);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let instance = builder().build().unwrap();
        let json = serde_json::to_string(&instance).unwrap();
        let back: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, instance);

        let mut data = InstanceData::from(instance);
        data.zones.push(data.zones[0].clone());
        let json = serde_json::to_string(&data).unwrap();
        assert!(serde_json::from_str::<Instance>(&json).is_err());
    }
}
