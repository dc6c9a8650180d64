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

//! # Synthetic Instances
//!
//! Seeded generator for coastline instances: stations along the North Sea and Baltic coasts, a
//! fixed table of craft classes, a raster of raw demand zones over the (enlarged) bounding box of
//! the stations, a semi-diurnal tide curve per station gauge and a set of incident types.
//!
//! Incident types follow the equipment of the craft classes: one incident per tool, answered by
//! the classes carrying it, plus a number of towing incidents of random size, answered by the
//! classes whose towing capacity is large enough. Each incident appears in a zone with a fixed
//! probability and then gets a random occurrence probability there.

use crate::{
    craft::CraftType,
    err::InstanceBuildError,
    id::{CraftTypeId, GaugeId, IncidentTypeId, StationId, ZoneId},
    incident::IncidentType,
    instance::{Instance, InstanceBuilder},
    station::{CraftSupport, Station},
    tide::{TideSample, TideSeries},
    zone::Zone,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};
use rescue_alloc_core::{
    cost::Cost,
    geo::GeoPoint,
    time::{TimeDelta, TimeInterval, TimePoint},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Principal lunar semi-diurnal (M2) period in seconds.
pub const M2_PERIOD_SECS: f64 = 44_712.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub stations: usize,
    /// Raster size before zones out of reach of every station are dropped.
    pub raw_zones: usize,
    /// Probability that a station supports a non-lifeboat craft class.
    pub support_probability: f64,
    /// Fraction by which the station bounding box is enlarged on every side.
    pub oversize: f64,
    pub horizon: TimeInterval<i64>,
    pub sample_interval: TimeDelta<i64>,
    /// Probability that a tide sample is replaced by a gap marker.
    pub gap_probability: f64,
    pub tidal_amplitude_m: f64,
    pub draft_jitter_m: f64,
    /// Generate incident types. Without them every zone has a single general incident.
    pub incidents: bool,
    /// Probability that an incident type occurs in a zone at all.
    pub incident_zone_probability: f64,
    pub towing_incidents: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            stations: 12,
            raw_zones: 400,
            support_probability: 0.9,
            oversize: 0.1,
            horizon: TimeInterval::new(TimePoint::new(0), TimePoint::new(2 * 86_400)),
            sample_interval: TimeDelta::new(600),
            gap_probability: 0.0,
            tidal_amplitude_m: 1.5,
            draft_jitter_m: 0.05,
            incidents: true,
            incident_zone_probability: 0.4,
            towing_incidents: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Build(#[from] InstanceBuildError),
}

struct CraftClass {
    name: &'static str,
    speed_knots: f64,
    draft_m: f64,
    response_secs: i64,
    range_nm: f64,
    cost: i64,
    /// Fleet size per station, rounded up.
    fleet_per_station: f64,
    tools: &'static [&'static str],
    /// Largest tow this class handles, relative to the strongest class.
    towing: f64,
}

const CRAFT_CLASSES: [CraftClass; 3] = [
    CraftClass {
        name: "28m cruiser",
        speed_knots: 24.0,
        draft_m: 2.8,
        response_secs: 2 * 3600,
        range_nm: 600.0,
        cost: 100,
        fleet_per_station: 0.25,
        tools: &[FIREFIGHTING, PUMPING, SECOND_CRAFT, FIRST_AID, BOARD_HOSPITAL],
        towing: 1.0,
    },
    CraftClass {
        name: "20m cruiser",
        speed_knots: 22.0,
        draft_m: 1.9,
        response_secs: 3 * 1800,
        range_nm: 400.0,
        cost: 60,
        fleet_per_station: 0.35,
        tools: &[PUMPING, SECOND_CRAFT, FIRST_AID, BOARD_HOSPITAL],
        towing: 0.6,
    },
    CraftClass {
        name: "10m lifeboat",
        speed_knots: 18.0,
        draft_m: 0.9,
        response_secs: 3 * 1800,
        range_nm: 100.0,
        cost: 20,
        fleet_per_station: 1.0,
        tools: &[SECOND_CRAFT, FIRST_AID],
        towing: 0.2,
    },
];

const FIREFIGHTING: &str = "firefighting";
const PUMPING: &str = "pumping";
const SECOND_CRAFT: &str = "second_craft";
const FIRST_AID: &str = "first_aid";
const BOARD_HOSPITAL: &str = "board_hospital";

/// Incidents answered by any class carrying the tool of the same name.
const TOOL_INCIDENTS: [&str; 5] = [FIREFIGHTING, PUMPING, SECOND_CRAFT, FIRST_AID, BOARD_HOSPITAL];

/// The lifeboat class is supported by every station and decides which raster zones are kept.
const LIFEBOAT: usize = 2;

pub struct InstanceGenerator {
    config: SyntheticConfig,
    rng: ChaCha8Rng,
}

impl InstanceGenerator {
    pub fn new(config: SyntheticConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    pub fn generate(&mut self) -> Result<Instance, GenerateError> {
        self.validate()?;
        let crafts = self.craft_types()?;
        let stations = self.stations(&crafts);
        let zones = self.zones(&stations, &crafts);
        let tides: Vec<TideSeries> = stations.iter().map(|s| self.tide(s.gauge())).collect();
        let incidents = if self.config.incidents {
            self.incident_types(&crafts, &zones)
        } else {
            Vec::new()
        };

        let mut builder = InstanceBuilder::new();
        for craft in crafts {
            builder.add_craft_type(craft)?;
        }
        for station in stations {
            builder.add_station(station)?;
        }
        for zone in zones {
            builder.add_zone(zone)?;
        }
        for incident in incidents {
            builder.add_incident_type(incident)?;
        }
        for series in tides {
            builder.add_tide_series(series)?;
        }
        Ok(builder.build()?)
    }

    fn validate(&self) -> Result<(), GenerateError> {
        let c = &self.config;
        if c.stations == 0 {
            return Err(GenerateError::InvalidConfig("at least one station is required"));
        }
        if !(0.0..=1.0).contains(&c.support_probability) {
            return Err(GenerateError::InvalidConfig(
                "support_probability must be in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&c.gap_probability) {
            return Err(GenerateError::InvalidConfig("gap_probability must be in [0, 1]"));
        }
        if !c.sample_interval.is_positive() {
            return Err(GenerateError::InvalidConfig("sample_interval must be positive"));
        }
        if !(c.oversize.is_finite() && c.oversize >= 0.0) {
            return Err(GenerateError::InvalidConfig("oversize must be non-negative"));
        }
        if !(0.0..=1.0).contains(&c.incident_zone_probability) {
            return Err(GenerateError::InvalidConfig(
                "incident_zone_probability must be in [0, 1]",
            ));
        }
        Ok(())
    }

    fn craft_types(&mut self) -> Result<Vec<CraftType>, GenerateError> {
        let jitter = Normal::new(0.0, self.config.draft_jitter_m)
            .map_err(|_| GenerateError::InvalidConfig("draft_jitter_m must be non-negative"))?;
        let stations = self.config.stations as f64;
        Ok(CRAFT_CLASSES
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let draft = (class.draft_m + jitter.sample(&mut self.rng)).max(0.1);
                let fleet = (class.fleet_per_station * stations).ceil().max(1.0) as u32;
                CraftType::new(
                    CraftTypeId::new(i as u64),
                    class.name,
                    class.speed_knots,
                    draft,
                    TimeDelta::new(class.response_secs),
                    Some(class.range_nm),
                    Cost::new(class.cost),
                    fleet,
                )
            })
            .collect())
    }

    fn stations(&mut self, crafts: &[CraftType]) -> Vec<Station> {
        let mut stations = Vec::with_capacity(self.config.stations);
        for i in 0..self.config.stations {
            // Alternate between the North Sea and the Baltic coast.
            let position = if i % 2 == 0 {
                GeoPoint::new(
                    self.rng.random_range(53.6..55.0),
                    self.rng.random_range(7.0..8.9),
                )
            } else {
                GeoPoint::new(
                    self.rng.random_range(54.0..54.7),
                    self.rng.random_range(9.9..14.0),
                )
            };
            let mut supported = Vec::new();
            for (k, craft) in crafts.iter().enumerate() {
                if k == LIFEBOAT || self.rng.random_bool(self.config.support_probability) {
                    let operating_cost = Cost::new(self.rng.random_range(0..5));
                    supported.push(CraftSupport::new(craft.id(), operating_cost));
                }
            }
            stations.push(Station::new(
                StationId::new(i as u64),
                format!("station-{i}"),
                position,
                GaugeId::new(i as u64),
                self.rng.random_range(3.6..6.0),
                supported,
            ));
        }
        stations
    }

    fn zones(&mut self, stations: &[Station], crafts: &[CraftType]) -> Vec<Zone> {
        let (mut lat0, mut lat1, mut lon0, mut lon1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for s in stations {
            lat0 = lat0.min(s.position().latitude());
            lat1 = lat1.max(s.position().latitude());
            lon0 = lon0.min(s.position().longitude());
            lon1 = lon1.max(s.position().longitude());
        }
        let pad_lat = ((lat1 - lat0) * self.config.oversize).max(0.05);
        let pad_lon = ((lon1 - lon0) * self.config.oversize).max(0.05);
        let (lat0, lat1) = (lat0 - pad_lat, lat1 + pad_lat);
        let (lon0, lon1) = (lon0 - pad_lon, lon1 + pad_lon);

        let n = self.config.raw_zones.max(1) as f64;
        let aspect = (lon1 - lon0) / (lat1 - lat0);
        let cols = (n * aspect).sqrt().ceil().max(1.0) as usize;
        let rows = (n / cols as f64).ceil().max(1.0) as usize;
        let dlat = (lat1 - lat0) / rows as f64;
        let dlon = (lon1 - lon0) / cols as f64;

        // Keep only zones a lifeboat can reach from the nearest station.
        let reach_nm = crafts.get(LIFEBOAT).map_or(0.0, |c| {
            let by_time = c.speed_knots() * c.response_hours();
            c.range_nm().map_or(by_time, |r| by_time.min(r / 2.0))
        });
        let demand = Exp::new(1.0).ok();

        let mut zones = Vec::new();
        let mut next = 0u64;
        for row in 0..rows {
            for col in 0..cols {
                let position = GeoPoint::new(
                    lat0 + (row as f64 + 0.5) * dlat,
                    lon0 + (col as f64 + 0.5) * dlon,
                );
                let nearest = stations
                    .iter()
                    .map(|s| (s.position().distance_nm(&position), s))
                    .min_by(|a, b| a.0.total_cmp(&b.0));
                let Some((distance, station)) = nearest else {
                    continue;
                };
                if distance > reach_nm {
                    continue;
                }
                let weight = demand.as_ref().map_or(1.0, |d| d.sample(&mut self.rng)) + 0.05;
                zones.push(Zone::new(
                    ZoneId::new(next),
                    position,
                    weight,
                    station.gauge(),
                    self.rng.random_range(5.0..30.0),
                ));
                next += 1;
            }
        }
        zones
    }

    fn incident_types(&mut self, crafts: &[CraftType], zones: &[Zone]) -> Vec<IncidentType> {
        let classes = || CRAFT_CLASSES.iter().zip(crafts);
        let mut incidents = Vec::new();
        for tool in TOOL_INCIDENTS {
            let allowed: Vec<CraftTypeId> = classes()
                .filter(|(class, _)| class.tools.contains(&tool))
                .map(|(_, c)| c.id())
                .collect();
            let weight = self.rng.random::<f64>();
            let probabilities = self.zone_probabilities(zones);
            incidents.push(IncidentType::new(
                IncidentTypeId::new(incidents.len() as u64),
                tool,
                allowed,
                weight,
                probabilities,
            ));
        }

        let count = self.config.towing_incidents;
        for k in 0..count {
            let size = self.rng.random::<f64>();
            let allowed: Vec<CraftTypeId> = classes()
                .filter(|(class, _)| class.towing >= size)
                .map(|(_, c)| c.id())
                .collect();
            let weight = self.rng.random::<f64>() / count as f64;
            let probabilities = self.zone_probabilities(zones);
            incidents.push(IncidentType::new(
                IncidentTypeId::new(incidents.len() as u64),
                format!("towing-{k}"),
                allowed,
                weight,
                probabilities,
            ));
        }
        incidents
    }

    fn zone_probabilities(&mut self, zones: &[Zone]) -> Vec<(ZoneId, f64)> {
        let p = self.config.incident_zone_probability;
        let mut out = Vec::new();
        for zone in zones {
            if self.rng.random_bool(p) {
                out.push((zone.id(), self.rng.random::<f64>()));
            }
        }
        out
    }

    fn tide(&mut self, gauge: GaugeId) -> TideSeries {
        let horizon = self.config.horizon;
        let step = self.config.sample_interval;
        let phase = self.rng.random_range(0.0..std::f64::consts::TAU);
        let mean = self.rng.random_range(-0.2..0.2);
        let amplitude = self.config.tidal_amplitude_m * self.rng.random_range(0.8..1.2);

        let mut samples = Vec::new();
        let mut t = horizon.start() - step;
        let end = horizon.end() + step;
        while t <= end {
            let keep_gap_free = t <= horizon.start() || t >= horizon.end();
            if !keep_gap_free && self.rng.random_bool(self.config.gap_probability) {
                samples.push(TideSample::gap(t));
            } else {
                let x = std::f64::consts::TAU * t.value() as f64 / M2_PERIOD_SECS + phase;
                samples.push(TideSample::new(t, mean + amplitude * x.sin()));
            }
            t += step;
        }
        TideSeries::new(gauge, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SyntheticConfig {
        SyntheticConfig {
            stations: 6,
            raw_zones: 120,
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_instance() {
        let a = InstanceGenerator::new(small(), 42).generate().unwrap();
        let b = InstanceGenerator::new(small(), 42).generate().unwrap();
        assert_eq!(a, b);
        let c = InstanceGenerator::new(small(), 43).generate().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_every_station_supports_lifeboat() {
        let instance = InstanceGenerator::new(small(), 7).generate().unwrap();
        let lifeboat = CraftTypeId::new(LIFEBOAT as u64);
        assert_eq!(instance.stations().len(), 6);
        assert!(instance.stations().iter().all(|s| s.supports(lifeboat)));
        assert_eq!(instance.craft_type(lifeboat).unwrap().fleet(), 6);
    }

    #[test]
    fn test_zones_are_within_reach_and_linked() {
        let instance = InstanceGenerator::new(small(), 11).generate().unwrap();
        assert!(!instance.zones().is_empty());
        assert!(instance.zones().len() < 240);
        for zone in instance.zones() {
            assert!(instance.tide(zone.gauge()).is_some());
            assert!(zone.demand() > 0.0);
        }
    }

    #[test]
    fn test_tides_bracket_horizon() {
        let cfg = small();
        let instance = InstanceGenerator::new(cfg, 3).generate().unwrap();
        for series in instance.tides() {
            let span = series.span().unwrap();
            assert!(span.start() < cfg.horizon.start());
            assert!(span.end() > cfg.horizon.end());
        }
    }

    #[test]
    fn test_gap_injection_keeps_horizon_edges_known() {
        let cfg = SyntheticConfig {
            gap_probability: 0.5,
            ..small()
        };
        let instance = InstanceGenerator::new(cfg, 5).generate().unwrap();
        let series = &instance.tides()[0];
        assert!(series.known_count() < series.len());
        assert!(!series.samples()[0].is_gap());
        assert!(!series.samples()[series.len() - 1].is_gap());
    }

    #[test]
    fn test_incidents_follow_craft_equipment() {
        let instance = InstanceGenerator::new(small(), 13).generate().unwrap();
        let lifeboat = CraftTypeId::new(LIFEBOAT as u64);
        assert_eq!(instance.incident_types().len(), 5 + 10);
        let fire = &instance.incident_types()[0];
        assert_eq!(fire.name(), "firefighting");
        assert_eq!(fire.allowed_crafts(), &[CraftTypeId::new(0)]);
        let first_aid = &instance.incident_types()[3];
        assert!(first_aid.allows(lifeboat));
        for incident in instance.incident_types() {
            assert!(incident.allows(CraftTypeId::new(0)));
            assert!(incident.probabilities().len() < instance.zones().len());
            assert!(incident.probabilities().iter().all(|&(_, p)| (0.0..1.0).contains(&p)));
        }
    }

    #[test]
    fn test_without_incidents_uses_general_demand() {
        let cfg = SyntheticConfig {
            incidents: false,
            ..small()
        };
        let instance = InstanceGenerator::new(cfg, 13).generate().unwrap();
        assert_eq!(instance.incident_types().len(), 1);
        assert_eq!(
            instance.incident_types()[0].allowed_crafts().len(),
            CRAFT_CLASSES.len()
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = SyntheticConfig {
            stations: 0,
            ..SyntheticConfig::default()
        };
        assert!(matches!(
            InstanceGenerator::new(cfg, 0).generate(),
            Err(GenerateError::InvalidConfig(_))
        ));
    }
}
