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

use crate::id::{CraftTypeId, GaugeId, IncidentTypeId, StationId, ZoneId};
use rescue_alloc_core::geo::GeoPoint;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugeReference {
    Station(StationId),
    Zone(ZoneId),
}

impl std::fmt::Display for GaugeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GaugeReference::Station(id) => write!(f, "{}", id),
            GaugeReference::Zone(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("{referenced_by} references gauge {gauge} without a tide series")]
pub struct UnknownGaugeError {
    referenced_by: GaugeReference,
    gauge: GaugeId,
}

impl UnknownGaugeError {
    #[inline]
    pub fn new(referenced_by: GaugeReference, gauge: GaugeId) -> Self {
        Self {
            referenced_by,
            gauge,
        }
    }

    #[inline]
    pub fn referenced_by(&self) -> GaugeReference {
        self.referenced_by
    }

    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("Station {station} supports unknown craft type {craft}")]
pub struct UnknownCraftTypeError {
    station: StationId,
    craft: CraftTypeId,
}

impl UnknownCraftTypeError {
    #[inline]
    pub fn new(station: StationId, craft: CraftTypeId) -> Self {
        Self { station, craft }
    }

    #[inline]
    pub fn station(&self) -> StationId {
        self.station
    }

    #[inline]
    pub fn craft(&self) -> CraftTypeId {
        self.craft
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("{owner} has a degenerate position {position}")]
pub struct InvalidPositionError {
    owner: GaugeReference,
    position: GeoPoint,
}

impl InvalidPositionError {
    #[inline]
    pub fn new(owner: GaugeReference, position: GeoPoint) -> Self {
        Self { owner, position }
    }

    #[inline]
    pub fn owner(&self) -> GaugeReference {
        self.owner
    }

    #[inline]
    pub fn position(&self) -> GeoPoint {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("Tide series of {gauge} is not strictly increasing at sample {index}")]
pub struct NonIncreasingTideError {
    gauge: GaugeId,
    index: usize,
}

impl NonIncreasingTideError {
    #[inline]
    pub fn new(gauge: GaugeId, index: usize) -> Self {
        Self { gauge, index }
    }

    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }

    /// Index of the first sample whose timestamp does not exceed its predecessor's.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("Craft type {craft} is invalid: {reason}")]
pub struct InvalidCraftTypeError {
    craft: CraftTypeId,
    reason: &'static str,
}

impl InvalidCraftTypeError {
    #[inline]
    pub fn new(craft: CraftTypeId, reason: &'static str) -> Self {
        Self { craft, reason }
    }

    #[inline]
    pub fn craft(&self) -> CraftTypeId {
        self.craft
    }

    #[inline]
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("Incident type {incident} is invalid: {reason}")]
pub struct InvalidIncidentTypeError {
    incident: IncidentTypeId,
    reason: &'static str,
}

impl InvalidIncidentTypeError {
    #[inline]
    pub fn new(incident: IncidentTypeId, reason: &'static str) -> Self {
        Self { incident, reason }
    }

    #[inline]
    pub fn incident(&self) -> IncidentTypeId {
        self.incident
    }

    #[inline]
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstanceBuildError {
    #[error("Duplicate station id {0}")]
    DuplicateStation(StationId),
    #[error("Duplicate craft type id {0}")]
    DuplicateCraftType(CraftTypeId),
    #[error("Duplicate zone id {0}")]
    DuplicateZone(ZoneId),
    #[error("Duplicate tide series for {0}")]
    DuplicateGauge(GaugeId),
    #[error("Duplicate incident type id {0}")]
    DuplicateIncidentType(IncidentTypeId),
    #[error(transparent)]
    UnknownCraftType(#[from] UnknownCraftTypeError),
    #[error(transparent)]
    UnknownGauge(#[from] UnknownGaugeError),
    #[error(transparent)]
    InvalidPosition(#[from] InvalidPositionError),
    #[error(transparent)]
    NonIncreasingTide(#[from] NonIncreasingTideError),
    #[error(transparent)]
    InvalidCraftType(#[from] InvalidCraftTypeError),
    #[error("Zone {0} has an invalid demand weight {1}")]
    InvalidDemand(ZoneId, f64),
    #[error("Tide series of {0} has a non-finite level at sample {1}")]
    NonFiniteTideLevel(GaugeId, usize),
    #[error(transparent)]
    InvalidIncidentType(#[from] InvalidIncidentTypeError),
    #[error("Incident type {0} allows unknown craft type {1}")]
    UnknownIncidentCraft(IncidentTypeId, CraftTypeId),
    #[error("Incident type {0} references unknown zone {1}")]
    UnknownIncidentZone(IncidentTypeId, ZoneId),
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
