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

use crate::{
    id::{CraftTypeId, GaugeId, StationId},
    water::WaterBody,
};
use rescue_alloc_core::{cost::Cost, geo::GeoPoint};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

fn default_berth_capacity() -> u32 {
    1
}

/// A craft type that may be based at a station, with the station's own operating cost for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CraftSupport {
    craft: CraftTypeId,
    #[serde(default)]
    operating_cost: Cost<i64>,
}

impl CraftSupport {
    #[inline]
    pub fn new(craft: CraftTypeId, operating_cost: Cost<i64>) -> Self {
        Self {
            craft,
            operating_cost,
        }
    }

    #[inline]
    pub fn craft(&self) -> CraftTypeId {
        self.craft
    }

    #[inline]
    pub fn operating_cost(&self) -> Cost<i64> {
        self.operating_cost
    }
}

/// A shore station. Its exit route is governed by the water level at `gauge`
/// against the charted `access_depth_m`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    id: StationId,
    #[serde(default)]
    name: String,
    position: GeoPoint,
    water: WaterBody,
    gauge: GaugeId,
    access_depth_m: f64,
    #[serde(default = "default_berth_capacity")]
    berth_capacity: u32,
    supported: Vec<CraftSupport>,
}

impl Station {
    pub fn new(
        id: StationId,
        name: impl Into<String>,
        position: GeoPoint,
        gauge: GaugeId,
        access_depth_m: f64,
        supported: Vec<CraftSupport>,
    ) -> Self {
        let mut supported = supported;
        supported.sort_by_key(|s| s.craft());
        Self {
            id,
            name: name.into(),
            position,
            water: WaterBody::classify(position.longitude()),
            gauge,
            access_depth_m,
            berth_capacity: default_berth_capacity(),
            supported,
        }
    }

    #[inline]
    pub fn with_berth_capacity(mut self, capacity: u32) -> Self {
        self.berth_capacity = capacity;
        self
    }

    #[inline]
    pub fn id(&self) -> StationId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    #[inline]
    pub fn water(&self) -> WaterBody {
        self.water
    }

    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }

    #[inline]
    pub fn access_depth_m(&self) -> f64 {
        self.access_depth_m
    }

    /// Maximum number of craft (of any type) based here.
    #[inline]
    pub fn berth_capacity(&self) -> u32 {
        self.berth_capacity
    }

    /// Supported craft types, sorted by id.
    #[inline]
    pub fn supported(&self) -> &[CraftSupport] {
        &self.supported
    }

    #[inline]
    pub fn support_for(&self, craft: CraftTypeId) -> Option<&CraftSupport> {
        self.supported
            .binary_search_by_key(&craft, |s| s.craft())
            .ok()
            .map(|i| &self.supported[i])
    }

    #[inline]
    pub fn supports(&self, craft: CraftTypeId) -> bool {
        self.support_for(craft).is_some()
    }

    pub(crate) fn normalize(&mut self) {
        self.supported.sort_by_key(|s| s.craft());
    }
}

impl Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Station(id: {}, name: {:?}, at: {}, water: {}, supports: {})",
            self.id,
            self.name,
            self.position,
            self.water,
            self.supported.len()
        )
    }
}
