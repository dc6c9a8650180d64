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
    id::{GaugeId, ZoneId},
    water::WaterBody,
};
use rescue_alloc_core::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A raw demand zone at sea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    id: ZoneId,
    position: GeoPoint,
    demand: f64,
    water: WaterBody,
    gauge: GaugeId,
    approach_depth_m: f64,
}

impl Zone {
    pub fn new(
        id: ZoneId,
        position: GeoPoint,
        demand: f64,
        gauge: GaugeId,
        approach_depth_m: f64,
    ) -> Self {
        Self {
            id,
            position,
            demand,
            water: WaterBody::classify(position.longitude()),
            gauge,
            approach_depth_m,
        }
    }

    #[inline]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    /// Demand weight, for example traffic density.
    #[inline]
    pub fn demand(&self) -> f64 {
        self.demand
    }

    #[inline]
    pub fn water(&self) -> WaterBody {
        self.water
    }

    /// The nearest tide gauge.
    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }

    #[inline]
    pub fn approach_depth_m(&self) -> f64 {
        self.approach_depth_m
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Zone(id: {}, at: {}, demand: {:.3})",
            self.id, self.position, self.demand
        )
    }
}
