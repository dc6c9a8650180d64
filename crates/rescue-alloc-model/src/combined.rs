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
    id::{CombinedZoneId, GaugeId, ZoneId},
    water::WaterBody,
};
use rescue_alloc_core::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A cluster of raw zones represented by one point.
///
/// The representative tidal linkage is the gauge of the member nearest to the centroid, the
/// approach depth is the shallowest member depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedZone {
    id: CombinedZoneId,
    position: GeoPoint,
    demand: f64,
    members: Vec<ZoneId>,
    gauge: GaugeId,
    approach_depth_m: f64,
    water: WaterBody,
}

impl CombinedZone {
    pub fn new(
        id: CombinedZoneId,
        position: GeoPoint,
        demand: f64,
        members: Vec<ZoneId>,
        gauge: GaugeId,
        approach_depth_m: f64,
    ) -> Self {
        let mut members = members;
        members.sort_unstable();
        Self {
            id,
            position,
            demand,
            members,
            gauge,
            approach_depth_m,
            water: WaterBody::classify(position.longitude()),
        }
    }

    #[inline]
    pub fn id(&self) -> CombinedZoneId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    /// Sum of the member demands.
    #[inline]
    pub fn demand(&self) -> f64 {
        self.demand
    }

    /// Member zone ids in ascending order.
    #[inline]
    pub fn members(&self) -> &[ZoneId] {
        &self.members
    }

    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }

    #[inline]
    pub fn approach_depth_m(&self) -> f64 {
        self.approach_depth_m
    }

    #[inline]
    pub fn water(&self) -> WaterBody {
        self.water
    }
}

impl Display for CombinedZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CombinedZone(id: {}, at: {}, demand: {:.3}, members: {})",
            self.id,
            self.position,
            self.demand,
            self.members.len()
        )
    }
}
