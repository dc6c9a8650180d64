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

use crate::id::CraftTypeId;
use rescue_alloc_core::{cost::Cost, time::TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A class of rescue craft.
///
/// All physical quantities are metric or nautical: speed in knots, draft in metres,
/// range in nautical miles, the response bound in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftType {
    id: CraftTypeId,
    #[serde(default)]
    name: String,
    speed_knots: f64,
    draft_m: f64,
    response_time: TimeDelta<i64>,
    #[serde(default)]
    range_nm: Option<f64>,
    cost: Cost<i64>,
    fleet: u32,
}

impl CraftType {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CraftTypeId,
        name: impl Into<String>,
        speed_knots: f64,
        draft_m: f64,
        response_time: TimeDelta<i64>,
        range_nm: Option<f64>,
        cost: Cost<i64>,
        fleet: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            speed_knots,
            draft_m,
            response_time,
            range_nm,
            cost,
            fleet,
        }
    }

    #[inline]
    pub fn id(&self) -> CraftTypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn speed_knots(&self) -> f64 {
        self.speed_knots
    }

    #[inline]
    pub fn draft_m(&self) -> f64 {
        self.draft_m
    }

    /// Maximum time from leaving the station to arriving at a zone.
    #[inline]
    pub fn response_time(&self) -> TimeDelta<i64> {
        self.response_time
    }

    #[inline]
    pub fn range_nm(&self) -> Option<f64> {
        self.range_nm
    }

    /// Acquisition and operating cost of one craft of this type.
    #[inline]
    pub fn cost(&self) -> Cost<i64> {
        self.cost
    }

    /// Number of craft of this type available fleet-wide.
    #[inline]
    pub fn fleet(&self) -> u32 {
        self.fleet
    }

    /// Response bound expressed in hours.
    #[inline]
    pub fn response_hours(&self) -> f64 {
        self.response_time.value() as f64 / 3600.0
    }
}

impl Display for CraftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CraftType(id: {}, speed: {} kn, draft: {} m, fleet: {})",
            self.id, self.speed_knots, self.draft_m, self.fleet
        )
    }
}
