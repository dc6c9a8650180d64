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

use crate::id::GaugeId;
use rescue_alloc_core::time::{TimeInterval, TimePoint};
use serde::{Deserialize, Serialize};

/// One water level reading. `level_m == None` is an explicit gap marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TideSample {
    time: TimePoint<i64>,
    level_m: Option<f64>,
}

impl TideSample {
    #[inline]
    pub fn new(time: TimePoint<i64>, level_m: f64) -> Self {
        Self {
            time,
            level_m: Some(level_m),
        }
    }

    #[inline]
    pub fn gap(time: TimePoint<i64>) -> Self {
        Self {
            time,
            level_m: None,
        }
    }

    #[inline]
    pub fn time(&self) -> TimePoint<i64> {
        self.time
    }

    #[inline]
    pub fn level_m(&self) -> Option<f64> {
        self.level_m
    }

    #[inline]
    pub fn is_gap(&self) -> bool {
        self.level_m.is_none()
    }
}

/// Water levels at one tide gauge, in strictly increasing time order.
///
/// The order is validated by [`crate::instance::InstanceBuilder`]; the series itself does not
/// re-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideSeries {
    gauge: GaugeId,
    samples: Vec<TideSample>,
}

impl TideSeries {
    #[inline]
    pub fn new(gauge: GaugeId, samples: Vec<TideSample>) -> Self {
        Self { gauge, samples }
    }

    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }

    #[inline]
    pub fn samples(&self) -> &[TideSample] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples carrying a level.
    pub fn known_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_gap()).count()
    }

    /// The span from the first to the last sample, if there are at least two.
    pub fn span(&self) -> Option<TimeInterval<i64>> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) if self.samples.len() >= 2 => {
                Some(TimeInterval::new(first.time(), last.time()))
            }
            _ => None,
        }
    }

    /// Returns `true` if the timestamps strictly increase.
    pub fn is_strictly_increasing(&self) -> bool {
        self.samples.windows(2).all(|w| w[0].time() < w[1].time())
    }
}
