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

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(u64);

impl StationId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        StationId(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl From<u64> for StationId {
    fn from(value: u64) -> Self {
        StationId(value)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CraftTypeId(u64);

impl CraftTypeId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        CraftTypeId(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for CraftTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CraftTypeId({})", self.0)
    }
}

impl From<u64> for CraftTypeId {
    fn from(value: u64) -> Self {
        CraftTypeId(value)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(u64);

impl ZoneId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        ZoneId(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZoneId({})", self.0)
    }
}

impl From<u64> for ZoneId {
    fn from(value: u64) -> Self {
        ZoneId(value)
    }
}

/// Identifies a tide gauge (tidal reference station).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GaugeId(u64);

impl GaugeId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        GaugeId(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for GaugeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GaugeId({})", self.0)
    }
}

impl From<u64> for GaugeId {
    fn from(value: u64) -> Self {
        GaugeId(value)
    }
}

/// Identifies a kind of incident, such as towing or firefighting.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentTypeId(u64);

impl IncidentTypeId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        IncidentTypeId(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for IncidentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IncidentTypeId({})", self.0)
    }
}

impl From<u64> for IncidentTypeId {
    fn from(value: u64) -> Self {
        IncidentTypeId(value)
    }
}

/// Index of a combined zone produced by clustering. Dense, starting at zero.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedZoneId(usize);

impl CombinedZoneId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        CombinedZoneId(index)
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0
    }
}

impl Display for CombinedZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CombinedZoneId({})", self.0)
    }
}

/// Index of a discretized time window. Dense, ordered by first occurrence in time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeWindowId(usize);

impl TimeWindowId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        TimeWindowId(index)
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0
    }
}

impl Display for TimeWindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeWindowId({})", self.0)
    }
}
