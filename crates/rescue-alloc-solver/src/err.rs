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

//! Error taxonomy of the allocation engine.
//!
//! Preprocessing errors ([`InsufficientDataError`], [`InvalidClusterCountError`]) abort a run
//! before any model is built. [`ModelInfeasibleError`] is an expected terminal outcome and is
//! kept distinct from [`SolverError`]. [`ConsistencyError`] signals a bug in model building or
//! extraction and is always fatal.

use rescue_alloc_core::time::{TimeDelta, TimeInterval};
use rescue_alloc_model::{
    CombinedZoneId, CraftTypeId, GaugeId, IncidentTypeId, StationId, TimeWindowId,
    err::InstanceBuildError,
};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error(
    "Tide series of {gauge} does not cover horizon {required}: {usable_samples} usable samples{}",
    .covered.map(|c| format!(", covering {c}")).unwrap_or_default()
)]
pub struct InsufficientDataError {
    gauge: GaugeId,
    required: TimeInterval<i64>,
    covered: Option<TimeInterval<i64>>,
    usable_samples: usize,
}

impl InsufficientDataError {
    #[inline]
    pub fn new(
        gauge: GaugeId,
        required: TimeInterval<i64>,
        covered: Option<TimeInterval<i64>>,
        usable_samples: usize,
    ) -> Self {
        Self {
            gauge,
            required,
            covered,
            usable_samples,
        }
    }

    #[inline]
    pub fn gauge(&self) -> GaugeId {
        self.gauge
    }

    #[inline]
    pub fn required(&self) -> TimeInterval<i64> {
        self.required
    }

    /// Span of the series, if it has at least two samples.
    #[inline]
    pub fn covered(&self) -> Option<TimeInterval<i64>> {
        self.covered
    }

    /// Number of samples carrying a level.
    #[inline]
    pub fn usable_samples(&self) -> usize {
        self.usable_samples
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("Invalid cluster count {requested}: must be positive")]
pub struct InvalidClusterCountError {
    requested: usize,
}

impl InvalidClusterCountError {
    #[inline]
    pub fn new(requested: usize) -> Self {
        Self { requested }
    }

    #[inline]
    pub fn requested(&self) -> usize {
        self.requested
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfeasibilitySource {
    /// Detected while building the model: some zone, incident and window has no feasible
    /// responder.
    Structural,
    /// Reported by the solver.
    Solver,
}

impl Display for InfeasibilitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibilitySource::Structural => write!(f, "structural"),
            InfeasibilitySource::Solver => write!(f, "solver"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error(
    "No allocation covers every incident of every zone in every time window ({source_kind}, {} uncoverable responses)",
    .uncoverable.len()
)]
pub struct ModelInfeasibleError {
    source_kind: InfeasibilitySource,
    uncoverable: Vec<(CombinedZoneId, IncidentTypeId, TimeWindowId)>,
}

impl ModelInfeasibleError {
    #[inline]
    pub fn structural(uncoverable: Vec<(CombinedZoneId, IncidentTypeId, TimeWindowId)>) -> Self {
        Self {
            source_kind: InfeasibilitySource::Structural,
            uncoverable,
        }
    }

    #[inline]
    pub fn reported_by_solver() -> Self {
        Self {
            source_kind: InfeasibilitySource::Solver,
            uncoverable: Vec::new(),
        }
    }

    #[inline]
    pub fn source_kind(&self) -> InfeasibilitySource {
        self.source_kind
    }

    /// `(zone, incident, window)` triples known to be uncoverable. Empty when the solver
    /// reported infeasibility without further diagnostics.
    #[inline]
    pub fn uncoverable(&self) -> &[(CombinedZoneId, IncidentTypeId, TimeWindowId)] {
        &self.uncoverable
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("Solver backend {backend} failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
    #[error("Model is unbounded")]
    Unbounded,
    #[error("Solve interrupted after {elapsed_ms} ms without an incumbent")]
    NoIncumbent { elapsed_ms: u64 },
    #[error("Solver worker terminated without reporting a result")]
    WorkerDisconnected,
    #[error("Solver returned {got} values for {expected} columns")]
    ValueCountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("Column {column} should be integral but has value {value}")]
    NonIntegral { column: String, value: f64 },
    #[error("{station} bases {based} craft but its berth capacity is {capacity}")]
    BerthCapacityExceeded {
        station: StationId,
        based: u32,
        capacity: u32,
    },
    #[error("{craft} is based {based} times but the fleet has {fleet}")]
    FleetExceeded {
        craft: CraftTypeId,
        based: u32,
        fleet: u32,
    },
    #[error("{station} bases unsupported {craft}")]
    UnsupportedCraft {
        station: StationId,
        craft: CraftTypeId,
    },
    #[error("{station}/{craft} responds in {window} without being based there")]
    ResponderNotBased {
        station: StationId,
        craft: CraftTypeId,
        window: TimeWindowId,
    },
    #[error("{station}/{craft} answers for {assigned} responses in {window}, allowed {allowed}")]
    ResponderOverloaded {
        station: StationId,
        craft: CraftTypeId,
        window: TimeWindowId,
        assigned: usize,
        allowed: usize,
    },
    #[error("{craft} answers {incident} in {zone} without being equipped for it")]
    CraftNotAllowed {
        zone: CombinedZoneId,
        incident: IncidentTypeId,
        craft: CraftTypeId,
    },
    #[error("{incident} in {zone} has {responders} responders in {window}, expected exactly one")]
    CoverageMultiplicity {
        zone: CombinedZoneId,
        incident: IncidentTypeId,
        window: TimeWindowId,
        responders: usize,
    },
    #[error("{incident} in {zone} is uncovered in {window} under hard coverage")]
    UncoveredUnderHardPolicy {
        zone: CombinedZoneId,
        incident: IncidentTypeId,
        window: TimeWindowId,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstanceError {
    #[error(transparent)]
    Build(#[from] InstanceBuildError),
    #[error("No {0} left after water body selection")]
    Empty(&'static str),
    #[error("Analysis horizon {0} is empty")]
    EmptyHorizon(TimeInterval<i64>),
    #[error("Minimum window length {0} is negative")]
    NegativeMinWindow(TimeDelta<i64>),
}

/// Everything an optimization run can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocError {
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),
    #[error(transparent)]
    InvalidClusterCount(#[from] InvalidClusterCountError),
    #[error(transparent)]
    ModelInfeasible(#[from] ModelInfeasibleError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}
