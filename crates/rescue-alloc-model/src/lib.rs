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

//! # Rescue Allocation Model (`rescue-alloc-model`)
//!
//! Input and output data model for allocating rescue craft to shore stations along tidal
//! coastlines. Builds on the typed primitives of `rescue-alloc-core`.
//!
//! ## Key Data Structures
//!
//! - **`Station`**: a shore station with its position, tidal exit route (gauge and charted
//!   depth), berth capacity and supported craft types with their operating costs.
//! - **`CraftType`**: a craft class with speed, draft, response-time bound, optional range,
//!   cost and fleet size.
//! - **`Zone`** / **`TideSeries`**: raw demand zones and per-gauge water levels.
//! - **`IncidentType`**: a kind of incident with the craft types able to answer it, a weight and
//!   per-zone occurrence probabilities.
//! - **`Instance`**: the validated bundle of all input tables, created by `InstanceBuilder`.
//! - **`RunConfig`**: the immutable configuration threaded through one optimization run.
//! - **`CombinedZone`**, **`AllocationPlan`**, **`AllocationReport`**: derived artifacts of a run.
//!
//! Synthetic instances for experiments and tests come from `generator::InstanceGenerator`.

pub mod combined;
pub mod config;
pub mod craft;
pub mod err;
pub mod generator;
pub mod id;
pub mod incident;
pub mod instance;
pub mod plan;
pub mod report;
pub mod station;
pub mod tide;
pub mod water;
pub mod zone;

pub use combined::CombinedZone;
pub use config::{
    ClusterConfig, CoverageConfig, CoveragePolicy, ObjectiveConfig, RunConfig, SolverChoice,
    SolverParams, TidalConfig,
};
pub use craft::CraftType;
pub use id::{
    CombinedZoneId, CraftTypeId, GaugeId, IncidentTypeId, StationId, TimeWindowId, ZoneId,
};
pub use incident::{GENERAL_INCIDENT, IncidentType};
pub use instance::{Instance, InstanceBuilder};
pub use plan::{AllocationPlan, SolveStatus};
pub use station::{CraftSupport, Station};
pub use tide::{TideSample, TideSeries};
pub use water::{WaterBody, WaterSelection};
pub use zone::Zone;
