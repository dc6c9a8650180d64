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

//! # Rescue Allocation Solver (`rescue-alloc-solver`)
//!
//! The allocation optimization engine. Given an [`rescue_alloc_model::Instance`] and a
//! [`rescue_alloc_model::RunConfig`] it decides how many craft of each type to base at each
//! station so that every incident type of every combined demand zone has a tidally accessible,
//! suitably equipped responder within its response bound in every time window.
//!
//! ## Stages
//!
//! - **`tidal`**: accessibility windows per station exit and zone approach and craft type.
//! - **`cluster`**: demand-weighted k-means aggregation of raw zones into combined zones.
//! - **`timegrid`**: elementary time slices and their merge into weighted time windows.
//! - **`demand`**: incident demand of the raw zones aggregated onto combined zones.
//! - **`coverage`**: the sparse table of feasible `(station, craft, zone, incident, window)`
//!   facts.
//! - **`builder`**: the MILP over basing counts, assignments and (optionally) uncovered markers.
//! - **`milp`**, **`backend`**, **`adapter`**: the solver-neutral model, the `good_lp` / `microlp`
//!   backend and the status mapping.
//! - **`extract`**, **`evaluate`**: plan reconstruction with consistency checks, and evaluation
//!   against the raw zones.
//! - **`pipeline`**: everything above in one run, with a [`cancel::CancellationToken`].

pub mod adapter;
pub mod backend;
pub mod builder;
pub mod cancel;
pub mod cluster;
pub mod coverage;
pub mod demand;
pub mod err;
pub mod evaluate;
pub mod extract;
pub mod milp;
pub mod pipeline;
pub mod tidal;
pub mod timegrid;

pub use cancel::CancellationToken;
pub use err::AllocError;
pub use pipeline::{AllocationEngine, run};

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    assert_impl_all!(crate::adapter::SolverAdapter: Send, Sync);
    assert_impl_all!(crate::pipeline::AllocationEngine: Send, Sync);
    assert_impl_all!(crate::cancel::CancellationToken: Send, Sync, Clone);
    assert_impl_all!(crate::coverage::CoverageTable: Send, Sync);
    assert_impl_all!(crate::tidal::TidalAccessibility: Send, Sync);
    assert_impl_all!(crate::backend::MicroLpBackend: Send, Sync);
}
