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
    backend::MicroLpBackend,
    cancel::CancellationToken,
    err::{AllocError, ModelInfeasibleError, SolverError},
    milp::{MipBackend, MipModel, MipStatus},
};
use rescue_alloc_model::{SolveStatus, SolverChoice, SolverParams};
use std::time::Duration;
use tracing::{info, instrument};

/// Column values of a solved model together with how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedModel {
    status: SolveStatus,
    values: Vec<f64>,
    objective: f64,
    elapsed: Duration,
}

impl SolvedModel {
    #[inline]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Values in column order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Runs a [`MipBackend`] and turns its termination status into either column values or the
/// matching error.
pub struct SolverAdapter {
    backend: Box<dyn MipBackend>,
}

impl SolverAdapter {
    #[inline]
    pub fn new(backend: Box<dyn MipBackend>) -> Self {
        Self { backend }
    }

    pub fn for_choice(choice: SolverChoice) -> Self {
        match choice {
            SolverChoice::Microlp => Self::new(Box::new(MicroLpBackend::new())),
        }
    }

    #[inline]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Solves `model`.
    ///
    /// # Errors
    ///
    /// - [`ModelInfeasibleError`] when the backend proves infeasibility.
    /// - [`SolverError`] for unbounded models, interrupted solves without an incumbent, backend
    ///   failures and malformed backend answers.
    #[instrument(skip_all, fields(backend = self.backend.name(), model = %model), err(Display))]
    pub fn solve(
        &self,
        model: &MipModel,
        params: &SolverParams,
        cancel: &CancellationToken,
    ) -> Result<SolvedModel, AllocError> {
        let outcome = self.backend.solve(model, params, cancel)?;
        let elapsed = outcome.elapsed();
        let objective = outcome.objective();
        let status = match outcome.status() {
            MipStatus::Optimal => SolveStatus::Optimal,
            MipStatus::Feasible => SolveStatus::Feasible,
            MipStatus::Interrupted if outcome.values().is_some() => SolveStatus::Feasible,
            MipStatus::Interrupted => {
                return Err(SolverError::NoIncumbent {
                    elapsed_ms: elapsed.as_millis() as u64,
                }
                .into());
            }
            MipStatus::Infeasible => return Err(ModelInfeasibleError::reported_by_solver().into()),
            MipStatus::Unbounded => return Err(SolverError::Unbounded.into()),
        };

        let values = outcome.into_values().ok_or_else(|| SolverError::Backend {
            backend: self.backend.name(),
            message: format!("status {status} without column values"),
        })?;
        if values.len() != model.num_columns() {
            return Err(SolverError::ValueCountMismatch {
                expected: model.num_columns(),
                got: values.len(),
            }
            .into());
        }
        let objective = objective.unwrap_or_else(|| model.objective_value(&values));
        info!(%status, objective, elapsed_ms = elapsed.as_millis() as u64, "Model solved");
        Ok(SolvedModel {
            status,
            values,
            objective,
            elapsed,
        })
    }
}

impl std::fmt::Debug for SolverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverAdapter")
            .field("backend", &self.backend.name())
            .finish()
    }
}
