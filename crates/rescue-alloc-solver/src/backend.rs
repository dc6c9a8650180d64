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
//! `good_lp` backend running the pure-Rust `microlp` solver.
//!
//! The time limit and the relative optimality gap are handed to `microlp`, which stops with its
//! best incumbent when either is reached. The solve runs on its own worker thread so the calling
//! thread can watch the cancellation token; a cancelled worker runs until its own time limit and
//! its result is dropped.

use crate::{
    cancel::CancellationToken,
    err::SolverError,
    milp::{ColumnKind, MipBackend, MipModel, MipOutcome, MipStatus, Sense},
};
use good_lp::{
    Expression, ResolutionError, Solution, SolutionStatus, SolverModel, Variable, WithMipGap,
    WithTimeLimit, microlp, variable, variables,
};
use rescue_alloc_model::SolverParams;
use std::{
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::Instant,
};
use tracing::{debug, info, instrument, warn};

const NAME: &str = "microlp";

/// Message `good_lp` reports when the time limit expires before any feasible point is found.
const NO_INCUMBENT_MESSAGE: &str = "Time limit reached";

enum WorkerResult {
    Solved { status: MipStatus, values: Vec<f64> },
    Infeasible,
    Unbounded,
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
struct JobLimits {
    time_limit_secs: Option<f64>,
    relative_gap: f32,
}

impl JobLimits {
    fn from_params(params: &SolverParams) -> Self {
        let relative_gap = if params.relative_gap.is_finite() && params.relative_gap > 0.0 {
            params.relative_gap as f32
        } else {
            0.0
        };
        Self {
            time_limit_secs: params.time_limit().map(|d| d.as_secs_f64()),
            relative_gap,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MicroLpBackend {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl MipBackend for MicroLpBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(skip_all, fields(backend = NAME, columns = model.num_columns(), rows = model.num_rows()), err(Display))]
    fn solve(
        &self,
        model: &MipModel,
        params: &SolverParams,
        cancel: &CancellationToken,
    ) -> Result<MipOutcome, SolverError> {
        let started = Instant::now();
        if params.threads != 1 {
            debug!(threads = params.threads, "microlp solves single-threaded");
        }
        if cancel.is_cancelled() {
            warn!("Cancelled before the solve started");
            return Ok(MipOutcome::without_solution(
                MipStatus::Interrupted,
                started.elapsed(),
            ));
        }
        if model.num_columns() == 0 {
            return Ok(if model.max_violation(&[]) > 0.0 {
                MipOutcome::without_solution(MipStatus::Infeasible, started.elapsed())
            } else {
                MipOutcome::with_solution(MipStatus::Optimal, Vec::new(), 0.0, started.elapsed())
            });
        }

        let limits = JobLimits::from_params(params);
        let shared = Arc::new(model.clone());
        let job = Arc::clone(&shared);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("microlp-solve".into())
            .spawn(move || {
                let _ = tx.send(run_job(&job, limits));
            })
            .map_err(|e| SolverError::Backend {
                backend: NAME,
                message: format!("cannot spawn solver thread: {e}"),
            })?;

        let poll = params.poll_interval();
        let result = loop {
            match rx.recv_timeout(poll) {
                Ok(result) => break result,
                Err(RecvTimeoutError::Disconnected) => return Err(SolverError::WorkerDisconnected),
                Err(RecvTimeoutError::Timeout) if cancel.is_cancelled() => {
                    warn!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Solve cancelled"
                    );
                    return Ok(MipOutcome::without_solution(
                        MipStatus::Interrupted,
                        started.elapsed(),
                    ));
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        };

        let elapsed = started.elapsed();
        let outcome = match result {
            WorkerResult::Solved { status, values } => {
                let objective = shared.objective_value(&values);
                MipOutcome::with_solution(status, values, objective, elapsed)
            }
            WorkerResult::Infeasible => MipOutcome::without_solution(MipStatus::Infeasible, elapsed),
            WorkerResult::Unbounded => MipOutcome::without_solution(MipStatus::Unbounded, elapsed),
            WorkerResult::TimedOut => MipOutcome::without_solution(MipStatus::Interrupted, elapsed),
            WorkerResult::Failed(message) => {
                return Err(SolverError::Backend {
                    backend: NAME,
                    message,
                });
            }
        };
        info!(
            status = %outcome.status(),
            objective = outcome.objective(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Solve finished"
        );
        Ok(outcome)
    }
}

fn run_job(model: &MipModel, limits: JobLimits) -> WorkerResult {
    let mut vars = variables!();
    let cols: Vec<Variable> = model
        .columns()
        .iter()
        .map(|c| {
            let mut def = variable().name(c.name());
            def = match c.kind() {
                ColumnKind::Binary => def.binary(),
                ColumnKind::Integer => def.integer(),
                ColumnKind::Continuous => def,
            };
            if c.lower().is_finite() {
                def = def.min(c.lower());
            }
            if c.upper().is_finite() {
                def = def.max(c.upper());
            }
            vars.add(def)
        })
        .collect();

    let objective = model
        .columns()
        .iter()
        .zip(&cols)
        .filter(|(c, _)| c.objective() != 0.0)
        .fold(Expression::from(0.0), |acc, (c, v)| acc + c.objective() * *v);

    let mut prob = vars.minimise(objective).using(microlp);
    if let Some(secs) = limits.time_limit_secs {
        prob = prob.with_time_limit(secs);
    }
    prob = match prob.with_mip_gap(limits.relative_gap) {
        Ok(prob) => prob,
        Err(e) => return WorkerResult::Failed(e.to_string()),
    };
    for row in model.rows() {
        let lhs = row
            .terms()
            .iter()
            .fold(Expression::from(0.0), |acc, (col, a)| {
                acc + *a * cols[col.index()]
            });
        let constraint = match row.sense() {
            Sense::Le => lhs.leq(row.rhs()),
            Sense::Eq => lhs.eq(row.rhs()),
            Sense::Ge => lhs.geq(row.rhs()),
        };
        prob.add_constraint(constraint);
    }

    match prob.solve() {
        Ok(solution) => {
            let status = match solution.status() {
                SolutionStatus::Optimal => MipStatus::Optimal,
                SolutionStatus::TimeLimit | SolutionStatus::GapLimit => MipStatus::Feasible,
            };
            WorkerResult::Solved {
                status,
                values: cols.iter().map(|v| solution.value(*v)).collect(),
            }
        }
        Err(ResolutionError::Infeasible) => WorkerResult::Infeasible,
        Err(ResolutionError::Unbounded) => WorkerResult::Unbounded,
        Err(ResolutionError::Other(message)) if message.starts_with(NO_INCUMBENT_MESSAGE) => {
            WorkerResult::TimedOut
        }
        Err(other) => WorkerResult::Failed(other.to_string()),
    }
}
