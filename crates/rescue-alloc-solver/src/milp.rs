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

//! # Solver-Neutral MILP
//!
//! The engine assembles its allocation model as a [`MipModel`]: named columns with bounds,
//! integrality and an objective coefficient, plus sparse rows with a sense and a right-hand side.
//! Any [`MipBackend`] that can minimize such a model can be plugged into the
//! [`crate::adapter::SolverAdapter`] without touching the model builder.

use crate::{cancel::CancellationToken, err::SolverError};
use rescue_alloc_model::SolverParams;
use std::{fmt::Display, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(usize);

impl ColumnId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Continuous,
    Integer,
    Binary,
}

impl ColumnKind {
    #[inline]
    pub fn is_integral(self) -> bool {
        !matches!(self, ColumnKind::Continuous)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    lower: f64,
    upper: f64,
    objective: f64,
}

impl Column {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound, possibly `f64::INFINITY`.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    #[inline]
    pub fn objective(&self) -> f64 {
        self.objective
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

impl Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Eq => write!(f, "=="),
            Sense::Ge => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    name: String,
    terms: Vec<(ColumnId, f64)>,
    sense: Sense,
    rhs: f64,
}

impl Row {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn terms(&self) -> &[(ColumnId, f64)] {
        &self.terms
    }

    #[inline]
    pub fn sense(&self) -> Sense {
        self.sense
    }

    #[inline]
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Left-hand side evaluated at `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(c, a)| a * values.get(c.index()).copied().unwrap_or(0.0))
            .sum()
    }

    /// How far `values` are from satisfying the row; zero when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

/// A minimization problem over bounded columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MipModel {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl MipModel {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column. Binary columns are clamped to `[0, 1]`.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        kind: ColumnKind,
        lower: f64,
        upper: f64,
        objective: f64,
    ) -> ColumnId {
        let (lower, upper) = match kind {
            ColumnKind::Binary => (lower.max(0.0), upper.min(1.0)),
            _ => (lower, upper),
        };
        let id = ColumnId(self.columns.len());
        self.columns.push(Column {
            name: name.into(),
            kind,
            lower,
            upper,
            objective,
        });
        id
    }

    #[inline]
    pub fn add_binary(&mut self, name: impl Into<String>, objective: f64) -> ColumnId {
        self.add_column(name, ColumnKind::Binary, 0.0, 1.0, objective)
    }

    /// Adds a row. Terms with a zero coefficient are dropped.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(ColumnId, f64)>,
        sense: Sense,
        rhs: f64,
    ) -> usize {
        let terms = terms.into_iter().filter(|(_, a)| *a != 0.0).collect();
        self.rows.push(Row {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
        self.rows.len() - 1
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[inline]
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0)
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_integral(&self) -> usize {
        self.columns.iter().filter(|c| c.kind.is_integral()).count()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(values)
            .map(|(c, v)| c.objective * v)
            .sum()
    }

    /// Largest row violation at `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        self.rows
            .iter()
            .map(|r| r.violation(values))
            .fold(0.0, f64::max)
    }
}

impl Display for MipModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MipModel(columns: {}, integral: {}, rows: {})",
            self.columns.len(),
            self.num_integral(),
            self.rows.len()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipStatus {
    Optimal,
    /// Stopped early with an incumbent.
    Feasible,
    Infeasible,
    Unbounded,
    /// Stopped by the time limit or a cancellation request without an incumbent.
    Interrupted,
}

impl Display for MipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MipStatus::Optimal => "optimal",
            MipStatus::Feasible => "feasible",
            MipStatus::Infeasible => "infeasible",
            MipStatus::Unbounded => "unbounded",
            MipStatus::Interrupted => "interrupted",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MipOutcome {
    status: MipStatus,
    values: Option<Vec<f64>>,
    objective: Option<f64>,
    elapsed: Duration,
}

impl MipOutcome {
    /// An outcome carrying column values, in column order.
    pub fn with_solution(
        status: MipStatus,
        values: Vec<f64>,
        objective: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            status,
            values: Some(values),
            objective: Some(objective),
            elapsed,
        }
    }

    pub fn without_solution(status: MipStatus, elapsed: Duration) -> Self {
        Self {
            status,
            values: None,
            objective: None,
            elapsed,
        }
    }

    #[inline]
    pub fn status(&self) -> MipStatus {
        self.status
    }

    #[inline]
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    #[inline]
    pub fn into_values(self) -> Option<Vec<f64>> {
        self.values
    }

    #[inline]
    pub fn objective(&self) -> Option<f64> {
        self.objective
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// A MILP solver able to minimize a [`MipModel`].
///
/// A backend holds no state shared between calls; every `solve` is its own session.
pub trait MipBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        model: &MipModel,
        params: &SolverParams,
        cancel: &CancellationToken,
    ) -> Result<MipOutcome, SolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_bounds_are_clamped() {
        let mut m = MipModel::new();
        let x = m.add_column("x", ColumnKind::Binary, -3.0, 5.0, 1.0);
        let c = m.column(x).unwrap();
        assert_eq!((c.lower(), c.upper()), (0.0, 1.0));
        assert!(c.kind().is_integral());
    }

    #[test]
    fn test_objective_and_violation() {
        let mut m = MipModel::new();
        let x = m.add_column("x", ColumnKind::Integer, 0.0, 4.0, 2.0);
        let y = m.add_binary("y", 3.0);
        m.add_row("cap", vec![(x, 1.0), (y, 1.0)], Sense::Le, 2.0);
        m.add_row("cover", vec![(y, 1.0), (x, 0.0)], Sense::Eq, 1.0);
        assert_eq!(m.rows()[1].terms().len(), 1);

        assert_eq!(m.objective_value(&[1.0, 1.0]), 5.0);
        assert_eq!(m.max_violation(&[1.0, 1.0]), 0.0);
        assert_eq!(m.max_violation(&[3.0, 0.0]), 1.0);
        assert_eq!(m.num_integral(), 2);
    }
}
