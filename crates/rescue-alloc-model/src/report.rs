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
    combined::CombinedZone,
    config::SolverChoice,
    plan::{AllocationPlan, SolveStatus},
    water::WaterSelection,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

/// Quality of a plan measured against the full, unclustered zone set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanEvaluation {
    pub raw_zone_count: usize,
    /// Demand- and time-weighted mean travel time of the fastest based responder, over the
    /// covered part only.
    pub expected_response_hours: f64,
    pub p50_response_hours: f64,
    pub p90_response_hours: f64,
    /// Demand- and time-weighted fraction of raw zone-time without any responder.
    pub uncovered_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub water: WaterSelection,
    pub raw_zone_count: usize,
    pub combined_zone_count: usize,
    pub time_window_count: usize,
    pub coverage_fact_count: usize,
    pub solver: SolverChoice,
    pub status: SolveStatus,
    pub objective: f64,
    pub runtime_ms: u64,
    pub solve_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub run: RunSummary,
    pub zones: Vec<CombinedZone>,
    pub plan: AllocationPlan,
    pub evaluation: PlanEvaluation,
}

/// Outcome of one run of a parameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Solved { report: Box<AllocationReport> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub seed: u64,
    pub target_zones: usize,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub runs: Vec<SweepEntry>,
}

/// `results/<water>_<seed>_<zones>.json`
pub fn default_report_path(water: WaterSelection, seed: u64, zones: usize) -> PathBuf {
    PathBuf::from("results").join(format!("{water}_{seed}_{zones}.json"))
}

/// Writes `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescue_alloc_core::cost::Cost;

    fn report() -> AllocationReport {
        AllocationReport {
            run: RunSummary {
                seed: 1,
                water: WaterSelection::NorthSea,
                raw_zone_count: 10,
                combined_zone_count: 2,
                time_window_count: 1,
                coverage_fact_count: 3,
                solver: SolverChoice::Microlp,
                status: SolveStatus::Optimal,
                objective: 5.0,
                runtime_ms: 12,
                solve_ms: 4,
            },
            zones: Vec::new(),
            plan: AllocationPlan::new(SolveStatus::Optimal, 5.0, Cost::new(5), vec![], vec![]),
            evaluation: PlanEvaluation::default(),
        }
    }

    #[test]
    fn test_default_path() {
        assert_eq!(
            default_report_path(WaterSelection::Both, 4, 30),
            PathBuf::from("results/both_4_30.json")
        );
    }

    #[test]
    fn test_write_json_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        write_json(&path, &report()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: AllocationReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report());
    }

    #[test]
    fn test_sweep_entry_shape() {
        let entry = SweepEntry {
            seed: 2,
            target_zones: 8,
            outcome: SweepOutcome::Failed {
                error: "infeasible".into(),
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "infeasible");
        assert_eq!(json["seed"], 2);
    }
}
