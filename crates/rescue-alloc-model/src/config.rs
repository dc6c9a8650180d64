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

//! # Run Configuration
//!
//! One immutable [`RunConfig`] value describes an optimization run end to end. It is created
//! once (from defaults, a TOML file, or the command line) and passed by reference through every
//! pipeline stage.

use crate::{err::ConfigLoadError, water::WaterSelection};
use rescue_alloc_core::time::{TimeDelta, TimeInterval, TimePoint};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidalConfig {
    /// Accessibility windows shorter than this are discarded.
    pub min_window: TimeDelta<i64>,
    /// Two known samples further apart than this leave the region between them unknown.
    pub max_sample_gap: TimeDelta<i64>,
    pub under_keel_clearance_m: f64,
}

impl Default for TidalConfig {
    fn default() -> Self {
        Self {
            min_window: TimeDelta::new(30 * 60),
            max_sample_gap: TimeDelta::new(3 * 3600),
            under_keel_clearance_m: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Target number of combined zones (`k`).
    pub target_zones: usize,
    pub max_iterations: usize,
    /// Iteration stops once no centroid moves further than this.
    pub tolerance_nm: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            target_zones: 50,
            max_iterations: 100,
            tolerance_nm: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Merge elementary time slices with identical accessibility into one window.
    pub merge_equivalent_slices: bool,
    /// Require the round trip to a zone to fit into the craft's operational range.
    pub respect_craft_range: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            merge_equivalent_slices: true,
            respect_craft_range: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Every combined zone must be covered in every time window.
    Hard,
    /// Uncovered zone-windows are allowed at a demand- and time-weighted penalty.
    Soft { uncovered_penalty: f64 },
}

impl CoveragePolicy {
    #[inline]
    pub fn is_soft(&self) -> bool {
        matches!(self, CoveragePolicy::Soft { .. })
    }

    #[inline]
    pub fn uncovered_penalty(&self) -> Option<f64> {
        match self {
            CoveragePolicy::Hard => None,
            CoveragePolicy::Soft { uncovered_penalty } => Some(*uncovered_penalty),
        }
    }
}

/// Scalarized objective:
/// `cost_weight * deployment cost + response_weight * expected response hours
/// + uncovered_penalty * uncovered demand share`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub cost_weight: f64,
    pub response_weight: f64,
    /// Upper bound on how many `(zone, incident)` responses a single craft answers for per
    /// time window.
    pub max_responses_per_craft: Option<u32>,
    pub policy: CoveragePolicy,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            cost_weight: 1.0,
            response_weight: 1.0,
            max_responses_per_craft: None,
            policy: CoveragePolicy::Hard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverChoice {
    #[default]
    Microlp,
}

impl std::fmt::Display for SolverChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverChoice::Microlp => write!(f, "microlp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub backend: SolverChoice,
    /// Wall-clock budget for the solve. `None` waits indefinitely.
    pub time_limit_secs: Option<f64>,
    pub relative_gap: f64,
    pub threads: usize,
    pub integrality_tolerance: f64,
    pub poll_interval_ms: u64,
}

impl SolverParams {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            backend: SolverChoice::Microlp,
            time_limit_secs: Some(60.0),
            relative_gap: 1e-4,
            threads: 1,
            integrality_tolerance: 1e-6,
            poll_interval_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    pub water: WaterSelection,
    /// Analysis horizon in seconds.
    pub horizon: TimeInterval<i64>,
    pub tidal: TidalConfig,
    pub cluster: ClusterConfig,
    pub coverage: CoverageConfig,
    pub objective: ObjectiveConfig,
    pub solver: SolverParams,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            water: WaterSelection::Both,
            horizon: TimeInterval::new(TimePoint::new(0), TimePoint::new(2 * 86_400)),
            tidal: TidalConfig::default(),
            cluster: ClusterConfig::default(),
            coverage: CoverageConfig::default(),
            objective: ObjectiveConfig::default(),
            solver: SolverParams::default(),
        }
    }
}

impl RunConfig {
    /// Reads a TOML file. Missing keys take their default values.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[inline]
    pub fn with_target_zones(mut self, k: usize) -> Self {
        self.cluster.target_zones = k;
        self
    }

    #[inline]
    pub fn with_water(mut self, water: WaterSelection) -> Self {
        self.water = water;
        self
    }
}
