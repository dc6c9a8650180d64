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

//! Water body classification for the German coastline.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Longitude (degrees east) separating the North Sea (west) from the Baltic Sea (east).
pub const NORTH_SEA_BALTIC_CUTOFF_LON: f64 = 9.5721;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaterBody {
    NorthSea,
    BalticSea,
}

impl WaterBody {
    /// Classifies a position by its longitude.
    ///
    /// ```
    /// use rescue_alloc_model::water::WaterBody;
    /// assert_eq!(WaterBody::classify(8.0), WaterBody::NorthSea);
    /// assert_eq!(WaterBody::classify(11.0), WaterBody::BalticSea);
    /// ```
    #[inline]
    pub fn classify(longitude: f64) -> Self {
        if longitude < NORTH_SEA_BALTIC_CUTOFF_LON {
            WaterBody::NorthSea
        } else {
            WaterBody::BalticSea
        }
    }
}

impl Display for WaterBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaterBody::NorthSea => write!(f, "north-sea"),
            WaterBody::BalticSea => write!(f, "baltic-sea"),
        }
    }
}

/// Which water bodies an optimization run considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaterSelection {
    NorthSea,
    BalticSea,
    #[default]
    Both,
}

impl WaterSelection {
    #[inline]
    pub fn includes(&self, water: WaterBody) -> bool {
        match self {
            WaterSelection::NorthSea => water == WaterBody::NorthSea,
            WaterSelection::BalticSea => water == WaterBody::BalticSea,
            WaterSelection::Both => true,
        }
    }
}

impl Display for WaterSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaterSelection::NorthSea => write!(f, "north-sea"),
            WaterSelection::BalticSea => write!(f, "baltic-sea"),
            WaterSelection::Both => write!(f, "both"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_is_baltic() {
        assert_eq!(
            WaterBody::classify(NORTH_SEA_BALTIC_CUTOFF_LON),
            WaterBody::BalticSea
        );
        assert_eq!(WaterBody::classify(9.57), WaterBody::NorthSea);
    }

    #[test]
    fn test_selection_filter() {
        assert!(WaterSelection::Both.includes(WaterBody::NorthSea));
        assert!(WaterSelection::Both.includes(WaterBody::BalticSea));
        assert!(!WaterSelection::NorthSea.includes(WaterBody::BalticSea));
        assert!(WaterSelection::BalticSea.includes(WaterBody::BalticSea));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&WaterSelection::BalticSea).unwrap();
        assert_eq!(json, "\"baltic-sea\"");
    }
}
