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

//! # Incident Types
//!
//! Demand is split by the kind of incident a zone may see. Each [`IncidentType`] carries the
//! craft types equipped to answer it, a severity weight and a per-zone probability of
//! occurrence. The demand of zone `z` for incident `i` is `weight(i) * probability(i, z)`.
//!
//! Instances without an explicit incident table get a single [`GENERAL_INCIDENT`] that every
//! craft type may answer and whose probabilities are the zone demands.

use crate::id::{CraftTypeId, IncidentTypeId, ZoneId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Id of the incident type synthesized for instances without an incident table.
pub const GENERAL_INCIDENT: IncidentTypeId = IncidentTypeId::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentType {
    id: IncidentTypeId,
    #[serde(default)]
    name: String,
    allowed_crafts: Vec<CraftTypeId>,
    weight: f64,
    /// `(zone, probability)` pairs sorted by zone. Zones not listed have probability zero.
    probabilities: Vec<(ZoneId, f64)>,
}

impl IncidentType {
    pub fn new(
        id: IncidentTypeId,
        name: impl Into<String>,
        allowed_crafts: Vec<CraftTypeId>,
        weight: f64,
        probabilities: Vec<(ZoneId, f64)>,
    ) -> Self {
        let mut incident = Self {
            id,
            name: name.into(),
            allowed_crafts,
            weight,
            probabilities,
        };
        incident.normalize();
        incident
    }

    #[inline]
    pub fn id(&self) -> IncidentTypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Craft types able to answer this incident, in ascending order.
    #[inline]
    pub fn allowed_crafts(&self) -> &[CraftTypeId] {
        &self.allowed_crafts
    }

    #[inline]
    pub fn allows(&self, craft: CraftTypeId) -> bool {
        self.allowed_crafts.binary_search(&craft).is_ok()
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn probabilities(&self) -> &[(ZoneId, f64)] {
        &self.probabilities
    }

    pub fn probability(&self, zone: ZoneId) -> f64 {
        self.probabilities
            .binary_search_by_key(&zone, |&(z, _)| z)
            .map(|i| self.probabilities[i].1)
            .unwrap_or(0.0)
    }

    /// Expected weighted demand this incident adds to `zone`.
    #[inline]
    pub fn demand(&self, zone: ZoneId) -> f64 {
        self.weight * self.probability(zone)
    }

    /// Keeps only the probabilities of zones accepted by `keep`.
    pub(crate) fn retain_zones(&mut self, mut keep: impl FnMut(ZoneId) -> bool) {
        self.probabilities.retain(|&(z, _)| keep(z));
    }

    pub(crate) fn normalize(&mut self) {
        self.allowed_crafts.sort_unstable();
        self.allowed_crafts.dedup();
        self.probabilities.sort_by_key(|&(z, _)| z);
    }
}

impl Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IncidentType(id: {}, name: {:?}, weight: {}, crafts: {}, zones: {})",
            self.id,
            self.name,
            self.weight,
            self.allowed_crafts.len(),
            self.probabilities.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_after_normalize() {
        let incident = IncidentType::new(
            IncidentTypeId::new(3),
            "towing",
            vec![CraftTypeId::new(2), CraftTypeId::new(0), CraftTypeId::new(2)],
            2.0,
            vec![(ZoneId::new(9), 0.5), (ZoneId::new(1), 0.25)],
        );
        assert_eq!(
            incident.allowed_crafts(),
            &[CraftTypeId::new(0), CraftTypeId::new(2)]
        );
        assert!(incident.allows(CraftTypeId::new(2)));
        assert!(!incident.allows(CraftTypeId::new(1)));
        assert_eq!(incident.probability(ZoneId::new(1)), 0.25);
        assert_eq!(incident.probability(ZoneId::new(5)), 0.0);
        assert_eq!(incident.demand(ZoneId::new(9)), 1.0);
    }
}
