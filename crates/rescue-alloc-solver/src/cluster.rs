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

//! # Zone Aggregation
//!
//! Demand-weighted k-means over raw zone centroids. Seeding follows k-means++ with a
//! `ChaCha8Rng` derived from the run seed, assignment uses great-circle distance with ties
//! broken towards the lower cluster index, and zones are always processed in id order, so the
//! result depends only on the inputs and the seed.

use crate::err::InvalidClusterCountError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rescue_alloc_core::geo::GeoPoint;
use rescue_alloc_model::{ClusterConfig, CombinedZone, CombinedZoneId, Zone, ZoneId};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Result of aggregating raw zones.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    zones: Vec<CombinedZone>,
    assignment: BTreeMap<ZoneId, CombinedZoneId>,
    iterations: usize,
    converged: bool,
}

impl Clustering {
    /// Combined zones, indexed by their id.
    #[inline]
    pub fn zones(&self) -> &[CombinedZone] {
        &self.zones
    }

    #[inline]
    pub fn into_zones(self) -> Vec<CombinedZone> {
        self.zones
    }

    /// The combined zone a raw zone was assigned to.
    #[inline]
    pub fn combined_of(&self, zone: ZoneId) -> Option<CombinedZoneId> {
        self.assignment.get(&zone).copied()
    }

    #[inline]
    pub fn assignment(&self) -> &BTreeMap<ZoneId, CombinedZoneId> {
        &self.assignment
    }

    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[inline]
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// Clusters `zones` into at most `k` combined zones.
///
/// With `k >= zones.len()` every zone becomes its own combined zone.
///
/// # Errors
///
/// Returns [`InvalidClusterCountError`] if `k == 0`.
#[instrument(skip_all, fields(raw = zones.len(), k = k, seed = seed), err(Display))]
pub fn aggregate_zones(
    zones: &[Zone],
    k: usize,
    seed: u64,
    cfg: &ClusterConfig,
) -> Result<Clustering, InvalidClusterCountError> {
    if k == 0 {
        return Err(InvalidClusterCountError::new(k));
    }
    let mut sorted: Vec<&Zone> = zones.iter().collect();
    sorted.sort_by_key(|z| z.id());

    if k >= sorted.len() {
        debug!("Cluster count covers every zone; using identity clustering");
        let labels: Vec<usize> = (0..sorted.len()).collect();
        return Ok(materialize(&sorted, &labels, 0, true));
    }

    let total: f64 = sorted.iter().map(|z| z.demand()).sum();
    let weights: Vec<f64> = if total > 0.0 {
        sorted.iter().map(|z| z.demand()).collect()
    } else {
        vec![1.0; sorted.len()]
    };
    let points: Vec<GeoPoint> = sorted.iter().map(|z| z.position()).collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids = seed_centroids(&points, &weights, k, &mut rng);

    let mut labels = assign(&points, &centroids);
    let mut iterations = 0;
    let mut converged = false;
    while iterations < cfg.max_iterations {
        iterations += 1;
        let next = reseed_empty(
            &points,
            &labels,
            &centroids,
            recompute(&points, &weights, &labels, &centroids),
        );

        let movement = centroids
            .iter()
            .zip(&next)
            .map(|(a, b)| a.distance_nm(b))
            .fold(0.0, f64::max);
        centroids = next;
        labels = assign(&points, &centroids);
        debug!(iterations, movement, "k-means iteration");
        if movement <= cfg.tolerance_nm {
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(iterations, "k-means stopped at the iteration limit");
    }

    let clustering = materialize(&sorted, &labels, iterations, converged);
    info!(
        combined = clustering.zones.len(),
        iterations, converged, "Aggregated zones"
    );
    Ok(clustering)
}

/// Demand-weighted k-means++ seeding. Stops early when every remaining point coincides with a
/// chosen centroid.
fn seed_centroids(
    points: &[GeoPoint],
    weights: &[f64],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<GeoPoint> {
    let mut centroids = Vec::with_capacity(k);
    let Some(first) = sample_index(weights, rng) else {
        return centroids;
    };
    centroids.push(points[first]);
    let mut nearest: Vec<f64> = points.iter().map(|p| p.distance_nm(&points[first])).collect();

    while centroids.len() < k {
        let scores: Vec<f64> = nearest
            .iter()
            .zip(weights)
            .map(|(d, w)| w * d * d)
            .collect();
        let Some(idx) = sample_index(&scores, rng) else {
            break;
        };
        let c = points[idx];
        centroids.push(c);
        for (n, p) in nearest.iter_mut().zip(points) {
            *n = n.min(p.distance_nm(&c));
        }
    }
    centroids
}

fn sample_index(scores: &[f64], rng: &mut ChaCha8Rng) -> Option<usize> {
    let total: f64 = scores.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let mut target = rng.random::<f64>() * total;
    for (i, s) in scores.iter().enumerate() {
        if *s <= 0.0 {
            continue;
        }
        if target < *s {
            return Some(i);
        }
        target -= s;
    }
    scores.iter().rposition(|s| *s > 0.0)
}

fn nearest_centroid(p: &GeoPoint, centroids: &[GeoPoint]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = p.distance_nm(c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

fn assign(points: &[GeoPoint], centroids: &[GeoPoint]) -> Vec<usize> {
    points
        .par_iter()
        .map(|p| nearest_centroid(p, centroids))
        .collect()
}

fn recompute(
    points: &[GeoPoint],
    weights: &[f64],
    labels: &[usize],
    previous: &[GeoPoint],
) -> Vec<Option<GeoPoint>> {
    let mut acc = vec![(0.0f64, 0.0f64, 0.0f64, 0usize); previous.len()];
    for ((p, w), &l) in points.iter().zip(weights).zip(labels) {
        let a = &mut acc[l];
        a.0 += w * p.latitude();
        a.1 += w * p.longitude();
        a.2 += w;
        a.3 += 1;
    }
    acc.iter()
        .zip(previous)
        .map(|(&(lat, lon, w, n), prev)| match n {
            0 => None,
            _ if w > 0.0 => Some(GeoPoint::new(lat / w, lon / w)),
            _ => Some(*prev),
        })
        .collect()
}

/// Moves every empty cluster onto the point furthest from its current centroid.
fn reseed_empty(
    points: &[GeoPoint],
    labels: &[usize],
    previous: &[GeoPoint],
    mut next: Vec<Option<GeoPoint>>,
) -> Vec<GeoPoint> {
    let mut taken: Vec<usize> = Vec::new();
    for slot in 0..next.len() {
        if next[slot].is_some() {
            continue;
        }
        let far = points
            .iter()
            .enumerate()
            .filter(|(i, _)| !taken.contains(i))
            .map(|(i, p)| (i, p.distance_nm(&previous[labels[i]])))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });
        match far {
            Some((i, _)) => {
                warn!(cluster = slot, zone_index = i, "Re-seeded empty cluster");
                taken.push(i);
                next[slot] = Some(points[i]);
            }
            None => next[slot] = Some(previous[slot]),
        }
    }
    next.into_iter()
        .zip(previous)
        .map(|(n, p)| n.unwrap_or(*p))
        .collect()
}

fn materialize(
    sorted: &[&Zone],
    labels: &[usize],
    iterations: usize,
    converged: bool,
) -> Clustering {
    let mut members: BTreeMap<usize, Vec<&Zone>> = BTreeMap::new();
    for (z, &l) in sorted.iter().zip(labels) {
        members.entry(l).or_default().push(*z);
    }

    let mut zones = Vec::with_capacity(members.len());
    let mut assignment = BTreeMap::new();
    for (index, group) in members.values().enumerate() {
        let id = CombinedZoneId::new(index);
        let demand: f64 = group.iter().map(|z| z.demand()).sum();
        let position = if demand > 0.0 {
            let lat = group.iter().map(|z| z.demand() * z.position().latitude()).sum::<f64>();
            let lon = group.iter().map(|z| z.demand() * z.position().longitude()).sum::<f64>();
            GeoPoint::new(lat / demand, lon / demand)
        } else {
            let n = group.len() as f64;
            let lat = group.iter().map(|z| z.position().latitude()).sum::<f64>();
            let lon = group.iter().map(|z| z.position().longitude()).sum::<f64>();
            GeoPoint::new(lat / n, lon / n)
        };
        let representative = group
            .iter()
            .min_by(|a, b| {
                a.position()
                    .distance_nm(&position)
                    .total_cmp(&b.position().distance_nm(&position))
            })
            .copied();
        let depth = group
            .iter()
            .map(|z| z.approach_depth_m())
            .fold(f64::INFINITY, f64::min);
        let Some(representative) = representative else {
            continue;
        };
        for z in group {
            assignment.insert(z.id(), id);
        }
        zones.push(CombinedZone::new(
            id,
            position,
            demand,
            group.iter().map(|z| z.id()).collect(),
            representative.gauge(),
            depth,
        ));
    }

    Clustering {
        zones,
        assignment,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rescue_alloc_model::GaugeId;

    fn zone(id: u64, lat: f64, lon: f64, demand: f64) -> Zone {
        Zone::new(
            ZoneId::new(id),
            GeoPoint::new(lat, lon),
            demand,
            GaugeId::new(id % 3),
            10.0 + id as f64,
        )
    }

    fn random_zones(n: usize, seed: u64) -> Vec<Zone> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                zone(
                    i as u64,
                    rng.random_range(53.5..55.0),
                    rng.random_range(7.0..9.0),
                    rng.random_range(0.1..2.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_zero_k_rejected() {
        let zones = random_zones(5, 1);
        let err = aggregate_zones(&zones, 0, 0, &ClusterConfig::default()).unwrap_err();
        assert_eq!(err.requested(), 0);
    }

    #[test]
    fn test_identity_when_k_covers_all() {
        let zones = random_zones(6, 2);
        let c = aggregate_zones(&zones, 10, 0, &ClusterConfig::default()).unwrap();
        assert_eq!(c.zones().len(), 6);
        for (i, z) in c.zones().iter().enumerate() {
            assert_eq!(z.members(), &[ZoneId::new(i as u64)]);
            assert_eq!(z.position(), zones[i].position());
            assert_eq!(z.gauge(), zones[i].gauge());
        }
    }

    #[test]
    fn test_partition_invariant() {
        let zones = random_zones(200, 3);
        let c = aggregate_zones(&zones, 12, 9, &ClusterConfig::default()).unwrap();
        assert!(c.zones().len() <= 12);
        assert_eq!(c.assignment().len(), 200);

        let mut seen: Vec<ZoneId> = c
            .zones()
            .iter()
            .flat_map(|z| z.members().iter().copied())
            .collect();
        seen.sort_unstable();
        let expected: Vec<ZoneId> = zones.iter().map(|z| z.id()).collect();
        assert_eq!(seen, expected);

        for z in c.zones() {
            for m in z.members() {
                assert_eq!(c.combined_of(*m), Some(z.id()));
            }
        }
        let total: f64 = zones.iter().map(|z| z.demand()).sum();
        let combined: f64 = c.zones().iter().map(|z| z.demand()).sum();
        assert!((total - combined).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_mapping() {
        let zones = random_zones(150, 4);
        let cfg = ClusterConfig::default();
        let a = aggregate_zones(&zones, 10, 17, &cfg).unwrap();
        let b = aggregate_zones(&zones, 10, 17, &cfg).unwrap();
        assert_eq!(a, b);

        let mut reversed = zones.clone();
        reversed.reverse();
        let c = aggregate_zones(&reversed, 10, 17, &cfg).unwrap();
        assert_eq!(a.assignment(), c.assignment());
    }

    #[test]
    fn test_separated_groups_are_found() {
        let mut zones = Vec::new();
        for i in 0..10 {
            zones.push(zone(i, 54.0 + 0.001 * i as f64, 7.0, 1.0));
        }
        for i in 10..20 {
            zones.push(zone(i, 54.0 + 0.001 * i as f64, 12.0, 1.0));
        }
        let c = aggregate_zones(&zones, 2, 5, &ClusterConfig::default()).unwrap();
        assert_eq!(c.zones().len(), 2);
        assert!(c.converged());
        let west = c.combined_of(ZoneId::new(0)).unwrap();
        let east = c.combined_of(ZoneId::new(19)).unwrap();
        assert_ne!(west, east);
        for i in 0..10 {
            assert_eq!(c.combined_of(ZoneId::new(i)), Some(west));
        }
    }

    #[test]
    fn test_coincident_points_do_not_exceed_distinct_count() {
        let zones: Vec<Zone> = (0..8).map(|i| zone(i, 54.0, 8.0, 1.0)).collect();
        let c = aggregate_zones(&zones, 3, 1, &ClusterConfig::default()).unwrap();
        assert_eq!(c.zones().len(), 1);
        assert_eq!(c.zones()[0].members().len(), 8);
        assert!((c.zones()[0].approach_depth_m() - 10.0).abs() < 1e-12);
    }
}
