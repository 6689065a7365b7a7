use std::fmt;

use geo::{Area, Centroid, Point};
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::{
    config::{CrosswalkConfig, FallbackLog, FallbackPolicy},
    error::{CrosswalkError, Result},
    geom::{boundary_distance, overlap_area, point_distance},
    layer::CoarseLayer,
    types::{MediumZone, ZoneId, ZoneLevel},
};

/// How a medium zone's coarse zone was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionMethod {
    /// Exactly one coarse zone intersects the medium zone.
    Single,
    /// Largest intersection area among several candidates.
    Area,
    /// Several candidates share the largest area; the smallest id won.
    Tie,
    /// No usable candidate; nearest coarse zone by the configured fallback policy.
    Fallback,
}

impl ResolutionMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Single => "single",
            ResolutionMethod::Area => "area",
            ResolutionMethod::Tie => "tie",
            ResolutionMethod::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// The coarse zone assigned to one medium zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub medium_id: ZoneId,
    pub coarse_index: usize,
    pub coarse_id: ZoneId,
    pub method: ResolutionMethod,
    pub overlap_share: Option<f64>,     // Share of the medium zone covered by the winner
    pub candidates: usize,              // Coarse zones intersecting the medium zone
    pub fallback_distance: Option<f64>,
}

/// Per-method counts over a full resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub single: usize,
    pub area: usize,
    pub tie: usize,
    pub fallback: usize,
    pub no_intersection: usize,
    pub multiple_intersections: usize,
}

impl ResolutionSummary {
    pub fn from_resolutions(resolutions: &[Resolution]) -> Self {
        resolutions.iter().fold(Self::default(), |mut summary, r| {
            match r.method {
                ResolutionMethod::Single => summary.single += 1,
                ResolutionMethod::Area => summary.area += 1,
                ResolutionMethod::Tie => summary.tie += 1,
                ResolutionMethod::Fallback => summary.fallback += 1,
            }
            match r.candidates {
                0 => summary.no_intersection += 1,
                1 => {}
                _ => summary.multiple_intersections += 1,
            }
            summary
        })
    }

    #[inline]
    pub fn total(&self) -> usize { self.single + self.area + self.tie + self.fallback }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    area: f64,
}

/// Assigns each medium zone to exactly one coarse zone.
/// Holds only shared references, so one resolver serves every worker thread.
#[derive(Debug)]
pub struct OverlapResolver<'a> {
    coarse: &'a CoarseLayer,
    config: &'a CrosswalkConfig,
    centroids: Vec<Option<Point<f64>>>,
}

impl<'a> OverlapResolver<'a> {
    pub fn new(coarse: &'a CoarseLayer, config: &'a CrosswalkConfig) -> Result<Self> {
        if coarse.is_empty() {
            return Err(CrosswalkError::Config("coarse layer has no zones to assign to".into()));
        }
        Ok(Self { coarse, config, centroids: coarse.geoms().centroids() })
    }

    #[inline]
    fn coarse_id(&self, index: usize) -> &ZoneId { &self.coarse.zone(index).id }

    /// Resolve one medium zone.
    pub fn resolve(&self, medium: &MediumZone) -> Result<Resolution> {
        let hits = self.coarse.geoms().intersecting(&medium.geometry);
        let medium_area = medium.geometry.unsigned_area();

        if hits.is_empty() {
            return self.fallback(medium, 0);
        }

        if let [index] = hits[..] {
            let area = overlap_area(&medium.geometry, self.coarse.geoms().shape(index));
            return Ok(self.resolution(medium, index, ResolutionMethod::Single, Some(area / medium_area), 1, None));
        }

        let threshold = self.config.min_overlap.threshold(medium_area);
        let candidates: SmallVec<[Candidate; 4]> = hits.iter()
            .map(|&index| Candidate { index, area: overlap_area(&medium.geometry, self.coarse.geoms().shape(index)) })
            .filter(|c| c.area > 0.0 && c.area >= threshold)
            .collect();

        let Some(max_area) = candidates.iter().map(|c| c.area).reduce(f64::max) else {
            debug!(medium = %medium.id, candidates = hits.len(), threshold, "all overlaps below threshold");
            return self.fallback(medium, hits.len());
        };

        let tied: SmallVec<[Candidate; 4]> = candidates.iter()
            .copied()
            .filter(|c| self.config.nearly_equal(c.area, max_area))
            .collect();

        let winner = tied.iter()
            .min_by(|a, b| self.coarse_id(a.index).cmp(self.coarse_id(b.index)))
            .ok_or_else(|| CrosswalkError::AmbiguousAssignment {
                medium_id: medium.id.clone(),
                candidates: candidates.iter().map(|c| self.coarse_id(c.index).clone()).collect(),
            })?;

        let method = if tied.len() > 1 { ResolutionMethod::Tie } else { ResolutionMethod::Area };
        if method == ResolutionMethod::Tie {
            debug!(
                medium = %medium.id,
                tied = ?tied.iter().map(|c| self.coarse_id(c.index).as_str()).collect::<Vec<_>>(),
                winner = %self.coarse_id(winner.index),
                "equal overlap areas, smallest id wins"
            );
        }
        Ok(self.resolution(medium, winner.index, method, Some(winner.area / medium_area), hits.len(), None))
    }

    /// Resolve every medium zone in parallel. Result `i` belongs to `mediums[i]`.
    pub fn resolve_all(&self, mediums: &[MediumZone]) -> Result<Vec<Resolution>> {
        let run = || mediums.par_iter().map(|medium| self.resolve(medium)).collect::<Result<Vec<_>>>();

        let resolutions = match self.config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| CrosswalkError::Config(format!("failed to build thread pool: {e}")))?
                .install(run)?,
            None => run()?,
        };

        let summary = ResolutionSummary::from_resolutions(&resolutions);
        info!(
            medium_zones = summary.total(),
            no_intersection = summary.no_intersection,
            multiple_intersections = summary.multiple_intersections,
            single = summary.single,
            area = summary.area,
            tie = summary.tie,
            fallback = summary.fallback,
            "resolved medium zones"
        );
        Ok(resolutions)
    }

    /// Nearest coarse zone under the fallback policy; equal distances go to the smallest id.
    fn fallback(&self, medium: &MediumZone, candidates: usize) -> Result<Resolution> {
        let label = || format!("{} zone {}", ZoneLevel::Medium, medium.id);

        let distances: Vec<(usize, f64)> = match self.config.fallback_policy {
            FallbackPolicy::Reject => return Err(CrosswalkError::NoCandidate { medium_id: medium.id.clone() }),
            FallbackPolicy::NearestCentroid => {
                let origin = medium.geometry.centroid()
                    .ok_or_else(|| CrosswalkError::geometry(label(), "no centroid"))?;
                self.centroids.iter().enumerate()
                    .filter_map(|(i, c)| c.map(|c| (i, point_distance(origin, c))))
                    .collect()
            }
            FallbackPolicy::NearestBoundary => self.coarse.shapes().iter().enumerate()
                .map(|(i, shape)| (i, boundary_distance(&medium.geometry, shape)))
                .collect(),
        };

        let nearest = distances.iter().map(|&(_, d)| d).reduce(f64::min)
            .ok_or_else(|| CrosswalkError::geometry(label(), "no coarse zone to measure distance to"))?;
        let (index, distance) = distances.iter()
            .copied()
            .filter(|&(_, d)| self.config.nearly_equal(d, nearest))
            .min_by(|a, b| self.coarse_id(a.0).cmp(self.coarse_id(b.0)))
            .ok_or_else(|| CrosswalkError::geometry(label(), "no coarse zone to measure distance to"))?;

        let coarse = self.coarse_id(index);
        let policy = self.config.fallback_policy;
        match self.config.fallback_log {
            FallbackLog::Off => {}
            FallbackLog::Debug => debug!(medium = %medium.id, coarse = %coarse, distance, ?policy, "fallback assignment"),
            FallbackLog::Info => info!(medium = %medium.id, coarse = %coarse, distance, ?policy, "fallback assignment"),
            FallbackLog::Warn => warn!(medium = %medium.id, coarse = %coarse, distance, ?policy, "fallback assignment"),
        }

        Ok(self.resolution(medium, index, ResolutionMethod::Fallback, None, candidates, Some(distance)))
    }

    fn resolution(
        &self,
        medium: &MediumZone,
        index: usize,
        method: ResolutionMethod,
        overlap_share: Option<f64>,
        candidates: usize,
        fallback_distance: Option<f64>,
    ) -> Resolution {
        Resolution {
            medium_id: medium.id.clone(),
            coarse_index: index,
            coarse_id: self.coarse_id(index).clone(),
            method,
            overlap_share,
            candidates,
            fallback_distance,
        }
    }
}
