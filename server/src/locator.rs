//! Nearest-resource resolution.
//!
//! Indoor resources have no position of their own, so they are reached through
//! the nearest entrance of their building. Outdoor resources are reached
//! directly at their coordinates. The resolver is a pure scan over candidates
//! the store has already loaded for one category.

use crate::geo::Coordinates;
use crate::models::{Building, Entrance, Resource};

/// A resource with everything needed to measure a distance to it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub resource: Resource,
    pub placement: Placement,
}

#[derive(Debug, Clone)]
pub enum Placement {
    Indoor {
        building: Building,
        entrances: Vec<Entrance>,
    },
    Outdoor(Coordinates),
}

impl Candidate {
    pub fn building(&self) -> Option<&Building> {
        match &self.placement {
            Placement::Indoor { building, .. } => Some(building),
            Placement::Outdoor(_) => None,
        }
    }

    /// Points a user can walk to for this candidate. Empty when the building
    /// has no registered entrances.
    pub fn anchors(&self) -> Vec<Coordinates> {
        match &self.placement {
            Placement::Indoor { entrances, .. } => {
                entrances.iter().map(Entrance::coordinates).collect()
            }
            Placement::Outdoor(point) => vec![*point],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Closest<'a> {
    pub candidate: &'a Candidate,
    /// The entrance (indoor) or the resource itself (outdoor).
    pub location: Coordinates,
    pub distance_km: f64,
}

/// Returns the candidate whose nearest anchor is closest to `user`, or `None`
/// when no candidate has a reachable anchor.
///
/// Only a strictly smaller distance replaces the running best, so the first
/// candidate seen wins an exact tie and NaN distances never win.
pub fn find_closest(user: Coordinates, candidates: &[Candidate]) -> Option<Closest<'_>> {
    let start: Option<Closest<'_>> = None;
    candidates
        .iter()
        .flat_map(|candidate| {
            candidate
                .anchors()
                .into_iter()
                .map(move |location| (candidate, location))
        })
        .fold(start, |best, (candidate, location)| {
            let distance_km = user.distance_km(&location);
            let best_km = best.map_or(f64::INFINITY, |b| b.distance_km);
            if distance_km < best_km {
                Some(Closest {
                    candidate,
                    location,
                    distance_km,
                })
            } else {
                best
            }
        })
}
