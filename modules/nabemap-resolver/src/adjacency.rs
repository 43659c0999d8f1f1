//! Adjacency resolution.
//!
//! A candidate is adjacent to the subject if any of three tests holds,
//! evaluated in order and short-circuiting on the first match:
//!
//! 1. boundaries touch,
//! 2. the candidate intersects the subject buffered outward by the radius,
//! 3. the two centroids are within the radius of each other.
//!
//! Touch alone misses neighborhoods split by a street or an administrative
//! gap; centroid distance alone misses large, irregular neighbors.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use nabemap_common::{GeometryError, Neighborhood, ResolverError, ResolverResult};

use crate::geometry::{centroid_distance_km, touches, Shape, SubjectBuffer};
use crate::set::NeighborhoodSet;

/// Which test admitted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyReason {
    Touches,
    Buffer,
    Centroid,
}

#[derive(Debug, Clone)]
pub struct AdjacentMatch {
    pub neighborhood: Arc<Neighborhood>,
    pub reason: AdjacencyReason,
}

/// Every neighborhood in `set` near `subject`, excluding the subject itself.
///
/// Results are deduplicated by code and come back in dataset order, but
/// callers should treat them as a set. A malformed geometry only disables the
/// affected test for that neighborhood; the query still completes.
pub fn find_adjacent(
    set: &NeighborhoodSet,
    subject: Option<&Neighborhood>,
    radius_km: f64,
) -> ResolverResult<Vec<AdjacentMatch>> {
    let subject = subject.ok_or_else(|| {
        ResolverError::InvalidInput("adjacency requires a resolved subject neighborhood".into())
    })?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(ResolverError::InvalidInput(format!(
            "radius_km must be a non-negative number, got {radius_km}"
        )));
    }

    let subject_shape = Shape::of(subject);
    if let Err(e) = &subject_shape.valid {
        warn!(code = subject.code.as_str(), error = %e, "Subject geometry is malformed; no proximity test can run");
        return Ok(Vec::new());
    }

    let buffer = match SubjectBuffer::build(subject, &subject_shape, radius_km) {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            warn!(code = subject.code.as_str(), test = "buffer", error = %e, "Skipping buffer test");
            None
        }
    };

    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(subject.code.as_str());

    let mut matches = Vec::new();
    for (candidate, shape) in set.entries() {
        if seen.contains(candidate.code.as_str()) {
            continue;
        }
        let reason = evaluate(subject, &subject_shape, buffer.as_ref(), candidate, shape, radius_km);
        if let Some(reason) = reason {
            seen.insert(candidate.code.as_str());
            matches.push(AdjacentMatch {
                neighborhood: Arc::clone(candidate),
                reason,
            });
        }
    }

    Ok(matches)
}

fn evaluate(
    subject: &Neighborhood,
    subject_shape: &Shape,
    buffer: Option<&SubjectBuffer>,
    candidate: &Neighborhood,
    shape: &Shape,
    radius_km: f64,
) -> Option<AdjacencyReason> {
    match touches(subject, subject_shape, candidate, shape) {
        Ok(true) => return Some(AdjacencyReason::Touches),
        Ok(false) => {}
        Err(e) => log_skip("touches", candidate, &e),
    }

    if let Some(buffer) = buffer {
        match buffer.reaches(candidate, shape) {
            Ok(true) => return Some(AdjacencyReason::Buffer),
            Ok(false) => {}
            Err(e) => log_skip("buffer", candidate, &e),
        }
    }

    match centroid_distance_km(subject_shape, shape) {
        Ok(dist) if dist <= radius_km => Some(AdjacencyReason::Centroid),
        Ok(_) => None,
        Err(e) => {
            log_skip("centroid", candidate, &e);
            None
        }
    }
}

fn log_skip(test: &str, candidate: &Neighborhood, error: &GeometryError) {
    warn!(code = candidate.code.as_str(), test, error = %error, "Skipping adjacency test");
}

// ===========================================================================
// Unit tests
// ===========================================================================
