//! Geometry checks and the three proximity predicates used by adjacency.
//!
//! Every predicate validates its inputs first and returns a [`GeometryError`]
//! instead of evaluating on malformed rings, so one bad polygon only costs one
//! test for one neighborhood.

use geo::{
    Area, BoundingRect, Buffer, Centroid, Coord, Intersects, MapCoords, MultiPolygon, Point, Rect,
    Relate,
};

use nabemap_common::{haversine_km, GeometryError, GeometryResult, Neighborhood, KM_PER_DEGREE};

/// Geometry facts computed once per neighborhood.
#[derive(Debug, Clone)]
pub struct Shape {
    pub bbox: Option<Rect<f64>>,
    pub valid: GeometryResult<()>,
    pub centroid: GeometryResult<Point<f64>>,
}

impl Shape {
    pub fn of(hood: &Neighborhood) -> Self {
        let valid = validate(&hood.code, &hood.geometry);
        let centroid = centroid_of(hood);
        Self {
            bbox: hood.geometry.bounding_rect(),
            valid,
            centroid,
        }
    }
}

/// Centroid independent of area checks. Collinear or zero-area rings still
/// have a usable centre; only a missing or non-finite one is an error.
fn centroid_of(hood: &Neighborhood) -> GeometryResult<Point<f64>> {
    let no_centroid = || GeometryError::NoCentroid {
        code: hood.code.clone(),
    };
    let point = hood.geometry.centroid().ok_or_else(no_centroid)?;
    if !point.x().is_finite() || !point.y().is_finite() {
        return Err(no_centroid());
    }
    Ok(point)
}

/// Reject geometry the topological predicates cannot be trusted with.
pub fn validate(code: &str, geometry: &MultiPolygon<f64>) -> GeometryResult<()> {
    if geometry.0.is_empty() {
        return Err(GeometryError::Empty { code: code.to_string() });
    }

    for polygon in geometry {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            if ring.0.len() < 4 {
                return Err(GeometryError::DegenerateRing {
                    code: code.to_string(),
                    len: ring.0.len(),
                });
            }
            if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(GeometryError::NonFinite { code: code.to_string() });
            }
        }
    }

    if geometry.unsigned_area() <= 0.0 {
        return Err(GeometryError::ZeroArea { code: code.to_string() });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Local kilometre plane
// ---------------------------------------------------------------------------

/// Equirectangular projection centred on an origin, in kilometres.
///
/// Accurate to well under a percent across a city; buffering in this plane
/// lets the radius be expressed in kilometres rather than degrees.
#[derive(Debug, Clone, Copy)]
pub struct LocalPlane {
    origin: Point<f64>,
    km_per_lng: f64,
}

impl LocalPlane {
    pub fn centered_on(origin: Point<f64>) -> Self {
        Self {
            origin,
            km_per_lng: KM_PER_DEGREE * origin.y().to_radians().cos(),
        }
    }

    pub fn project(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c| Coord {
            x: (c.x - self.origin.x()) * self.km_per_lng,
            y: (c.y - self.origin.y()) * KM_PER_DEGREE,
        })
    }
}

/// A subject neighborhood expanded outward by a radius, in a plane centred on
/// the subject.
pub struct SubjectBuffer {
    plane: LocalPlane,
    buffer: MultiPolygon<f64>,
}

impl SubjectBuffer {
    pub fn build(subject: &Neighborhood, shape: &Shape, radius_km: f64) -> GeometryResult<Self> {
        shape.valid.clone()?;
        let origin = shape.centroid.clone()?;
        let plane = LocalPlane::centered_on(origin);
        let buffer = plane.project(&subject.geometry).buffer(radius_km);
        if buffer.0.is_empty() {
            return Err(GeometryError::BufferCollapsed {
                code: subject.code.clone(),
            });
        }
        Ok(Self { plane, buffer })
    }

    /// True if the candidate intersects the buffer.
    pub fn reaches(&self, candidate: &Neighborhood, shape: &Shape) -> GeometryResult<bool> {
        shape.valid.clone()?;
        Ok(self.buffer.intersects(&self.plane.project(&candidate.geometry)))
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// DE-9IM touches: boundaries meet, interiors do not.
pub fn touches(
    subject: &Neighborhood,
    subject_shape: &Shape,
    candidate: &Neighborhood,
    candidate_shape: &Shape,
) -> GeometryResult<bool> {
    subject_shape.valid.clone()?;
    candidate_shape.valid.clone()?;

    let bboxes_meet = match (subject_shape.bbox, candidate_shape.bbox) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => false,
    };
    if !bboxes_meet {
        return Ok(false);
    }
    Ok(subject.geometry.relate(&candidate.geometry).is_touches())
}

/// Great-circle distance between the two centroids, in kilometres.
pub fn centroid_distance_km(subject_shape: &Shape, candidate_shape: &Shape) -> GeometryResult<f64> {
    let a = subject_shape.centroid.clone()?;
    let b = candidate_shape.centroid.clone()?;
    Ok(haversine_km(a.y(), a.x(), b.y(), b.x()))
}

// ===========================================================================
// Unit tests
// ===========================================================================
