use std::sync::Arc;

use geo::{Intersects, Point};

use nabemap_common::{GeoPoint, Neighborhood, ResolverResult};

use crate::set::NeighborhoodSet;

/// The first neighborhood, in dataset order, whose polygon contains the point.
///
/// Boundaries are inclusive: a point on an exterior ring or on a hole's ring
/// is contained, a point strictly inside a hole is not. A point on an edge
/// shared by two neighborhoods therefore always resolves to whichever comes
/// first in the dataset.
///
/// `Ok(None)` is a normal outcome (water, outside the city).
pub fn find_containing(
    set: &NeighborhoodSet,
    lng: f64,
    lat: f64,
) -> ResolverResult<Option<Arc<Neighborhood>>> {
    let point: Point<f64> = GeoPoint::new(lng, lat)?.into();

    let found = set
        .candidates_at(point.x(), point.y())
        .into_iter()
        .map(|i| set.entry(i).0)
        .find(|hood| hood.geometry.intersects(&point))
        .cloned();

    Ok(found)
}
