use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::Rect;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use tracing::warn;

use nabemap_common::file_config::PropertyKeys;
use nabemap_common::{DatasetError, GeometryError, Neighborhood};

use crate::geojson::decode_neighborhoods;
use crate::geometry::Shape;

type IndexedRect = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// In-memory snapshot of every neighborhood, in dataset order.
///
/// Built once, never mutated. Bounding rectangles live in an R-tree so that
/// containment only runs the exact test on a handful of candidates.
pub struct NeighborhoodSet {
    neighborhoods: Vec<Arc<Neighborhood>>,
    shapes: Vec<Shape>,
    by_code: HashMap<String, usize>,
    index: RTree<IndexedRect>,
    pub loaded_at: DateTime<Utc>,
}

/// Bounding rectangle fit for the R-tree. A non-finite coordinate would poison
/// the whole index, so such shapes stay out of it.
fn indexable(shape: &Shape) -> Option<Rect<f64>> {
    if matches!(shape.valid, Err(GeometryError::NonFinite { .. })) {
        return None;
    }
    let bbox = shape.bbox?;
    let finite = [bbox.min(), bbox.max()]
        .iter()
        .all(|c| c.x.is_finite() && c.y.is_finite());
    finite.then_some(bbox)
}

impl NeighborhoodSet {
    /// Build from already-decoded neighborhoods. Rejects an empty list and
    /// duplicate codes.
    pub fn new(neighborhoods: Vec<Neighborhood>) -> Result<Self, DatasetError> {
        if neighborhoods.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut by_code = HashMap::with_capacity(neighborhoods.len());
        for (i, hood) in neighborhoods.iter().enumerate() {
            if by_code.insert(hood.code.clone(), i).is_some() {
                return Err(DatasetError::DuplicateCode(hood.code.clone()));
            }
        }

        let shapes: Vec<Shape> = neighborhoods.iter().map(Shape::of).collect();
        for (hood, shape) in neighborhoods.iter().zip(&shapes) {
            if let Err(e) = &shape.valid {
                warn!(code = hood.code.as_str(), error = %e, "Malformed geometry; affected tests will skip it");
            }
        }

        let rects: Vec<IndexedRect> = shapes
            .iter()
            .enumerate()
            .filter_map(|(i, shape)| {
                let bbox = indexable(shape)?;
                Some(GeomWithData::new(
                    Rectangle::from_corners(
                        [bbox.min().x, bbox.min().y],
                        [bbox.max().x, bbox.max().y],
                    ),
                    i,
                ))
            })
            .collect();

        Ok(Self {
            neighborhoods: neighborhoods.into_iter().map(Arc::new).collect(),
            shapes,
            by_code,
            index: RTree::bulk_load(rects),
            loaded_at: Utc::now(),
        })
    }

    /// Decode a GeoJSON FeatureCollection and build the set.
    pub fn from_geojson(text: &str, keys: &PropertyKeys) -> Result<Self, DatasetError> {
        Self::new(decode_neighborhoods(text, keys)?)
    }

    pub fn len(&self) -> usize {
        self.neighborhoods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighborhoods.is_empty()
    }

    /// All neighborhoods in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Neighborhood>> {
        self.neighborhoods.iter()
    }

    pub fn get(&self, code: &str) -> Option<&Arc<Neighborhood>> {
        self.by_code.get(code).map(|&i| &self.neighborhoods[i])
    }

    /// Case-insensitive display-name lookup; first match in dataset order.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Neighborhood>> {
        let wanted = name.trim().to_lowercase();
        self.neighborhoods
            .iter()
            .find(|h| h.name.to_lowercase() == wanted)
    }

    /// Neighborhoods whose borough tag matches, case-insensitively.
    pub fn in_borough<'a>(&'a self, borough: &'a str) -> impl Iterator<Item = &'a Arc<Neighborhood>> {
        self.neighborhoods.iter().filter(move |h| {
            h.borough
                .as_deref()
                .is_some_and(|b| b.eq_ignore_ascii_case(borough.trim()))
        })
    }

    /// Combined bounding rectangle of the whole dataset.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes
            .iter()
            .filter_map(indexable)
            .reduce(|a, b| {
                Rect::new(
                    geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
    }

    /// Indices whose bounding rectangle covers the point, in dataset order.
    pub(crate) fn candidates_at(&self, lng: f64, lat: f64) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .index
            .locate_all_at_point(&[lng, lat])
            .map(|r| r.data)
            .collect();
        hits.sort_unstable();
        hits
    }

    pub(crate) fn entry(&self, i: usize) -> (&Arc<Neighborhood>, &Shape) {
        (&self.neighborhoods[i], &self.shapes[i])
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Arc<Neighborhood>, &Shape)> {
        self.neighborhoods.iter().zip(&self.shapes)
    }

    /// True if `hood` is this set's own record for its code.
    pub(crate) fn owns(&self, hood: &Neighborhood) -> bool {
        self.get(&hood.code)
            .is_some_and(|own| std::ptr::eq(own.as_ref(), hood) || own.as_ref() == hood)
    }
}

impl std::fmt::Debug for NeighborhoodSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborhoodSet")
            .field("len", &self.len())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, BoundingRect, MultiPolygon};

    fn square(code: &str, borough: &str, x0: f64, y0: f64) -> Neighborhood {
        Neighborhood::new(
            code,
            format!("{code} Name"),
            Some(borough.to_string()),
            MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + 1.0, y: y0),
                (x: x0 + 1.0, y: y0 + 1.0),
                (x: x0, y: y0 + 1.0),
                (x: x0, y: y0),
            ]]),
        )
    }

    fn sample() -> NeighborhoodSet {
        NeighborhoodSet::new(vec![
            square("MN01", "Manhattan", 0.0, 0.0),
            square("MN02", "Manhattan", 1.0, 0.0),
            square("BK01", "Brooklyn", 0.0, -1.0),
        ])
        .unwrap()
    }

    #[test]
    fn empty_list_is_rejected() {
        let err = NeighborhoodSet::new(vec![]).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let err = NeighborhoodSet::new(vec![
            square("MN01", "Manhattan", 0.0, 0.0),
            square("MN01", "Manhattan", 1.0, 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateCode(code) if code == "MN01"));
    }

    #[test]
    fn lookups_by_code_name_and_borough() {
        let set = sample();
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
        assert_eq!(set.get("MN02").unwrap().code, "MN02");
        assert!(set.get("QN01").is_none());
        assert_eq!(set.find_by_name("  bk01 name ").unwrap().code, "BK01");
        assert_eq!(set.in_borough("manhattan").count(), 2);
        assert_eq!(set.in_borough("Queens").count(), 0);
    }

    #[test]
    fn iteration_keeps_dataset_order() {
        let set = sample();
        let codes: Vec<&str> = set.iter().map(|h| h.code.as_str()).collect();
        assert_eq!(codes, vec!["MN01", "MN02", "BK01"]);
    }

    #[test]
    fn bounds_cover_every_neighborhood() {
        let set = sample();
        let bounds = set.bounds().unwrap();
        assert_eq!(bounds.min().x, 0.0);
        assert_eq!(bounds.min().y, -1.0);
        assert_eq!(bounds.max().x, 2.0);
        assert_eq!(bounds.max().y, 1.0);
        for hood in set.iter() {
            let b = hood.geometry.bounding_rect().unwrap();
            assert!(b.min().x >= bounds.min().x && b.max().x <= bounds.max().x);
        }
    }

    #[test]
    fn candidates_on_shared_edge_come_back_in_dataset_order() {
        let set = sample();
        assert_eq!(set.candidates_at(1.0, 0.5), vec![0, 1]);
        assert_eq!(set.candidates_at(0.5, 0.0), vec![0, 2]);
        assert!(set.candidates_at(50.0, 50.0).is_empty());
    }

    #[test]
    fn non_finite_geometry_stays_out_of_the_index() {
        let nan = Neighborhood::new(
            "NAN",
            "NaN",
            None,
            MultiPolygon::new(vec![polygon![
                (x: 0.2, y: 0.2), (x: f64::NAN, y: 0.2), (x: 0.8, y: 0.8), (x: 0.2, y: 0.2),
            ]]),
        );
        let set = NeighborhoodSet::new(vec![square("MN01", "Manhattan", 0.0, 0.0), nan]).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.candidates_at(0.5, 0.5), vec![0]);
        let bounds = set.bounds().unwrap();
        assert_eq!((bounds.min().x, bounds.max().x), (0.0, 1.0));
    }

    #[test]
    fn owns_recognises_its_own_records() {
        let set = sample();
        let own = set.get("MN01").unwrap().clone();
        assert!(set.owns(&own));

        let impostor = square("MN01", "Manhattan", 5.0, 5.0);
        assert!(!set.owns(&impostor));
    }
}
