//! Containment and adjacency behaviour against small hand-built datasets.
//!
//! `fixtures/nyc_sample.geojson` holds simplified rectangles around Midtown,
//! Murray Hill, Chelsea, Long Island City and Downtown Brooklyn.

use std::collections::HashSet;

use geo::InteriorPoint;
use nabemap_common::file_config::PropertyKeys;
use nabemap_common::DEFAULT_RADIUS_KM;
use nabemap_resolver::{find_adjacent, find_containing, AdjacencyReason, NeighborhoodSet};
use serde_json::json;

fn nyc_sample() -> NeighborhoodSet {
    let text = include_str!("fixtures/nyc_sample.geojson");
    NeighborhoodSet::from_geojson(text, &PropertyKeys::default()).expect("fixture should load")
}

fn square_feature(code: &str, x0: f64, x1: f64) -> serde_json::Value {
    json!({
        "type": "Feature",
        "properties": { "code": code, "name": code },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[x0, 0.0], [x1, 0.0], [x1, 1.0], [x0, 1.0], [x0, 0.0]]]
        }
    })
}

fn squares(features: Vec<serde_json::Value>) -> NeighborhoodSet {
    let text = json!({ "type": "FeatureCollection", "features": features }).to_string();
    NeighborhoodSet::from_geojson(&text, &PropertyKeys::default()).unwrap()
}

fn adjacent_codes(set: &NeighborhoodSet, code: &str, radius_km: f64) -> HashSet<String> {
    let subject = set.get(code).unwrap();
    find_adjacent(set, Some(subject.as_ref()), radius_km)
        .unwrap()
        .into_iter()
        .map(|m| m.neighborhood.code.clone())
        .collect()
}

// =========================================================================
// Containment
// =========================================================================

#[test]
fn interior_points_resolve_to_their_own_neighborhood() {
    let set = nyc_sample();
    for hood in set.iter() {
        let p = hood.geometry.interior_point().unwrap();
        let found = find_containing(&set, p.x(), p.y()).unwrap();
        assert_eq!(
            found.map(|h| h.code.clone()).as_deref(),
            Some(hood.code.as_str()),
            "interior point of {} resolved elsewhere",
            hood.code
        );
    }
}

#[test]
fn times_square_is_in_midtown() {
    let set = nyc_sample();
    let found = find_containing(&set, -73.9855, 40.758).unwrap().unwrap();
    assert_eq!(found.name, "Midtown-Times Square");
    assert_eq!(found.borough.as_deref(), Some("Manhattan"));
    assert_eq!(found.properties["borocode"], 1);
}

#[test]
fn second_part_of_multipolygon_resolves() {
    let set = nyc_sample();
    let found = find_containing(&set, -73.970, 40.692).unwrap().unwrap();
    assert_eq!(found.code, "BK0202");
}

#[test]
fn mid_ocean_resolves_to_nothing() {
    let set = nyc_sample();
    assert!(find_containing(&set, -30.0, 35.0).unwrap().is_none());
    // East River gap between Murray Hill and Long Island City
    assert!(find_containing(&set, -73.9625, 40.748).unwrap().is_none());
}

#[test]
fn shared_boundary_point_is_deterministic() {
    let set = nyc_sample();
    let first = find_containing(&set, -73.995, 40.755).unwrap().unwrap().code.clone();
    assert_eq!(first, "MN0501", "boundary point goes to the first in dataset order");
    for _ in 0..20 {
        let again = find_containing(&set, -73.995, 40.755).unwrap().unwrap();
        assert_eq!(again.code, first);
    }
}

#[test]
fn unit_square_scenario_resolves_point_and_touching_neighbor() {
    let set = squares(vec![square_feature("A", 0.0, 1.0), square_feature("B", 1.0, 2.0)]);

    assert_eq!(find_containing(&set, 0.5, 0.5).unwrap().unwrap().code, "A");

    let a = set.get("A").unwrap();
    let found = find_adjacent(&set, Some(a.as_ref()), DEFAULT_RADIUS_KM).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].neighborhood.code, "B");
    assert_eq!(found[0].reason, AdjacencyReason::Touches);
}

#[test]
fn unit_square_shared_edge_resolves_consistently() {
    let set = squares(vec![square_feature("A", 0.0, 1.0), square_feature("B", 1.0, 2.0)]);
    let results: HashSet<String> = (0..10)
        .map(|_| find_containing(&set, 1.0, 0.5).unwrap().unwrap().code.clone())
        .collect();
    assert_eq!(results.len(), 1);
}

// =========================================================================
// Adjacency
// =========================================================================

#[test]
fn gap_scenario_depends_on_radius() {
    // Half a degree of longitude at the equator is ~55.7 km.
    let set = squares(vec![square_feature("A", 0.0, 1.0), square_feature("B", 1.5, 2.5)]);

    let wide = adjacent_codes(&set, "A", 60.0);
    assert!(wide.contains("B"));

    let narrow = adjacent_codes(&set, "A", 40.0);
    assert!(narrow.is_empty());
}

#[test]
fn midtown_neighbors_at_default_radius() {
    let set = nyc_sample();
    let found = adjacent_codes(&set, "MN0501", DEFAULT_RADIUS_KM);
    let expected: HashSet<String> = ["MN0502", "MN0601", "QN0151"].map(String::from).into();
    assert_eq!(found, expected);
}

#[test]
fn midtown_neighbors_at_one_km_drop_queens() {
    let set = nyc_sample();
    let found = adjacent_codes(&set, "MN0501", 1.0);
    let expected: HashSet<String> = ["MN0502", "MN0601"].map(String::from).into();
    assert_eq!(found, expected);
}

#[test]
fn east_river_is_bridged_by_buffer() {
    let set = nyc_sample();
    let murray_hill = set.get("MN0502").unwrap();
    let found = find_adjacent(&set, Some(murray_hill.as_ref()), DEFAULT_RADIUS_KM).unwrap();

    let lic = found
        .iter()
        .find(|m| m.neighborhood.code == "QN0151")
        .expect("Long Island City should be adjacent across the river");
    assert_eq!(lic.reason, AdjacencyReason::Buffer);

    let narrow = adjacent_codes(&set, "MN0502", 0.2);
    assert!(!narrow.contains("QN0151"));
}

#[test]
fn brooklyn_is_not_adjacent_to_midtown() {
    let set = nyc_sample();
    assert!(!adjacent_codes(&set, "MN0501", DEFAULT_RADIUS_KM).contains("BK0202"));
    assert!(adjacent_codes(&set, "BK0202", DEFAULT_RADIUS_KM).is_empty());
}

#[test]
fn adjacency_never_includes_subject() {
    let set = nyc_sample();
    for hood in set.iter() {
        for radius in [0.1, DEFAULT_RADIUS_KM, 25.0] {
            assert!(!adjacent_codes(&set, &hood.code, radius).contains(&hood.code));
        }
    }
}

#[test]
fn touching_is_symmetric() {
    let set = nyc_sample();
    for hood in set.iter() {
        let found = find_adjacent(&set, Some(hood.as_ref()), DEFAULT_RADIUS_KM).unwrap();
        for m in found.iter().filter(|m| m.reason == AdjacencyReason::Touches) {
            let back = adjacent_codes(&set, &m.neighborhood.code, DEFAULT_RADIUS_KM);
            assert!(
                back.contains(&hood.code),
                "{} touches {} but not the other way round",
                hood.code,
                m.neighborhood.code
            );
        }
    }
}

#[test]
fn growing_radius_never_loses_neighbors() {
    let set = nyc_sample();
    let radii = [0.1, 0.5, 1.0, DEFAULT_RADIUS_KM, 3.0, 10.0];
    for hood in set.iter() {
        let mut previous: HashSet<String> = HashSet::new();
        for radius in radii {
            let current = adjacent_codes(&set, &hood.code, radius);
            assert!(
                previous.is_subset(&current),
                "{} lost neighbors growing to {radius} km: {previous:?} vs {current:?}",
                hood.code
            );
            previous = current;
        }
    }
}

#[test]
fn results_are_deduplicated_by_code() {
    let set = nyc_sample();
    for hood in set.iter() {
        let found = find_adjacent(&set, Some(hood.as_ref()), 50.0).unwrap();
        let unique: HashSet<&str> = found.iter().map(|m| m.neighborhood.code.as_str()).collect();
        assert_eq!(unique.len(), found.len());
        assert_eq!(found.len(), set.len() - 1);
    }
}

#[test]
fn malformed_neighbor_does_not_abort_query() {
    let set = squares(vec![
        square_feature("A", 0.0, 1.0),
        json!({
            "type": "Feature",
            "properties": { "code": "SLIVER", "name": "Sliver" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[1.0, 0.5], [1.5, 0.5], [2.0, 0.5], [1.0, 0.5]]]
            }
        }),
        square_feature("B", 1.0, 2.0),
    ]);

    let found = adjacent_codes(&set, "A", 100.0);
    assert!(found.contains("B"));
    assert!(!found.contains("SLIVER"));
}
