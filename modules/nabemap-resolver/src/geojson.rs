//! GeoJSON decoding for the neighborhood dataset, and Feature encoding for
//! callers that overlay neighborhoods on a map.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use nabemap_common::file_config::PropertyKeys;
use nabemap_common::{DatasetError, Neighborhood};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

type RawRing = Vec<Vec<f64>>;

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a FeatureCollection into neighborhoods, in feature order.
///
/// Every feature must carry a Polygon or MultiPolygon geometry and a code or
/// name property. Any failure rejects the whole collection.
pub fn decode_neighborhoods(
    text: &str,
    keys: &PropertyKeys,
) -> Result<Vec<Neighborhood>, DatasetError> {
    let collection: RawCollection = serde_json::from_str(text)?;
    if collection.kind != "FeatureCollection" {
        return Err(DatasetError::Parse(serde::de::Error::custom(format!(
            "expected a FeatureCollection, got {}",
            collection.kind
        ))));
    }

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| decode_feature(index, feature, keys))
        .collect()
}

fn decode_feature(
    index: usize,
    feature: RawFeature,
    keys: &PropertyKeys,
) -> Result<Neighborhood, DatasetError> {
    let properties = feature.properties.unwrap_or_default();

    let code = first_property(&properties, &keys.code);
    let name = first_property(&properties, &keys.name);
    let (code, name) = match (code, name) {
        (Some(code), Some(name)) => (code, name),
        (Some(code), None) => (code.clone(), code),
        (None, Some(name)) => (name.clone(), name),
        (None, None) => return Err(DatasetError::MissingIdentity { index }),
    };
    let borough = first_property(&properties, &keys.borough);

    let raw = feature
        .geometry
        .ok_or(DatasetError::MissingGeometry { index })?;
    let geometry = decode_geometry(index, raw)?;

    Ok(Neighborhood {
        code,
        name,
        borough,
        geometry,
        properties,
    })
}

fn decode_geometry(index: usize, raw: RawGeometry) -> Result<MultiPolygon<f64>, DatasetError> {
    match raw.kind.as_str() {
        "Polygon" => {
            let rings: Vec<RawRing> = serde_json::from_value(raw.coordinates)?;
            Ok(MultiPolygon::new(vec![decode_polygon(index, rings)?]))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<RawRing>> = serde_json::from_value(raw.coordinates)?;
            let polygons = polygons
                .into_iter()
                .map(|rings| decode_polygon(index, rings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(DatasetError::UnsupportedGeometry {
            index,
            kind: other.to_string(),
        }),
    }
}

fn decode_polygon(index: usize, rings: Vec<RawRing>) -> Result<Polygon<f64>, DatasetError> {
    let mut rings = rings
        .into_iter()
        .map(|ring| decode_ring(index, ring))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}

fn decode_ring(index: usize, positions: RawRing) -> Result<LineString<f64>, DatasetError> {
    positions
        .into_iter()
        .map(|pos| match pos.as_slice() {
            // Elevation, if present, is ignored.
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(DatasetError::InvalidPosition { index }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

/// First non-empty value among `keys`. Numbers are stringified.
fn first_property(properties: &Map<String, Value>, keys: &[String]) -> Option<String> {
    keys.iter().find_map(|key| match properties.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a neighborhood as a GeoJSON Feature. The source property bag is
/// preserved; `code`, `name` and `borough` are always present.
pub fn neighborhood_to_feature(hood: &Neighborhood) -> Value {
    let mut properties = hood.properties.clone();
    properties.insert("code".to_string(), json!(hood.code));
    properties.insert("name".to_string(), json!(hood.name));
    properties.insert("borough".to_string(), json!(hood.borough));

    json!({
        "type": "Feature",
        "geometry": multipolygon_to_geometry(&hood.geometry),
        "properties": properties,
    })
}

pub fn features_to_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn multipolygon_to_geometry(geometry: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Vec<Vec<[f64; 2]>>> = geometry
        .iter()
        .map(|poly| {
            std::iter::once(poly.exterior())
                .chain(poly.interiors())
                .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
                .collect()
        })
        .collect();

    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}

// ===========================================================================
// Unit tests
// ===========================================================================
