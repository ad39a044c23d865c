use crate::geom::{Extent, Geometry};
use geo::{Coord, LineString, Polygon};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Integer(v) => write!(f, "{v}"),
            AttrValue::Number(v) => write!(f, "{v}"),
            AttrValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Double,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A polygonal feature with ordered attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeatureRecord", into = "FeatureRecord")]
pub struct Feature {
    pub geometry: Geometry,
    pub attributes: IndexMap<String, AttrValue>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            attributes: IndexMap::new(),
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(Geometry::new(vec![polygon]))
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::of_geometry(&self.geometry)
    }
}

/// Wire form: GeoJSON-style `MultiPolygon` coordinates (`[polygon][ring][point] = [x, y]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureRecord {
    #[serde(default)]
    attributes: IndexMap<String, AttrValue>,
    coordinates: Vec<Vec<Vec<[f64; 2]>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("polygon {polygon} has no exterior ring")]
    MissingExterior { polygon: usize },
    #[error("ring {ring} of polygon {polygon} has {points} points; at least 3 are required")]
    ShortRing {
        polygon: usize,
        ring: usize,
        points: usize,
    },
    #[error("ring {ring} of polygon {polygon} contains a non-finite coordinate")]
    NonFinite { polygon: usize, ring: usize },
}

fn ring_from_points(
    points: &[[f64; 2]],
    polygon: usize,
    ring: usize,
) -> Result<LineString<f64>, FeatureError> {
    if points.iter().flatten().any(|v| !v.is_finite()) {
        return Err(FeatureError::NonFinite { polygon, ring });
    }
    // A closed ring repeats its first point.
    let distinct = match (points.first(), points.last()) {
        (Some(a), Some(b)) if points.len() > 1 && a == b => points.len() - 1,
        _ => points.len(),
    };
    if distinct < 3 {
        return Err(FeatureError::ShortRing {
            polygon,
            ring,
            points: distinct,
        });
    }
    Ok(LineString::from(
        points
            .iter()
            .map(|[x, y]| Coord { x: *x, y: *y })
            .collect::<Vec<_>>(),
    ))
}

fn ring_to_points(ring: &LineString<f64>) -> Vec<[f64; 2]> {
    ring.coords().map(|c| [c.x, c.y]).collect()
}

impl TryFrom<FeatureRecord> for Feature {
    type Error = FeatureError;

    fn try_from(record: FeatureRecord) -> Result<Self, Self::Error> {
        let mut polygons = Vec::with_capacity(record.coordinates.len());
        for (pi, rings) in record.coordinates.iter().enumerate() {
            let Some((exterior, interiors)) = rings.split_first() else {
                return Err(FeatureError::MissingExterior { polygon: pi });
            };
            let exterior = ring_from_points(exterior, pi, 0)?;
            let interiors = interiors
                .iter()
                .enumerate()
                .map(|(ri, ring)| ring_from_points(ring, pi, ri + 1))
                .collect::<Result<Vec<_>, _>>()?;
            polygons.push(Polygon::new(exterior, interiors));
        }
        Ok(Self {
            geometry: Geometry::new(polygons),
            attributes: record.attributes,
        })
    }
}

impl From<Feature> for FeatureRecord {
    fn from(feature: Feature) -> Self {
        let coordinates = feature
            .geometry
            .0
            .iter()
            .map(|poly| {
                std::iter::once(poly.exterior())
                    .chain(poly.interiors())
                    .map(ring_to_points)
                    .collect()
            })
            .collect();
        Self {
            attributes: feature.attributes,
            coordinates,
        }
    }
}
