//! Keyed vector-map datasets.
//!
//! Admin boundaries, rivers and lakes arrive as GeoJSON. They are parsed
//! once into [`FeatureCollection`]s of geographic [`Shape`]s and handed to
//! the layer builders through a [`DatasetSource`]:
//!
//! - [`DirectorySource`] reads `<root>/<id>.geojson` from a local cache
//! - [`MemorySource`] holds collections built in code
//!
//! Points are ignored and GeometryCollections are flattened; nothing
//! downstream draws a point.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use geo::{Coord, Intersects, LineString, MultiLineString, MultiPolygon, Polygon, Rect};
use geojson::{GeoJson, Position, Value};
use tracing::{debug, warn};

use crate::error::{Result, TrailfabError};
use crate::geometry::Shape;

/// One map feature: geometry plus the identifying properties we use.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `NAME` property
    pub name: Option<String>,
    /// `ADMIN` property
    pub admin: Option<String>,
    /// Geographic (lon, lat) geometry
    pub shape: Shape,
}

impl Feature {
    pub fn new(name: Option<&str>, shape: Shape) -> Self {
        Self {
            name: name.map(str::to_string),
            admin: None,
            shape,
        }
    }

    pub fn with_admin(mut self, admin: &str) -> Self {
        self.admin = Some(admin.to_string());
        self
    }

    /// Whether `NAME` or `ADMIN` equals `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name) || self.admin.as_deref() == Some(name)
    }
}

/// A parsed dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parse GeoJSON text (a FeatureCollection, a single Feature, or a bare
    /// Geometry).
    pub fn from_geojson_str(id: &str, content: &str) -> Result<Self> {
        let geojson: GeoJson = content.parse()?;
        let raw = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(g) => vec![geojson::Feature {
                bbox: None,
                geometry: Some(g),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        let mut features = Vec::with_capacity(raw.len());
        for (index, feature) in raw.into_iter().enumerate() {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            let shape = match value_to_shape(&geometry.value) {
                Ok(shape) => shape,
                Err(reason) => {
                    warn!(dataset = id, index, "Skipping malformed feature: {}", reason);
                    continue;
                }
            };
            features.push(Feature {
                name: string_property(&feature, "NAME"),
                admin: string_property(&feature, "ADMIN"),
                shape,
            });
        }

        debug!(dataset = id, features = features.len(), "Parsed dataset");
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every line in the collection, in feature order.
    pub fn lines(&self) -> Vec<LineString<f64>> {
        self.features.iter().flat_map(|f| f.shape.clone().into_lines()).collect()
    }

    /// Every polygon in the collection, in feature order.
    pub fn polygons(&self) -> Vec<Polygon<f64>> {
        self.features.iter().flat_map(|f| f.shape.clone().into_polygons()).collect()
    }
}

fn string_property(feature: &geojson::Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

// ============================================================================
// GEOJSON -> SHAPE
// ============================================================================

fn position(p: &Position) -> std::result::Result<Coord<f64>, String> {
    match p.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        _ => Err(format!("bad position {:?}", p)),
    }
}

fn line(positions: &[Position]) -> std::result::Result<LineString<f64>, String> {
    positions.iter().map(position).collect::<std::result::Result<Vec<_>, _>>().map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> std::result::Result<Option<Polygon<f64>>, String> {
    let Some((exterior, holes)) = rings.split_first() else {
        return Ok(None);
    };
    let exterior = line(exterior)?;
    let holes = holes.iter().map(|r| line(r)).collect::<std::result::Result<Vec<_>, _>>()?;
    // Polygon::new closes open rings
    Ok(Some(Polygon::new(exterior, holes)))
}

/// Convert a GeoJSON geometry to a [`Shape`].
///
/// Points become [`Shape::Empty`]; collections recurse.
pub fn value_to_shape(value: &Value) -> std::result::Result<Shape, String> {
    Ok(match value {
        Value::Point(_) | Value::MultiPoint(_) => Shape::Empty,
        Value::LineString(positions) => Shape::Line(line(positions)?),
        Value::MultiLineString(lines) => Shape::MultiLine(MultiLineString::new(
            lines.iter().map(|l| line(l)).collect::<std::result::Result<_, _>>()?,
        )),
        Value::Polygon(rings) => match polygon(rings)? {
            Some(p) => Shape::Polygon(p),
            None => Shape::Empty,
        },
        Value::MultiPolygon(polys) => {
            let mut out = Vec::with_capacity(polys.len());
            for rings in polys {
                if let Some(p) = polygon(rings)? {
                    out.push(p);
                }
            }
            Shape::MultiPolygon(MultiPolygon::new(out))
        }
        Value::GeometryCollection(geoms) => Shape::Mixed(
            geoms
                .iter()
                .map(|g| value_to_shape(&g.value))
                .collect::<std::result::Result<_, _>>()?,
        ),
    })
}

// ============================================================================
// SOURCES
// ============================================================================

/// Anything that can hand out datasets by identifier.
pub trait DatasetSource {
    /// Load a dataset. Unknown identifiers are an error.
    fn fetch(&self, id: &str) -> Result<FeatureCollection>;

    /// Whether `id` is available without fetching it.
    fn contains(&self, id: &str) -> bool;

    /// Load a dataset that may legitimately be absent.
    fn fetch_optional(&self, id: &str) -> Result<Option<FeatureCollection>> {
        if self.contains(id) {
            self.fetch(id).map(Some)
        } else {
            warn!(dataset = id, "Dataset not available, treating as empty");
            Ok(None)
        }
    }
}

/// Datasets cached as `<root>/<id>.geojson`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.geojson"))
    }
}

impl DatasetSource for DirectorySource {
    fn fetch(&self, id: &str) -> Result<FeatureCollection> {
        let path = self.path_of(id);
        debug!(dataset = id, path = %path.display(), "Loading dataset");
        let content = fs::read_to_string(&path).map_err(|source| TrailfabError::DatasetIo {
            path: path.clone(),
            source,
        })?;
        FeatureCollection::from_geojson_str(id, &content)
    }

    fn contains(&self, id: &str) -> bool {
        self.path_of(id).is_file()
    }
}

/// Datasets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    datasets: HashMap<String, FeatureCollection>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, collection: FeatureCollection) {
        self.datasets.insert(id.to_string(), collection);
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, id: &str, collection: FeatureCollection) -> Self {
        self.insert(id, collection);
        self
    }
}

impl DatasetSource for MemorySource {
    fn fetch(&self, id: &str) -> Result<FeatureCollection> {
        self.datasets.get(id).cloned().ok_or_else(|| TrailfabError::Dataset {
            id: id.to_string(),
            reason: "not found".to_string(),
        })
    }

    fn contains(&self, id: &str) -> bool {
        self.datasets.contains_key(id)
    }
}

// ============================================================================
// ADMIN BOUNDARY QUERIES
// ============================================================================

/// Polygons of the first feature whose `NAME` or `ADMIN` is `name`.
pub fn find_country(countries: &FeatureCollection, name: &str) -> Result<Vec<Polygon<f64>>> {
    countries
        .features
        .iter()
        .filter(|f| f.is_named(name))
        .map(|f| f.shape.clone().into_polygons())
        .find(|polys| !polys.is_empty())
        .ok_or_else(|| TrailfabError::CountryNotFound(name.to_string()))
}

/// Every other country whose territory touches `search_box`, keyed by
/// `NAME` (so iteration is alphabetical). Features without polygons are
/// skipped; a later feature with the same name replaces an earlier one.
pub fn find_neighbors(
    countries: &FeatureCollection,
    search_box: Rect<f64>,
    exclude: &str,
) -> BTreeMap<String, Vec<Polygon<f64>>> {
    let search = search_box.to_polygon();
    let mut neighbors = BTreeMap::new();

    for feature in &countries.features {
        if feature.is_named(exclude) {
            continue;
        }
        let name = feature.name.clone().unwrap_or_default();
        let polys = feature.shape.clone().into_polygons();
        if polys.iter().any(|p| p.intersects(&search)) {
            neighbors.insert(name, polys);
        }
    }

    neighbors
}
