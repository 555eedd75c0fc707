/// Region of interest loaded from GeoJSON
use crate::error::{DataError, Result};
use geo::algorithm::geodesic_area::GeodesicArea;
use geo::BoundingRect;
use geo_types::{MultiPolygon, Polygon, Rect};
use geojson::{GeoJson, Geometry, Value};
use log::debug;
use std::path::Path;

/// Coordinates of one polygon as `[[[lon, lat], ...], ...]`, exterior ring
/// first.
pub type PolygonCoordinates = Vec<Vec<Vec<f64>>>;

/// A polygonal area of interest. Every polygon found in the source
/// document is merged into one multipolygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    shape: MultiPolygon<f64>,
}

impl Region {
    /// Load a region from a GeoJSON file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Region> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let region = Region::from_geojson_str(&contents)?;
        debug!(
            "Loaded {} polygon(s) from {}",
            region.shape.0.len(),
            path.display()
        );
        Ok(region)
    }

    /// Parse a region from a GeoJSON `FeatureCollection`, `Feature` or
    /// bare `Geometry`.
    pub fn from_geojson_str(s: &str) -> Result<Region> {
        let geojson: GeoJson = s.parse()?;
        let mut polygons = Vec::new();
        match geojson {
            GeoJson::Geometry(geometry) => collect_polygons(&geometry, &mut polygons)?,
            GeoJson::Feature(feature) => {
                if let Some(geometry) = feature.geometry {
                    collect_polygons(&geometry, &mut polygons)?;
                }
            }
            GeoJson::FeatureCollection(collection) => {
                for geometry in collection.features.into_iter().filter_map(|f| f.geometry) {
                    collect_polygons(&geometry, &mut polygons)?;
                }
            }
        }
        Region::from_shape(MultiPolygon::new(polygons))
    }

    /// Build a region directly from a multipolygon.
    pub fn from_shape(shape: MultiPolygon<f64>) -> Result<Region> {
        if shape.0.iter().all(|p| p.exterior().0.is_empty()) {
            return Err(DataError::NoPolygon);
        }
        Ok(Region { shape })
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Coordinates in GeoJSON multipolygon order, as sent to the service.
    pub fn coordinates(&self) -> Vec<PolygonCoordinates> {
        self.shape
            .iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
                    .collect()
            })
            .collect()
    }

    /// Longitude/latitude extent of all polygons.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.shape.bounding_rect()
    }

    /// Geodesic area on the WGS84 ellipsoid in square meters, holes
    /// excluded.
    pub fn area_m2(&self) -> f64 {
        self.shape.geodesic_area_unsigned()
    }
}

fn collect_polygons(geometry: &Geometry, polygons: &mut Vec<Polygon<f64>>) -> Result<()> {
    match &geometry.value {
        value @ Value::Polygon(rings) => {
            check_positions(rings.iter().flatten())?;
            polygons.push(Polygon::try_from(value)?);
        }
        value @ Value::MultiPolygon(multi) => {
            check_positions(multi.iter().flatten().flatten())?;
            polygons.extend(MultiPolygon::<f64>::try_from(value)?.0);
        }
        Value::GeometryCollection(geometries) => {
            for inner in geometries {
                collect_polygons(inner, polygons)?;
            }
        }
        Value::Point(_) => return Err(unsupported("Point")),
        Value::MultiPoint(_) => return Err(unsupported("MultiPoint")),
        Value::LineString(_) => return Err(unsupported("LineString")),
        Value::MultiLineString(_) => return Err(unsupported("MultiLineString")),
    }
    Ok(())
}

fn unsupported(type_name: &str) -> DataError {
    DataError::UnsupportedGeometry(type_name.to_string())
}

/// Every position needs a longitude and a latitude.
fn check_positions<'a, I: Iterator<Item = &'a Vec<f64>>>(positions: I) -> Result<()> {
    for position in positions {
        if position.len() < 2 {
            return Err(DataError::InvalidPosition(position.len()));
        }
    }
    Ok(())
}
