//! Small geodesy helpers shared by the scrapers: bounding boxes, UTM zones,
//! EPSG codes out of WKT, and dissolving tile index footprints.

use crate::domain::model::{Bbox, Geometry, Position};
use crate::utils::error::{DisasterDataError, Result};
use chrono::NaiveDate;
use geo::{BooleanOps, BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use regex::Regex;
use std::sync::OnceLock;

pub fn bbox_of<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Bbox> {
    let mut bbox: Option<Bbox> = None;
    for position in positions {
        let (x, y) = match position.as_slice() {
            [x, y, ..] => (*x, *y),
            _ => continue,
        };
        bbox = Some(match bbox {
            None => [x, y, x, y],
            Some([minx, miny, maxx, maxy]) => [minx.min(x), miny.min(y), maxx.max(x), maxy.max(y)],
        });
    }
    bbox
}

pub fn union_bbox(a: Bbox, b: Bbox) -> Bbox {
    [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])]
}

pub fn bbox_center(bbox: &Bbox) -> (f64, f64) {
    ((bbox[0] + bbox[2]) / 2.0, (bbox[1] + bbox[3]) / 2.0)
}

/// UTM zone number, including the Norway and Svalbard exceptions.
pub fn utm_zone(lon: f64, lat: f64) -> u32 {
    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        return 32;
    }
    if (72.0..84.0).contains(&lat) && lon >= 0.0 {
        if lon < 9.0 {
            return 31;
        } else if lon < 21.0 {
            return 33;
        } else if lon < 33.0 {
            return 35;
        } else if lon < 42.0 {
            return 37;
        }
    }
    let zone = ((lon + 180.0) / 6.0).floor() as i64 % 60;
    zone.rem_euclid(60) as u32 + 1
}

/// WGS84 / UTM EPSG code for the zone containing the point.
pub fn utm_epsg(lon: f64, lat: f64) -> u32 {
    let zone = utm_zone(lon, lat);
    if lat > 0.0 {
        32600 + zone
    } else {
        32700 + zone
    }
}

fn epsg_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""EPSG"\s*,\s*"?(\d+)"?"#).expect("EPSG pattern is valid")
    })
}

/// The outermost EPSG authority code of a WKT1 or WKT2 string.
pub fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    epsg_pattern()
        .captures_iter(wkt)
        .last()
        .and_then(|caps| caps[1].parse().ok())
}

/// `YYYY-MM-DD` from a file name that starts with `YYYYMMDD`.
pub fn acquisition_date(name: &str) -> Result<String> {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let invalid = || DisasterDataError::ProcessingError {
        message: format!("no acquisition date in file name: {}", basename),
    };
    let prefix = basename.get(0..8).ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(prefix, "%Y%m%d").map_err(|_| invalid())?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Outline of a set of tiles once merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub parts: usize,
    pub bbox: Bbox,
}

impl Footprint {
    pub fn kind(&self) -> &'static str {
        if self.parts == 1 {
            "Polygon"
        } else {
            "MultiPolygon"
        }
    }
}

fn ring(positions: &[Position]) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect();
    // a closed ring needs at least four positions
    (coords.len() >= 4).then(|| LineString::new(coords))
}

fn polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().filter_map(|r| ring(r));
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

fn to_polygons(geometry: &Geometry) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon { coordinates } => polygon(coordinates).into_iter().collect(),
        Geometry::MultiPolygon { coordinates } => {
            coordinates.iter().filter_map(|p| polygon(p)).collect()
        }
    }
}

/// Unions every polygon of `geometries`; `None` when nothing usable was given.
pub fn dissolve(geometries: &[Geometry]) -> Option<Footprint> {
    let mut merged = MultiPolygon::<f64>::new(Vec::new());
    for polygon in geometries.iter().flat_map(to_polygons) {
        merged = merged.union(&MultiPolygon::new(vec![polygon]));
    }

    let rect = merged.bounding_rect()?;
    Some(Footprint {
        parts: merged.0.len(),
        bbox: [rect.min().x, rect.min().y, rect.max().x, rect.max().y],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Geometry {
        Geometry::Polygon {
            coordinates: vec![vec![
                vec![x, y],
                vec![x + size, y],
                vec![x + size, y + size],
                vec![x, y + size],
                vec![x, y],
            ]],
        }
    }

    #[test]
    fn test_bbox_of_ring() {
        let geometry = square(-80.5, 25.0, 0.5);
        assert_eq!(bbox_of(geometry.positions()), Some([-80.5, 25.0, -80.0, 25.5]));
        assert_eq!(bbox_of(Vec::<&Position>::new()), None);
    }

    #[test]
    fn test_utm_epsg() {
        // Houston
        assert_eq!(utm_epsg(-95.36, 29.76), 32615);
        // Puerto Rico, single digit zone
        assert_eq!(utm_zone(-66.1, 18.4), 19);
        // Wellington
        assert_eq!(utm_epsg(174.78, -41.29), 32760);
        // Bergen sits in the widened zone 32
        assert_eq!(utm_zone(5.32, 60.39), 32);
        assert_eq!(utm_epsg(-177.0, 10.0), 32601);
    }

    #[test]
    fn test_epsg_from_wkt1_takes_outer_authority() {
        let wkt = r#"PROJCS["NAD83 / UTM zone 15N",GEOGCS["NAD83",AUTHORITY["EPSG","4269"]],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","26915"]]"#;
        assert_eq!(epsg_from_wkt(wkt), Some(26915));
    }

    #[test]
    fn test_epsg_from_wkt2() {
        let wkt = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984"],ID["EPSG",4326]]"#;
        assert_eq!(epsg_from_wkt(wkt), Some(4326));
        assert_eq!(epsg_from_wkt("LOCAL_CS[\"unknown\"]"), None);
    }

    #[test]
    fn test_acquisition_date() {
        assert_eq!(acquisition_date("20180916aC0772830w351230n.tif").unwrap(), "2018-09-16");
        assert_eq!(
            acquisition_date("/tmp/archive.tar/20170827_RGB/20170827_A1.tif").unwrap(),
            "2017-08-27"
        );
        assert!(acquisition_date("C0772830w351230n.tif").is_err());
        assert!(acquisition_date("short").is_err());
    }

    #[test]
    fn test_dissolve_touching_tiles() {
        let footprint = dissolve(&[square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)]).unwrap();
        assert_eq!(footprint.parts, 1);
        assert_eq!(footprint.kind(), "Polygon");
        assert_eq!(footprint.bbox, [0.0, 0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_dissolve_disjoint_tiles() {
        let footprint = dissolve(&[square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]).unwrap();
        assert_eq!(footprint.kind(), "MultiPolygon");
        assert_eq!(footprint.bbox, [0.0, 0.0, 6.0, 6.0]);
        assert!(dissolve(&[]).is_none());
    }
}
