//! World data: land polygons and border lines (GeoJSON or built-in), and
//! the sample ruleset and campaign the terminal app runs.

mod sample;

pub use sample::{sample_ruleset, sample_world};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};

use crate::geo::GeoPoint;
use crate::palette;
use crate::ruleset::{Polygon, Polyline};

/// Size in degrees of the land quads rings are cut into.
pub const CELL_DEGREES: f64 = 5.0;

/// Land texture ids, in colour ramp order.
pub const FOREST: usize = 0;
pub const GRASSLAND: usize = 1;
pub const MOUNTAIN: usize = 2;
pub const DESERT: usize = 3;
pub const ICE: usize = 4;
pub const TUNDRA: usize = 5;
/// Drawn like water, but counts as land for polygon lookups.
pub const COSMETIC_OCEAN: usize = 6;
pub const FAKE_UNDERWATER: usize = 7;

/// Colour ramp of every texture id, for [`crate::globe::TextureSet`].
pub fn texture_ramps() -> Vec<u8> {
    vec![
        palette::FOREST,
        palette::GRASSLAND,
        palette::MOUNTAIN,
        palette::DESERT,
        palette::ICE,
        palette::TUNDRA,
        palette::OCEAN,
        palette::OCEAN,
    ]
}

/// Load land polygons from a GeoJSON file of (multi)polygons.
pub fn load_land(path: &Path) -> Result<Vec<Polygon>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing GeoJSON in {}", path.display()))?;
    let mut polygons = Vec::new();
    process_geojson_rings(&geojson, |ring| polygons.extend(tessellate_ring(&ring)));
    tracing::info!(path = %path.display(), polygons = polygons.len(), "loaded land");
    Ok(polygons)
}

/// Load border lines from a GeoJSON file.
pub fn load_borders(path: &Path) -> Result<Vec<Polyline>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing GeoJSON in {}", path.display()))?;
    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(to_polyline(&line)));
    tracing::info!(path = %path.display(), lines = lines.len(), "loaded borders");
    Ok(lines)
}

/// Land from `path`, or the built-in continents when it is unset or fails.
pub fn land_or_builtin(path: Option<&Path>) -> Vec<Polygon> {
    if let Some(path) = path {
        match load_land(path) {
            Ok(polygons) if !polygons.is_empty() => return polygons,
            Ok(_) => tracing::warn!(path = %path.display(), "no land polygons in file, using built-in world"),
            Err(e) => tracing::warn!(error = %e, "failed to load land, using built-in world"),
        }
    }
    builtin_land()
}

pub fn borders_or_builtin(path: Option<&Path>) -> Vec<Polyline> {
    if let Some(path) = path {
        match load_borders(path) {
            Ok(lines) => return lines,
            Err(e) => tracing::warn!(error = %e, "failed to load borders, using built-in lines"),
        }
    }
    BUILTIN_BORDERS.iter().map(|line| to_polyline(line)).collect()
}

fn to_polyline(line: &[(f64, f64)]) -> Polyline {
    Polyline {
        points: line.iter().map(|&(lon, lat)| GeoPoint::from_degrees(lon, lat)).collect(),
    }
}

/// Exterior rings of every polygon in `geojson`, as (lon, lat) degrees.
fn process_geojson_rings<F>(geojson: &GeoJson, mut add_ring: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    for_each_geometry(geojson, &mut |geometry: &Geometry| process_geometry_rings(geometry, &mut add_ring));
}

/// Line strings and polygon outlines in `geojson`, as (lon, lat) degrees.
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    for_each_geometry(geojson, &mut |geometry: &Geometry| process_geometry_lines(geometry, &mut add_line));
}

fn for_each_geometry(geojson: &GeoJson, f: &mut dyn FnMut(&Geometry)) {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    f(geometry);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(ref geometry) = feature.geometry {
                f(geometry);
            }
        }
        GeoJson::Geometry(geometry) => f(geometry),
    }
}

fn ring(coords: &[Vec<f64>]) -> Vec<(f64, f64)> {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

fn process_geometry_rings<F>(geometry: &Geometry, add_ring: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match &geometry.value {
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_ring(ring(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_ring(ring(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_rings(g, add_ring);
            }
        }
        _ => {}
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(ring(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(ring(coords));
            }
        }
        Value::Polygon(_) | Value::MultiPolygon(_) => process_geometry_rings(geometry, add_line),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Even-odd test in plain lon/lat degrees.
fn ring_contains(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        if (y1 > lat) != (y2 > lat) && lon < x1 + (lat - y1) / (y2 - y1) * (x2 - x1) {
            inside = !inside;
        }
    }
    inside
}

/// Terrain for a land cell centred on (lon, lat) degrees.
fn texture_at(lon: f64, lat: f64) -> usize {
    let cell = ((lon / CELL_DEGREES).floor() as i64, (lat / CELL_DEGREES).floor() as i64);
    match lat.abs() {
        a if a >= 66.0 => ICE,
        a if a >= 55.0 => TUNDRA,
        _ if (cell.0 * 3 + cell.1 * 5).rem_euclid(11) == 0 => MOUNTAIN,
        a if (15.0..32.0).contains(&a) => DESERT,
        a if a < 15.0 => FOREST,
        _ => GRASSLAND,
    }
}

/// Cut a land ring into grid quads whose centres fall inside it. Small
/// quads keep the globe's point-in-polygon test (which rejects far-flung
/// polygons) usable on continent-sized land.
pub fn tessellate_ring(ring: &[(f64, f64)]) -> Vec<Polygon> {
    if ring.len() < 3 {
        return Vec::new();
    }
    let (mut lon_min, mut lon_max, mut lat_min, mut lat_max) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(lon, lat) in ring {
        lon_min = lon_min.min(lon);
        lon_max = lon_max.max(lon);
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
    }

    let snap = |v: f64| (v / CELL_DEGREES).floor() * CELL_DEGREES;
    let mut quads = Vec::new();
    let mut lat = snap(lat_min);
    while lat < lat_max {
        let mut lon = snap(lon_min);
        while lon < lon_max {
            let (clon, clat) = (lon + CELL_DEGREES / 2.0, lat + CELL_DEGREES / 2.0);
            if ring_contains(ring, clon, clat) {
                let corners = [
                    (lon, lat),
                    (lon + CELL_DEGREES, lat),
                    (lon + CELL_DEGREES, lat + CELL_DEGREES),
                    (lon, lat + CELL_DEGREES),
                ];
                let points = corners
                    .iter()
                    .map(|&(x, y)| GeoPoint::from_degrees(x, y.clamp(-90.0, 90.0)))
                    .collect();
                quads.push(Polygon::new(points, texture_at(clon, clat)));
            }
            lon += CELL_DEGREES;
        }
        lat += CELL_DEGREES;
    }
    quads
}

/// Simplified continent outlines, (lon, lat) degrees.
const BUILTIN_CONTINENTS: &[&[(f64, f64)]] = &[
    // North America
    &[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
        (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
        (-105.0, 20.0), (-95.0, 16.0), (-83.0, 9.0), (-78.0, 8.0),
        (-88.0, 20.0), (-97.0, 25.0), (-82.0, 24.0), (-81.0, 31.0),
        (-75.0, 35.0), (-70.0, 41.0), (-65.0, 47.0), (-55.0, 47.0),
        (-58.0, 55.0), (-64.0, 60.0), (-80.0, 63.0), (-95.0, 62.0),
        (-110.0, 68.0), (-130.0, 70.0), (-145.0, 70.0),
    ],
    // Greenland
    &[(-55.0, 60.0), (-43.0, 60.0), (-20.0, 70.0), (-20.0, 82.0), (-60.0, 82.0), (-70.0, 76.0)],
    // South America
    &[
        (-80.0, 10.0), (-75.0, 11.0), (-60.0, 8.0), (-50.0, 0.0),
        (-35.0, -5.0), (-38.0, -15.0), (-40.0, -22.0), (-48.0, -25.0),
        (-55.0, -34.0), (-65.0, -42.0), (-68.0, -52.0), (-75.0, -52.0),
        (-72.0, -40.0), (-70.0, -20.0), (-80.0, -5.0),
    ],
    // Europe
    &[
        (-10.0, 36.0), (0.0, 38.0), (5.0, 43.0), (15.0, 45.0),
        (20.0, 40.0), (25.0, 37.0), (30.0, 40.0), (40.0, 43.0),
        (40.0, 55.0), (30.0, 60.0), (25.0, 65.0), (20.0, 70.0),
        (10.0, 71.0), (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0),
        (-10.0, 52.0), (-5.0, 48.0), (-5.0, 43.0),
    ],
    // Africa
    &[
        (-17.0, 15.0), (-17.0, 21.0), (-10.0, 30.0), (-5.0, 36.0),
        (10.0, 37.0), (20.0, 32.0), (32.0, 31.0), (35.0, 28.0),
        (43.0, 12.0), (51.0, 12.0), (40.0, -3.0), (40.0, -15.0),
        (35.0, -25.0), (20.0, -35.0), (15.0, -28.0), (12.0, -15.0),
        (9.0, -2.0), (9.0, 4.0), (-8.0, 4.0),
    ],
    // Asia
    &[
        (40.0, 43.0), (50.0, 40.0), (55.0, 37.0), (60.0, 25.0),
        (70.0, 20.0), (75.0, 15.0), (80.0, 8.0), (88.0, 22.0),
        (95.0, 16.0), (100.0, 14.0), (105.0, 10.0), (110.0, 20.0),
        (120.0, 22.0), (125.0, 30.0), (130.0, 35.0), (140.0, 40.0),
        (145.0, 50.0), (160.0, 60.0), (180.0, 66.0), (180.0, 72.0),
        (140.0, 74.0), (100.0, 78.0), (70.0, 73.0), (40.0, 68.0),
        (40.0, 55.0),
    ],
    // Australia
    &[
        (115.0, -20.0), (130.0, -12.0), (140.0, -12.0), (145.0, -15.0),
        (150.0, -25.0), (153.0, -30.0), (150.0, -37.0), (140.0, -38.0),
        (130.0, -32.0), (115.0, -35.0),
    ],
    // Antarctica
    &[(-180.0, -70.0), (180.0, -70.0), (180.0, -89.0), (-180.0, -89.0)],
];

/// Hand-placed lakes and a shallow sea, to give the special textures a home.
const BUILTIN_SPECIAL: &[(f64, f64, usize)] = &[
    (-88.0, 45.0, COSMETIC_OCEAN),
    (35.0, -5.0, COSMETIC_OCEAN),
    (50.0, 40.0, FAKE_UNDERWATER),
];

const BUILTIN_BORDERS: &[&[(f64, f64)]] = &[
    // United States / Canada
    &[(-123.0, 49.0), (-95.0, 49.0), (-83.0, 46.0), (-75.0, 45.0), (-67.0, 45.0)],
    // United States / Mexico
    &[(-117.0, 32.5), (-111.0, 31.3), (-106.0, 31.8), (-97.0, 26.0)],
    // Europe / Asia
    &[(40.0, 43.0), (45.0, 50.0), (58.0, 52.0), (60.0, 60.0), (65.0, 70.0)],
    // Egypt / Sudan
    &[(25.0, 22.0), (37.0, 22.0)],
    // Brazil, roughly
    &[(-74.0, -5.0), (-60.0, 5.0), (-50.0, 4.0)],
];

pub fn builtin_land() -> Vec<Polygon> {
    let mut polygons: Vec<Polygon> = BUILTIN_CONTINENTS.iter().flat_map(|ring| tessellate_ring(ring)).collect();
    for &(lon, lat, texture) in BUILTIN_SPECIAL {
        let half = CELL_DEGREES / 2.0;
        // Drop the land quad underneath so the special one is found first
        let centre = GeoPoint::from_degrees(lon, lat);
        polygons.retain(|p| !crate::globe::polygon_contains(p, centre));
        let corners = [(-half, -half), (half, -half), (half, half), (-half, half)];
        let points = corners
            .iter()
            .map(|&(dx, dy)| GeoPoint::from_degrees(lon + dx, lat + dy))
            .collect();
        polygons.push(Polygon::new(points, texture));
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::polygon_containing;

    #[test]
    fn test_tessellate_square() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let quads = tessellate_ring(&square);
        assert_eq!(quads.len(), 4);
        assert!(quads.iter().all(|q| q.points.len() == 4));
        assert!(polygon_containing(&quads, GeoPoint::from_degrees(2.0, 7.0)).is_some());
        assert!(polygon_containing(&quads, GeoPoint::from_degrees(12.0, 7.0)).is_none());
    }

    #[test]
    fn test_degenerate_ring_is_empty() {
        assert!(tessellate_ring(&[(0.0, 0.0), (5.0, 5.0)]).is_empty());
    }

    #[test]
    fn test_texture_by_latitude() {
        assert_eq!(texture_at(2.5, 80.0), ICE);
        assert_eq!(texture_at(2.5, -60.0), TUNDRA);
        assert_eq!(texture_at(12.5, 2.5), FOREST);
    }

    #[test]
    fn test_geojson_polygons_and_lines() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,5],[0,5],[0,0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0,0],[3,4]]}}
            ]
        }"#;
        let geojson: GeoJson = text.parse().expect("valid GeoJSON");

        let mut rings = Vec::new();
        process_geojson_rings(&geojson, |r| rings.push(r));
        assert_eq!(rings.len(), 1);
        assert_eq!(tessellate_ring(&rings[0]).len(), 2);

        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |l| lines.push(l));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], vec![(0.0, 0.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_builtin_world_has_land_where_expected() {
        let land = builtin_land();
        let africa = polygon_containing(&land, GeoPoint::from_degrees(22.0, 2.0));
        assert!(africa.is_some());
        let atlantic = polygon_containing(&land, GeoPoint::from_degrees(-30.0, 0.0));
        assert!(atlantic.is_none());
        let lake = polygon_containing(&land, GeoPoint::from_degrees(-88.0, 45.0));
        assert_eq!(lake.map(|p| p.texture), Some(COSMETIC_OCEAN));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let land = land_or_builtin(Some(Path::new("no/such/land.json")));
        assert!(!land.is_empty());
        let borders = borders_or_builtin(Some(Path::new("no/such/borders.json")));
        assert_eq!(borders.len(), BUILTIN_BORDERS.len());
    }
}
