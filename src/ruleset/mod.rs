//! Static game rules consumed by the globe: land polygons, border polylines,
//! texture metadata, radar facilities, countries, regions and cities.

mod texture;

pub use texture::{TerrainCriteria, Texture};

use crate::geo::GeoPoint;
use crate::palette;

/// A closed land ring drawn with a single texture.
#[derive(Clone, Debug)]
pub struct Polygon {
    pub points: Vec<GeoPoint>,
    pub texture: usize,
}

impl Polygon {
    pub fn new(points: Vec<GeoPoint>, texture: usize) -> Self {
        Self { points, texture }
    }
}

/// An open line, such as a country border.
#[derive(Clone, Debug)]
pub struct Polyline {
    pub points: Vec<GeoPoint>,
}

/// A lon/lat rectangle in radians.
#[derive(Clone, Copy, Debug)]
pub struct Area {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Area {
    /// Build from degrees, as `[lon_min, lon_max, lat_min, lat_max]` with
    /// north-positive latitudes.
    pub fn from_degrees(area: [f64; 4]) -> Self {
        let a = GeoPoint::from_degrees(area[0], area[3]);
        let b = GeoPoint::from_degrees(area[1], area[2]);
        Self {
            lon_min: a.lon,
            lon_max: b.lon,
            lat_min: a.lat,
            lat_max: b.lat,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FacilityRule {
    pub name: String,
    /// Radar range in nautical miles; 0 for facilities without radar.
    pub radar_range: f64,
}

#[derive(Clone, Debug)]
pub struct CountryRule {
    pub name: String,
    pub label: GeoPoint,
    /// Overrides the default country label colour.
    pub label_color: Option<u8>,
    pub areas: Vec<Area>,
}

#[derive(Clone, Debug)]
pub struct City {
    pub name: String,
    pub position: GeoPoint,
}

#[derive(Clone, Debug, Default)]
pub struct MissionZone {
    pub areas: Vec<Area>,
}

#[derive(Clone, Debug)]
pub struct RegionRule {
    pub name: String,
    pub areas: Vec<Area>,
    pub cities: Vec<City>,
    pub mission_zones: Vec<MissionZone>,
}

/// Free-standing globe label (oceans, landmarks) shown from a given zoom.
#[derive(Clone, Debug)]
pub struct ExtraLabel {
    pub name: String,
    pub position: GeoPoint,
    pub label_color: Option<u8>,
    pub zoom_level: usize,
}

/// Palette indices the globe draws with.
#[derive(Clone, Copy, Debug)]
pub struct GlobeColors {
    /// First entry of the 32-shade ocean ramp.
    pub ocean: u8,
    pub line: u8,
    pub country_label: u8,
    pub city_label: u8,
    pub base_label: u8,
}

impl Default for GlobeColors {
    fn default() -> Self {
        Self {
            ocean: palette::OCEAN,
            line: palette::LIGHT_GREY,
            country_label: palette::YELLOW,
            city_label: palette::WHITE,
            base_label: palette::CYAN,
        }
    }
}

/// Which enemy radar ranges are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnemyRadarCircles {
    #[default]
    Hidden,
    /// Only hunter-killers the player has hyper-detected.
    HyperDetected,
    All,
}

#[derive(Clone, Debug, Default)]
pub struct Ruleset {
    pub polygons: Vec<Polygon>,
    pub polylines: Vec<Polyline>,
    pub textures: Vec<Texture>,
    pub facilities: Vec<FacilityRule>,
    pub countries: Vec<CountryRule>,
    pub regions: Vec<RegionRule>,
    pub extra_labels: Vec<ExtraLabel>,
    pub enemy_radar_circles: EnemyRadarCircles,
    pub colors: GlobeColors,
}

impl Ruleset {
    pub fn texture(&self, id: usize) -> Option<&Texture> {
        self.textures.iter().find(|t| t.id == id)
    }

    pub fn facility(&self, name: &str) -> Option<&FacilityRule> {
        self.facilities.iter().find(|f| f.name == name)
    }

    pub fn has_land(&self) -> bool {
        !self.polygons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_from_degrees_orders_bounds() {
        let area = Area::from_degrees([10.0, 20.0, -5.0, 30.0]);
        assert!(area.lon_min < area.lon_max);
        // North-positive input becomes north-negative radians
        assert!(area.lat_min < area.lat_max);
        assert!((area.lat_min + 30f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_lookup_by_id() {
        let ruleset = Ruleset {
            textures: vec![Texture::new(4), Texture::new(9)],
            ..Default::default()
        };
        assert_eq!(ruleset.texture(9).map(|t| t.id), Some(9));
        assert!(ruleset.texture(1).is_none());
    }
}
