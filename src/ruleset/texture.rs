use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::geo::GeoPoint;

/// A weighted terrain choice limited to a lon/lat rectangle (radians).
#[derive(Clone, Debug)]
pub struct TerrainCriteria {
    pub name: String,
    pub weight: u32,
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl TerrainCriteria {
    /// Criteria covering the whole globe.
    pub fn new(name: &str, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            weight,
            lon_min: 0.0,
            lon_max: TAU,
            lat_min: -FRAC_PI_2,
            lat_max: FRAC_PI_2,
        }
    }

    /// Restrict to an area given in degrees as `[lon_min, lon_max, lat_min, lat_max]`
    /// with north-positive latitudes, the same convention as [`Area::from_degrees`].
    ///
    /// [`Area::from_degrees`]: crate::ruleset::Area::from_degrees
    pub fn with_area(mut self, area: [f64; 4]) -> Self {
        let a = GeoPoint::from_degrees(area[0], area[3]);
        let b = GeoPoint::from_degrees(area[1], area[2]);
        self.lon_min = a.lon;
        self.lon_max = b.lon;
        self.lat_min = a.lat;
        self.lat_max = b.lat;
        self
    }

    fn covers(&self, p: GeoPoint) -> bool {
        p.lon >= self.lon_min && p.lon < self.lon_max && p.lat >= self.lat_min && p.lat < self.lat_max
    }
}

/// Relation between a globe texture and the battle attributes of
/// missions landing on it.
#[derive(Clone, Debug, Default)]
pub struct Texture {
    pub id: usize,
    /// Cosmetic ocean: drawn like land but counts as water.
    pub is_ocean: bool,
    pub fake_underwater: bool,
    pub starting_condition: String,
    pub deployments: BTreeMap<String, u32>,
    pub terrain: Vec<TerrainCriteria>,
    pub base_terrain: Vec<TerrainCriteria>,
}

impl Texture {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Random mission terrain for a target at `position`.
    pub fn random_terrain(&self, position: GeoPoint, rng: &mut impl Rng) -> Option<&str> {
        pick_criteria(&self.terrain, position, rng)
    }

    /// Random base-defense terrain for a base at `position`.
    /// Returns `None` when no criteria cover the position.
    pub fn random_base_terrain(&self, position: GeoPoint, rng: &mut impl Rng) -> Option<&str> {
        pick_criteria(&self.base_terrain, position, rng)
    }

    /// Random alien deployment for missions on this texture.
    pub fn random_deployment(&self, rng: &mut impl Rng) -> Option<&str> {
        if self.deployments.len() <= 1 {
            return self.deployments.keys().next().map(String::as_str);
        }

        let total: u32 = self.deployments.values().sum();
        if total == 0 {
            return None;
        }
        let mut pick = rng.gen_range(1..=total);
        for (name, &weight) in &self.deployments {
            if pick <= weight {
                return Some(name);
            }
            pick -= weight;
        }
        None
    }
}

fn pick_criteria<'a>(
    criteria: &'a [TerrainCriteria],
    position: GeoPoint,
    rng: &mut impl Rng,
) -> Option<&'a str> {
    let mut total = 0;
    let mut cumulative = Vec::new();
    for crit in criteria {
        if crit.weight > 0 && crit.covers(position) {
            total += crit.weight;
            cumulative.push((total, crit.name.as_str()));
        }
    }
    if total == 0 {
        return None;
    }

    let pick = rng.gen_range(1..=total);
    cumulative
        .into_iter()
        .find(|&(upper, _)| pick <= upper)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_terrain_respects_area() {
        let mut texture = Texture::new(0);
        texture.terrain.push(TerrainCriteria::new("JUNGLE", 1).with_area([0.0, 90.0, -90.0, 90.0]));
        texture.terrain.push(TerrainCriteria::new("FARM", 1).with_area([180.0, 360.0, -90.0, 90.0]));

        let mut rng = Pcg32::seed_from_u64(7);
        let east = GeoPoint::new(0.5, 0.0);
        for _ in 0..20 {
            assert_eq!(texture.random_terrain(east, &mut rng), Some("JUNGLE"));
        }
        let nowhere = GeoPoint::new(2.0, 0.0);
        assert_eq!(texture.random_terrain(nowhere, &mut rng), None);
    }

    #[test]
    fn test_terrain_area_latitudes_north_positive() {
        let mut texture = Texture::new(0);
        texture.terrain.push(TerrainCriteria::new("ARCTIC", 1).with_area([0.0, 360.0, 60.0, 90.0]));

        let mut rng = Pcg32::seed_from_u64(5);
        let north = GeoPoint::from_degrees(10.0, 80.0);
        let south = GeoPoint::from_degrees(10.0, -80.0);
        assert_eq!(texture.random_terrain(north, &mut rng), Some("ARCTIC"));
        assert_eq!(texture.random_terrain(south, &mut rng), None);
    }

    #[test]
    fn test_zero_weight_is_never_picked() {
        let mut texture = Texture::new(0);
        texture.base_terrain.push(TerrainCriteria::new("NEVER", 0));
        texture.base_terrain.push(TerrainCriteria::new("ALWAYS", 3));
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(texture.random_base_terrain(GeoPoint::default(), &mut rng), Some("ALWAYS"));
        }
    }

    #[test]
    fn test_empty_base_terrain() {
        let texture = Texture::new(3);
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(texture.random_base_terrain(GeoPoint::default(), &mut rng), None);
    }

    #[test]
    fn test_deployments() {
        let mut texture = Texture::new(0);
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(texture.random_deployment(&mut rng), None);

        texture.deployments.insert("STR_ONLY".into(), 0);
        assert_eq!(texture.random_deployment(&mut rng), Some("STR_ONLY"));

        texture.deployments.insert("STR_HEAVY".into(), 10);
        for _ in 0..20 {
            assert_eq!(texture.random_deployment(&mut rng), Some("STR_HEAVY"));
        }
    }
}
