use std::collections::BTreeMap;
use std::path::Path;

use super::{
    borders_or_builtin, land_or_builtin, COSMETIC_OCEAN, DESERT, FAKE_UNDERWATER, FOREST, GRASSLAND,
    ICE, MOUNTAIN, TUNDRA,
};
use crate::config::Options;
use crate::geo::GeoPoint;
use crate::palette;
use crate::ruleset::{
    Area, City, CountryRule, EnemyRadarCircles, ExtraLabel, FacilityRule, GlobeColors, MissionZone,
    RegionRule, Ruleset, TerrainCriteria, Texture,
};
use crate::world::{
    AlienBase, Base, BaseFacility, Craft, CraftStatus, GameTime, GlobeView, MissionSite, Ufo,
    UfoStatus, Waypoint, World,
};

fn texture(id: usize, terrains: &[(&str, u32)], deployments: &[(&str, u32)]) -> Texture {
    let mut texture = Texture::new(id);
    texture.terrain = terrains.iter().map(|&(name, weight)| TerrainCriteria::new(name, weight)).collect();
    texture.base_terrain = vec![TerrainCriteria::new("XBASE", 1)];
    texture.deployments = deployments
        .iter()
        .map(|&(name, weight)| (name.to_string(), weight))
        .collect::<BTreeMap<_, _>>();
    texture
}

fn textures() -> Vec<Texture> {
    let mut forest = texture(FOREST, &[("FOREST", 10), ("JUNGLE", 5)], &[("STR_SCOUT", 3), ("STR_ABDUCTION", 1)]);
    forest.terrain.push(TerrainCriteria::new("JUNGLE", 20).with_area([-90.0, -30.0, -20.0, 10.0]));
    let grassland = texture(GRASSLAND, &[("FARM", 10), ("CULTA", 5)], &[("STR_HARVEST", 1)]);
    let mountain = texture(MOUNTAIN, &[("MOUNT", 1)], &[("STR_SCOUT", 1)]);
    let mut desert = texture(DESERT, &[("DESERT", 1)], &[("STR_RESEARCH", 2), ("STR_SCOUT", 1)]);
    desert.starting_condition = "STR_HOT".into();
    let mut ice = texture(ICE, &[("POLAR", 1)], &[("STR_SCOUT", 1)]);
    ice.starting_condition = "STR_COLD".into();
    ice.base_terrain =
        vec![TerrainCriteria::new("XBASE_POLAR", 1).with_area([-180.0, 180.0, -90.0, -60.0])];
    let tundra = texture(TUNDRA, &[("POLAR", 1), ("FOREST", 1)], &[]);
    let mut lake = texture(COSMETIC_OCEAN, &[], &[]);
    lake.is_ocean = true;
    let mut seabed = texture(FAKE_UNDERWATER, &[("SEABED", 1)], &[("STR_SUBMERGED", 1)]);
    seabed.fake_underwater = true;
    vec![forest, grassland, mountain, desert, ice, tundra, lake, seabed]
}

fn facilities() -> Vec<FacilityRule> {
    [("STR_ACCESS_LIFT", 0.0), ("STR_HANGAR", 0.0), ("STR_SMALL_RADAR_SYSTEM", 1500.0), ("STR_LARGE_RADAR_SYSTEM", 2250.0)]
        .into_iter()
        .map(|(name, radar_range)| FacilityRule { name: name.into(), radar_range })
        .collect()
}

fn country(name: &str, label: (f64, f64), label_color: Option<u8>, areas: &[[f64; 4]]) -> CountryRule {
    CountryRule {
        name: name.into(),
        label: GeoPoint::from_degrees(label.0, label.1),
        label_color,
        areas: areas.iter().map(|&a| Area::from_degrees(a)).collect(),
    }
}

fn countries() -> Vec<CountryRule> {
    vec![
        country("USA", (-98.0, 39.0), None, &[[-125.0, -67.0, 25.0, 49.0]]),
        country("CANADA", (-100.0, 58.0), None, &[[-140.0, -55.0, 49.0, 70.0]]),
        country("BRAZIL", (-52.0, -10.0), None, &[[-73.0, -35.0, -33.0, 5.0]]),
        country("UK", (-2.0, 54.0), None, &[[-8.0, 2.0, 50.0, 59.0]]),
        country("FRANCE", (2.0, 47.0), None, &[[-5.0, 8.0, 42.0, 51.0]]),
        country("GERMANY", (10.0, 51.0), None, &[[6.0, 15.0, 47.0, 55.0]]),
        country("RUSSIA", (60.0, 60.0), None, &[[30.0, 60.0, 50.0, 75.0], [60.0, 180.0, 50.0, 75.0]]),
        country("CHINA", (103.0, 35.0), None, &[[75.0, 135.0, 20.0, 50.0]]),
        country("JAPAN", (138.0, 37.0), Some(palette::ORANGE), &[[129.0, 146.0, 31.0, 45.0]]),
        country("INDIA", (79.0, 22.0), None, &[[68.0, 90.0, 8.0, 33.0]]),
        country("AUSTRALIA", (134.0, -25.0), None, &[[113.0, 154.0, -44.0, -10.0]]),
        country("SOUTH AFRICA", (25.0, -30.0), None, &[[16.0, 33.0, -35.0, -22.0]]),
        country("EGYPT", (30.0, 27.0), None, &[[25.0, 35.0, 22.0, 32.0]]),
    ]
}

fn city(name: &str, lon: f64, lat: f64) -> City {
    City {
        name: name.into(),
        position: GeoPoint::from_degrees(lon, lat),
    }
}

fn region(name: &str, area: [f64; 4], cities: Vec<City>) -> RegionRule {
    // Zone 1: a small box around every city; zone 2: the whole region
    let around = |c: &City| {
        let (lon, lat) = c.position.to_degrees();
        Area::from_degrees([lon - 3.0, lon + 3.0, lat - 3.0, lat + 3.0])
    };
    let zones = vec![
        MissionZone { areas: cities.iter().map(around).collect() },
        MissionZone { areas: vec![Area::from_degrees(area)] },
    ];
    RegionRule {
        name: name.into(),
        areas: vec![Area::from_degrees(area)],
        cities,
        mission_zones: zones,
    }
}

fn regions() -> Vec<RegionRule> {
    vec![
        region(
            "NORTH AMERICA",
            [-170.0, -50.0, 15.0, 75.0],
            vec![
                city("New York", -74.0, 40.7),
                city("Washington", -77.0, 38.9),
                city("Los Angeles", -118.2, 34.0),
                city("Mexico City", -99.1, 19.4),
            ],
        ),
        region(
            "SOUTH AMERICA",
            [-82.0, -34.0, -56.0, 13.0],
            vec![city("Rio", -43.2, -22.9), city("Buenos Aires", -58.4, -34.6)],
        ),
        region(
            "EUROPE",
            [-12.0, 40.0, 35.0, 72.0],
            vec![city("London", -0.1, 51.5), city("Paris", 2.3, 48.9), city("Moscow", 37.6, 55.8)],
        ),
        region(
            "ASIA",
            [40.0, 180.0, 0.0, 78.0],
            vec![city("Tokyo", 139.7, 35.7), city("Beijing", 116.4, 39.9), city("Delhi", 77.2, 28.6)],
        ),
        region(
            "AFRICA",
            [-18.0, 52.0, -35.0, 37.0],
            vec![city("Cairo", 31.2, 30.0), city("Lagos", 3.4, 6.5), city("Johannesburg", 28.0, -26.2)],
        ),
        region("OCEANIA", [110.0, 180.0, -48.0, 0.0], vec![city("Sydney", 151.2, -33.9)]),
    ]
}

fn extra_labels() -> Vec<ExtraLabel> {
    let label = |name: &str, lon, lat, label_color, zoom_level| ExtraLabel {
        name: name.into(),
        position: GeoPoint::from_degrees(lon, lat),
        label_color,
        zoom_level,
    };
    vec![
        label("ATLANTIC OCEAN", -35.0, 20.0, Some(palette::CYAN), 1),
        label("PACIFIC OCEAN", -150.0, 0.0, Some(palette::CYAN), 1),
        label("INDIAN OCEAN", 80.0, -20.0, Some(palette::CYAN), 1),
        label("SAHARA", 10.0, 23.0, None, 4),
    ]
}

/// Rules for the terminal demo, with land and borders from the configured
/// GeoJSON files when they load.
pub fn sample_ruleset(options: &Options) -> Ruleset {
    let polygons = land_or_builtin(options.land_path.as_deref().map(Path::new));
    let polylines = borders_or_builtin(options.borders_path.as_deref().map(Path::new));
    let ruleset = Ruleset {
        polygons,
        polylines,
        textures: textures(),
        facilities: facilities(),
        countries: countries(),
        regions: regions(),
        extra_labels: extra_labels(),
        enemy_radar_circles: EnemyRadarCircles::All,
        colors: GlobeColors::default(),
    };
    tracing::info!(
        polygons = ruleset.polygons.len(),
        polylines = ruleset.polylines.len(),
        countries = ruleset.countries.len(),
        "ruleset ready"
    );
    ruleset
}

fn facility(rule: &str, build_time: u32) -> BaseFacility {
    BaseFacility { rule: rule.into(), build_time }
}

/// A campaign a few weeks in: two bases, an interception underway and
/// some alien activity to look at.
pub fn sample_world() -> World {
    let london = GeoPoint::from_degrees(-0.1, 51.5);
    let nevada = GeoPoint::from_degrees(-116.0, 37.0);
    let scout = GeoPoint::from_degrees(-30.0, 45.0);
    let hunter = GeoPoint::from_degrees(-90.0, 30.0);
    let knots = |kn: f64| kn / 60.0 / 3600.0 * std::f64::consts::PI / 180.0;

    let skyranger = Craft {
        name: "SKYRANGER-1".into(),
        position: london,
        status: CraftStatus::Ready,
        destination: None,
        meet_point: None,
        radar_range: 0.0,
        speed: knots(760.0),
    };
    let interceptor = Craft {
        name: "INTERCEPTOR-1".into(),
        position: GeoPoint::from_degrees(-10.0, 49.0),
        status: CraftStatus::Out,
        destination: Some(scout),
        meet_point: Some(GeoPoint::from_degrees(-25.0, 46.0)),
        radar_range: 600.0,
        speed: knots(2100.0),
    };
    let firestorm = Craft {
        name: "FIRESTORM-1".into(),
        position: GeoPoint::from_degrees(-105.0, 35.0),
        status: CraftStatus::Out,
        destination: Some(GeoPoint::from_degrees(-95.0, 15.0)),
        meet_point: None,
        radar_range: 900.0,
        speed: knots(4200.0),
    };

    let ufo = |name: &str, position, status, destination, hunter_killer| Ufo {
        name: name.into(),
        position,
        status,
        destination,
        detected: true,
        hyper_detected: hunter_killer,
        hunter_killer,
        hunting: hunter_killer,
        radar_range: if hunter_killer { 800.0 } else { 0.0 },
        speed: knots(1800.0),
    };
    let mut hidden = ufo("UFO-4", GeoPoint::from_degrees(100.0, 10.0), UfoStatus::Flying, None, false);
    hidden.detected = false;

    World {
        time: GameTime::new(1999, 3, 14, 9, 30, 0),
        bases: vec![
            Base {
                name: "Albion".into(),
                position: london,
                facilities: vec![
                    facility("STR_ACCESS_LIFT", 0),
                    facility("STR_HANGAR", 0),
                    facility("STR_SMALL_RADAR_SYSTEM", 0),
                    facility("STR_LARGE_RADAR_SYSTEM", 12),
                ],
                crafts: vec![skyranger, interceptor],
            },
            Base {
                name: "Mojave".into(),
                position: nevada,
                facilities: vec![facility("STR_ACCESS_LIFT", 0), facility("STR_LARGE_RADAR_SYSTEM", 0)],
                crafts: vec![firestorm],
            },
        ],
        ufos: vec![
            ufo("UFO-1", scout, UfoStatus::Flying, Some(GeoPoint::from_degrees(-60.0, 40.0)), false),
            ufo("UFO-2", hunter, UfoStatus::Flying, Some(nevada), true),
            ufo("UFO-3", GeoPoint::from_degrees(20.0, 5.0), UfoStatus::Landed, None, false),
            hidden,
        ],
        waypoints: vec![Waypoint { id: 1, position: GeoPoint::from_degrees(-40.0, 30.0) }],
        mission_sites: vec![MissionSite {
            name: "Terror Site-1".into(),
            position: GeoPoint::from_degrees(139.7, 35.7),
        }],
        alien_bases: vec![AlienBase {
            name: "Alien Base-1".into(),
            position: GeoPoint::from_degrees(-60.0, -10.0),
            discovered: true,
            detection_range: 600.0,
        }],
        globe: GlobeView { center: london, zoom: 1 },
        debug: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Target;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_sample_ruleset_is_consistent() {
        let ruleset = sample_ruleset(&Options::default());
        assert!(ruleset.has_land());
        for polygon in &ruleset.polygons {
            assert!(ruleset.texture(polygon.texture).is_some(), "texture {}", polygon.texture);
        }
        assert_eq!(ruleset.textures.len(), crate::data::texture_ramps().len());
        assert!(ruleset.facility("STR_LARGE_RADAR_SYSTEM").is_some());
    }

    #[test]
    fn test_sample_textures_pick_terrain() {
        let textures = textures();
        let mut rng = Pcg32::seed_from_u64(9);
        let forest = &textures[FOREST];
        let amazon = GeoPoint::from_degrees(-60.0, -5.0);
        let pick = forest.random_terrain(amazon, &mut rng);
        assert!(matches!(pick, Some("FOREST" | "JUNGLE")));
        assert!(textures[DESERT].random_deployment(&mut rng).is_some());
        // Polar bases only exist in the far south
        assert_eq!(textures[ICE].random_base_terrain(GeoPoint::from_degrees(0.0, 80.0), &mut rng), None);
        assert_eq!(
            textures[ICE].random_base_terrain(GeoPoint::from_degrees(0.0, -80.0), &mut rng),
            Some("XBASE_POLAR")
        );
    }

    #[test]
    fn test_sample_world_markers() {
        let world = sample_world();
        let markers: Vec<_> = world.marker_targets().filter_map(|t| t.marker()).collect();
        // Two bases, a waypoint, a site, an alien base, three seen UFOs and
        // two craft in flight
        assert_eq!(markers.len(), 10);
        assert_eq!(world.globe.zoom, 1);
    }
}
