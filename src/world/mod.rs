//! The live campaign state the globe reads from: time of day, player bases
//! and craft, alien activity, and the persisted view.

mod target;
mod time;

pub use target::*;
pub use time::{is_leap_year, GameTime};

use std::borrow::Cow;

use crate::geo::{normalize_lon, GeoPoint};

/// Globe view persisted with the campaign.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobeView {
    pub center: GeoPoint,
    pub zoom: usize,
}

#[derive(Clone, Debug)]
pub struct BaseFacility {
    /// Name of the facility rule.
    pub rule: String,
    /// Days left until construction completes.
    pub build_time: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CraftStatus {
    Ready,
    Out,
    Refuelling,
    Repairs,
}

#[derive(Clone, Debug)]
pub struct Craft {
    pub name: String,
    pub position: GeoPoint,
    pub status: CraftStatus,
    pub destination: Option<GeoPoint>,
    /// Intercept point when the destination is itself moving.
    pub meet_point: Option<GeoPoint>,
    /// Nautical miles.
    pub radar_range: f64,
    /// Radians per game second.
    pub speed: f64,
}

impl Target for Craft {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        (self.status == CraftStatus::Out).then_some(CRAFT_MARKER)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

#[derive(Clone, Debug)]
pub struct Base {
    pub name: String,
    pub position: GeoPoint,
    pub facilities: Vec<BaseFacility>,
    pub crafts: Vec<Craft>,
}

impl Base {
    /// Bases sit at exactly (0, 0) until the player places them.
    pub fn is_placed(&self) -> bool {
        !(self.position.lon == 0.0 && self.position.lat == 0.0)
    }
}

impl Target for Base {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        self.is_placed().then_some(BASE_MARKER)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UfoStatus {
    Flying,
    Landed,
    Crashed,
    /// Removed from play but not yet cleaned up.
    Ignored,
}

#[derive(Clone, Debug)]
pub struct Ufo {
    pub name: String,
    pub position: GeoPoint,
    pub status: UfoStatus,
    pub destination: Option<GeoPoint>,
    pub detected: bool,
    pub hyper_detected: bool,
    pub hunter_killer: bool,
    pub hunting: bool,
    pub radar_range: f64,
    pub speed: f64,
}

impl Target for Ufo {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        if !self.detected {
            return None;
        }
        match self.status {
            UfoStatus::Flying => Some(UFO_FLYING_MARKER),
            UfoStatus::Landed => Some(UFO_LANDED_MARKER),
            UfoStatus::Crashed => Some(UFO_CRASHED_MARKER),
            UfoStatus::Ignored => None,
        }
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

#[derive(Clone, Debug)]
pub struct Waypoint {
    pub id: u32,
    pub position: GeoPoint,
}

impl Target for Waypoint {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        Some(WAYPOINT_MARKER)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("Waypoint-{}", self.id))
    }
}

#[derive(Clone, Debug)]
pub struct MissionSite {
    pub name: String,
    pub position: GeoPoint,
}

impl Target for MissionSite {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        Some(MISSION_SITE_MARKER)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

#[derive(Clone, Debug)]
pub struct AlienBase {
    pub name: String,
    pub position: GeoPoint,
    pub discovered: bool,
    /// Nautical miles; 0 when the base has no detection radar.
    pub detection_range: f64,
}

impl Target for AlienBase {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        self.discovered.then_some(ALIEN_BASE_MARKER)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

/// Which debug rectangles the globe overlays in debug mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebugOverlay {
    #[default]
    Countries,
    Regions,
    MissionZones,
}

impl DebugOverlay {
    pub fn next(self) -> Self {
        match self {
            DebugOverlay::Countries => DebugOverlay::Regions,
            DebugOverlay::Regions => DebugOverlay::MissionZones,
            DebugOverlay::MissionZones => DebugOverlay::Countries,
        }
    }
}

/// Debug overlay selection; `None`/0 filters mean "show all".
#[derive(Clone, Debug, Default)]
pub struct DebugState {
    pub enabled: bool,
    pub overlay: DebugOverlay,
    pub country: Option<usize>,
    pub region: Option<usize>,
    pub zone: usize,
    pub area: usize,
}

impl DebugState {
    /// Switch debug mode. Switching it off moves to the next overlay, so
    /// toggling twice cycles what is shown.
    pub fn toggle(&mut self) {
        if self.enabled {
            self.overlay = self.overlay.next();
        }
        self.enabled = !self.enabled;
    }
}

#[derive(Clone, Debug, Default)]
pub struct World {
    pub time: GameTime,
    pub bases: Vec<Base>,
    pub ufos: Vec<Ufo>,
    pub waypoints: Vec<Waypoint>,
    pub mission_sites: Vec<MissionSite>,
    pub alien_bases: Vec<AlienBase>,
    pub globe: GlobeView,
    pub debug: DebugState,
}

impl World {
    pub fn crafts(&self) -> impl Iterator<Item = &Craft> {
        self.bases.iter().flat_map(|b| b.crafts.iter())
    }

    /// Every target that can carry a marker, in marker draw order.
    pub fn marker_targets(&self) -> impl Iterator<Item = TargetRef<'_>> {
        let bases = self.bases.iter().map(TargetRef::Base);
        let waypoints = self.waypoints.iter().map(TargetRef::Waypoint);
        let sites = self.mission_sites.iter().map(TargetRef::MissionSite);
        let alien_bases = self.alien_bases.iter().map(TargetRef::AlienBase);
        let ufos = self
            .ufos
            .iter()
            .filter(|u| u.status != UfoStatus::Ignored)
            .map(TargetRef::Ufo);
        let crafts = self.crafts().map(TargetRef::Craft);
        bases.chain(waypoints).chain(sites).chain(alien_bases).chain(ufos).chain(crafts)
    }

    /// Candidates for picking. Skips unplaced bases, craft docked at their
    /// base, `current` (the craft being redirected), unseen UFOs and
    /// undiscovered alien bases.
    pub fn pickable_targets<'a>(&'a self, current: Option<&'a Craft>) -> Vec<TargetRef<'a>> {
        let mut out = Vec::new();
        for base in &self.bases {
            if !base.is_placed() {
                continue;
            }
            out.push(TargetRef::Base(base));
            for craft in &base.crafts {
                if current.is_some_and(|c| std::ptr::eq(c, craft)) {
                    continue;
                }
                if craft.position == base.position && craft.destination.is_none() {
                    continue;
                }
                out.push(TargetRef::Craft(craft));
            }
        }
        out.extend(
            self.ufos
                .iter()
                .filter(|u| u.detected && u.status != UfoStatus::Ignored)
                .map(TargetRef::Ufo),
        );
        out.extend(self.waypoints.iter().map(TargetRef::Waypoint));
        out.extend(self.mission_sites.iter().map(TargetRef::MissionSite));
        out.extend(self.alien_bases.iter().filter(|a| a.discovered).map(TargetRef::AlienBase));
        out
    }

    /// Advance the simulation: the clock, and everything flying towards a
    /// destination along a great circle.
    pub fn advance(&mut self, seconds: u64) {
        self.time.advance_seconds(seconds);
        let dt = seconds as f64;

        for craft in self.bases.iter_mut().flat_map(|b| b.crafts.iter_mut()) {
            if craft.status != CraftStatus::Out {
                continue;
            }
            if let Some(dest) = craft.destination {
                if step_towards(&mut craft.position, dest, craft.speed * dt) {
                    craft.destination = None;
                    craft.meet_point = None;
                }
            }
        }

        for ufo in &mut self.ufos {
            if ufo.status != UfoStatus::Flying {
                continue;
            }
            if let Some(dest) = ufo.destination {
                if step_towards(&mut ufo.position, dest, ufo.speed * dt) {
                    ufo.destination = None;
                    ufo.status = UfoStatus::Landed;
                }
            }
        }
    }
}

/// Move `pos` by `step` radians along the great circle to `dest`.
/// Returns true on arrival.
fn step_towards(pos: &mut GeoPoint, dest: GeoPoint, step: f64) -> bool {
    let angle = pos.angular_distance(dest);
    if angle <= step || angle < 1e-9 {
        *pos = dest;
        return true;
    }

    let a = pos.to_cord();
    let b = dest.to_cord();
    let t = step / angle;
    let sin_angle = angle.sin();
    let p = if sin_angle.abs() < 1e-10 {
        // Antipodal: any great circle works, nudge through the pole
        a.lerp(b, t)
    } else {
        a * (((1.0 - t) * angle).sin() / sin_angle) + b * ((t * angle).sin() / sin_angle)
    };
    let next = GeoPoint::from_cord(p);
    *pos = GeoPoint::new(normalize_lon(next.lon), next.lat);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn craft(position: GeoPoint, status: CraftStatus, destination: Option<GeoPoint>) -> Craft {
        Craft {
            name: "SKYRANGER-1".into(),
            position,
            status,
            destination,
            meet_point: None,
            radar_range: 600.0,
            speed: 0.001,
        }
    }

    #[test]
    fn test_pickable_filters() {
        let home = GeoPoint::new(1.0, 0.2);
        let world = World {
            bases: vec![
                Base {
                    name: "Unplaced".into(),
                    position: GeoPoint::default(),
                    facilities: vec![],
                    crafts: vec![],
                },
                Base {
                    name: "Home".into(),
                    position: home,
                    facilities: vec![],
                    crafts: vec![
                        craft(home, CraftStatus::Ready, None),
                        craft(GeoPoint::new(1.1, 0.2), CraftStatus::Out, Some(home)),
                    ],
                },
            ],
            ufos: vec![Ufo {
                name: "UFO-1".into(),
                position: GeoPoint::new(2.0, 0.0),
                status: UfoStatus::Flying,
                destination: None,
                detected: false,
                hyper_detected: false,
                hunter_killer: false,
                hunting: false,
                radar_range: 0.0,
                speed: 0.0,
            }],
            ..Default::default()
        };

        let picks = world.pickable_targets(None);
        assert_eq!(picks.len(), 2);
        assert!(matches!(picks[0], TargetRef::Base(b) if b.name == "Home"));
        assert!(picks[1].is_craft());

        let current = &world.bases[1].crafts[1];
        assert_eq!(world.pickable_targets(Some(current)).len(), 1);
    }

    #[test]
    fn test_craft_arrives() {
        let dest = GeoPoint::new(0.5, 0.1);
        let mut world = World::default();
        world.bases.push(Base {
            name: "Home".into(),
            position: GeoPoint::new(0.4, 0.1),
            facilities: vec![],
            crafts: vec![craft(GeoPoint::new(0.4, 0.1), CraftStatus::Out, Some(dest))],
        });

        world.advance(10);
        let pos = world.bases[0].crafts[0].position;
        assert!(pos.angular_distance(dest) < 0.1);
        assert!(world.bases[0].crafts[0].destination.is_some());

        world.advance(1000);
        assert!(world.bases[0].crafts[0].destination.is_none());
        assert_eq!(world.bases[0].crafts[0].position, dest);
    }

    #[test]
    fn test_markers_follow_visibility() {
        let mut base = Base {
            name: "b".into(),
            position: GeoPoint::default(),
            facilities: vec![],
            crafts: vec![],
        };
        assert_eq!(base.marker(), None);
        base.position = GeoPoint::new(0.1, 0.0);
        assert_eq!(base.marker(), Some(BASE_MARKER));

        let docked = craft(base.position, CraftStatus::Ready, None);
        assert_eq!(docked.marker(), None);
    }

    #[test]
    fn test_debug_toggle_cycles_overlay_on_exit() {
        let mut debug = DebugState::default();
        debug.toggle();
        assert!(debug.enabled);
        assert_eq!(debug.overlay, DebugOverlay::Countries);
        debug.toggle();
        assert!(!debug.enabled);
        assert_eq!(debug.overlay, DebugOverlay::Regions);
    }
}
