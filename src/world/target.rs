use std::borrow::Cow;

use crate::geo::GeoPoint;
use crate::ruleset::City;
use crate::world::{AlienBase, Base, Craft, MissionSite, Ufo, Waypoint};

pub const BASE_MARKER: usize = 0;
pub const CRAFT_MARKER: usize = 1;
pub const UFO_FLYING_MARKER: usize = 2;
pub const UFO_LANDED_MARKER: usize = 3;
pub const UFO_CRASHED_MARKER: usize = 4;
pub const ALIEN_BASE_MARKER: usize = 5;
pub const WAYPOINT_MARKER: usize = 6;
pub const MISSION_SITE_MARKER: usize = 7;
pub const CITY_MARKER: usize = 8;
pub const MARKER_COUNT: usize = 9;

/// What the globe needs from anything it draws or picks.
pub trait Target {
    fn position(&self) -> GeoPoint;
    /// Marker sprite id, or `None` when the target is not shown on the globe.
    fn marker(&self) -> Option<usize>;
    fn name(&self) -> Cow<'_, str>;
}

/// A borrowed globe target of any kind.
#[derive(Clone, Copy, Debug)]
pub enum TargetRef<'a> {
    Base(&'a Base),
    Craft(&'a Craft),
    Ufo(&'a Ufo),
    Waypoint(&'a Waypoint),
    MissionSite(&'a MissionSite),
    AlienBase(&'a AlienBase),
    City(&'a City),
}

impl TargetRef<'_> {
    fn inner(&self) -> &dyn Target {
        match self {
            TargetRef::Base(t) => *t,
            TargetRef::Craft(t) => *t,
            TargetRef::Ufo(t) => *t,
            TargetRef::Waypoint(t) => *t,
            TargetRef::MissionSite(t) => *t,
            TargetRef::AlienBase(t) => *t,
            TargetRef::City(t) => *t,
        }
    }

    pub fn is_craft(&self) -> bool {
        matches!(self, TargetRef::Craft(_))
    }
}

impl Target for TargetRef<'_> {
    fn position(&self) -> GeoPoint {
        self.inner().position()
    }

    fn marker(&self) -> Option<usize> {
        self.inner().marker()
    }

    fn name(&self) -> Cow<'_, str> {
        self.inner().name()
    }
}

impl Target for City {
    fn position(&self) -> GeoPoint {
        self.position
    }

    fn marker(&self) -> Option<usize> {
        Some(CITY_MARKER)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}
