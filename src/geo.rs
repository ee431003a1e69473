use glam::DVec3;
use std::f64::consts::{PI, TAU};

/// A position on the globe in radians.
/// Longitude grows eastwards, latitude is positive towards the south pole
/// (screen y grows downwards, so the ruleset stores latitudes flipped).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Build from degrees, as found in map data (north-positive latitude).
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon.to_radians(), -lat.to_radians())
    }

    /// Longitude and latitude in degrees, north-positive.
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), -self.lat.to_degrees())
    }

    /// Same point with longitude wrapped into [0, 2π).
    pub fn normalized(self) -> Self {
        Self::new(normalize_lon(self.lon), self.lat)
    }

    /// True for the sentinel produced by unprojecting a point off the disk.
    pub fn is_nan(self) -> bool {
        self.lon.is_nan() || self.lat.is_nan()
    }

    /// The point on the opposite side of the sphere.
    pub fn antipode(self) -> Self {
        Self::new(normalize_lon(self.lon + PI), -self.lat)
    }

    /// Cosine of the angular distance to `other` (the unit-vector dot product).
    #[inline(always)]
    pub fn angular_cos(self, other: GeoPoint) -> f64 {
        self.lat.cos() * other.lat.cos() * (other.lon - self.lon).cos()
            + self.lat.sin() * other.lat.sin()
    }

    /// Great-circle distance to `other` in radians.
    pub fn angular_distance(self, other: GeoPoint) -> f64 {
        self.angular_cos(other).clamp(-1.0, 1.0).acos()
    }

    /// Unit vector for this point, in the globe's cartesian frame.
    #[inline(always)]
    pub fn to_cord(self) -> DVec3 {
        DVec3::new(
            self.lon.sin() * self.lat.cos(),
            self.lat.sin(),
            self.lon.cos() * self.lat.cos(),
        )
    }

    /// Inverse of [`GeoPoint::to_cord`]; the vector need not be normalized.
    #[inline(always)]
    pub fn from_cord(cord: DVec3) -> Self {
        let inv = 1.0 / cord.length();
        Self::new(cord.x.atan2(cord.z), (cord.y * inv).clamp(-1.0, 1.0).asin())
    }
}

/// A projected pixel position. Always derived from a [`GeoPoint`] and the
/// current view, never stored as the source of truth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared pixel distance; hot paths compare against squared radii.
    #[inline(always)]
    pub fn distance_sq(self, other: ScreenPoint) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: ScreenPoint) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }
}

/// Normalize longitude into [0, 2π).
#[inline(always)]
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Convert a range in nautical miles into an angle in radians
/// (one nautical mile is one arc minute).
#[inline(always)]
pub fn nautical(miles: f64) -> f64 {
    (miles / 60.0).to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b}");
    }

    #[test]
    fn test_normalize_lon() {
        assert_close(normalize_lon(-PI / 2.0), 1.5 * PI, 1e-12);
        assert_close(normalize_lon(TAU + 0.25), 0.25, 1e-12);
        assert!(normalize_lon(-1e-18) < TAU);
    }

    #[test]
    fn test_cord_round_trip() {
        let p = GeoPoint::new(1.2, -0.4);
        let q = GeoPoint::from_cord(p.to_cord());
        assert_close(q.lon, p.lon, 1e-12);
        assert_close(q.lat, p.lat, 1e-12);
    }

    #[test]
    fn test_antipode_distance() {
        let p = GeoPoint::new(0.3, 0.7);
        assert_close(p.angular_distance(p.antipode()), PI, 1e-9);
        assert_close(p.angular_distance(p), 0.0, 1e-6);
    }

    #[test]
    fn test_nautical() {
        // 60 nautical miles per degree
        assert_close(nautical(60.0), 1f64.to_radians(), 1e-15);
    }

    #[test]
    fn test_degrees_flip_latitude() {
        let p = GeoPoint::from_degrees(90.0, 45.0);
        assert!(p.lat < 0.0);
        let (lon, lat) = p.to_degrees();
        assert_close(lon, 90.0, 1e-9);
        assert_close(lat, 45.0, 1e-9);
    }
}
