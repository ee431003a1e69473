use std::f64::consts::PI;

use glam::DVec3;

use crate::geo::{normalize_lon, GeoPoint, ScreenPoint};
use crate::ruleset::Polygon;

/// Vertices further than this (as a dot product with the query point)
/// rule the whole polygon out of a containment test.
const POLYGON_DISCARD_COS: f64 = 0.75;

/// What the projection needs to know about the current view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    /// Geographic point under the globe centre.
    pub center: GeoPoint,
    /// Screen position of the globe centre.
    pub center_x: i32,
    pub center_y: i32,
    /// Index into the zoom radius table.
    pub zoom: usize,
    /// Globe radius in pixels. Usually `radii[zoom]`, but may lie between
    /// two table entries during a smooth dogfight zoom.
    pub radius: f64,
}

impl ViewState {
    pub fn new(center: GeoPoint, center_x: i32, center_y: i32, zoom: usize, radius: f64) -> Self {
        Self { center, center_x, center_y, zoom, radius }
    }

    /// Screen position of the globe centre.
    pub fn center_point(&self) -> ScreenPoint {
        ScreenPoint::new(self.center_x, self.center_y)
    }

    /// Orthographic projection to pixels, truncating towards negative
    /// infinity. Back-facing points still get a position; test with
    /// [`ViewState::is_back_facing`] first.
    #[inline(always)]
    pub fn to_screen(&self, p: GeoPoint) -> ScreenPoint {
        let (x, y) = self.offset(p);
        ScreenPoint::new(self.center_x + x.floor() as i32, self.center_y + y.floor() as i32)
    }

    /// Same projection without truncation.
    #[inline(always)]
    pub fn to_screen_f64(&self, p: GeoPoint) -> (f64, f64) {
        let (x, y) = self.offset(p);
        (self.center_x as f64 + x, self.center_y as f64 + y)
    }

    #[inline(always)]
    fn offset(&self, p: GeoPoint) -> (f64, f64) {
        let (sin_lat0, cos_lat0) = self.center.lat.sin_cos();
        let (sin_lat, cos_lat) = p.lat.sin_cos();
        let (sin_dlon, cos_dlon) = (p.lon - self.center.lon).sin_cos();
        let x = self.radius * cos_lat * sin_dlon;
        let y = self.radius * (cos_lat0 * sin_lat - sin_lat0 * cos_lat * cos_dlon);
        (x, y)
    }

    /// Inverse projection. The centre pixel maps back to the view centre;
    /// pixels off the disk produce a NaN point (see [`GeoPoint::is_nan`]).
    pub fn to_geo(&self, p: ScreenPoint) -> GeoPoint {
        let x = (p.x - self.center_x) as f64;
        let y = (p.y - self.center_y) as f64;
        let rho = (x * x + y * y).sqrt();
        if rho == 0.0 {
            return self.center;
        }

        let c = (rho / self.radius).asin();
        if c.is_nan() {
            return GeoPoint::new(f64::NAN, f64::NAN);
        }
        let (sin_c, cos_c) = c.sin_cos();
        let (sin_lat0, cos_lat0) = self.center.lat.sin_cos();

        let lat = (cos_c * sin_lat0 + y * sin_c * cos_lat0 / rho).asin();
        let lon = (x * sin_c).atan2(rho * cos_lat0 * cos_c - y * sin_lat0 * sin_c) + self.center.lon;
        GeoPoint::new(normalize_lon(lon), lat)
    }

    /// True when `p` lies on the hemisphere facing away from the viewer.
    #[inline(always)]
    pub fn is_back_facing(&self, p: GeoPoint) -> bool {
        self.center.angular_cos(p) < 0.0
    }
}

/// Squared pixel distance between two projected points.
#[inline(always)]
pub fn screen_distance_sq(a: ScreenPoint, b: ScreenPoint) -> i64 {
    a.distance_sq(b)
}

pub fn screen_distance(a: ScreenPoint, b: ScreenPoint) -> f64 {
    a.distance(b)
}

/// Depth of `p` along the view axis of a globe centred on `center`:
/// positive in front, negative behind.
#[inline(always)]
pub fn view_depth(center: GeoPoint, p: GeoPoint) -> f64 {
    center.angular_cos(p)
}

/// Whether `p` lies inside `polygon`.
///
/// The ring is projected onto the plane tangent to the sphere at `p` and a
/// ray is cast along +x. A polygon with any vertex too far from `p` is
/// rejected outright, which keeps the tangent-plane approximation sane.
pub fn polygon_contains(polygon: &Polygon, p: GeoPoint) -> bool {
    let n = polygon.points.len();
    if n < 3 {
        return false;
    }
    if polygon.points.iter().any(|&v| p.angular_cos(v) < POLYGON_DISCARD_COS) {
        return false;
    }

    let (sin_lat, cos_lat) = p.lat.sin_cos();
    let tangent = |v: GeoPoint| {
        let (sin_vlat, cos_vlat) = v.lat.sin_cos();
        let (sin_d, cos_d) = (v.lon - p.lon).sin_cos();
        (cos_vlat * sin_d, cos_lat * sin_vlat - sin_lat * cos_vlat * cos_d)
    };

    let mut odd = false;
    for i in 0..n {
        let (x, y) = tangent(polygon.points[i]);
        let (x2, y2) = tangent(polygon.points[(i + 1) % n]);
        if (y > 0.0) != (y2 > 0.0) && 0.0 < (x2 - x) * (0.0 - y) / (y2 - y) + x {
            odd = !odd;
        }
    }
    odd
}

/// The first polygon containing `p`, or `None` over open water.
pub fn polygon_containing(polygons: &[Polygon], p: GeoPoint) -> Option<&Polygon> {
    polygons.iter().find(|poly| polygon_contains(poly, p))
}

/// Unit sphere normal under pixel (x, y) of a disk of radius `r` centred on
/// (ox, oy). Zero outside the disk.
#[inline(always)]
pub fn earth_normal(ox: f64, oy: f64, r: f64, x: f64, y: f64) -> DVec3 {
    let nx = (x - ox) / r;
    let ny = (y - oy) / r;
    let temp = nx * nx + ny * ny;
    if temp < 1.0 {
        DVec3::new(nx, ny, (1.0 - temp).sqrt())
    } else {
        DVec3::ZERO
    }
}

/// Point at `distance` radians from `origin` along `azimuth`.
#[inline(always)]
pub fn destination_point(origin: GeoPoint, distance: f64, azimuth: f64) -> GeoPoint {
    let (sin_lat, cos_lat) = origin.lat.sin_cos();
    let (sin_r, cos_r) = distance.sin_cos();
    let lat = (sin_lat * cos_r + cos_lat * sin_r * azimuth.cos()).asin();
    let lon = origin.lon + (azimuth.sin() * sin_r * cos_lat).atan2(cos_r - sin_lat * lat.sin());
    GeoPoint::new(lon, lat)
}

/// Longitude span from `lon1` eastwards to `lon2`, in [0, 2π).
pub fn eastward_span(lon1: f64, lon2: f64) -> f64 {
    let span = lon2 - lon1;
    if span < 0.0 {
        span + 2.0 * PI
    } else {
        span
    }
}
