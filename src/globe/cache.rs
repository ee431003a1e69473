use crate::geo::ScreenPoint;
use crate::globe::projection::{view_depth, ViewState};
use crate::ruleset::Polygon;

/// A land polygon projected for the current view.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedPolygon {
    pub texture: usize,
    pub points: Vec<ScreenPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// The cache matches the view it was last built for.
    Clean,
    /// The view moved; rebuild before drawing.
    Dirty,
}

/// Screen-space copies of the visible land polygons.
///
/// Never patched in place: a rebuild projects into a fresh list and swaps
/// it in whole, so readers see either the old view or the new one.
pub struct PolygonCache {
    state: CacheState,
    generation: u64,
    polygons: Vec<CachedPolygon>,
}

impl PolygonCache {
    pub fn new() -> Self {
        Self {
            state: CacheState::Dirty,
            generation: 0,
            polygons: Vec::new(),
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Bumped on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn polygons(&self) -> &[CachedPolygon] {
        &self.polygons
    }

    pub fn invalidate(&mut self) {
        self.state = CacheState::Dirty;
    }

    /// Rebuild only if the view changed since the last build.
    pub fn ensure_fresh(&mut self, source: &[Polygon], view: &ViewState) {
        if self.state == CacheState::Dirty {
            self.rebuild(source, view);
        }
    }

    /// Reproject every polygon that reaches the front hemisphere.
    pub fn rebuild(&mut self, source: &[Polygon], view: &ViewState) {
        let polygons: Vec<CachedPolygon> = source
            .iter()
            .filter(|poly| faces_viewer(poly, view))
            .map(|poly| CachedPolygon {
                texture: poly.texture,
                points: poly.points.iter().map(|&p| view.to_screen(p)).collect(),
            })
            .collect();

        tracing::trace!(kept = polygons.len(), total = source.len(), "polygon cache rebuilt");
        self.polygons = polygons;
        self.generation += 1;
        self.state = CacheState::Clean;
    }
}

impl Default for PolygonCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A polygon is dropped when its furthest vertex behind the globe is
/// deeper than its nearest vertex in front of it.
fn faces_viewer(polygon: &Polygon, view: &ViewState) -> bool {
    let mut closest = 0.0f64;
    let mut furthest = 0.0f64;
    for &p in &polygon.points {
        let z = view_depth(view.center, p);
        if z > closest {
            closest = z;
        } else if z < furthest {
            furthest = z;
        }
    }
    -furthest <= closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use std::f64::consts::PI;

    fn view(lon: f64) -> ViewState {
        ViewState::new(GeoPoint::new(lon, 0.0), 100, 100, 0, 50.0)
    }

    fn quad(lon: f64, lat: f64, half: f64, texture: usize) -> Polygon {
        Polygon::new(
            vec![
                GeoPoint::new(lon - half, lat - half),
                GeoPoint::new(lon + half, lat - half),
                GeoPoint::new(lon + half, lat + half),
                GeoPoint::new(lon - half, lat + half),
            ],
            texture,
        )
    }

    #[test]
    fn test_starts_dirty() {
        let mut cache = PolygonCache::new();
        assert_eq!(cache.state(), CacheState::Dirty);
        cache.ensure_fresh(&[], &view(0.0));
        assert_eq!(cache.state(), CacheState::Clean);
        assert_eq!(cache.generation(), 1);
        cache.ensure_fresh(&[], &view(0.0));
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn test_culls_polygon_91_degrees_away() {
        let far = 91f64.to_radians();
        let ring = Polygon::new(
            vec![
                GeoPoint::new(far, 0.0),
                GeoPoint::new(PI, PI - far),
                GeoPoint::new(-far, 0.0),
                GeoPoint::new(PI, far - PI),
            ],
            1,
        );
        let v = view(0.0);
        for &p in &ring.points {
            assert!(v.center.angular_distance(p) >= far - 1e-9, "{p:?}");
        }

        let mut cache = PolygonCache::new();
        cache.rebuild(&[ring], &v);
        assert!(cache.polygons().is_empty());
    }

    #[test]
    fn test_rebuild_matches_fresh_projection() {
        let source = vec![quad(0.1, 0.0, 0.05, 3), quad(3.0, 0.0, 0.05, 4), quad(1.5, 0.3, 0.1, 5)];
        let mut cache = PolygonCache::new();

        cache.rebuild(&source, &view(0.0));
        let first: Vec<usize> = cache.polygons().iter().map(|p| p.texture).collect();
        assert_eq!(first, vec![3, 5]);

        // Move the view; every surviving entry must use the new projection
        let moved = view(2.9);
        cache.invalidate();
        cache.ensure_fresh(&source, &moved);
        assert_eq!(cache.generation(), 2);
        let textures: Vec<usize> = cache.polygons().iter().map(|p| p.texture).collect();
        assert_eq!(textures, vec![4, 5]);
        for cached in cache.polygons() {
            let poly = source.iter().find(|p| p.texture == cached.texture).map(|p| &p.points);
            let expected: Vec<ScreenPoint> = poly.into_iter().flatten().map(|&p| moved.to_screen(p)).collect();
            assert_eq!(cached.points, expected);
        }
    }
}
