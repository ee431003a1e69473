//! The geoscape globe: view state, zoom, rotation, drag-scrolling, target
//! picking, and the frame renderer tying the passes together.

mod cache;
mod projection;
mod render;
mod scroll;
mod shade;

pub use cache::{CacheState, CachedPolygon, PolygonCache};
pub use projection::{
    destination_point, earth_normal, eastward_span, polygon_contains, polygon_containing,
    screen_distance, screen_distance_sq, view_depth, ViewState,
};
pub use render::{
    draw_globe_circle, draw_shaded_line, Label, Layers, MarkerSet, NormalGrid, RadarOverlay,
    TextureSet, MAX_DRAW_RADAR_CIRCLE_RADIUS,
};
pub use scroll::{Click, DragScroll, Motion, ScrollSettings, ROTATE_LATITUDE, ROTATE_LONGITUDE};
pub use shade::{sun_direction, world_shade, ShadeTable, ShadowPalette, MAX_SHADE, NOISE_SIZE};

use crate::config::KeyBindings;
use crate::geo::{GeoPoint, ScreenPoint};
use crate::input::{MouseAction, MouseButton, MouseKind};
use crate::ruleset::Ruleset;
use crate::surface::Surface;
use crate::world::{Craft, GameTime, GlobeView, Target, TargetRef, World};

pub const ZOOM_LEVELS: usize = 6;
/// Globe radius at each zoom level, as a fraction of the view height.
pub const ZOOM_FACTORS: [f64; ZOOM_LEVELS] = [0.45, 0.60, 0.90, 1.40, 2.25, 3.60];
/// Zoom level used during dogfights.
pub const DOGFIGHT_ZOOM: usize = 3;
/// Squared pixel distance within which a click picks a target.
pub const NEAR_RADIUS: i64 = 25;

const ROTATE_INTERVAL_MS: u64 = 10;
const BLINK_INTERVAL_MS: u64 = 100;

/// Globe behaviour switches, taken from the user options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobeSettings {
    pub scroll: ScrollSettings,
    pub detail: bool,
    pub radar_lines: bool,
    pub flight_paths: bool,
    pub seasons: bool,
    pub surface_cache: bool,
    pub all_radars_on_base_build: bool,
    pub ocean_shading: bool,
}

/// Repeating interval driven by elapsed time.
#[derive(Clone, Copy, Debug)]
struct Ticker {
    interval_ms: u64,
    elapsed_ms: u64,
    running: bool,
}

impl Ticker {
    fn new(interval_ms: u64, running: bool) -> Self {
        Self { interval_ms, elapsed_ms: 0, running }
    }

    fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.elapsed_ms = 0;
        }
    }

    fn stop(&mut self) {
        self.running = false;
    }

    /// Number of intervals that completed during `elapsed_ms`.
    fn advance(&mut self, elapsed_ms: u64) -> u64 {
        if !self.running {
            return 0;
        }
        self.elapsed_ms += elapsed_ms;
        let ticks = self.elapsed_ms / self.interval_ms;
        self.elapsed_ms %= self.interval_ms;
        ticks
    }
}

/// Result of feeding a mouse event to the globe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlobeEvent {
    /// Nothing for the caller to do.
    Ignored,
    /// Cursor over the globe. `x`/`y` is where the cursor should be
    /// shown, which stays at the drag anchor while scrolling.
    Hover { x: i32, y: i32, point: GeoPoint },
    /// A button went down over the globe.
    Pressed { point: GeoPoint },
    /// A click made it through drag-scroll resolution.
    Clicked {
        x: i32,
        y: i32,
        point: GeoPoint,
        button: MouseButton,
    },
}

/// Keep the front-facing `candidates` within [`NEAR_RADIUS`] of `at`.
pub fn pick_near<T: Target>(view: &ViewState, at: ScreenPoint, candidates: impl IntoIterator<Item = T>) -> Vec<T> {
    candidates
        .into_iter()
        .filter(|t| {
            let p = t.position();
            !view.is_back_facing(p) && view.to_screen(p).distance_sq(at) <= NEAR_RADIUS
        })
        .collect()
}

pub struct Globe {
    width: usize,
    height: usize,
    center_x: i32,
    center_y: i32,
    center: GeoPoint,
    zoom: usize,
    zoom_old: usize,
    radii: [f64; ZOOM_LEVELS],
    radius: f64,
    radius_step: f64,
    rot_lon: f64,
    rot_lat: f64,
    rotate_timer: Ticker,
    blink_timer: Ticker,
    blink: bool,
    cache: PolygonCache,
    normals: Vec<NormalGrid>,
    layers: Layers,
    frame: Surface,
    textures: TextureSet,
    markers: MarkerSet,
    shade: &'static ShadeTable,
    scroll: DragScroll,
    settings: GlobeSettings,
    craft_range: Option<(GeoPoint, f64)>,
    new_base_hover: bool,
    hover_pos: GeoPoint,
}

impl Globe {
    /// Build a globe of `width` x `height` pixels restoring the saved view.
    pub fn new(width: usize, height: usize, settings: GlobeSettings, saved: GlobeView, textures: TextureSet) -> Self {
        let mut globe = Self {
            width,
            height,
            center_x: (width / 2) as i32,
            center_y: (height / 2) as i32,
            center: saved.center,
            zoom: saved.zoom.min(ZOOM_LEVELS - 1),
            zoom_old: 0,
            radii: [0.0; ZOOM_LEVELS],
            radius: 0.0,
            radius_step: 0.0,
            rot_lon: 0.0,
            rot_lat: 0.0,
            rotate_timer: Ticker::new(ROTATE_INTERVAL_MS, false),
            blink_timer: Ticker::new(BLINK_INTERVAL_MS, true),
            blink: true,
            cache: PolygonCache::new(),
            normals: Vec::new(),
            layers: Layers::new(width, height),
            frame: Surface::new(width, height),
            textures,
            markers: MarkerSet::generate(),
            shade: ShadeTable::global(),
            scroll: DragScroll::new(),
            settings,
            craft_range: None,
            new_base_hover: false,
            hover_pos: GeoPoint::default(),
        };
        globe.setup_radii();
        globe
    }

    pub fn view(&self) -> ViewState {
        ViewState::new(self.center, self.center_x, self.center_y, self.zoom, self.radius)
    }

    pub fn center_point(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> usize {
        self.zoom
    }

    pub fn zoom_levels(&self) -> usize {
        self.radii.len()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn settings(&self) -> &GlobeSettings {
        &self.settings
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_scrolling()
    }

    pub fn blink_on(&self) -> bool {
        self.blink
    }

    pub fn cache(&self) -> &PolygonCache {
        &self.cache
    }

    /// The last composited frame.
    pub fn frame(&self) -> &Surface {
        &self.frame
    }

    /// Mark the projected polygons stale.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    fn setup_radii(&mut self) {
        let height = self.height as f64;
        for (r, factor) in self.radii.iter_mut().zip(ZOOM_FACTORS) {
            *r = factor * height;
        }
        self.radius = self.radii[self.zoom];
        self.radius_step = (self.radii[DOGFIGHT_ZOOM] - self.radii[0]) / 10.0;

        self.normals = if self.settings.surface_cache {
            self.radii
                .iter()
                .map(|&r| NormalGrid::new(self.width, self.height, r))
                .collect()
        } else {
            Vec::new()
        };
    }

    /// Fit the globe to a new drawing area.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.layers.resize(width, height);
        self.frame.resize(width, height);
        self.center_x = (width / 2) as i32;
        self.center_y = (height / 2) as i32;
        self.setup_radii();
        self.invalidate();
        tracing::debug!(width, height, "globe resized");
    }

    /// Change the zoom level, clamped to the available levels. The texture
    /// detail offset is not stored; `draw` derives it from the zoom each
    /// frame through [`TextureSet::zoom_offset`].
    pub fn set_zoom(&mut self, zoom: usize, saved: &mut GlobeView) {
        self.zoom = zoom.min(self.radii.len() - 1);
        self.radius = self.radii[self.zoom];
        saved.zoom = self.zoom;
        self.scroll.reanchor(self.center);
        self.invalidate();
    }

    pub fn zoom_in(&mut self, saved: &mut GlobeView) {
        if self.zoom < self.radii.len() - 1 {
            self.set_zoom(self.zoom + 1, saved);
        }
    }

    pub fn zoom_out(&mut self, saved: &mut GlobeView) {
        if self.zoom > 0 {
            self.set_zoom(self.zoom - 1, saved);
        }
    }

    pub fn zoom_min(&mut self, saved: &mut GlobeView) {
        if self.zoom > 0 {
            self.set_zoom(0, saved);
        }
    }

    pub fn zoom_max(&mut self, saved: &mut GlobeView) {
        if self.zoom < self.radii.len() - 1 {
            self.set_zoom(self.radii.len() - 1, saved);
        }
    }

    /// Remember the zoom to return to after a dogfight.
    pub fn save_zoom_dogfight(&mut self) {
        self.zoom_old = self.zoom;
    }

    /// One step of the smooth zoom towards [`DOGFIGHT_ZOOM`]. Returns true
    /// once there.
    pub fn zoom_dogfight_in(&mut self, saved: &mut GlobeView) -> bool {
        if self.zoom >= DOGFIGHT_ZOOM {
            return true;
        }
        let radius = self.radius;
        if radius + self.radius_step >= self.radii[DOGFIGHT_ZOOM] {
            self.set_zoom(DOGFIGHT_ZOOM, saved);
        } else {
            if radius + self.radius_step >= self.radii[self.zoom + 1] {
                self.zoom += 1;
            }
            self.set_zoom(self.zoom, saved);
            self.radius = radius + self.radius_step;
        }
        false
    }

    /// One step of the smooth zoom back to the saved level. Returns true
    /// once there.
    pub fn zoom_dogfight_out(&mut self, saved: &mut GlobeView) -> bool {
        if self.zoom <= self.zoom_old {
            return true;
        }
        let radius = self.radius;
        if radius - self.radius_step <= self.radii[self.zoom_old] {
            self.set_zoom(self.zoom_old, saved);
        } else {
            if radius - self.radius_step <= self.radii[self.zoom - 1] {
                self.zoom -= 1;
            }
            self.set_zoom(self.zoom, saved);
            self.radius = radius - self.radius_step;
        }
        false
    }

    /// Turn the globe to put `p` in the middle.
    pub fn center(&mut self, p: GeoPoint, saved: &mut GlobeView) {
        self.center = p;
        saved.center = p;
        self.invalidate();
    }

    pub fn rotate_left(&mut self) {
        self.rot_lon = -ROTATE_LONGITUDE;
        self.rotate_timer.start();
    }

    pub fn rotate_right(&mut self) {
        self.rot_lon = ROTATE_LONGITUDE;
        self.rotate_timer.start();
    }

    pub fn rotate_up(&mut self) {
        self.rot_lat = -ROTATE_LATITUDE;
        self.rotate_timer.start();
    }

    pub fn rotate_down(&mut self) {
        self.rot_lat = ROTATE_LATITUDE;
        self.rotate_timer.start();
    }

    pub fn rotate_stop(&mut self) {
        self.rot_lon = 0.0;
        self.rot_lat = 0.0;
        self.rotate_timer.stop();
    }

    pub fn rotate_stop_lon(&mut self) {
        self.rot_lon = 0.0;
        if self.rot_lat == 0.0 {
            self.rotate_timer.stop();
        }
    }

    pub fn rotate_stop_lat(&mut self) {
        self.rot_lat = 0.0;
        if self.rot_lon == 0.0 {
            self.rotate_timer.stop();
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.rotate_timer.running
    }

    fn rotate(&mut self, saved: &mut GlobeView) {
        let speed = (110 - self.settings.scroll.scroll_speed) as f64 / 100.0;
        let zoom = (self.zoom + 1) as f64;
        let p = GeoPoint::new(
            self.center.lon + self.rot_lon * speed / zoom,
            self.center.lat + self.rot_lat * speed / zoom,
        );
        self.center(p, saved);
    }

    /// Run the rotation and blink timers for `elapsed_ms` of real time.
    pub fn advance(&mut self, elapsed_ms: u64, saved: &mut GlobeView) {
        if self.blink_timer.advance(elapsed_ms) % 2 == 1 {
            self.blink = !self.blink;
        }
        for _ in 0..self.rotate_timer.advance(elapsed_ms) {
            self.rotate(saved);
        }
    }

    pub fn toggle_detail(&mut self) -> bool {
        self.settings.detail = !self.settings.detail;
        self.settings.detail
    }

    pub fn toggle_radar_lines(&mut self) -> bool {
        self.settings.radar_lines = !self.settings.radar_lines;
        self.settings.radar_lines
    }

    /// Globe shortcuts. Returns true if the key was used.
    pub fn key_press(&mut self, key: char, keys: &KeyBindings) -> bool {
        if key == keys.toggle_detail {
            let on = self.toggle_detail();
            tracing::debug!(on, "detail toggled");
            true
        } else if key == keys.toggle_radar {
            let on = self.toggle_radar_lines();
            tracing::debug!(on, "radar lines toggled");
            true
        } else {
            false
        }
    }

    /// Show the range of a craft about to be dispatched; `range <= 0`
    /// hides it.
    pub fn set_craft_range(&mut self, p: GeoPoint, range: f64) {
        self.craft_range = (range > 0.0).then_some((p, range));
    }

    pub fn set_new_base_hover(&mut self, hover: bool) {
        self.new_base_hover = hover;
    }

    pub fn set_new_base_hover_pos(&mut self, p: GeoPoint) {
        self.hover_pos = p;
    }

    fn cursor_point(&self, x: i32, y: i32) -> GeoPoint {
        self.view().to_geo(ScreenPoint::new(x, y))
    }

    /// Route a mouse event to the matching handler.
    pub fn handle_mouse(&mut self, action: &MouseAction, saved: &mut GlobeView) -> GlobeEvent {
        match action.kind {
            MouseKind::Motion => self.mouse_over(action, saved),
            MouseKind::Press => self.mouse_press(action),
            MouseKind::Release => {
                self.mouse_release(action);
                self.mouse_click(action, saved)
            }
        }
    }

    pub fn mouse_over(&mut self, action: &MouseAction, saved: &mut GlobeView) -> GlobeEvent {
        let point = self.cursor_point(action.x, action.y);
        let motion = self.scroll.motion(action, self.center, self.zoom, &self.settings.scroll);
        match motion {
            Motion::Hover => {}
            Motion::Released { revert } => {
                if let Some(p) = revert {
                    self.center(p, saved);
                }
                return GlobeEvent::Ignored;
            }
            Motion::Pan { center } => self.center(center, saved),
        }

        let (x, y) = match self.scroll.cursor_anchor() {
            Some(anchor) => (anchor.x, anchor.y),
            None => (action.x, action.y),
        };
        if point.is_nan() {
            GlobeEvent::Ignored
        } else {
            GlobeEvent::Hover { x, y, point }
        }
    }

    pub fn mouse_press(&mut self, action: &MouseAction) -> GlobeEvent {
        let point = self.cursor_point(action.x, action.y);
        self.scroll.press(action, self.center, &self.settings.scroll);
        if point.is_nan() {
            GlobeEvent::Ignored
        } else {
            GlobeEvent::Pressed { point }
        }
    }

    /// Releases carry no state change of their own; the drag gesture is
    /// resolved by the click that follows.
    pub fn mouse_release(&mut self, action: &MouseAction) {
        if action.button == Some(self.settings.scroll.button) && self.scroll.is_scrolling() {
            tracing::trace!(x = action.x, y = action.y, "drag button released");
        }
    }

    pub fn mouse_click(&mut self, action: &MouseAction, saved: &mut GlobeView) -> GlobeEvent {
        match action.button {
            Some(MouseButton::WheelUp) => self.zoom_in(saved),
            Some(MouseButton::WheelDown) => self.zoom_out(saved),
            _ => {}
        }
        let point = self.cursor_point(action.x, action.y);

        let click = self.scroll.click(action, &self.settings.scroll);
        if let Some(p) = click.revert {
            self.center(p, saved);
        }
        if !click.proceed || point.is_nan() {
            return GlobeEvent::Ignored;
        }
        let Some(button) = action.button else {
            return GlobeEvent::Ignored;
        };
        if button == MouseButton::Right {
            self.center(point, saved);
        }
        GlobeEvent::Clicked {
            x: action.x,
            y: action.y,
            point,
            button,
        }
    }

    /// Targets drawn within reach of pixel (x, y).
    pub fn targets_at<'a>(
        &self,
        x: i32,
        y: i32,
        craft_only: bool,
        current: Option<&'a Craft>,
        world: &'a World,
    ) -> Vec<TargetRef<'a>> {
        let candidates = world
            .pickable_targets(current)
            .into_iter()
            .filter(|t| !craft_only || t.is_craft());
        pick_near(&self.view(), ScreenPoint::new(x, y), candidates)
    }

    /// True over land, not counting cosmetic ocean textures.
    pub fn inside_land(&self, ruleset: &Ruleset, p: GeoPoint) -> bool {
        match polygon_containing(&ruleset.polygons, p) {
            Some(polygon) => !ruleset.texture(polygon.texture).is_some_and(|t| t.is_ocean),
            None => false,
        }
    }

    pub fn inside_fake_underwater(&self, ruleset: &Ruleset, p: GeoPoint) -> bool {
        polygon_containing(&ruleset.polygons, p)
            .and_then(|polygon| ruleset.texture(polygon.texture))
            .is_some_and(|t| t.fake_underwater)
    }

    /// Texture id under `p` (`None` over open ocean) and the battle shade
    /// level of the time of day there.
    pub fn polygon_texture_and_shade(&self, ruleset: &Ruleset, time: &GameTime, p: GeoPoint) -> (Option<usize>, u8) {
        let sun = sun_direction(time, p.lon, p.lat, self.settings.seasons);
        let shade = world_shade(self.shade.compute_shade(glam::DVec3::Z, sun, 0));
        let texture = polygon_containing(&ruleset.polygons, p).map(|polygon| polygon.texture);
        (texture, shade)
    }

    /// Render a frame into [`Globe::frame`] and return the labels to print
    /// over it.
    pub fn draw(&mut self, world: &World, ruleset: &Ruleset) -> Vec<Label> {
        let view = self.view();
        self.cache.ensure_fresh(&ruleset.polygons, &view);

        let shadow = ShadowPalette {
            ocean: ruleset.colors.ocean,
            ocean_shading: self.settings.ocean_shading,
        };
        render::draw_ocean(&mut self.layers.globe, &view, ruleset.colors.ocean);
        render::draw_land(&mut self.layers.globe, self.cache.polygons(), &self.textures, self.zoom);

        let sun = sun_direction(&world.time, self.center.lon, self.center.lat, self.settings.seasons);
        let normals = match self.normals.get(self.zoom) {
            Some(grid) => render::Normals::Cached(grid),
            None => render::Normals::Computed(self.radii[self.zoom]),
        };
        render::draw_shadow(&mut self.layers.globe, &view, self.shade, shadow, sun, normals);

        let scene = render::Scene {
            view: &view,
            ruleset,
            world,
            shadow,
            overlay: RadarOverlay {
                craft: self.craft_range,
                new_base: self.new_base_hover.then_some(self.hover_pos),
            },
            radar_lines: self.settings.radar_lines,
            flight_paths: self.settings.flight_paths,
            detail: self.settings.detail,
            all_radars_on_base_build: self.settings.all_radars_on_base_build,
            blink: self.blink,
        };
        render::draw_radars(&scene, &self.layers.globe, &mut self.layers.radars);
        render::draw_flights(&scene, &self.layers.globe, &mut self.layers.radars);
        render::draw_markers(&scene, &self.markers, &mut self.layers.markers);
        let labels = render::draw_detail(&scene, &self.markers, &mut self.layers.countries);

        self.layers.composite(&mut self.frame);
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette;
    use crate::ruleset::{Polygon, Texture};
    use crate::world::{Base, CraftStatus};

    fn settings() -> GlobeSettings {
        GlobeSettings {
            scroll: ScrollSettings {
                button: MouseButton::Left,
                invert: false,
                time_tolerance_ms: 300,
                pixel_tolerance: 10,
                scroll_speed: 20,
            },
            detail: true,
            radar_lines: true,
            flight_paths: true,
            seasons: false,
            surface_cache: false,
            all_radars_on_base_build: false,
            ocean_shading: true,
        }
    }

    fn globe(zoom: usize) -> (Globe, GlobeView) {
        let saved = GlobeView { center: GeoPoint::default(), zoom };
        let textures = TextureSet::generate(&[palette::FOREST, palette::DESERT]);
        (Globe::new(100, 80, settings(), saved, textures), saved)
    }

    #[test]
    fn test_zoom_clamps() {
        let (mut g, mut saved) = globe(0);
        g.set_zoom(99, &mut saved);
        assert_eq!(g.zoom(), 5);
        assert_eq!(saved.zoom, 5);
        assert_eq!(g.radius(), 3.6 * 80.0);
        g.zoom_in(&mut saved);
        assert_eq!(g.zoom(), 5);
        g.zoom_min(&mut saved);
        assert_eq!(g.zoom(), 0);
    }

    #[test]
    fn test_zoom_out_at_minimum_is_noop() {
        let (mut g, mut saved) = globe(0);
        let generation = g.cache().generation();
        g.zoom_out(&mut saved);
        assert_eq!(g.zoom(), 0);
        assert_eq!(g.radius(), 0.45 * 80.0);
        assert_eq!(g.cache().generation(), generation);
    }

    #[test]
    fn test_saved_zoom_is_clamped_on_restore() {
        let (g, _) = globe(42);
        assert_eq!(g.zoom(), 5);
    }

    #[test]
    fn test_dogfight_zoom_converges_and_returns() {
        let (mut g, mut saved) = globe(0);
        g.save_zoom_dogfight();
        let mut steps = 0;
        while !g.zoom_dogfight_in(&mut saved) {
            steps += 1;
            assert!(steps < 50, "dogfight zoom never arrived");
            // Growing radius sits between this level and the next
            let z = g.zoom();
            assert!(z < g.radii().len());
            assert!(g.radii()[z] <= g.radius(), "step {steps}: {} below level {z}", g.radius());
            assert!(g.radius() <= g.radii()[(z + 1).min(ZOOM_LEVELS - 1)], "step {steps}: {}", g.radius());
        }
        assert!(steps > 2, "transition should take several steps");
        assert_eq!(g.zoom(), DOGFIGHT_ZOOM);
        assert_eq!(g.radius(), g.radii()[DOGFIGHT_ZOOM]);

        steps = 0;
        while !g.zoom_dogfight_out(&mut saved) {
            steps += 1;
            assert!(steps < 50, "dogfight zoom never returned");
            // Shrinking radius sits between the previous level and this one
            let z = g.zoom();
            assert!(z < g.radii().len());
            assert!(g.radius() <= g.radii()[z], "step {steps}: {} above level {z}", g.radius());
            assert!(g.radii()[z.saturating_sub(1)] <= g.radius(), "step {steps}: {}", g.radius());
        }
        assert_eq!(g.zoom(), 0);
        assert_eq!(g.radius(), g.radii()[0]);
        assert_eq!(saved.zoom, 0);
    }

    #[test]
    fn test_rotation_ticks() {
        let (mut g, mut saved) = globe(0);
        g.rotate_left();
        g.advance(25, &mut saved);
        // Two 10 ms ticks at scroll speed 20
        let expected = -2.0 * ROTATE_LONGITUDE * 0.9;
        assert!((g.center_point().lon - expected).abs() < 1e-12);
        assert_eq!(saved.center, g.center_point());

        g.rotate_up();
        g.rotate_stop_lon();
        assert!(g.is_rotating());
        g.rotate_stop_lat();
        assert!(!g.is_rotating());
        let before = g.center_point();
        g.advance(100, &mut saved);
        assert_eq!(g.center_point(), before);
    }

    #[test]
    fn test_blink_toggles_every_interval() {
        let (mut g, mut saved) = globe(0);
        assert!(g.blink_on());
        g.advance(99, &mut saved);
        assert!(g.blink_on());
        g.advance(1, &mut saved);
        assert!(!g.blink_on());
        g.advance(200, &mut saved);
        assert!(!g.blink_on());
    }

    #[test]
    fn test_center_projects_to_screen_center_and_right_click_recenters() {
        let (mut g, mut saved) = globe(2);
        let view = g.view();
        assert_eq!(view.to_screen(GeoPoint::new(0.0, 0.0)), ScreenPoint::new(50, 40));

        g.mouse_press(&MouseAction::press(50, 40, MouseButton::Right, 0));
        let event = g.mouse_click(&MouseAction::release(50, 40, MouseButton::Right, 50), &mut saved);
        match event {
            GlobeEvent::Clicked { point, button, .. } => {
                assert_eq!(button, MouseButton::Right);
                assert!(point.lon.abs() < 1e-9 && point.lat.abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(g.center_point().lon.abs() < 1e-9);
        assert!(g.center_point().lat.abs() < 1e-9);
    }

    #[test]
    fn test_drag_then_release_keeps_pan() {
        let (mut g, mut saved) = globe(0);
        g.mouse_press(&MouseAction::press(50, 40, MouseButton::Left, 0));
        for i in 1..=5 {
            let m = MouseAction::motion(50 + 4 * i, 40, 4, 0, Some(MouseButton::Left), 10 * i as u64);
            let event = g.mouse_over(&m, &mut saved);
            // The cursor is reported at the drag anchor
            assert!(matches!(event, GlobeEvent::Hover { x: 50, y: 40, .. }));
        }
        let panned = g.center_point();
        assert!(panned.lon < 0.0);

        let event = g.handle_mouse(&MouseAction::release(70, 40, MouseButton::Left, 100), &mut saved);
        assert_eq!(event, GlobeEvent::Ignored);
        assert_eq!(g.center_point(), panned);
        assert!(!g.is_scrolling());
    }

    #[test]
    fn test_quick_click_restores_center() {
        let (mut g, mut saved) = globe(0);
        let start = g.center_point();
        g.mouse_press(&MouseAction::press(50, 40, MouseButton::Left, 0));
        g.mouse_over(&MouseAction::motion(51, 40, 1, 0, Some(MouseButton::Left), 10), &mut saved);
        assert_ne!(g.center_point(), start);
        let event = g.handle_mouse(&MouseAction::release(51, 40, MouseButton::Left, 50), &mut saved);
        assert!(matches!(event, GlobeEvent::Clicked { button: MouseButton::Left, .. }));
        assert_eq!(g.center_point(), start);
    }

    #[test]
    fn test_wheel_zooms() {
        let (mut g, mut saved) = globe(1);
        g.handle_mouse(&MouseAction::release(50, 40, MouseButton::WheelUp, 0), &mut saved);
        assert_eq!(g.zoom(), 2);
        g.handle_mouse(&MouseAction::release(50, 40, MouseButton::WheelDown, 0), &mut saved);
        assert_eq!(g.zoom(), 1);
    }

    #[test]
    fn test_click_off_globe_is_ignored() {
        let (mut g, mut saved) = globe(0);
        let event = g.handle_mouse(&MouseAction::release(0, 0, MouseButton::Right, 0), &mut saved);
        assert_eq!(event, GlobeEvent::Ignored);
        assert_eq!(g.center_point(), GeoPoint::default());
    }

    #[test]
    fn test_targets_at_skips_back_facing() {
        let (g, _) = globe(2);
        let near = GeoPoint::new(0.01, 0.0);
        let world = World {
            bases: vec![
                Base {
                    name: "Front".into(),
                    position: near,
                    facilities: vec![],
                    crafts: vec![Craft {
                        name: "C-1".into(),
                        position: near,
                        status: CraftStatus::Out,
                        destination: Some(GeoPoint::new(0.5, 0.0)),
                        meet_point: None,
                        radar_range: 0.0,
                        speed: 0.0,
                    }],
                },
                Base {
                    name: "Back".into(),
                    position: GeoPoint::new(std::f64::consts::PI, 0.0),
                    facilities: vec![],
                    crafts: vec![],
                },
            ],
            ..Default::default()
        };
        let at = g.view().to_screen(near);
        let hits = g.targets_at(at.x, at.y, false, None, &world);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|t| t.position() == near));

        let crafts = g.targets_at(at.x, at.y, true, None, &world);
        assert_eq!(crafts.len(), 1);
        assert!(crafts[0].is_craft());

        // The antipode projects onto the same pixel but is never picked
        let back = g.view().to_screen(GeoPoint::new(std::f64::consts::PI, 0.0));
        let hits = g.targets_at(back.x, back.y, false, None, &world);
        assert!(hits.iter().all(|t| t.name() != "Back"));
    }

    #[test]
    fn test_land_queries() {
        let (g, _) = globe(0);
        let square = |lon: f64, texture| {
            Polygon::new(
                vec![
                    GeoPoint::new(lon - 0.1, -0.1),
                    GeoPoint::new(lon + 0.1, -0.1),
                    GeoPoint::new(lon + 0.1, 0.1),
                    GeoPoint::new(lon - 0.1, 0.1),
                ],
                texture,
            )
        };
        let mut ocean = Texture::new(1);
        ocean.is_ocean = true;
        ocean.fake_underwater = true;
        let ruleset = Ruleset {
            polygons: vec![square(0.0, 0), square(1.0, 1)],
            textures: vec![Texture::new(0), ocean],
            ..Default::default()
        };

        assert!(g.inside_land(&ruleset, GeoPoint::new(0.0, 0.0)));
        assert!(!g.inside_land(&ruleset, GeoPoint::new(1.0, 0.0)));
        assert!(!g.inside_land(&ruleset, GeoPoint::new(2.0, 0.0)));
        assert!(g.inside_fake_underwater(&ruleset, GeoPoint::new(1.0, 0.0)));
        assert!(!g.inside_fake_underwater(&ruleset, GeoPoint::new(0.0, 0.0)));

        let time = GameTime::new(1999, 6, 1, 12, 0, 0);
        let (texture, shade) = g.polygon_texture_and_shade(&ruleset, &time, GeoPoint::new(0.0, 0.0));
        assert_eq!(texture, Some(0));
        assert!(shade <= 15);
        let (texture, _) = g.polygon_texture_and_shade(&ruleset, &time, GeoPoint::new(2.0, 0.0));
        assert_eq!(texture, None);
    }

    #[test]
    fn test_moving_view_rebuilds_cache_on_draw() {
        let (mut g, mut saved) = globe(0);
        let ruleset = Ruleset {
            polygons: vec![Polygon::new(
                vec![
                    GeoPoint::new(-0.2, -0.2),
                    GeoPoint::new(0.2, -0.2),
                    GeoPoint::new(0.2, 0.2),
                    GeoPoint::new(-0.2, 0.2),
                ],
                0,
            )],
            ..Default::default()
        };
        let world = World::default();
        g.draw(&world, &ruleset);
        assert_eq!(g.cache().state(), CacheState::Clean);
        assert_eq!(g.cache().polygons().len(), 1);

        g.center(GeoPoint::new(std::f64::consts::PI, 0.0), &mut saved);
        assert_eq!(g.cache().state(), CacheState::Dirty);
        g.draw(&world, &ruleset);
        assert!(g.cache().polygons().is_empty());
        // Off the disk everything is transparent
        assert_eq!(g.frame().get_pixel(0, 0), 0);
    }

    #[test]
    fn test_key_toggles() {
        let (mut g, _) = globe(0);
        let keys = KeyBindings::default();
        assert!(g.key_press('d', &keys));
        assert!(!g.settings().detail);
        assert!(g.key_press('r', &keys));
        assert!(!g.settings().radar_lines);
        assert!(!g.key_press('z', &keys));
    }
}
