//! The globe's draw passes.
//!
//! Each frame runs, in order: ocean, land, shadow, radar circles, flight
//! paths, markers and detail. The first three write the `globe` layer; the
//! others get a layer of their own and are composited on top of it. A pass
//! may rely on everything drawn before it being final.

use std::f64::consts::{PI, TAU};

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::geo::{nautical, GeoPoint};
use crate::globe::cache::CachedPolygon;
use crate::globe::projection::{destination_point, earth_normal, eastward_span, ViewState};
use crate::globe::shade::{ShadeTable, ShadowPalette};
use crate::palette::{self, GROUP_SIZE};
use crate::ruleset::{Area, EnemyRadarCircles, Ruleset};
use crate::surface::{draw_line, draw_textured_polygon, fill_circle, Surface};
use crate::world::{
    CraftStatus, DebugOverlay, DebugState, Target, TargetRef, UfoStatus, World, CITY_MARKER,
    MARKER_COUNT,
};

/// Radar ranges at or above this many nautical miles are not drawn.
pub const MAX_DRAW_RADAR_CIRCLE_RADIUS: f64 = 10_000.0;

const RADAR_SHADE: i32 = 6;
const PATH_SHADE: i32 = 8;
const TEXTURE_SIZE: usize = 32;

/// Text placed on the globe, centred horizontally on `x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub color: u8,
}

/// Offscreen surfaces composited into the final frame, bottom to top.
pub struct Layers {
    pub globe: Surface,
    pub radars: Surface,
    pub countries: Surface,
    pub markers: Surface,
}

impl Layers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            globe: Surface::new(width, height),
            radars: Surface::new(width, height),
            countries: Surface::new(width, height),
            markers: Surface::new(width, height),
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.globe.resize(width, height);
        self.radars.resize(width, height);
        self.countries.resize(width, height);
        self.markers.resize(width, height);
    }

    /// Stack every layer onto `out`, transparent pixels showing through.
    pub fn composite(&self, out: &mut Surface) {
        out.clear();
        self.globe.blit(out);
        self.radars.blit(out);
        self.countries.blit(out);
        self.markers.blit(out);
    }
}

/// Land texture frames. Holds three detail levels of every texture, finest
/// first; the zoom level picks which block of frames the land pass uses.
pub struct TextureSet {
    frames: Vec<Surface>,
}

impl TextureSet {
    /// Generate frames for textures whose colour ramps start at `ramps`.
    pub fn generate(ramps: &[u8]) -> Self {
        let mut frames = Vec::with_capacity(ramps.len() * 3);
        for detail in 0..3usize {
            // Coarser levels use larger blocks of one colour
            let block = 1 << detail;
            for (id, &ramp) in ramps.iter().enumerate() {
                let mut rng = Pcg32::seed_from_u64((detail * 1000 + id) as u64);
                let mut frame = Surface::new(TEXTURE_SIZE, TEXTURE_SIZE);
                for by in (0..TEXTURE_SIZE).step_by(block) {
                    for bx in (0..TEXTURE_SIZE).step_by(block) {
                        let color = ramp + rng.gen_range(0..4u8);
                        for y in by..(by + block).min(TEXTURE_SIZE) {
                            for x in bx..(bx + block).min(TEXTURE_SIZE) {
                                frame.set_pixel(x as i32, y as i32, color);
                            }
                        }
                    }
                }
                frames.push(frame);
            }
        }
        Self { frames }
    }

    pub fn frame(&self, index: usize) -> Option<&Surface> {
        self.frames.get(index)
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// First frame used at `zoom`: coarse textures far out, fine ones close up.
    pub fn zoom_offset(&self, zoom: usize) -> usize {
        (2 - (zoom / 2).min(2)) * (self.total_frames() / 3)
    }
}

/// Marker sprites, indexed by the marker ids in [`crate::world`].
pub struct MarkerSet {
    frames: Vec<Surface>,
}

impl MarkerSet {
    pub fn generate() -> Self {
        use crate::palette::{CYAN, GREEN, MAGENTA, ORANGE, RED, WHITE, YELLOW};

        let sprite = |rows: [&str; 5], color: u8| {
            let mut s = Surface::new(5, 5);
            for (y, row) in rows.iter().enumerate() {
                for (x, ch) in row.bytes().enumerate() {
                    if ch == b'#' {
                        s.set_pixel(x as i32, y as i32, color);
                    }
                }
            }
            s
        };

        let square = ["#####", "#...#", "#...#", "#...#", "#####"];
        let cross = ["..#..", "..#..", "#####", "..#..", "..#.."];
        let ex = ["#...#", ".#.#.", "..#..", ".#.#.", "#...#"];
        let diamond = ["..#..", ".#.#.", "#...#", ".#.#.", "..#.."];
        let dot = [".....", ".###.", ".###.", ".###.", "....."];
        let ring = [".###.", "#...#", "#...#", "#...#", ".###."];
        let small = [".....", ".....", "..#..", ".....", "....."];

        let frames = vec![
            sprite(square, CYAN),
            sprite(cross, GREEN),
            sprite(cross, RED),
            sprite(ex, RED),
            sprite(ex, ORANGE),
            sprite(diamond, MAGENTA),
            sprite(ring, YELLOW),
            sprite(dot, MAGENTA),
            sprite(small, WHITE),
        ];
        debug_assert_eq!(frames.len(), MARKER_COUNT);
        Self { frames }
    }

    pub fn frame(&self, index: usize) -> Option<&Surface> {
        self.frames.get(index)
    }
}

/// Precomputed sphere normals for one zoom level, for a globe centred on
/// the middle of the surface.
pub struct NormalGrid {
    width: usize,
    height: usize,
    normals: Vec<DVec3>,
}

impl NormalGrid {
    pub fn new(width: usize, height: usize, radius: f64) -> Self {
        let (ox, oy) = ((width / 2) as f64, (height / 2) as f64);
        let mut normals = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                normals.push(earth_normal(ox, oy, radius, i as f64 + 0.5, j as f64 + 0.5));
            }
        }
        Self { width, height, normals }
    }

    #[inline(always)]
    fn get(&self, x: i32, y: i32) -> DVec3 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return DVec3::ZERO;
        }
        self.normals[y as usize * self.width + x as usize]
    }
}

/// Where sphere normals come from in the shadow pass.
pub enum Normals<'a> {
    /// Per-zoom grid built for a globe centred on the surface.
    Cached(&'a NormalGrid),
    /// Computed per pixel against this radius.
    Computed(f64),
}

/// Extra radar rings the screen asks for.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadarOverlay {
    /// Range ring of the craft being dispatched.
    pub craft: Option<(GeoPoint, f64)>,
    /// Cursor position while choosing a site for a new base.
    pub new_base: Option<GeoPoint>,
}

/// What every pass after the shadow reads.
pub struct Scene<'a> {
    pub view: &'a ViewState,
    pub ruleset: &'a Ruleset,
    pub world: &'a World,
    pub shadow: ShadowPalette,
    pub overlay: RadarOverlay,
    pub radar_lines: bool,
    pub flight_paths: bool,
    pub detail: bool,
    pub all_radars_on_base_build: bool,
    pub blink: bool,
}

pub fn draw_ocean(surface: &mut Surface, view: &ViewState, color: u8) {
    surface.clear();
    fill_circle(surface, view.center_x + 1, view.center_y, view.radius as i32 + 20, color);
}

pub fn draw_land(surface: &mut Surface, polygons: &[CachedPolygon], textures: &TextureSet, zoom: usize) {
    let offset = textures.zoom_offset(zoom);
    for polygon in polygons {
        if let Some(frame) = textures.frame(polygon.texture + offset) {
            draw_textured_polygon(surface, &polygon.points, frame);
        }
    }
}

/// Darken every globe pixel according to its angle to the sun; clear
/// everything off the disk.
pub fn draw_shadow(
    surface: &mut Surface,
    view: &ViewState,
    table: &ShadeTable,
    shadow: ShadowPalette,
    sun: DVec3,
    normals: Normals<'_>,
) {
    let width = surface.width() as i32;
    let (move_x, move_y) = (view.center_x - width / 2, view.center_y - surface.height() as i32 / 2);
    for (y, row) in surface.rows_mut().enumerate() {
        let y = y as i32;
        for (x, px) in row.iter_mut().enumerate() {
            let x = x as i32;
            let earth = match normals {
                Normals::Cached(grid) => grid.get(x - move_x, y - move_y),
                Normals::Computed(radius) => {
                    earth_normal(0.0, 0.0, radius, (x - view.center_x) as f64, (y - view.center_y) as f64)
                }
            };
            shadow.shade_pixel(px, table, earth, sun, table.noise(x, y));
        }
    }
}

/// Liang-Barsky clip of a segment to `[0, w] x [0, h]`. The line walker
/// stops one step short of the far end, so clipping to the edge itself
/// keeps the last column and row.
fn clip_segment(w: f64, h: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<(f64, f64, f64, f64)> {
    let (dx, dy) = (x2 - x1, y2 - y1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let edges = [(-dx, x1), (dx, w - x1), (-dy, y1), (dy, h - y1)];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    Some((x1 + t0 * dx, y1 + t0 * dy, x1 + t1 * dx, y1 + t1 * dy))
}

/// Draw a line into `dest` that re-shades whatever `src` shows beneath it
/// instead of painting a flat colour. Steps one pixel at a time along the
/// longer axis; transparent source pixels are skipped.
pub fn draw_shaded_line(
    dest: &mut Surface,
    src: &Surface,
    shadow: ShadowPalette,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    shade: i32,
) {
    let Some((x1, y1, x2, y2)) = clip_segment(src.width() as f64, src.height() as f64, x1, y1, x2, y2)
    else {
        return;
    };

    let (dx, dy) = (x2 - x1, y2 - y1);
    let steep = ((y2 as i32) - (y1 as i32)).abs() > ((x2 as i32) - (x1 as i32)).abs();
    let mut len = if steep {
        ((y2 as i32) - (y1 as i32)).abs() as f64
    } else {
        ((x2 as i32) - (x1 as i32)).abs() as f64
    };
    let sign = |d: f64, a: f64, b: f64| {
        if b < a {
            -1.0
        } else if d == 0.0 {
            0.0
        } else {
            1.0
        }
    };
    let mut sx = sign(dx, x1, x2);
    let mut sy = sign(dy, y1, y2);
    if len > 0.0 {
        if steep {
            sx = dx / len;
        } else {
            sy = dy / len;
        }
    }

    let (mut x, mut y) = (x1, y1);
    while len > 0.0 {
        let color = src.get_pixel(x as i32, y as i32);
        if color != 0 {
            let color = if shadow.is_ocean(color) {
                shadow.ocean_shade((shade + 8) as u8)
            } else {
                shadow.land_shade(color, (shade * 3) as u8)
            };
            dest.set_pixel(x as i32, y as i32, color);
        }
        x += sx;
        y += sy;
        len -= 1.0;
    }
}

/// Rasterize a circle of `radius` radians around `center` as `segments`
/// chords, drawing every `frac`-th one and skipping those that end on the
/// far side of the globe.
#[allow(clippy::too_many_arguments)]
pub fn draw_globe_circle(
    dest: &mut Surface,
    src: &Surface,
    view: &ViewState,
    shadow: ShadowPalette,
    center: GeoPoint,
    radius: f64,
    segments: usize,
    frac: usize,
) {
    let seg = PI / (segments as f64 / 2.0);
    let frac = frac.max(1);
    let mut prev = view.to_screen_f64(destination_point(center, radius, 0.0));
    let mut i = 0usize;
    let mut az = seg;
    while az <= TAU + 0.01 {
        let p = destination_point(center, radius, az);
        let (x, y) = view.to_screen_f64(p);
        if !view.is_back_facing(p) && i % frac == 0 {
            draw_shaded_line(dest, src, shadow, x, y, prev.0, prev.1, RADAR_SHADE);
        }
        prev = (x, y);
        i += 1;
        az += seg;
    }
}

pub fn draw_radars(scene: &Scene<'_>, globe: &Surface, radars: &mut Surface) {
    radars.clear();
    if !scene.radar_lines {
        return;
    }
    let view = scene.view;
    let shadow = scene.shadow;
    let circle = |dest: &mut Surface, at: GeoPoint, range: f64, segments: usize, frac: usize| {
        draw_globe_circle(dest, globe, view, shadow, at, range, segments, frac);
    };

    if let Some((at, range)) = scene.overlay.craft {
        if range < PI {
            circle(radars, at, range, 64, 1);
            circle(radars, at, range - 0.025, 64, 2);
        }
    }

    let mut hover_ranges = Vec::new();
    if let Some(at) = scene.overlay.new_base {
        for facility in scene.ruleset.facilities.iter().filter(|f| f.radar_range > 0.0) {
            let range = nautical(facility.radar_range);
            circle(radars, at, range, 48, 1);
            if scene.all_radars_on_base_build {
                hover_ranges.push(range);
            }
        }
    }

    for base in &scene.world.bases {
        if base.is_placed() {
            if scene.overlay.new_base.is_some() && scene.all_radars_on_base_build {
                for &range in &hover_ranges {
                    circle(radars, base.position, range, 48, 1);
                }
            } else {
                let range = base
                    .facilities
                    .iter()
                    .filter(|f| f.build_time == 0)
                    .filter_map(|f| scene.ruleset.facility(&f.rule))
                    .map(|rule| rule.radar_range)
                    .filter(|&r| r < MAX_DRAW_RADAR_CIRCLE_RADIUS)
                    .fold(0.0, f64::max);
                let range = nautical(range);
                if range > 0.0 {
                    circle(radars, base.position, range, 48, 1);
                }
            }
        }

        for craft in base.crafts.iter().filter(|c| c.status == CraftStatus::Out) {
            let range = nautical(craft.radar_range);
            if range > 0.0 {
                circle(radars, craft.position, range, 24, 1);
            }
        }
    }

    let enemy = scene.ruleset.enemy_radar_circles;
    if enemy != EnemyRadarCircles::Hidden {
        for ufo in &scene.world.ufos {
            if !ufo.hunter_killer || !ufo.detected || ufo.status == UfoStatus::Ignored {
                continue;
            }
            if enemy == EnemyRadarCircles::HyperDetected && !ufo.hyper_detected {
                continue;
            }
            let range = nautical(ufo.radar_range);
            if range > 0.0 {
                circle(radars, ufo.position, range, 24, 1);
            }
        }
        for alien_base in &scene.world.alien_bases {
            if alien_base.discovered && alien_base.detection_range > 0.0 {
                circle(radars, alien_base.position, nautical(alien_base.detection_range), 24, 1);
            }
        }
    }
}

/// Draw the path from `a` to `b` as chords of the straight line between
/// their unit vectors. Longer paths get more chords.
pub fn draw_path(dest: &mut Surface, src: &Surface, view: &ViewState, shadow: ShadowPalette, a: GeoPoint, b: GeoPoint) {
    let mut cord = a.to_cord();
    let end = b.to_cord();
    if -end == cord {
        return;
    }
    let mut delta = end - cord;
    let count = (delta.length_squared() * 15.0 + 1.0) as i32;
    delta /= count as f64;

    let mut p1 = GeoPoint::from_cord(cord);
    let mut s1 = view.to_screen(p1);
    for _ in 0..count {
        cord += delta;
        let p2 = GeoPoint::from_cord(cord);
        let s2 = view.to_screen(p2);
        if !view.is_back_facing(p1) && !view.is_back_facing(p2) {
            draw_shaded_line(dest, src, shadow, s1.x as f64, s1.y as f64, s2.x as f64, s2.y as f64, PATH_SHADE);
        }
        p1 = p2;
        s1 = s2;
    }
}

/// Flight paths share the radar layer, on top of the rings.
pub fn draw_flights(scene: &Scene<'_>, globe: &Surface, radars: &mut Surface) {
    if !scene.flight_paths {
        return;
    }
    let (view, shadow) = (scene.view, scene.shadow);

    for craft in scene.world.crafts() {
        if craft.status != CraftStatus::Out {
            continue;
        }
        let Some(destination) = craft.destination else {
            continue;
        };
        let leg_end = craft.meet_point.unwrap_or(destination);
        draw_path(radars, globe, view, shadow, craft.position, leg_end);
        if craft.meet_point.is_some() {
            draw_path(radars, globe, view, shadow, destination, leg_end);
        }
    }

    let debug = scene.world.debug.enabled;
    for ufo in &scene.world.ufos {
        let Some(destination) = ufo.destination else {
            continue;
        };
        if (ufo.hunting || debug) && ufo.detected && ufo.status != UfoStatus::Ignored {
            draw_path(radars, globe, view, shadow, ufo.position, destination);
        }
    }
}

/// Blit `target`'s marker centred on its projection. Off frames of the
/// blink darken the sprite by one colour; cities never blink.
pub fn draw_target(surface: &mut Surface, markers: &MarkerSet, view: &ViewState, target: &dyn Target, blink: bool) {
    let Some(id) = target.marker() else {
        return;
    };
    let position = target.position();
    if view.is_back_facing(position) {
        return;
    }
    let Some(sprite) = markers.frame(id) else {
        return;
    };
    let at = view.to_screen(position);
    let x = at.x - sprite.width() as i32 / 2;
    let y = at.y - sprite.height() as i32 / 2;
    if id == CITY_MARKER || blink {
        sprite.blit_with(surface, x, y, |d, s| {
            if s != 0 {
                *d = s;
            }
        });
    } else {
        sprite.blit_with(surface, x, y, |d, s| {
            if s != 0 {
                *d = s + 1;
            }
        });
    }
}

pub fn draw_markers(scene: &Scene<'_>, markers: &MarkerSet, surface: &mut Surface) {
    surface.clear();
    for target in scene.world.marker_targets() {
        draw_target(surface, markers, scene.view, &target, scene.blink);
    }
}

/// Draw a lon/lat-aligned edge as short chords, so it follows the curve
/// of the globe.
pub fn draw_vh_line(surface: &mut Surface, view: &ViewState, from: GeoPoint, to: GeoPoint, color: u8) {
    let mut sx = eastward_span(from.lon, to.lon);
    let mut sy = to.lat - from.lat;
    let seg = if sx.abs() < 0.01 {
        ((sy / TAU * 48.0).abs() as i32).max(1)
    } else {
        ((sx / TAU * 96.0).abs() as i32).max(1)
    };
    sx /= seg as f64;
    sy /= seg as f64;

    for i in 0..seg {
        let p1 = GeoPoint::new(from.lon + sx * i as f64, from.lat + sy * i as f64);
        let p2 = GeoPoint::new(from.lon + sx * (i + 1) as f64, from.lat + sy * (i + 1) as f64);
        if !view.is_back_facing(p1) && !view.is_back_facing(p2) {
            let (a, b) = (view.to_screen(p1), view.to_screen(p2));
            draw_line(surface, a.x, a.y, b.x, b.y, color);
        }
    }
}

fn draw_area(surface: &mut Surface, view: &ViewState, area: &Area, color: u8) {
    let (lon1, lon2, lat1, lat2) = (area.lon_min, area.lon_max, area.lat_min, area.lat_max);
    draw_vh_line(surface, view, GeoPoint::new(lon1, lat1), GeoPoint::new(lon2, lat1), color);
    draw_vh_line(surface, view, GeoPoint::new(lon1, lat2), GeoPoint::new(lon2, lat2), color);
    draw_vh_line(surface, view, GeoPoint::new(lon1, lat1), GeoPoint::new(lon1, lat2), color);
    draw_vh_line(surface, view, GeoPoint::new(lon2, lat1), GeoPoint::new(lon2, lat2), color);
}

/// Distinct debug colour for the `n`th outlined item.
fn debug_color(n: usize) -> u8 {
    palette::DEBUG_RAMP + ((n * 5) % GROUP_SIZE as usize / 2) as u8
}

fn label_at(view: &ViewState, position: GeoPoint, text: &str, color: u8, dy: i32) -> Option<Label> {
    if view.is_back_facing(position) {
        return None;
    }
    let at = view.to_screen(position);
    Some(Label {
        text: text.to_string(),
        x: at.x,
        y: at.y + dy,
        color,
    })
}

/// Borders, names, cities and debug outlines, depending on the zoom level.
/// Returns the labels to print over the frame.
pub fn draw_detail(scene: &Scene<'_>, markers: &MarkerSet, surface: &mut Surface) -> Vec<Label> {
    surface.clear();
    let mut labels = Vec::new();
    if !scene.detail {
        return labels;
    }
    let view = scene.view;
    let colors = &scene.ruleset.colors;

    if view.zoom >= 1 {
        for line in &scene.ruleset.polylines {
            for pair in line.points.windows(2) {
                if view.is_back_facing(pair[0]) || view.is_back_facing(pair[1]) {
                    continue;
                }
                let (a, b) = (view.to_screen(pair[0]), view.to_screen(pair[1]));
                draw_line(surface, a.x, a.y, b.x, b.y, colors.line);
            }
        }
    }

    if view.zoom >= 2 {
        for country in &scene.ruleset.countries {
            let color = country.label_color.unwrap_or(colors.country_label);
            labels.extend(label_at(view, country.label, &country.name, color, 0));
        }
    }

    for extra in &scene.ruleset.extra_labels {
        if view.zoom >= extra.zoom_level {
            let color = extra.label_color.unwrap_or(colors.country_label);
            labels.extend(label_at(view, extra.position, &extra.name, color, 0));
        }
    }

    if view.zoom >= 3 {
        for city in scene.ruleset.regions.iter().flat_map(|r| r.cities.iter()) {
            draw_target(surface, markers, view, &TargetRef::City(city), scene.blink);
            labels.extend(label_at(view, city.position, &city.name, colors.city_label, 2));
        }
        for base in &scene.world.bases {
            if base.marker().is_some() {
                labels.extend(label_at(view, base.position, &base.name, colors.base_label, 2));
            }
        }
    }

    if scene.world.debug.enabled {
        draw_debug(surface, view, scene.ruleset, &scene.world.debug);
    }

    labels
}

fn draw_debug(surface: &mut Surface, view: &ViewState, ruleset: &Ruleset, debug: &DebugState) {
    match debug.overlay {
        DebugOverlay::Countries => {
            let countries = ruleset
                .countries
                .iter()
                .enumerate()
                .filter(|(i, _)| debug.country.map_or(true, |c| c == *i));
            for (n, (_, country)) in countries.enumerate() {
                for area in &country.areas {
                    draw_area(surface, view, area, debug_color(n + 1));
                }
            }
        }
        DebugOverlay::Regions => {
            let regions = ruleset
                .regions
                .iter()
                .enumerate()
                .filter(|(i, _)| debug.region.map_or(true, |r| r == *i));
            for (n, (_, region)) in regions.enumerate() {
                for area in &region.areas {
                    draw_area(surface, view, area, debug_color(n + 1));
                }
            }
        }
        DebugOverlay::MissionZones => {
            let regions = ruleset
                .regions
                .iter()
                .enumerate()
                .filter(|(i, _)| debug.region.map_or(true, |r| r == *i));
            for (_, region) in regions {
                let zones = region
                    .mission_zones
                    .iter()
                    .enumerate()
                    .filter(|(z, _)| debug.zone == 0 || debug.zone == z + 1);
                for (n, (_, zone)) in zones.enumerate() {
                    let areas = zone
                        .areas
                        .iter()
                        .enumerate()
                        .filter(|(a, _)| debug.area == 0 || debug.area == a + 1);
                    for (_, area) in areas {
                        draw_area(surface, view, area, debug_color(2 * n + 1));
                    }
                }
            }
        }
    }
}
