use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use tracing::{debug, info};

use crate::config::Options;
use crate::data;
use crate::geo::GeoPoint;
use crate::globe::{Globe, GlobeEvent, Label, TextureSet};
use crate::input::{MouseButton, MouseTranslator};
use crate::ruleset::Ruleset;
use crate::world::{Target, TargetRef, World};

/// Terminals report key presses and repeats but no releases, so rotation
/// stops once no arrow key has arrived for this long.
const ROTATE_HOLD_MS: u64 = 150;

/// Rows taken by the status bar below the globe.
const STATUS_ROWS: usize = 1;

/// Application state
pub struct App {
    pub globe: Globe,
    pub world: World,
    pub ruleset: Ruleset,
    pub options: Options,
    pub should_quit: bool,
    pub paused: bool,
    /// Picking a site for a new base
    pub building_base: bool,
    /// Globe point under the cursor
    pub hover: Option<GeoPoint>,
    /// Where the cursor marker is drawn, in globe pixels
    pub cursor: Option<(i32, i32)>,
    /// Names of the targets under the last click
    pub picked: Vec<String>,
    /// One-line message for the status bar
    pub message: String,
    /// Labels from the last frame, in globe pixels
    pub labels: Vec<Label>,
    mouse: MouseTranslator,
    clock_ms: u64,
    rotate_until: Option<u64>,
    /// Real milliseconds not yet turned into game seconds
    pending_ms: u64,
}

/// Globe pixel size for a terminal of `width` x `height` cells. Each cell
/// holds two vertically stacked pixels.
pub fn globe_size(width: usize, height: usize) -> (usize, usize) {
    (width, height.saturating_sub(STATUS_ROWS) * 2)
}

impl App {
    pub fn new(width: usize, height: usize, options: Options, ruleset: Ruleset, world: World) -> Self {
        let (px_width, px_height) = globe_size(width, height);
        let textures = TextureSet::generate(&data::texture_ramps());
        let globe = Globe::new(px_width, px_height, options.globe_settings(), world.globe, textures);
        info!(width = px_width, height = px_height, zoom = globe.zoom(), "globe ready");

        Self {
            globe,
            world,
            ruleset,
            options,
            should_quit: false,
            paused: false,
            building_base: false,
            hover: None,
            cursor: None,
            picked: Vec::new(),
            message: String::new(),
            labels: Vec::new(),
            mouse: MouseTranslator::new(),
            clock_ms: 0,
            rotate_until: None,
            pending_ms: 0,
        }
    }

    /// Update globe size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (px_width, px_height) = globe_size(width, height);
        self.globe.resize(px_width, px_height);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Advance timers by `elapsed_ms` of real time.
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.clock_ms += elapsed_ms;
        if self.rotate_until.is_some_and(|until| self.clock_ms >= until) {
            self.globe.rotate_stop();
            self.rotate_until = None;
        }
        self.globe.advance(elapsed_ms, &mut self.world.globe);

        if self.paused {
            return;
        }
        self.pending_ms += elapsed_ms * self.options.time_scale;
        let seconds = self.pending_ms / 1000;
        if seconds > 0 {
            self.pending_ms %= 1000;
            self.world.advance(seconds);
        }
    }

    /// Render the globe for the next terminal frame.
    pub fn draw(&mut self) {
        self.labels = self.globe.draw(&self.world, &self.ruleset);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let keys = self.options.keys.clone();
        match key.code {
            KeyCode::Esc => {
                if self.building_base {
                    self.set_building_base(false);
                } else {
                    self.quit();
                }
            }
            KeyCode::Left => self.rotate(Globe::rotate_left, true),
            KeyCode::Right => self.rotate(Globe::rotate_right, true),
            KeyCode::Up => self.rotate(Globe::rotate_up, false),
            KeyCode::Down => self.rotate(Globe::rotate_down, false),
            KeyCode::Char(c) if c == keys.quit => self.quit(),
            KeyCode::Char(c) if c == keys.pause => {
                self.paused = !self.paused;
                debug!(paused = self.paused, "time toggled");
            }
            KeyCode::Char(c) if c == keys.zoom_in => self.globe.zoom_in(&mut self.world.globe),
            KeyCode::Char(c) if c == keys.zoom_out => self.globe.zoom_out(&mut self.world.globe),
            KeyCode::Char(c) if c == keys.toggle_debug => {
                self.world.debug.toggle();
                debug!(enabled = self.world.debug.enabled, overlay = ?self.world.debug.overlay, "debug toggled");
            }
            KeyCode::Char(c) if c == keys.cycle_debug => {
                self.world.debug.overlay = self.world.debug.overlay.next();
            }
            KeyCode::Char(c) if c == keys.build_base => {
                let on = !self.building_base;
                self.set_building_base(on);
            }
            KeyCode::Char(c) => {
                self.globe.key_press(c, &keys);
            }
            _ => {}
        }
    }

    /// Spin while the arrow key repeats. A new arrow on the other axis
    /// stops the first one so the globe turns one way at a time.
    fn rotate(&mut self, start: fn(&mut Globe), horizontal: bool) {
        if horizontal {
            self.globe.rotate_stop_lat();
        } else {
            self.globe.rotate_stop_lon();
        }
        start(&mut self.globe);
        self.rotate_until = Some(self.clock_ms + ROTATE_HOLD_MS);
    }

    fn set_building_base(&mut self, on: bool) {
        self.building_base = on;
        self.globe.set_new_base_hover(on);
        self.message = if on {
            "Select site for new base".to_string()
        } else {
            String::new()
        };
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        let Some(action) = self.mouse.translate(event, 0, self.clock_ms) else {
            return;
        };
        match self.globe.handle_mouse(&action, &mut self.world.globe) {
            GlobeEvent::Ignored => {}
            GlobeEvent::Hover { x, y, point } => {
                self.cursor = Some((x, y));
                self.hover = Some(point);
                if self.building_base {
                    self.globe.set_new_base_hover_pos(point);
                }
            }
            GlobeEvent::Pressed { .. } => {}
            GlobeEvent::Clicked { x, y, point, button } => self.click(x, y, point, button),
        }
    }

    fn click(&mut self, x: i32, y: i32, point: GeoPoint, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        if self.building_base {
            self.message = self.base_site_message(point);
            return;
        }

        let targets = self.globe.targets_at(x, y, false, None, &self.world);
        self.picked = targets.iter().map(|t| t.name().into_owned()).collect();
        match targets.first() {
            Some(TargetRef::Craft(craft)) => {
                self.globe.set_craft_range(craft.position, craft.radar_range);
            }
            _ => self.globe.set_craft_range(point, 0.0),
        }
        info!(count = self.picked.len(), "targets picked");
    }

    fn base_site_message(&self, point: GeoPoint) -> String {
        if !self.globe.inside_land(&self.ruleset, point) {
            return "Base must be on land".to_string();
        }
        if self.globe.inside_fake_underwater(&self.ruleset, point) {
            return "Site is underwater".to_string();
        }
        let (lon, lat) = point.to_degrees();
        let (texture, _) = self.globe.polygon_texture_and_shade(&self.ruleset, &self.world.time, point);
        let terrain = texture
            .and_then(|id| self.ruleset.texture(id))
            .and_then(|t| t.random_base_terrain(point, &mut rand::thread_rng()));
        match terrain {
            Some(terrain) => format!("Base site accepted at {} ({terrain})", format_coords(lon, lat)),
            None => format!("Base site accepted at {}", format_coords(lon, lat)),
        }
    }

    /// Terrain texture and battle shade under the cursor.
    pub fn hover_terrain(&self) -> Option<(Option<usize>, u8)> {
        let point = self.hover?;
        Some(self.globe.polygon_texture_and_shade(&self.ruleset, &self.world.time, point))
    }

    pub fn zoom_level(&self) -> String {
        format!("{}/{}", self.globe.zoom() + 1, self.globe.zoom_levels())
    }

    pub fn center_coords(&self) -> String {
        let (lon, lat) = self.globe.center_point().to_degrees();
        format_coords(lon, lat)
    }

    pub fn time_label(&self) -> String {
        let t = &self.world.time;
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            t.year, t.month, t.day, t.hour, t.minute
        )
    }
}

/// Degrees as `12.3°N, 45.6°W`.
pub fn format_coords(lon: f64, lat: f64) -> String {
    let lon = if lon > 180.0 { lon - 360.0 } else { lon };
    format!(
        "{:.1}°{}, {:.1}°{}",
        lat.abs(),
        if lat >= 0.0 { "N" } else { "S" },
        lon.abs(),
        if lon >= 0.0 { "E" } else { "W" }
    )
}
