use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::globe::{GlobeSettings, ScrollSettings};
use crate::input::MouseButton;

pub const DEFAULT_CONFIG_PATH: &str = "geoscape.toml";

/// Keyboard shortcuts. Arrow keys always rotate the globe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub toggle_detail: char,
    pub toggle_radar: char,
    pub zoom_in: char,
    pub zoom_out: char,
    pub toggle_debug: char,
    pub cycle_debug: char,
    /// Start or cancel picking a site for a new base.
    pub build_base: char,
    pub pause: char,
    pub quit: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_detail: 'd',
            toggle_radar: 'r',
            zoom_in: '+',
            zoom_out: '-',
            toggle_debug: 'g',
            cycle_debug: 'c',
            build_base: 'b',
            pause: ' ',
            quit: 'q',
        }
    }
}

/// User options, read from `geoscape.toml`. Every field has a default so a
/// partial file is fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// 1..=100, higher scrolls faster.
    pub geo_scroll_speed: i32,
    pub drag_scroll_button: MouseButton,
    pub drag_scroll_invert: bool,
    /// Presses shorter than this (without moving) count as clicks.
    pub drag_scroll_time_tolerance_ms: u64,
    pub drag_scroll_pixel_tolerance: i32,
    pub globe_detail: bool,
    pub globe_radar_lines: bool,
    pub globe_flight_paths: bool,
    pub globe_seasons: bool,
    /// Precompute sphere normals for every zoom level.
    pub globe_surface_cache: bool,
    /// While placing a base, show every facility radar around every base.
    pub globe_all_radars_on_base_build: bool,
    pub ocean_shading: bool,
    /// Game seconds per real second.
    pub time_scale: u64,
    /// Optional GeoJSON land polygons and border lines.
    pub land_path: Option<String>,
    pub borders_path: Option<String>,
    pub keys: KeyBindings,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            geo_scroll_speed: 20,
            drag_scroll_button: MouseButton::Left,
            drag_scroll_invert: false,
            drag_scroll_time_tolerance_ms: 300,
            drag_scroll_pixel_tolerance: 10,
            globe_detail: true,
            globe_radar_lines: true,
            globe_flight_paths: true,
            globe_seasons: true,
            globe_surface_cache: true,
            globe_all_radars_on_base_build: true,
            ocean_shading: true,
            time_scale: 60,
            land_path: None,
            borders_path: None,
            keys: KeyBindings::default(),
        }
    }
}

impl Options {
    /// Load options from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no options file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading options from {}", path.display()))?;
        let options: Options =
            toml::from_str(&text).with_context(|| format!("parsing options in {}", path.display()))?;
        info!(path = %path.display(), "loaded options");
        Ok(options)
    }

    pub fn scroll_settings(&self) -> ScrollSettings {
        ScrollSettings {
            button: self.drag_scroll_button,
            invert: self.drag_scroll_invert,
            time_tolerance_ms: self.drag_scroll_time_tolerance_ms,
            pixel_tolerance: self.drag_scroll_pixel_tolerance,
            scroll_speed: self.geo_scroll_speed.clamp(1, 100),
        }
    }

    pub fn globe_settings(&self) -> GlobeSettings {
        GlobeSettings {
            scroll: self.scroll_settings(),
            detail: self.globe_detail,
            radar_lines: self.globe_radar_lines,
            flight_paths: self.globe_flight_paths,
            seasons: self.globe_seasons,
            surface_cache: self.globe_surface_cache,
            all_radars_on_base_build: self.globe_all_radars_on_base_build,
            ocean_shading: self.ocean_shading,
        }
    }
}
