//! 256-colour globe palette.
//!
//! Colours are grouped in ramps of 32 entries; within a group the index grows
//! from the brightest to the darkest tone, so darkening a pixel is a matter of
//! adding to its index without leaving the group.

/// Number of entries in one shading ramp.
pub const GROUP_SIZE: u8 = 32;
/// Mask selecting the group part of a colour index.
pub const COLOR_GROUP: u8 = !(GROUP_SIZE - 1);
/// Largest in-group offset.
pub const COLOR_SHADE: u8 = GROUP_SIZE - 1;

pub const TRANSPARENT: u8 = 0;
// Marker and label colours. The entry right after each one is a dimmed
// variant, used for the blink-off frame of markers.
pub const WHITE: u8 = 1;
pub const YELLOW: u8 = 3;
pub const RED: u8 = 5;
pub const ORANGE: u8 = 7;
pub const CYAN: u8 = 9;
pub const MAGENTA: u8 = 11;
pub const GREEN: u8 = 13;
pub const LIGHT_GREY: u8 = 15;
/// First entry of the grey ramp used for debug overlays.
pub const DEBUG_RAMP: u8 = 16;

pub const FOREST: u8 = 32;
pub const GRASSLAND: u8 = 64;
pub const MOUNTAIN: u8 = 96;
pub const DESERT: u8 = 128;
pub const ICE: u8 = 160;
pub const OCEAN: u8 = 192;
pub const TUNDRA: u8 = 224;

/// Palette-indexed to RGB lookup.
#[derive(Clone)]
pub struct Palette {
    colors: [(u8, u8, u8); 256],
}

impl Palette {
    /// The default globe palette.
    pub fn geoscape() -> Self {
        let mut colors = [(0u8, 0u8, 0u8); 256];

        let fixed = [
            (WHITE, (255, 255, 255)),
            (YELLOW, (255, 230, 60)),
            (RED, (230, 40, 40)),
            (ORANGE, (255, 150, 40)),
            (CYAN, (80, 220, 230)),
            (MAGENTA, (220, 80, 220)),
            (GREEN, (90, 230, 90)),
            (LIGHT_GREY, (190, 190, 190)),
        ];
        for (idx, (r, g, b)) in fixed {
            colors[idx as usize] = (r, g, b);
            if idx != LIGHT_GREY {
                colors[idx as usize + 1] = (r / 2 + 20, g / 2 + 20, b / 2 + 20);
            }
        }
        for i in 0..16u8 {
            let v = 255 - i * 12;
            colors[(DEBUG_RAMP + i) as usize] = (v, v, v);
        }

        let ramps = [
            (FOREST, (40, 150, 50)),
            (GRASSLAND, (130, 170, 60)),
            (MOUNTAIN, (150, 110, 70)),
            (DESERT, (220, 190, 120)),
            (ICE, (235, 240, 245)),
            (OCEAN, (40, 90, 200)),
            (TUNDRA, (140, 150, 130)),
        ];
        for (base, (r, g, b)) in ramps {
            for shade in 0..GROUP_SIZE {
                // Fade linearly towards a near-black night tone
                let k = 1.0 - shade as f64 / (GROUP_SIZE as f64 + 4.0);
                colors[(base + shade) as usize] = (
                    (r as f64 * k) as u8,
                    (g as f64 * k) as u8,
                    (b as f64 * k) as u8,
                );
            }
        }

        Self { colors }
    }

    #[inline(always)]
    pub fn rgb(&self, index: u8) -> (u8, u8, u8) {
        self.colors[index as usize]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::geoscape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramps_darken() {
        let palette = Palette::geoscape();
        let (r0, g0, b0) = palette.rgb(OCEAN);
        let (r1, g1, b1) = palette.rgb(OCEAN + COLOR_SHADE);
        assert!(r1 <= r0 && g1 <= g0 && b1 < b0);
    }

    #[test]
    fn test_dimmed_marker_colours() {
        let palette = Palette::geoscape();
        for c in [WHITE, YELLOW, RED, ORANGE, CYAN, MAGENTA, GREEN] {
            let (r0, g0, b0) = palette.rgb(c);
            let (r1, g1, b1) = palette.rgb(c + 1);
            assert!(r1 as u32 + g1 as u32 + (b1 as u32) < r0 as u32 + g0 as u32 + b0 as u32);
        }
    }

    #[test]
    fn test_group_mask() {
        assert_eq!((OCEAN + 5) & COLOR_GROUP, OCEAN);
        assert_eq!((FOREST + COLOR_SHADE) & COLOR_GROUP, FOREST);
    }
}
