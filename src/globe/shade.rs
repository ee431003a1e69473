//! Day/night terminator shading.
//!
//! The shade of a pixel comes from the squared distance between the earth
//! surface normal and the sun direction, pushed through a hand-tuned
//! gradient and dithered with a tiled noise pattern so the terminator does
//! not band.

use std::f64::consts::TAU;
use std::sync::OnceLock;

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::palette::{COLOR_GROUP, COLOR_SHADE};
use crate::world::{is_leap_year, GameTime};

/// Side of the square noise tile, in pixels.
pub const NOISE_SIZE: usize = 60;

const MULTIPLIER_NOISE_BITS: u32 = 4;
const DISTANCE_NOISE_BITS: u32 = 3;
const VALUE_NOISE_BITS: u32 = 5;

const GRADIENT_MAX: usize = 256;
const STEP_MAX: i32 = 1 << VALUE_NOISE_BITS;

const NOISE_SEED: u64 = 0x6c0b_e5ca_9e00_0001;

/// Darkest shade the pass produces.
pub const MAX_SHADE: u8 = 31;

const CURVE_OFFSET: i16 = 15;
const CURVE_STEPS: [i32; 16] = [1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 9, 12, 16, 20, 30];

/// Geoscape shade (0..=31) to battlescape shade (0..=15).
const WORLD_SHADES: [u8; 32] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 11, 11, 12, 12, 13, 13,
    14, 15, 15,
];

const MONTH_START: [u32; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];
const MONTH_START_LEAP: [u32; 13] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366];

#[inline(always)]
const fn bit_mask(bits: u32) -> i32 {
    (1 << bits) - 1
}

/// Shade level of the terminator curve at gradient index `i`. The curve is
/// symmetric around the midpoint, flat far from it and steep near it.
fn shade_curve(i: i32) -> i16 {
    let j = i - (GRADIENT_MAX / 2) as i32;
    let lit_side = j >= 0;
    let direction: i16 = if lit_side { 1 } else { -1 };
    let mut offset = if lit_side { j + 1 } else { -j };
    let mut shade = CURVE_OFFSET + lit_side as i16;
    for &width in &CURVE_STEPS {
        if offset < width {
            break;
        }
        shade += direction;
        offset -= width;
    }
    shade
}

/// Precomputed terminator gradient and noise tile. Immutable once built.
pub struct ShadeTable {
    gradient: [i16; GRADIENT_MAX],
    /// 32 / width of the plateau the index sits on.
    step: [i16; GRADIENT_MAX],
    /// Position inside the plateau, scaled to 0..32.
    seq: [i16; GRADIENT_MAX],
    /// Jump to the next plateau.
    diff: [i16; GRADIENT_MAX],
    noise: Box<[i16]>,
}

impl ShadeTable {
    pub fn new() -> Self {
        Self::with_seed(NOISE_SEED)
    }

    /// Build with a specific noise seed.
    pub fn with_seed(seed: u64) -> Self {
        let mut gradient = [0i16; GRADIENT_MAX];
        let mut step = [0i16; GRADIENT_MAX];
        let mut seq = [0i16; GRADIENT_MAX];
        let mut diff = [0i16; GRADIENT_MAX];

        let mut fill = |start: usize, end: usize, from: i16, to: i16| {
            let width = (end - start) as i32;
            for p in start..end {
                diff[p] = to - from;
                step[p] = (STEP_MAX / width) as i16;
                seq[p] = (STEP_MAX * (p - start) as i32 / width) as i16;
            }
        };

        let mut last_value = shade_curve(0);
        let mut last_index = 0;
        for i in 0..GRADIENT_MAX {
            let t = shade_curve(i as i32);
            if t != last_value {
                fill(last_index, i, last_value, t);
                last_value = t;
                last_index = i;
            }
            gradient[i] = t;
        }
        fill(last_index, GRADIENT_MAX, last_value, shade_curve(GRADIENT_MAX as i32));

        let mut rng = Pcg32::seed_from_u64(seed);
        let max = bit_mask(MULTIPLIER_NOISE_BITS + DISTANCE_NOISE_BITS + VALUE_NOISE_BITS) as i16;
        let noise = (0..NOISE_SIZE * NOISE_SIZE)
            .map(|_| rng.gen_range(0..=max))
            .collect();

        Self { gradient, step, seq, diff, noise }
    }

    /// The process-wide table, built on first use.
    pub fn global() -> &'static ShadeTable {
        static TABLE: OnceLock<ShadeTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            tracing::debug!("building terminator shade table");
            ShadeTable::new()
        })
    }

    /// Noise sample for screen pixel (x, y); the tile repeats every
    /// [`NOISE_SIZE`] pixels in both directions.
    #[inline(always)]
    pub fn noise(&self, x: i32, y: i32) -> i16 {
        let nx = x.rem_euclid(NOISE_SIZE as i32) as usize;
        let ny = y.rem_euclid(NOISE_SIZE as i32) as usize;
        self.noise[ny * NOISE_SIZE + nx]
    }

    pub fn gradient(&self) -> &[i16; GRADIENT_MAX] {
        &self.gradient
    }

    pub fn diff(&self) -> &[i16; GRADIENT_MAX] {
        &self.diff
    }

    /// Shade level in `0..=31` for a surface normal lit from `sun`,
    /// dithered by `noise`. 0 is full daylight.
    #[inline(always)]
    pub fn compute_shade(&self, earth: DVec3, sun: DVec3, noise: i16) -> u8 {
        let half = (GRADIENT_MAX / 2) as f64;
        let noise = noise as i32;
        let multiplier = (noise >> (VALUE_NOISE_BITS + DISTANCE_NOISE_BITS)) & bit_mask(MULTIPLIER_NOISE_BITS);
        let distance = ((noise >> VALUE_NOISE_BITS) & bit_mask(DISTANCE_NOISE_BITS)) - (DISTANCE_NOISE_BITS / 2) as i32;
        let value = noise & bit_mask(VALUE_NOISE_BITS);

        let mut x = (earth - sun).length_squared();
        x -= 2.0;
        x *= 125.0;
        x += half;
        x -= distance as f64;
        x += (multiplier * 4) as f64 * (x - half) / GRADIENT_MAX as f64;

        let full = x.trunc();
        let rem = x - full;
        // NaN saturates to 0 here and below
        let offset = (full as i32).clamp(0, GRADIENT_MAX as i32 - 1) as usize;
        let mut shade = self.gradient[offset] as i32;

        let middle = (self.seq[offset] as f64 + self.step[offset] as f64 * rem - (STEP_MAX / 2) as f64) as i32;
        shade += middle / STEP_MAX;
        shade += (value < middle % STEP_MAX) as i32;

        shade.clamp(0, MAX_SHADE as i32) as u8
    }
}

impl Default for ShadeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// How shade levels turn into palette colours.
#[derive(Clone, Copy, Debug)]
pub struct ShadowPalette {
    /// First colour of the 32-colour ocean ramp.
    pub ocean: u8,
    /// When off, ocean pixels are darkened like land.
    pub ocean_shading: bool,
}

impl ShadowPalette {
    #[inline(always)]
    pub fn is_ocean(&self, color: u8) -> bool {
        self.ocean_shading && color >= self.ocean && (color as u16) < self.ocean as u16 + 32
    }

    #[inline(always)]
    pub fn ocean_shade(&self, shade: u8) -> u8 {
        self.ocean.wrapping_add(shade)
    }

    /// Darken a land colour by a third of `shade`, staying inside its
    /// colour group.
    #[inline(always)]
    pub fn land_shade(&self, dest: u8, shade: u8) -> u8 {
        if shade == 0 {
            return dest;
        }
        let e = dest as u16 + (shade / 3) as u16;
        let last = ((dest & COLOR_GROUP) + COLOR_SHADE) as u16;
        e.min(last) as u8
    }

    /// Shadow one globe pixel. Pixels off the disk (zero normal) and
    /// transparent pixels are cleared.
    #[inline(always)]
    pub fn shade_pixel(&self, dest: &mut u8, table: &ShadeTable, earth: DVec3, sun: DVec3, noise: i16) {
        if *dest != 0 && earth.z != 0.0 {
            let shade = table.compute_shade(earth, sun, noise);
            *dest = if self.is_ocean(*dest) {
                self.ocean_shade(shade)
            } else {
                self.land_shade(*dest, shade)
            };
        } else {
            *dest = 0;
        }
    }
}

/// Direction of the sun as seen from the globe frame of a view centred on
/// (lon, lat). With `seasons` the sun also drifts north and south over the
/// year.
pub fn sun_direction(time: &GameTime, lon: f64, lat: f64, seasons: bool) -> DVec3 {
    let rot = time.daylight() * TAU;

    let sun = if seasons {
        let month = (time.month.clamp(1, 12) - 1) as usize;
        let day = time.day.saturating_sub(1) as f64;
        let (starts, length) = if is_leap_year(time.year) {
            (&MONTH_START_LEAP, 366.0)
        } else {
            (&MONTH_START, 365.0)
        };
        // Shifted so the spring equinox starts the year
        let mut cur_day = (starts[month] as f64 + day + time.day_fraction()) / length - 0.219;
        if cur_day < 0.0 {
            cur_day += 1.0;
        }
        -0.261 * (cur_day * TAU).sin()
    } else {
        0.0
    };

    let (sin_rot, cos_rot) = (rot + lon).sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let mut dir = DVec3::new(cos_rot, sin_rot * -sin_lat, sin_rot * cos_lat);
    let pole = DVec3::new(0.0, cos_lat, sin_lat);

    dir *= if sun > 0.0 { 1.0 - sun } else { 1.0 + sun };
    dir += pole * sun;
    dir.normalize_or_zero()
}

/// Battlescape shade for a geoscape shade level.
pub fn world_shade(shade: u8) -> u8 {
    WORLD_SHADES[shade.min(MAX_SHADE) as usize]
}
