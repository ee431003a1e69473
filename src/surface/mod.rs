mod draw;

pub use draw::{draw_line, draw_textured_polygon, fill_circle};

/// Palette-indexed raster. Index 0 is transparent: blits skip it and the
/// terminal shows it as background.
#[derive(Clone)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height],
        }
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Resize, discarding the current contents.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Pixel at (x, y); out-of-range reads are transparent.
    #[inline(always)]
    pub fn get_pixel(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(0, |i| self.pixels[i])
    }

    /// Set a pixel, ignoring out-of-range coordinates.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Raw rows for batch writes.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.pixels.chunks_mut(self.width.max(1))
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Copy every non-transparent pixel onto `dest` at the same position.
    pub fn blit(&self, dest: &mut Surface) {
        let w = self.width.min(dest.width);
        let h = self.height.min(dest.height);
        for y in 0..h {
            let src = &self.pixels[y * self.width..y * self.width + w];
            let dst = &mut dest.pixels[y * dest.width..y * dest.width + w];
            for (d, &s) in dst.iter_mut().zip(src) {
                if s != 0 {
                    *d = s;
                }
            }
        }
    }

    /// Draw this surface onto `dest` with its top-left corner at (x, y),
    /// combining each destination pixel with the source pixel through `f`.
    pub fn blit_with(&self, dest: &mut Surface, x: i32, y: i32, mut f: impl FnMut(&mut u8, u8)) {
        for sy in 0..self.height {
            for sx in 0..self.width {
                if let Some(i) = dest.index(x + sx as i32, y + sy as i32) {
                    f(&mut dest.pixels[i], self.pixels[sy * self.width + sx]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut surface = Surface::new(4, 4);
        surface.set_pixel(-1, 0, 9);
        surface.set_pixel(4, 0, 9);
        assert_eq!(surface.get_pixel(-1, 0), 0);
        assert_eq!(surface.get_pixel(4, 3), 0);
        assert!(surface.rows_mut().all(|row| row.iter().all(|&p| p == 0)));
    }

    #[test]
    fn test_blit_skips_transparent() {
        let mut top = Surface::new(2, 1);
        top.set_pixel(1, 0, 7);
        let mut bottom = Surface::new(2, 1);
        bottom.set_pixel(0, 0, 3);
        bottom.set_pixel(1, 0, 3);
        top.blit(&mut bottom);
        assert_eq!(bottom.row(0), &[3, 7]);
    }

    #[test]
    fn test_blit_with_offset() {
        let mut sprite = Surface::new(2, 2);
        sprite.set_pixel(0, 0, 5);
        let mut dest = Surface::new(4, 4);
        sprite.blit_with(&mut dest, 2, 1, |d, s| {
            if s != 0 {
                *d = s + 1;
            }
        });
        assert_eq!(dest.get_pixel(2, 1), 6);
        assert_eq!(dest.get_pixel(3, 2), 0);
    }
}
