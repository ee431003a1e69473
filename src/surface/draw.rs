use crate::geo::ScreenPoint;
use crate::surface::Surface;

/// Plot palette index `color` from (x0, y0) to (x1, y1), both ends
/// included. One pixel per step along the longer axis; the shorter axis is
/// rounded to the nearest pixel. Pixels off the surface are skipped.
pub fn draw_line(surface: &mut Surface, x0: i32, y0: i32, x1: i32, y1: i32, color: u8) {
    let (dx, dy) = (x1 - x0, y1 - y0);
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        surface.set_pixel(x0, y0, color);
        return;
    }
    let (step_x, step_y) = (dx as f64 / steps as f64, dy as f64 / steps as f64);
    for i in 0..=steps {
        let t = i as f64;
        surface.set_pixel(
            x0 + (step_x * t).round() as i32,
            y0 + (step_y * t).round() as i32,
            color,
        );
    }
}

/// Fill a circle, clipped to the surface
pub fn fill_circle(surface: &mut Surface, cx: i32, cy: i32, radius: i32, color: u8) {
    let w = surface.width() as i32;
    let h = surface.height() as i32;
    let r2 = radius as i64 * radius as i64;
    for y in (cy - radius).max(0)..=(cy + radius).min(h - 1) {
        let dy = (y - cy) as i64;
        let span = ((r2 - dy * dy).max(0) as f64).sqrt() as i32;
        let x0 = (cx - span).max(0);
        let x1 = (cx + span).min(w - 1);
        for x in x0..=x1 {
            surface.set_pixel(x, y, color);
        }
    }
}

/// Fill a polygon with a texture tiled in screen space (even-odd rule).
/// Transparent texels leave the destination untouched.
pub fn draw_textured_polygon(surface: &mut Surface, points: &[ScreenPoint], texture: &Surface) {
    if points.len() < 3 || texture.width() == 0 || texture.height() == 0 {
        return;
    }

    let h = surface.height() as i32;
    let w = surface.width() as i32;
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(-1).min(h - 1);

    let tw = texture.width() as i32;
    let th = texture.height() as i32;
    let mut crossings: Vec<i32> = Vec::with_capacity(points.len());

    for y in min_y..=max_y {
        // Sample at the pixel centre so shared edges are not filled twice
        let scan = y as f64 + 0.5;
        crossings.clear();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            let (ay, by) = (a.y as f64, b.y as f64);
            if (ay <= scan) != (by <= scan) {
                let t = (scan - ay) / (by - ay);
                let x = a.x as f64 + t * (b.x - a.x) as f64;
                crossings.push(x.round() as i32);
            }
        }
        crossings.sort_unstable();

        for pair in crossings.chunks_exact(2) {
            let x0 = pair[0].max(0);
            let x1 = (pair[1] - 1).min(w - 1);
            for x in x0..=x1 {
                let texel = texture.get_pixel(x.rem_euclid(tw), y.rem_euclid(th));
                if texel != 0 {
                    surface.set_pixel(x, y, texel);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut surface = Surface::new(10, 1);
        draw_line(&mut surface, 0, 0, 9, 0, 4);
        assert!(surface.row(0).iter().all(|&p| p == 4));
    }

    #[test]
    fn test_vertical_line() {
        let mut surface = Surface::new(1, 8);
        draw_line(&mut surface, 0, 0, 0, 7, 2);
        assert!((0..8).all(|y| surface.get_pixel(0, y) == 2));
    }

    #[test]
    fn test_diagonal_line_hits_both_ends() {
        let mut surface = Surface::new(8, 8);
        draw_line(&mut surface, 6, 1, 0, 4, 3);
        assert_eq!(surface.get_pixel(6, 1), 3);
        assert_eq!(surface.get_pixel(0, 4), 3);
        // One pixel per column along the longer axis
        for x in 0..=6 {
            assert_eq!((0..8).filter(|&y| surface.get_pixel(x, y) == 3).count(), 1);
        }
    }

    #[test]
    fn test_line_off_surface_skipped() {
        let mut surface = Surface::new(4, 1);
        draw_line(&mut surface, -3, 0, 6, 0, 5);
        assert!(surface.row(0).iter().all(|&p| p == 5));
        let mut dot = Surface::new(2, 2);
        draw_line(&mut dot, 1, 1, 1, 1, 7);
        assert_eq!(dot.get_pixel(1, 1), 7);
        assert_eq!(dot.get_pixel(0, 0), 0);
    }

    #[test]
    fn test_fill_circle_clipped() {
        let mut surface = Surface::new(5, 5);
        fill_circle(&mut surface, 0, 0, 10, 1);
        assert!((0..5).all(|y| surface.row(y).iter().all(|&p| p == 1)));
    }

    #[test]
    fn test_textured_square() {
        let mut texture = Surface::new(2, 2);
        texture.set_pixel(0, 0, 9);
        texture.set_pixel(1, 0, 9);
        texture.set_pixel(0, 1, 9);
        texture.set_pixel(1, 1, 9);

        let mut surface = Surface::new(8, 8);
        let square = [
            ScreenPoint::new(2, 2),
            ScreenPoint::new(6, 2),
            ScreenPoint::new(6, 6),
            ScreenPoint::new(2, 6),
        ];
        draw_textured_polygon(&mut surface, &square, &texture);
        assert_eq!(surface.get_pixel(3, 3), 9);
        assert_eq!(surface.get_pixel(5, 5), 9);
        assert_eq!(surface.get_pixel(1, 3), 0);
        assert_eq!(surface.get_pixel(6, 3), 0);
        assert_eq!(surface.get_pixel(3, 6), 0);
    }
}
