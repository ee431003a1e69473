//! Drag-scroll: telling a click from a drag.
//!
//! Pressing the drag button snapshots the view. Motion while it is held
//! pans the globe. On release the gesture is a click if the cursor never
//! left the pixel tolerance and the press was short; the snapshot is then
//! restored and the click goes through. Otherwise the pan stays and the
//! click is swallowed.
//!
//! The terminal may drop a release event. Every motion or click made while
//! scrolling therefore checks whether the drag button is still held and
//! resolves the gesture if it is not. This is best effort: if the release
//! is lost and the next event also reports the button as held, the drag
//! simply continues.

use crate::geo::{GeoPoint, ScreenPoint};
use crate::input::{MouseAction, MouseButton};

/// Rotation per tick of the arrow keys, and the base drag-scroll scale.
pub const ROTATE_LONGITUDE: f64 = 0.10;
pub const ROTATE_LATITUDE: f64 = 0.06;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSettings {
    pub button: MouseButton,
    pub invert: bool,
    pub time_tolerance_ms: u64,
    pub pixel_tolerance: i32,
    /// Geoscape scroll speed option, higher is faster.
    pub scroll_speed: i32,
}

impl ScrollSettings {
    fn speed_divisor(&self) -> f64 {
        (self.scroll_speed / 10).max(1) as f64
    }
}

/// What a motion event did to the gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    /// Not scrolling; the event is an ordinary hover.
    Hover,
    /// The drag button turned out to be released. `revert` is the centre
    /// to restore when the gesture was a click.
    Released { revert: Option<GeoPoint> },
    /// Pan the view to `center`.
    Pan { center: GeoPoint },
}

/// How a click event resolved against the gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Click {
    /// Centre to restore before handling the click.
    pub revert: Option<GeoPoint>,
    /// False when the click ends a drag or arrives mid-drag.
    pub proceed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DragScroll {
    scrolling: bool,
    scrolled: bool,
    start: ScreenPoint,
    start_center: GeoPoint,
    total_x: i32,
    total_y: i32,
    moved_past_threshold: bool,
    started_at_ms: u64,
}

impl DragScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    pub fn moved_past_threshold(&self) -> bool {
        self.moved_past_threshold
    }

    /// Where the cursor should be reported while scrolling, so the pointer
    /// stays put as the globe turns underneath it.
    pub fn cursor_anchor(&self) -> Option<ScreenPoint> {
        self.scrolling.then_some(self.start)
    }

    /// Begin a gesture if `action` pressed the drag button.
    pub fn press(&mut self, action: &MouseAction, center: GeoPoint, settings: &ScrollSettings) {
        if action.button != Some(settings.button) {
            return;
        }
        self.scrolling = true;
        self.scrolled = false;
        self.start = ScreenPoint::new(action.x, action.y);
        self.start_center = center;
        self.total_x = 0;
        self.total_y = 0;
        self.moved_past_threshold = false;
        self.started_at_ms = action.time_ms;
    }

    /// Re-anchor the gesture on a new centre, as when zooming mid-drag.
    pub fn reanchor(&mut self, center: GeoPoint) {
        if self.scrolling {
            self.start_center = center;
            self.total_x = 0;
            self.total_y = 0;
        }
    }

    fn was_click(&self, now_ms: u64, settings: &ScrollSettings) -> bool {
        !self.moved_past_threshold && now_ms.saturating_sub(self.started_at_ms) <= settings.time_tolerance_ms
    }

    /// Force the gesture closed after a lost release.
    fn resolve_lost_release(&mut self, now_ms: u64, settings: &ScrollSettings) -> Option<GeoPoint> {
        let revert = self.was_click(now_ms, settings).then_some(self.start_center);
        self.scrolled = false;
        self.stop();
        revert
    }

    pub fn motion(
        &mut self,
        action: &MouseAction,
        current: GeoPoint,
        zoom: usize,
        settings: &ScrollSettings,
    ) -> Motion {
        if !self.scrolling {
            return Motion::Hover;
        }
        if !action.is_held(settings.button) {
            let revert = self.resolve_lost_release(action.time_ms, settings);
            tracing::debug!(reverted = revert.is_some(), "drag button released without an event");
            return Motion::Released { revert };
        }

        self.scrolled = true;
        self.total_x += action.xrel;
        self.total_y += action.yrel;
        if !self.moved_past_threshold {
            self.moved_past_threshold = self.total_x.abs() > settings.pixel_tolerance
                || self.total_y.abs() > settings.pixel_tolerance;
        }

        let scale = (zoom + 1) as f64 * 2.0 * settings.speed_divisor();
        let center = if settings.invert {
            GeoPoint::new(
                self.start_center.lon + self.total_x as f64 * ROTATE_LONGITUDE / scale,
                self.start_center.lat + self.total_y as f64 * ROTATE_LATITUDE / scale,
            )
        } else {
            GeoPoint::new(
                current.lon - action.xrel as f64 * ROTATE_LONGITUDE / scale,
                current.lat - action.yrel as f64 * ROTATE_LATITUDE / scale,
            )
        };
        Motion::Pan { center }
    }

    /// Resolve a click (press and release of one button) against the
    /// gesture. Wheel zooming is handled by the caller before this.
    pub fn click(&mut self, action: &MouseAction, settings: &ScrollSettings) -> Click {
        let mut revert = None;
        if !self.scrolling {
            return Click { revert, proceed: true };
        }

        if action.button != Some(settings.button) && !action.is_held(settings.button) {
            revert = self.resolve_lost_release(action.time_ms, settings);
            return Click { revert, proceed: true };
        }

        if action.button != Some(settings.button) {
            // Other buttons do nothing mid-drag
            return Click { revert, proceed: false };
        }
        self.stop();

        if self.was_click(action.time_ms, settings) {
            self.scrolled = false;
            revert = Some(self.start_center);
        }
        Click { revert, proceed: !self.scrolled }
    }

    /// End the gesture. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.scrolling = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ScrollSettings {
        ScrollSettings {
            button: MouseButton::Left,
            invert: false,
            time_tolerance_ms: 300,
            pixel_tolerance: 10,
            scroll_speed: 20,
        }
    }

    fn drag(x: i32, y: i32, xrel: i32, yrel: i32, t: u64) -> MouseAction {
        MouseAction::motion(x, y, xrel, yrel, Some(MouseButton::Left), t)
    }

    #[test]
    fn test_quick_click_restores_snapshot() {
        let s = settings();
        let mut ds = DragScroll::new();
        let start = GeoPoint::new(1.0, 0.2);
        ds.press(&MouseAction::press(50, 50, MouseButton::Left, 0), start, &s);
        assert!(ds.is_scrolling());

        let click = ds.click(&MouseAction::release(50, 50, MouseButton::Left, 100), &s);
        assert_eq!(click, Click { revert: Some(start), proceed: true });
        assert!(!ds.is_scrolling());
    }

    #[test]
    fn test_drag_keeps_pan_and_swallows_click() {
        let s = settings();
        let mut ds = DragScroll::new();
        let start = GeoPoint::new(1.0, 0.2);
        ds.press(&MouseAction::press(50, 50, MouseButton::Left, 0), start, &s);

        let mut center = start;
        for i in 1..=4 {
            match ds.motion(&drag(50 + 5 * i, 50, 5, 0, i as u64 * 10), center, 0, &s) {
                Motion::Pan { center: c } => center = c,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(ds.moved_past_threshold());
        assert!(center.lon < start.lon);

        let click = ds.click(&MouseAction::release(70, 50, MouseButton::Left, 100), &s);
        assert_eq!(click, Click { revert: None, proceed: false });
    }

    #[test]
    fn test_slow_press_without_motion_is_not_click_revert() {
        let s = settings();
        let mut ds = DragScroll::new();
        ds.press(&MouseAction::press(0, 0, MouseButton::Left, 0), GeoPoint::default(), &s);
        let click = ds.click(&MouseAction::release(0, 0, MouseButton::Left, 1000), &s);
        // Never moved, so nothing was scrolled and the click still happens
        assert_eq!(click, Click { revert: None, proceed: true });
    }

    #[test]
    fn test_invert_uses_totals_from_snapshot() {
        let mut s = settings();
        s.invert = true;
        let mut ds = DragScroll::new();
        let start = GeoPoint::new(0.0, 0.0);
        ds.press(&MouseAction::press(0, 0, MouseButton::Left, 0), start, &s);
        ds.motion(&drag(4, 0, 4, 0, 1), GeoPoint::new(9.0, 9.0), 1, &s);
        let out = ds.motion(&drag(8, 0, 4, 0, 2), GeoPoint::new(9.0, 9.0), 1, &s);
        let expected = 8.0 * ROTATE_LONGITUDE / (2.0 * 2.0 * 2.0);
        match out {
            Motion::Pan { center } => {
                assert!((center.lon - expected).abs() < 1e-12);
                assert_eq!(center.lat, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_lost_release_on_motion() {
        let s = settings();
        let mut ds = DragScroll::new();
        let start = GeoPoint::new(0.5, 0.0);
        ds.press(&MouseAction::press(0, 0, MouseButton::Left, 0), start, &s);

        let moved = MouseAction::motion(1, 0, 1, 0, None, 50);
        assert_eq!(ds.motion(&moved, start, 0, &s), Motion::Released { revert: Some(start) });
        assert!(!ds.is_scrolling());
        assert_eq!(ds.motion(&moved, start, 0, &s), Motion::Hover);
    }

    #[test]
    fn test_lost_release_on_other_click() {
        let s = settings();
        let mut ds = DragScroll::new();
        ds.press(&MouseAction::press(0, 0, MouseButton::Left, 0), GeoPoint::default(), &s);
        for i in 1..=3 {
            ds.motion(&drag(20 * i, 0, 20, 0, 10 * i as u64), GeoPoint::default(), 0, &s);
        }

        // Right click while left still held is ignored
        let mut right = MouseAction::release(60, 0, MouseButton::Right, 500);
        right.held = Some(MouseButton::Left);
        assert_eq!(ds.click(&right, &s), Click { revert: None, proceed: false });
        assert!(ds.is_scrolling());

        // Same click with left no longer held resolves the gesture
        right.held = None;
        assert_eq!(ds.click(&right, &s), Click { revert: None, proceed: true });
        assert!(!ds.is_scrolling());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let s = settings();
        let mut ds = DragScroll::new();
        ds.press(&MouseAction::press(3, 4, MouseButton::Left, 0), GeoPoint::default(), &s);
        assert_eq!(ds.cursor_anchor(), Some(ScreenPoint::new(3, 4)));
        ds.stop();
        ds.stop();
        assert!(!ds.is_scrolling());
        assert_eq!(ds.cursor_anchor(), None);
    }

    #[test]
    fn test_other_button_press_does_not_start() {
        let s = settings();
        let mut ds = DragScroll::new();
        ds.press(&MouseAction::press(0, 0, MouseButton::Right, 0), GeoPoint::default(), &s);
        assert!(!ds.is_scrolling());
    }
}
