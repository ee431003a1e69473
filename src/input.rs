//! Mouse input in globe pixel coordinates, translated from crossterm events.

use crossterm::event::{MouseButton as TermButton, MouseEvent, MouseEventKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    WheelUp,
    WheelDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseKind {
    Motion,
    Press,
    Release,
}

/// One mouse event, already in globe pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseAction {
    pub kind: MouseKind,
    pub x: i32,
    pub y: i32,
    /// Movement since the previous event.
    pub xrel: i32,
    pub yrel: i32,
    /// Button pressed or released; `None` for motion.
    pub button: Option<MouseButton>,
    /// Button physically held while this event happened.
    pub held: Option<MouseButton>,
    pub time_ms: u64,
}

impl MouseAction {
    pub fn is_held(&self, button: MouseButton) -> bool {
        self.held == Some(button)
    }

    pub fn motion(x: i32, y: i32, xrel: i32, yrel: i32, held: Option<MouseButton>, time_ms: u64) -> Self {
        Self {
            kind: MouseKind::Motion,
            x,
            y,
            xrel,
            yrel,
            button: None,
            held,
            time_ms,
        }
    }

    pub fn press(x: i32, y: i32, button: MouseButton, time_ms: u64) -> Self {
        Self {
            kind: MouseKind::Press,
            x,
            y,
            xrel: 0,
            yrel: 0,
            button: Some(button),
            held: Some(button),
            time_ms,
        }
    }

    pub fn release(x: i32, y: i32, button: MouseButton, time_ms: u64) -> Self {
        Self {
            kind: MouseKind::Release,
            x,
            y,
            xrel: 0,
            yrel: 0,
            button: Some(button),
            held: None,
            time_ms,
        }
    }
}

fn map_button(button: TermButton) -> MouseButton {
    match button {
        TermButton::Left => MouseButton::Left,
        TermButton::Right => MouseButton::Right,
        TermButton::Middle => MouseButton::Middle,
    }
}

/// Turns terminal mouse events into [`MouseAction`]s.
///
/// A terminal cell is one pixel wide and two pixels tall (half-block
/// rendering), so rows are doubled. crossterm reports plain `Moved` only
/// when no button is down, which is what the lost-release check relies on.
/// Wheel events carry no button state, so they inherit the last known one.
#[derive(Debug, Default)]
pub struct MouseTranslator {
    last: Option<(i32, i32)>,
    held: Option<MouseButton>,
}

impl MouseTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `origin_row` is the terminal row where the globe area starts.
    pub fn translate(&mut self, event: MouseEvent, origin_row: u16, time_ms: u64) -> Option<MouseAction> {
        let x = event.column as i32;
        let y = (event.row.saturating_sub(origin_row) as i32) * 2;
        let (xrel, yrel) = match self.last {
            Some((lx, ly)) => (x - lx, y - ly),
            None => (0, 0),
        };
        self.last = Some((x, y));

        let mut action = match event.kind {
            MouseEventKind::Moved => {
                self.held = None;
                MouseAction::motion(x, y, xrel, yrel, None, time_ms)
            }
            MouseEventKind::Drag(b) => {
                self.held = Some(map_button(b));
                MouseAction::motion(x, y, xrel, yrel, self.held, time_ms)
            }
            MouseEventKind::Down(b) => {
                self.held = Some(map_button(b));
                MouseAction::press(x, y, map_button(b), time_ms)
            }
            MouseEventKind::Up(b) => {
                self.held = None;
                MouseAction::release(x, y, map_button(b), time_ms)
            }
            MouseEventKind::ScrollUp => MouseAction::release(x, y, MouseButton::WheelUp, time_ms),
            MouseEventKind::ScrollDown => MouseAction::release(x, y, MouseButton::WheelDown, time_ms),
            _ => return None,
        };
        if matches!(event.kind, MouseEventKind::ScrollUp | MouseEventKind::ScrollDown) {
            action.held = self.held;
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn event(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_relative_motion() {
        let mut tr = MouseTranslator::new();
        let a = tr.translate(event(MouseEventKind::Down(TermButton::Left), 10, 5), 1, 0);
        assert_eq!(a.map(|a| (a.x, a.y, a.kind)), Some((10, 8, MouseKind::Press)));

        let b = tr.translate(event(MouseEventKind::Drag(TermButton::Left), 13, 6), 1, 5);
        let b = b.expect("drag maps to motion");
        assert_eq!((b.xrel, b.yrel), (3, 2));
        assert!(b.is_held(MouseButton::Left));
    }

    #[test]
    fn test_plain_move_holds_nothing() {
        let mut tr = MouseTranslator::new();
        let a = tr.translate(event(MouseEventKind::Moved, 1, 1), 0, 0).expect("motion");
        assert_eq!(a.held, None);
        assert_eq!(a.kind, MouseKind::Motion);
    }

    #[test]
    fn test_wheel_keeps_held_button() {
        let mut tr = MouseTranslator::new();
        let a = tr.translate(event(MouseEventKind::ScrollDown, 1, 1), 0, 0).expect("wheel");
        assert_eq!(a.button, Some(MouseButton::WheelDown));
        assert_eq!(a.held, None);

        tr.translate(event(MouseEventKind::Down(TermButton::Left), 1, 1), 0, 1);
        let b = tr.translate(event(MouseEventKind::ScrollUp, 1, 1), 0, 2).expect("wheel");
        assert!(b.is_held(MouseButton::Left));
    }
}
