use crate::app::{format_coords, App};
use crate::globe::Label;
use crate::palette::Palette;
use crate::surface::Surface;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into globe area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let widget = GlobeWidget {
        frame: app.globe.frame(),
        labels: &app.labels,
        cursor: app.cursor,
        palette: Palette::geoscape(),
    };
    frame.render_widget(widget, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn rgb(palette: &Palette, index: u8) -> Color {
    let (r, g, b) = palette.rgb(index);
    Color::Rgb(r, g, b)
}

/// Draws the globe frame two pixels per cell with upper half blocks, then
/// prints labels and the cursor on top.
struct GlobeWidget<'a> {
    frame: &'a Surface,
    labels: &'a [Label],
    cursor: Option<(i32, i32)>,
    palette: Palette,
}

impl GlobeWidget<'_> {
    fn render_pixels(&self, area: Rect, buf: &mut Buffer) {
        let rows = (self.frame.height() / 2).min(area.height as usize);
        let cols = self.frame.width().min(area.width as usize);
        for row in 0..rows {
            let top = self.frame.row(row * 2);
            let bottom = self.frame.row(row * 2 + 1);
            let y = area.y + row as u16;
            for col in 0..cols {
                let x = area.x + col as u16;
                buf[(x, y)]
                    .set_char('▀')
                    .set_fg(rgb(&self.palette, top[col]))
                    .set_bg(rgb(&self.palette, bottom[col]));
            }
        }
    }

    fn render_label(&self, label: &Label, area: Rect, buf: &mut Buffer) {
        // Labels are centred on their pixel, and pixels are half a row tall
        let len = label.text.chars().count() as i32;
        let col = label.x - len / 2;
        let row = label.y / 2;
        if row < 0 || row >= area.height as i32 {
            return;
        }
        let style = Style::default().fg(rgb(&self.palette, label.color));
        for (i, ch) in label.text.chars().enumerate() {
            let c = col + i as i32;
            if c < 0 || c >= area.width as i32 {
                continue;
            }
            buf[(area.x + c as u16, area.y + row as u16)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_pixels(area, buf);
        for label in self.labels {
            self.render_label(label, area, buf);
        }

        if let Some((cx, cy)) = self.cursor {
            let row = cy / 2;
            if cx >= 0 && row >= 0 && cx < area.width as i32 && row < area.height as i32 {
                buf[(area.x + cx as u16, area.y + row as u16)]
                    .set_char('╋')
                    .set_fg(Color::Red);
            }
        }
    }
}

fn toggle<'a>(on: bool, on_text: &'a str, off_text: &'a str) -> Span<'a> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = app.globe.settings();
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" ", dim),
        Span::styled(
            app.time_label(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(if app.paused { " ‖ " } else { "   " }, Style::default().fg(Color::Yellow)),
        Span::styled("Zoom ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        toggle(settings.detail, "[D]etail ", "[d]etail "),
        toggle(settings.radar_lines, "[R]adar ", "[r]adar "),
        toggle(app.world.debug.enabled, "[G]debug ", "[g]debug "),
    ];

    if let Some(point) = app.hover {
        let (lon, lat) = point.to_degrees();
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(format_coords(lon, lat), Style::default().fg(Color::Magenta)));
        if let Some((texture, shade)) = app.hover_terrain() {
            let terrain = match texture {
                Some(id) => format!(" tex {id}"),
                None => " ocean".to_string(),
            };
            spans.push(Span::styled(format!("{terrain} shade {shade} "), dim));
        }
    }

    if !app.message.is_empty() {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(app.message.as_str(), Style::default().fg(Color::Yellow)));
    } else if !app.picked.is_empty() {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(app.picked.join(", "), Style::default().fg(Color::Green)));
    }

    let paragraph = Paragraph::new(Line::from(spans));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette;

    #[test]
    fn test_half_blocks_pair_rows() {
        let mut surface = Surface::new(2, 4);
        surface.set_pixel(0, 0, palette::RED);
        surface.set_pixel(0, 1, palette::GREEN);
        let widget = GlobeWidget {
            frame: &surface,
            labels: &[],
            cursor: None,
            palette: Palette::geoscape(),
        };
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let colors = Palette::geoscape();
        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, rgb(&colors, palette::RED));
        assert_eq!(cell.bg, rgb(&colors, palette::GREEN));
    }

    #[test]
    fn test_label_centred_and_clipped() {
        let surface = Surface::new(10, 4);
        let labels = [Label {
            text: "ATLANTIC".into(),
            x: 0,
            y: 2,
            color: palette::WHITE,
        }];
        let widget = GlobeWidget {
            frame: &surface,
            labels: &labels,
            cursor: None,
            palette: Palette::geoscape(),
        };
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        // Left half falls off the edge
        assert_eq!(buf[(0, 1)].symbol(), "N");
        assert_eq!(buf[(3, 1)].symbol(), "C");
    }
}
