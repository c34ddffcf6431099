//! TUI rendering — the thermal grid drawn as half-block pixel pairs.
//!
//! ┌──────────────────────────────────────────────┐
//! │  🌡 openthermal   watching: amg8833   #214   │
//! ├──────────────────────────────────────────────┤
//! │                   OCCUPIED                   │
//! ├──────────────────────────────────────────────┤
//! │  ╭ 8x8 cells · peak 31.2°C ────────────────╮ │
//! │  │ ▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀ │ │
//! │  │ ▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀▀ │ │
//! │  ╰──────────────────────────────────────────╯ │
//! ├──────────────────────────────────────────────┤
//! │  frames 214   malformed 0   idle ticks 3     │
//! │  up 03:34                             LIVE   │
//! ├──────────────────────────────────────────────┤
//! │  q: quit                                     │
//! └──────────────────────────────────────────────┘
//!
//! Each character cell carries two vertically stacked pixels: the `▀`
//! glyph's foreground is the upper pixel, its background the lower one.

use std::time::Duration;

use ratatui::{prelude::*, widgets::*};

use openthermal_core::{Rgb, Surface, occupancy_color, paint};

use super::app::{App, LinkStatus};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(1), // occupancy band
            Constraint::Min(6),    // thermal grid
            Constraint::Length(4), // link + counters
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_occupancy(f, rows[1], app);
    draw_grid(f, rows[2], app);
    draw_stats(f, rows[3], app);
    draw_keys(f, rows[4]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let config = app.config();
    let snap = app.stats();
    let position = snap
        .last_position
        .map(|p| format!("#{p}"))
        .unwrap_or_else(|| "—".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 🌡 openthermal ", Style::default().bold().fg(Color::Cyan)),
            Span::raw(" watching: "),
            Span::styled(
                config.stream.clone(),
                Style::default().bold().fg(Color::Yellow),
            ),
            Span::styled(
                format!("  {}  {position} ", config.endpoint),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

fn draw_occupancy(f: &mut Frame, area: Rect, app: &App) {
    let state = app.presentation();
    let (label, style) = if !state.has_data {
        ("NO DATA YET", Style::default().fg(Color::DarkGray))
    } else {
        let occupied = state.frame.occupied;
        let label = if occupied { "OCCUPIED" } else { "CLEAR" };
        let text = if occupied { Color::White } else { Color::Black };
        (
            label,
            Style::default()
                .bg(tty_color(occupancy_color(occupied)))
                .fg(text)
                .bold(),
        )
    };

    let band = Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(band, area);
}

fn draw_grid(f: &mut Frame, area: Rect, app: &App) {
    let state = app.presentation();

    let title = match (state.has_data, state.frame.peak()) {
        (true, Some(peak)) => format!(
            " {}x{} cells · peak {peak:.1}°C ",
            state.frame.rows(),
            state.frame.cols()
        ),
        _ => " thermal grid ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }
    if !state.has_data || state.frame.is_empty() {
        let hint = if state.has_data {
            "frame has no cells"
        } else {
            "waiting for frames…"
        };
        let p = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
        f.render_widget(p, inner);
        return;
    }

    let mut canvas = CellCanvas::new(inner.width as usize, inner.height as usize * 2);
    paint(&state.frame, &mut canvas);

    let mut lines = Vec::with_capacity(inner.height as usize);
    for row in 0..inner.height as usize {
        let mut spans = Vec::with_capacity(inner.width as usize);
        for col in 0..inner.width as usize {
            let top = canvas.pixel(col, row * 2);
            let bottom = canvas.pixel(col, row * 2 + 1);
            let style = Style::default()
                .fg(top.map(tty_color).unwrap_or(Color::Reset))
                .bg(bottom.map(tty_color).unwrap_or(Color::Reset));
            spans.push(Span::styled("▀", style));
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
    let snap = app.stats();
    let status = app.status();
    let (status_style, detail) = match &status {
        LinkStatus::Connecting => (
            Style::default().fg(Color::DarkGray),
            "resolving tail…".to_string(),
        ),
        LinkStatus::Live => (
            Style::default().fg(Color::Green).bold(),
            format!("up {}", format_elapsed(app.uptime())),
        ),
        LinkStatus::Ended => (
            Style::default().fg(Color::Yellow).bold(),
            "stream ended, last frame retained".to_string(),
        ),
        LinkStatus::Failed(message) => (Style::default().fg(Color::Red).bold(), message.clone()),
    };

    let position = snap
        .last_position
        .map(|p| format!("#{p}"))
        .unwrap_or_else(|| "—".to_string());
    let lines = vec![
        Line::from(format!(
            "frames {}   malformed {}   idle ticks {}   last {position}",
            snap.frames, snap.decode_errors, snap.empty_batches
        )),
        Line::from(Span::styled(detail, status_style)),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(Span::styled(
            format!(" {} ", status.label()),
            status_style,
        )));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let keys = Paragraph::new(" q / esc: quit ").style(Style::default().fg(Color::DarkGray));
    f.render_widget(keys, area);
}

fn tty_color(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

// ---------------------------------------------------------------------------
// CellCanvas
// ---------------------------------------------------------------------------

/// A pixel buffer the heat-map painter draws into, later blitted to the
/// terminal two pixels per character cell.
///
/// Rectangle edges round to the nearest pixel boundary. Adjacent cells
/// share their computed edges, so the rounded rectangles tile the buffer
/// with no gaps and no overlap.
struct CellCanvas {
    cols: usize,
    rows: usize,
    pixels: Vec<Option<Rgb>>,
}

impl CellCanvas {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            pixels: vec![None; cols * rows],
        }
    }

    fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.pixels[y * self.cols + x]
    }
}

impl Surface for CellCanvas {
    fn width(&self) -> f64 {
        self.cols as f64
    }

    fn height(&self) -> f64 {
        self.rows as f64
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let x0 = x.round().max(0.0) as usize;
        let y0 = y.round().max(0.0) as usize;
        let x1 = ((x + w).round().max(0.0) as usize).min(self.cols);
        let y1 = ((y + h).round().max(0.0) as usize).min(self.rows);
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels[py * self.cols + px] = Some(color);
            }
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
