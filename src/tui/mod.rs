//! Ratatui-based terminal UI.
//!
//! A sidebar lists the views; the main pane shows the selected view's
//! controls and charts. The dataset is loaded before the terminal is taken
//! over, and every key press re-renders the current view from the cache.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tracing::{debug, error};

use crate::aggregate::DEFAULT_SELECTION_LEN;
use crate::chart::ChartBody;
use crate::data::DatasetCache;
use crate::domain::{TopN, ViewKind, ViewRequest};
use crate::error::AppError;
use crate::view::{self, RenderedView, ViewPanel};

mod plotters_chart;

use plotters_chart::{ChartWidget, series_color};

/// Start the TUI on an already-opened dataset.
pub fn run(cache: DatasetCache) -> Result<(), AppError> {
    let mut app = App::new(cache)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Outcome of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Changed,
    Ignored,
}

/// Widget state for the menu and the per-view controls.
#[derive(Debug, Clone)]
struct Controls {
    kind: ViewKind,
    commodities: Vec<String>,
    /// Single selector (price over time).
    commodity: usize,
    /// Multi selector (distribution).
    cursor: usize,
    selected: Vec<bool>,
    top: TopN,
}

impl Controls {
    fn new(commodities: Vec<String>) -> Self {
        let selected = (0..commodities.len())
            .map(|i| i < DEFAULT_SELECTION_LEN)
            .collect();
        Self {
            kind: ViewKind::Description,
            commodities,
            commodity: 0,
            cursor: 0,
            selected,
            top: TopN::default(),
        }
    }

    fn request(&self) -> ViewRequest {
        match self.kind {
            ViewKind::PriceOverTime => ViewRequest::PriceOverTime {
                commodity: self
                    .commodities
                    .get(self.commodity)
                    .cloned()
                    .unwrap_or_default(),
            },
            ViewKind::Distribution => ViewRequest::Distribution {
                commodities: self
                    .commodities
                    .iter()
                    .zip(&self.selected)
                    .filter(|(_, on)| **on)
                    .map(|(c, _)| c.clone())
                    .collect(),
            },
            ViewKind::TopBottom => ViewRequest::TopBottom { n: self.top },
            ViewKind::Description => ViewRequest::Description,
            ViewKind::Regional => ViewRequest::Regional,
            ViewKind::Volatility => ViewRequest::Volatility,
            ViewKind::CategoryTrends => ViewRequest::CategoryTrends,
            ViewKind::MeanVsMedian => ViewRequest::MeanVsMedian,
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> KeyAction {
        let before = (self.kind, self.commodity, self.cursor, self.top, self.selected.clone());

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Up => self.kind = self.kind.prev(),
            KeyCode::Down => self.kind = self.kind.next(),
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Char(' ') if self.kind == ViewKind::Distribution => {
                if let Some(on) = self.selected.get_mut(self.cursor) {
                    *on = !*on;
                }
            }
            _ => return KeyAction::Ignored,
        }

        let after = (self.kind, self.commodity, self.cursor, self.top, self.selected.clone());
        if before == after {
            KeyAction::Ignored
        } else {
            KeyAction::Changed
        }
    }

    fn adjust(&mut self, delta: i32) {
        let n = self.commodities.len();
        match self.kind {
            ViewKind::PriceOverTime if n > 0 => {
                self.commodity = if delta >= 0 {
                    (self.commodity + 1) % n
                } else {
                    (self.commodity + n - 1) % n
                };
            }
            ViewKind::Distribution if n > 0 => {
                self.cursor = if delta >= 0 {
                    (self.cursor + 1).min(n - 1)
                } else {
                    self.cursor.saturating_sub(1)
                };
            }
            ViewKind::TopBottom => {
                self.top = if delta >= 0 {
                    self.top.increment()
                } else {
                    self.top.decrement()
                };
            }
            _ => {}
        }
    }

    fn has_controls(&self) -> bool {
        matches!(
            self.kind,
            ViewKind::PriceOverTime | ViewKind::Distribution | ViewKind::TopBottom
        )
    }
}

struct App {
    cache: DatasetCache,
    controls: Controls,
    view: Option<RenderedView>,
    load_line: String,
    status: String,
}

impl App {
    fn new(cache: DatasetCache) -> Result<Self, AppError> {
        let table = cache.get()?;
        let controls = Controls::new(crate::app::pipeline::commodity_options(table));
        let load_line = crate::report::format_load_summary(&cache.describe_source(), cache.summary()?);

        let mut app = Self {
            cache,
            controls,
            view: None,
            load_line,
            status: String::new(),
        };
        app.refresh();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::io(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match self.controls.handle_key(key.code) {
                        KeyAction::Quit => break,
                        KeyAction::Changed => {
                            self.refresh();
                            needs_redraw = true;
                        }
                        KeyAction::Ignored => {}
                    }
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Re-render the current view. A failed chart only blanks its own panel.
    fn refresh(&mut self) {
        let request = self.controls.request();
        debug!(?request, "refreshing view");

        match self.cache.get() {
            Ok(table) => {
                let rendered = view::select_partial(table, &request);
                let failed = rendered.panels.iter().filter(|p| p.chart.is_none()).count();
                self.status = if failed == 0 {
                    String::new()
                } else {
                    format!("{failed} chart(s) unavailable (see log)")
                };
                self.view = Some(rendered);
            }
            Err(err) => {
                error!(view = request.kind().slug(), error = %err, "view render failed");
                self.view = None;
                self.status = format!("chart unavailable: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("fp", Style::default().fg(Color::Cyan)),
                Span::raw(" | Food Price Analysis Dashboard"),
            ]),
            Line::from(Span::styled(&self.load_line, Style::default().fg(Color::Gray))),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(area);

        self.draw_menu(frame, chunks[0]);
        self.draw_main(frame, chunks[1]);
    }

    fn draw_menu(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = ViewKind::ALL
            .iter()
            .map(|kind| ListItem::new(kind.title()))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Navigation").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.controls.kind.index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_main(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let area = if self.controls.has_controls() {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(area);
            self.draw_controls(frame, chunks[0]);
            chunks[1]
        } else {
            area
        };

        let title = self.controls.kind.title();
        let Some(view) = &self.view else {
            let block = Block::default().title(title).borders(Borders::ALL);
            let msg = Paragraph::new("Chart unavailable (see status line).")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        if let Some(text) = &view.text {
            let p = Paragraph::new(text.as_str())
                .wrap(Wrap { trim: false })
                .block(Block::default().title(view.title.as_str()).borders(Borders::ALL));
            frame.render_widget(p, area);
            return;
        }

        if view.panels.is_empty() {
            return;
        }
        let n = view.panels.len() as u32;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(view.panels.iter().map(|_| Constraint::Ratio(1, n)))
            .split(area);
        for (panel, rect) in view.panels.iter().zip(rows.iter()) {
            draw_panel(frame, *rect, panel);
        }
    }

    fn draw_controls(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let c = &self.controls;
        let key = Style::default().fg(Color::Cyan);
        let (title, line) = match c.kind {
            ViewKind::PriceOverTime => {
                let name = c.commodities.get(c.commodity).map(String::as_str).unwrap_or("-");
                (
                    "Select a Commodity",
                    Line::from(vec![
                        Span::styled("◂ ", key),
                        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(" ▸", key),
                        Span::styled(
                            format!("  ({}/{})", c.commodity + 1, c.commodities.len()),
                            Style::default().fg(Color::Gray),
                        ),
                    ]),
                )
            }
            ViewKind::Distribution => ("Select Commodities", selection_line(c, area.width)),
            ViewKind::TopBottom => (
                "Select Top N",
                Line::from(vec![
                    Span::styled("◂ ", key),
                    Span::styled(c.top.get().to_string(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(" ▸", key),
                    Span::styled(
                        format!("  ({}-{})  ", TopN::MIN, TopN::MAX),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(slider(c.top), key),
                ]),
            ),
            _ => return,
        };

        let p = Paragraph::new(line).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.controls.kind {
            ViewKind::Distribution => "↑/↓ view  ←/→ move  space toggle  q quit",
            ViewKind::PriceOverTime | ViewKind::TopBottom => "↑/↓ view  ←/→ adjust  q quit",
            _ => "↑/↓ view  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_panel(frame: &mut ratatui::Frame<'_>, area: Rect, panel: &ViewPanel) {
    let title = panel.heading.as_deref().unwrap_or(panel.title.as_str());
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let Some(artifact) = &panel.chart else {
        let msg = Paragraph::new("chart unavailable").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    };

    let legend = legend_line(panel);
    let chart_rect = match &legend {
        Some(_) if inner.height > 2 => Rect {
            height: inner.height - 1,
            ..inner
        },
        _ => inner,
    };
    frame.render_widget(ChartWidget { artifact }, chart_rect);

    if let Some(line) = legend {
        if chart_rect.height < inner.height {
            let rect = Rect {
                y: inner.y + chart_rect.height,
                height: 1,
                ..inner
            };
            frame.render_widget(Paragraph::new(line), rect);
        }
    }
}

/// Series names for color-split line charts.
fn legend_line(panel: &ViewPanel) -> Option<Line<'_>> {
    let Some(ChartBody::Line { series }) = panel.body() else {
        return None;
    };
    let mut spans = Vec::new();
    for (i, s) in series.iter().enumerate() {
        let Some(name) = &s.name else {
            continue;
        };
        spans.push(Span::styled("■ ", Style::default().fg(series_color(i))));
        spans.push(Span::raw(format!("{name}  ")));
    }
    (!spans.is_empty()).then(|| Line::from(spans))
}

/// Checkbox list scrolled so the cursor stays visible.
fn selection_line(c: &Controls, width: u16) -> Line<'static> {
    if c.commodities.is_empty() {
        return Line::from("(no commodities)");
    }

    let budget = width.saturating_sub(4) as usize;
    let mut start = c.cursor;
    let mut used = 0usize;
    // Walk left from the cursor while roughly half the width is still free.
    while start > 0 && used + item_width(&c.commodities[start - 1]) < budget / 2 {
        start -= 1;
        used += item_width(&c.commodities[start]);
    }

    let mut spans = Vec::new();
    let mut used = 0usize;
    if start > 0 {
        spans.push(Span::raw("… "));
        used += 2;
    }
    for (i, name) in c.commodities.iter().enumerate().skip(start) {
        let w = item_width(name);
        if used + w > budget {
            spans.push(Span::raw("…"));
            break;
        }
        used += w;
        let mark = if c.selected.get(i).copied().unwrap_or(false) {
            "[x] "
        } else {
            "[ ] "
        };
        let mut style = Style::default();
        if i == c.cursor {
            style = style.fg(Color::Black).bg(Color::White);
        }
        spans.push(Span::styled(format!("{mark}{name}"), style));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

fn item_width(name: &str) -> usize {
    name.chars().count() + 6
}

fn slider(top: TopN) -> String {
    let filled = top.get().saturating_sub(TopN::MIN);
    let empty = TopN::MAX.saturating_sub(top.get());
    format!("[{}●{}]", "─".repeat(filled), "─".repeat(empty))
}
