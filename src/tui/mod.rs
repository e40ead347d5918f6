pub mod widgets;

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::{self as term, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::color::Color as AppColor;
use crate::document::{BlockLocation, MarkdownDocument};
use crate::edit::{EditSession, Notifier, SortKey};
use crate::generate::Combination;
use crate::registry::{ResizeDebouncer, SettingsListener};
use crate::settings::{Direction as Axis, PluginSettings};
use crate::view::{CopyRequest, RenderedPalette};
use widgets::{info_line, PaletteWidget};

const IDLE_POLL: Duration = Duration::from_millis(250);

const HELP: &str = "←/→ select  e edit  a alias  x clear  d delete  </> move  s sort  g generate  c copy  q quit";

/// Keeps the most recent notice for the status line.
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<(String, Instant)>,
}

impl StatusLine {
    fn show(&mut self, message: impl Into<String>, duration: Duration) {
        self.message = Some((message.into(), Instant::now() + duration));
    }

    fn current(&self) -> Option<&str> {
        match &self.message {
            Some((text, until)) if Instant::now() < *until => Some(text),
            _ => None,
        }
    }
}

impl Notifier for StatusLine {
    fn notify(&mut self, message: &str, duration: Duration) {
        self.show(message.replace('\n', " "), duration);
    }
}

type Session = EditSession<MarkdownDocument, StatusLine>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State for the interactive editor.
pub struct TuiApp {
    session: Session,
    path: PathBuf,
    config_path: PathBuf,
    saved: String,
    selected: Option<usize>,
    /// Alias being typed, when the alias prompt is open.
    alias_input: Option<String>,
    combination: usize,
    width: f64,
    debouncer: ResizeDebouncer<()>,
    rng: StdRng,
}

impl TuiApp {
    pub fn new(
        path: PathBuf,
        config_path: PathBuf,
        markdown: String,
        block: &BlockLocation,
        plugin: PluginSettings,
        width: f64,
    ) -> Self {
        let debouncer = ResizeDebouncer::new(plugin.reload_delay());
        let session = EditSession::new(
            &block.text(),
            block.range,
            plugin,
            MarkdownDocument::new(markdown.clone()),
            StatusLine::default(),
        );
        let selected = (!session.palette().colors.is_empty()).then_some(0);
        Self {
            session,
            path,
            config_path,
            saved: markdown,
            selected,
            alias_input: None,
            combination: 0,
            width,
            debouncer,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn document(&self) -> &str {
        self.session.sink().text()
    }

    fn count(&self) -> usize {
        self.session.palette().colors.len()
    }

    fn clamp_selection(&mut self) {
        let count = self.count();
        self.selected = match self.selected {
            _ if count == 0 => None,
            Some(i) => Some(i.min(count - 1)),
            None => Some(0),
        };
    }

    fn notice(&mut self, message: impl Into<String>) {
        let duration = self.session.plugin().notice_duration();
        self.session.notifier_mut().show(message, duration);
    }

    /// Write the document when an edit changed it.
    fn persist(&mut self) -> Result<()> {
        let text = self.document().to_string();
        if text == self.saved {
            return Ok(());
        }
        std::fs::write(&self.path, &text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        log::info!("saved {}", self.path.display());
        self.saved = text;
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        if let Some(input) = self.alias_input.as_mut() {
            match key.code {
                KeyCode::Enter => {
                    let text = self.alias_input.take().unwrap_or_default();
                    if let Some(i) = self.selected {
                        let _ = self.session.set_alias(i, &text);
                    }
                }
                KeyCode::Esc => self.alias_input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            self.persist()?;
            return Ok(Flow::Continue);
        }

        let vertical = self.session.palette().settings.direction == Axis::Row;
        let (prev, next) = if vertical {
            (KeyCode::Up, KeyCode::Down)
        } else {
            (KeyCode::Left, KeyCode::Right)
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.session.edit_mode() {
                    let _ = self.session.toggle_edit_mode();
                }
                self.persist()?;
                return Ok(Flow::Quit);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.persist()?;
                return Ok(Flow::Quit);
            }
            code if code == prev => {
                self.selected = self.selected.map(|i| i.saturating_sub(1));
            }
            code if code == next => {
                self.selected = self.selected.map(|i| i + 1);
            }
            KeyCode::Char('e') => {
                let _ = self.session.toggle_edit_mode();
            }
            KeyCode::Char('a') => {
                let palette = self.session.palette();
                if self.selected.is_some() && palette.status.is_valid() && !palette.settings.gradient {
                    self.alias_input = Some(String::new());
                }
            }
            KeyCode::Char('x') => {
                if let Some(i) = self.selected {
                    let _ = self.session.clear_alias(i);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(i) = self.selected {
                    let _ = self.session.delete(i);
                }
            }
            KeyCode::Char('<') => self.shift(-1),
            KeyCode::Char('>') => self.shift(1),
            KeyCode::Char('s') => {
                let _ = self.session.sort_by(SortKey::Hue);
            }
            KeyCode::Char('g') => self.regenerate(),
            KeyCode::Char('c') => self.copy(),
            KeyCode::Char('r') => self.reload_settings()?,
            _ => {}
        }
        self.clamp_selection();
        self.persist()?;
        Ok(Flow::Continue)
    }

    fn shift(&mut self, delta: isize) {
        let Some(from) = self.selected else { return };
        let Some(to) = from.checked_add_signed(delta).filter(|&to| to < self.count()) else {
            return;
        };
        if let Ok(true) = self.session.move_swatch(from, to) {
            self.selected = Some(to);
        }
    }

    fn regenerate(&mut self) {
        let combination = Combination::ALL[self.combination % Combination::ALL.len()];
        self.combination += 1;
        let base = self
            .selected
            .and_then(|i| self.session.palette().colors.get(i).cloned())
            .and_then(|c| AppColor::parse(&c).ok());
        if self.session.regenerate(combination, base, &mut self.rng).is_ok() {
            self.notice(format!("Generated {}", combination.name()));
        }
    }

    fn copy(&mut self) {
        let rendered = self.session.render(self.width);
        let format = self.session.plugin().copy_format;
        if let Some(CopyRequest { notice, .. }) = self.selected.and_then(|i| rendered.copy_swatch(i, format)) {
            self.notice(notice);
        }
    }

    fn reload_settings(&mut self) -> Result<()> {
        let plugin = PluginSettings::load(&self.config_path)?;
        self.debouncer = ResizeDebouncer::new(plugin.reload_delay());
        self.session.settings_changed(&plugin);
        self.notice("Settings reloaded");
        Ok(())
    }

    pub fn resize(&mut self, width: u16, now: Instant) {
        self.debouncer.schedule((), width as f64, now);
    }

    /// Apply resizes whose debounce period has passed.
    pub fn tick(&mut self, now: Instant) {
        for ((), width) in self.debouncer.drain_due(now) {
            self.width = width;
        }
    }

    fn next_timeout(&self, now: Instant) -> Duration {
        self.debouncer
            .next_deadline()
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or(IDLE_POLL)
    }

    pub fn draw(&self, frame: &mut Frame) {
        let [palette_area, info_area, status_area] = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let rendered = self.session.render(self.width);
        frame.render_widget(PaletteWidget::new(&rendered, self.selected), palette_area);
        frame.render_widget(Paragraph::new(info_line(&rendered, self.selected)), info_area);

        let status = match (&self.alias_input, self.session.notifier().current()) {
            (Some(input), _) => Line::from(format!("  alias: {input}▏")).style(Style::default().fg(Color::Yellow)),
            (None, Some(message)) => Line::from(format!("  {message}")).style(Style::default().fg(Color::Cyan)),
            (None, None) => Line::from(format!("  {HELP}")).style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(Paragraph::new(status), status_area);
    }
}

fn to_term_color(color: Color) -> term::Color {
    match color {
        Color::Rgb(r, g, b) => term::Color::Rgb { r, g, b },
        Color::Black => term::Color::Black,
        Color::White => term::Color::White,
        Color::Red => term::Color::DarkRed,
        Color::Yellow => term::Color::DarkYellow,
        Color::Cyan => term::Color::DarkCyan,
        Color::DarkGray => term::Color::DarkGrey,
        _ => term::Color::Reset,
    }
}

/// Draw a palette once and write it as ANSI-colored text, for output that
/// is not an interactive terminal.
pub fn write_preview<W: Write>(out: &mut W, rendered: &RenderedPalette, width: u16, height: u16) -> Result<()> {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    PaletteWidget::new(rendered, None).render(area, &mut buf);
    for y in 0..height {
        for x in 0..width {
            let cell = &buf[(x, y)];
            queue!(
                out,
                SetForegroundColor(to_term_color(cell.fg)),
                SetBackgroundColor(to_term_color(cell.bg)),
                Print(cell.symbol())
            )?;
        }
        queue!(out, ResetColor, Print("\n"))?;
    }
    out.flush()?;
    Ok(())
}

/// Launch the interactive editor.
pub fn run(app: &mut TuiApp) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(app, &mut terminal);
    ratatui::restore();
    result
}

fn event_loop(app: &mut TuiApp, terminal: &mut ratatui::DefaultTerminal) -> Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;
        if event::poll(app.next_timeout(Instant::now()))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Event::Resize(width, _) => app.resize(width, Instant::now()),
                _ => {}
            }
        }
        app.tick(Instant::now());
    }
}
