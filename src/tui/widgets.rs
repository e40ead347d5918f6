use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::color::{Color as AppColor, Contrast};
use crate::settings::Direction as Axis;
use crate::view::{Body, GradientSurface, InvalidPlaceholder, RenderedPalette, SwatchCell};

/// Draws a [`RenderedPalette`]: side-by-side swatches, a sampled gradient, or
/// the invalid placeholder. Highlights the selected swatch.
pub struct PaletteWidget<'a> {
    rendered: &'a RenderedPalette,
    selected: Option<usize>,
}

impl<'a> PaletteWidget<'a> {
    pub fn new(rendered: &'a RenderedPalette, selected: Option<usize>) -> Self {
        Self { rendered, selected }
    }
}

fn to_color(c: AppColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Background for a palette entry. Entries that are not colors fall back to
/// the terminal default.
fn background(entry: &str) -> Color {
    AppColor::parse(entry).map(to_color).unwrap_or(Color::Reset)
}

fn contrast_fg(contrast: Contrast) -> Color {
    match contrast {
        Contrast::Black => Color::Black,
        Contrast::White => Color::White,
    }
}

/// Text lines shown inside a swatch, centered vertically within `height`.
fn swatch_lines(cell: &SwatchCell, height: u16) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    match &cell.edit {
        Some(edit) => {
            lines.push(Line::from(edit.text.clone()));
            lines.push(Line::from("✕"));
        }
        None => {
            if let Some(text) = &cell.text {
                lines.push(Line::from(text.clone()));
            }
            if !cell.alias.is_empty() {
                lines.push(Line::from(cell.alias.clone()));
            }
        }
    }
    let pad = (height as usize).saturating_sub(lines.len()) / 2;
    let mut padded = vec![Line::from(""); pad];
    padded.extend(lines);
    padded
}

fn split(area: Rect, count: usize, direction: Axis) -> Vec<Rect> {
    let constraints = vec![Constraint::Ratio(1, count as u32); count];
    let axis = match direction {
        Axis::Column => Direction::Horizontal,
        Axis::Row => Direction::Vertical,
    };
    Layout::default()
        .direction(axis)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

fn render_swatches(cells: &[SwatchCell], selected: Option<usize>, direction: Axis, area: Rect, buf: &mut Buffer) {
    if cells.is_empty() {
        return;
    }
    for (i, (cell, rect)) in cells.iter().zip(split(area, cells.len(), direction)).enumerate() {
        let mut style = Style::default()
            .bg(background(&cell.color))
            .fg(contrast_fg(cell.foreground));
        if selected == Some(i) {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        Paragraph::new(swatch_lines(cell, rect.height))
            .style(style)
            .alignment(Alignment::Center)
            .render(rect, buf);
    }
}

fn render_gradient(surface: &GradientSurface, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let scale = |cell: u16, cells: u16, pixels: u32| -> u32 {
        (cell as u64 * pixels as u64 / cells as u64) as u32
    };
    for y in 0..area.height {
        for x in 0..area.width {
            let px = scale(x, area.width, surface.width());
            let py = scale(y, area.height, surface.height());
            let color = to_color(surface.sample(px, py));
            buf[(area.x + x, area.y + y)].set_char(' ').set_bg(color);
        }
    }
}

fn render_invalid(placeholder: &InvalidPlaceholder, area: Rect, buf: &mut Buffer) {
    let block = Block::bordered()
        .title(placeholder.status.label())
        .border_style(Style::default().fg(Color::Red));
    Paragraph::new(placeholder.message.clone())
        .block(block)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

impl Widget for PaletteWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.rendered.edit_mode {
            "Palette (editing)"
        } else {
            "Palette"
        };
        let block = if self.rendered.corners {
            Block::bordered().border_type(ratatui::widgets::BorderType::Rounded)
        } else {
            Block::bordered()
        }
        .title(title);

        match &self.rendered.body {
            Body::Invalid(placeholder) => render_invalid(placeholder, area, buf),
            Body::Gradient(surface) => {
                let inner = block.inner(area);
                block.render(area, buf);
                render_gradient(surface, inner, buf);
            }
            Body::Swatches(cells) => {
                let inner = block.inner(area);
                block.render(area, buf);
                render_swatches(cells, self.selected, self.rendered.direction, inner, buf);
            }
        }
    }
}

/// One-line description of the selected swatch.
pub fn info_line(rendered: &RenderedPalette, selected: Option<usize>) -> Line<'static> {
    let Body::Swatches(cells) = &rendered.body else {
        return Line::from("");
    };
    let Some((i, cell)) = selected.and_then(|i| cells.get(i).map(|c| (i, c))) else {
        return Line::from(format!("  {} colors", cells.len()));
    };
    let alias = if cell.alias.is_empty() {
        String::new()
    } else {
        format!("  \"{}\"", cell.alias)
    };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            "      ",
            Style::default().bg(background(&cell.color)),
        ),
        Span::raw(format!("  {}: {}{alias}", i + 1, cell.color)),
    ])
}
