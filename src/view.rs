//! Render model of a palette.
//!
//! Every state change produces a brand new [`RenderedPalette`]; nothing is
//! patched in place. Front-ends (the terminal widget, or a host that draws
//! real DOM) only ever translate this model into their own primitives.

use std::time::Duration;

use image::{Rgba, RgbaImage};

use crate::color::{self, Color, Contrast};
use crate::settings::{AliasMode, CopyFormat, Direction, PluginSettings, DEFAULT_WIDTH};
use crate::state::{Palette, Status};

/// Height of the invalid-palette placeholder.
pub const INVALID_HEIGHT: f64 = 150.0;

const MIN_FONT_SIZE: f64 = 10.0;
const BASE_FONT_SIZE: f64 = 16.0;

const NOT_ENOUGH_STOPS: &str = "There are not enough valid color stops to create the gradient.";

/// Per-render inputs that do not belong to the palette itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub plugin: &'a PluginSettings,
    pub edit_mode: bool,
    /// Measured width of the host container, 0 when unknown.
    pub container_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPalette {
    pub width: f64,
    pub height: f64,
    pub direction: Direction,
    pub hover: bool,
    /// Content is wider than the default width and should scroll.
    pub scroll: bool,
    pub corners: bool,
    pub edit_mode: bool,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Invalid(InvalidPlaceholder),
    Gradient(GradientSurface),
    Swatches(Vec<SwatchCell>),
}

/// Stand-in drawn instead of a palette that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidPlaceholder {
    pub status: Status,
    pub message: String,
    /// One-shot attention animation, when enabled.
    pub pulse: Option<Pulse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    /// How long the pulse runs before it is removed.
    pub duration: Duration,
    /// Length of a single pulse cycle.
    pub period: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwatchCell {
    /// Palette entry as written, used as the background value.
    pub color: String,
    pub foreground: Contrast,
    pub flex_basis: f64,
    /// Uppercased color text; absent when an alias replaces it.
    pub text: Option<String>,
    pub alias: String,
    pub edit: Option<EditCell>,
}

/// Editable face of a swatch while edit mode is on.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCell {
    pub text: String,
    pub font_size: f64,
}

/// A request to put text on the clipboard. Fulfilling it is up to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub text: String,
    pub notice: String,
}

impl CopyRequest {
    pub fn new(color: &str, format: CopyFormat) -> Self {
        let text = match format {
            CopyFormat::Raw => color.to_string(),
            CopyFormat::Value => copy_value(color),
        };
        Self {
            notice: format!("Copied {text}"),
            text,
        }
    }
}

fn copy_value(color: &str) -> String {
    if let Some((_, hex)) = color.split_once('#') {
        return hex.to_string();
    }
    match (color.find('('), color.rfind(')')) {
        (Some(open), Some(close)) if open < close => color[open + 1..close].to_string(),
        _ => color.to_string(),
    }
}

/// Longest pixel strip a gradient keeps, whatever size it is drawn at.
pub const MAX_GRADIENT_PIXELS: u32 = 4096;

/// Continuous surface interpolating the palette colors, backed by a pixel
/// strip so pointer positions can be sampled.
///
/// The strip runs along the gradient axis and holds at most
/// [`MAX_GRADIENT_PIXELS`]; positions on larger surfaces are scaled onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSurface {
    /// Offsets in [0, 1] with the color at that offset.
    pub stops: Vec<(f32, Color)>,
    pub direction: Direction,
    width: u32,
    height: u32,
    pixels: RgbaImage,
}

impl GradientSurface {
    /// Build a surface from palette entries. Entries that are not colors are
    /// skipped; fewer than two usable stops is an error.
    pub fn new(colors: &[String], width: u32, height: u32, direction: Direction) -> Result<Self, &'static str> {
        let last = colors.len().saturating_sub(1).max(1) as f32;
        let stops: Vec<(f32, Color)> = colors
            .iter()
            .enumerate()
            .filter_map(|(i, c)| Color::parse(c).ok().map(|color| (i as f32 / last, color)))
            .collect();
        if stops.len() <= 1 {
            return Err(NOT_ENOUGH_STOPS);
        }

        let width = width.max(1);
        let height = height.max(1);
        let strip = Self::axis_len(direction, width, height).min(MAX_GRADIENT_PIXELS);
        let line: Vec<Rgba<u8>> = (0..strip).map(|i| interpolate(&stops, position(i, strip))).collect();
        let pixels = match direction {
            // Columns flow left to right, so the gradient runs horizontally.
            Direction::Column => RgbaImage::from_fn(strip, 1, |x, _| line[x as usize]),
            Direction::Row => RgbaImage::from_fn(1, strip, |_, y| line[y as usize]),
        };

        Ok(Self {
            stops,
            direction,
            width,
            height,
            pixels,
        })
    }

    fn axis_len(direction: Direction, width: u32, height: u32) -> u32 {
        match direction {
            Direction::Column => width,
            Direction::Row => height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color under a pointer position, clamped to the surface.
    pub fn sample(&self, x: u32, y: u32) -> Color {
        let (at, len) = match self.direction {
            Direction::Column => (x.min(self.width - 1), self.width),
            Direction::Row => (y.min(self.height - 1), self.height),
        };
        let strip = self.pixels.width().max(self.pixels.height());
        let index = if len <= 1 {
            0
        } else {
            (at as u64 * (strip - 1) as u64 / (len - 1) as u64) as u32
        };
        let pixel = match self.direction {
            Direction::Column => self.pixels.get_pixel(index, 0),
            Direction::Row => self.pixels.get_pixel(0, index),
        };
        let Rgba([r, g, b, a]) = *pixel;
        Color::with_alpha(r, g, b, a)
    }

    /// Tooltip text for a pointer position.
    pub fn tooltip(&self, x: u32, y: u32) -> String {
        self.sample(x, y).to_hex().to_uppercase()
    }

    /// Click-to-copy at a pointer position.
    pub fn copy(&self, x: u32, y: u32, format: CopyFormat) -> CopyRequest {
        CopyRequest::new(&self.tooltip(x, y), format)
    }
}

fn position(i: u32, len: u32) -> f32 {
    if len <= 1 {
        0.0
    } else {
        i as f32 / (len - 1) as f32
    }
}

/// Color at `t` along the stops, interpolated per channel in sRGB space
/// like a CSS linear gradient.
fn interpolate(stops: &[(f32, Color)], t: f32) -> Rgba<u8> {
    let (first_offset, first) = stops[0];
    let (last_offset, last) = stops[stops.len() - 1];

    let (from, to, factor) = if t <= first_offset {
        (first, first, 0.0)
    } else if t >= last_offset {
        (last, last, 0.0)
    } else {
        let pair = stops
            .windows(2)
            .find(|w| t >= w[0].0 && t <= w[1].0)
            .unwrap_or(&stops[stops.len() - 2..]);
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        let span = end - start;
        (from, to, if span > 0.0 { (t - start) / span } else { 0.0 })
    };

    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * factor).round().clamp(0.0, 255.0) as u8;
    Rgba([
        lerp(from.r, to.r),
        lerp(from.g, to.g),
        lerp(from.b, to.b),
        lerp(from.a, to.a),
    ])
}

/// Width a palette is drawn at.
///
/// A user width larger than the default always wins. Otherwise the palette
/// shrinks to a narrower container, but never grows past the user width.
pub fn palette_width(user_width: f64, default_width: f64, container_width: f64) -> f64 {
    if user_width > default_width {
        user_width
    } else if container_width > 0.0 && container_width < user_width {
        container_width
    } else {
        user_width
    }
}

/// Rebuild the render model of `palette` from scratch.
pub fn render(palette: &Palette, ctx: &RenderContext<'_>) -> RenderedPalette {
    let settings = &palette.settings;
    let plugin = ctx.plugin;
    let width = palette_width(settings.width, DEFAULT_WIDTH, ctx.container_width);
    let editing = ctx.edit_mode && !settings.gradient;

    let mut rendered = RenderedPalette {
        width,
        height: settings.height,
        direction: settings.direction,
        hover: if editing {
            plugin.hover_while_editing && settings.hover
        } else {
            settings.hover
        },
        scroll: width > DEFAULT_WIDTH,
        corners: plugin.corners,
        edit_mode: editing,
        body: Body::Swatches(Vec::new()),
    };

    if !palette.status.is_valid() {
        let message = palette
            .diagnostic()
            .map(|err| err.to_string())
            .unwrap_or_else(|| palette.status.default_message().to_string());
        return invalid(rendered, palette.status, message, plugin);
    }

    if settings.gradient {
        let pixel_width = width.max(1.0).round() as u32;
        let pixel_height = settings.height.max(1.0).round() as u32;
        return match GradientSurface::new(&palette.colors, pixel_width, pixel_height, settings.direction) {
            Ok(surface) => {
                rendered.body = Body::Gradient(surface);
                rendered
            }
            Err(message) => invalid(rendered, Status::InvalidGradient, message.to_string(), plugin),
        };
    }

    rendered.body = Body::Swatches(swatches(palette, editing, plugin.alias_mode));
    rendered
}

fn invalid(mut rendered: RenderedPalette, status: Status, message: String, plugin: &PluginSettings) -> RenderedPalette {
    log::warn!("palette: {status}: {message}");
    rendered.height = INVALID_HEIGHT;
    rendered.scroll = false;
    rendered.edit_mode = false;
    rendered.body = Body::Invalid(InvalidPlaceholder {
        status,
        message,
        pulse: plugin.error_pulse.then(|| Pulse {
            duration: plugin.notice_duration(),
            period: plugin.notice_duration() / 2,
        }),
    });
    rendered
}

fn swatches(palette: &Palette, editing: bool, alias_mode: AliasMode) -> Vec<SwatchCell> {
    let count = palette.colors.len();
    let flex_basis = palette.settings.height / count.max(1) as f64 / 2.0;
    // Row layouts are too narrow for inline editing.
    let editable = editing && palette.settings.direction != Direction::Row;

    palette
        .colors
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let alias = palette.alias(i).to_string();
            let show_text = alias_mode == AliasMode::Both || alias.trim().is_empty();
            SwatchCell {
                color: entry.clone(),
                foreground: color::contrast_for(entry),
                flex_basis,
                text: show_text.then(|| entry.to_uppercase()),
                edit: editable.then(|| EditCell {
                    text: if alias.is_empty() {
                        entry.to_uppercase()
                    } else {
                        alias.clone()
                    },
                    font_size: (BASE_FONT_SIZE - count as f64).max(MIN_FONT_SIZE),
                }),
                alias,
            }
        })
        .collect()
}

impl RenderedPalette {
    /// Click-to-copy on swatch `index`.
    pub fn copy_swatch(&self, index: usize, format: CopyFormat) -> Option<CopyRequest> {
        match &self.body {
            Body::Swatches(cells) => cells.get(index).map(|cell| CopyRequest::new(&cell.color, format)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(plugin: &PluginSettings) -> RenderContext<'_> {
        RenderContext {
            plugin,
            edit_mode: false,
            container_width: 0.0,
        }
    }

    #[test]
    fn three_colors_render_three_cells() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#FF0000,#00FF00,#0000FF", &plugin);
        let rendered = render(&palette, &ctx(&plugin));
        let Body::Swatches(cells) = &rendered.body else {
            panic!("expected swatches, got {:?}", rendered.body);
        };
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].flex_basis, 25.0);
        assert_eq!(cells[0].text.as_deref(), Some("#FF0000"));
        assert_eq!(cells[0].foreground, Contrast::White);
        assert!(cells[0].edit.is_none());
    }

    #[test]
    fn alias_mode_controls_color_text() {
        let source = "#fff,#000\n{\"aliases\":[\"Snow\"]}";
        let mut plugin = PluginSettings::default();
        let palette = Palette::parse(source, &plugin);

        let Body::Swatches(cells) = render(&palette, &ctx(&plugin)).body else {
            panic!("expected swatches");
        };
        assert_eq!(cells[0].text.as_deref(), Some("#FFF"));
        assert_eq!(cells[0].alias, "Snow");
        assert_eq!(cells[0].foreground, Contrast::Black);

        plugin.alias_mode = AliasMode::Alias;
        let Body::Swatches(cells) = render(&palette, &ctx(&plugin)).body else {
            panic!("expected swatches");
        };
        assert_eq!(cells[0].text, None);
        assert_eq!(cells[1].text.as_deref(), Some("#000"));
    }

    #[test]
    fn invalid_status_renders_placeholder_with_pulse() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("bogus\n{\"height\": 400}", &plugin);
        let rendered = render(&palette, &ctx(&plugin));
        assert_eq!(rendered.height, INVALID_HEIGHT);
        let Body::Invalid(placeholder) = rendered.body else {
            panic!("expected placeholder");
        };
        assert_eq!(placeholder.status, Status::InvalidColors);
        assert!(placeholder.message.contains("bogus"));
        let pulse = placeholder.pulse.unwrap();
        assert_eq!(pulse.duration, Duration::from_secs(10));
        assert_eq!(pulse.period, Duration::from_secs(5));
    }

    #[test]
    fn pulse_can_be_disabled() {
        let plugin = PluginSettings {
            error_pulse: false,
            ..Default::default()
        };
        let palette = Palette::parse("#fff\n{\"gradient\":true}", &plugin);
        let Body::Invalid(placeholder) = render(&palette, &ctx(&plugin)).body else {
            panic!("expected placeholder");
        };
        assert_eq!(placeholder.status, Status::InvalidGradient);
        assert!(placeholder.pulse.is_none());
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#000000,#ffffff\n{\"gradient\":true,\"width\":101,\"height\":10}", &plugin);
        let rendered = render(&palette, &ctx(&plugin));
        let Body::Gradient(surface) = &rendered.body else {
            panic!("expected gradient, got {:?}", rendered.body);
        };
        assert_eq!(surface.width(), 101);
        assert_eq!(surface.height(), 10);
        assert_eq!(surface.stops.len(), 2);
        assert_eq!(surface.sample(0, 5), Color::new(0, 0, 0));
        assert_eq!(surface.sample(100, 5), Color::new(255, 255, 255));
        let middle = surface.sample(50, 5);
        assert!((middle.r as i16 - 128).abs() <= 1, "middle was {middle}");
        assert_eq!(surface.tooltip(500, 500), "#FFFFFF");
    }

    #[test]
    fn huge_gradient_keeps_a_bounded_strip() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#000,#fff\n{\"gradient\":true,\"width\":1e12,\"height\":1e12}", &plugin);
        assert_eq!(palette.status, Status::Valid);
        let Body::Gradient(surface) = render(&palette, &ctx(&plugin)).body else {
            panic!("expected gradient");
        };
        assert_eq!(surface.width(), u32::MAX);
        assert_eq!(surface.height(), u32::MAX);
        assert!(surface.pixels.width() <= MAX_GRADIENT_PIXELS);
        assert_eq!(surface.pixels.height(), 1);
        assert_eq!(surface.sample(0, 0), Color::new(0, 0, 0));
        assert_eq!(surface.sample(u32::MAX, u32::MAX), Color::new(255, 255, 255));
        let middle = surface.sample(u32::MAX / 2, 0);
        assert!((middle.r as i16 - 128).abs() <= 1, "middle was {middle}");
    }

    #[test]
    fn scroll_measures_against_fixed_default_width() {
        let plugin = PluginSettings {
            width: 1200.0,
            ..Default::default()
        };
        let palette = Palette::parse("#abc,#def\n{\"width\":900}", &plugin);
        let rendered = render(&palette, &ctx(&plugin));
        assert_eq!(rendered.width, 900.0);
        assert!(rendered.scroll);
    }

    #[test]
    fn row_gradient_runs_vertically() {
        let surface = GradientSurface::new(
            &["#ff0000".to_string(), "#0000ff".to_string()],
            4,
            11,
            Direction::Row,
        )
        .unwrap();
        assert_eq!(surface.sample(0, 0), surface.sample(3, 0));
        assert_eq!(surface.sample(2, 0), Color::new(255, 0, 0));
        assert_eq!(surface.sample(2, 10), Color::new(0, 0, 255));
    }

    #[test]
    fn gradient_stop_offsets_follow_palette_index() {
        let colors: Vec<String> = ["#000", "var(--x)", "#fff"].iter().map(|s| s.to_string()).collect();
        let surface = GradientSurface::new(&colors, 10, 1, Direction::Column).unwrap();
        let offsets: Vec<f32> = surface.stops.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);
    }

    #[test]
    fn override_gradient_without_enough_real_colors_is_invalid() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("var(--a)\nvar(--b)\n{\"gradient\":true,\"override\":true}", &plugin);
        assert_eq!(palette.status, Status::Valid);
        let Body::Invalid(placeholder) = render(&palette, &ctx(&plugin)).body else {
            panic!("expected placeholder");
        };
        assert_eq!(placeholder.status, Status::InvalidGradient);
        assert_eq!(placeholder.message, NOT_ENOUGH_STOPS);
    }

    #[test]
    fn edit_mode_cells() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#abc,#def\n{\"aliases\":[\"Sky\"]}", &plugin);
        let rendered = render(
            &palette,
            &RenderContext {
                plugin: &plugin,
                edit_mode: true,
                container_width: 0.0,
            },
        );
        assert!(rendered.edit_mode);
        assert!(!rendered.hover);
        let Body::Swatches(cells) = rendered.body else {
            panic!("expected swatches");
        };
        let edit = cells[0].edit.as_ref().unwrap();
        assert_eq!(edit.text, "Sky");
        assert_eq!(edit.font_size, 14.0);
        assert_eq!(cells[1].edit.as_ref().unwrap().text, "#DEF");
    }

    #[test]
    fn row_direction_disables_inline_editing() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#abc,#def\n{\"direction\":\"row\"}", &plugin);
        let rendered = render(
            &palette,
            &RenderContext {
                plugin: &plugin,
                edit_mode: true,
                container_width: 0.0,
            },
        );
        let Body::Swatches(cells) = rendered.body else {
            panic!("expected swatches");
        };
        assert!(cells.iter().all(|c| c.edit.is_none()));
    }

    #[test]
    fn width_rule() {
        // user width above default wins
        assert_eq!(palette_width(900.0, 700.0, 400.0), 900.0);
        // narrower container shrinks the palette
        assert_eq!(palette_width(700.0, 700.0, 400.0), 400.0);
        // wider container never grows it
        assert_eq!(palette_width(500.0, 700.0, 800.0), 500.0);
        // unknown container
        assert_eq!(palette_width(700.0, 700.0, 0.0), 700.0);
    }

    #[test]
    fn wide_palettes_scroll() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#fff\n{\"width\":1200}", &plugin);
        let rendered = render(&palette, &ctx(&plugin));
        assert_eq!(rendered.width, 1200.0);
        assert!(rendered.scroll);
    }

    #[test]
    fn copy_formats() {
        assert_eq!(CopyRequest::new("#FF0000", CopyFormat::Raw).text, "#FF0000");
        assert_eq!(CopyRequest::new("#FF0000", CopyFormat::Value).text, "FF0000");
        assert_eq!(CopyRequest::new("rgb(1, 2, 3)", CopyFormat::Value).text, "1, 2, 3");
        assert_eq!(CopyRequest::new("red", CopyFormat::Value).notice, "Copied red");
    }

    #[test]
    fn copy_swatch_by_index() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#abc,#def", &plugin);
        let rendered = render(&palette, &ctx(&plugin));
        assert_eq!(rendered.copy_swatch(1, CopyFormat::Raw).unwrap().text, "#def");
        assert!(rendered.copy_swatch(5, CopyFormat::Raw).is_none());
    }
}
