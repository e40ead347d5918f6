//! Building a new palette block from one of several color sources.

use std::path::Path;

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::codec;
use crate::color::{self, Color};
use crate::generate::{self, Combination};
use crate::settings::{PaletteSettings, PluginSettings};
use crate::state::Palette;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("a palette needs at least one color")]
    NoColors,
    #[error("not a palette URL: {0}")]
    InvalidUrl(String),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("image produced no colors")]
    EmptyImage,
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
}

/// Colors taken from an input, with optional role names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub colors: Vec<String>,
    pub aliases: Vec<String>,
}

/// One way of sourcing colors for the editor.
pub trait InputMode {
    fn name(&self) -> &'static str;
    fn extract(&mut self) -> Result<Extracted, EditorError>;
}

/// Reduces an image to a handful of representative colors.
pub trait ImageQuantizer {
    fn palette(&self, image: &RgbaImage, count: usize) -> Vec<Color>;
}

/// Colors picked one at a time.
#[derive(Debug, Clone, Default)]
pub struct ColorPickerInput {
    picked: Vec<Color>,
}

impl ColorPickerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pick(&mut self, color: Color) {
        self.picked.push(color);
    }

    pub fn pick_str(&mut self, token: &str) -> Result<(), EditorError> {
        let color = Color::parse(token).map_err(|_| EditorError::InvalidColor(token.to_string()))?;
        self.pick(color);
        Ok(())
    }
}

impl InputMode for ColorPickerInput {
    fn name(&self) -> &'static str {
        "Color Picker"
    }

    fn extract(&mut self) -> Result<Extracted, EditorError> {
        Ok(Extracted {
            colors: self.picked.iter().map(|c| c.to_hex()).collect(),
            aliases: Vec::new(),
        })
    }
}

/// Color-theory generation around an optional base.
pub struct GenerateInput {
    pub combination: Combination,
    pub base: Option<Color>,
    rng: StdRng,
}

impl GenerateInput {
    pub fn new(combination: Combination, base: Option<Color>) -> Self {
        Self::with_rng(combination, base, StdRng::from_entropy())
    }

    pub fn with_rng(combination: Combination, base: Option<Color>, rng: StdRng) -> Self {
        Self {
            combination,
            base,
            rng,
        }
    }
}

impl InputMode for GenerateInput {
    fn name(&self) -> &'static str {
        "Generate"
    }

    fn extract(&mut self) -> Result<Extracted, EditorError> {
        let generated = generate::generate(self.combination, self.base, &mut self.rng);
        Ok(Extracted {
            colors: generated.colors,
            aliases: generated.aliases,
        })
    }
}

/// Colors quantized out of an image by an external quantizer.
pub struct ImageInput<Q> {
    quantizer: Q,
    image: RgbaImage,
    count: usize,
}

impl<Q: ImageQuantizer> ImageInput<Q> {
    pub fn new(quantizer: Q, image: RgbaImage, count: usize) -> Self {
        Self {
            quantizer,
            image,
            count,
        }
    }

    pub fn open(path: &Path, quantizer: Q, count: usize) -> Result<Self, EditorError> {
        let image = image::open(path)?.to_rgba8();
        log::debug!("loaded {}x{} image from {}", image.width(), image.height(), path.display());
        Ok(Self::new(quantizer, image, count))
    }
}

impl<Q: ImageQuantizer> InputMode for ImageInput<Q> {
    fn name(&self) -> &'static str {
        "Image"
    }

    fn extract(&mut self) -> Result<Extracted, EditorError> {
        if self.image.width() == 0 || self.image.height() == 0 || self.count == 0 {
            return Err(EditorError::EmptyImage);
        }
        let colors = self.quantizer.palette(&self.image, self.count);
        if colors.is_empty() {
            return Err(EditorError::EmptyImage);
        }
        Ok(Extracted {
            colors: colors.into_iter().map(Color::to_hex).collect(),
            aliases: Vec::new(),
        })
    }
}

/// A gallery URL such as `https://coolors.co/palette/...`.
#[derive(Debug, Clone)]
pub struct UrlInput {
    pub url: String,
}

impl UrlInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl InputMode for UrlInput {
    fn name(&self) -> &'static str {
        "URL"
    }

    fn extract(&mut self) -> Result<Extracted, EditorError> {
        let url = self.url.trim();
        if !codec::is_url(url) {
            return Err(EditorError::InvalidUrl(url.to_string()));
        }
        let colors = codec::expand_url(url);
        if let Some(bad) = colors.iter().find(|c| !color::validate(c)) {
            return Err(EditorError::InvalidColor(bad.clone()));
        }
        Ok(Extracted {
            colors,
            aliases: Vec::new(),
        })
    }
}

/// Draft of a palette block, filled from any [`InputMode`].
#[derive(Debug, Clone)]
pub struct PaletteEditor {
    plugin: PluginSettings,
    colors: Vec<String>,
    settings: PaletteSettings,
}

impl PaletteEditor {
    pub fn new(plugin: PluginSettings) -> Self {
        let settings = plugin.palette_defaults();
        Self {
            plugin,
            colors: Vec::new(),
            settings,
        }
    }

    /// Start from an existing palette.
    pub fn from_palette(palette: &Palette, plugin: PluginSettings) -> Self {
        let mut editor = Self {
            plugin,
            colors: palette.colors.clone(),
            settings: palette.settings.clone(),
        };
        editor.align();
        editor
    }

    /// Replace the draft colors with what `input` yields.
    pub fn load(&mut self, input: &mut dyn InputMode) -> Result<(), EditorError> {
        let extracted = input.extract()?;
        log::debug!("{} input produced {} colors", input.name(), extracted.colors.len());
        self.colors = extracted.colors;
        self.settings.aliases = extracted.aliases;
        self.align();
        Ok(())
    }

    pub fn add_color(&mut self, color: Color) {
        self.colors.push(color.to_hex());
        self.align();
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.colors.len() {
            return false;
        }
        self.align();
        self.colors.remove(index);
        self.settings.aliases.remove(index);
        true
    }

    pub fn set_alias(&mut self, index: usize, alias: &str) -> bool {
        match self.settings.aliases.get_mut(index) {
            Some(slot) => {
                *slot = alias.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn settings(&self) -> &PaletteSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PaletteSettings {
        &mut self.settings
    }

    fn align(&mut self) {
        self.settings.aliases.resize(self.colors.len(), String::new());
    }

    /// The palette as it would render right now.
    pub fn preview(&self) -> Palette {
        Palette::rebuild(self.colors.clone(), self.settings.clone())
    }

    /// Fenced block text for the draft.
    pub fn submit(&self) -> Result<String, EditorError> {
        if self.colors.is_empty() {
            return Err(EditorError::NoColors);
        }
        Ok(codec::serialize(&self.colors, &self.settings, &self.plugin.palette_defaults()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Returns the first `count` distinct pixels in scan order.
    struct FirstPixels;

    impl ImageQuantizer for FirstPixels {
        fn palette(&self, image: &RgbaImage, count: usize) -> Vec<Color> {
            let mut out: Vec<Color> = Vec::new();
            for Rgba([r, g, b, _]) in image.pixels() {
                let c = Color::new(*r, *g, *b);
                if !out.contains(&c) {
                    out.push(c);
                }
                if out.len() == count {
                    break;
                }
            }
            out
        }
    }

    #[test]
    fn picker_then_submit() {
        let mut picker = ColorPickerInput::new();
        picker.pick(Color::new(255, 0, 0));
        picker.pick_str("blue").unwrap();
        assert!(picker.pick_str("nope").is_err());

        let mut editor = PaletteEditor::new(PluginSettings::default());
        editor.load(&mut picker).unwrap();
        assert_eq!(editor.submit().unwrap(), "```palette\n#ff0000\n#0000ff\n```\n");
    }

    #[test]
    fn remove_tolerates_short_alias_list() {
        let mut editor = PaletteEditor::new(PluginSettings::default());
        editor.add_color(Color::new(255, 0, 0));
        editor.add_color(Color::new(0, 0, 255));
        editor.settings_mut().aliases.clear();
        assert!(editor.remove(0));
        assert_eq!(editor.colors(), ["#0000ff"]);
        assert_eq!(editor.settings().aliases, vec![String::new()]);
        assert!(!editor.remove(1));
    }

    #[test]
    fn generate_keeps_role_aliases() {
        let mut input = GenerateInput::with_rng(
            Combination::Complementary,
            Some(Color::new(255, 0, 0)),
            StdRng::seed_from_u64(3),
        );
        let mut editor = PaletteEditor::new(PluginSettings::default());
        editor.load(&mut input).unwrap();
        editor.settings_mut().height = 80.0;
        assert_eq!(
            editor.submit().unwrap(),
            "```palette\n#ff0000\n#00ffff\n{\"height\":80,\"aliases\":[\"Base\",\"Complimentary Color\"]}\n```\n"
        );
    }

    #[test]
    fn url_input() {
        let mut input = UrlInput::new("https://coolors.co/palette/ff0000-00ff00");
        let extracted = input.extract().unwrap();
        assert_eq!(extracted.colors, vec!["#ff0000", "#00ff00"]);

        let mut bad = UrlInput::new("coolors.co/palette/ff0000");
        assert!(matches!(bad.extract(), Err(EditorError::InvalidUrl(_))));
        let mut junk = UrlInput::new("https://example.com/palette/zzzzzz");
        assert!(matches!(junk.extract(), Err(EditorError::InvalidColor(_))));
    }

    #[test]
    fn image_input_delegates_to_quantizer() {
        let image = RgbaImage::from_fn(4, 1, |x, _| {
            if x < 2 {
                Rgba([10, 20, 30, 255])
            } else {
                Rgba([200, 100, 0, 255])
            }
        });
        let mut input = ImageInput::new(FirstPixels, image, 5);
        let extracted = input.extract().unwrap();
        assert_eq!(extracted.colors, vec!["#0a141e", "#c86400"]);

        let mut empty = ImageInput::new(FirstPixels, RgbaImage::new(0, 0), 5);
        assert!(matches!(empty.extract(), Err(EditorError::EmptyImage)));
    }

    #[test]
    fn aliases_stay_aligned() {
        let mut editor = PaletteEditor::new(PluginSettings::default());
        editor.add_color(Color::new(0, 0, 0));
        editor.add_color(Color::new(255, 255, 255));
        assert!(editor.set_alias(1, " Paper "));
        assert!(!editor.set_alias(2, "x"));
        assert!(editor.remove(0));
        assert_eq!(editor.colors(), ["#ffffff".to_string()]);
        assert_eq!(editor.settings().aliases, vec!["Paper"]);
    }

    #[test]
    fn empty_draft_cannot_submit() {
        let editor = PaletteEditor::new(PluginSettings::default());
        assert!(matches!(editor.submit(), Err(EditorError::NoColors)));
    }

    #[test]
    fn preview_reflects_settings() {
        let mut editor = PaletteEditor::new(PluginSettings::default());
        editor.add_color(Color::new(0, 0, 0));
        editor.settings_mut().gradient = true;
        assert_eq!(editor.preview().status, crate::state::Status::InvalidGradient);
    }

    #[test]
    fn editing_an_existing_palette() {
        let plugin = PluginSettings::default();
        let palette = Palette::parse("#111,#222\n{\"aliases\":[\"x\"]}", &plugin);
        let editor = PaletteEditor::from_palette(&palette, plugin);
        assert_eq!(editor.settings().aliases, vec!["x", ""]);
    }
}
