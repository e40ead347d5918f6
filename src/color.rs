use palette::{FromColor, Hsl, ShiftHue, Srgb};
use thiserror::Error;

/// Why a color token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("empty color string")]
    Empty,
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
    #[error("invalid color function `{0}`")]
    InvalidFunction(String),
    #[error("color component out of range in `{0}`")]
    OutOfRange(String),
    #[error("unknown color `{0}`")]
    Unknown(String),
}

/// Core color type used throughout the crate.
/// Wraps sRGB u8 components plus alpha and provides the HSL operations the
/// generator and sorter need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Foreground used for text drawn on top of a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contrast {
    Black,
    White,
}

impl Contrast {
    pub fn to_hex(self) -> &'static str {
        match self {
            Contrast::Black => "#000000",
            Contrast::White => "#ffffff",
        }
    }
}

/// Luminance above which black text is more legible than white.
const CONTRAST_THRESHOLD: f32 = 186.0;

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any supported color token: hex, `rgb()`/`rgba()`, `hsl()`/`hsla()`
    /// or a CSS color name.
    pub fn parse(token: &str) -> Result<Self, ColorParseError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ColorParseError::Empty);
        }
        if let Some(hex) = token.strip_prefix('#') {
            return Self::from_hex_digits(hex).ok_or_else(|| ColorParseError::InvalidHex(token.into()));
        }

        let lower = token.to_ascii_lowercase();
        if let Some(open) = lower.find('(') {
            let name = lower[..open].trim();
            let args = lower[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| ColorParseError::InvalidFunction(token.into()))?;
            return match name {
                "rgb" | "rgba" => parse_rgb_args(args, token),
                "hsl" | "hsla" => parse_hsl_args(args, token),
                _ => Err(ColorParseError::InvalidFunction(token.into())),
            };
        }

        if lower == "transparent" {
            return Ok(Self::with_alpha(0, 0, 0, 0));
        }
        palette::named::from_str(&lower)
            .map(Self::from_srgb_u8)
            .ok_or_else(|| ColorParseError::Unknown(token.into()))
    }

    /// Parse a hex color string like `#ff8800`, `#f80` or `#ff880080`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        Self::from_hex_digits(digits).ok_or_else(|| ColorParseError::InvalidHex(hex.into()))
    }

    fn from_hex_digits(digits: &str) -> Option<Self> {
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|n| n * 17);
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => Some(Self::new(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Some(Self::with_alpha(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::with_alpha(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Serialize to lowercase hex `#rrggbb`, or `#rrggbbaa` for translucent colors.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Convert to `palette::Srgb<u8>`, dropping alpha.
    pub fn to_srgb_u8(self) -> Srgb<u8> {
        Srgb::new(self.r, self.g, self.b)
    }

    /// Create an opaque color from `palette::Srgb<u8>`.
    pub fn from_srgb_u8(srgb: Srgb<u8>) -> Self {
        Self::new(srgb.red, srgb.green, srgb.blue)
    }

    pub fn to_hsl(self) -> Hsl {
        let srgb: Srgb<f32> = self.to_srgb_u8().into_format();
        Hsl::from_color(srgb)
    }

    /// Create from HSL, keeping the given alpha.
    pub fn from_hsl(hsl: Hsl, alpha: u8) -> Self {
        let srgb: Srgb<f32> = Srgb::from_color(hsl);
        let mut color = Self::from_srgb_f32_clamped(srgb);
        color.a = alpha;
        color
    }

    /// Clamp an Srgb<f32> to [0, 1] and convert to Color.
    fn from_srgb_f32_clamped(srgb: Srgb<f32>) -> Self {
        let r = (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8;
        let g = (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8;
        let b = (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(r, g, b)
    }

    /// Perceived brightness, `0.299R + 0.587G + 0.114B` on 0-255 channels.
    pub fn luminance(self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }

    /// Black or white, whichever reads better on top of this color.
    pub fn contrast_color(self) -> Contrast {
        if self.luminance() > CONTRAST_THRESHOLD {
            Contrast::Black
        } else {
            Contrast::White
        }
    }

    /// Rotate the HSL hue by `degrees` (negative rotates backwards).
    pub fn rotate_hue(self, degrees: f32) -> Color {
        Color::from_hsl(self.to_hsl().shift_hue(degrees), self.a)
    }

    /// Raise HSL lightness by `points` percentage points, clamped at 100%.
    pub fn lighten(self, points: f32) -> Color {
        let mut hsl = self.to_hsl();
        hsl.lightness = (hsl.lightness + points / 100.0).clamp(0.0, 1.0);
        Color::from_hsl(hsl, self.a)
    }

    /// Lower HSL lightness by `points` percentage points, clamped at 0%.
    pub fn darken(self, points: f32) -> Color {
        self.lighten(-points)
    }

    pub fn complement(self) -> Color {
        self.rotate_hue(180.0)
    }

    /// Hue in degrees, [0, 360).
    pub fn hue(self) -> f32 {
        self.to_hsl().hue.into_positive_degrees()
    }

    pub fn saturation(self) -> f32 {
        self.to_hsl().saturation
    }

    pub fn lightness(self) -> f32 {
        self.to_hsl().lightness
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

/// Whether `token` is a color the renderer understands.
pub fn validate(token: &str) -> bool {
    Color::parse(token).is_ok()
}

/// Normalize a token to hex, or fail with the parse error.
pub fn to_hex(token: &str) -> Result<String, ColorParseError> {
    Color::parse(token).map(Color::to_hex)
}

/// Foreground for an arbitrary palette entry. Unparseable entries (override
/// mode) get white text instead of an error.
pub fn contrast_for(token: &str) -> Contrast {
    Color::parse(token)
        .map(Color::contrast_color)
        .unwrap_or(Contrast::White)
}

fn parse_rgb_args(args: &str, token: &str) -> Result<Color, ColorParseError> {
    let parts = split_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ColorParseError::InvalidFunction(token.into()));
    }
    let channel = |s: &str| -> Result<u8, ColorParseError> {
        let (value, max) = match s.strip_suffix('%') {
            Some(pct) => (parse_number(pct, token)?, 100.0),
            None => (parse_number(s, token)?, 255.0),
        };
        if !(0.0..=max).contains(&value) {
            return Err(ColorParseError::OutOfRange(token.into()));
        }
        Ok((value / max * 255.0).round() as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => parse_alpha(a, token)?,
        None => 255,
    };
    Ok(Color::with_alpha(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn parse_hsl_args(args: &str, token: &str) -> Result<Color, ColorParseError> {
    let parts = split_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ColorParseError::InvalidFunction(token.into()));
    }
    let hue = parse_number(parts[0].trim_end_matches("deg"), token)?;
    let percent = |s: &str| -> Result<f32, ColorParseError> {
        let pct = s
            .strip_suffix('%')
            .ok_or_else(|| ColorParseError::InvalidFunction(token.into()))?;
        let value = parse_number(pct, token)?;
        if !(0.0..=100.0).contains(&value) {
            return Err(ColorParseError::OutOfRange(token.into()));
        }
        Ok(value / 100.0)
    };
    let saturation = percent(parts[1])?;
    let lightness = percent(parts[2])?;
    let alpha = match parts.get(3) {
        Some(a) => parse_alpha(a, token)?,
        None => 255,
    };
    Ok(Color::from_hsl(Hsl::new(hue, saturation, lightness), alpha))
}

/// Split function arguments given either as `a, b, c[, d]` or `a b c[ / d]`.
fn split_args(args: &str) -> Vec<&str> {
    if args.contains(',') {
        args.split(',').map(str::trim).collect()
    } else {
        args.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn parse_number(s: &str, token: &str) -> Result<f32, ColorParseError> {
    s.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ColorParseError::InvalidFunction(token.into()))
}

fn parse_alpha(s: &str, token: &str) -> Result<u8, ColorParseError> {
    let value = match s.strip_suffix('%') {
        Some(pct) => parse_number(pct, token)? / 100.0,
        None => parse_number(s, token)?,
    };
    if !(0.0..=1.0).contains(&value) {
        return Err(ColorParseError::OutOfRange(token.into()));
    }
    Ok((value * 255.0).round() as u8)
}
