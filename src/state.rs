use thiserror::Error;

use crate::codec;
use crate::color;
use crate::settings::{PaletteSettings, PartialSettings, PluginSettings};

/// Validity of a palette, recomputed from scratch on every parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Valid,
    InvalidColors,
    InvalidSettings,
    InvalidColorsAndSettings,
    InvalidGradient,
}

impl Status {
    pub fn is_valid(self) -> bool {
        self == Status::Valid
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Valid => "Valid",
            Status::InvalidColors => "Invalid Colors",
            Status::InvalidSettings => "Invalid Settings",
            Status::InvalidColorsAndSettings => "Invalid Colors & Settings",
            Status::InvalidGradient => "Invalid Gradient",
        }
    }

    /// Explanation shown when no more specific message is available.
    pub fn default_message(self) -> &'static str {
        match self {
            Status::Valid => "",
            Status::InvalidColors => "Colors are defined incorrectly",
            Status::InvalidSettings => "Issues parsing settings",
            Status::InvalidColorsAndSettings => "Colors and settings are defined incorrectly",
            Status::InvalidGradient => "Gradients require more than 1 color to display",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A failure contained to one palette. Each variant maps onto one invalid
/// [`Status`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("Colors are defined incorrectly: `{token}`")]
    InvalidColors { token: String },
    #[error("Issues parsing settings: {reason}")]
    InvalidSettings { reason: String },
    #[error("Colors and settings are defined incorrectly: `{token}`, {reason}")]
    InvalidColorsAndSettings { token: String, reason: String },
    #[error("{message}")]
    InvalidGradient { message: String },
}

impl PaletteError {
    pub fn status(&self) -> Status {
        match self {
            PaletteError::InvalidColors { .. } => Status::InvalidColors,
            PaletteError::InvalidSettings { .. } => Status::InvalidSettings,
            PaletteError::InvalidColorsAndSettings { .. } => Status::InvalidColorsAndSettings,
            PaletteError::InvalidGradient { .. } => Status::InvalidGradient,
        }
    }
}

/// The authoritative in-memory model of one palette block.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub colors: Vec<String>,
    pub settings: PaletteSettings,
    pub status: Status,
    /// First token that failed validation, for the notice.
    invalid_token: Option<String>,
    /// Why the settings line was rejected, for the notice.
    settings_error: Option<String>,
}

impl Palette {
    /// Build a palette from block text.
    pub fn parse(source: &str, plugin: &PluginSettings) -> Self {
        let raw = codec::parse(source);
        let defaults = plugin.palette_defaults();

        let (settings, settings_error) = match raw.settings_json.as_deref() {
            Some(line) => match PartialSettings::from_json(line) {
                Ok(partial) => (partial.merge_over(&defaults), None),
                Err(err) => {
                    log::debug!("settings line rejected: {err}");
                    (defaults, Some(err.to_string()))
                }
            },
            None => (defaults, None),
        };

        let palette = Self::evaluate(raw.tokens, settings, settings_error);
        log::debug!(
            "parsed palette: {} colors, status {}",
            palette.colors.len(),
            palette.status
        );
        palette
    }

    /// Recompute the palette from in-memory arrays, as after an edit.
    pub fn rebuild(colors: Vec<String>, settings: PaletteSettings) -> Self {
        Self::evaluate(colors, settings, None)
    }

    fn evaluate(colors: Vec<String>, settings: PaletteSettings, settings_error: Option<String>) -> Self {
        let invalid_token = if settings.override_ {
            None
        } else {
            colors.iter().find(|c| !color::validate(c)).cloned()
        };

        let status = match (invalid_token.is_some(), settings_error.is_some()) {
            (true, true) => Status::InvalidColorsAndSettings,
            (true, false) => Status::InvalidColors,
            (false, true) => Status::InvalidSettings,
            (false, false) if settings.gradient && colors.len() <= 1 => Status::InvalidGradient,
            (false, false) => Status::Valid,
        };

        Self {
            colors,
            settings,
            status,
            invalid_token,
            settings_error,
        }
    }

    /// The error behind an invalid status, `None` when valid.
    pub fn diagnostic(&self) -> Option<PaletteError> {
        let token = || self.invalid_token.clone().unwrap_or_default();
        let reason = || self.settings_error.clone().unwrap_or_default();
        match self.status {
            Status::Valid => None,
            Status::InvalidColors => Some(PaletteError::InvalidColors { token: token() }),
            Status::InvalidSettings => Some(PaletteError::InvalidSettings { reason: reason() }),
            Status::InvalidColorsAndSettings => Some(PaletteError::InvalidColorsAndSettings {
                token: token(),
                reason: reason(),
            }),
            Status::InvalidGradient => Some(PaletteError::InvalidGradient {
                message: Status::InvalidGradient.default_message().to_string(),
            }),
        }
    }

    /// Alias at `index`, empty when the alias list is shorter.
    pub fn alias(&self, index: usize) -> &str {
        self.settings
            .aliases
            .get(index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Pad or truncate aliases to the color count.
    pub fn reconcile_aliases(&mut self) {
        self.settings.aliases.resize(self.colors.len(), String::new());
    }

    /// Serialize back to a fenced block.
    pub fn to_block(&self, plugin: &PluginSettings) -> String {
        codec::serialize(&self.colors, &self.settings, &plugin.palette_defaults())
    }
}
