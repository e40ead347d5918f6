use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, Serializer};

/// Axis palettes are laid out along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Column,
    Row,
}

/// What a swatch label shows once an alias is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AliasMode {
    /// Color text and alias.
    Both,
    /// Alias only, color text when no alias is set.
    #[serde(rename = "Prefer Alias")]
    Alias,
}

/// How copied colors are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyFormat {
    /// The color exactly as written.
    Raw,
    /// Just the value: hex digits without `#`, or a function's arguments.
    Value,
}

/// Fully resolved settings of a single palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteSettings {
    pub height: f64,
    pub width: f64,
    pub direction: Direction,
    pub gradient: bool,
    pub hover: bool,
    pub override_: bool,
    /// Index-aligned with the palette colors; may be shorter than the color list.
    pub aliases: Vec<String>,
}

/// The settings line of a palette block. Every key is optional; present keys
/// win over the plugin defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSettings {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_number"
    )]
    pub height: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "compact_number"
    )]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<bool>,
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
}

/// Whole numbers are written without a fraction, `200` rather than `200.0`.
fn compact_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => serializer.serialize_i64(*v as i64),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

impl PartialSettings {
    /// Parse a settings line. Any wrong-typed key rejects the whole line.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }

    pub fn to_json(&self) -> String {
        // Serializing a struct of plain options and strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay these keys on `defaults`.
    pub fn merge_over(&self, defaults: &PaletteSettings) -> PaletteSettings {
        PaletteSettings {
            height: self.height.unwrap_or(defaults.height),
            width: self.width.unwrap_or(defaults.width),
            direction: self.direction.unwrap_or(defaults.direction),
            gradient: self.gradient.unwrap_or(defaults.gradient),
            hover: self.hover.unwrap_or(defaults.hover),
            override_: self.override_.unwrap_or(defaults.override_),
            aliases: self
                .aliases
                .clone()
                .unwrap_or_else(|| defaults.aliases.clone()),
        }
    }

    /// Keep only the keys of `settings` that differ from `defaults`.
    pub fn diff(settings: &PaletteSettings, defaults: &PaletteSettings) -> Self {
        fn changed<T: PartialEq + Clone>(value: &T, default: &T) -> Option<T> {
            (value != default).then(|| value.clone())
        }
        Self {
            height: changed(&settings.height, &defaults.height),
            width: changed(&settings.width, &defaults.width),
            direction: changed(&settings.direction, &defaults.direction),
            gradient: changed(&settings.gradient, &defaults.gradient),
            hover: changed(&settings.hover, &defaults.hover),
            override_: changed(&settings.override_, &defaults.override_),
            aliases: settings
                .aliases
                .iter()
                .any(|alias| !alias.is_empty())
                .then(|| settings.aliases.clone()),
        }
    }
}

/// Plugin-wide settings: global-only behavior plus the defaults every palette
/// starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginSettings {
    pub notice_duration: u64,
    pub error_pulse: bool,
    pub alias_mode: AliasMode,
    pub corners: bool,
    pub reload_delay: u64,
    pub hover_while_editing: bool,
    pub copy_format: CopyFormat,
    pub height: f64,
    pub width: f64,
    pub direction: Direction,
    pub gradient: bool,
    pub hover: bool,
    #[serde(rename = "override")]
    pub override_: bool,
}

/// Width the layout rules measure against, independent of the configured default.
pub const DEFAULT_WIDTH: f64 = 700.0;

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            notice_duration: 10_000,
            error_pulse: true,
            alias_mode: AliasMode::Both,
            corners: true,
            reload_delay: 5,
            hover_while_editing: false,
            copy_format: CopyFormat::Raw,
            height: 150.0,
            width: DEFAULT_WIDTH,
            direction: Direction::Column,
            gradient: false,
            hover: true,
            override_: false,
        }
    }
}

impl PluginSettings {
    /// The palette settings a block without a settings line gets.
    pub fn palette_defaults(&self) -> PaletteSettings {
        PaletteSettings {
            height: self.height,
            width: self.width,
            direction: self.direction,
            gradient: self.gradient,
            hover: self.hover,
            override_: self.override_,
            aliases: Vec::new(),
        }
    }

    pub fn notice_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.notice_duration)
    }

    pub fn reload_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reload_delay)
    }

    /// Load settings from `path`. A missing file yields the defaults; keys
    /// absent from the file keep their default values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid settings file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create settings directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }
}

/// Resolve the default settings file location.
pub fn settings_path() -> PathBuf {
    let config_home = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            PathBuf::from(home).join(".config")
        });
    config_home.join("swatchbook").join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_parse_known_keys() {
        let partial =
            PartialSettings::from_json(r#"{"height": 200, "direction": "row", "override": true}"#)
                .unwrap();
        assert_eq!(partial.height, Some(200.0));
        assert_eq!(partial.direction, Some(Direction::Row));
        assert_eq!(partial.override_, Some(true));
        assert_eq!(partial.gradient, None);
    }

    #[test]
    fn wrong_typed_key_rejects_line() {
        assert!(PartialSettings::from_json(r#"{"height": "tall"}"#).is_err());
        assert!(PartialSettings::from_json(r#"{"direction": "diagonal"}"#).is_err());
        assert!(PartialSettings::from_json(r#"{"aliases": [1, 2]}"#).is_err());
        assert!(PartialSettings::from_json("{height: 200}").is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let partial = PartialSettings::from_json(r#"{"hideText": true}"#).unwrap();
        assert!(partial.is_empty());
    }

    #[test]
    fn merge_prefers_local_keys() {
        let defaults = PluginSettings::default().palette_defaults();
        let partial = PartialSettings {
            gradient: Some(true),
            aliases: Some(vec!["a".into()]),
            ..Default::default()
        };
        let merged = partial.merge_over(&defaults);
        assert!(merged.gradient);
        assert_eq!(merged.height, 150.0);
        assert_eq!(merged.aliases, vec!["a".to_string()]);
    }

    #[test]
    fn diff_drops_default_keys() {
        let defaults = PluginSettings::default().palette_defaults();
        let mut settings = defaults.clone();
        assert!(PartialSettings::diff(&settings, &defaults).is_empty());

        settings.height = 300.0;
        settings.aliases = vec![String::new(), String::new()];
        let diff = PartialSettings::diff(&settings, &defaults);
        assert_eq!(diff.to_json(), r#"{"height":300}"#);
    }

    #[test]
    fn diff_keeps_aliases_when_any_set() {
        let defaults = PluginSettings::default().palette_defaults();
        let mut settings = defaults.clone();
        settings.aliases = vec![String::new(), "Accent".into()];
        let diff = PartialSettings::diff(&settings, &defaults);
        assert_eq!(diff.to_json(), r#"{"aliases":["","Accent"]}"#);
    }

    #[test]
    fn override_key_is_renamed() {
        let partial = PartialSettings {
            override_: Some(true),
            ..Default::default()
        };
        assert_eq!(partial.to_json(), r#"{"override":true}"#);
    }

    #[test]
    fn plugin_settings_fill_missing_keys() {
        let settings: PluginSettings =
            serde_json::from_str(r#"{"noticeDuration": 3000, "aliasMode": "Prefer Alias"}"#)
                .unwrap();
        assert_eq!(settings.notice_duration, 3000);
        assert_eq!(settings.alias_mode, AliasMode::Alias);
        assert_eq!(settings.width, 700.0);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let settings = PluginSettings::load(Path::new("/nonexistent/swatchbook.json")).unwrap();
        assert_eq!(settings, PluginSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join("swatchbook-test-settings");
        let path = dir.join("settings.json");
        let settings = PluginSettings {
            gradient: true,
            reload_delay: 50,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(PluginSettings::load(&path).unwrap(), settings);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_invalid_file_reports_path() {
        let dir = std::env::temp_dir().join("swatchbook-test-settings-invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        let err = PluginSettings::load(&path).unwrap_err().to_string();
        assert!(err.contains("invalid settings file"), "got: {err}");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
