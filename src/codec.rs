//! Reading and writing the text of a palette code block.
//!
//! A block body is a list of color tokens, comma or newline separated, with an
//! optional JSON settings object on its last line:
//!
//! ```text
//! #ff0000, #00ff00
//! rgb(0, 0, 255)
//! {"height": 200, "aliases": ["Red", "Green", "Blue"]}
//! ```

use crate::settings::{PaletteSettings, PartialSettings};

/// Opening fence of a palette block.
pub const FENCE_OPEN: &str = "```palette";
/// Closing fence of any code block.
pub const FENCE_CLOSE: &str = "```";

/// A block body split into its raw parts, nothing validated yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBlock {
    pub tokens: Vec<String>,
    pub settings_json: Option<String>,
}

/// Split block text into color tokens and the settings line.
///
/// Accepts a bare body or a whole fenced block.
pub fn parse(text: &str) -> RawBlock {
    let body = strip_fence(text.trim());
    let mut lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let settings_json = match lines.last() {
        Some(last) if last.contains('{') => lines.pop().map(str::to_string),
        _ => None,
    };

    let tokens = split_tokens(&lines);
    let tokens = match tokens.as_slice() {
        [single] if is_url(single) => expand_url(single),
        _ => tokens,
    };

    RawBlock {
        tokens,
        settings_json,
    }
}

/// Remove a surrounding palette fence, if present.
pub fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE_OPEN) else {
        return text;
    };
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let rest = rest.trim_end();
    rest.strip_suffix(FENCE_CLOSE).unwrap_or(rest).trim()
}

/// Lines holding a color function are split on `;` so the commas inside
/// `rgb(...)`/`hsl(...)` survive; every other line is split on `,`.
fn split_tokens(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .flat_map(|line| {
            let separator = if line.contains('(') { ';' } else { ',' };
            line.split(separator)
        })
        .map(|token| token.replace(';', "").trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

pub fn is_url(token: &str) -> bool {
    (token.starts_with("https://") || token.starts_with("http://"))
        && !last_segment(token).is_empty()
}

fn last_segment(url: &str) -> &str {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let url = url.trim_end_matches('/');
    match url.rfind('/') {
        Some(slash) => &url[slash + 1..],
        None => "",
    }
}

/// Expand a gallery URL into hex tokens.
///
/// `.../palette/aabbcc-112233` splits on dashes; `.../palette/aabbcc112233`
/// is cut into 6-character chunks.
pub fn expand_url(url: &str) -> Vec<String> {
    let segment = last_segment(url);
    if segment.contains('-') {
        segment
            .split('-')
            .filter(|s| !s.is_empty())
            .map(|s| format!("#{s}"))
            .collect()
    } else {
        segment
            .as_bytes()
            .chunks(6)
            .map(|chunk| format!("#{}", String::from_utf8_lossy(chunk)))
            .collect()
    }
}

/// Write a fenced palette block. Settings equal to `defaults` are left out.
pub fn serialize(colors: &[String], settings: &PaletteSettings, defaults: &PaletteSettings) -> String {
    let diff = PartialSettings::diff(settings, defaults);
    let mut out = String::new();
    out.push_str(FENCE_OPEN);
    out.push('\n');
    for color in colors {
        out.push_str(color);
        out.push('\n');
    }
    if !diff.is_empty() {
        out.push_str(&diff.to_json());
        out.push('\n');
    }
    out.push_str(FENCE_CLOSE);
    out.push('\n');
    out
}

/// Wrap arbitrary body text, such as a gallery URL, in a palette fence.
pub fn fence(body: &str) -> String {
    format!("{FENCE_OPEN}\n{}\n{FENCE_CLOSE}\n", body.trim())
}
