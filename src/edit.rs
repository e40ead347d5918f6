//! Edits applied to a live palette and written back to its block.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::color::Color;
use crate::document::LineRange;
use crate::generate::{self, Combination};
use crate::registry::SettingsListener;
use crate::settings::PluginSettings;
use crate::state::{Palette, Status};
use crate::view::{self, RenderContext, RenderedPalette};

/// New block text together with the lines it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEdit {
    pub text: String,
    pub range: LineRange,
}

/// Receives committed edits. Supplied by whatever embeds the palette.
pub trait PaletteSink {
    /// An edit that is written back immediately.
    fn on_change(&mut self, edit: &BlockEdit);
    /// Edits batched during edit mode, flushed when it is left.
    fn on_edit_mode_exit(&mut self, edit: &BlockEdit);
}

impl<T: PaletteSink + ?Sized> PaletteSink for &mut T {
    fn on_change(&mut self, edit: &BlockEdit) {
        (**self).on_change(edit);
    }

    fn on_edit_mode_exit(&mut self, edit: &BlockEdit) {
        (**self).on_edit_mode_exit(edit);
    }
}

/// Shows time-boxed messages to the user.
pub trait Notifier {
    fn notify(&mut self, message: &str, duration: Duration);
}

impl<T: Notifier + ?Sized> Notifier for &mut T {
    fn notify(&mut self, message: &str, duration: Duration) {
        (**self).notify(message, duration);
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str, _duration: Duration) {
        log::warn!("{message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    /// The palette is invalid; its text is left untouched.
    #[error("cannot edit a palette with status: {0}")]
    Rejected(Status),
    /// Gradients have no individual swatches to alias or delete.
    #[error("gradient palettes have no swatches to edit")]
    Gradient,
}

/// Channel palettes can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Hue,
    Saturation,
    Lightness,
    Red,
    Green,
    Blue,
    Alpha,
}

impl SortKey {
    fn value(self, color: Color) -> f32 {
        match self {
            SortKey::Hue => color.hue(),
            SortKey::Saturation => color.saturation(),
            SortKey::Lightness => color.lightness(),
            SortKey::Red => color.r as f32,
            SortKey::Green => color.g as f32,
            SortKey::Blue => color.b as f32,
            SortKey::Alpha => color.a as f32,
        }
    }
}

/// One palette being displayed and edited.
///
/// Deletes and regenerations are committed straight away. Alias and order
/// changes made in edit mode stay pending until edit mode is left, then go
/// out as a single write.
pub struct EditSession<S, N> {
    palette: Palette,
    plugin: PluginSettings,
    /// Last text written for this block.
    source: String,
    range: LineRange,
    edit_mode: bool,
    pending: bool,
    sink: S,
    notifier: N,
}

impl<S: PaletteSink, N: Notifier> EditSession<S, N> {
    pub fn new(source: &str, range: LineRange, plugin: PluginSettings, sink: S, notifier: N) -> Self {
        let palette = Palette::parse(source, &plugin);
        let session = Self {
            palette,
            plugin,
            source: source.to_string(),
            range,
            edit_mode: false,
            pending: false,
            sink,
            notifier,
        };
        session.report_invalid();
        session
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn plugin(&self) -> &PluginSettings {
        &self.plugin
    }

    pub fn range(&self) -> LineRange {
        self.range
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn render(&self, container_width: f64) -> RenderedPalette {
        view::render(
            &self.palette,
            &RenderContext {
                plugin: &self.plugin,
                edit_mode: self.edit_mode,
                container_width,
            },
        )
    }

    /// Rebuild from block text after the host changed it.
    pub fn reload(&mut self, source: &str, range: LineRange) {
        self.palette = Palette::parse(source, &self.plugin);
        self.source = source.to_string();
        self.range = range;
        self.pending = false;
        self.report_invalid();
    }

    fn report_invalid(&self) {
        if let Some(err) = self.palette.diagnostic() {
            log::warn!("palette at line {}: {err}", self.range.start + 1);
        }
    }

    fn guard(&mut self) -> Result<(), EditError> {
        match self.palette.diagnostic() {
            None => Ok(()),
            Some(err) => {
                log::warn!("rejected edit: {err}");
                self.notifier
                    .notify(&format!("Palette:\n{err}"), self.plugin.notice_duration());
                Err(EditError::Rejected(self.palette.status))
            }
        }
    }

    /// As [`Self::guard`], and also refuses gradients.
    fn swatch_guard(&mut self) -> Result<(), EditError> {
        self.guard()?;
        if self.palette.settings.gradient {
            log::warn!("rejected swatch edit on a gradient");
            self.notifier.notify(
                &format!("Palette:\n{}", EditError::Gradient),
                self.plugin.notice_duration(),
            );
            return Err(EditError::Gradient);
        }
        Ok(())
    }

    fn rebuild(&mut self, colors: Vec<String>, aliases: Vec<String>) {
        let mut settings = self.palette.settings.clone();
        settings.aliases = aliases;
        self.palette = Palette::rebuild(colors, settings);
    }

    fn current_edit(&self) -> BlockEdit {
        BlockEdit {
            text: self.palette.to_block(&self.plugin),
            range: self.range,
        }
    }

    fn written(&mut self, edit: BlockEdit) {
        self.range = LineRange::covering(edit.range.start, &edit.text);
        self.source = edit.text;
        self.pending = false;
    }

    /// Write the whole current state now. Pending edits ride along.
    fn commit(&mut self) {
        let edit = self.current_edit();
        log::info!("writing palette back to lines {}..={}", edit.range.start + 1, edit.range.end + 1);
        self.sink.on_change(&edit);
        self.written(edit);
    }

    fn stage(&mut self) {
        if self.edit_mode {
            self.pending = true;
        } else {
            self.commit();
        }
    }

    fn aligned(&self) -> (Vec<String>, Vec<String>) {
        let mut aliases = self.palette.settings.aliases.clone();
        aliases.resize(self.palette.colors.len(), String::new());
        (self.palette.colors.clone(), aliases)
    }

    /// Remove the color at `index` with its alias. `Ok(false)` when out of range.
    pub fn delete(&mut self, index: usize) -> Result<bool, EditError> {
        self.swatch_guard()?;
        if index >= self.palette.colors.len() {
            return Ok(false);
        }
        let (mut colors, mut aliases) = self.aligned();
        colors.remove(index);
        aliases.remove(index);
        self.rebuild(colors, aliases);
        self.commit();
        Ok(true)
    }

    /// Set the alias at `index`. The text is trimmed; empty clears it.
    pub fn set_alias(&mut self, index: usize, text: &str) -> Result<bool, EditError> {
        self.swatch_guard()?;
        if index >= self.palette.colors.len() {
            return Ok(false);
        }
        let text = text.trim();
        if self.palette.alias(index) == text {
            return Ok(false);
        }
        let (colors, mut aliases) = self.aligned();
        aliases[index] = text.to_string();
        self.rebuild(colors, aliases);
        self.stage();
        Ok(true)
    }

    pub fn clear_alias(&mut self, index: usize) -> Result<bool, EditError> {
        self.set_alias(index, "")
    }

    /// Apply a permutation: position `i` receives the entry at `order[i]`.
    /// Aliases move with their colors. Anything but a full permutation is
    /// ignored.
    pub fn reorder(&mut self, order: &[usize]) -> Result<bool, EditError> {
        self.guard()?;
        let len = self.palette.colors.len();
        if !is_permutation(order, len) {
            return Ok(false);
        }
        if order.iter().enumerate().all(|(i, &j)| i == j) {
            return Ok(false);
        }
        let (colors, aliases) = self.aligned();
        let colors = order.iter().map(|&i| colors[i].clone()).collect();
        let aliases = order.iter().map(|&i| aliases[i].clone()).collect();
        self.rebuild(colors, aliases);
        self.stage();
        Ok(true)
    }

    /// Drag the swatch at `from` so it lands at `to`.
    pub fn move_swatch(&mut self, from: usize, to: usize) -> Result<bool, EditError> {
        let len = self.palette.colors.len();
        if from >= len || to >= len {
            self.guard()?;
            return Ok(false);
        }
        let mut order: Vec<usize> = (0..len).collect();
        let moved = order.remove(from);
        order.insert(to, moved);
        self.reorder(&order)
    }

    /// Sort ascending by `key`. Entries that are not colors go last.
    pub fn sort_by(&mut self, key: SortKey) -> Result<bool, EditError> {
        self.guard()?;
        let mut order: Vec<usize> = (0..self.palette.colors.len()).collect();
        let values: Vec<Option<f32>> = self
            .palette
            .colors
            .iter()
            .map(|c| Color::parse(c).ok().map(|color| key.value(color)))
            .collect();
        order.sort_by(|&a, &b| match (values[a], values[b]) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        self.reorder(&order)
    }

    /// Replace colors and aliases with a generated set. Other settings stay.
    pub fn regenerate<R: Rng>(
        &mut self,
        combination: Combination,
        base: Option<Color>,
        rng: &mut R,
    ) -> Result<(), EditError> {
        self.guard()?;
        let generated = generate::generate(combination, base, rng);
        self.rebuild(generated.colors, generated.aliases);
        self.commit();
        Ok(())
    }

    /// Flip edit mode and return the new mode. Leaving edit mode flushes
    /// pending edits once. Invalid palettes cannot enter edit mode.
    pub fn toggle_edit_mode(&mut self) -> Result<bool, EditError> {
        if self.edit_mode {
            self.edit_mode = false;
            if self.pending {
                let edit = self.current_edit();
                log::info!("flushing edits to lines {}..={}", edit.range.start + 1, edit.range.end + 1);
                self.sink.on_edit_mode_exit(&edit);
                self.written(edit);
            }
        } else {
            self.guard()?;
            self.edit_mode = true;
        }
        Ok(self.edit_mode)
    }
}

impl<S: PaletteSink, N: Notifier> SettingsListener for EditSession<S, N> {
    /// Re-parse against the new defaults. Pending edits are kept by
    /// serializing them under the old defaults first.
    fn settings_changed(&mut self, plugin: &PluginSettings) {
        let source = if self.pending {
            self.palette.to_block(&self.plugin)
        } else {
            self.source.clone()
        };
        self.plugin = plugin.clone();
        self.palette = Palette::parse(&source, &self.plugin);
        if self.edit_mode && !self.palette.status.is_valid() {
            self.edit_mode = false;
            self.pending = false;
        }
        self.report_invalid();
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || std::mem::replace(&mut seen[i], true) {
            return false;
        }
    }
    true
}
