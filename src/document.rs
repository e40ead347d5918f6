//! Palette blocks inside a markdown document.

use crate::codec::{self, FENCE_CLOSE, FENCE_OPEN};
use crate::edit::{BlockEdit, PaletteSink};

/// Zero-based, inclusive line span of a block, fences included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Range starting at `start` that covers `text`.
    pub fn covering(start: usize, text: &str) -> Self {
        Self::new(start, start + text.lines().count().saturating_sub(1))
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    pub range: LineRange,
    /// Text between the fences.
    pub body: String,
}

impl BlockLocation {
    /// The whole block, fences included.
    pub fn text(&self) -> String {
        codec::fence(&self.body)
    }
}

fn is_open_fence(line: &str) -> bool {
    line.trim()
        .strip_prefix(FENCE_OPEN)
        .is_some_and(|rest| rest.trim().is_empty())
}

/// Every closed palette block in `markdown`, top to bottom. An opening fence
/// without a closing one is not a block.
pub fn find_blocks(markdown: &str) -> Vec<BlockLocation> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !is_open_fence(lines[i]) {
            i += 1;
            continue;
        }
        let Some(offset) = lines[i + 1..].iter().position(|l| l.trim() == FENCE_CLOSE) else {
            break;
        };
        let end = i + 1 + offset;
        blocks.push(BlockLocation {
            range: LineRange::new(i, end),
            body: lines[i + 1..end].join("\n"),
        });
        i = end + 1;
    }
    blocks
}

/// Replace the lines in `range` with `text`.
pub fn replace(markdown: &str, range: LineRange, text: &str) -> String {
    let mut lines: Vec<&str> = markdown.lines().collect();
    let start = range.start.min(lines.len());
    let end = (range.end + 1).min(lines.len()).max(start);
    lines.splice(start..end, text.lines());
    join(lines, markdown)
}

/// Insert `text` before line `line`; past the end it is appended.
pub fn insert_at(markdown: &str, line: usize, text: &str) -> String {
    let mut lines: Vec<&str> = markdown.lines().collect();
    let at = line.min(lines.len());
    lines.splice(at..at, text.lines());
    join(lines, markdown)
}

/// Turn a gallery URL on `line` into a palette block. `None` when the line
/// is not a URL.
pub fn convert_link(markdown: &str, line: usize) -> Option<String> {
    let url = markdown.lines().nth(line)?.trim();
    if !codec::is_url(url) {
        return None;
    }
    Some(replace(markdown, LineRange::new(line, line), &codec::fence(url)))
}

fn join(lines: Vec<&str>, original: &str) -> String {
    let mut out = lines.join("\n");
    if original.is_empty() || original.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// The embedding editor that owns the document text.
pub trait HostDocument {
    fn replace_block(&mut self, range: LineRange, text: &str);
}

/// An in-memory markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    text: String,
}

impl MarkdownDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn blocks(&self) -> Vec<BlockLocation> {
        find_blocks(&self.text)
    }
}

impl HostDocument for MarkdownDocument {
    fn replace_block(&mut self, range: LineRange, text: &str) {
        self.text = replace(&self.text, range, text);
    }
}

impl PaletteSink for MarkdownDocument {
    fn on_change(&mut self, edit: &BlockEdit) {
        self.replace_block(edit.range, &edit.text);
    }

    fn on_edit_mode_exit(&mut self, edit: &BlockEdit) {
        self.replace_block(edit.range, &edit.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Colors\n\n```palette\n#fff\n#000\n```\n\ntext\n```palette\nred\n```\n";

    #[test]
    fn finds_blocks_with_ranges() {
        let blocks = find_blocks(DOC);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].range, LineRange::new(2, 5));
        assert_eq!(blocks[0].body, "#fff\n#000");
        assert_eq!(blocks[1].range, LineRange::new(8, 10));
        assert_eq!(blocks[1].text(), "```palette\nred\n```\n");
    }

    #[test]
    fn other_fences_are_skipped() {
        let doc = "```rust\nfn main() {}\n```\n```palettes\n#fff\n```\n";
        assert!(find_blocks(doc).is_empty());
    }

    #[test]
    fn unterminated_block_is_ignored() {
        assert!(find_blocks("```palette\n#fff\n").is_empty());
    }

    #[test]
    fn replace_changes_line_count() {
        let out = replace(DOC, LineRange::new(8, 10), "```palette\nred\nblue\n```\n");
        assert!(out.ends_with("text\n```palette\nred\nblue\n```\n"), "got: {out}");
        assert!(out.starts_with("# Colors\n\n```palette\n#fff"));
    }

    #[test]
    fn insert_at_cursor_line() {
        let out = insert_at("a\nb\n", 1, "```palette\n#fff\n```");
        assert_eq!(out, "a\n```palette\n#fff\n```\nb\n");
        assert_eq!(insert_at("a", 9, "b"), "a\nb");
    }

    #[test]
    fn converts_url_line_to_block() {
        let doc = "intro\nhttps://coolors.co/palette/ff0000-00ff00\n";
        let out = convert_link(doc, 1).unwrap();
        assert_eq!(out, "intro\n```palette\nhttps://coolors.co/palette/ff0000-00ff00\n```\n");
        assert!(convert_link(doc, 0).is_none());
        assert!(convert_link(doc, 7).is_none());
    }

    #[test]
    fn range_covering_text() {
        assert_eq!(LineRange::covering(3, "```palette\n#fff\n```\n"), LineRange::new(3, 5));
        assert_eq!(LineRange::new(3, 5).line_count(), 3);
        assert!(LineRange::new(3, 5).contains(5));
    }

    #[test]
    fn document_applies_block_edits() {
        let mut doc = MarkdownDocument::new(DOC);
        let range = doc.blocks()[0].range;
        doc.on_change(&BlockEdit {
            text: "```palette\n#123\n```\n".into(),
            range,
        });
        assert_eq!(doc.blocks()[0].body, "#123");
        assert_eq!(doc.blocks()[1].range, LineRange::new(7, 9));
    }
}
