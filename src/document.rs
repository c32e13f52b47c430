use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::{Position, Range};

// Default editor word definition: numbers like `-1.5e3`, or runs of non-separators.
#[allow(clippy::expect_used)]
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(-?\d*\.\d\w*)|([^`~!@#$%^&*()\-=+\[{\]}\\|;:'",.<>/?\s]+)"#)
        .expect("invalid word pattern")
});

/// Full text of an open document, as last synced by the client.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    version: i32,
}

impl Document {
    pub fn new(text: impl Into<String>, version: i32) -> Self {
        Self {
            text: text.into(),
            version,
        }
    }

    pub fn update(&mut self, text: impl Into<String>, version: i32) {
        self.text = text.into();
        self.version = version;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth(usize::try_from(line).ok()?)
    }

    /// Range of the word containing `pos`. A cursor just past the last character
    /// of a word still counts as on it.
    pub fn word_range_at(&self, pos: Position) -> Option<Range> {
        let text = self.line(pos.line)?;

        WORD_PATTERN.find_iter(text).find_map(|found| {
            let start = utf16_column(text, found.start())?;
            let end = utf16_column(text, found.end())?;

            (start <= pos.character && pos.character <= end).then(|| {
                Range::new(
                    Position::new(pos.line, start),
                    Position::new(pos.line, end),
                )
            })
        })
    }

    /// Text covered by a single-line range.
    pub fn text_in(&self, range: Range) -> Option<&str> {
        if range.start.line != range.end.line {
            return None;
        }

        let text = self.line(range.start.line)?;
        let start = byte_offset(text, range.start.character)?;
        let end = byte_offset(text, range.end.character)?;

        text.get(start..end)
    }

    /// The word under the cursor together with its range.
    pub fn word_at(&self, pos: Position) -> Option<(&str, Range)> {
        let range = self.word_range_at(pos)?;
        let word = self.text_in(range)?;

        (!word.is_empty()).then_some((word, range))
    }
}

fn utf16_column(text: &str, byte: usize) -> Option<u32> {
    let prefix = text.get(..byte)?;
    u32::try_from(prefix.encode_utf16().count()).ok()
}

fn byte_offset(text: &str, column: u32) -> Option<usize> {
    let mut units = 0u32;

    for (index, c) in text.char_indices() {
        if units >= column {
            return Some(index);
        }
        units = units.saturating_add(u32::try_from(c.len_utf16()).ok()?);
    }

    (units >= column).then_some(text.len())
}
