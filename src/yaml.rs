use tower_lsp::lsp_types::Position;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] ScanError),
}

/// Decides whether a position falls on a mapping key of the surrounding document.
pub trait KeyLocator {
    fn is_position_in_key(&self, text: &str, pos: Position) -> Result<bool, KeyError>;
}

/// [`KeyLocator`] backed by the `yaml-rust2` event parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlKeys;

impl KeyLocator for YamlKeys {
    fn is_position_in_key(&self, text: &str, pos: Position) -> Result<bool, KeyError> {
        let mut finder = KeyFinder::new(text, pos);
        Parser::new_from_str(text).load(&mut finder, true)?;

        Ok(finder.found.unwrap_or(false))
    }
}

#[derive(Debug)]
enum Frame {
    Mapping { expect_key: bool },
    Sequence,
}

struct KeyFinder<'a> {
    lines: Vec<&'a str>,
    target: Position,
    stack: Vec<Frame>,
    found: Option<bool>,
}

impl<'a> KeyFinder<'a> {
    fn new(text: &'a str, target: Position) -> Self {
        Self {
            lines: text.lines().collect(),
            target,
            stack: Vec::new(),
            found: None,
        }
    }

    fn in_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { expect_key: true }))
    }

    // A finished node flips the enclosing mapping between key and value.
    fn node_done(&mut self) {
        if let Some(Frame::Mapping { expect_key }) = self.stack.last_mut() {
            *expect_key = !*expect_key;
        }
    }

    /// Whether a scalar of `len` chars (plus quotes) starting at `mark` covers the target.
    fn covers(&self, mark: Marker, len: usize, quoted: bool) -> bool {
        // Markers count lines from 1 and columns (in chars) from 0.
        let Some(line) = mark.line().checked_sub(1) else {
            return false;
        };
        if u32::try_from(line).ok() != Some(self.target.line) {
            return false;
        }

        let Some(text) = self.lines.get(line) else {
            return false;
        };
        let width = if quoted { len.saturating_add(2) } else { len };
        let start = utf16_width(text, mark.col());
        let end = utf16_width(text, mark.col().saturating_add(width));
        let column = usize::try_from(self.target.character).unwrap_or(usize::MAX);

        start <= column && column <= end
    }
}

fn utf16_width(text: &str, chars: usize) -> usize {
    text.chars().take(chars).map(char::len_utf16).sum()
}

impl MarkedEventReceiver for KeyFinder<'_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        match ev {
            Event::Scalar(value, style, ..) => {
                if self.found.is_none() {
                    let quoted = matches!(
                        style,
                        TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted
                    );
                    if self.covers(mark, value.chars().count(), quoted) {
                        self.found = Some(self.in_key());
                    }
                }
                self.node_done();
            }
            Event::Alias(..) => self.node_done(),
            Event::MappingStart(..) => self.stack.push(Frame::Mapping { expect_key: true }),
            Event::SequenceStart(..) => self.stack.push(Frame::Sequence),
            Event::MappingEnd | Event::SequenceEnd => {
                self.stack.pop();
                self.node_done();
            }
            _ => {}
        }
    }
}
