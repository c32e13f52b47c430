use std::fmt;
use std::sync::Arc;

use anyhow::Context as _;
use tower_lsp::lsp_types;

use crate::document::Document;
use crate::symbols::SymbolTable;
use crate::yaml::{KeyError, KeyLocator, YamlKeys};

pub mod context;
pub mod format;

pub use context::Context;

pub async fn hover(
    ctx: &crate::Backend,
    params: lsp_types::HoverParams,
) -> anyhow::Result<Resolution> {
    let uri = params.text_document_position_params.text_document.uri;
    let loc = params.text_document_position_params.position;

    let artifacts = ctx.artifacts.read().await;
    let provider = artifacts.provider()?;

    let Some(document) = ctx.project.documents.get(&uri) else {
        return Ok(Resolution::UnknownDocument);
    };

    provider.resolve(&document, loc)
}

/// Why a word that sits outside any action got no tooltip.
#[derive(Debug)]
pub enum Suppression {
    /// The word is a YAML value, not a key.
    NotKey,
    /// The document could not be parsed to tell.
    Undeterminable(KeyError),
}

/// Outcome of a single hover request.
#[derive(Debug)]
pub enum Resolution {
    Found(lsp_types::Hover),
    UnknownDocument,
    NoWord,
    Miss { word: String },
    Suppressed { word: String, reason: Suppression },
}

impl Resolution {
    pub fn into_hover(self) -> Option<lsp_types::Hover> {
        match self {
            Self::Found(hover) => Some(hover),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_) => write!(f, "found"),
            Self::UnknownDocument => write!(f, "document not open"),
            Self::NoWord => write!(f, "no word under cursor"),
            Self::Miss { word } => write!(f, "no symbol for `{word}`"),
            Self::Suppressed {
                word,
                reason: Suppression::NotKey,
            } => write!(f, "`{word}` is a plain value"),
            Self::Suppressed {
                word,
                reason: Suppression::Undeterminable(e),
            } => write!(f, "cannot place `{word}`: {e}"),
        }
    }
}

pub struct HoverProvider<K = YamlKeys> {
    symbols: Arc<SymbolTable>,
    keys: K,
    language: String,
}

impl HoverProvider {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self::with_locator(symbols, YamlKeys)
    }
}

impl<K: KeyLocator> HoverProvider<K> {
    pub fn with_locator(symbols: Arc<SymbolTable>, keys: K) -> Self {
        Self {
            symbols,
            keys,
            language: format::DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn resolve(&self, doc: &Document, pos: lsp_types::Position) -> anyhow::Result<Resolution> {
        let Some((word, range)) = doc.word_at(pos) else {
            return Ok(Resolution::NoWord);
        };
        let Some(line) = doc.line(pos.line) else {
            return Ok(Resolution::NoWord);
        };

        for context in Context::ORDER {
            let holds = context
                .holds(line, word)
                .with_context(|| format!("Failed to build {context:?} pattern for `{word}`"))?;
            if !holds {
                continue;
            }

            let found = match context {
                Context::Value => self.symbols.lookup_value(word),
                Context::Function => self.symbols.lookup_function(word),
                Context::OutsideAction => {
                    let reason = match self.keys.is_position_in_key(doc.text(), pos) {
                        Ok(true) => break,
                        Ok(false) => Suppression::NotKey,
                        Err(e) => Suppression::Undeterminable(e),
                    };

                    return Ok(Resolution::Suppressed {
                        word: word.to_string(),
                        reason,
                    });
                }
            };

            if let Some(entry) = found {
                return Ok(Resolution::Found(format::tooltip(entry, &self.language, range)));
            }
        }

        Ok(Resolution::Miss {
            word: word.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use anyhow::ensure;
    use tower_lsp::lsp_types::{HoverContents, MarkedString, Position, Range};

    use super::{HoverProvider, Resolution, Suppression};
    use crate::document::Document;
    use crate::symbols::{Entry, SymbolTable};
    use crate::yaml::{KeyError, KeyLocator};

    fn provider() -> anyhow::Result<HoverProvider> {
        Ok(HoverProvider::new(Arc::new(SymbolTable::builtin()?)))
    }

    fn snippet(resolution: &Resolution) -> Option<&str> {
        let Resolution::Found(hover) = resolution else {
            return None;
        };
        match &hover.contents {
            HoverContents::Array(items) => match items.first() {
                Some(MarkedString::LanguageString(s)) => Some(s.value.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Key locator that always fails, as for a document YAML cannot parse.
    struct Broken<'a> {
        calls: &'a Cell<usize>,
    }

    impl KeyLocator for Broken<'_> {
        fn is_position_in_key(&self, _text: &str, _pos: Position) -> Result<bool, KeyError> {
            self.calls.set(self.calls.get() + 1);
            yaml_rust2::YamlLoader::load_from_str("a: [")
                .map(|_| false)
                .map_err(KeyError::from)
        }
    }

    #[test]
    fn test_every_function_in_function_position() -> anyhow::Result<()> {
        let provider = provider()?;

        for entry in provider.symbols().functions() {
            let doc = Document::new(format!("{{{{ {} arg }}}}", entry.name), 0);
            let resolution = provider.resolve(&doc, Position::new(0, 3))?;

            let expected = format!("{{{{ {} }}}}", entry.signature);
            ensure!(
                snippet(&resolution) == Some(expected.as_str()),
                "{}: {resolution}",
                entry.name
            );
        }

        Ok(())
    }

    #[test]
    fn test_every_value_in_value_position() -> anyhow::Result<()> {
        let provider = provider()?;

        for entry in provider.symbols().values() {
            let doc = Document::new(format!("{{{{ .{} }}}}", entry.name), 0);
            let resolution = provider.resolve(&doc, Position::new(0, 4))?;

            let expected = format!("{{{{ {} }}}}", entry.signature);
            ensure!(
                snippet(&resolution) == Some(expected.as_str()),
                "{}: {resolution}",
                entry.name
            );
        }

        Ok(())
    }

    #[test]
    fn test_hover_payload() -> anyhow::Result<()> {
        let provider = provider()?.language("gotmpl");
        let doc = Document::new("image: {{ .Values.image | quote }}", 0);

        let hover = provider
            .resolve(&doc, Position::new(0, 28))?
            .into_hover()
            .ok_or_else(|| anyhow::anyhow!("expected hover"))?;

        ensure!(hover.range == Some(Range::new(Position::new(0, 26), Position::new(0, 31))));
        let HoverContents::Array(items) = hover.contents else {
            anyhow::bail!("expected two content blocks");
        };
        ensure!(items.len() == 2);
        ensure!(matches!(items.first(), Some(MarkedString::LanguageString(s)) if s.language == "gotmpl"));
        ensure!(
            items.get(1) == Some(&MarkedString::String("Wrap a string in double quotes.".to_string()))
        );

        Ok(())
    }

    #[test]
    fn test_value_checked_before_function() -> anyhow::Result<()> {
        let table = SymbolTable::new(
            vec![Entry::new("Thing", "Thing $x", "function")],
            vec![Entry::new("Thing", ".Thing", "value")],
        );
        let provider = HoverProvider::new(Arc::new(table));
        let doc = Document::new("{{ .Thing }}", 0);

        let resolution = provider.resolve(&doc, Position::new(0, 5))?;
        ensure!(snippet(&resolution) == Some("{{ .Thing }}"));

        Ok(())
    }

    #[test]
    fn test_value_miss_falls_through_to_function() -> anyhow::Result<()> {
        let provider = provider()?;
        // `.Values.list` puts `list` in value position, but only the function table has it.
        let doc = Document::new("{{ .Values.list }}", 0);

        let resolution = provider.resolve(&doc, Position::new(0, 12))?;
        ensure!(snippet(&resolution) == Some("{{ list $items... }}"));

        Ok(())
    }

    #[test]
    fn test_unknown_word() -> anyhow::Result<()> {
        let provider = provider()?;

        for (line, column) in [("{{ frobnicate .x }}", 5), ("{{ .Frob }}", 5)] {
            let doc = Document::new(line, 0);
            let resolution = provider.resolve(&doc, Position::new(0, column))?;
            ensure!(matches!(resolution, Resolution::Miss { .. }), "{line}: {resolution}");
        }

        Ok(())
    }

    #[test]
    fn test_whitespace() -> anyhow::Result<()> {
        let provider = provider()?;
        let doc = Document::new("{{    }}", 0);

        ensure!(matches!(
            provider.resolve(&doc, Position::new(0, 4))?,
            Resolution::NoWord
        ));

        Ok(())
    }

    #[test]
    fn test_yaml_value_is_suppressed() -> anyhow::Result<()> {
        let table = SymbolTable::new(vec![Entry::new("metadata", "metadata", "doc")], vec![]);
        let provider = HoverProvider::new(Arc::new(table));
        let doc = Document::new("selector:\n  app: metadata\n", 0);

        let resolution = provider.resolve(&doc, Position::new(1, 10))?;
        ensure!(matches!(
            resolution,
            Resolution::Suppressed {
                reason: Suppression::NotKey,
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn test_yaml_key_outside_action() -> anyhow::Result<()> {
        let provider = provider()?;
        let doc = Document::new("default: 1\n", 0);

        let resolution = provider.resolve(&doc, Position::new(0, 2))?;
        ensure!(matches!(resolution, Resolution::Miss { .. }), "{resolution}");

        Ok(())
    }

    #[test]
    fn test_malformed_document_is_swallowed() -> anyhow::Result<()> {
        let provider = provider()?;
        let doc = Document::new("default: {{ .Values.x\nname: [\n", 0);

        let resolution = provider.resolve(&doc, Position::new(0, 2))?;
        ensure!(matches!(
            resolution,
            Resolution::Suppressed {
                reason: Suppression::Undeterminable(_),
                ..
            }
        ));
        ensure!(resolution.into_hover().is_none());

        Ok(())
    }

    #[test]
    fn test_failing_locator() -> anyhow::Result<()> {
        let calls = Cell::new(0);
        let provider = HoverProvider::with_locator(
            Arc::new(SymbolTable::builtin()?),
            Broken { calls: &calls },
        );

        let doc = Document::new("quote here", 0);
        let resolution = provider.resolve(&doc, Position::new(0, 1))?;
        ensure!(calls.get() == 1);
        ensure!(resolution.into_hover().is_none());

        // Function hits never reach the locator.
        let doc = Document::new("{{ quote .x }}", 0);
        ensure!(provider.resolve(&doc, Position::new(0, 4))?.into_hover().is_some());
        ensure!(calls.get() == 1);

        Ok(())
    }

    #[test]
    fn test_symbol_used_as_yaml_value() -> anyhow::Result<()> {
        let table = SymbolTable::new(vec![Entry::new("app", "app", "doc")], vec![]);
        let provider = HoverProvider::new(Arc::new(table));
        let doc = Document::new("apply: app\n", 0);

        let resolution = provider.resolve(&doc, Position::new(0, 8))?;
        ensure!(matches!(
            resolution,
            Resolution::Suppressed {
                reason: Suppression::NotKey,
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn test_idempotent() -> anyhow::Result<()> {
        let provider = provider()?;
        let doc = Document::new("name: {{ .Release.Name | trunc 63 }}", 0);

        for column in 0..36 {
            let first = provider.resolve(&doc, Position::new(0, column))?.into_hover();
            let second = provider.resolve(&doc, Position::new(0, column))?.into_hover();
            ensure!(first == second, "column {column}");
        }

        Ok(())
    }
}
