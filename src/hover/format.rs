use tower_lsp::lsp_types;

use crate::symbols::Entry;

pub const DEFAULT_LANGUAGE: &str = "helm-template";

/// Renders an entry as a highlighted `{{ signature }}` snippet followed by its documentation.
pub fn tooltip(entry: &Entry, language: &str, range: lsp_types::Range) -> lsp_types::Hover {
    let snippet = lsp_types::MarkedString::LanguageString(lsp_types::LanguageString {
        language: language.to_string(),
        value: format!("{{{{ {} }}}}", entry.signature),
    });

    lsp_types::Hover {
        contents: lsp_types::HoverContents::Array(vec![
            snippet,
            lsp_types::MarkedString::String(entry.documentation.clone()),
        ]),
        range: Some(range),
    }
}
