use std::path::PathBuf;

use crate::hover::format::DEFAULT_LANGUAGE;

/// Options accepted through `initializationOptions`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language id attached to the signature snippet, for client-side highlighting.
    pub language: String,
    /// Extra symbol table (TOML) appended after the builtin one.
    pub symbols: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            symbols: None,
        }
    }
}
