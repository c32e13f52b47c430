use std::path::Path;

use anyhow::{Context, bail};

/// Highest symbol source format this build understands.
pub const SUPPORTED_VERSION: u32 = 1;

const BUILTIN: &str = include_str!("symbols/builtin.toml");

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    pub name: String,
    pub signature: String,
    pub documentation: String,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        signature: impl Into<String>,
        documentation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            documentation: documentation.into(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct Source {
    version: u32,
    #[serde(default)]
    functions: Vec<Entry>,
    #[serde(default)]
    values: Vec<Entry>,
}

/// Known template functions and values.
///
/// Read-only once built; lookups scan in insertion order and the first exact
/// (case-sensitive) match wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    functions: Vec<Entry>,
    values: Vec<Entry>,
}

impl SymbolTable {
    pub fn new(functions: Vec<Entry>, values: Vec<Entry>) -> Self {
        Self { functions, values }
    }

    /// The table shipped with the binary.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(BUILTIN).context("Failed to parse builtin symbol table")
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let source: Source = toml::from_str(text)?;
        if source.version > SUPPORTED_VERSION {
            bail!(
                "unsupported symbol table version {} (max {})",
                source.version,
                SUPPORTED_VERSION
            );
        }

        Ok(Self::new(source.functions, source.values))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read symbol table {}", path.display()))?;

        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse symbol table {}", path.display()))
    }

    /// Appends `other` after the existing entries, so existing names keep priority.
    pub fn extend(&mut self, other: Self) {
        self.functions.extend(other.functions);
        self.values.extend(other.values);
    }

    pub fn lookup_function(&self, name: &str) -> Option<&Entry> {
        self.functions.iter().find(|entry| entry.name == name)
    }

    pub fn lookup_value(&self, name: &str) -> Option<&Entry> {
        self.values.iter().find(|entry| entry.name == name)
    }

    pub fn functions(&self) -> &[Entry] {
        &self.functions
    }

    pub fn values(&self) -> &[Entry] {
        &self.values
    }
}
