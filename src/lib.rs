use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use tower_lsp::jsonrpc::Result;
use tower_lsp::{LanguageServer, lsp_types};

mod config;
pub mod document;
pub mod hover;
pub mod symbols;
pub mod yaml;

#[macro_use]
mod logging;

pub use config::Config;

enum Artifacts {
    Lazy,
    Loaded { provider: hover::HoverProvider },
}

impl Artifacts {
    pub fn activate(&mut self, config: Config) -> anyhow::Result<()> {
        if let Self::Lazy = self {
            let mut table = symbols::SymbolTable::builtin()?;
            if let Some(path) = &config.symbols {
                table.extend(symbols::SymbolTable::load(path)?);
            }

            let provider = hover::HoverProvider::new(Arc::new(table)).language(config.language);

            *self = Self::Loaded { provider };
        }
        Ok(())
    }

    pub fn provider(&self) -> anyhow::Result<&hover::HoverProvider> {
        match self {
            Self::Lazy => anyhow::bail!("Hover provider not initialized"),
            Self::Loaded { provider } => Ok(provider),
        }
    }
}

pub struct Project {
    pub documents: DashMap<lsp_types::Url, document::Document>,
}

pub struct Backend {
    client: tower_lsp::Client,
    artifacts: Arc<RwLock<Artifacts>>,
    project: Project,
}

impl Backend {
    pub fn new(client: tower_lsp::Client) -> Self {
        Self {
            client,
            artifacts: Arc::new(RwLock::new(Artifacts::Lazy)),
            project: Project {
                documents: DashMap::new(),
            },
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(
        &self,
        info: lsp_types::InitializeParams,
    ) -> Result<lsp_types::InitializeResult> {
        let capabilities = lsp_types::ServerCapabilities {
            hover_provider: Some(lsp_types::HoverProviderCapability::Simple(true)),
            text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Kind(
                lsp_types::TextDocumentSyncKind::FULL,
            )),
            ..Default::default()
        };

        let config: Config = match info.initialization_options {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| tower_lsp::jsonrpc::Error::invalid_params(e.to_string()))?,
            None => Default::default(),
        };

        self.artifacts.write().await.activate(config).map_err(|e| {
            let mut error = tower_lsp::jsonrpc::Error::internal_error();
            error.message = format!("Failed to load symbols: {:#}", e).into();
            error
        })?;

        let server_info = lsp_types::ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        };

        Ok(lsp_types::InitializeResult {
            capabilities,
            server_info: Some(server_info),
        })
    }

    async fn initialized(&self, _info: lsp_types::InitializedParams) {
        self.client
            .log_message(lsp_types::MessageType::INFO, "server initialized!")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.project.documents.clear();

        Ok(())
    }

    async fn completion(
        &self,
        _: lsp_types::CompletionParams,
    ) -> Result<Option<lsp_types::CompletionResponse>> {
        Err(tower_lsp::jsonrpc::Error::method_not_found())
    }

    async fn hover(&self, params: lsp_types::HoverParams) -> Result<Option<lsp_types::Hover>> {
        match hover::hover(self, params).await {
            Ok(hover::Resolution::Found(hover)) => Ok(Some(hover)),
            Ok(other) => {
                debug!(self, "no hover: {}", other);
                Ok(None)
            }
            Err(e) => {
                error!(self, "Failed to get hover: {:#}", e);
                Err(tower_lsp::jsonrpc::Error::internal_error())
            }
        }
    }

    async fn did_open(&self, params: lsp_types::DidOpenTextDocumentParams) {
        info!(self, "didOpen - {}", params.text_document.uri);

        let document =
            document::Document::new(params.text_document.text, params.text_document.version);

        self.project
            .documents
            .insert(params.text_document.uri, document);
    }

    async fn did_change(&self, mut changes: lsp_types::DidChangeTextDocumentParams) {
        let uri = changes.text_document.uri;
        let version = changes.text_document.version;

        // Full sync: the last change carries the whole text.
        let Some(content) = changes.content_changes.pop() else {
            warn!(self, "No content changes found");
            return;
        };

        if let Some(mut document) = self.project.documents.get_mut(&uri) {
            document.update(content.text, version);
            return;
        }

        warn!(self, "didChange for unopened document {}, opening it", uri);
        self.project
            .documents
            .insert(uri, document::Document::new(content.text, version));
    }

    async fn did_close(&self, params: lsp_types::DidCloseTextDocumentParams) {
        self.project.documents.remove(&params.text_document.uri);
    }
}
