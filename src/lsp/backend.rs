use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::notification::{DidChangeConfiguration, Notification};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::config::{CONFIGURATION_REGISTRATION_ID, ExampleSettings};
use crate::document::{DocumentStore, TextDocument};
use crate::lsp::capabilities::{ClientFlags, server_capabilities};
use crate::lsp::completion::{completion_items, resolve_completion_item};
use crate::lsp::diagnostics::{DiagnosticRule, UppercaseRule, compute_diagnostics};
use crate::lsp::settings::{ClientConfigurationSource, ConfigurationSource, SettingsCache};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Initialized,
}

/// Per-connection state reachable from validation tasks
struct Session {
    client: Client,
    flags: OnceLock<ClientFlags>,
    settings: Mutex<SettingsCache>,
    rule: Arc<dyn DiagnosticRule>,
}

impl Session {
    fn flags(&self) -> ClientFlags {
        self.flags.get().copied().unwrap_or_default()
    }

    /// Validate `document` on its own task. Nothing waits for it; a newer
    /// edit may finish first and be overwritten by this publish.
    fn spawn_validation(self: &Arc<Self>, document: Arc<TextDocument>) {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.validate(document).await });
    }

    async fn validate(&self, document: Arc<TextDocument>) {
        let uri = document.uri().clone();
        let pending = lock(&self.settings).get(&uri);

        let settings = match pending.await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Skipping diagnostics for {}: {}", uri, e);
                lock(&self.settings).evict_failed(&uri);
                return;
            }
        };

        let diagnostics = compute_diagnostics(
            &*self.rule,
            &document,
            &settings,
            self.flags().related_information,
        );

        debug!(
            "Publishing {} diagnostics for {} (version {})",
            diagnostics.len(),
            uri,
            document.version()
        );
        self.client
            .publish_diagnostics(uri, diagnostics, Some(document.version()))
            .await;
    }
}

pub struct Backend {
    session: Arc<Session>,
    state: Mutex<SessionState>,
    documents: Mutex<DocumentStore>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::build(client, Arc::new(UppercaseRule::new()))
    }

    /// Build a Backend with a custom diagnostic rule
    pub fn build(client: Client, rule: Arc<dyn DiagnosticRule>) -> Self {
        let source: Arc<dyn ConfigurationSource> =
            Arc::new(ClientConfigurationSource::new(client.clone()));
        let session = Arc::new(Session {
            client,
            flags: OnceLock::new(),
            settings: Mutex::new(SettingsCache::new(source)),
            rule,
        });

        let mut documents = DocumentStore::new();
        let on_change = Arc::clone(&session);
        documents.on_did_change_content(move |document| {
            on_change.spawn_validation(Arc::clone(document));
        });
        // Only keep settings for open documents
        let on_close = Arc::clone(&session);
        documents.on_did_close(move |document| {
            lock(&on_close.settings).remove(document.uri());
        });

        Self {
            session,
            state: Mutex::new(SessionState::Uninitialized),
            documents: Mutex::new(documents),
        }
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// URIs of the open documents, in open order
    pub fn open_documents(&self) -> Vec<Url> {
        lock(&self.documents).keys().cloned().collect()
    }

    async fn register_configuration_changes(&self) {
        let registration = Registration {
            id: CONFIGURATION_REGISTRATION_ID.to_string(),
            method: DidChangeConfiguration::METHOD.to_string(),
            register_options: None,
        };

        match self
            .session
            .client
            .register_capability(vec![registration])
            .await
        {
            Ok(()) => info!("Registered for configuration changes"),
            Err(e) => warn!("Failed to register for configuration changes: {}", e),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        *lock(&self.state) = SessionState::Initializing;

        let flags = ClientFlags::from_capabilities(&params.capabilities);
        if self.session.flags.set(flags).is_err() {
            warn!("Client capabilities already recorded, keeping the first set");
        }
        let flags = self.session.flags();
        lock(&self.session.settings).set_pull_enabled(flags.configuration);
        info!("Initializing with client capabilities {:?}", flags);

        Ok(InitializeResult {
            capabilities: server_capabilities(&flags),
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        *lock(&self.state) = SessionState::Initialized;
        self.session
            .client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;

        let flags = self.session.flags();
        if flags.configuration {
            self.register_configuration_changes().await;
        }
        if flags.workspace_folders {
            info!("Listening for workspace folder changes");
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("LSP server shutting down");
        self.session
            .client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("Document opened: {}", params.text_document.uri);
        lock(&self.documents).did_open(params);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!(
            "Document changed: {} (version {})",
            params.text_document.uri, params.text_document.version
        );
        lock(&self.documents).did_change(params);
    }

    async fn will_save(&self, params: WillSaveTextDocumentParams) {
        lock(&self.documents).will_save(params);
    }

    async fn will_save_wait_until(
        &self,
        params: WillSaveTextDocumentParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        Ok(Some(lock(&self.documents).will_save_wait_until(params)))
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        lock(&self.documents).did_save(params);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        lock(&self.documents).did_close(params);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let flags = self.session.flags();
        {
            let mut settings = lock(&self.session.settings);
            if flags.configuration {
                // Re-pulled per document on the next validation
                settings.invalidate_all();
            } else {
                settings.set_global(ExampleSettings::from_payload(&params.settings));
            }
        }

        let documents: Vec<Arc<TextDocument>> = lock(&self.documents).all().cloned().collect();
        info!(
            "Configuration changed, revalidating {} documents",
            documents.len()
        );
        for document in documents {
            self.session.spawn_validation(document);
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        if !self.session.flags().workspace_folders {
            debug!("Ignoring workspace folder change: client did not declare support");
            return;
        }
        info!(
            "Workspace folder change event received: {} added, {} removed",
            params.event.added.len(),
            params.event.removed.len()
        );
    }

    async fn completion(&self, _params: CompletionParams) -> Result<Option<CompletionResponse>> {
        Ok(Some(CompletionResponse::Array(completion_items())))
    }

    async fn completion_resolve(&self, params: CompletionItem) -> Result<CompletionItem> {
        Ok(resolve_completion_item(params))
    }
}

/// All shared state is touched from short critical sections that never await,
/// so a poisoned lock still holds consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
