//! Open-document store and its lifecycle events.
//!
//! Every handler mutates the map and fires its listeners synchronously, in
//! registration order, before returning. Notifications for URIs that are not
//! open are absorbed as no-ops: the editor may race a close against
//! in-flight notifications.

use std::sync::Arc;

use indexmap::IndexMap;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, TextDocumentSaveReason, TextEdit, Url,
    WillSaveTextDocumentParams,
};
use tracing::{debug, warn};

use super::text_document::TextDocument;

/// Payload of `willSave` / `willSaveWaitUntil` events.
#[derive(Debug, Clone)]
pub struct WillSaveEvent {
    pub document: Arc<TextDocument>,
    pub reason: TextDocumentSaveReason,
}

type DocumentListener = Box<dyn Fn(&Arc<TextDocument>) + Send + Sync>;
type WillSaveListener = Box<dyn Fn(&WillSaveEvent) + Send + Sync>;
type WillSaveWaitUntilHandler = Box<dyn Fn(&WillSaveEvent) -> Vec<TextEdit> + Send + Sync>;

#[derive(Default)]
struct Listeners {
    did_open: Vec<DocumentListener>,
    did_change_content: Vec<DocumentListener>,
    will_save: Vec<WillSaveListener>,
    will_save_wait_until: Option<WillSaveWaitUntilHandler>,
    did_save: Vec<DocumentListener>,
    did_close: Vec<DocumentListener>,
}

/// Open documents keyed by URI, in the order they were opened.
#[derive(Default)]
pub struct DocumentStore {
    documents: IndexMap<Url, Arc<TextDocument>>,
    listeners: Listeners,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_did_open(
        &mut self,
        listener: impl Fn(&Arc<TextDocument>) + Send + Sync + 'static,
    ) {
        self.listeners.did_open.push(Box::new(listener));
    }

    /// Fired after open and after every applied change.
    pub fn on_did_change_content(
        &mut self,
        listener: impl Fn(&Arc<TextDocument>) + Send + Sync + 'static,
    ) {
        self.listeners.did_change_content.push(Box::new(listener));
    }

    pub fn on_will_save(&mut self, listener: impl Fn(&WillSaveEvent) + Send + Sync + 'static) {
        self.listeners.will_save.push(Box::new(listener));
    }

    /// Install the handler answering `willSaveWaitUntil`. A later call replaces
    /// the earlier handler.
    pub fn on_will_save_wait_until(
        &mut self,
        handler: impl Fn(&WillSaveEvent) -> Vec<TextEdit> + Send + Sync + 'static,
    ) {
        self.listeners.will_save_wait_until = Some(Box::new(handler));
    }

    pub fn on_did_save(
        &mut self,
        listener: impl Fn(&Arc<TextDocument>) + Send + Sync + 'static,
    ) {
        self.listeners.did_save.push(Box::new(listener));
    }

    /// Receives the final snapshot of the removed document.
    pub fn on_did_close(
        &mut self,
        listener: impl Fn(&Arc<TextDocument>) + Send + Sync + 'static,
    ) {
        self.listeners.did_close.push(Box::new(listener));
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<TextDocument>> {
        self.documents.get(uri).cloned()
    }

    /// All open documents, in open order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<TextDocument>> {
        self.documents.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Url> {
        self.documents.keys()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn did_open(&mut self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        let document = Arc::new(TextDocument::new(
            item.uri.clone(),
            item.language_id,
            item.version,
            item.text,
        ));
        if self
            .documents
            .insert(item.uri, Arc::clone(&document))
            .is_some()
        {
            debug!("Document {} reopened without close", document.uri());
        }

        fire(&self.listeners.did_open, &document);
        fire(&self.listeners.did_change_content, &document);
    }

    /// Apply a full-content change. Only the last entry of `content_changes`
    /// is used.
    pub fn did_change(&mut self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let Some(change) = params.content_changes.into_iter().last() else {
            debug!("Ignoring change without content for {}", uri);
            return;
        };
        let Some(document) = self.documents.get_mut(&uri) else {
            debug!("Ignoring change for unknown document {}", uri);
            return;
        };
        if version < document.version() {
            warn!(
                "Ignoring stale change for {}: version {} < {}",
                uri,
                version,
                document.version()
            );
            return;
        }

        Arc::make_mut(document).update(change.text, version);
        let document = Arc::clone(document);

        fire(&self.listeners.did_change_content, &document);
    }

    pub fn will_save(&self, params: WillSaveTextDocumentParams) {
        let Some(event) = self.will_save_event(params) else {
            return;
        };
        for listener in &self.listeners.will_save {
            listener(&event);
        }
    }

    /// Edits to apply before saving. Empty when no handler is installed or the
    /// document is not open.
    pub fn will_save_wait_until(&self, params: WillSaveTextDocumentParams) -> Vec<TextEdit> {
        let Some(handler) = &self.listeners.will_save_wait_until else {
            return Vec::new();
        };
        self.will_save_event(params)
            .map(|event| handler(&event))
            .unwrap_or_default()
    }

    pub fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(document) = self.documents.get(&params.text_document.uri) {
            fire(&self.listeners.did_save, document);
        }
    }

    pub fn did_close(&mut self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(document) = self.documents.shift_remove(&uri) else {
            debug!("Ignoring close for unknown document {}", uri);
            return;
        };

        fire(&self.listeners.did_close, &document);
    }

    fn will_save_event(&self, params: WillSaveTextDocumentParams) -> Option<WillSaveEvent> {
        self.documents
            .get(&params.text_document.uri)
            .map(|document| WillSaveEvent {
                document: Arc::clone(document),
                reason: params.reason,
            })
    }
}

fn fire(listeners: &[DocumentListener], document: &Arc<TextDocument>) {
    for listener in listeners {
        listener(document);
    }
}
