//! Per-document settings cache
//!
//! When the client supports `workspace/configuration`, each document's
//! settings are pulled once and the pending request is shared by every caller
//! until the entry is dropped. Otherwise one global value serves all
//! documents.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tower_lsp::Client;
use tower_lsp::lsp_types::{ConfigurationItem, Url};
use tracing::debug;

use crate::config::{ExampleSettings, SETTINGS_SECTION};
use crate::error::Error;

/// A settings lookup that may still be in flight. Cloning shares the same
/// underlying request.
pub type PendingSettings = Shared<BoxFuture<'static, Result<ExampleSettings, Error>>>;

/// Source of scoped configuration values
#[async_trait]
pub trait ConfigurationSource: Send + Sync + 'static {
    /// Fetch the value of `section` as seen from `scope_uri`
    async fn fetch(&self, scope_uri: Url, section: &str) -> Result<Value, Error>;
}

/// Pulls configuration from the editor with `workspace/configuration`
pub struct ClientConfigurationSource {
    client: Client,
}

impl ClientConfigurationSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigurationSource for ClientConfigurationSource {
    async fn fetch(&self, scope_uri: Url, section: &str) -> Result<Value, Error> {
        let items = vec![ConfigurationItem {
            scope_uri: Some(scope_uri.clone()),
            section: Some(section.to_string()),
        }];

        self.client
            .configuration(items)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::EmptyConfiguration(scope_uri))
    }
}

pub struct SettingsCache {
    source: Arc<dyn ConfigurationSource>,
    pull_enabled: bool,
    global: ExampleSettings,
    entries: HashMap<Url, PendingSettings>,
}

impl SettingsCache {
    pub fn new(source: Arc<dyn ConfigurationSource>) -> Self {
        Self {
            source,
            pull_enabled: false,
            global: ExampleSettings::default(),
            entries: HashMap::new(),
        }
    }

    /// Switch between per-document pulls and the single global value.
    pub fn set_pull_enabled(&mut self, enabled: bool) {
        self.pull_enabled = enabled;
        self.entries.clear();
    }

    pub fn set_global(&mut self, settings: ExampleSettings) {
        self.global = settings;
    }

    pub fn global(&self) -> ExampleSettings {
        self.global
    }

    /// Settings for `uri`.
    ///
    /// Starts at most one pull per document; concurrent callers share it.
    pub fn get(&mut self, uri: &Url) -> PendingSettings {
        if !self.pull_enabled {
            return futures::future::ready(Ok(self.global)).boxed().shared();
        }

        self.entries
            .entry(uri.clone())
            .or_insert_with(|| {
                debug!("Pulling settings for {}", uri);
                let source = Arc::clone(&self.source);
                let uri = uri.clone();
                async move {
                    let section = source.fetch(uri, SETTINGS_SECTION).await?;
                    Ok(ExampleSettings::from_section(&section))
                }
                .boxed()
                .shared()
            })
            .clone()
    }

    /// Drop every entry. Requests already handed out keep running but are not
    /// reused.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn remove(&mut self, uri: &Url) {
        self.entries.remove(uri);
    }

    /// Drop the entry for `uri` if its pull completed with an error, so the
    /// next lookup pulls again.
    pub fn evict_failed(&mut self, uri: &Url) {
        if matches!(self.entries.get(uri).and_then(Shared::peek), Some(Err(_))) {
            self.entries.remove(uri);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
