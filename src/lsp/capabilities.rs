//! Capability negotiation

use tower_lsp::lsp_types::{
    ClientCapabilities, CompletionOptions, ServerCapabilities, TextDocumentSyncCapability,
    TextDocumentSyncKind, WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};

/// Client features recorded once at `initialize`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFlags {
    /// Client answers `workspace/configuration`
    pub configuration: bool,
    /// Client sends workspace folder changes
    pub workspace_folders: bool,
    /// Client renders `relatedInformation` on diagnostics
    pub related_information: bool,
}

impl ClientFlags {
    pub fn from_capabilities(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();

        Self {
            configuration: workspace.and_then(|w| w.configuration).unwrap_or(false),
            workspace_folders: workspace.and_then(|w| w.workspace_folders).unwrap_or(false),
            related_information: capabilities
                .text_document
                .as_ref()
                .and_then(|t| t.publish_diagnostics.as_ref())
                .and_then(|p| p.related_information)
                .unwrap_or(false),
        }
    }
}

/// Capabilities declared in the `initialize` result
pub fn server_capabilities(flags: &ClientFlags) -> ServerCapabilities {
    let workspace = flags.workspace_folders.then(|| WorkspaceServerCapabilities {
        workspace_folders: Some(WorkspaceFoldersServerCapabilities {
            supported: Some(true),
            change_notifications: None,
        }),
        file_operations: None,
    });

    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(true),
            ..Default::default()
        }),
        workspace,
        ..Default::default()
    }
}
