use thiserror::Error;
use tower_lsp::lsp_types::Url;

/// Errors raised while talking to the client on behalf of a document.
///
/// `Clone` so a failure can be the output of a shared settings future.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Configuration request failed: {0}")]
    ConfigurationRequest(#[from] tower_lsp::jsonrpc::Error),

    #[error("Configuration response for {0} was empty")]
    EmptyConfiguration(Url),
}
