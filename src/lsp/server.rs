//! Stdio server bootstrap

use anyhow::Context;
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{data_dir, log_path};
use crate::lsp::backend::Backend;

/// Serve LSP over stdin/stdout until the client disconnects.
///
/// `log_directive` is used when `RUST_LOG` is not set.
pub async fn run_server(log_directive: &str) -> anyhow::Result<()> {
    let _guard = init_logging(log_directive)?;
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Client disconnected, exiting");
    Ok(())
}

/// Log to a file under the data directory; stdout carries the protocol.
fn init_logging(log_directive: &str) -> anyhow::Result<WorkerGuard> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {:?}", dir))?;

    let log_path = log_path();
    let file_name = log_path
        .file_name()
        .context("Log path has no file name")?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, file_name));

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_directive))
        .with_context(|| format!("Invalid log directive {:?}", log_directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(guard)
}
