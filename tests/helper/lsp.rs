//! LSP request/notification test utilities

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tower_lsp::ClientSocket;
use tower_lsp::jsonrpc::{self, Request, Response};
use tower_lsp::lsp_types::*;

/// Build client capabilities from their JSON form
pub fn client_capabilities(value: Value) -> ClientCapabilities {
    serde_json::from_value(value).unwrap()
}

/// Create an LSP initialize request
pub fn create_initialize_request(id: i64, capabilities: ClientCapabilities) -> Request {
    Request::build("initialize")
        .id(id)
        .params(
            serde_json::to_value(InitializeParams {
                capabilities,
                ..Default::default()
            })
            .unwrap(),
        )
        .finish()
}

/// Create an LSP initialized notification
pub fn create_initialized_notification() -> Request {
    Request::build("initialized")
        .params(serde_json::to_value(InitializedParams {}).unwrap())
        .finish()
}

/// Create an LSP didOpen notification
pub fn create_did_open_notification(uri: &str, content: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(
            serde_json::to_value(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri.parse().unwrap(),
                    language_id: "plaintext".to_string(),
                    version: 1,
                    text: content.to_string(),
                },
            })
            .unwrap(),
        )
        .finish()
}

/// Create an LSP didChange notification
pub fn create_did_change_notification(uri: &str, content: &str, version: i32) -> Request {
    Request::build("textDocument/didChange")
        .params(
            serde_json::to_value(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri.parse().unwrap(),
                    version,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: content.to_string(),
                }],
            })
            .unwrap(),
        )
        .finish()
}

/// Create an LSP didClose notification
pub fn create_did_close_notification(uri: &str) -> Request {
    Request::build("textDocument/didClose")
        .params(
            serde_json::to_value(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier {
                    uri: uri.parse().unwrap(),
                },
            })
            .unwrap(),
        )
        .finish()
}

/// Create a workspace/didChangeConfiguration notification
pub fn create_did_change_configuration_notification(settings: Value) -> Request {
    Request::build("workspace/didChangeConfiguration")
        .params(serde_json::to_value(DidChangeConfigurationParams { settings }).unwrap())
        .finish()
}

/// Create a textDocument/willSaveWaitUntil request
pub fn create_will_save_wait_until_request(id: i64, uri: &str) -> Request {
    Request::build("textDocument/willSaveWaitUntil")
        .id(id)
        .params(
            serde_json::to_value(WillSaveTextDocumentParams {
                text_document: TextDocumentIdentifier {
                    uri: uri.parse().unwrap(),
                },
                reason: TextDocumentSaveReason::MANUAL,
            })
            .unwrap(),
        )
        .finish()
}

/// Create a textDocument/completion request
pub fn create_completion_request(id: i64, uri: &str) -> Request {
    Request::build("textDocument/completion")
        .id(id)
        .params(
            serde_json::to_value(CompletionParams {
                text_document_position: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier {
                        uri: uri.parse().unwrap(),
                    },
                    position: Position::new(0, 0),
                },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
                context: None,
            })
            .unwrap(),
        )
        .finish()
}

/// Create a completionItem/resolve request
pub fn create_completion_resolve_request(id: i64, item: &CompletionItem) -> Request {
    Request::build("completionItem/resolve")
        .id(id)
        .params(serde_json::to_value(item).unwrap())
        .finish()
}

/// Play the editor side of the connection.
///
/// Answers `workspace/configuration` with the current value of `section`
/// (one entry per requested item) and every other server request with
/// `null`. Every message from the server, answered or not, is forwarded to
/// the returned receiver.
pub fn spawn_fake_editor(
    socket: ClientSocket,
    section: Arc<Mutex<Value>>,
) -> mpsc::Receiver<Request> {
    spawn_fake_editor_failing_pulls(socket, section, 0)
}

/// Like [`spawn_fake_editor`], but the first `failing_pulls`
/// `workspace/configuration` requests are answered with an internal error.
pub fn spawn_fake_editor_failing_pulls(
    socket: ClientSocket,
    section: Arc<Mutex<Value>>,
    mut failing_pulls: usize,
) -> mpsc::Receiver<Request> {
    let (tx, rx) = mpsc::channel(100);
    let (mut requests, mut responses) = socket.split();

    tokio::spawn(async move {
        while let Some(request) = requests.next().await {
            if let Some(id) = request.id().cloned() {
                let response = match request.method() {
                    "workspace/configuration" if failing_pulls > 0 => {
                        failing_pulls -= 1;
                        Response::from_error(id, jsonrpc::Error::internal_error())
                    }
                    "workspace/configuration" => {
                        let items = request
                            .params()
                            .and_then(|p| p.get("items"))
                            .and_then(Value::as_array)
                            .map_or(1, Vec::len);
                        let value = section.lock().unwrap().clone();
                        Response::from_ok(id, Value::Array(vec![value; items]))
                    }
                    _ => Response::from_ok(id, Value::Null),
                };
                if responses.send(response).await.is_err() {
                    break;
                }
            }
            if tx.send(request).await.is_err() {
                break;
            }
        }
    });

    rx
}

/// Wait for a notification with the specified method name from the receiver
pub async fn wait_for_notification(
    rx: &mut mpsc::Receiver<Request>,
    method: &str,
) -> Option<Request> {
    let timeout_duration = Duration::from_secs(5);

    loop {
        match timeout(timeout_duration, rx.recv()).await {
            Ok(Some(notification)) => {
                if notification.method() == method {
                    return Some(notification);
                }
                // Skip other notifications (like log_message)
            }
            _ => return None,
        }
    }
}

/// Collect everything the server sends until it stays quiet for `quiet`
pub async fn collect_until_quiet(rx: &mut mpsc::Receiver<Request>, quiet: Duration) -> Vec<Request> {
    let mut collected = Vec::new();
    while let Ok(Some(request)) = timeout(quiet, rx.recv()).await {
        collected.push(request);
    }
    collected
}

/// Decode every publishDiagnostics notification among `requests`
pub fn published_diagnostics(requests: &[Request]) -> Vec<PublishDiagnosticsParams> {
    requests
        .iter()
        .filter(|r| r.method() == "textDocument/publishDiagnostics")
        .map(|r| serde_json::from_value(r.params().unwrap().clone()).unwrap())
        .collect()
}

/// Count requests with the given method
pub fn count_method(requests: &[Request], method: &str) -> usize {
    requests.iter().filter(|r| r.method() == method).count()
}

/// Settings section value with the given cap
pub fn section_with_max(max: u64) -> Arc<Mutex<Value>> {
    Arc::new(Mutex::new(json!({ "maxNumberOfProblems": max })))
}
