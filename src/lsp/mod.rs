//! LSP (Language Server Protocol) implementation layer
//!
//! This module negotiates capabilities with the editor, keeps open documents
//! in sync and publishes diagnostics for them.
//!
//! # Modules
//!
//! - [`backend`]: Session controller implementing the `LanguageServer` trait
//! - [`capabilities`]: Client capability flags and declared server capabilities
//! - [`completion`]: Static completion catalog and item resolution
//! - [`diagnostics`]: Pluggable diagnostic rules and diagnostic construction
//! - [`settings`]: Per-document settings cache backed by `workspace/configuration`
//! - [`server`]: LSP server initialization and lifecycle

pub mod backend;
pub mod capabilities;
pub mod completion;
pub mod diagnostics;
pub mod server;
pub mod settings;
