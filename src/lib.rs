//! A minimal language server.
//!
//! - [`document`]: text document model and the open-document store
//! - [`lsp`]: session controller, settings cache, diagnostics and completion
//! - [`config`]: settings schema and filesystem locations
//! - [`error`]: library error type

pub mod config;
pub mod document;
pub mod error;
pub mod lsp;
