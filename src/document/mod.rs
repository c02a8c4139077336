//! Document model
//! - line_index.rs: offset <-> position conversion
//! - text_document.rs: one open document (text, version, language)
//! - store.rs: open documents keyed by URI and their lifecycle events

pub mod line_index;
pub mod store;
pub mod text_document;

pub use line_index::LineIndex;
pub use store::{DocumentStore, WillSaveEvent};
pub use text_document::TextDocument;
