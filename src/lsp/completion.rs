//! Static completion catalog
//!
//! Items carry an opaque numeric id in `data`; `completionItem/resolve` uses
//! it to fill in detail and documentation.

use serde_json::{Value, json};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Documentation};

struct CatalogEntry {
    id: u64,
    label: &'static str,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: 1,
        label: "TypeScript",
    },
    CatalogEntry {
        id: 2,
        label: "JavaScript",
    },
];

/// The items offered at every position
pub fn completion_items() -> Vec<CompletionItem> {
    CATALOG
        .iter()
        .map(|entry| CompletionItem {
            label: entry.label.to_string(),
            kind: Some(CompletionItemKind::TEXT),
            data: Some(json!(entry.id)),
            ..Default::default()
        })
        .collect()
}

/// Fill in `detail` and `documentation` for a catalog item. Items whose data
/// is not a known id come back unchanged.
pub fn resolve_completion_item(mut item: CompletionItem) -> CompletionItem {
    let Some(entry) = item
        .data
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|id| CATALOG.iter().find(|entry| entry.id == id))
    else {
        return item;
    };

    item.detail = Some(format!("{} details", entry.label));
    item.documentation = Some(Documentation::String(format!(
        "{} documentation",
        entry.label
    )));
    item
}
