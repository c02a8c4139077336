//! Diagnostics generation for open documents

use std::ops::Range as ByteRange;

#[cfg(test)]
use mockall::automock;
use regex::Regex;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location, Range,
};

use crate::config::ExampleSettings;
use crate::document::TextDocument;

/// Source tag attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "ex";

/// A problem found by a rule, located by byte offsets into the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub span: ByteRange<usize>,
    pub message: String,
}

/// Trait for rules that scan document text
#[cfg_attr(test, automock)]
pub trait DiagnosticRule: Send + Sync + 'static {
    /// Findings in left-to-right order
    fn check(&self, text: &str) -> Vec<Finding>;
}

/// Flags every word of two or more uppercase ASCII letters
pub struct UppercaseRule {
    word_re: Regex,
}

impl UppercaseRule {
    pub fn new() -> Self {
        Self {
            word_re: Regex::new(r"\b[A-Z]{2,}\b").unwrap(),
        }
    }
}

impl Default for UppercaseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRule for UppercaseRule {
    fn check(&self, text: &str) -> Vec<Finding> {
        self.word_re
            .find_iter(text)
            .map(|m| Finding {
                span: m.range(),
                message: format!("{} is all uppercase.", m.as_str()),
            })
            .collect()
    }
}

/// Build the diagnostics to publish for `document`.
///
/// At most `settings.max_number_of_problems` findings are kept. Related
/// information is attached only when the client declared support for it.
pub fn compute_diagnostics(
    rule: &dyn DiagnosticRule,
    document: &TextDocument,
    settings: &ExampleSettings,
    related_information: bool,
) -> Vec<Diagnostic> {
    rule.check(document.text())
        .into_iter()
        .take(settings.max_number_of_problems)
        .map(|finding| {
            let range = Range::new(
                document.position_at(finding.span.start),
                document.position_at(finding.span.end),
            );
            let related_information =
                related_information.then(|| related_entries(document, range));

            Diagnostic {
                range,
                severity: Some(DiagnosticSeverity::WARNING),
                message: finding.message,
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                related_information,
                ..Default::default()
            }
        })
        .collect()
}

fn related_entries(document: &TextDocument, range: Range) -> Vec<DiagnosticRelatedInformation> {
    ["Spelling matters", "Particularly for names"]
        .into_iter()
        .map(|message| DiagnosticRelatedInformation {
            location: Location::new(document.uri().clone(), range),
            message: message.to_string(),
        })
        .collect()
}
