//! Diagnostic types and message lookup for the resolver.
//!
//! Messages are static templates with positional `{0}`, `{1}` placeholders.
//! Faults are rendered into these only when a host asks for user-facing
//! output, so resolution itself never formats strings.

use serde::Serialize;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// A message template with its numeric code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Related information for a diagnostic (e.g. the other half of a cycle).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A user-facing diagnostic with optional related information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            file: file.into(),
            start,
            length,
            message_text: message.into(),
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub fn warning(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            ..Self::error(file, start, length, message, code)
        }
    }

    /// Build a diagnostic from a message template, filling `{n}` placeholders.
    #[must_use]
    pub fn from_message(
        message: &DiagnosticMessage,
        file: impl Into<String>,
        start: u32,
        length: u32,
        args: &[&str],
    ) -> Self {
        Self {
            file: file.into(),
            start,
            length,
            message_text: format_message(message.message, args),
            category: message.category,
            code: message.code,
            related_information: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_related(
        mut self,
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file: file.into(),
            start,
            length,
            message_text: message.into(),
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

// =============================================================================
// Message table
// =============================================================================

pub mod diagnostic_codes {
    pub const LIST_ANNOTATION_CONFLICT: u32 = 1001;
    pub const CIRCULAR_FACT_REFERENCE: u32 = 1002;
    pub const LIST_DIMENSIONAL_DISCREPANCY: u32 = 1003;
    pub const PATTERN_NON_COVARIANT: u32 = 1004;
    pub const RESOLUTION_LIMIT_EXCEEDED: u32 = 1005;
    pub const UNSATISFIED_CONTRACT: u32 = 2001;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const LIST_ANNOTATION_CONFLICT: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::LIST_ANNOTATION_CONFLICT,
        category: DiagnosticCategory::Error,
        message: "'{0}' is annotated as both a list and a non-list of '{1}'.",
    };
    pub const CIRCULAR_FACT_REFERENCE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::CIRCULAR_FACT_REFERENCE,
        category: DiagnosticCategory::Error,
        message: "'{0}' circularly inherits from itself through '{1}'.",
    };
    pub const LIST_DIMENSIONAL_DISCREPANCY: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::LIST_DIMENSIONAL_DISCREPANCY,
        category: DiagnosticCategory::Error,
        message: "'{0}' has list dimensionality {1}, but base '{2}' requires {3}.",
    };
    pub const PATTERN_NON_COVARIANT: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::PATTERN_NON_COVARIANT,
        category: DiagnosticCategory::Error,
        message: "Pattern '{0}' can match values that base pattern '{1}' rejects.",
    };
    pub const RESOLUTION_LIMIT_EXCEEDED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::RESOLUTION_LIMIT_EXCEEDED,
        category: DiagnosticCategory::Error,
        message: "Resolving '{0}' exceeded the maximum construction depth.",
    };
    pub const UNSATISFIED_CONTRACT: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSATISFIED_CONTRACT,
        category: DiagnosticCategory::Warning,
        message: "'{0}' does not inherit '{1}', which an overridden declaration requires.",
    };
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    diagnostic_messages::LIST_ANNOTATION_CONFLICT,
    diagnostic_messages::CIRCULAR_FACT_REFERENCE,
    diagnostic_messages::LIST_DIMENSIONAL_DISCREPANCY,
    diagnostic_messages::PATTERN_NON_COVARIANT,
    diagnostic_messages::RESOLUTION_LIMIT_EXCEEDED,
    diagnostic_messages::UNSATISFIED_CONTRACT,
];

pub fn get_message_template(code: u32) -> Option<&'static str> {
    DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod tests;
