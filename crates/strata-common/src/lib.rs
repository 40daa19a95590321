//! Common types and utilities for the strata type-graph resolver.
//!
//! This crate provides foundational types shared by the solver and the CLI:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostics and the static message table
//! - Resolver limits and thresholds

// String interning for type names
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, DiagnosticRelatedInformation,
    diagnostic_codes, diagnostic_messages, format_message, get_message_template,
};

// Centralized limits and thresholds
pub mod limits;
