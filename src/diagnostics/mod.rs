//! Structured notices for degraded paths.
//!
//! Nothing in the container fails loudly: a bad `x-for` expression, a
//! non-sequence source, a write through the read-only view all leave the
//! affected piece untouched and produce a [`Diagnostic`] instead. Every
//! diagnostic is fanned out to the registered [`DiagnosticSink`]s.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// A non-fatal notice emitted on a degraded or no-op path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("Target is already attached; ignoring duplicate attach")]
    DuplicateTarget,

    #[error("Skipping dropped target in render pass")]
    DroppedTarget,

    #[error("Invalid x-for syntax: {expression}")]
    InvalidForSyntax { expression: String },

    #[error("x-for: {key} is not an array")]
    NotASequence { key: String },

    #[error("x-for: no template element found for '{expression}'")]
    MissingTemplate { expression: String },

    #[error("Expression '{expression}' fell back to literal text: {error}")]
    ExpressionFallback { expression: String, error: String },

    #[error("Direct state mutation of '{key}' is not allowed. Use set_state() instead.")]
    ReadOnlyWrite { key: String },

    #[error("Direct state deletion of '{key}' is not allowed. Use set_state() instead.")]
    ReadOnlyDelete { key: String },
}

impl Diagnostic {
    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::DuplicateTarget => "duplicate_target",
            Diagnostic::DroppedTarget => "dropped_target",
            Diagnostic::InvalidForSyntax { .. } => "invalid_for_syntax",
            Diagnostic::NotASequence { .. } => "not_a_sequence",
            Diagnostic::MissingTemplate { .. } => "missing_template",
            Diagnostic::ExpressionFallback { .. } => "expression_fallback",
            Diagnostic::ReadOnlyWrite { .. } => "read_only_write",
            Diagnostic::ReadOnlyDelete { .. } => "read_only_delete",
        }
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::warn!(kind = diagnostic.kind(), "{}", diagnostic);
    }
}

/// Records diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.entries.lock().iter().map(Diagnostic::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}

/// Fan-out over a set of sinks.
#[derive(Clone)]
pub struct Diagnostics {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl Diagnostics {
    /// A hub that only forwards to [`TracingSink`].
    pub fn new() -> Self {
        Self {
            sinks: vec![Arc::new(TracingSink)],
        }
    }

    /// A hub with no sinks at all.
    pub fn silent() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sinks.push(sink);
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        for sink in &self.sinks {
            sink.report(&diagnostic);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
