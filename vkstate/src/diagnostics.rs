//! Reporting of malformed or unsupported capture data.
//!
//! The tracker never aborts on suspicious input: it reports what it saw to a [`DiagnosticSink`]
//! and falls back to a best-effort default.
use crate::vk;
use std::cell::RefCell;
use tracing::{debug, error, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Warning,
    Error,
}

/// The object a diagnostic is about.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DiagnosticContext {
    #[default]
    None,
    Image(vk::Image),
    Memory(vk::DeviceMemory),
}

/// Receives diagnostics emitted while tracking resource states.
pub trait DiagnosticSink {
    fn debug(&self, message: &str, context: DiagnosticContext);
    fn warn(&self, message: &str, context: DiagnosticContext);
    fn error(&self, message: &str, context: DiagnosticContext);
}

/// Forwards diagnostics to `tracing`.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn debug(&self, message: &str, context: DiagnosticContext) {
        debug!(?context, "{message}");
    }

    fn warn(&self, message: &str, context: DiagnosticContext) {
        warn!(?context, "{message}");
    }

    fn error(&self, message: &str, context: DiagnosticContext) {
        error!(?context, "{message}");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub context: DiagnosticContext,
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> RecordingDiagnostics {
        RecordingDiagnostics::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Number of recorded diagnostics with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.borrow().iter().filter(|d| d.severity == severity).count()
    }

    /// Returns whether a diagnostic of at least warning severity has been recorded.
    pub fn has_problems(&self) -> bool {
        self.entries.borrow().iter().any(|d| d.severity >= Severity::Warning)
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn push(&self, severity: Severity, message: &str, context: DiagnosticContext) {
        self.entries.borrow_mut().push(Diagnostic {
            severity,
            message: message.to_string(),
            context,
        });
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn debug(&self, message: &str, context: DiagnosticContext) {
        self.push(Severity::Debug, message, context);
    }

    fn warn(&self, message: &str, context: DiagnosticContext) {
        self.push(Severity::Warning, message, context);
    }

    fn error(&self, message: &str, context: DiagnosticContext) {
        self.push(Severity::Error, message, context);
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for std::rc::Rc<T> {
    fn debug(&self, message: &str, context: DiagnosticContext) {
        (**self).debug(message, context)
    }

    fn warn(&self, message: &str, context: DiagnosticContext) {
        (**self).warn(message, context)
    }

    fn error(&self, message: &str, context: DiagnosticContext) {
        (**self).error(message, context)
    }
}
