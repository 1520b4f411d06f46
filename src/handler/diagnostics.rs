//! Diagnostic sinks for tolerated routing misses.
//!
//! Unknown method and service IDs are expected traffic (version skew,
//! malformed frames). They are reported to a [`DiagnosticSink`] and the
//! dispatch completes normally. The default sink is [`TracingSink`].

use std::fmt;
use std::sync::Mutex;

/// A routing miss reported by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No handler for `method_id` on `service`.
    UnknownMethod {
        /// Type name of the service that received the call.
        service: String,
        /// Method ID as decoded from the wire.
        method_id: u32,
    },
    /// No service registered under `service_id`.
    UnknownService {
        /// Service ID as decoded from the wire.
        service_id: u32,
        /// Method ID the caller asked for.
        method_id: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownMethod { service, method_id } => write!(
                f,
                "Unknown method {} (0x{:02x}) called on {}",
                method_id, method_id, service
            ),
            Diagnostic::UnknownService {
                service_id,
                method_id,
            } => write!(
                f,
                "Unknown service {} (method {}) requested",
                service_id, method_id
            ),
        }
    }
}

/// Receiver for dispatcher diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Report a routing miss.
    fn report(&self, diagnostic: Diagnostic);

    /// Report a call to a method ID with no registered handler.
    fn unknown_method(&self, service: &str, method_id: u32) {
        self.report(Diagnostic::UnknownMethod {
            service: service.to_string(),
            method_id,
        });
    }

    /// Report a call to a service ID with no registered service.
    fn unknown_service(&self, service_id: u32, method_id: u32) {
        self.report(Diagnostic::UnknownService {
            service_id,
            method_id,
        });
    }
}

/// Emits diagnostics as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::UnknownMethod { service, method_id } => {
                tracing::warn!(service = %service, method_id, "{}", diagnostic);
            }
            Diagnostic::UnknownService {
                service_id,
                method_id,
            } => {
                tracing::warn!(service_id, method_id, "{}", diagnostic);
            }
        }
    }
}

/// Keeps diagnostics in memory. Intended for tests and debugging tools.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of diagnostics reported.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
