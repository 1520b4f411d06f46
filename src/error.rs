//! Error types for servicewire.

use thiserror::Error;

/// Boxed error produced by handler code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for registry construction and dispatch.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Two handlers on the same service declared the same method ID.
    #[error("Duplicate method ID 0x{method_id:02x} registered on {service}")]
    DuplicateMethod {
        /// Type name of the offending service.
        service: &'static str,
        /// The method ID declared twice.
        method_id: u8,
    },

    /// Two services routed through one router share a service ID.
    #[error("Duplicate service ID {0}")]
    DuplicateService(u32),

    /// Two services routed through one router share a server hash.
    #[error("Duplicate server hash 0x{0:08x}")]
    DuplicateServerHash(u32),

    /// A declaration states its server identity ambiguously or not at all.
    #[error("Invalid declaration for service {service_id}: {reason}")]
    InvalidDeclaration {
        /// Service ID of the offending declaration.
        service_id: u32,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// JSON serialization/deserialization error (declarations and schema export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error (typed handler payloads).
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Failure raised by a handler's own logic.
    #[error("Handler error: {0}")]
    Handler(#[source] BoxError),
}

impl ServiceError {
    /// Wrap an arbitrary handler failure.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ServiceError::Handler(err.into())
    }
}

/// Result type alias using ServiceError.
pub type Result<T> = std::result::Result<T, ServiceError>;
