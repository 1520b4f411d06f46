//! Handler module - method registration and dispatch.
//!
//! Provides:
//! - [`RegistryBuilder`] - collects `(method ID, handler)` pairs
//! - [`MethodRegistry`] - frozen method table with `dispatch`
//! - [`DiagnosticSink`] - where unknown-method reports go
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use servicewire::handler::{MemorySink, RegistryBuilder};
//!
//! struct Presence;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sink = Arc::new(MemorySink::new());
//! let registry = RegistryBuilder::<Presence, ()>::new()
//!     .method(1, "subscribe", |_svc: Arc<Presence>, _conn: (), _payload: Bytes| async { Ok(()) })
//!     .diagnostics(sink.clone())
//!     .build()
//!     .unwrap();
//!
//! // Unknown IDs are reported, not raised.
//! registry.dispatch(&Arc::new(Presence), 77, (), Bytes::new()).await.unwrap();
//! assert_eq!(sink.len(), 1);
//! # });
//! ```

mod diagnostics;
mod registry;

pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use registry::{
    BoxFuture, Handler, HandlerResult, MethodRegistry, RawHandler, RegistryBuilder, TypedHandler,
};
