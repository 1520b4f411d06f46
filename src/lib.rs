//! # servicewire
//!
//! Declarative method-dispatch registry for numbered RPC services.
//!
//! A server exposes remote-callable handlers grouped into services. Each
//! service has a numeric service ID and a server hash derived from its
//! name; each handler has a single-byte method ID. The transport layer
//! decodes `(service ID, method ID, payload)` from a frame and hands it to
//! this crate, which invokes exactly one matching handler.
//!
//! ## Architecture
//!
//! - [`hash`] - name to server hash (`const fn`)
//! - [`descriptor`] - service and method identity
//! - [`handler`] - method table build and dispatch
//! - [`service`] - the [`Service`] trait and [`ServiceHost`]
//! - [`router`] - routing by service ID and bind lookup by hash
//! - [`schema`] - JSON description of services and method IDs
//! - [`codec`] - MsgPack payload decoding for typed handlers
//! - [`error`] - [`ServiceError`] and the crate [`Result`] alias
//!
//! Unknown method and service IDs are reported to a diagnostic sink and
//! never fail the call. Duplicate method IDs fail the build.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use servicewire::{HandlerResult, RegistryBuilder, Service, ServiceDescriptor, ServiceHost};
//!
//! struct Auth;
//!
//! impl Auth {
//!     async fn logon(self: Arc<Self>, _peer: u64, _payload: Bytes) -> HandlerResult {
//!         Ok(())
//!     }
//! }
//!
//! impl Service for Auth {
//!     type Connection = u64;
//!     const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::named(
//!         0x01,
//!         "bnet.protocol.authentication.AuthenticationServer",
//!         0x7113_3B83,
//!     );
//!
//!     fn methods(
//!         methods: RegistryBuilder<Self, Self::Connection>,
//!     ) -> RegistryBuilder<Self, Self::Connection> {
//!         methods.method(1, "logon", Self::logon)
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let host = ServiceHost::new(Auth).unwrap();
//! host.dispatch(1, 42, Bytes::new()).await.unwrap();
//! # });
//! ```

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod hash;
pub mod router;
pub mod schema;
pub mod service;

pub use descriptor::{MethodDescriptor, ServiceDeclaration, ServiceDescriptor};
pub use error::{Result, ServiceError};
pub use handler::{DiagnosticSink, HandlerResult, MethodRegistry, RegistryBuilder};
pub use hash::service_hash;
pub use router::{DispatchService, ServiceRouter};
pub use service::{Service, ServiceHost};
