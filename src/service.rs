//! Service declarations and the per-instance dispatcher.
//!
//! A service type implements [`Service`]: it states its
//! [`ServiceDescriptor`] as a constant and lists its handlers in
//! [`Service::methods`]. Wrapping an instance in a [`ServiceHost`] builds
//! the method table once; the host is then immutable and can be shared
//! behind an `Arc` by every connection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use servicewire::{HandlerResult, RegistryBuilder, Service, ServiceDescriptor, ServiceHost};
//!
//! struct Presence;
//!
//! impl Presence {
//!     async fn subscribe(self: Arc<Self>, _conn: u64, _payload: Bytes) -> HandlerResult {
//!         Ok(())
//!     }
//! }
//!
//! impl Service for Presence {
//!     type Connection = u64;
//!     const DESCRIPTOR: ServiceDescriptor =
//!         ServiceDescriptor::named(0x0B, "bnet.protocol.presence.PresenceService", 0);
//!
//!     fn methods(
//!         methods: RegistryBuilder<Self, Self::Connection>,
//!     ) -> RegistryBuilder<Self, Self::Connection> {
//!         methods.method(1, "subscribe", Self::subscribe)
//!     }
//! }
//!
//! let host = ServiceHost::new(Presence).unwrap();
//! assert_eq!(host.registry().method_ids(), vec![1]);
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::handler::{DiagnosticSink, MethodRegistry, RegistryBuilder};
use crate::schema::{MethodSchema, ServiceSchema};

/// A numbered group of remote-callable handlers.
pub trait Service: Send + Sync + Sized + 'static {
    /// Handle for the calling peer, supplied by the transport layer.
    type Connection: Send + 'static;

    /// Protocol identity of this service.
    const DESCRIPTOR: ServiceDescriptor;

    /// Register this service's handlers.
    fn methods(
        methods: RegistryBuilder<Self, Self::Connection>,
    ) -> RegistryBuilder<Self, Self::Connection>;
}

/// A service instance together with its frozen method table.
pub struct ServiceHost<S: Service> {
    service: Arc<S>,
    registry: MethodRegistry<S, S::Connection>,
}

impl<S: Service> ServiceHost<S> {
    /// Build the method table for `service`, logging misses via `tracing`.
    ///
    /// # Errors
    ///
    /// Fails if the service declares the same method ID twice.
    pub fn new(service: S) -> Result<Self> {
        Self::from_builder(service, S::methods(RegistryBuilder::new()))
    }

    /// Build the method table for `service`, reporting misses to `sink`.
    pub fn with_diagnostics(service: S, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        Self::from_builder(service, S::methods(RegistryBuilder::new()).diagnostics(sink))
    }

    fn from_builder(service: S, builder: RegistryBuilder<S, S::Connection>) -> Result<Self> {
        let registry = builder.build()?;
        let descriptor = S::DESCRIPTOR;
        tracing::debug!(
            "Hosting {} as service {} (hash 0x{:08x})",
            registry.service_name(),
            descriptor.service_id,
            descriptor.server_hash
        );

        Ok(Self {
            service: Arc::new(service),
            registry,
        })
    }

    /// Protocol identity of the hosted service.
    pub fn descriptor(&self) -> ServiceDescriptor {
        S::DESCRIPTOR
    }

    /// The hosted service instance.
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// The frozen method table.
    pub fn registry(&self) -> &MethodRegistry<S, S::Connection> {
        &self.registry
    }

    /// Route a decoded call to its handler.
    ///
    /// Unknown method IDs are reported and complete with `Ok(())`.
    /// Handler failures are returned unchanged.
    pub async fn dispatch(&self, method_id: u32, conn: S::Connection, payload: Bytes) -> Result<()> {
        self.registry
            .dispatch(&self.service, method_id, conn, payload)
            .await
    }

    /// Describe the hosted service and its methods.
    pub fn schema(&self) -> ServiceSchema {
        let mut schema = ServiceSchema::new(self.registry.service_name(), S::DESCRIPTOR);
        for (method, name) in self.registry.methods() {
            schema.add_method(method, MethodSchema::new(name));
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::handler::HandlerResult;

    struct Clock;

    impl Clock {
        async fn tick(self: Arc<Self>, _conn: (), _payload: Bytes) -> HandlerResult {
            Ok(())
        }
    }

    impl Service for Clock {
        type Connection = ();
        const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::new(4, 0xDEAD_BEEF, 0x1234);

        fn methods(
            methods: RegistryBuilder<Self, Self::Connection>,
        ) -> RegistryBuilder<Self, Self::Connection> {
            methods.method(1, "tick", Self::tick).method(2, "tock", Self::tick)
        }
    }

    struct Clash;

    impl Service for Clash {
        type Connection = ();
        const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::named(5, "Clash", 0);

        fn methods(
            methods: RegistryBuilder<Self, Self::Connection>,
        ) -> RegistryBuilder<Self, Self::Connection> {
            methods
                .method(3, "a", |_s: Arc<Self>, _c: (), _p: Bytes| async { Ok(()) })
                .method(3, "b", |_s: Arc<Self>, _c: (), _p: Bytes| async { Ok(()) })
        }
    }

    #[test]
    fn test_host_builds_registry() {
        let host = ServiceHost::new(Clock).unwrap();
        assert_eq!(host.descriptor(), Clock::DESCRIPTOR);
        assert_eq!(host.registry().method_ids(), vec![1, 2]);
    }

    #[test]
    fn test_host_rejects_duplicate_methods() {
        let err = ServiceHost::new(Clash).err().unwrap();
        assert!(matches!(
            err,
            ServiceError::DuplicateMethod { method_id: 3, .. }
        ));
    }

    #[test]
    fn test_schema_lists_methods() {
        let host = ServiceHost::new(Clock).unwrap();
        let schema = host.schema();

        assert_eq!(schema.descriptor, Clock::DESCRIPTOR);
        assert_eq!(schema.methods.len(), 2);
        assert_eq!(schema.methods[&2].name, "tock");
        assert!(schema.service.ends_with("Clock"));
    }
}
