//! Routing by service ID.
//!
//! A [`ServiceRouter`] owns the hosted services that share one connection
//! type and forwards a decoded `(service ID, method ID)` pair to the right
//! [`ServiceHost`]. It also answers bind lookups by server hash.
//!
//! Registration takes `&mut self`; once every service is registered the
//! router is typically moved into an `Arc` and only read from.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::descriptor::ServiceDescriptor;
use crate::error::{Result, ServiceError};
use crate::handler::{BoxFuture, DiagnosticSink, TracingSink};
use crate::schema::{build_schema_document, ServiceSchema};
use crate::service::{Service, ServiceHost};

/// Object-safe view of a hosted service.
pub trait DispatchService<C>: Send + Sync {
    /// Protocol identity of the service.
    fn descriptor(&self) -> ServiceDescriptor;

    /// Route a call to a method of this service.
    fn dispatch(&self, method_id: u32, conn: C, payload: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Describe the service and its methods.
    fn schema(&self) -> ServiceSchema;
}

impl<S: Service> DispatchService<S::Connection> for ServiceHost<S> {
    fn descriptor(&self) -> ServiceDescriptor {
        ServiceHost::descriptor(self)
    }

    fn dispatch(
        &self,
        method_id: u32,
        conn: S::Connection,
        payload: Bytes,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(ServiceHost::dispatch(self, method_id, conn, payload))
    }

    fn schema(&self) -> ServiceSchema {
        ServiceHost::schema(self)
    }
}

/// Routes calls to hosted services by service ID.
pub struct ServiceRouter<C> {
    /// Services by service ID.
    services: HashMap<u32, Arc<dyn DispatchService<C>>>,
    /// Service ID by server hash.
    by_server_hash: HashMap<u32, u32>,
    /// Receives unknown-service reports.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<C: Send + 'static> ServiceRouter<C> {
    /// Create an empty router that logs misses via `tracing`.
    pub fn new() -> Self {
        Self::with_diagnostics(Arc::new(TracingSink))
    }

    /// Create an empty router that reports misses to `sink`.
    pub fn with_diagnostics(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            services: HashMap::new(),
            by_server_hash: HashMap::new(),
            diagnostics: sink,
        }
    }

    /// Register a hosted service.
    ///
    /// # Errors
    ///
    /// Fails if another service already uses the same service ID or
    /// server hash. The router is left unchanged in that case.
    pub fn register<S>(&mut self, host: ServiceHost<S>) -> Result<()>
    where
        S: Service<Connection = C>,
    {
        self.register_shared(Arc::new(host))
    }

    /// Register a service that is already shared elsewhere.
    pub fn register_shared(&mut self, service: Arc<dyn DispatchService<C>>) -> Result<()> {
        let descriptor = service.descriptor();

        if self.services.contains_key(&descriptor.service_id) {
            return Err(ServiceError::DuplicateService(descriptor.service_id));
        }
        if self.by_server_hash.contains_key(&descriptor.server_hash) {
            return Err(ServiceError::DuplicateServerHash(descriptor.server_hash));
        }

        tracing::debug!(
            "Registered service {} (hash 0x{:08x})",
            descriptor.service_id,
            descriptor.server_hash
        );

        self.by_server_hash
            .insert(descriptor.server_hash, descriptor.service_id);
        self.services.insert(descriptor.service_id, service);
        Ok(())
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Get a service by service ID.
    pub fn get(&self, service_id: u32) -> Option<&Arc<dyn DispatchService<C>>> {
        self.services.get(&service_id)
    }

    /// Find the service a peer is binding to by its server hash.
    pub fn find_by_server_hash(&self, server_hash: u32) -> Option<&Arc<dyn DispatchService<C>>> {
        self.by_server_hash
            .get(&server_hash)
            .and_then(|id| self.services.get(id))
    }

    /// Route a decoded call.
    ///
    /// Unknown service IDs are reported and complete with `Ok(())`, the same
    /// way unknown method IDs are handled by the service itself.
    pub async fn route(
        &self,
        service_id: u32,
        method_id: u32,
        conn: C,
        payload: Bytes,
    ) -> Result<()> {
        let service = match self.services.get(&service_id) {
            Some(s) => s,
            None => {
                self.diagnostics.unknown_service(service_id, method_id);
                return Ok(());
            }
        };

        service.dispatch(method_id, conn, payload).await
    }

    /// Schemas of all registered services.
    pub fn schemas(&self) -> Vec<ServiceSchema> {
        let mut schemas: Vec<ServiceSchema> = self.services.values().map(|s| s.schema()).collect();
        schemas.sort_by_key(|s| s.descriptor.service_id);
        schemas
    }

    /// Versioned JSON document describing all registered services.
    pub fn schema_document(&self) -> Result<String> {
        build_schema_document(&self.schemas())
    }
}

impl<C: Send + 'static> Default for ServiceRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}
