//! Method registry for dispatching calls by method ID.
//!
//! A [`RegistryBuilder`] collects `(method ID, handler)` pairs, then
//! [`RegistryBuilder::build`] freezes them into a [`MethodRegistry`].
//! Building fails if two handlers share a method ID. After that the
//! registry is read-only and can be shared between connections without
//! locking.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use servicewire::handler::RegistryBuilder;
//!
//! struct Echo;
//!
//! let registry = RegistryBuilder::<Echo, u64>::new()
//!     .method(1, "echo", |_svc: Arc<Echo>, _conn: u64, _payload: Bytes| async { Ok(()) })
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.contains(1));
//! ```

use std::any::type_name;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::diagnostics::{DiagnosticSink, TracingSink};
use crate::codec::MsgPackCodec;
use crate::descriptor::MethodDescriptor;
use crate::error::{Result, ServiceError};

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A callable registered under a method ID.
///
/// `S` is the service the handler belongs to, `C` the connection handle
/// the transport passes in.
pub trait Handler<S, C>: Send + Sync + 'static {
    /// Handle a call with the raw payload bytes.
    fn call(&self, service: Arc<S>, conn: C, payload: Bytes) -> BoxFuture<'static, HandlerResult>;
}

/// Handler that receives the payload untouched.
pub struct RawHandler<F, Fut> {
    handler: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> RawHandler<F, Fut> {
    /// Wrap a function taking `(service, connection, payload)`.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<S, C, F, Fut> Handler<S, C> for RawHandler<F, Fut>
where
    F: Fn(Arc<S>, C, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, service: Arc<S>, conn: C, payload: Bytes) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(service, conn, payload))
    }
}

/// Wrapper that decodes a MsgPack payload before calling the handler.
///
/// A payload that fails to decode is reported as the handler's own
/// failure and the wrapped function is not called.
pub struct TypedHandler<F, T, Fut> {
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, Fut> TypedHandler<F, T, Fut> {
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<S, C, F, T, Fut> Handler<S, C> for TypedHandler<F, T, Fut>
where
    F: Fn(Arc<S>, C, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, service: Arc<S>, conn: C, payload: Bytes) -> BoxFuture<'static, HandlerResult> {
        let parsed: T = match MsgPackCodec::decode(&payload) {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin((self.handler)(service, conn, parsed))
    }
}

/// Entry for a registered method.
struct MethodEntry<S, C> {
    /// Human-readable method name, used in schemas and logs.
    name: &'static str,
    /// The handler function.
    handler: Box<dyn Handler<S, C>>,
}

/// Collects handlers for one service before the registry is frozen.
pub struct RegistryBuilder<S, C> {
    entries: Vec<(MethodDescriptor, MethodEntry<S, C>)>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl<S, C> RegistryBuilder<S, C>
where
    S: Send + Sync + 'static,
    C: Send + 'static,
{
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            diagnostics: None,
        }
    }

    /// Register a handler that receives the raw payload.
    pub fn method<F, Fut>(self, method_id: u8, name: &'static str, handler: F) -> Self
    where
        F: Fn(Arc<S>, C, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler(method_id, name, RawHandler::new(handler))
    }

    /// Register a handler whose payload is decoded from MsgPack first.
    pub fn typed_method<F, T, Fut>(self, method_id: u8, name: &'static str, handler: F) -> Self
    where
        F: Fn(Arc<S>, C, T) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler(method_id, name, TypedHandler::new(handler))
    }

    /// Register any [`Handler`] implementation.
    pub fn handler<H>(mut self, method_id: u8, name: &'static str, handler: H) -> Self
    where
        H: Handler<S, C>,
    {
        self.entries.push((
            MethodDescriptor::new(method_id),
            MethodEntry {
                name,
                handler: Box::new(handler),
            },
        ));
        self
    }

    /// Route unknown-method diagnostics to `sink` instead of `tracing`.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DuplicateMethod`] for the first method ID
    /// registered more than once. No handler is silently replaced.
    pub fn build(self) -> Result<MethodRegistry<S, C>> {
        let service_name = type_name::<S>();
        let mut methods = HashMap::with_capacity(self.entries.len());

        for (descriptor, entry) in self.entries {
            match methods.entry(descriptor.method_id) {
                Entry::Occupied(_) => {
                    return Err(ServiceError::DuplicateMethod {
                        service: service_name,
                        method_id: descriptor.method_id,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }

        tracing::debug!("Built method registry for {} ({} methods)", service_name, methods.len());

        Ok(MethodRegistry {
            service_name,
            methods,
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Arc::new(TracingSink)),
        })
    }
}

impl<S, C> Default for RegistryBuilder<S, C>
where
    S: Send + Sync + 'static,
    C: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable mapping from method ID to handler for one service.
pub struct MethodRegistry<S, C> {
    /// Type name of the owning service.
    service_name: &'static str,
    /// Handlers by method ID.
    methods: HashMap<u8, MethodEntry<S, C>>,
    /// Receives unknown-method reports.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<S, C> MethodRegistry<S, C>
where
    S: Send + Sync + 'static,
    C: Send + 'static,
{
    /// Type name of the service this registry belongs to.
    pub fn service_name(&self) -> &'static str {
        self.service_name
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// True if no methods are registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Check whether a method ID has a handler.
    pub fn contains(&self, method_id: u8) -> bool {
        self.methods.contains_key(&method_id)
    }

    /// Registered method IDs in ascending order.
    pub fn method_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.methods.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get the name a method was registered with.
    pub fn method_name(&self, method_id: u8) -> Option<&'static str> {
        self.methods.get(&method_id).map(|e| e.name)
    }

    /// Registered methods as `(descriptor, name)` pairs, unordered.
    pub fn methods(&self) -> impl Iterator<Item = (MethodDescriptor, &'static str)> + '_ {
        self.methods
            .iter()
            .map(|(&id, e)| (MethodDescriptor::new(id), e.name))
    }

    /// Get a handler by wire method ID.
    ///
    /// IDs that do not fit in a byte can never be registered and always miss.
    pub fn get_handler(&self, method_id: u32) -> Option<&dyn Handler<S, C>> {
        u8::try_from(method_id)
            .ok()
            .and_then(|id| self.methods.get(&id))
            .map(|e| e.handler.as_ref())
    }

    /// Dispatch a call to the handler registered under `method_id`.
    ///
    /// An unknown ID is reported to the diagnostic sink and returns `Ok(())`
    /// without touching the connection. A known ID runs its handler to
    /// completion and returns the handler's result unchanged.
    pub async fn dispatch(
        &self,
        service: &Arc<S>,
        method_id: u32,
        conn: C,
        payload: Bytes,
    ) -> Result<()> {
        let handler = match self.get_handler(method_id) {
            Some(h) => h,
            None => {
                self.diagnostics.unknown_method(self.service_name, method_id);
                return Ok(());
            }
        };

        handler.call(Arc::clone(service), conn, payload).await
    }
}
