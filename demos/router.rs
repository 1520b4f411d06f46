//! Router example - hosting two services and routing decoded calls.
//!
//! This example demonstrates:
//! - Declaring services by name and by precomputed hash
//! - Raw and MsgPack-typed handlers
//! - Routing `(service ID, method ID, payload)` the way a transport would
//! - Unknown IDs being logged instead of failing the call
//!
//! Run with `RUST_LOG=debug cargo run --example router` to see registry
//! build logs as well as the unknown-ID warnings.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use servicewire::codec::MsgPackCodec;
use servicewire::{
    HandlerResult, RegistryBuilder, Service, ServiceDescriptor, ServiceError, ServiceHost,
    ServiceRouter,
};
use tracing_subscriber::EnvFilter;

/// Connection handle: just the peer's session number here.
type Session = u32;

/// Authentication service, declared by name.
#[derive(Default)]
struct Auth {
    logons: AtomicU32,
}

#[derive(Deserialize, Debug)]
struct LogonRequest {
    account: String,
}

impl Auth {
    async fn logon(self: Arc<Self>, session: Session, req: LogonRequest) -> HandlerResult {
        if req.account.is_empty() {
            return Err(ServiceError::handler("empty account name"));
        }
        let n = self.logons.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("session {} logged on as {} (logon #{})", session, req.account, n);
        Ok(())
    }
}

impl Service for Auth {
    type Connection = Session;
    const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::named(
        0x01,
        "bnet.protocol.authentication.AuthenticationServer",
        0x7113_3B83,
    );

    fn methods(
        methods: RegistryBuilder<Self, Self::Connection>,
    ) -> RegistryBuilder<Self, Self::Connection> {
        methods.typed_method(1, "logon", Self::logon)
    }
}

/// Keep-alive service, declared with a precomputed hash.
struct ConnectionService;

impl Service for ConnectionService {
    type Connection = Session;
    const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::new(0x00, 0x6544_6991, 0);

    fn methods(
        methods: RegistryBuilder<Self, Self::Connection>,
    ) -> RegistryBuilder<Self, Self::Connection> {
        methods.method(
            5,
            "keep_alive",
            |_svc: Arc<Self>, session: Session, _payload: Bytes| async move {
                tracing::info!("keep-alive from session {}", session);
                Ok(())
            },
        )
    }
}

#[derive(serde::Serialize)]
struct LogonPayload<'a> {
    account: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut router = ServiceRouter::new();
    router.register(ServiceHost::new(Auth::default())?)?;
    router.register(ServiceHost::new(ConnectionService)?)?;
    let router = Arc::new(router);

    println!("{}", router.schema_document()?);

    let logon = Bytes::from(MsgPackCodec::encode(&LogonPayload { account: "alice" })?);
    router.route(0x01, 1, 7, logon).await?;
    router.route(0x00, 5, 7, Bytes::new()).await?;

    // Unknown method and unknown service: logged, not raised.
    router.route(0x01, 0x42, 7, Bytes::new()).await?;
    router.route(0x30, 1, 7, Bytes::new()).await?;

    // Handler failures reach the caller.
    let bad = Bytes::from(MsgPackCodec::encode(&LogonPayload { account: "" })?);
    if let Err(e) = router.route(0x01, 1, 8, bad).await {
        println!("logon rejected: {}", e);
    }

    Ok(())
}
