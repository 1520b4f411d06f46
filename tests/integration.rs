//! Integration tests for servicewire.
//!
//! These tests drive services through the public API the way a transport
//! layer would: build once, share behind `Arc`, dispatch decoded calls.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use servicewire::codec::MsgPackCodec;
use servicewire::handler::{Diagnostic, MemorySink};
use servicewire::{
    service_hash, HandlerResult, RegistryBuilder, Service, ServiceDeclaration, ServiceDescriptor,
    ServiceError, ServiceHost, ServiceRouter,
};

/// Connection handle as a transport would pass it.
#[derive(Clone, Debug, PartialEq)]
struct Peer {
    id: u32,
}

/// Records every handler invocation.
#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<(u8, Peer, Bytes)>>,
}

impl CallLog {
    fn record(&self, method_id: u8, peer: Peer, payload: Bytes) {
        self.calls.lock().unwrap().push((method_id, peer, payload));
    }

    fn calls(&self) -> Vec<(u8, Peer, Bytes)> {
        self.calls.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct AuthService {
    log: CallLog,
}

impl AuthService {
    async fn logon(self: Arc<Self>, peer: Peer, payload: Bytes) -> HandlerResult {
        self.log.record(1, peer, payload);
        Ok(())
    }

    async fn select_game_account(self: Arc<Self>, peer: Peer, payload: Bytes) -> HandlerResult {
        self.log.record(5, peer, payload);
        Ok(())
    }

    async fn module_message(self: Arc<Self>, peer: Peer, payload: Bytes) -> HandlerResult {
        self.log.record(200, peer, payload);
        Ok(())
    }
}

impl Service for AuthService {
    type Connection = Peer;
    const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::named(
        0x01,
        "bnet.protocol.authentication.AuthenticationServer",
        0x7113_3B83,
    );

    fn methods(
        methods: RegistryBuilder<Self, Self::Connection>,
    ) -> RegistryBuilder<Self, Self::Connection> {
        methods
            .method(1, "logon", Self::logon)
            .method(5, "select_game_account", Self::select_game_account)
            .method(200, "module_message", Self::module_message)
    }
}

/// Service that declares method 3 twice.
struct BrokenService;

impl Service for BrokenService {
    type Connection = Peer;
    const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor::new(0x02, 0, 0);

    fn methods(
        methods: RegistryBuilder<Self, Self::Connection>,
    ) -> RegistryBuilder<Self, Self::Connection> {
        methods
            .method(3, "first", |_s: Arc<Self>, _p: Peer, _b: Bytes| async { Ok(()) })
            .method(3, "second", |_s: Arc<Self>, _p: Peer, _b: Bytes| async { Ok(()) })
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct JoinRequest {
    channel: String,
}

/// Service whose handlers fail.
struct ChannelService;

impl Service for ChannelService {
    type Connection = Peer;
    const DESCRIPTOR: ServiceDescriptor =
        ServiceDescriptor::named(0x03, "bnet.protocol.channel.Channel", 0);

    fn methods(
        methods: RegistryBuilder<Self, Self::Connection>,
    ) -> RegistryBuilder<Self, Self::Connection> {
        methods
            .method(1, "leave", |_s: Arc<Self>, _p: Peer, _b: Bytes| async {
                Err(ServiceError::handler("not a member"))
            })
            .typed_method(2, "join", |_s: Arc<Self>, _p: Peer, req: JoinRequest| async move {
                if req.channel.is_empty() {
                    return Err(ServiceError::handler("empty channel name"));
                }
                Ok(())
            })
    }
}

/// Registering handlers with IDs {1, 5, 200} yields exactly that key set.
#[test]
fn test_registration_completeness() {
    let host = ServiceHost::new(AuthService::default()).unwrap();
    assert_eq!(host.registry().method_ids(), vec![1, 5, 200]);
}

/// Dispatch invokes exactly the matching handler, once, with inputs unmodified.
#[tokio::test]
async fn test_dispatch_forwards_to_matching_handler() {
    let host = ServiceHost::new(AuthService::default()).unwrap();
    let payload = Bytes::from_static(b"\x0a\x05alice");

    host.dispatch(5, Peer { id: 77 }, payload.clone())
        .await
        .unwrap();

    assert_eq!(
        host.service().log.calls(),
        vec![(5, Peer { id: 77 }, payload)]
    );
}

/// Unregistered IDs produce no call, no error, and a diagnostic naming the ID and service.
#[tokio::test]
async fn test_unknown_method_is_tolerated() {
    let sink = Arc::new(MemorySink::new());
    let host = ServiceHost::with_diagnostics(AuthService::default(), sink.clone()).unwrap();

    let result = host.dispatch(999, Peer { id: 1 }, Bytes::new()).await;

    assert!(result.is_ok());
    assert!(host.service().log.calls().is_empty());

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    match &entries[0] {
        Diagnostic::UnknownMethod { service, method_id } => {
            assert_eq!(*method_id, 999);
            assert!(service.contains("AuthService"));
        }
        other => panic!("unexpected diagnostic: {:?}", other),
    }
    assert!(entries[0].to_string().contains("999"));
}

/// Two handlers tagged with the same ID fail construction.
#[test]
fn test_duplicate_method_id_fails_construction() {
    match ServiceHost::new(BrokenService) {
        Err(ServiceError::DuplicateMethod { service, method_id }) => {
            assert_eq!(method_id, 3);
            assert!(service.contains("BrokenService"));
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("duplicate method ID was accepted"),
    }
}

/// Declaring by hash and by name yields identical descriptors.
#[test]
fn test_descriptor_forms_equivalent() {
    let by_hash = ServiceDescriptor::new(9, service_hash("Foo"), 0x55);
    let by_name = ServiceDescriptor::named(9, "Foo", 0x55);
    assert_eq!(by_hash, by_name);

    let json = format!(
        r#"[{{ "serviceId": 9, "serverHash": {}, "clientHash": 85 }},
            {{ "serviceId": 9, "serviceName": "Foo", "clientHash": 85 }}]"#,
        service_hash("Foo")
    );
    let resolved = ServiceDeclaration::resolve_all_json(&json).unwrap();
    assert_eq!(resolved, vec![by_name, by_name]);
}

/// Handler failures reach the caller unchanged.
#[tokio::test]
async fn test_handler_error_propagates() {
    let host = ServiceHost::new(ChannelService).unwrap();

    let err = host
        .dispatch(1, Peer { id: 2 }, Bytes::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Handler error: not a member");

    let payload = Bytes::from(
        MsgPackCodec::encode(&JoinRequest {
            channel: String::new(),
        })
        .unwrap(),
    );
    let err = host.dispatch(2, Peer { id: 2 }, payload).await.unwrap_err();
    assert!(matches!(err, ServiceError::Handler(_)));

    let payload = Bytes::from(
        MsgPackCodec::encode(&JoinRequest {
            channel: "general".to_string(),
        })
        .unwrap(),
    );
    host.dispatch(2, Peer { id: 2 }, payload).await.unwrap();
}

/// Concurrent dispatches on one shared host all land on the right handler.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch() {
    let host = Arc::new(ServiceHost::new(AuthService::default()).unwrap());
    let ids = [1u8, 5, 200];

    let mut tasks = Vec::new();
    for n in 0..60u32 {
        let host = host.clone();
        let method_id = ids[(n % 3) as usize];
        tasks.push(tokio::spawn(async move {
            let payload = Bytes::from(n.to_be_bytes().to_vec());
            host.dispatch(method_id as u32, Peer { id: n }, payload)
                .await
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let calls = host.service().log.calls();
    assert_eq!(calls.len(), 60);
    for (method_id, peer, payload) in calls {
        assert_eq!(method_id, ids[(peer.id % 3) as usize]);
        assert_eq!(&payload[..], &peer.id.to_be_bytes()[..]);
    }
}

/// A router shared across tasks reaches every registered service.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_router_across_services() {
    let sink = Arc::new(MemorySink::new());
    let mut router = ServiceRouter::with_diagnostics(sink.clone());

    let auth = ServiceHost::new(AuthService::default()).unwrap();
    let auth_service = auth.service().clone();
    router.register(auth).unwrap();
    router.register(ServiceHost::new(ChannelService).unwrap()).unwrap();
    let router = Arc::new(router);

    let r = router.clone();
    tokio::spawn(async move { r.route(0x01, 1, Peer { id: 3 }, Bytes::new()).await })
        .await
        .unwrap()
        .unwrap();

    assert!(router
        .route(0x03, 1, Peer { id: 3 }, Bytes::new())
        .await
        .is_err());
    router
        .route(0x7F, 1, Peer { id: 3 }, Bytes::new())
        .await
        .unwrap();

    assert_eq!(auth_service.log.calls().len(), 1);
    assert_eq!(
        sink.entries(),
        vec![Diagnostic::UnknownService {
            service_id: 0x7F,
            method_id: 1
        }]
    );

    let bound = router
        .find_by_server_hash(service_hash(
            "bnet.protocol.authentication.AuthenticationServer",
        ))
        .unwrap();
    assert_eq!(bound.descriptor(), AuthService::DESCRIPTOR);
}
