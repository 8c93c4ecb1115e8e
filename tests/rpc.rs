//! gRPC tests: handler behavior and end-to-end calls on an in-process server

use bytes::Bytes;
use shardkv::engine::Alive;
use shardkv::proto::storage_client::StorageClient;
use shardkv::proto::storage_server::Storage as StorageRpc;
use shardkv::proto::{GetRequest, Ping, SetRequest};
use shardkv::rpc::ServerAdaptor;
use shardkv::{
    Config, Error, KvClient, Node, RequestContext, Storage, StorageService, StoreBackend,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::Code;

/// Engine whose data operations always panic
struct PanickingEngine;

impl Storage for PanickingEngine {
    fn heartbeat(&self) -> Alive {
        Alive {
            node_id: "panicky".to_string(),
            timestamp_ms: 0,
            uptime: Duration::ZERO,
        }
    }

    fn get(&self, _ctx: &RequestContext, _key: &[u8]) -> shardkv::Result<Bytes> {
        panic!("index corrupted");
    }

    fn set(&self, _ctx: &RequestContext, _key: Bytes, _value: Bytes) -> shardkv::Result<()> {
        panic!("index corrupted");
    }

    fn delete(&self, _ctx: &RequestContext, _key: &[u8]) -> shardkv::Result<()> {
        panic!("index corrupted");
    }
}

struct TestServer {
    endpoint: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<shardkv::Result<()>>,
}

impl TestServer {
    async fn stop(self) -> shardkv::Result<()> {
        let _ = self.shutdown.send(());
        self.handle.await.expect("server task panicked")
    }
}

async fn start_node() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let node = Node::new(Config {
        node_id: "e2e".to_string(),
        num_shards: 8,
        ..Default::default()
    })
    .unwrap();

    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(node.serve_with_listener(listener, async move {
        let _ = rx.await;
    }));
    TestServer {
        endpoint,
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn test_handler_converts_panic_to_internal() {
    let service = StorageService::new(Arc::new(PanickingEngine));

    let status = StorageRpc::get(
        &service,
        tonic::Request::new(GetRequest {
            key: Bytes::from_static(b"k"),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), "internal error");

    let status = StorageRpc::set(
        &service,
        tonic::Request::new(SetRequest {
            key: Bytes::from_static(b"k"),
            value: Bytes::from_static(b"v"),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::Internal);

    // The handler keeps serving after a fault
    let pong = StorageRpc::heartbeat(&service, tonic::Request::new(Ping {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(pong.node_id, "panicky");
}

#[tokio::test]
async fn test_handler_maps_domain_errors() {
    let engine = Arc::new(shardkv::StorageEngine::new(
        Arc::new(shardkv::ShardedStore::new()),
        "mapping",
    ));
    let service = StorageService::new(engine);

    let status = StorageRpc::get(
        &service,
        tonic::Request::new(GetRequest { key: Bytes::new() }),
    )
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let status = StorageRpc::get(
        &service,
        tonic::Request::new(GetRequest {
            key: Bytes::from_static(b"absent"),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let server = start_node().await;
    let mut client = KvClient::connect(server.endpoint.clone())
        .await
        .unwrap()
        .with_timeout(Duration::from_secs(5));

    let pong = client.heartbeat().await.unwrap();
    assert_eq!(pong.node_id, "e2e");

    client.set("user:1", "alice").await.unwrap();
    assert_eq!(client.get("user:1").await.unwrap(), Bytes::from_static(b"alice"));

    client.set("user:1", "bob").await.unwrap();
    assert_eq!(client.get("user:1").await.unwrap(), Bytes::from_static(b"bob"));

    client.delete("user:1").await.unwrap();
    assert!(matches!(client.get("user:1").await, Err(Error::NotFound)));
    assert!(matches!(client.delete("user:1").await, Err(Error::NotFound)));

    assert!(matches!(client.get("").await, Err(Error::InvalidKey(_))));
    assert!(matches!(client.set("", "v").await, Err(Error::InvalidKey(_))));
    assert!(matches!(client.delete("").await, Err(Error::InvalidKey(_))));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_expired_grpc_timeout_end_to_end() {
    let server = start_node().await;

    // Raw call: tonic's own timeout and the handler's deadline check race;
    // either way the write must not happen.
    let mut raw = StorageClient::connect(server.endpoint.clone()).await.unwrap();
    let mut request = tonic::Request::new(SetRequest {
        key: Bytes::from_static(b"late"),
        value: Bytes::from_static(b"stale"),
    });
    request
        .metadata_mut()
        .insert("grpc-timeout", "0n".parse().unwrap());
    let status = raw.set(request).await.unwrap_err();
    assert!(
        matches!(status.code(), Code::Cancelled | Code::DeadlineExceeded),
        "unexpected status {:?}",
        status
    );

    // The typed client reports it as a deadline miss
    let mut late = KvClient::connect(server.endpoint.clone())
        .await
        .unwrap()
        .with_timeout(Duration::ZERO);
    assert!(matches!(
        late.set("late", "stale").await,
        Err(Error::DeadlineExceeded)
    ));
    assert!(matches!(late.get("late").await, Err(Error::DeadlineExceeded)));

    let mut client = KvClient::connect(server.endpoint.clone()).await.unwrap();
    assert!(matches!(client.get("late").await, Err(Error::NotFound)));
    client.heartbeat().await.unwrap();

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_skiplist_backend_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let node = Node::new(Config {
        node_id: "ordered".to_string(),
        store_backend: StoreBackend::Skiplist,
        num_shards: 4,
        skiplist_max_level: 8,
        ..Default::default()
    })
    .unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(node.serve_with_listener(listener, async move {
        let _ = rx.await;
    }));

    let mut client = KvClient::connect(endpoint).await.unwrap();
    for i in 0..100 {
        client.set(format!("key_{}", i), format!("value_{}", i)).await.unwrap();
    }
    assert_eq!(client.get("key_42").await.unwrap(), Bytes::from_static(b"value_42"));
    client.delete("key_42").await.unwrap();
    assert!(matches!(client.get("key_42").await, Err(Error::NotFound)));

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_clients() {
    let server = start_node().await;

    let tasks: Vec<_> = (0..16)
        .map(|t| {
            let endpoint = server.endpoint.clone();
            tokio::spawn(async move {
                let mut client = KvClient::connect(endpoint).await.unwrap();
                for i in 0..20 {
                    let key = format!("c{}_k{}", t, i);
                    client.set(key.clone(), key.clone()).await.unwrap();
                    assert_eq!(client.get(key.clone()).await.unwrap(), key.as_bytes());
                }
                client.set("shared", format!("writer-{}", t)).await.unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let mut client = KvClient::connect(server.endpoint.clone()).await.unwrap();
    let shared = client.get("shared").await.unwrap();
    let shared = String::from_utf8(shared.to_vec()).unwrap();
    assert!(shared.starts_with("writer-"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_register_on_caller_built_server() {
    let adaptor = ServerAdaptor::new(StorageService::new(Arc::new(PanickingEngine)));
    let register = adaptor.register();

    let mut server = Server::builder();
    let router = register(&mut server);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(router.serve_with_incoming_shutdown(
        TcpListenerStream::new(listener),
        async move {
            let _ = rx.await;
        },
    ));

    let mut client = KvClient::connect(endpoint).await.unwrap();
    match client.get("k").await {
        Err(Error::Internal(msg)) => assert_eq!(msg, "internal error"),
        other => panic!("expected internal error, got {:?}", other),
    }

    // Same connection still answers after the fault
    let pong = client.heartbeat().await.unwrap();
    assert_eq!(pong.node_id, "panicky");

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}
