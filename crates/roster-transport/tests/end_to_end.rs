//! End-to-end tests against a real listener and WebSocket clients.

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use roster_core::{BrokerConfig, RecordStore};
use roster_router::ActionRouter;
use roster_session::SessionRegistry;
use roster_store::{CollectionService, storage::FileStore};
use roster_transport::Listener;
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Broker {
    addr: SocketAddr,
    registry: SessionRegistry,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Broker {
    async fn start(data_dir: &Path) -> Self {
        let config = BrokerConfig::default()
            .with_listen_addr("127.0.0.1:0".parse().unwrap())
            .with_data_dir(data_dir);

        let store: Arc<dyn RecordStore> = Arc::new(FileStore::new(&config.data_dir));
        let service = Arc::new(CollectionService::new(store));
        let router = Arc::new(ActionRouter::from_config(&service, &config).unwrap());
        let registry = SessionRegistry::new();

        let listener = Listener::bind(config.listen_addr, router, registry.clone())
            .await
            .unwrap();
        let addr = listener.local_addr();

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            listener
                .serve(async move {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            registry,
            shutdown: Some(tx),
            task,
        }
    }

    async fn connect(&self) -> Client {
        let (ws, _) = connect_async(format!("ws://{}/", self.addr)).await.unwrap();
        ws
    }

    async fn wait_for_sessions(&self, expected: usize) {
        tokio::time::timeout(TIMEOUT, async {
            while self.registry.len().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(TIMEOUT, self.task)
            .await
            .unwrap()
            .unwrap();
    }
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

async fn send_raw(ws: &mut Client, text: &str) {
    ws.send(Message::text(text.to_string())).await.unwrap();
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for response")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_add_then_get_scenario() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("students.json"),
        r#"[{"id": "1", "name": "A"}]"#,
    )
    .unwrap();
    let broker = Broker::start(dir.path()).await;
    let mut ws = broker.connect().await;

    send(&mut ws, json!({"action": "addStudent", "payload": {"id": "2", "name": "B"}})).await;
    assert_eq!(recv(&mut ws).await, json!({"action": "updateSuccess"}));

    send(&mut ws, json!({"action": "getStudents"})).await;
    assert_eq!(
        recv(&mut ws).await,
        json!({
            "action": "studentsData",
            "data": [{"id": "1", "name": "A"}, {"id": "2", "name": "B"}]
        })
    );

    let on_disk = std::fs::read_to_string(dir.path().join("students.json")).unwrap();
    let parsed: Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(parsed, json!([{"id": "1", "name": "A"}, {"id": "2", "name": "B"}]));

    ws.close(None).await.unwrap();
    broker.stop().await;
}

#[tokio::test]
async fn test_login_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let broker = Broker::start(dir.path()).await;
    let mut ws = broker.connect().await;

    for (username, password) in [("Admin", "password"), ("admin", "wrong"), ("", "")] {
        send(
            &mut ws,
            json!({"action": "login", "payload": {"username": username, "password": password}}),
        )
        .await;
        assert_eq!(recv(&mut ws).await, json!({"action": "loginFailed"}));
    }

    send(
        &mut ws,
        json!({"action": "login", "payload": {"username": "admin", "password": "password"}}),
    )
    .await;
    assert_eq!(recv(&mut ws).await, json!({"action": "loginSuccess"}));

    broker.stop().await;
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_session() {
    let dir = tempfile::tempdir().unwrap();
    let broker = Broker::start(dir.path()).await;
    let mut ws = broker.connect().await;

    send_raw(&mut ws, "this is not json").await;
    send_raw(&mut ws, r#"{"payload": {"id": "1"}}"#).await;
    send_raw(&mut ws, r#"{"action": "teleport"}"#).await;
    send(&mut ws, json!({"action": "deleteStudent"})).await;
    send(&mut ws, json!({"action": "getAdmins"})).await;

    assert_eq!(recv(&mut ws).await, json!({"action": "adminsData", "data": []}));
    broker.stop().await;
}

#[tokio::test]
async fn test_corrupt_store_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("teachers.json"), "[{\"id\": ").unwrap();
    let broker = Broker::start(dir.path()).await;
    let mut ws = broker.connect().await;

    send(&mut ws, json!({"action": "getTeachers"})).await;
    assert_eq!(recv(&mut ws).await, json!({"action": "teachersData", "data": []}));

    broker.stop().await;
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("admins.json"),
        r#"[{"id": "1"}, {"id": 7}, {"id": "1"}]"#,
    )
    .unwrap();
    let broker = Broker::start(dir.path()).await;
    let mut ws = broker.connect().await;

    for id in [json!("1"), json!("7"), json!("missing")] {
        send(&mut ws, json!({"action": "deleteAdmin", "payload": {"id": id}})).await;
        assert_eq!(recv(&mut ws).await, json!({"action": "updateSuccess"}));
    }

    send(&mut ws, json!({"action": "getAdmins"})).await;
    assert_eq!(recv(&mut ws).await, json!({"action": "adminsData", "data": []}));

    broker.stop().await;
}

#[tokio::test]
async fn test_concurrent_updates_from_two_sessions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("students.json"),
        r#"[{"id": "1", "name": "A"}, {"id": "2", "name": "B"}]"#,
    )
    .unwrap();
    let broker = Broker::start(dir.path()).await;
    let mut first = broker.connect().await;
    let mut second = broker.connect().await;

    let update = |id: &str, name: &str| {
        json!({"action": "updateStudent", "payload": {"id": id, "name": name}})
    };
    tokio::join!(
        send(&mut first, update("1", "A2")),
        send(&mut second, update("2", "B2")),
    );
    let (a, b) = tokio::join!(recv(&mut first), recv(&mut second));
    assert_eq!(a, json!({"action": "updateSuccess"}));
    assert_eq!(b, json!({"action": "updateSuccess"}));

    send(&mut first, json!({"action": "getStudents"})).await;
    assert_eq!(
        recv(&mut first).await,
        json!({
            "action": "studentsData",
            "data": [{"id": "1", "name": "A2"}, {"id": "2", "name": "B2"}]
        })
    );

    broker.stop().await;
}

#[tokio::test]
async fn test_registry_tracks_connections() {
    let dir = tempfile::tempdir().unwrap();
    let broker = Broker::start(dir.path()).await;

    let mut first = broker.connect().await;
    let second = broker.connect().await;
    broker.wait_for_sessions(2).await;

    first.close(None).await.unwrap();
    broker.wait_for_sessions(1).await;

    drop(second);
    broker.wait_for_sessions(0).await;

    broker.stop().await;
}

#[tokio::test]
async fn test_ws_path_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let broker = Broker::start(dir.path()).await;
    let (mut ws, _) = connect_async(format!("ws://{}/ws", broker.addr)).await.unwrap();

    send(&mut ws, json!({"action": "getStudents"})).await;
    assert_eq!(recv(&mut ws).await, json!({"action": "studentsData", "data": []}));

    broker.stop().await;
}
