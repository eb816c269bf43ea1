// The per-session inbound message cap: reaching it tears the session down
// through the normal cleanup path, so its player leaves the broadcast while
// other sessions stay served.
//
// This binary boots its own server so the cap can be set explicitly instead
// of coming from the environment.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use world_server::frameworks::server::{build_state, serve};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const MESSAGE_CAP: u64 = 4;

static SERVER_ADDR: OnceLock<String> = OnceLock::new();

/// Boots one server with the inbound message cap enabled, shared by every
/// test in this binary.
fn ensure_capped_server() -> &'static str {
    SERVER_ADDR
        .get_or_init(|| {
            let published = Arc::new(OnceLock::<String>::new());
            let published_from_thread = Arc::clone(&published);
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Runtime::new().expect("test runtime");
                runtime.block_on(async move {
                    let state = build_state(Some(MESSAGE_CAP)).expect("state builds");
                    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                        .await
                        .expect("bind ephemeral test port");
                    let addr = listener.local_addr().expect("get local addr");
                    let _ = published_from_thread.set(addr.to_string());
                    serve(listener, state).await.expect("server failed");
                });
            });

            let addr = loop {
                if let Some(addr) = published.get() {
                    break addr.clone();
                }
                std::thread::sleep(Duration::from_millis(10));
            };
            for _ in 0..100 {
                if std::net::TcpStream::connect(addr.as_str()).is_ok() {
                    return addr;
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            panic!("server did not become ready in time");
        })
        .as_str()
}

async fn connect() -> WsClient {
    let addr = ensure_capped_server();
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect");
    ws
}

async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended unexpectedly")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("server frames are json");
        }
    }
}

async fn send_text(ws: &mut WsClient, text: String) {
    ws.send(Message::Text(text.into())).await.expect("send");
}

async fn send_init(ws: &mut WsClient, name: &str) {
    send_text(
        ws,
        json!({
            "eventkind": "init",
            "name": name,
            "avatar": "/assets/adventurer.png",
        })
        .to_string(),
    )
    .await;
}

/// Reads tick frames until the named player shows up.
async fn wait_for_player(ws: &mut WsClient, name: &str) {
    for _ in 0..150 {
        let frame = next_json(ws).await;
        let Some(players) = frame.get("players").and_then(Value::as_object) else {
            continue;
        };
        if players.values().any(|p| p["name"] == name) {
            return;
        }
    }
    panic!("player {name} never appeared in broadcasts");
}

#[tokio::test]
async fn reaching_the_cap_closes_the_session_and_removes_the_player() {
    let mut watcher = connect().await;
    next_json(&mut watcher).await; // static snapshot
    send_init(&mut watcher, "observer").await;

    let mut capped = connect().await;
    next_json(&mut capped).await;
    send_init(&mut capped, "capped").await;
    wait_for_player(&mut watcher, "capped").await;

    // Messages 2..=MESSAGE_CAP; the last one trips the limit.
    for _ in 1..MESSAGE_CAP {
        send_text(
            &mut capped,
            json!({"eventkind": "keyup", "key": "w"}).to_string(),
        )
        .await;
    }

    // The server ends the capped session.
    let mut closed = false;
    for _ in 0..600 {
        match timeout(Duration::from_secs(5), capped.next())
            .await
            .expect("timed out waiting for the session to close")
        {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {
                closed = true;
                break;
            }
            Some(Ok(_)) => {}
        }
    }
    assert!(
        closed,
        "session must end after {MESSAGE_CAP} inbound messages"
    );

    // The capped player leaves the broadcast; the watcher stays served.
    for _ in 0..600 {
        let frame = next_json(&mut watcher).await;
        let Some(players) = frame.get("players").and_then(Value::as_object) else {
            continue;
        };
        let capped_gone = !players.values().any(|p| p["name"] == "capped");
        if capped_gone {
            assert!(
                players.values().any(|p| p["name"] == "observer"),
                "only the capped player is removed"
            );
            return;
        }
    }
    panic!("capped player was never removed from broadcasts");
}
