// One-time server bootstrap shared by every test in a binary.

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

static SERVER_ADDR: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

/// Boots the server once on an ephemeral port and returns its host:port.
/// The server thread owns its own runtime so it outlives each
/// `#[tokio::test]` runtime; all tests in the binary share one world.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_from_thread = Arc::clone(&published);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_from_thread.set(addr.to_string());
                world_server::run(listener).await.expect("server failed");
            });
        });

        // Wait for the thread to publish the address it actually bound.
        let addr = loop {
            if let Some(addr) = published.get() {
                break addr.clone();
            }
            std::thread::sleep(Duration::from_millis(10));
        };
        let _ = SERVER_ADDR.set(addr.clone());

        // Then wait until the socket accepts connections.
        for _ in 0..100 {
            if std::net::TcpStream::connect(addr.as_str()).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("server did not become ready in time");
    });

    SERVER_ADDR
        .get()
        .expect("server addr should be initialized")
        .as_str()
}
