// Framework bootstrap for the world server runtime.

use crate::domain::map::{DEFAULT_MAP, load_grid};
use crate::domain::{GameState, WorldFrame};
use crate::frameworks::config;
use crate::interface_adapters::net::{frame_serializer, ws_handler};
use crate::interface_adapters::protocol::StaticSnapshotDto;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{SessionEvent, game::world_task};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Notify, broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let state = build_state(config::max_session_messages())?;
    serve(listener, state).await
}

/// Serves an already-built world on the listener.
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> Result<()> {
    let address = listener.local_addr()?;

    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

/// Builds one explicitly owned world: loads the map (fatal on failure),
/// wires the channels, and spawns the world task and frame serializer.
/// Must be called inside a tokio runtime.
pub fn build_state(max_session_messages: Option<u64>) -> Result<Arc<AppState>> {
    let map_source = match config::map_path() {
        Some(path) => std::fs::read_to_string(&path).inspect_err(|e| {
            tracing::error!(%path, error = %e, "failed to read map file");
        })?,
        None => DEFAULT_MAP.to_string(),
    };

    // A broken map is a configuration error, not something to limp past.
    let (static_entities, dynamic_entities) =
        load_grid(&map_source).map_err(std::io::Error::other)?;
    tracing::info!(
        static_entities = static_entities.len(),
        dynamic_entities = dynamic_entities.len(),
        "map loaded"
    );

    let world = GameState::new(static_entities, dynamic_entities);

    // Static geometry never changes after load, so its snapshot is
    // serialized exactly once here and reused for every connect.
    let static_bytes = serde_json::to_string(&StaticSnapshotDto::from(&world.static_snapshot()))
        .map(Utf8Bytes::from)
        .map_err(std::io::Error::other)?;

    // Channel wiring for the world loop.
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(config::EVENT_CHANNEL_CAPACITY);
    let (frame_tx, _frame_rx) = broadcast::channel::<WorldFrame>(config::FRAME_BROADCAST_CAPACITY);
    let (frame_bytes_tx, _frame_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::FRAME_BROADCAST_CAPACITY);
    let (frame_latest_tx, _frame_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

    // The bootstrap runs the world for the life of the process; the stop
    // handle is for callers that drive `world_task` directly.
    let shutdown = Arc::new(Notify::new());

    tokio::spawn(frame_serializer(
        frame_tx.subscribe(),
        frame_bytes_tx.clone(),
        frame_latest_tx.clone(),
    ));

    tokio::spawn(world_task(
        world,
        event_rx,
        frame_tx,
        config::TICK_INTERVAL,
        shutdown,
    ));

    Ok(Arc::new(AppState {
        event_tx,
        frame_bytes_tx,
        frame_latest_tx,
        static_bytes,
        max_session_messages,
    }))
}
