use crate::domain::WorldFrame;
use crate::interface_adapters::protocol::{TickBroadcastDto, parse_intent};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::new_session_id;
use crate::use_cases::SessionEvent;

use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum NetError {
    // The world task is gone; no session can make progress.
    EventsClosed,
    FramesClosed,
}

/// Serializes each world frame exactly once and rebroadcasts the shared
/// bytes, so N sessions cost one JSON encode per tick instead of N.
pub async fn frame_serializer(
    mut frame_rx: broadcast::Receiver<WorldFrame>,
    frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    frame_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match frame_rx.recv().await {
            Ok(frame) => {
                let dto = TickBroadcastDto::from(&frame);
                let txt = match serde_json::to_string(&dto) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = %e, "failed to serialize tick frame");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Keep the latest bytes around for lag recovery.
                let _ = frame_latest_tx.send(bytes.clone());
                let _ = frame_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "frame serializer lagged; skipping to latest");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("frame channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

struct SessionCtx {
    session_id: String,
    event_tx: mpsc::Sender<SessionEvent>,
    frame_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    frame_latest_rx: watch::Receiver<Utf8Bytes>,
    max_messages: Option<u64>,

    msgs_in: u64,
    msgs_out: u64,
    parse_failures: u64,

    last_frame_lag_log: Instant,
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let session_id = new_session_id();

    // Subscribe before any await so no tick frame published during setup is
    // missed.
    let frame_bytes_rx = state.frame_bytes_tx.subscribe();
    let frame_latest_rx = state.frame_latest_tx.subscribe();

    // The session only becomes active once the one-time static snapshot has
    // been delivered.
    if let Err(e) = socket.send(Message::Text(state.static_bytes.clone())).await {
        info!(%session_id, error = %e, "client gone before static snapshot delivery");
        let _ = socket.close().await;
        return;
    }

    info!(%session_id, "session active");

    let mut ctx = SessionCtx {
        session_id,
        event_tx: state.event_tx.clone(),
        frame_bytes_rx,
        frame_latest_rx,
        max_messages: state.max_session_messages,
        msgs_in: 0,
        msgs_out: 0,
        parse_failures: 0,
        last_frame_lag_log: Instant::now()
            .checked_sub(LOG_THROTTLE)
            .unwrap_or_else(Instant::now),
    };

    let result = run_session_loop(&mut socket, &mut ctx).await;

    // Teardown is unconditional: the world learns about the disconnect and
    // the relay subscription is dropped no matter how the loop exited.
    disconnect_cleanup(&ctx).await;
    if let Err(e) = socket.close().await {
        debug!(session_id = %ctx.session_id, error = %e, "socket close error");
    }

    match result {
        Ok(()) => info!(session_id = %ctx.session_id, "session closed"),
        Err(e) => warn!(session_id = %ctx.session_id, error = ?e, "session closed with error"),
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn run_session_loop(socket: &mut WebSocket, ctx: &mut SessionCtx) -> Result<(), NetError> {
    // Split borrows so `tokio::select!` can hold them concurrently.
    let SessionCtx {
        session_id,
        event_tx,
        frame_bytes_rx,
        frame_latest_rx,
        max_messages,
        msgs_in,
        msgs_out,
        parse_failures,
        last_frame_lag_log,
    } = ctx;

    loop {
        let disconnect = tokio::select! {
            // Inbound message from this session's client.
            incoming = socket.recv() => {
                let control = handle_incoming(
                    session_id,
                    event_tx,
                    *max_messages,
                    msgs_in,
                    parse_failures,
                    incoming,
                )?;
                matches!(control, LoopControl::Disconnect)
            }

            // Outbound tick frame from the relay.
            frame = frame_bytes_rx.recv() => {
                match frame {
                    Ok(bytes) => {
                        let control = forward_frame(socket, session_id, bytes, msgs_out).await;
                        matches!(control, LoopControl::Disconnect)
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_frame_lag_log) {
                            warn!(%session_id, missed = n, "session lagged; resyncing with latest frame");
                        }
                        match resync(frame_bytes_rx, frame_latest_rx) {
                            Some(latest) => {
                                let control = forward_frame(socket, session_id, latest, msgs_out).await;
                                matches!(control, LoopControl::Disconnect)
                            }
                            None => false,
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(NetError::FramesClosed);
                    }
                }
            }
        };

        if disconnect {
            return Ok(());
        }
    }
}

fn handle_incoming(
    session_id: &str,
    event_tx: &mpsc::Sender<SessionEvent>,
    max_messages: Option<u64>,
    msgs_in: &mut u64,
    parse_failures: &mut u64,
    incoming: Option<Result<Message, axum::Error>>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(Message::Text(text))) => {
            *msgs_in += 1;

            match parse_intent(session_id, &text) {
                Ok(intent) => {
                    let event = SessionEvent::Intent {
                        session_id: session_id.to_string(),
                        intent,
                    };
                    match event_tx.try_send(event) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!(session_id, "event channel full; dropping intent");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            return Err(NetError::EventsClosed);
                        }
                    }
                }
                Err(e) => {
                    // Malformed payloads are dropped, never a reason to
                    // disconnect the session.
                    *parse_failures += 1;
                    warn!(error = %e, "dropping undecodable payload");
                }
            }

            if let Some(limit) = max_messages
                && *msgs_in >= limit
            {
                info!(session_id, limit, "inbound message limit reached");
                return Ok(LoopControl::Disconnect);
            }

            Ok(LoopControl::Continue)
        }
        Some(Ok(Message::Binary(_))) => {
            warn!(session_id, "binary frame not supported; disconnecting");
            Ok(LoopControl::Disconnect)
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(LoopControl::Continue),
        Some(Ok(Message::Close(_))) => Ok(LoopControl::Disconnect),
        Some(Err(e)) => {
            warn!(session_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(session_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

/// Recovers a lagged session: swaps the backlogged subscription for a fresh
/// one, so only frames published from now on are delivered, and returns the
/// newest frame to bridge the gap. Without the swap the old receiver would
/// replay up to a full ring buffer of stale frames.
fn resync(
    frame_bytes_rx: &mut broadcast::Receiver<Utf8Bytes>,
    frame_latest_rx: &watch::Receiver<Utf8Bytes>,
) -> Option<Utf8Bytes> {
    *frame_bytes_rx = frame_bytes_rx.resubscribe();
    let latest = frame_latest_rx.borrow().clone();
    (!latest.is_empty()).then_some(latest)
}

async fn forward_frame(
    socket: &mut WebSocket,
    session_id: &str,
    bytes: Utf8Bytes,
    msgs_out: &mut u64,
) -> LoopControl {
    match socket.send(Message::Text(bytes)).await {
        Ok(()) => {
            *msgs_out += 1;
            LoopControl::Continue
        }
        Err(e) => {
            // A failed write takes down this session only; other sessions
            // hold their own relay receivers and are unaffected.
            warn!(session_id, error = %e, "failed to forward tick frame");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &SessionCtx) {
    let event = SessionEvent::Disconnect {
        session_id: ctx.session_id.clone(),
    };
    if ctx.event_tx.send(event).await.is_err() {
        // World task already gone; nothing left to clean up there.
        warn!(session_id = %ctx.session_id, "world task unavailable during disconnect");
    }

    debug!(
        session_id = %ctx.session_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        parse_failures = ctx.parse_failures,
        "session stats"
    );
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}
