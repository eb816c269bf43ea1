use crate::domain::{GameState, WorldFrame};
use crate::use_cases::SessionEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::info;

/// The single owner of the canonical world.
///
/// Drives the simulation at a fixed rate regardless of how many sessions are
/// connected or how bursty their input is. Session events drain in arrival
/// order before each advance, so intents from one session apply FIFO and are
/// reflected in the next broadcast frame. `interval` schedules against
/// absolute deadlines, so the cadence does not drift over long runtimes.
pub async fn world_task(
    mut state: GameState,
    mut event_rx: mpsc::Receiver<SessionEvent>,
    frame_tx: broadcast::Sender<WorldFrame>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = interval.tick() => {}
        }

        while let Ok(event) = event_rx.try_recv() {
            match event {
                SessionEvent::Intent { session_id, intent } => {
                    state.handle_intent(&session_id, intent);
                }
                SessionEvent::Disconnect { session_id } => {
                    state.handle_disconnect(&session_id);
                }
            }
        }

        let frame = state.tick();
        // Send only fails when no session is subscribed; that is idle, not
        // an error, and must never stop the scheduler.
        let _ = frame_tx.send(frame);
    }

    info!("world task stopped");
}
