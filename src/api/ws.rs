// =============================================================================
// WebSocket Handler — crosshair stream
// =============================================================================
//
// Clients connect to `/api/v1/ws` and send pointer events:
//
//   {"time": "2024-01-02"}      hover over a date
//   {"time": 1704153600}        hover over an epoch instant
//   {"time": null}              pointer left the surface
//
// Each event is answered with one crosshair sample. Independently, every
// `push_interval_ms` the handler checks `state_version`; when the chart has
// changed since the last send it re-sends the sample for the time currently
// hovered, so legends follow live ticks without pointer movement.
//
// The handler also:
//   - Responds to Ping frames with Pong frames.
//   - Ignores binary frames and unparseable events.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::api::rest::CrosshairResponse;
use crate::app_state::AppState;
use crate::error::ChartResult;
use crate::market_data::{normalize_time, Granularity, RawTime};
use crate::types::TimeKey;

// =============================================================================
// Pointer events
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PointerEvent {
    #[serde(default)]
    pub time: Option<RawTime>,
}

/// Decode a pointer event frame into the hovered key.
///
/// Returns `Ok(None)` for "pointer left the surface".
pub fn parse_pointer_event(text: &str, granularity: Granularity) -> anyhow::Result<Option<TimeKey>> {
    let event: PointerEvent = serde_json::from_str(text)?;
    let key: ChartResult<Option<TimeKey>> = event
        .time
        .map(|raw| normalize_time(&raw, granularity))
        .transpose();
    Ok(key?)
}

// =============================================================================
// WebSocket upgrade handler
// =============================================================================

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

// =============================================================================
// Connection handler
// =============================================================================

/// Manages a single WebSocket connection lifecycle.
///
/// Runs two concurrent branches via `tokio::select!`:
///   1. **Push loop** — re-send the hovered sample when state_version moved.
///   2. **Recv loop** — answer pointer events, Ping/Pong and Close.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut hovered: Option<TimeKey> = None;
    let mut sequence: u64 = 0;

    if let Err(e) = send_sample(&mut sender, &state, hovered, &mut sequence).await {
        warn!(error = %e, "Failed to send initial crosshair sample");
        return;
    }
    let mut last_sent_version = state.current_state_version();

    let mut push_interval = interval(Duration::from_millis(state.config.push_interval_ms.max(1)));

    loop {
        tokio::select! {
            // ── Push loop: chart changed under the pointer ──────────────
            _ = push_interval.tick() => {
                let current_version = state.current_state_version();
                if current_version != last_sent_version {
                    match send_sample(&mut sender, &state, hovered, &mut sequence).await {
                        Ok(()) => {
                            last_sent_version = current_version;
                        }
                        Err(e) => {
                            debug!(error = %e, "WebSocket send failed — disconnecting");
                            break;
                        }
                    }
                }
            }

            // ── Recv loop: pointer events ───────────────────────────────
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match parse_pointer_event(&text, state.config.granularity) {
                            Ok(time) => {
                                hovered = time;
                                last_sent_version = state.current_state_version();
                                if let Err(e) = send_sample(&mut sender, &state, hovered, &mut sequence).await {
                                    debug!(error = %e, "WebSocket send failed — disconnecting");
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, msg = %text, "Unparseable pointer event ignored");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("WebSocket Ping received — sending Pong");
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "Failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("WebSocket Pong received");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!("WebSocket binary message ignored");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended (None)");
                        break;
                    }
                }
            }
        }
    }

    info!(sent = sequence, "WebSocket connection closed");
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve the crosshair at `time` and send it as one text frame.
async fn send_sample<S>(
    sender: &mut S,
    state: &Arc<AppState>,
    time: Option<TimeKey>,
    sequence: &mut u64,
) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    let response = CrosshairResponse::new(state.crosshair(time), state.config.crosshair_decimals);

    match serde_json::to_string(&response) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            *sequence += 1;
            debug!(seq = *sequence, hovering = time.is_some(), "Crosshair sample sent");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Failed to serialize crosshair sample");
            // Serialisation errors are not network errors; don't disconnect.
            Ok(())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_event_forms() {
        let g = Granularity::Daily;
        let date = parse_pointer_event(r#"{"time": "2024-01-02"}"#, g).unwrap();
        let epoch = parse_pointer_event(r#"{"time": 1704153600}"#, g).unwrap();
        let business = parse_pointer_event(r#"{"time": {"year": 2024, "month": 1, "day": 2}}"#, g).unwrap();
        assert!(date.is_some());
        assert_eq!(date, epoch);
        assert_eq!(date, business);
    }

    #[test]
    fn pointer_leaving_is_none() {
        let g = Granularity::Daily;
        assert_eq!(parse_pointer_event(r#"{"time": null}"#, g).unwrap(), None);
        assert_eq!(parse_pointer_event("{}", g).unwrap(), None);
    }

    #[test]
    fn bad_events_are_errors() {
        let g = Granularity::Daily;
        assert!(parse_pointer_event("hello", g).is_err());
        assert!(parse_pointer_event(r#"{"time": "2024-13-45"}"#, g).is_err());
    }
}
