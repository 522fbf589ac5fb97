//! `WebSocket` session handler for collaborative drawing.
//!
//! Clients connect to `GET /` (or `GET /ws`) and send one JSON shape per
//! message. Every message runs the same pipeline:
//!
//! ```text
//! parse --> validate --> store --> broadcast to every other open peer
//!   |           |           |
//!   +-----------+-----------+--> error reply to the sender only
//! ```
//!
//! A shape is broadcast only after the store has accepted it, so no peer
//! ever sees a shape that is missing from the history. The broadcast
//! forwards the sender's frame verbatim rather than re-serializing it.
//!
//! Messages from one connection are handled strictly in arrival order:
//! the read loop awaits each message's pipeline before reading the next.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use canvas_types::{ConnectionId, Shape, ShapeError};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::registry::ConnectionState;
use crate::state::AppState;

/// Error reply for payloads that are not valid shapes.
pub const INVALID_SHAPE_DATA: &str = "Invalid shape data";

/// Error reply for shapes the store failed to persist.
pub const SERVER_ERROR: &str = "Server error";

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The shape was stored and queued for `delivered` peers.
    Broadcast {
        /// Number of peers the frame was queued for.
        delivered: usize,
    },
    /// The payload was malformed or not a valid shape.
    Rejected,
    /// The store failed; nothing was broadcast.
    StoreFailed,
    /// Not a data frame.
    Ignored,
}

/// Upgrade an HTTP request to a `WebSocket` drawing session.
///
/// # Route
///
/// `GET /`, `GET /ws`
pub async fn ws_canvas(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Run one connection from registration to unregistration.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (id, mut outbound) = state.registry.register().await;
    let connections = state.registry.len().await;
    info!(connection_id = %id, connections, "New WebSocket connection established");

    let (mut sink, mut stream) = socket.split();

    // Writer: drains the outbound queue into the socket until the
    // registry entry is dropped or the transport fails.
    let registry = state.registry.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if let Err(e) = sink.send(message).await {
                debug!(connection_id = %id, error = %e, "WebSocket send failed");
                registry.set_state(id, ConnectionState::Closed).await;
                break;
            }
        }
        if let Err(e) = sink.close().await {
            debug!(connection_id = %id, error = %e, "WebSocket close failed");
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => {
                state.registry.set_state(id, ConnectionState::Closing).await;
                break;
            }
            Ok(Message::Ping(data)) => {
                if let Err(e) = state.registry.send_to(id, Message::Pong(data)).await {
                    debug!(connection_id = %id, error = %e, "Pong not queued");
                }
            }
            Ok(Message::Pong(_)) => {}
            Ok(message) => {
                process_frame(&state, id, message).await;
            }
            Err(e) => {
                // The transport decides whether the stream ends after this.
                warn!(connection_id = %id, error = %e, "WebSocket error");
            }
        }
    }

    state.registry.unregister(id).await;
    if let Err(e) = writer.await {
        debug!(connection_id = %id, error = %e, "WebSocket writer task failed");
    }

    let connections = state.registry.len().await;
    info!(connection_id = %id, connections, "WebSocket connection closed");
}

/// Run the parse, validate, store, broadcast pipeline for one frame.
///
/// Text and binary frames are both accepted as JSON; the broadcast reuses
/// the original frame. Error replies go to `sender` only.
pub async fn process_frame(state: &AppState, sender: ConnectionId, frame: Message) -> FrameOutcome {
    let parsed = match &frame {
        Message::Text(text) => Shape::parse(text.as_str().as_bytes()),
        Message::Binary(bytes) => Shape::parse(bytes),
        _ => return FrameOutcome::Ignored,
    };

    let shape = match parsed {
        Ok(shape) => shape,
        Err(e) => {
            match &e {
                ShapeError::Parse(_) => {
                    debug!(connection_id = %sender, error = %e, "Malformed shape payload");
                }
                _ => debug!(connection_id = %sender, error = %e, "Shape failed validation"),
            }
            reply_error(state, sender, INVALID_SHAPE_DATA).await;
            return FrameOutcome::Rejected;
        }
    };

    let record = match state.store.store(&shape).await {
        Ok(record) => record,
        Err(e) => {
            error!(connection_id = %sender, kind = %shape.kind(), error = %e, "Error persisting shape");
            reply_error(state, sender, SERVER_ERROR).await;
            return FrameOutcome::StoreFailed;
        }
    };

    let delivered = state.registry.broadcast_except(sender, &frame).await;
    debug!(
        connection_id = %sender,
        shape_id = record.id,
        kind = %shape.kind(),
        delivered,
        "Shape broadcast"
    );
    FrameOutcome::Broadcast { delivered }
}

/// Build the `{"error": ...}` frame sent back to a sender.
pub fn error_frame(message: &str) -> Message {
    Message::Text(serde_json::json!({ "error": message }).to_string().into())
}

async fn reply_error(state: &AppState, sender: ConnectionId, message: &str) {
    if let Err(e) = state.registry.send_to(sender, error_frame(message)).await {
        debug!(connection_id = %sender, error = %e, "Error reply not delivered");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use canvas_db::MemoryShapeStore;
    use tokio::sync::mpsc::Receiver;

    use super::*;

    const RECTANGLE: &str =
        r##"{"kind":"rectangle","x":10,"y":20,"width":30,"height":40,"color":"#ff0000"}"##;
    const CIRCLE_WITHOUT_RADIUS: &str = r#"{"kind":"circle","x":1,"y":2,"color":"blue"}"#;

    fn text(s: &str) -> Message {
        Message::Text(s.to_owned().into())
    }

    fn setup() -> (AppState, MemoryShapeStore) {
        let memory = MemoryShapeStore::new();
        (AppState::new(memory.clone()), memory)
    }

    async fn connect(
        state: &AppState,
        n: usize,
    ) -> Vec<(ConnectionId, Receiver<Message>)> {
        let mut conns = Vec::with_capacity(n);
        for _ in 0..n {
            conns.push(state.registry.register().await);
        }
        conns
    }

    #[tokio::test]
    async fn valid_shape_reaches_every_peer_but_sender() {
        let (state, memory) = setup();
        let mut conns = connect(&state, 4).await;
        let sender = conns[0].0;

        let outcome = process_frame(&state, sender, text(RECTANGLE)).await;
        assert_eq!(outcome, FrameOutcome::Broadcast { delivered: 3 });

        assert!(conns[0].1.try_recv().is_err());
        for (_, rx) in conns.iter_mut().skip(1) {
            assert_eq!(rx.try_recv().unwrap(), text(RECTANGLE));
            assert!(rx.try_recv().is_err());
        }
        assert_eq!(memory.len().await, 1);
    }

    #[tokio::test]
    async fn broadcast_is_byte_for_byte() {
        let (state, _memory) = setup();
        let mut conns = connect(&state, 2).await;
        let raw = r#"{ "color": "red",  "kind": "circle", "radius": 5, "x": 1, "y": 2, "extra": [1,2] }"#;

        process_frame(&state, conns[0].0, text(raw)).await;
        let Message::Text(received) = conns[1].1.try_recv().unwrap() else {
            panic!("expected text frame");
        };
        assert_eq!(received.as_str(), raw);
    }

    #[tokio::test]
    async fn binary_frames_are_forwarded_as_binary() {
        let (state, _memory) = setup();
        let mut conns = connect(&state, 2).await;
        let frame = Message::Binary(RECTANGLE.as_bytes().to_vec().into());

        let outcome = process_frame(&state, conns[0].0, frame.clone()).await;
        assert_eq!(outcome, FrameOutcome::Broadcast { delivered: 1 });
        assert_eq!(conns[1].1.try_recv().unwrap(), frame);
    }

    #[tokio::test]
    async fn invalid_shape_is_rejected_to_sender_only() {
        let (state, memory) = setup();
        let mut conns = connect(&state, 2).await;

        let outcome = process_frame(&state, conns[0].0, text(CIRCLE_WITHOUT_RADIUS)).await;
        assert_eq!(outcome, FrameOutcome::Rejected);

        assert_eq!(conns[0].1.try_recv().unwrap(), error_frame(INVALID_SHAPE_DATA));
        assert!(conns[1].1.try_recv().is_err());
        assert!(memory.is_empty().await);
    }

    #[tokio::test]
    async fn malformed_json_gets_the_same_reply() {
        let (state, memory) = setup();
        let mut conns = connect(&state, 2).await;

        let outcome = process_frame(&state, conns[0].0, text("{\"kind\": rect")).await;
        assert_eq!(outcome, FrameOutcome::Rejected);

        let Message::Text(reply) = conns[0].1.try_recv().unwrap() else {
            panic!("expected text frame");
        };
        let body: serde_json::Value = serde_json::from_str(reply.as_str()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Invalid shape data"}));
        assert!(conns[1].1.try_recv().is_err());
        assert!(memory.is_empty().await);
    }

    #[tokio::test]
    async fn store_failure_means_no_broadcast() {
        let (state, memory) = setup();
        let mut conns = connect(&state, 3).await;
        memory.set_available(false);

        let outcome = process_frame(&state, conns[0].0, text(RECTANGLE)).await;
        assert_eq!(outcome, FrameOutcome::StoreFailed);

        assert_eq!(conns[0].1.try_recv().unwrap(), error_frame(SERVER_ERROR));
        assert!(conns[1].1.try_recv().is_err());
        assert!(conns[2].1.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_peer_does_not_block_others() {
        let (state, _memory) = setup();
        let mut conns = connect(&state, 4).await;
        let (closed_id, closed_rx) = conns.remove(1);
        drop(closed_rx);
        state.registry.set_state(closed_id, ConnectionState::Closed).await;

        let outcome = process_frame(&state, conns[0].0, text(RECTANGLE)).await;
        assert_eq!(outcome, FrameOutcome::Broadcast { delivered: 2 });
        for (_, rx) in conns.iter_mut().skip(1) {
            assert_eq!(rx.try_recv().unwrap(), text(RECTANGLE));
        }
    }

    #[tokio::test]
    async fn control_frames_are_ignored() {
        let (state, memory) = setup();
        let conns = connect(&state, 1).await;
        let outcome = process_frame(&state, conns[0].0, Message::Pong(Default::default())).await;
        assert_eq!(outcome, FrameOutcome::Ignored);
        assert!(memory.is_empty().await);
    }

    #[test]
    fn error_frame_shape() {
        let Message::Text(text) = error_frame(SERVER_ERROR) else {
            panic!("expected text frame");
        };
        assert_eq!(text.as_str(), r#"{"error":"Server error"}"#);
    }
}
