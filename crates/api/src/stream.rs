//! WebSocket endpoint that forwards odds changes to connected clients.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use marketfeed_models::ODDS_CHANGED;
use tracing::{debug, warn};

use crate::routes::AppState;

/// Upgrade handler for `GET /markets/stream`.
pub async fn stream_odds(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One subscription per connection, alive exactly as long as the socket.
///
/// Every odds change published while this client is subscribed is forwarded
/// verbatim as one JSON text message. No buffering beyond the subscription
/// channel, no replay of events from before the connection opened.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut subscription = state.bus.subscribe(ODDS_CHANGED);
    debug!("odds stream client connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                // None means the bus dropped us (reset); close the stream.
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize odds change event");
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients only listen on this stream; ignore anything else.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // The subscription drops here, unregistering this client from the bus.
    debug!("odds stream client disconnected");
}
