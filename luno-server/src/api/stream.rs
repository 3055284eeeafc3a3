//! WebSocket endpoint for the messaging relay.

use std::fmt::Display;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::messaging::{ClientFrame, MessagingRelay};
use crate::state::AppState;

/// GET /ws - Upgrade to a relay connection
pub async fn stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(socket: WebSocket, relay: MessagingRelay) {
    let (sender, receiver) = socket.split();
    serve_connection(sender, receiver, relay).await;
}

/// Pump frames between one socket and its relay session until either side
/// goes away. The session is released from the registry on exit.
pub(crate) async fn serve_connection<W, R, E>(mut sender: W, mut receiver: R, relay: MessagingRelay)
where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (mut session, mut events) = relay.connect();
    let connection = session.connection_id();

    info!(connection, "Relay connection opened");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(frame) => session.handle_frame(frame),
                        Err(e) => warn!(connection, "Failed to parse client frame: {}", e),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(connection, "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            Some(event) = events.recv() => {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(connection, "Failed to encode relay event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    session.close();
    info!(connection, "Relay connection closed");
}
