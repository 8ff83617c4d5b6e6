//! WebSocket glue: one socket per participant, a writer task draining the
//! connection's outbound channel, and one task spawned per inbound command.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::session::hub::SessionHub;
use crate::session::protocol::{ServerMessage, UserGameCommand};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<Arc<SessionHub>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<SessionHub>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_id = hub.registry().next_conn_id();

    // Writer: outbound channel → socket. A failed send means the peer is
    // gone; dropping the receiver lets the registry prune us on the next
    // broadcast.
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!("failed to encode server message: {err}");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<UserGameCommand>(&text) {
            Ok(command) => {
                // One lightweight task per inbound command.
                let hub = hub.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    hub.handle(conn_id, &tx, command).await;
                });
            }
            Err(err) => {
                tracing::debug!("malformed command on connection {conn_id}: {err}");
                let _ = tx.send(ServerMessage::Error {
                    message: format!("error: invalid command: {err}"),
                });
            }
        }
    }

    // A dropped socket is handled like an explicit LEAVE.
    hub.disconnect(conn_id).await;
    writer.abort();
}
