//! WebSocket Connection Handler
//!
//! Upgrades an authenticated request and drives one connection: a writer
//! task drains the connection's outbound queue into the socket while the
//! read loop feeds inbound text frames to the gateway one at a time.
//! A close request bypasses the queue and stops both halves.

use std::fmt::Display;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};

use super::registry::{CloseRequest, ConnectionHandle};
use crate::presentation::middleware::AuthUser;
use crate::startup::AppState;

/// How long a superseded connection gets to flush its close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// WebSocket upgrade handler.
///
/// Authentication runs as an extractor, so a bad token is answered with
/// 401 and no socket is ever opened.
pub async fn ws_handler(
    auth: AuthUser,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    let max_message_size = state.settings.websocket.max_message_size;
    let max_frame_size = state.settings.websocket.max_frame_size;

    ws.max_message_size(max_message_size)
        .max_frame_size(max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, auth))
}

enum LoopExit {
    Closed,
    WriterStopped,
    Superseded,
}

async fn handle_socket(socket: WebSocket, state: AppState, auth: AuthUser) {
    let (sink, mut stream) = socket.split();

    let (tx, rx) = mpsc::channel(state.settings.websocket.outbound_queue_capacity);
    let handle = ConnectionHandle::new(auth.user_id, tx);
    let connection_id = handle.connection_id();
    let mut close = handle.close_requests();

    let mut writer = tokio::spawn(write_outbound(sink, rx, close.clone()));

    tracing::debug!(
        user_id = auth.user_id,
        connection_id = %connection_id,
        "New WebSocket connection"
    );

    let mut session = state.gateway.connect(handle).await;

    let exit = loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        state.gateway.process_frame(&mut session, text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(
                            user_id = auth.user_id,
                            connection_id = %connection_id,
                            "Ignoring binary frame"
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break LoopExit::Closed;
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Pong is handled automatically by axum
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break LoopExit::Closed;
                    }
                }
            }

            request = requested_close(&mut close) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    code = request.code,
                    reason = request.reason,
                    "Close requested"
                );
                break LoopExit::Superseded;
            }

            // Writer finished: the socket failed or a close frame went out
            _ = &mut writer => {
                tracing::debug!(connection_id = %connection_id, "Outbound writer stopped");
                break LoopExit::WriterStopped;
            }
        }
    };

    // Cleanup
    state.gateway.disconnect(&session);
    match exit {
        LoopExit::WriterStopped => {}
        LoopExit::Superseded => {
            if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
                tracing::debug!(connection_id = %connection_id, "Close frame not flushed in time");
                writer.abort();
            }
        }
        LoopExit::Closed => writer.abort(),
    }
}

/// Resolves once a close is requested. Never resolves if the handle is
/// dropped without one.
async fn requested_close(close: &mut watch::Receiver<Option<CloseRequest>>) -> CloseRequest {
    let request = close.wait_for(Option::is_some).await.ok().and_then(|r| *r);
    match request {
        Some(request) => request,
        None => std::future::pending().await,
    }
}

/// Single writer per socket. Ends after a close frame or a failed send.
///
/// A close request wins over queued frames, so a backed-up queue cannot
/// delay it.
async fn write_outbound<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Message>,
    mut close: watch::Receiver<Option<CloseRequest>>,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        tokio::select! {
            biased;

            request = requested_close(&mut close) => {
                if let Err(e) = sink.send(request.frame()).await {
                    tracing::debug!(error = %e, "Failed to write close frame");
                }
                break;
            }

            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    tracing::debug!(error = %e, "Failed to write frame");
                    break;
                }
                if closing {
                    break;
                }
            }
        }
    }
    let _ = sink.close().await;
}
