//! WebSocket session stream: a snapshot on connect and after every change,
//! with client pings doubling as presence heartbeats.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::http::error::ApiError;
use crate::http::routes::AppState;
use crate::session::{GameSession, PresenceState, SessionStore};
use crate::util::id::PlayerId;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerToClient {
    Snapshot { session: Box<GameSession> },
    Presence { players: Vec<(PlayerId, PresenceState)> },
    /// The subscriber fell behind; the next snapshot is authoritative.
    Lagged { skipped: u64 },
    Error { message: String },
    Pong,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientToServer {
    Ping,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(WsQuery { token }): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let player = state.seat(&session_id, &token)?;
    let (snapshot, changes) = state.sessions.subscribe(&session_id)?;
    if !snapshot.is_seated(player) {
        return Err(ApiError::Unauthorized);
    }
    let sessions = state.sessions.clone();
    Ok(ws
        .on_upgrade(move |socket| {
            handle_socket(socket, sessions, session_id, player, snapshot, changes)
        })
        .into_response())
}

async fn handle_socket(
    socket: WebSocket,
    sessions: SessionStore,
    session_id: String,
    player: PlayerId,
    snapshot: GameSession,
    mut changes: broadcast::Receiver<GameSession>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sv_tx, mut sv_rx) = mpsc::unbounded_channel::<ServerToClient>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = sv_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "could not encode ws message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let _ = sv_tx.send(ServerToClient::Snapshot { session: Box::new(snapshot) });
    if let Ok(players) = sessions.heartbeat(&session_id, player) {
        let _ = sv_tx.send(ServerToClient::Presence { players });
    }

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Ok(session) => {
                    let _ = sv_tx.send(ServerToClient::Snapshot { session: Box::new(session) });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    let _ = sv_tx.send(ServerToClient::Lagged { skipped });
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientToServer>(&txt) {
                    Ok(ClientToServer::Ping) => {
                        match sessions.heartbeat(&session_id, player) {
                            Ok(players) => {
                                let _ = sv_tx.send(ServerToClient::Presence { players });
                                let _ = sv_tx.send(ServerToClient::Pong);
                            }
                            Err(e) => {
                                let message = e.to_string();
                                let _ = sv_tx.send(ServerToClient::Error { message });
                            }
                        }
                    }
                    Err(err) => {
                        let message = format!("Bad message: {}", err);
                        let _ = sv_tx.send(ServerToClient::Error { message });
                    }
                },
                // protocol-level pings count as presence too
                Some(Ok(Message::Ping(_))) => {
                    let _ = sessions.heartbeat(&session_id, player);
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    drop(sv_tx);
    let _ = writer.await;
    tracing::debug!(%session_id, %player, "ws closed");
}
