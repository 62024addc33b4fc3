use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::game_loop::{GameBroadcast, GameCommand};
use crate::protocol::{ClientMsg, RejectedMsg, ServerMsg, TableEventMsg};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before joining so nothing between welcome and the first
    // broadcast is missed
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::ClientJoin { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send ClientJoin command");
        return;
    }

    let (welcome, table_state) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    if !send_msg(&mut sink, &ServerMsg::Welcome(welcome)).await {
        let _ = app_state.game_tx.send(GameCommand::ClientLeave).await;
        return;
    }
    if let Some(msg) = table_state {
        if !send_msg(&mut sink, &ServerMsg::TableState(msg)).await {
            let _ = app_state.game_tx.send(GameCommand::ClientLeave).await;
            return;
        }
    }

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(m) => m,
                            Err(e) => {
                                let reject = ServerMsg::Rejected(RejectedMsg {
                                    reason: format!("malformed message: {}", e),
                                });
                                if !send_msg(&mut sink, &reject).await {
                                    break;
                                }
                                continue;
                            }
                        };

                        let (resp_tx, resp_rx) = oneshot::channel();
                        let cmd = GameCommand::Input { msg: client_msg, response: resp_tx };
                        if app_state.game_tx.send(cmd).await.is_err() {
                            break;
                        }
                        if let Ok(Err(reason)) = resp_rx.await {
                            let msg = ServerMsg::Rejected(RejectedMsg { reason });
                            if !send_msg(&mut sink, &msg).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let msg = match broadcast {
                            GameBroadcast::TableState(msg) => ServerMsg::TableState(msg),
                            GameBroadcast::TableEvent(event) => {
                                ServerMsg::TableEvent(TableEventMsg { event })
                            }
                            GameBroadcast::RoundOver(msg) => ServerMsg::RoundOver(msg),
                            GameBroadcast::MatchOver(msg) => ServerMsg::MatchOver(msg),
                        };
                        if !send_msg(&mut sink, &msg).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Client lagged by {} messages", n);
                        // Continue - the next table_state supersedes what was dropped
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = app_state.game_tx.send(GameCommand::ClientLeave).await;
    tracing::info!("Client disconnected");
}
