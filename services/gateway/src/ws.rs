//! WebSocket connection handling.
//!
//! The first request on a connection must be `join`; it binds the
//! connection to one player id for its whole life. Requests get a direct
//! ack or error carrying their request id, while game events arrive
//! through the shared broadcast stream, filtered here so a connection
//! only ever sees public events and its own player's.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use parlor_engine::Error;
use parlor_types::{
    api::{Audience, ClientMessage, GameKind, Response, ServerEvent},
    PlayerId,
};
use std::sync::{Arc, OnceLock};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    state.metrics.inc_connection_opened();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut broadcast_rx = state.broadcaster.subscribe();

    // Written exactly once, by the first successful join.
    let identity: Arc<OnceLock<PlayerId>> = Arc::new(OnceLock::new());

    let write_task = {
        let metrics = state.metrics.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if sender.send(message).await.is_err() {
                    break;
                }
                metrics.inc_message_sent();
            }
        })
    };

    let broadcast_task = {
        let tx = tx.clone();
        let identity = identity.clone();
        let metrics = state.metrics.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(event) => {
                        let mine = match event.audience() {
                            Audience::Everyone => true,
                            Audience::Player(target) => identity
                                .get()
                                .map(|me| me.as_str() == target)
                                .unwrap_or(false),
                        };
                        if !mine {
                            continue;
                        }
                        if let Ok(payload) = serde_json::to_string(event.as_ref()) {
                            if tx.send(Message::Text(payload)).is_err() {
                                break;
                            }
                        }
                    }
                    // A slow consumer misses events but keeps its connection.
                    Err(RecvError::Lagged(skipped)) => {
                        metrics.add_broadcast_lagged(skipped);
                        warn!(skipped, "connection lagged behind the event stream");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => {
                state.metrics.inc_message_received();
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => {
                        handle_message(msg, &state, &identity, &tx).await;
                    }
                    Err(err) => {
                        warn!(?err, "invalid inbound message");
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(player) = identity.get() {
        let events = {
            let mut rooms = state.rooms.lock().unwrap();
            rooms.disconnect(player)
        };
        state.publish(events);
        info!(player = player.as_str(), "connection closed");
    }
    state.metrics.inc_connection_closed();
    write_task.abort();
    broadcast_task.abort();
}

async fn handle_message(
    msg: ClientMessage,
    state: &AppState,
    identity: &OnceLock<PlayerId>,
    tx: &mpsc::UnboundedSender<Message>,
) {
    let request_id = msg.request_id().to_string();

    if let ClientMessage::Join { player_id, .. } = &msg {
        if identity.get().is_some_and(|bound| bound != player_id) {
            send_response(
                tx,
                Response::Error {
                    request_id,
                    code: "VALIDATION".to_string(),
                    message: "connection is bound to another player".to_string(),
                },
            );
            return;
        }
        let response = {
            let mut rooms = state.rooms.lock().unwrap();
            match rooms.dispatch(&msg) {
                Ok(events) => {
                    let _ = identity.set(player_id.clone());
                    state.publish(events);
                    Response::Ack { request_id }
                }
                Err(err) => error_response(request_id, &err),
            }
        };
        send_response(tx, response);
        return;
    }

    let player = match identity.get() {
        Some(player) => player.clone(),
        None => {
            send_response(
                tx,
                Response::Error {
                    request_id,
                    code: "NOT_JOINED".to_string(),
                    message: "join before any other request".to_string(),
                },
            );
            return;
        }
    };
    if msg.player_id() != player {
        send_response(
            tx,
            Response::Error {
                request_id,
                code: "VALIDATION".to_string(),
                message: "connection is bound to another player".to_string(),
            },
        );
        return;
    }

    let wager_room = bet_room(&msg);
    let response = {
        let mut rooms = state.rooms.lock().unwrap();
        match rooms.dispatch(&msg) {
            Ok(events) => {
                if wager_room.is_some() {
                    state.metrics.inc_wager_accepted();
                }
                state.publish(events);
                Response::Ack { request_id }
            }
            Err(err) => {
                if let Some(room) = wager_room {
                    state.metrics.inc_wager_rejected();
                    state.publish(vec![ServerEvent::BetError {
                        player_id: player.clone(),
                        room,
                        message: err.to_string(),
                    }]);
                }
                error_response(request_id, &err)
            }
        }
    };
    send_response(tx, response);
}

/// The room a wagering request belongs to, `None` for other traffic.
fn bet_room(msg: &ClientMessage) -> Option<GameKind> {
    match msg {
        ClientMessage::PlaceBet { game, .. } => Some(*game),
        ClientMessage::LockBet { .. } | ClientMessage::CancelBet { .. } => {
            Some(GameKind::CoinToss)
        }
        ClientMessage::RepeatBets { .. } => Some(GameKind::Lucky7),
        _ => None,
    }
}

fn send_response(tx: &mpsc::UnboundedSender<Message>, response: Response) {
    if let Ok(payload) = serde_json::to_string(&response) {
        let _ = tx.send(Message::Text(payload));
    }
}

fn error_response(request_id: String, err: &Error) -> Response {
    Response::Error {
        request_id,
        code: err.code().to_string(),
        message: err.to_string(),
    }
}
