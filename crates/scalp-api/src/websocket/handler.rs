//! WebSocket 연결 handler.
//!
//! 연결마다 두 개의 태스크를 실행합니다.
//! - 수신: 구독/해지 메시지를 연결의 구독 집합에 반영
//! - 송신: 송신 큐의 메시지와 주기적 keepalive ping 전송
//!
//! 어느 한쪽이 끝나면 다른 쪽도 중단하고 허브에서 해제합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use super::hub::{Connection, SharedHub};
use super::messages::{ClientAction, ClientMessage};

/// WebSocket 라우터 상태.
#[derive(Clone)]
pub struct WsState {
    pub hub: SharedHub,
    /// keepalive ping 주기
    pub keepalive: Duration,
}

impl WsState {
    pub fn new(hub: SharedHub, keepalive: Duration) -> Self {
        Self { hub, keepalive }
    }
}

/// WebSocket 업그레이드 handler.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WsState) {
    let (connection, mut outbound_rx) = state.hub.register().await;
    let conn_id = connection.id();

    let (mut sender, mut receiver) = socket.split();

    let reader = Arc::clone(&connection);
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_client_message(&reader, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    debug!(conn_id = %reader.id(), "WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    });

    let keepalive = state.keepalive;
    let mut send_task = tokio::spawn(async move {
        let mut ping = interval_at(Instant::now() + keepalive, keepalive);

        loop {
            tokio::select! {
                outbound = outbound_rx.recv() => match outbound {
                    Some(payload) => {
                        if sender.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // 허브에서 해제되어 큐가 닫힘
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                },

                _ = ping.tick() => {
                    if sender.send(Message::Ping(Default::default())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = &mut receive_task => {
            debug!(conn_id = %conn_id, "Receive task ended");
            send_task.abort();
        }
        _ = &mut send_task => {
            debug!(conn_id = %conn_id, "Send task ended");
            receive_task.abort();
        }
    }

    state.hub.unregister(conn_id).await;
    info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// 클라이언트 메시지 처리.
///
/// 연결을 유지하면 `true`. 해석할 수 없는 메시지는 응답 없이 무시합니다.
async fn handle_client_message(connection: &Connection, msg: Message) -> bool {
    match msg {
        Message::Text(text) => {
            match ClientMessage::from_json(text.as_str()) {
                Ok(client_msg) => apply_client_message(connection, client_msg).await,
                Err(e) => {
                    debug!(conn_id = %connection.id(), "Ignoring malformed message: {}", e);
                }
            }
            true
        }
        Message::Binary(_) => true,
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            debug!(conn_id = %connection.id(), "Close message received");
            false
        }
    }
}

/// 구독 변경 요청을 연결에 반영합니다.
pub async fn apply_client_message(connection: &Connection, msg: ClientMessage) {
    match msg.into_action() {
        ClientAction::Subscribe(items) => {
            let added = connection.subscribe(&items).await;
            debug!(conn_id = %connection.id(), requested = items.len(), added, "Subscribed");
        }
        ClientAction::Unsubscribe(items) => {
            let removed = connection.unsubscribe(&items).await;
            debug!(conn_id = %connection.id(), requested = items.len(), removed, "Unsubscribed");
        }
        ClientAction::Ignore => {}
    }
}

/// `/ws`에 중첩되는 WebSocket 라우터.
pub fn websocket_router(state: WsState) -> Router {
    Router::new()
        .route("/", get(websocket_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::create_hub;
    use scalp_core::MarketId;

    #[tokio::test]
    async fn test_text_frames_mutate_subscriptions() {
        let hub = create_hub(8);
        let (conn, _rx) = hub.register().await;

        let keep = handle_client_message(
            &conn,
            Message::Text(r#"{"type":"subscribe","markets":["BI:PERP:BTCUSDT","ethusdt"]}"#.into()),
        )
        .await;
        assert!(keep);

        let subs = conn.subscriptions().await;
        assert!(subs.contains(&MarketId::parse("BI:PERP:BTCUSDT").unwrap()));
        assert!(subs.contains(&MarketId::parse("BI:SPOT:ETHUSDT").unwrap()));

        handle_client_message(
            &conn,
            Message::Text(r#"{"type":"unsubscribe","symbols":["ETHUSDT"]}"#.into()),
        )
        .await;
        assert_eq!(conn.subscriptions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_frames_keep_connection() {
        let hub = create_hub(8);
        let (conn, _rx) = hub.register().await;

        assert!(handle_client_message(&conn, Message::Text("{oops".into())).await);
        assert!(
            handle_client_message(&conn, Message::Text(r#"{"type":"hello"}"#.into())).await
        );
        assert!(conn.subscriptions().await.is_empty());
        assert!(!handle_client_message(&conn, Message::Close(None)).await);
    }
}
