//! WebSocket 연결 및 구독 관리.
//!
//! 허브 잠금은 등록/해제/스냅샷에만 쓰이고, 구독 집합은 연결마다 별도
//! 잠금을 가집니다. 한 연결의 구독 변경이 다른 연결이나 스트리머의
//! 스냅샷과 허브 잠금을 두고 경합하지 않습니다.

use axum::extract::ws::Utf8Bytes;
use scalp_core::MarketId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// 연결 식별자.
pub type ConnectionId = Uuid;

/// 송신 큐에 들어가는 직렬화된 메시지 (복제 비용이 낮음).
pub type Payload = Utf8Bytes;

/// 공유 허브.
pub type SharedHub = Arc<SubscriptionHub>;

/// 비차단 전송 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 큐에 들어감
    Sent,
    /// 큐가 가득 차서 버림
    Dropped,
    /// 이미 해제된 연결
    Closed,
}

/// 단일 WebSocket 연결.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    /// `None`이면 닫힌 큐. `take()`로 한 번만 닫힙니다.
    outbound: Mutex<Option<mpsc::Sender<Payload>>>,
    subscriptions: RwLock<HashSet<MarketId>>,
}

impl Connection {
    fn new(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id: Uuid::new_v4(),
            outbound: Mutex::new(Some(tx)),
            subscriptions: RwLock::new(HashSet::new()),
        };
        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn outbound(&self) -> MutexGuard<'_, Option<mpsc::Sender<Payload>>> {
        // 잠금 구간은 패닉하지 않음
        self.outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 구독을 추가하고 새로 추가된 수를 반환합니다.
    ///
    /// 각 항목은 [`MarketId::normalize_subscription`]으로 정규화되며,
    /// 해석할 수 없는 항목은 무시됩니다.
    pub async fn subscribe<S: AsRef<str>>(&self, items: &[S]) -> usize {
        let markets: Vec<MarketId> = items
            .iter()
            .filter_map(|item| MarketId::normalize_subscription(item.as_ref()))
            .collect();

        let mut subscriptions = self.subscriptions.write().await;
        let mut added = 0;
        for market in markets {
            if subscriptions.insert(market) {
                added += 1;
            }
        }
        added
    }

    /// 구독을 제거하고 제거된 수를 반환합니다.
    pub async fn unsubscribe<S: AsRef<str>>(&self, items: &[S]) -> usize {
        let markets: Vec<MarketId> = items
            .iter()
            .filter_map(|item| MarketId::normalize_subscription(item.as_ref()))
            .collect();

        let mut subscriptions = self.subscriptions.write().await;
        markets
            .iter()
            .filter(|market| subscriptions.remove(*market))
            .count()
    }

    /// 현재 구독 집합의 복사본.
    pub async fn subscriptions(&self) -> HashSet<MarketId> {
        self.subscriptions.read().await.clone()
    }

    /// 대기 없이 송신 큐에 넣습니다. 큐가 가득 차면 버립니다.
    pub fn try_deliver(&self, payload: Payload) -> DeliveryOutcome {
        let outbound = self.outbound();
        let Some(tx) = outbound.as_ref() else {
            return DeliveryOutcome::Closed;
        };

        match tx.try_send(payload) {
            Ok(()) => DeliveryOutcome::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => DeliveryOutcome::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => DeliveryOutcome::Closed,
        }
    }

    /// 송신 큐를 닫습니다. 처음 닫을 때만 `true`.
    fn close(&self) -> bool {
        self.outbound().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.outbound().is_none()
    }
}

/// 활성 연결 목록.
#[derive(Debug)]
pub struct SubscriptionHub {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    queue_capacity: usize,
}

impl SubscriptionHub {
    /// 연결별 송신 큐 크기를 지정하여 생성합니다.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            queue_capacity,
        }
    }

    /// 새 연결을 만들어 등록합니다.
    ///
    /// 연결은 삽입과 동시에 완전히 등록된 상태로만 보입니다.
    pub async fn register(&self) -> (Arc<Connection>, mpsc::Receiver<Payload>) {
        let (connection, rx) = Connection::new(self.queue_capacity);
        let connection = Arc::new(connection);

        let total = {
            let mut connections = self.connections.write().await;
            connections.insert(connection.id(), Arc::clone(&connection));
            connections.len()
        };

        info!(conn_id = %connection.id(), total, "WebSocket client registered");
        (connection, rx)
    }

    /// 연결을 제거하고 송신 큐를 닫습니다.
    ///
    /// 여러 번 호출해도 큐는 한 번만 닫히며, 실제로 제거했을 때만 `true`.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let (removed, total) = {
            let mut connections = self.connections.write().await;
            let removed = connections.remove(&id);
            (removed, connections.len())
        };

        match removed {
            Some(connection) => {
                connection.close();
                info!(conn_id = %id, total, "WebSocket client unregistered");
                true
            }
            None => {
                debug!(conn_id = %id, "Connection already unregistered");
                false
            }
        }
    }

    /// 현재 연결 목록의 스냅샷.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.read().await.get(&id).cloned()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// 공유 허브 생성.
pub fn create_hub(queue_capacity: usize) -> SharedHub {
    Arc::new(SubscriptionHub::new(queue_capacity))
}
