//! WebSocket 메시지 타입.

use scalp_core::{MarketId, TickerSnapshot};
use serde::{Deserialize, Serialize};

use super::hub::Payload;

/// 클라이언트 → 서버 메시지.
///
/// 이전 클라이언트는 `markets` 대신 `symbols`를 보냅니다.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub markets: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// 해석된 클라이언트 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
    /// 알 수 없는 `type`
    Ignore,
}

impl ClientMessage {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 메시지를 구독 변경 요청으로 변환합니다.
    pub fn into_action(self) -> ClientAction {
        let items = if self.markets.is_empty() {
            self.symbols
        } else {
            self.markets
        };

        match self.kind.as_str() {
            "subscribe" => ClientAction::Subscribe(items),
            "unsubscribe" => ClientAction::Unsubscribe(items),
            _ => ClientAction::Ignore,
        }
    }
}

/// 서버 → 클라이언트 시세 메시지.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub market_id: String,
    pub symbol: String,
    /// `binance` | `bybit`
    pub exchange: String,
    /// `spot` | `perp`
    pub market_type: String,
    pub price: f64,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
    /// Unix 초
    pub timestamp: i64,
}

impl TickerMessage {
    /// 구독 키와 조회 결과로 메시지를 만듭니다.
    pub fn new(market: &MarketId, ticker: &TickerSnapshot) -> Self {
        Self {
            kind: "ticker".to_string(),
            market_id: market.to_string(),
            symbol: market.symbol.clone(),
            exchange: market.exchange.name().to_string(),
            market_type: market.market.wire_name().to_string(),
            price: ticker.price,
            change_24h: ticker.change_24h_pct,
            volume_24h: ticker.volume_24h,
            timestamp: ticker.timestamp,
        }
    }

    /// 전송용 직렬화.
    pub fn to_payload(&self) -> Result<Payload, serde_json::Error> {
        serde_json::to_string(self).map(Payload::from)
    }
}
