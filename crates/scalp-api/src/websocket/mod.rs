//! 실시간 시세 스트리밍을 위한 WebSocket 서버.
//!
//! # 구성
//!
//! - [`SubscriptionHub`]: 연결 목록과 연결별 구독 집합
//! - [`MarketDataStreamer`]: 틱마다 구독 합집합을 한 번씩 조회하여 구독자에게만 전달
//! - [`handler`]: 연결별 읽기/쓰기 루프
//!
//! # 메시지 형식
//!
//! ## 클라이언트 → 서버
//!
//! ```json
//! {"type": "subscribe", "markets": ["BI:SPOT:BTCUSDT", "BY:PERP:ETHUSDT"]}
//! {"type": "unsubscribe", "markets": ["BI:SPOT:BTCUSDT"]}
//! ```
//!
//! `:`가 없는 심볼은 `BI:SPOT:<심볼>`로 취급합니다.
//!
//! ## 서버 → 클라이언트
//!
//! ```json
//! {"type": "ticker", "marketId": "BI:SPOT:BTCUSDT", "symbol": "BTCUSDT",
//!  "exchange": "binance", "marketType": "spot", "price": 97000.5,
//!  "change24h": 1.2, "volume24h": 123456.0, "timestamp": 1738300800}
//! ```

pub mod handler;
pub mod hub;
pub mod messages;
pub mod streamer;

pub use handler::{websocket_handler, websocket_router, WsState};
pub use hub::{
    create_hub, Connection, ConnectionId, DeliveryOutcome, Payload, SharedHub, SubscriptionHub,
};
pub use messages::{ClientAction, ClientMessage, TickerMessage};
pub use streamer::{MarketDataStreamer, StreamerConfig, TickReport};
