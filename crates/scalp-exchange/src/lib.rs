//! 거래소 공개 시장 데이터 어댑터.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `MarketDataSource` trait: 시세/캔들/호가창 조회 인터페이스
//! - Binance 커넥터 (현물 + USDⓈ-M 선물)
//! - Bybit 커넥터 (현물 + linear 선물)
//! - `MarketRouter`: 마켓 ID의 거래소 기준 디스패치

pub mod connector;
pub mod error;
pub mod router;
pub mod traits;

pub use connector::{BinanceClient, BinanceConfig, BybitClient, BybitConfig};
pub use error::*;
pub use router::MarketRouter;
pub use traits::*;
