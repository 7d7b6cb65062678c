//! 마켓 식별자 정의.
//!
//! 구독 및 라우팅 키로 사용되는 (거래소, 시장 유형, 심볼) 삼중항입니다.
//! 문자열 표현은 `<거래소태그>:<유형태그>:<심볼>` 형식입니다 (예: `BI:SPOT:BTCUSDT`).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// 지원 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExchangeKind {
    /// Binance
    Binance,
    /// Bybit
    Bybit,
}

impl ExchangeKind {
    /// 모든 거래소 (목록 정렬 순서).
    pub const ALL: [ExchangeKind; 2] = [ExchangeKind::Binance, ExchangeKind::Bybit];

    /// 마켓 ID에 쓰이는 2글자 태그.
    pub fn tag(&self) -> &'static str {
        match self {
            ExchangeKind::Binance => "BI",
            ExchangeKind::Bybit => "BY",
        }
    }

    /// 소문자 거래소 이름.
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeKind::Binance => "binance",
            ExchangeKind::Bybit => "bybit",
        }
    }

    /// 태그에서 거래소를 찾습니다 (대소문자 무시).
    pub fn from_tag(tag: &str) -> CoreResult<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "BI" => Ok(ExchangeKind::Binance),
            "BY" => Ok(ExchangeKind::Bybit),
            _ => Err(CoreError::UnknownExchange(tag.to_string())),
        }
    }

    /// 쿼리 파라미터 값(`binance`, `bybit`, 또는 태그)에서 거래소를 찾습니다.
    pub fn from_name(name: &str) -> CoreResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "binance" | "bi" => Ok(ExchangeKind::Binance),
            "bybit" | "by" => Ok(ExchangeKind::Bybit),
            _ => Err(CoreError::UnknownExchange(name.to_string())),
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 시장 유형 (현물 / 무기한 선물).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarketKind {
    /// 현물
    Spot,
    /// 무기한 선물
    Perp,
}

impl MarketKind {
    /// 마켓 ID에 쓰이는 태그.
    pub fn tag(&self) -> &'static str {
        match self {
            MarketKind::Spot => "SPOT",
            MarketKind::Perp => "PERP",
        }
    }

    /// 웹소켓 메시지의 `marketType` 값.
    pub fn wire_name(&self) -> &'static str {
        match self {
            MarketKind::Spot => "spot",
            MarketKind::Perp => "perp",
        }
    }

    /// 화면 표시용 이름.
    pub fn display_name(&self) -> &'static str {
        match self {
            MarketKind::Spot => "Spot",
            MarketKind::Perp => "Perpetual",
        }
    }

    /// 태그에서 시장 유형을 찾습니다 (대소문자 무시).
    pub fn from_tag(tag: &str) -> CoreResult<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "SPOT" => Ok(MarketKind::Spot),
            "PERP" => Ok(MarketKind::Perp),
            _ => Err(CoreError::UnknownMarketType(tag.to_string())),
        }
    }

    /// 목록 필터 값을 해석합니다.
    ///
    /// 알 수 없는 값은 `None` (필터 없음)으로 취급합니다.
    pub fn from_filter(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spot" => Some(MarketKind::Spot),
            "perp" | "perpetual" | "futures" => Some(MarketKind::Perp),
            _ => None,
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// 정규화된 마켓 식별자.
///
/// 심볼은 항상 대문자입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarketId {
    /// 거래소
    pub exchange: ExchangeKind,
    /// 시장 유형
    pub market: MarketKind,
    /// 대문자 심볼 (예: BTCUSDT)
    pub symbol: String,
}

impl MarketId {
    /// 새 마켓 ID를 생성합니다.
    pub fn new(exchange: ExchangeKind, market: MarketKind, symbol: impl AsRef<str>) -> Self {
        Self {
            exchange,
            market,
            symbol: symbol.as_ref().to_ascii_uppercase(),
        }
    }

    /// Binance 현물 마켓 ID.
    pub fn binance_spot(symbol: impl AsRef<str>) -> Self {
        Self::new(ExchangeKind::Binance, MarketKind::Spot, symbol)
    }

    /// `BI:SPOT:BTCUSDT` 형식의 문자열을 파싱합니다.
    ///
    /// 정확히 세 부분이어야 하며, 알 수 없는 태그는 거부됩니다.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() != 3 {
            return Err(CoreError::InvalidMarketId(raw.to_string()));
        }

        let exchange = ExchangeKind::from_tag(parts[0])?;
        let market = MarketKind::from_tag(parts[1])?;
        if parts[2].is_empty() {
            return Err(CoreError::InvalidMarketId(raw.to_string()));
        }

        Ok(Self::new(exchange, market, parts[2]))
    }

    /// 클라이언트 구독 항목을 정규화합니다.
    ///
    /// - 앞뒤 공백 제거, 빈 값은 무시
    /// - `:`가 없는 심볼은 `BI:SPOT:<대문자 심볼>`로 변환
    /// - 그 외에는 [`MarketId::parse`] 결과, 실패하면 무시
    pub fn normalize_subscription(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if !trimmed.contains(':') {
            return Some(Self::binance_spot(trimmed));
        }

        Self::parse(trimmed).ok()
    }

    /// 문자열 표현을 생성합니다.
    pub fn build(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.exchange.tag(),
            self.market.tag(),
            self.symbol
        )
    }
}

impl FromStr for MarketId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MarketId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MarketId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MarketId::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_id() {
        let id = MarketId::parse("by:perp:ethusdt").unwrap();
        assert_eq!(id.exchange, ExchangeKind::Bybit);
        assert_eq!(id.market, MarketKind::Perp);
        assert_eq!(id.symbol, "ETHUSDT");
        assert_eq!(id.to_string(), "BY:PERP:ETHUSDT");
    }

    #[test]
    fn test_parse_rejects_unknown_tags() {
        assert!(matches!(
            MarketId::parse("OK:SPOT:BTCUSDT"),
            Err(CoreError::UnknownExchange(_))
        ));
        assert!(matches!(
            MarketId::parse("BI:FUT:BTCUSDT"),
            Err(CoreError::UnknownMarketType(_))
        ));
        assert!(MarketId::parse("BI:SPOT").is_err());
        assert!(MarketId::parse("BI:SPOT:BTC:USDT").is_err());
        assert!(MarketId::parse("BI:SPOT:").is_err());
    }

    #[test]
    fn test_normalize_subscription() {
        assert_eq!(
            MarketId::normalize_subscription(" btcusdt ").unwrap().to_string(),
            "BI:SPOT:BTCUSDT"
        );
        assert_eq!(
            MarketId::normalize_subscription("bi:spot:btcusdt"),
            MarketId::normalize_subscription("BTCUSDT")
        );
        assert!(MarketId::normalize_subscription("   ").is_none());
        assert!(MarketId::normalize_subscription("XX:SPOT:BTCUSDT").is_none());
    }

    #[test]
    fn test_market_filter_aliases() {
        assert_eq!(MarketKind::from_filter("futures"), Some(MarketKind::Perp));
        assert_eq!(MarketKind::from_filter("Perpetual"), Some(MarketKind::Perp));
        assert_eq!(MarketKind::from_filter("spot"), Some(MarketKind::Spot));
        assert_eq!(MarketKind::from_filter("margin"), None);
    }

    #[test]
    fn test_serde_as_string() {
        let id = MarketId::binance_spot("solusdt");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"BI:SPOT:SOLUSDT\"");

        let back: MarketId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<MarketId>("\"nope\"").is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_canonical_id_round_trips(
                exchange in prop::sample::select(vec!["BI", "BY"]),
                market in prop::sample::select(vec!["SPOT", "PERP"]),
                symbol in "[A-Z0-9]{1,20}",
            ) {
                let raw = format!("{}:{}:{}", exchange, market, symbol);
                let id = MarketId::parse(&raw).unwrap();
                prop_assert_eq!(id.build(), raw.clone());
                prop_assert_eq!(MarketId::normalize_subscription(&raw), Some(id));
            }
        }
    }
}
