//! 캔들 간격 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 캔들 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl CandleInterval {
    /// API 쿼리에서 사용하는 간격 문자열 (Binance와 동일).
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::M1 => "1m",
            CandleInterval::M5 => "5m",
            CandleInterval::M15 => "15m",
            CandleInterval::M30 => "30m",
            CandleInterval::H1 => "1h",
            CandleInterval::H4 => "4h",
            CandleInterval::D1 => "1d",
            CandleInterval::W1 => "1w",
        }
    }

    /// Binance `interval` 파라미터 값.
    pub fn binance_code(&self) -> &'static str {
        self.as_str()
    }

    /// Bybit `interval` 파라미터 값.
    pub fn bybit_code(&self) -> &'static str {
        match self {
            CandleInterval::M1 => "1",
            CandleInterval::M5 => "5",
            CandleInterval::M15 => "15",
            CandleInterval::M30 => "30",
            CandleInterval::H1 => "60",
            CandleInterval::H4 => "240",
            CandleInterval::D1 => "D",
            CandleInterval::W1 => "W",
        }
    }
}

impl Default for CandleInterval {
    fn default() -> Self {
        CandleInterval::H1
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(CandleInterval::M1),
            "5m" => Ok(CandleInterval::M5),
            "15m" => Ok(CandleInterval::M15),
            "30m" => Ok(CandleInterval::M30),
            "1h" => Ok(CandleInterval::H1),
            "4h" => Ok(CandleInterval::H4),
            "1d" => Ok(CandleInterval::D1),
            "1w" => Ok(CandleInterval::W1),
            other => Err(CoreError::InvalidInterval(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bybit_codes() {
        let cases = [
            ("1m", "1"),
            ("5m", "5"),
            ("15m", "15"),
            ("30m", "30"),
            ("1h", "60"),
            ("4h", "240"),
            ("1d", "D"),
            ("1w", "W"),
        ];
        for (raw, code) in cases {
            let interval: CandleInterval = raw.parse().unwrap();
            assert_eq!(interval.bybit_code(), code);
            assert_eq!(interval.binance_code(), raw);
        }
    }

    #[test]
    fn test_unknown_interval() {
        assert!("2h".parse::<CandleInterval>().is_err());
        assert_eq!(CandleInterval::default().as_str(), "1h");
    }
}
