//! 거래소 커넥터.

pub mod binance;
pub mod bybit;

pub use binance::*;
pub use bybit::*;

use std::time::Duration;

use reqwest::Client;

use crate::ExchangeError;

/// 커넥터 공용 HTTP 클라이언트 생성.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, ExchangeError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e)))
}

/// 거래소 숫자 문자열 파싱. 비어 있거나 잘못된 값은 0.
pub(crate) fn parse_f64(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

/// 가격 필드 파싱. 비어 있거나 잘못된 값은 에러.
pub(crate) fn parse_price(field: &str, s: &str) -> Result<f64, ExchangeError> {
    s.trim()
        .parse()
        .map_err(|_| ExchangeError::ParseError(format!("invalid {}: {:?}", field, s)))
}

/// 끝의 `/`를 제거한 기본 URL.
pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("lastPrice", " 43250.10 ").unwrap(), 43250.10);
        assert!(matches!(
            parse_price("lastPrice", ""),
            Err(ExchangeError::ParseError(_))
        ));
        assert!(parse_price("lastPrice", "n/a").is_err());
        assert_eq!(parse_f64("n/a"), 0.0);
    }
}
