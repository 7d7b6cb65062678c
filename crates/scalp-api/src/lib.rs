//! # Scalp API
//!
//! scalpaiboard 백엔드 서버.
//!
//! - REST: 코인, 마켓, 기술적 분석, 인증, 관심종목, 가격 알림, AI 제공자/채팅
//! - WebSocket: 구독 마켓 실시간 시세 (`/ws`)
//! - 백그라운드: 시세 스트리머, 가격 알림 평가기

pub mod ai;
pub mod auth;
pub mod cache;
pub mod error;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod websocket;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
