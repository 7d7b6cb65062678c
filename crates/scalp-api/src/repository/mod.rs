//! 데이터베이스 Repository.
//!
//! 라우트 핸들러와 백그라운드 작업에서 쓰는 SQL을 모아 둡니다.
//! 모든 Repository는 static methods 패턴을 사용합니다.

pub mod ai_providers;
pub mod alerts;
pub mod coins;
pub mod users;
pub mod watchlist;

pub use ai_providers::{
    AiProviderCredentials, AiProviderRecord, AiProviderRepository, NewAiProvider,
    UpdateAiProvider,
};
pub use alerts::{
    ActiveAlert, AlertHistoryRecord, AlertRecord, AlertRepository, NewAlert, UpdateAlert,
};
pub use coins::{CoinListQuery, CoinRecord, CoinRepository};
pub use users::{NewUser, UserRecord, UserRepository};
pub use watchlist::{WatchlistItem, WatchlistRepository};
