//! 라우트와 백그라운드 작업이 함께 쓰는 서비스.

pub mod alert_evaluator;
pub mod market_data;

pub use alert_evaluator::{AlertEvaluator, EvaluationReport, Quote};
pub use market_data::ticker_with_cache;
