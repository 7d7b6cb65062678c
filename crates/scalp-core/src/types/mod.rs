//! 백엔드 전반에서 사용되는 공통 타입.

mod alert;
mod interval;
mod market_data;
mod market_id;

pub use alert::*;
pub use interval::*;
pub use market_data::*;
pub use market_id::*;
