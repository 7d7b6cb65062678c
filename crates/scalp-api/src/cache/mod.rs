//! 시세 캐시.

mod redis;

pub use self::redis::{CacheError, CacheResult, RedisCache};
