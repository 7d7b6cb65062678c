//! 인증.
//!
//! - [`Claims`]: JWT 페이로드 (`user_id`, `email`, `exp`, `iat`)
//! - [`JwtAuth`]: 보호된 핸들러용 Bearer 토큰 추출기
//! - Argon2 비밀번호 해싱

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_token, decode_token, Claims, IssuedToken, JwtError};
pub use middleware::{JwtAuth, JwtAuthError, JwtConfig};
pub use password::{hash_password, verify_password, PasswordError};
