//! Advertiser credentials and the guard for load-test data routes

pub mod password;
pub mod test_token;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use test_token::{test_token_middleware, TestTokenGuard, TEST_TOKEN_HEADER};
