pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtKeys, SESSION_COOKIE};
pub use password::{hash_password, verify_password};
