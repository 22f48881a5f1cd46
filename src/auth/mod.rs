//! Authentication module
//!
//! - Password hashing with bcrypt
//! - JWT access token generation and validation
//! - Account registration and login

mod jwt;
mod password;
mod service;

pub use jwt::{generate_access_token, get_user_id_from_claims, verify_token, Claims, JwtError};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService};
