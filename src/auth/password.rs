//! Password hashing
//!
//! bcrypt is CPU-bound by design, so both operations run on tokio's blocking
//! pool instead of an async worker.

use thiserror::Error;
use tokio::task;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashFailed(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Password task did not complete: {0}")]
    TaskFailed(#[from] task::JoinError),
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await?
        .map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Returns `Ok(false)` for a wrong password, `Err` only when the stored hash is unusable
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await?
        .map_err(|e| PasswordError::MalformedHash(e.to_string()))
}
