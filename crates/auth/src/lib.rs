//! Bearer-token authentication and bcrypt password hashing.
//!
//! - [`TokenService`] issues and verifies HS256 JWTs whose `data.id` claim
//!   names the authenticated user.
//! - [`PasswordHasher`] hashes and verifies passwords off the async runtime.
//! - [`require_bearer`] is an axum middleware that rejects requests without a
//!   valid token and stores an [`AuthUser`] in the request extensions.

mod middleware;
mod password;
mod token;

pub use middleware::{bearer_token, require_bearer, AuthUser};
pub use password::PasswordHasher;
pub use token::{Claims, ClaimsData, TokenService};

use shelf_http::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => AppError::unauthorized("missing bearer token"),
            AuthError::Token(_) => AppError::unauthorized("invalid or expired token"),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}
