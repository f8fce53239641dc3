use tokio::task;

use crate::AuthError;

/// bcrypt with a fixed cost factor.
///
/// Hashing is CPU-bound, so both operations run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plain: String) -> Result<String, AuthError> {
        let cost = self.cost;
        let hashed = task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
        Ok(hashed)
    }

    pub async fn verify(&self, plain: String, hashed: String) -> Result<bool, AuthError> {
        let ok = task::spawn_blocking(move || bcrypt::verify(plain, &hashed)).await??;
        Ok(ok)
    }

    /// Stand-in for [`verify`](Self::verify) when there is no stored hash.
    ///
    /// Spends the same bcrypt work at the configured cost and always answers
    /// `false`, so a missing account takes as long as a wrong password.
    pub async fn verify_missing(&self, plain: String) -> Result<bool, AuthError> {
        self.hash(plain).await?;
        Ok(false)
    }
}
