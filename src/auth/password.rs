//! bcrypt hashing for admin passwords. Work runs on the blocking pool.

use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Verified against when the email is unknown, so both login failures cost the same.
    dummy_hash: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let plain = plain.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
        Ok(hashed)
    }

    /// A stored hash bcrypt cannot parse counts as a mismatch.
    pub async fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordError> {
        let candidate = candidate.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash)).await?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!("Stored password hash could not be verified: {}", e);
                Ok(false)
            }
        }
    }

    /// Spend one verification against a throwaway hash.
    pub async fn verify_dummy(&self, candidate: &str) -> Result<(), PasswordError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hash("dummy-password-for-timing"))
            .await?;
        self.verify(candidate, dummy).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[tokio::test]
    async fn hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("hunter2").await.unwrap();

        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("hunter2", &hash).await.unwrap());
        assert!(!hasher.verify("hunter3", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same").await.unwrap();
        let b = hasher.hash("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!hasher().verify("anything", "plaintext-not-a-hash").await.unwrap());
    }

    #[tokio::test]
    async fn dummy_verification_succeeds_repeatedly() {
        let hasher = hasher();
        hasher.verify_dummy("x").await.unwrap();
        hasher.verify_dummy("y").await.unwrap();
    }

    #[tokio::test]
    async fn uses_configured_cost() {
        let hash = PasswordHasher::new(5).hash("pw").await.unwrap();
        assert!(hash.starts_with("$2b$05$"));
    }
}
