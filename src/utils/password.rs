use anyhow::{Context, Result};
use std::sync::OnceLock;

/// Bcrypt work factor, tunable via `BCRYPT_LOG_ROUNDS`. Values outside the
/// sane bcrypt range fall back to the library default.
fn bcrypt_cost() -> u32 {
    static COST: OnceLock<u32> = OnceLock::new();
    *COST.get_or_init(|| {
        std::env::var("BCRYPT_LOG_ROUNDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|c| (4..=31).contains(c))
            .unwrap_or(bcrypt::DEFAULT_COST)
    })
}

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt_cost()).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
