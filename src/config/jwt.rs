use anyhow::Result;
use std::env;

const DEFAULT_ACCESS_EXPIRY_SECS: u64 = 900; // 15 minutes
const DEFAULT_REFRESH_EXPIRY_SECS: u64 = 604_800; // 7 days

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: u64,
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters"
            ));
        }

        Ok(Self {
            secret,
            access_token_expiry: env_secs("JWT_ACCESS_EXPIRATION", DEFAULT_ACCESS_EXPIRY_SECS),
            refresh_token_expiry: env_secs("JWT_REFRESH_EXPIRATION", DEFAULT_REFRESH_EXPIRY_SECS),
        })
    }
}

fn env_secs(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
