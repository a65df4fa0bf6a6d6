use anyhow::Context;

/// Token lifetime, fixed at one hour from issuance.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// The one signing secret. Sourced from `JWT_SECRET` only; there is no
    /// fallback literal anywhere in the crate.
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        Ok(Self {
            database_url,
            jwt_secret,
        })
    }
}
