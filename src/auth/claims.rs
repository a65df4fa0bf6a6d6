use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. The signature over header + payload is HMAC-SHA256 with the
/// configured secret; verification always recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // user ID
    pub username: String, // login name at issuance
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
}
