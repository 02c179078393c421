use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Opaque verification failure. Malformed, forged and expired tokens are
/// indistinguishable to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid or expired token")]
pub struct InvalidToken;

/// Holds the HMAC keys and issuance parameters. Built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }

    /// Issues a token for `user_id` valid for the configured window.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
        };
        let token = self.sign(&claims)?;
        debug!(user_id = %user_id, "jwt issued");
        Ok(token)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::new(ALGORITHM), claims, &self.encoding)?)
    }

    /// Verifies signature, algorithm, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iss"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(reason = ?e.kind(), "jwt rejected");
            InvalidToken
        })?;

        // jsonwebtoken accepts exp == now; expiry must be strictly in the future.
        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            debug!("jwt rejected: expired");
            return Err(InvalidToken);
        }

        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}
