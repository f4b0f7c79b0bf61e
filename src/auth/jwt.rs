use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, TokenUser};
use crate::{
    config::JwtConfig,
    error::{AppError, AppResult},
    state::AppState,
};

/// HS256 signing and verification keys with the configured lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::seconds(cfg.expiry_secs),
        }
    }

    pub fn sign(&self, user: TokenUser) -> AppResult<String> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    pub fn sign_at(&self, user: TokenUser, now: OffsetDateTime) -> AppResult<String> {
        let exp = now
            .checked_add(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token lifetime of {} overflows the clock", self.ttl))?;
        let claims = Claims {
            sub: user.email.clone(),
            user,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("jwt signing failed")?;
        debug!(user_id = %claims.user.id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Expiry is exclusive: a token is rejected from the instant `exp` is reached.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::InvalidToken
        })?;

        if now.unix_timestamp() >= data.claims.exp {
            debug!(exp = data.claims.exp, "jwt expired");
            return Err(AppError::InvalidToken);
        }
        debug!(user_id = %data.claims.user.id, "jwt verified");
        Ok(data.claims)
    }
}
