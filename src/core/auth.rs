//! Telegram signed-login verification and session tokens.

use crate::config::AppConfig;
use crate::core::error::AuthError;
use crate::core::traits::{LoginVerifier, TokenService};
use chrono::{Duration, Utc};
use di::{Ref, inject, injectable};
use hmac::{Hmac, Mac};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Fields every signed login payload must carry.
pub const REQUIRED_LOGIN_FIELDS: [&str; 4] = ["id", "first_name", "auth_date", "hash"];

pub struct TelegramLoginVerifier {
    secret_key: Vec<u8>,
    max_age_secs: i64,
}

#[injectable(LoginVerifier)]
impl TelegramLoginVerifier {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> TelegramLoginVerifier {
        TelegramLoginVerifier::new(&config.bot_token, config.login_max_age_secs)
    }
}

impl TelegramLoginVerifier {
    pub fn new(bot_token: &str, max_age_secs: i64) -> Self {
        TelegramLoginVerifier {
            secret_key: Sha256::digest(bot_token.as_bytes()).to_vec(),
            max_age_secs,
        }
    }
}

/// `key=value` lines for every field except `hash`, sorted by key.
pub fn data_check_string(fields: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> =
        fields.iter().filter(|(key, _)| *key != "hash").collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl LoginVerifier for TelegramLoginVerifier {
    fn validate_signed_login(
        &self,
        signature: &str,
        fields: &HashMap<String, String>,
    ) -> Result<bool, AuthError> {
        for field in REQUIRED_LOGIN_FIELDS {
            if !fields.contains_key(field) {
                return Err(AuthError::MissingField(field));
            }
        }

        let auth_date: i64 = fields
            .get("auth_date")
            .ok_or(AuthError::MissingField("auth_date"))?
            .parse()
            .map_err(|e| AuthError::InvalidAuthDate(format!("{e}")))?;
        match Utc::now().timestamp().checked_sub(auth_date) {
            Some(age) if age <= self.max_age_secs => {}
            _ => return Err(AuthError::Stale),
        }

        let Ok(signature) = hex::decode(signature.to_ascii_lowercase()) else {
            debug!("login signature is not hex");
            return Ok(false);
        };

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret_key)
            .map_err(|_| AuthError::InvalidSignature)?;
        mac.update(data_check_string(fields).as_bytes());

        Ok(mac.verify_slice(&signature).is_ok())
    }
}

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Display name
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

#[injectable(TokenService)]
impl JwtTokenService {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> JwtTokenService {
        JwtTokenService::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours))
    }
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        JwtTokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, display_name: &str, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: display_name.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding_key,
        )?)
    }

    fn validate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSignature)
    }
}
