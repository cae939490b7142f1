//! Access tokens for seek streaming.
//!
//! Tokens are compact HS256 JWTs (`header.claims.signature`, base64url
//! without padding) carrying the user id as `sub`, the issuing service as
//! `iss`, and an expiry as `exp`.

use crate::config::AuthConfig;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use vidstream_common::UserId;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Errors produced while issuing or verifying a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token issuer '{0}' is not accepted")]
    UntrustedIssuer(String),

    #[error("token subject is not a valid user id")]
    InvalidSubject,

    #[error("signing key rejected")]
    InvalidKey,

    #[error("failed to encode token: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Issues and verifies user access tokens.
pub trait Tokenizer: Send + Sync {
    /// Create a token for `user_id`.
    fn issue(&self, user_id: UserId) -> Result<String, TokenError>;

    /// Check a token and return the user it was issued for.
    fn verify(&self, token: &str) -> Result<UserId, TokenError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    exp: i64,
    iat: i64,
}

/// HMAC-SHA256 signed JWT tokenizer.
pub struct JwtTokenizer {
    secret: Vec<u8>,
    issuer: String,
    accepted_issuers: Vec<String>,
    ttl_secs: i64,
}

impl JwtTokenizer {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        issuer: impl Into<String>,
        accepted_issuers: Vec<String>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            accepted_issuers,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Build from config, generating a process-local secret when none is set.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = if config.secret.is_empty() {
            tracing::warn!("No auth secret configured; tokens will not survive a restart");
            generate_secret().into_bytes()
        } else {
            config.secret.clone().into_bytes()
        };

        Self::new(
            secret,
            config.issuer.clone(),
            config.accepted_issuers.clone(),
            config.token_ttl_secs,
        )
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::InvalidKey)
    }

    fn is_accepted_issuer(&self, issuer: &str) -> bool {
        issuer == self.issuer || self.accepted_issuers.iter().any(|i| i == issuer)
    }

    fn issue_at(&self, user_id: UserId, now: i64) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            exp: now.saturating_add(self.ttl_secs),
            iat: now,
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<UserId, TokenError> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (header, claims) = signing_input
            .split_once('.')
            .ok_or(TokenError::Malformed)?;
        if claims.contains('.') {
            return Err(TokenError::Malformed);
        }

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(claims)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if !self.is_accepted_issuer(&claims.iss) {
            return Err(TokenError::UntrustedIssuer(claims.iss));
        }

        claims.sub.parse().map_err(|_| TokenError::InvalidSubject)
    }
}

impl Tokenizer for JwtTokenizer {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Generate a random signing secret
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
