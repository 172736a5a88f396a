//! 令牌服务
//! Token service
//!
//! 签发与校验 HS256 签名的身份令牌。令牌无状态，服务端不保存，
//! 泄露的令牌在自然过期前一直有效，过期时长是唯一的缓解手段。
//! Issues and verifies HS256-signed identity tokens. Tokens are stateless and
//! never stored server-side; a leaked token stays valid until it expires, so
//! the expiry duration is the only mitigation knob.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 令牌载荷 / Token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub uid: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// 校验通过后的身份 / Identity extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("签发令牌失败 / failed to sign token: {0}")]
    Signing(String),
}

/// 签名密钥与有效期，启动时加载一次后只读
/// Signing key and lifetime, loaded once at startup and read-only afterwards
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"***")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            ttl_seconds: config.ttl_seconds,
        }
    }

    /// 签发令牌 / Issue a token for the given user
    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            uid: user_id,
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// 校验令牌 / Verify a token
    ///
    /// 签名错误、格式错误或已过期均失败
    /// Fails on a bad signature, a malformed token or an expired token
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;
        if claims.sub != claims.uid.to_string() {
            return Err(TokenError::Malformed);
        }
        Ok(Identity {
            user_id: claims.uid,
            username: claims.username,
        })
    }
}
