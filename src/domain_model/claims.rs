use serde::{Deserialize, Serialize};
use std::fmt;

/// HMAC families accepted for signing. Anything else is refused when the
/// settings are built.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }

    pub fn to_jwt(self) -> jsonwebtoken::Algorithm {
        match self {
            SigningAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            SigningAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            SigningAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown signing method provided: {0}")]
pub struct UnknownSigningAlgorithm(pub String);

impl std::str::FromStr for SigningAlgorithm {
    type Err = UnknownSigningAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(SigningAlgorithm::HS256),
            "HS384" => Ok(SigningAlgorithm::HS384),
            "HS512" => Ok(SigningAlgorithm::HS512),
            other => Err(UnknownSigningAlgorithm(other.to_string())),
        }
    }
}

/// Names of the claims carried by both halves of a token pair.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ClaimName {
    UserId,
    AccessTokenId,
    RefreshTokenId,
    ExpiresAt,
}

impl ClaimName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimName::UserId => "user_id",
            ClaimName::AccessTokenId => "access_uuid",
            ClaimName::RefreshTokenId => "refresh_uuid",
            ClaimName::ExpiresAt => "exp",
        }
    }
}

impl fmt::Display for ClaimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim set signed into every token. Field names must stay in sync with
/// [`ClaimName::as_str`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    pub access_uuid: String,
    pub refresh_uuid: String,
    pub exp: i64,
}
