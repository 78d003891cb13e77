use super::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub uuid::Uuid);

impl TokenId {
    pub fn new() -> Self {
        TokenId(uuid::Uuid::new_v4())
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TokenId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(TokenId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRole {
    Access,
    Refresh,
}

impl TokenRole {
    pub const ALL: [TokenRole; 2] = [TokenRole::Access, TokenRole::Refresh];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenRole::Access => "access",
            TokenRole::Refresh => "refresh",
        }
    }

    /// Single-letter tag used by key-value backends.
    pub fn tag(&self) -> char {
        match self {
            TokenRole::Access => 'a',
            TokenRole::Refresh => 'r',
        }
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One half of a freshly signed token pair.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user_id: UserId,
    pub token_id: TokenId,
    pub paired_token_id: TokenId,
    /// Unix timestamp, seconds.
    pub expires_at: i64,
    pub signed_value: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

impl TokenPair {
    pub fn user_id(&self) -> &UserId {
        &self.access.user_id
    }
}

/// What a revocation store keeps for one live token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTokenRecord {
    pub user_id: UserId,
    pub token_id: TokenId,
    pub role: TokenRole,
    pub signed_value: String,
    pub expires_at: i64,
}

impl StoredTokenRecord {
    pub fn from_issued(role: TokenRole, token: &IssuedToken) -> Self {
        StoredTokenRecord {
            user_id: token.user_id.clone(),
            token_id: token.token_id,
            role,
            signed_value: token.signed_value.clone(),
            expires_at: token.expires_at,
        }
    }

    /// Remaining lifetime at `now`, never below one second so that backends
    /// with native expiry accept it.
    pub fn ttl_secs(&self, now: i64) -> u64 {
        let secs = self.expires_at - now;
        if secs <= 0 { 1 } else { secs as u64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: i64) -> StoredTokenRecord {
        StoredTokenRecord {
            user_id: UserId::from("1"),
            token_id: TokenId::new(),
            role: TokenRole::Access,
            signed_value: "token".to_string(),
            expires_at,
        }
    }

    #[test]
    fn ttl_is_remaining_lifetime() {
        assert_eq!(record(1_000).ttl_secs(400), 600);
    }

    #[test]
    fn ttl_never_drops_to_zero() {
        assert_eq!(record(1_000).ttl_secs(1_000), 1);
        assert_eq!(record(1_000).ttl_secs(5_000), 1);
    }
}
