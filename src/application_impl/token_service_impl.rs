use super::jwt_codec::{JwtCodec, extract_claims, is_expired};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub algorithm: SigningAlgorithm,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

pub struct RealTokenService {
    codec: JwtCodec,
    cfg: JwtConfig,
    store: Arc<dyn TokenStore>,
}

impl RealTokenService {
    pub fn new(cfg: JwtConfig, store: Arc<dyn TokenStore>) -> Self {
        RealTokenService {
            codec: JwtCodec::new(cfg.algorithm),
            cfg,
            store,
        }
    }

    #[inline]
    fn now() -> i64 {
        Utc::now().timestamp()
    }

    fn sign(
        &self,
        role: TokenRole,
        user_id: &UserId,
        access_id: TokenId,
        refresh_id: TokenId,
        now: i64,
    ) -> Result<IssuedToken, AuthError> {
        let (lifetime, secret, token_id, paired_token_id, on_error) = match role {
            TokenRole::Access => (
                self.cfg.access_lifetime,
                &self.cfg.access_secret,
                access_id,
                refresh_id,
                AuthError::FailedToCreateAccessToken,
            ),
            TokenRole::Refresh => (
                self.cfg.refresh_lifetime,
                &self.cfg.refresh_secret,
                refresh_id,
                access_id,
                AuthError::FailedToCreateRefreshToken,
            ),
        };
        let expires_at = now + lifetime.as_secs() as i64;
        let claims = TokenClaims {
            user_id: user_id.to_string(),
            access_uuid: access_id.to_string(),
            refresh_uuid: refresh_id.to_string(),
            exp: expires_at,
        };
        let signed_value = self.codec.issue(&claims, secret).map_err(|e| {
            warn!(%role, "signing failed: {}", e);
            on_error
        })?;

        Ok(IssuedToken {
            user_id: user_id.clone(),
            token_id,
            paired_token_id,
            expires_at,
            signed_value,
        })
    }

    /// Signature check plus claim projection; no store access.
    fn open(
        &self,
        token: &str,
        secret: &[u8],
        names: &[ClaimName],
    ) -> Result<HashMap<ClaimName, String>, AuthError> {
        let raw = self.codec.verify(token, secret)?;
        extract_claims(&raw, names)
    }

    fn ensure_not_expired(claims: &HashMap<ClaimName, String>) -> Result<(), AuthError> {
        let exp = claim(claims, ClaimName::ExpiresAt)?;
        if is_expired(exp, Self::now())? {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }
}

fn claim(claims: &HashMap<ClaimName, String>, name: ClaimName) -> Result<&str, AuthError> {
    claims
        .get(&name)
        .map(String::as_str)
        .ok_or(AuthError::ClaimMissing(name))
}

fn token_id_claim(claims: &HashMap<ClaimName, String>, name: ClaimName) -> Result<TokenId, AuthError> {
    claim(claims, name)?
        .parse::<TokenId>()
        .map_err(|_| AuthError::TokenMalformed)
}

fn user_id_claim(claims: &HashMap<ClaimName, String>) -> Result<UserId, AuthError> {
    claim(claims, ClaimName::UserId).map(UserId::from)
}

fn save_failed(error: StoreError) -> AuthError {
    warn!("saving token pair: {}", error);
    match error {
        StoreError::SaveFailed(e) | StoreError::Backend(e) => AuthError::SaveFailed(e),
        other => AuthError::SaveFailed(other.to_string()),
    }
}

fn delete_failed(error: StoreError) -> AuthError {
    warn!("deleting tokens: {}", error);
    match error {
        StoreError::DeleteFailed(e) | StoreError::Backend(e) => AuthError::DeleteFailed(e),
        other => AuthError::from(other),
    }
}

#[async_trait::async_trait]
impl TokenService for RealTokenService {
    async fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, AuthError> {
        let access_id = TokenId::new();
        let refresh_id = TokenId::new();
        let now = Self::now();

        let access = self.sign(TokenRole::Access, user_id, access_id, refresh_id, now)?;
        let refresh = self.sign(TokenRole::Refresh, user_id, access_id, refresh_id, now)?;

        // Signed tokens are dropped if the store refuses them.
        self.store
            .save_all(
                &StoredTokenRecord::from_issued(TokenRole::Access, &access),
                &StoredTokenRecord::from_issued(TokenRole::Refresh, &refresh),
            )
            .await
            .map_err(save_failed)?;

        debug!(%user_id, %access_id, %refresh_id, "issued token pair");
        Ok(TokenPair { access, refresh })
    }

    async fn verify_access(&self, access_token: &str) -> Result<VerifiedAccess, AuthError> {
        let claims = self.open(
            access_token,
            &self.cfg.access_secret,
            &[
                ClaimName::UserId,
                ClaimName::AccessTokenId,
                ClaimName::ExpiresAt,
            ],
        )?;
        let user_id = user_id_claim(&claims)?;
        let access_token_id = token_id_claim(&claims, ClaimName::AccessTokenId)?;

        // Revocation first, so a revoked token reads the same whether or not
        // it has also timed out.
        self.store
            .has_access_token(&access_token_id, access_token, &user_id)
            .await?;
        Self::ensure_not_expired(&claims)?;

        Ok(VerifiedAccess {
            user_id,
            access_token_id,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.open(
            refresh_token,
            &self.cfg.refresh_secret,
            &[
                ClaimName::UserId,
                ClaimName::AccessTokenId,
                ClaimName::RefreshTokenId,
                ClaimName::ExpiresAt,
            ],
        )?;
        let user_id = user_id_claim(&claims)?;
        let access_id = token_id_claim(&claims, ClaimName::AccessTokenId)?;
        let refresh_id = token_id_claim(&claims, ClaimName::RefreshTokenId)?;

        self.store
            .has_refresh_token(&refresh_id, refresh_token, &user_id)
            .await?;
        Self::ensure_not_expired(&claims)?;

        // Rotation: check-and-consume. Whoever removes the records owns the
        // rotation; a concurrent loser sees nothing removed.
        let removed = self
            .store
            .delete_many(&user_id, &[refresh_id, access_id])
            .await
            .map_err(delete_failed)?;
        if removed == 0 {
            debug!(%user_id, %refresh_id, "refresh token consumed concurrently");
            return Err(AuthError::TokenExpired);
        }

        let pair = self.issue_pair(&user_id).await?;
        debug!(%user_id, old = %refresh_id, new = %pair.refresh.token_id, "rotated token pair");
        Ok(pair)
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self.open(
            access_token,
            &self.cfg.access_secret,
            &[
                ClaimName::UserId,
                ClaimName::AccessTokenId,
                ClaimName::RefreshTokenId,
                ClaimName::ExpiresAt,
            ],
        )?;
        let user_id = user_id_claim(&claims)?;
        let access_id = token_id_claim(&claims, ClaimName::AccessTokenId)?;
        let refresh_id = token_id_claim(&claims, ClaimName::RefreshTokenId)?;

        self.store
            .has_access_token(&access_id, access_token, &user_id)
            .await?;
        Self::ensure_not_expired(&claims)?;

        let removed = self
            .store
            .delete_many(&user_id, &[access_id, refresh_id])
            .await
            .map_err(delete_failed)?;
        if removed == 0 {
            return Err(AuthError::TokenExpired);
        }

        info!(%user_id, %access_id, "logged out");
        Ok(())
    }

    async fn force_logout(&self, user_id: &UserId) -> Result<(), AuthError> {
        self.store
            .delete_all_for_user(user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotAuthenticated => AuthError::NotAuthenticated,
                other => delete_failed(other),
            })?;

        info!(%user_id, "force logged out");
        Ok(())
    }
}
