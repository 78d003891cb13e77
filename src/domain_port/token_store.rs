use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No live record, or the stored value differs from the presented one.
    #[error("token has expired")]
    Expired,
    #[error("user is not authenticated")]
    NotAuthenticated,
    #[error("failed to save token to storage: {0}")]
    SaveFailed(String),
    #[error("failed to delete token from storage: {0}")]
    DeleteFailed(String),
    #[error("store error: {0}")]
    Backend(String),
}

/// Revocation ledger for issued tokens.
///
/// Records are keyed by `(user_id, token_id, role)`. Absence of a record and a
/// record holding a different token string are the same outcome to callers.
/// Implementations must keep `save_all` and `delete_many` atomic under
/// concurrent callers.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Fails with [`StoreError::Expired`] unless a live record for the role
    /// holds exactly `presented`.
    async fn exists(
        &self,
        role: TokenRole,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError>;

    /// Persist both halves of a pair, or neither.
    async fn save_all(
        &self,
        access: &StoredTokenRecord,
        refresh: &StoredTokenRecord,
    ) -> Result<(), StoreError>;

    /// Remove the given ids of one user in whichever role they are stored.
    /// Returns how many records were removed.
    async fn delete_many(&self, user_id: &UserId, token_ids: &[TokenId])
    -> Result<u64, StoreError>;

    /// Remove every live record of the user. Fails with
    /// [`StoreError::NotAuthenticated`] when there was nothing to remove.
    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<(), StoreError>;

    async fn has_access_token(
        &self,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        self.exists(TokenRole::Access, token_id, presented, user_id)
            .await
    }

    async fn has_refresh_token(
        &self,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        self.exists(TokenRole::Refresh, token_id, presented, user_id)
            .await
    }
}
