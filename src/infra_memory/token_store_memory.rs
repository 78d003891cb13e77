use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::collections::HashMap;

type UserTokens = HashMap<(TokenRole, TokenId), StoredTokenRecord>;

/// Process-local store. Each user's records live under one map entry, so a
/// write or delete touching several of them happens under a single shard
/// lock. Records never lapse on their own.
#[derive(Default)]
pub struct MemoryTokenStore {
    users: DashMap<UserId, UserTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self, user_id: &UserId) -> usize {
        self.users.get(user_id).map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn exists(
        &self,
        role: TokenRole,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let tokens = self.users.get(user_id).ok_or(StoreError::Expired)?;
        match tokens.get(&(role, *token_id)) {
            Some(record) if record.signed_value == presented => Ok(()),
            _ => Err(StoreError::Expired),
        }
    }

    async fn save_all(
        &self,
        access: &StoredTokenRecord,
        refresh: &StoredTokenRecord,
    ) -> Result<(), StoreError> {
        if access.user_id != refresh.user_id {
            return Err(StoreError::SaveFailed(
                "token pair spans two users".to_string(),
            ));
        }
        let mut tokens = self.users.entry(access.user_id.clone()).or_default();
        tokens.insert((access.role, access.token_id), access.clone());
        tokens.insert((refresh.role, refresh.token_id), refresh.clone());
        Ok(())
    }

    async fn delete_many(
        &self,
        user_id: &UserId,
        token_ids: &[TokenId],
    ) -> Result<u64, StoreError> {
        let removed = match self.users.get_mut(user_id) {
            Some(mut tokens) => {
                let before = tokens.len();
                tokens.retain(|(_, id), _| !token_ids.contains(id));
                (before - tokens.len()) as u64
            }
            None => 0,
        };
        self.users.remove_if(user_id, |_, tokens| tokens.is_empty());
        Ok(removed)
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        match self.users.remove(user_id) {
            Some((_, tokens)) if !tokens.is_empty() => Ok(()),
            _ => Err(StoreError::NotAuthenticated),
        }
    }
}
