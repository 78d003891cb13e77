use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

const SCAN_BATCH: usize = 100;

/// Matches the hyphenated textual form of a token id.
const TOKEN_ID_GLOB: &str = "????????-????-????-????-????????????";

/// Keys look like `<prefix>:<a|r><user_id>_<token_id>` and carry the signed
/// token as value, with the remaining lifetime as TTL.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTokenStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, role: TokenRole, user_id: &UserId, token_id: &TokenId) -> String {
        token_key(&self.prefix, role, user_id, token_id)
    }
}

fn token_key(prefix: &str, role: TokenRole, user_id: &UserId, token_id: &TokenId) -> String {
    format!("{}:{}{}_{}", prefix, role.tag(), user_id, token_id)
}

/// SCAN pattern for every token of one user in either role. The token id
/// part is matched by shape so that user `1` never picks up keys of `1_2`.
fn user_pattern(prefix: &str, user_id: &UserId) -> String {
    format!(
        "{}:[ar]{}_{}",
        escape_glob(prefix),
        escape_glob(user_id.as_str()),
        TOKEN_ID_GLOB
    )
}

fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\' | '^') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn exists(
        &self,
        role: TokenRole,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let key = self.key(role, user_id, token_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match val {
            Some(stored) if stored == presented => Ok(()),
            _ => Err(StoreError::Expired),
        }
    }

    async fn save_all(
        &self,
        access: &StoredTokenRecord,
        refresh: &StoredTokenRecord,
    ) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let access_key = self.key(access.role, &access.user_id, &access.token_id);
        let refresh_key = self.key(refresh.role, &refresh.user_id, &refresh.token_id);
        let mut conn = self.conn.clone();

        // MULTI/EXEC: both keys or neither.
        let _: () = redis::pipe()
            .atomic()
            .set_ex(&access_key, &access.signed_value, access.ttl_secs(now))
            .ignore()
            .set_ex(&refresh_key, &refresh.signed_value, refresh.ttl_secs(now))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::SaveFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete_many(
        &self,
        user_id: &UserId,
        token_ids: &[TokenId],
    ) -> Result<u64, StoreError> {
        if token_ids.is_empty() {
            return Ok(0);
        }
        // The role of each id is unknown here, so both candidates go into
        // a single DEL.
        let keys: Vec<String> = token_ids
            .iter()
            .flat_map(|id| TokenRole::ALL.map(|role| self.key(role, user_id, id)))
            .collect();
        let mut conn = self.conn.clone();
        let removed: u64 = conn
            .del(&keys)
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;
        Ok(removed)
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        let pattern = user_pattern(&self.prefix, user_id);
        let mut conn = self.conn.clone();

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        if keys.is_empty() {
            return Err(StoreError::NotAuthenticated);
        }
        // SCAN may report a key more than once.
        keys.sort();
        keys.dedup();

        // Keys can lapse between SCAN and DEL.
        let removed: u64 = conn
            .del(&keys)
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;
        if removed == 0 {
            return Err(StoreError::NotAuthenticated);
        }
        Ok(())
    }
}
