use super::util::table_name;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use sqlx::MySqlPool;

/// Relational store: one row per live token. Rows whose `expires_at` has
/// passed are treated as absent and removed by [`MySqlTokenStore::delete_expired`].
pub struct MySqlTokenStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlTokenStore {
    pub fn try_new(pool: MySqlPool, table_prefix: &str) -> Result<Self, StoreError> {
        Ok(MySqlTokenStore {
            pool,
            table: table_name(table_prefix)?,
        })
    }

    #[inline]
    fn id_as_bytes(id: &TokenId) -> &[u8] {
        id.0.as_bytes()
    }

    /// Create the token table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let sql = format!(
            r#"
CREATE TABLE IF NOT EXISTS {t} (
    token_id   BINARY(16)   NOT NULL PRIMARY KEY,
    user_id    VARCHAR(191) NOT NULL,
    role       VARCHAR(16)  NOT NULL,
    token      TEXT         NOT NULL,
    expires_at BIGINT       NOT NULL,
    created_at TIMESTAMP(3) NOT NULL DEFAULT CURRENT_TIMESTAMP(3),
    INDEX idx_{t}_user (user_id),
    INDEX idx_{t}_expires (expires_at)
)
"#,
            t = self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Purge rows past their expiry. Returns the number removed.
    pub async fn delete_expired(&self) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE expires_at <= ?", self.table);
        let result = sqlx::query(&sql)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn exists(
        &self,
        role: TokenRole,
        token_id: &TokenId,
        presented: &str,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let sql = format!(
            r#"
SELECT token
FROM {}
WHERE token_id = ? AND user_id = ? AND role = ? AND expires_at > ?
"#,
            self.table
        );
        let stored: Option<String> = sqlx::query_scalar(&sql)
            .bind(Self::id_as_bytes(token_id))
            .bind(user_id.as_str())
            .bind(role.as_str())
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match stored {
            Some(token) if token == presented => Ok(()),
            _ => Err(StoreError::Expired),
        }
    }

    async fn save_all(
        &self,
        access: &StoredTokenRecord,
        refresh: &StoredTokenRecord,
    ) -> Result<(), StoreError> {
        let sql = format!(
            r#"
INSERT INTO {} (token_id, user_id, role, token, expires_at)
VALUES (?, ?, ?, ?, ?)
"#,
            self.table
        );
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::SaveFailed(e.to_string()))?;

        for record in [access, refresh] {
            sqlx::query(&sql)
                .bind(Self::id_as_bytes(&record.token_id))
                .bind(record.user_id.as_str())
                .bind(record.role.as_str())
                .bind(&record.signed_value)
                .bind(record.expires_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::SaveFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::SaveFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete_many(
        &self,
        user_id: &UserId,
        token_ids: &[TokenId],
    ) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE user_id = ? AND token_id = ?", self.table);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        let mut removed = 0;
        for id in token_ids {
            let result = sqlx::query(&sql)
                .bind(user_id.as_str())
                .bind(Self::id_as_bytes(id))
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;
            removed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;
        Ok(removed)
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = ? AND expires_at > ? FOR UPDATE",
            self.table
        );
        let delete_sql = format!("DELETE FROM {} WHERE user_id = ?", self.table);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        // Lapsed rows the sweeper has not reached yet do not count as a session.
        let live: i64 = sqlx::query_scalar(&count_sql)
            .bind(user_id.as_str())
            .bind(Utc::now().timestamp())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        sqlx::query(&delete_sql)
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        if live == 0 {
            return Err(StoreError::NotAuthenticated);
        }
        Ok(())
    }
}
