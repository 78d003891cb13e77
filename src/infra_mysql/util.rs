use crate::domain_port::StoreError;

const TABLE_SUFFIX: &str = "auth_token";

/// Builds the token table name. The prefix ends up inside SQL text, so only
/// ASCII letters, digits and underscores are accepted.
pub fn table_name(prefix: &str) -> Result<String, StoreError> {
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(StoreError::Backend(format!(
            "invalid table prefix: {prefix:?}"
        )));
    }
    Ok(format!("{prefix}{TABLE_SUFFIX}"))
}
