use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub store: Store,
    #[serde(default)]
    pub users: Vec<Account>,
}

#[derive(Deserialize)]
pub struct Auth {
    pub algorithm: Option<String>,
    pub access_secret: String,
    pub refresh_secret: Option<String>,
    pub access_lifetime_secs: Option<u64>,
    pub refresh_lifetime_secs: Option<u64>,
    pub header_scheme: Option<String>,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("algorithm", &self.algorithm)
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .field("header_scheme", &self.header_scheme)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
    Mysql,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: StoreBackend,
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    pub mysql_url: Option<String>,
    #[serde(default)]
    pub table_prefix: String,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_key_prefix() -> String {
    "countersign".to_string()
}

fn default_cleanup_interval() -> u64 {
    300
}

/// Static account served by the demo authenticator.
#[derive(Deserialize)]
pub struct Account {
    pub user_id: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub admin: bool,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "COUNTERSIGN";

/// Loads the settings file, then lets `COUNTERSIGN__<SECTION>__<KEY>`
/// variables override individual values.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SAMPLE: &str = r#"
[http]
address = "127.0.0.1:8080"

[log]
filter = "info"

[auth]
access_secret = "s3cret"
access_lifetime_secs = 60

[store]
backend = "redis"
redis_url = "redis://127.0.0.1/"

[[users]]
user_id = "1"
username = "alice"
password = "wonderland"
display_name = "Alice"
"#;

    #[test]
    fn test_deserialize_sample() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(SAMPLE, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.auth.access_lifetime_secs, Some(60));
        assert_eq!(settings.auth.refresh_secret, None);
        assert_eq!(settings.store.backend, StoreBackend::Redis);
        assert_eq!(settings.store.key_prefix, "countersign");
        assert_eq!(settings.store.cleanup_interval_secs, 300);
        assert_eq!(settings.users.len(), 1);
        assert_eq!(settings.users[0].username, "alice");
        assert!(!settings.users[0].admin);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(SAMPLE, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let printed = format!("{settings:?}");
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("wonderland"));
    }
}
