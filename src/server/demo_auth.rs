use crate::application_port::*;
use crate::domain_model::UserId;
use crate::settings::Account;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoUser {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub admin: bool,
}

/// Username/password accounts fixed in the settings file. Serves both as
/// the login authenticator and the user resolver.
pub struct StaticAccounts {
    passwords: HashMap<String, (String, UserId)>,
    users: HashMap<UserId, DemoUser>,
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

impl StaticAccounts {
    pub fn new(accounts: &[Account]) -> Self {
        let mut passwords = HashMap::new();
        let mut users = HashMap::new();
        for account in accounts {
            let user_id = UserId::from(account.user_id.as_str());
            passwords.insert(
                account.username.clone(),
                (account.password.clone(), user_id.clone()),
            );
            users.insert(
                user_id.clone(),
                DemoUser {
                    user_id,
                    username: account.username.clone(),
                    display_name: account.display_name.clone(),
                    admin: account.admin,
                },
            );
        }
        StaticAccounts { passwords, users }
    }
}

#[async_trait::async_trait]
impl Authenticator for StaticAccounts {
    async fn authenticate(&self, request: &LoginRequest) -> Result<UserId, RejectedCredentials> {
        let credentials: Credentials = request
            .json()
            .map_err(|_| RejectedCredentials("missing username or password".to_string()))?;

        match self.passwords.get(&credentials.username) {
            Some((password, user_id)) if *password == credentials.password => Ok(user_id.clone()),
            _ => Err(RejectedCredentials(
                "incorrect username or password".to_string(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl UserResolver for StaticAccounts {
    type User = DemoUser;

    async fn resolve(&self, user_id: &UserId) -> anyhow::Result<DemoUser> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown user {}", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::http::HeaderMap;

    fn accounts() -> StaticAccounts {
        StaticAccounts::new(&[Account {
            user_id: "7".to_string(),
            username: "alice".to_string(),
            password: "wonderland".to_string(),
            display_name: "Alice".to_string(),
            admin: false,
        }])
    }

    fn request(body: &'static str) -> LoginRequest {
        LoginRequest {
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn test_authenticate() {
        let accounts = accounts();
        let user_id = accounts
            .authenticate(&request(r#"{"username":"alice","password":"wonderland"}"#))
            .await
            .unwrap();
        assert_eq!(user_id, UserId::from("7"));

        let wrong = accounts
            .authenticate(&request(r#"{"username":"alice","password":"queen"}"#))
            .await;
        assert_eq!(wrong.unwrap_err().0, "incorrect username or password");

        let garbage = accounts.authenticate(&request("not json")).await;
        assert_eq!(garbage.unwrap_err().0, "missing username or password");
    }

    #[tokio::test]
    async fn test_resolve() {
        let accounts = accounts();
        let user = accounts.resolve(&UserId::from("7")).await.unwrap();
        assert_eq!(user.display_name, "Alice");
        assert!(accounts.resolve(&UserId::from("8")).await.is_err());
    }
}
