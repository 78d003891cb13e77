use crate::domain_port::TokenStore;
use crate::gateway::Gateway;
use crate::infra_memory::MemoryTokenStore;
use crate::infra_mysql::MySqlTokenStore;
use crate::infra_redis::RedisTokenStore;
use crate::logger::*;
use crate::server::*;
use crate::settings::*;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub gateway: Gateway<DemoUser>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let cancel = CancellationToken::new();
        let mut pool = None;
        let mut sweeper_handle = None;

        let store: Arc<dyn TokenStore> = match settings.store.backend {
            StoreBackend::Memory => Arc::new(MemoryTokenStore::new()),
            StoreBackend::Redis => {
                let dsn = settings
                    .store
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.redis_url is required by the redis backend"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisTokenStore::new(
                    redis_manager,
                    settings.store.key_prefix.clone(),
                ))
            }
            StoreBackend::Mysql => {
                let dsn = settings
                    .store
                    .mysql_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.mysql_url is required by the mysql backend"))?;
                let mysql = Pool::<MySql>::connect(dsn).await?;
                let store = Arc::new(MySqlTokenStore::try_new(
                    mysql.clone(),
                    &settings.store.table_prefix,
                )?);
                store.migrate().await?;

                if settings.store.cleanup_interval_secs > 0 {
                    let sweeper = ExpiredTokenSweeper::new(
                        store.clone(),
                        Duration::from_secs(settings.store.cleanup_interval_secs),
                        cancel.clone(),
                    );
                    sweeper_handle = Some(tokio::spawn(async move {
                        sweeper.run().await;
                    }));
                }
                pool = Some(mysql);
                store
            }
        };
        info!(backend = ?settings.store.backend, "token store ready");

        let accounts = Arc::new(StaticAccounts::new(&settings.users));
        let auth = &settings.auth;
        let mut builder = AuthSettings::builder(
            auth.access_secret.clone(),
            accounts.clone(),
            accounts,
            store,
        );
        if let Some(algorithm) = &auth.algorithm {
            builder = builder.signing_algorithm(algorithm.clone());
        }
        if let Some(secret) = &auth.refresh_secret {
            builder = builder.refresh_secret(secret.clone());
        }
        if let Some(secs) = auth.access_lifetime_secs {
            builder = builder.access_lifetime(Duration::from_secs(secs));
        }
        if let Some(secs) = auth.refresh_lifetime_secs {
            builder = builder.refresh_lifetime(Duration::from_secs(secs));
        }
        if let Some(scheme) = &auth.header_scheme {
            builder = builder.header_scheme(scheme.clone());
        }
        let auth_settings = builder.build()?;
        debug!(?auth_settings);

        info!("server started");

        Ok(Self {
            gateway: Gateway::new(auth_settings),
            sweeper_handle: Mutex::new(sweeper_handle),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.sweeper_handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
