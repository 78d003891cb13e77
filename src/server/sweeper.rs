use crate::infra_mysql::MySqlTokenStore;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically purges lapsed rows from a store that has no native expiry.
pub struct ExpiredTokenSweeper {
    store: Arc<MySqlTokenStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl ExpiredTokenSweeper {
    pub fn new(
        store: Arc<MySqlTokenStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            interval,
            cancellation_token,
        }
    }

    async fn tick_once(&self) {
        tokio::time::sleep(self.interval).await;
        match self.store.delete_expired().await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "purged expired tokens"),
            Err(e) => warn!("purging expired tokens: {}", e),
        }
    }

    pub async fn run(&self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    info!("token sweeper shutting down...");
                    break;
                }
                _ = self.tick_once() => {}
            }
        }
    }
}
