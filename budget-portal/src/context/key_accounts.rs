//! Process-wide key-account cache.
//!
//! Many screens need the account catalog; fetching it once and sharing the
//! copy keeps the dropdowns snappy. Writes go through `upsert`, which
//! invalidates the cache so the next read refetches.

use tokio::sync::RwLock;

use crate::models::key_account::{KeyAccount, KeyAccountUpsert};
use crate::services::api_client::ApiError;
use crate::services::key_accounts::KeyAccountClient;

#[derive(Default)]
struct CatalogCache {
    accounts: Option<Vec<KeyAccount>>,
    usage: Option<Vec<KeyAccount>>,
}

pub struct KeyAccountStore {
    client: KeyAccountClient,
    cache: RwLock<CatalogCache>,
}

impl KeyAccountStore {
    pub fn new(client: KeyAccountClient) -> Self {
        Self {
            client,
            cache: RwLock::new(CatalogCache::default()),
        }
    }

    /// The plain catalog, cached after the first fetch.
    pub async fn accounts(&self, token: &str) -> Result<Vec<KeyAccount>, ApiError> {
        if let Some(cached) = self.cache.read().await.accounts.clone() {
            return Ok(cached);
        }
        let fresh = self.client.list(token).await?;
        self.cache.write().await.accounts = Some(fresh.clone());
        Ok(fresh)
    }

    /// The usage-enriched catalog, cached after the first fetch.
    pub async fn usage(&self, token: &str) -> Result<Vec<KeyAccount>, ApiError> {
        if let Some(cached) = self.cache.read().await.usage.clone() {
            return Ok(cached);
        }
        let fresh = self.client.list_with_usage(token).await?;
        self.cache.write().await.usage = Some(fresh.clone());
        Ok(fresh)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = CatalogCache::default();
    }

    /// Write-through upsert: the backend is the source of truth, so the
    /// cache is dropped rather than patched.
    pub async fn upsert(&self, payload: &KeyAccountUpsert, token: &str) -> Result<(), ApiError> {
        self.client.upsert(payload, token).await?;
        self.invalidate().await;
        Ok(())
    }
}
