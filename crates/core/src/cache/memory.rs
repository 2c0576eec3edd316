//! In-memory cache storage.
//!
//! Used when `db_path` is `:memory:` and throughout the worker tests.
//! Nothing survives the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::storage::{CacheStorage, EntryInfo, entry_info};
use crate::Error;
use crate::resource::{Request, Response};

struct StoredEntry {
    method: String,
    url: String,
    response: Response,
    stored_at: String,
}

#[derive(Default)]
struct Store {
    entries: BTreeMap<String, StoredEntry>,
}

/// Cache storage held in a [`RwLock`], stores kept in creation order.
#[derive(Default)]
pub struct MemoryStorage {
    stores: RwLock<Vec<(String, Store)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find<'a>(stores: &'a [(String, Store)], name: &str) -> Option<&'a Store> {
    stores.iter().find(|(n, _)| n == name).map(|(_, s)| s)
}

fn find_or_create<'a>(stores: &'a mut Vec<(String, Store)>, name: &str) -> &'a mut Store {
    let idx = match stores.iter().position(|(n, _)| n == name) {
        Some(idx) => idx,
        None => {
            stores.push((name.to_string(), Store::default()));
            stores.len() - 1
        }
    };
    &mut stores[idx].1
}

fn stored(request: &Request, response: &Response) -> StoredEntry {
    StoredEntry {
        method: request.method.clone(),
        url: request.match_url().to_string(),
        response: response.duplicate(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

fn info(store: &str, entry: &StoredEntry) -> EntryInfo {
    entry_info(store, &entry.method, &entry.url, &entry.response, &entry.stored_at)
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        find_or_create(&mut stores, name);
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(find(&self.stores.read().await, name).is_some())
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(n, _)| n != name);
        Ok(stores.len() != before)
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.key();
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find_map(|(_, s)| s.entries.get(&key))
            .map(|e| e.response.duplicate()))
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.key();
        let stores = self.stores.read().await;
        Ok(find(&stores, name)
            .and_then(|s| s.entries.get(&key))
            .map(|e| e.response.duplicate()))
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        find_or_create(&mut stores, name)
            .entries
            .insert(request.key(), stored(request, response));
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let store = find_or_create(&mut stores, name);
        for (request, response) in entries {
            store.entries.insert(request.key(), stored(request, response));
        }
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, Error> {
        let stores = self.stores.read().await;
        let mut infos: Vec<EntryInfo> = find(&stores, name)
            .map(|s| s.entries.values().map(|e| info(name, e)).collect())
            .unwrap_or_default();
        infos.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.method.cmp(&b.method)));
        Ok(infos)
    }

    async fn lookup(&self, request: &Request) -> Result<Option<EntryInfo>, Error> {
        let key = request.key();
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find_map(|(name, s)| s.entries.get(&key).map(|e| info(name, e))))
    }
}
