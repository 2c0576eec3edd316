//! Named, request-keyed response storage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::resource::{Request, Response};

/// Metadata about one stored response, without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryInfo {
    pub store: String,
    /// Request method and URL the entry is keyed by.
    pub method: String,
    pub url: String,
    pub status: u16,
    pub response_type: String,
    pub content_type: Option<String>,
    pub body_bytes: u64,
    pub stored_at: String,
}

/// Persistent cache storage made of named stores.
///
/// Each operation is atomic on its own; callers never read-modify-write a key.
/// Stores are remembered in creation order and [`match_any`](Self::match_any)
/// searches them oldest first.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Whether the named store exists.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Names of all stores, in creation order.
    async fn names(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and every entry in it. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look `request` up in every store.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Look `request` up in one store.
    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Store `response` under `request`, creating the store if needed.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store several entries at once; either all are written or none are.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Entry metadata for every stored request in the named store.
    async fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, Error>;

    /// Entry metadata for `request` in whichever store matches first.
    async fn lookup(&self, request: &Request) -> Result<Option<EntryInfo>, Error>;
}

pub(crate) fn entry_info(store: &str, method: &str, url: &str, response: &Response, stored_at: &str) -> EntryInfo {
    EntryInfo {
        store: store.to_string(),
        method: method.to_string(),
        url: url.to_string(),
        status: response.status,
        response_type: response.response_type.as_str().to_string(),
        content_type: response.content_type().map(str::to_string),
        body_bytes: response.body.len() as u64,
        stored_at: stored_at.to_string(),
    }
}

#[async_trait]
impl CacheStorage for super::CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.open_store(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.has_store(name).await
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_store(name).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.match_request(request).await
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.match_in_store(name, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.put_entries(name, entries).await
    }

    async fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, Error> {
        self.list_entries(name).await
    }

    async fn lookup(&self, request: &Request) -> Result<Option<EntryInfo>, Error> {
        self.lookup_entry(request).await
    }
}
