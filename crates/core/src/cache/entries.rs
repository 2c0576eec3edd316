//! Stored response CRUD operations.
//!
//! Entries are keyed by (store, request key). Writes are upserts of a freshly
//! fetched response; nothing here reads an entry back before replacing it.

use super::connection::CacheDb;
use super::storage::EntryInfo;
use crate::Error;
use crate::resource::{Request, Response, ResponseType};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

type Headers = Vec<(String, String)>;

/// Owned copy of an entry, ready to move onto the database thread.
struct NewEntry {
    key: String,
    method: String,
    url: String,
    response_url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: &'static str,
}

impl NewEntry {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Self {
            key: request.key(),
            method: request.method.clone(),
            url: request.match_url().to_string(),
            response_url: response.url.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json,
            body: response.body.to_vec(),
            response_type: response.response_type.as_str(),
        })
    }
}

fn insert_entry(conn: &rusqlite::Connection, store: &str, entry: &NewEntry, stored_at: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
        params![store, stored_at],
    )?;
    let store_id: i64 = conn.query_row("SELECT id FROM stores WHERE name = ?1", params![store], |row| row.get(0))?;

    conn.execute(
        "INSERT INTO entries (
            store_id, key, method, url, response_url, status, status_text,
            headers_json, body, response_type, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(store_id, key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            response_url = excluded.response_url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            response_type = excluded.response_type,
            stored_at = excluded.stored_at",
        params![
            store_id,
            &entry.key,
            &entry.method,
            &entry.url,
            &entry.response_url,
            entry.status,
            &entry.status_text,
            &entry.headers_json,
            &entry.body,
            entry.response_type,
            stored_at,
        ],
    )?;
    Ok(())
}

/// Columns needed to rebuild a [`Response`], prefixed for the `entries e` alias.
const RESPONSE_COLUMNS: &str = "e.response_url, e.status, e.status_text, e.headers_json, e.body, e.response_type";

struct StoredRow {
    response_url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: String,
}

impl StoredRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            response_url: row.get(0)?,
            status: row.get(1)?,
            status_text: row.get(2)?,
            headers_json: row.get(3)?,
            body: row.get(4)?,
            response_type: row.get(5)?,
        })
    }

    fn into_response(self) -> Result<Response, Error> {
        let headers: Headers =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Response {
            url: self.response_url,
            status: self.status,
            status_text: self.status_text,
            headers,
            body: Bytes::from(self.body),
            response_type: ResponseType::parse(&self.response_type)?,
        })
    }
}

fn content_type_of(headers_json: &str) -> Option<String> {
    let headers: Headers = serde_json::from_str(headers_json).ok()?;
    headers
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v)
}

fn read_info(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryInfo> {
    let headers_json: String = row.get(5)?;
    Ok(EntryInfo {
        store: row.get(0)?,
        method: row.get(1)?,
        url: row.get(2)?,
        status: row.get(3)?,
        response_type: row.get(4)?,
        content_type: content_type_of(&headers_json),
        body_bytes: row.get::<_, i64>(6)? as u64,
        stored_at: row.get(7)?,
    })
}

const INFO_COLUMNS: &str =
    "s.name, e.method, e.url, e.status, e.response_type, e.headers_json, length(e.body), e.stored_at";

impl CacheDb {
    /// Find `request` in any store, oldest store first.
    ///
    /// Returns None on a miss.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!(
                    "SELECT {RESPONSE_COLUMNS} FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE e.key = ?1 ORDER BY s.id ASC LIMIT 1"
                );
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![key], StoredRow::read) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::into_response).transpose()
    }

    /// Find `request` in the named store only.
    pub async fn match_in_store(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.key();
        let store = store.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!(
                    "SELECT {RESPONSE_COLUMNS} FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE s.name = ?1 AND e.key = ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![store, key], StoredRow::read) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(StoredRow::into_response).transpose()
    }

    /// Insert or replace one entry, creating the store if needed.
    pub async fn put_entry(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let entry = NewEntry::new(request, response)?;
        let store = store.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert_entry(conn, &store, &entry, &stored_at) })
            .await
            .map_err(Error::from)
    }

    /// Insert several entries in one transaction.
    pub async fn put_entries(&self, store: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(req, resp)| NewEntry::new(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let store = store.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, stored_at],
                )?;
                for entry in &rows {
                    insert_entry(&tx, &store, entry, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata for every entry in the named store, in URL order.
    pub async fn list_entries(&self, store: &str) -> Result<Vec<EntryInfo>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryInfo>, Error> {
                let sql = format!(
                    "SELECT {INFO_COLUMNS} FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE s.name = ?1 ORDER BY e.url ASC, e.method ASC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let infos = stmt
                    .query_map(params![store], read_info)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata for `request` from the first store that holds it.
    pub async fn lookup_entry(&self, request: &Request) -> Result<Option<EntryInfo>, Error> {
        let key = request.key();
        self.conn
            .call(move |conn| -> Result<Option<EntryInfo>, Error> {
                let sql = format!(
                    "SELECT {INFO_COLUMNS} FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE e.key = ?1 ORDER BY s.id ASC LIMIT 1"
                );
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![key], read_info) {
                    Ok(info) => Ok(Some(info)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("https://example.com").unwrap().join(path).unwrap())
    }

    fn response(path: &str, body: &'static [u8]) -> Response {
        Response {
            url: format!("https://example.com{path}"),
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), "text/css".to_string())],
            body: Bytes::from_static(body),
            response_type: ResponseType::Basic,
        }
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/static/css/style.css");
        let resp = response("/static/css/style.css", b"body{}");

        db.put_entry("v1", &req, &resp).await.unwrap();

        let found = db.match_request(&req).await.unwrap().unwrap();
        assert_eq!(found, resp);
        assert!(db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_request(&request("/nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_is_method_specific() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/");
        db.put_entry("v1", &req, &response("/", b"home")).await.unwrap();

        let head = req.clone().with_method("HEAD");
        assert!(db.match_request(&head).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/");
        db.put_entry("v1", &req, &response("/", b"old")).await.unwrap();
        db.put_entry("v2", &req, &response("/", b"new")).await.unwrap();

        let found = db.match_request(&req).await.unwrap().unwrap();
        assert_eq!(&found.body[..], b"old");

        let in_v2 = db.match_in_store("v2", &req).await.unwrap().unwrap();
        assert_eq!(&in_v2.body[..], b"new");
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/");
        db.put_entry("v1", &req, &response("/", b"first")).await.unwrap();
        db.put_entry("v1", &req, &response("/", b"second")).await.unwrap();

        let found = db.match_in_store("v1", &req).await.unwrap().unwrap();
        assert_eq!(&found.body[..], b"second");
        assert_eq!(db.list_entries("v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_store_drops_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/");
        db.put_entry("v1", &req, &response("/", b"home")).await.unwrap();

        db.delete_store("v1").await.unwrap();
        assert!(db.match_request(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_entries_and_list() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (request("/"), response("/", b"home")),
            (request("/static/css/style.css"), response("/static/css/style.css", b"body{}")),
        ];
        db.put_entries("v1", &entries).await.unwrap();

        let infos = db.list_entries("v1").await.unwrap();
        let urls: Vec<&str> = infos.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/", "https://example.com/static/css/style.css"]);
        assert_eq!(infos[1].body_bytes, 6);
        assert_eq!(infos[1].content_type.as_deref(), Some("text/css"));
        assert_eq!(infos[1].response_type, "basic");
    }

    #[tokio::test]
    async fn test_lookup_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/offline/");
        db.put_entry("v1", &req, &response("/offline/", b"offline")).await.unwrap();

        let info = db.lookup_entry(&req).await.unwrap().unwrap();
        assert_eq!(info.store, "v1");
        assert_eq!(info.method, "GET");
        assert!(db.lookup_entry(&request("/other")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_entries_rolls_back_on_failure() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_broken BEFORE INSERT ON entries
                     WHEN NEW.url LIKE '%/broken.css'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
            })
            .await
            .unwrap();

        let batch = vec![
            (request("/"), response("/", b"<h1>Dashboard</h1>")),
            (request("/broken.css"), response("/broken.css", b"body{}")),
        ];
        assert!(db.put_entries("v1", &batch).await.is_err());

        assert!(db.list_entries("v1").await.unwrap().is_empty());
        assert!(db.match_request(&request("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fragment_matches_stored_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &request("/"), &response("/", b"home")).await.unwrap();

        let hit = db.match_request(&request("/#top")).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"home"));
        assert_eq!(db.list_entries("v1").await.unwrap()[0].url, "https://example.com/");
    }
}
