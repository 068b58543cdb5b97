//! Entry reads and whole-response writes within a generation.

use super::connection::CacheDb;
use super::hash::CacheKey;
use crate::Error;
use crate::response::ResponseSnapshot;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Inspection metadata for a stored entry (no body).
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body_len: u64,
    pub stored_at: String,
}

impl CacheDb {
    /// Insert or replace an entry.
    ///
    /// A single UPSERT statement, so readers see either the old or the new
    /// response and never a mix. Fails if the generation does not exist.
    pub async fn put_entry(&self, generation: &str, key: &CacheKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::Storage(format!("failed to encode headers: {e}")))?;
        let generation = generation.to_string();
        let key = key.clone();
        let status = response.status;
        let content_type = response.content_type().map(str::to_string);
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                    generation, key_hash, method, url, status_code,
                    content_type, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(generation, key_hash) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status_code = excluded.status_code,
                    content_type = excluded.content_type,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &generation,
                        key.hash(),
                        key.method(),
                        key.url(),
                        status,
                        &content_type,
                        &headers_json,
                        &body,
                        &stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key. Returns None on a miss.
    pub async fn get_entry(&self, generation: &str, key: &CacheKey) -> Result<Option<ResponseSnapshot>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash().to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, u16, String, Vec<u8>)>, Error> {
                let result = conn.query_row(
                    "SELECT url, status_code, headers_json, body
                     FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![generation, key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((url, status, headers_json, body)) = row else {
            return Ok(None);
        };

        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
            .map_err(|e| Error::Storage(format!("corrupt headers for {url}: {e}")))?;

        Ok(Some(ResponseSnapshot { url, status, headers, body: body.into() }))
    }

    /// List entry metadata for a generation, ordered by URL.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<CachedEntry>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status_code, content_type, length(body), stored_at
                     FROM entries WHERE generation = ?1 ORDER BY url ASC, method ASC",
                )?;
                let entries = stmt
                    .query_map(params![generation], |row| {
                        Ok(CachedEntry {
                            key_hash: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status_code: row.get(3)?,
                            content_type: row.get(4)?,
                            body_len: row.get::<_, i64>(5)? as u64,
                            stored_at: row.get(6)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(url: &str) -> CacheKey {
        CacheKey::get(&Url::parse(url).unwrap())
    }

    fn page(url: &str, body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(url, 200, body.to_string()).with_header("Content-Type", "text/html")
    }

    async fn db_with(generation: &str) -> CacheDb {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_generation(generation).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = db_with("v1").await;
        let k = key("https://example.com/index.html");
        let resp = page("https://example.com/index.html", "<h1>hi</h1>");

        db.put_entry("v1", &k, &resp).await.unwrap();

        let stored = db.get_entry("v1", &k).await.unwrap().unwrap();
        assert_eq!(stored, resp);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = db_with("v1").await;
        let result = db.get_entry("v1", &key("https://example.com/nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let db = db_with("v1").await;
        let k = key("https://example.com/data.json");
        let first = ResponseSnapshot::new("https://example.com/data.json", 200, "{\"v\":1}")
            .with_header("Content-Type", "application/json")
            .with_header("ETag", "\"one\"");
        let second = ResponseSnapshot::new("https://example.com/data.json", 200, "{\"v\":2}");

        db.put_entry("v1", &k, &first).await.unwrap();
        db.put_entry("v1", &k, &second).await.unwrap();

        let stored = db.get_entry("v1", &k).await.unwrap().unwrap();
        assert_eq!(stored, second);
        assert!(stored.header("etag").is_none());
        assert_eq!(db.entry_count("v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let db = db_with("v1").await;
        db.create_generation("v2").await.unwrap();
        let k = key("https://example.com/");

        db.put_entry("v1", &k, &page("https://example.com/", "old")).await.unwrap();

        assert!(db.get_entry("v2", &k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_into_missing_generation_fails() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db
            .put_entry("ghost", &key("https://example.com/"), &page("https://example.com/", "x"))
            .await;
        assert!(matches!(result, Err(ref e) if e.is_storage()));
    }

    #[tokio::test]
    async fn test_delete_generation_drops_entries() {
        let db = db_with("v1").await;
        let k = key("https://example.com/");
        db.put_entry("v1", &k, &page("https://example.com/", "x")).await.unwrap();

        db.delete_generation("v1").await.unwrap();

        assert_eq!(db.entry_count("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_entries() {
        let db = db_with("v1").await;
        db.put_entry("v1", &key("https://example.com/b"), &page("https://example.com/b", "bb"))
            .await
            .unwrap();
        db.put_entry("v1", &key("https://example.com/a"), &page("https://example.com/a", "a"))
            .await
            .unwrap();

        let entries = db.list_entries("v1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://example.com/a");
        assert_eq!(entries[0].body_len, 1);
        assert_eq!(entries[1].content_type.as_deref(), Some("text/html"));
        assert_eq!(entries[1].method, "GET");
    }
}
