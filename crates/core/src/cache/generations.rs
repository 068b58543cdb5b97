//! Generation bookkeeping: create, enumerate and delete cache generations.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Create a generation row. Returns false if it already existed.
    pub async fn create_generation(&self, label: &str) -> Result<bool, Error> {
        let label = label.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO generations (label, created_at) VALUES (?1, ?2)",
                    params![label, created_at],
                )?;
                Ok(inserted == 1)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn generation_exists(&self, label: &str) -> Result<bool, Error> {
        let label = label.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE label = ?1)",
                    params![label],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Generation labels ordered by creation.
    pub async fn list_generation_labels(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT label FROM generations ORDER BY created_at ASC, rowid ASC")?;
                let labels = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(labels)
            })
            .await
            .map_err(Error::from)
    }

    /// Mark `label` as the only active generation, in one transaction.
    ///
    /// Fails with `Error::Lifecycle` if the generation is not stored.
    pub async fn activate_generation(&self, label: &str) -> Result<(), Error> {
        let label = label.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("UPDATE generations SET active = 0 WHERE active = 1 AND label != ?1", params![label])?;
                let marked = tx.execute("UPDATE generations SET active = 1 WHERE label = ?1", params![label])?;
                if marked == 0 {
                    return Err(Error::Lifecycle(format!("generation {label} is not stored")));
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// The generation currently marked active, if any.
    pub async fn active_generation_label(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT label FROM generations WHERE active = 1")?;
                let label = stmt.query_map([], |row| row.get(0))?.next().transpose()?;
                Ok(label)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and its entries in one transaction.
    ///
    /// Returns true if the generation existed.
    pub async fn delete_generation(&self, label: &str) -> Result<bool, Error> {
        let label = label.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![label])?;
                let deleted = tx.execute("DELETE FROM generations WHERE label = ?1", params![label])?;
                tx.commit()?;
                Ok(deleted == 1)
            })
            .await
            .map_err(Error::from)
    }
}
