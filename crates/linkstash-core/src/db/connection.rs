//! libSQL connection for the bookmark store

use std::path::Path;

use libsql::{Builder, Connection};

use super::migrations;
use crate::error::Result;

const IN_MEMORY: &str = ":memory:";

/// An open, migrated bookmark database.
pub struct Database {
    // Keeps the database alive for as long as the connection is used.
    _db: libsql::Database,
    conn: Connection,
}

impl Database {
    /// Open (or create) the bookmark database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        tracing::debug!("Opening bookmark database file {path}");
        Self::build(&path).await
    }

    /// Open a throwaway database that lives only as long as this value.
    pub async fn open_in_memory() -> Result<Self> {
        Self::build(IN_MEMORY).await
    }

    async fn build(location: &str) -> Result<Self> {
        let db = Builder::new_local(location).build().await?;
        let conn = db.connect()?;
        let database = Self { _db: db, conn };

        if location != IN_MEMORY {
            database
                .conn
                .execute("PRAGMA journal_mode = WAL;", ())
                .await
                .ok();
        }
        migrations::run(&database.conn).await?;
        Ok(database)
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
