//! Bookmark repository implementation

use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{BookmarkId, BookmarkRecord, OwnerId};
use crate::services::BookmarkPersistence;
use crate::validation::NormalizedUrl;

/// libSQL implementation of `BookmarkPersistence`
pub struct LibSqlBookmarkRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlBookmarkRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a bookmark from a database row
    fn parse_record(row: &libsql::Row) -> Result<BookmarkRecord> {
        let id: String = row.get(0)?;
        let owner_id: String = row.get(1)?;
        let created_at: i64 = row.get(4)?;

        Ok(BookmarkRecord {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid bookmark id: {id}")))?,
            owner_id: owner_id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid owner id: {owner_id}")))?,
            title: row.get(2)?,
            url: row.get(3)?,
            created_at: DateTime::<Utc>::from_timestamp_millis(created_at)
                .ok_or_else(|| Error::Database(format!("Invalid timestamp: {created_at}")))?,
        })
    }
}

impl BookmarkPersistence for LibSqlBookmarkRepository<'_> {
    async fn create(
        &self,
        owner: &OwnerId,
        title: &str,
        url: &NormalizedUrl,
    ) -> Result<BookmarkRecord> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Bookmark title cannot be empty".into()));
        }

        // Stored at millisecond precision, so stamp the record the same way.
        let now = Utc::now().timestamp_millis();
        let record = BookmarkRecord {
            id: BookmarkId::new(),
            owner_id: *owner,
            title: title.to_string(),
            url: url.as_str().to_string(),
            created_at: DateTime::<Utc>::from_timestamp_millis(now).unwrap_or_default(),
        };

        self.conn
            .execute(
                "INSERT INTO bookmarks (id, user_id, title, url, created_at) VALUES (?, ?, ?, ?, ?)",
                params![
                    record.id.as_str(),
                    record.owner_id.as_str(),
                    record.title.clone(),
                    record.url.clone(),
                    now
                ],
            )
            .await?;

        Ok(record)
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<BookmarkRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, title, url, created_at
                 FROM bookmarks
                 WHERE user_id = ?
                 ORDER BY created_at DESC, rowid DESC",
                params![owner.as_str()],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    async fn delete(&self, id: &BookmarkId, owner: &OwnerId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM bookmarks WHERE id = ? AND user_id = ?",
                params![id.as_str(), owner.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::validation::normalize_url;
    use pretty_assertions::assert_eq;

    fn url(raw: &str) -> NormalizedUrl {
        normalize_url(raw).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_then_list_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlBookmarkRepository::new(db.connection());
        let owner = OwnerId::new();

        let first = repo.create(&owner, "First", &url("first.com")).await.unwrap();
        let second = repo.create(&owner, " Second ", &url("second.com")).await.unwrap();
        assert_eq!(second.title, "Second");

        let listed = repo.list(&owner).await.unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_is_scoped_to_owner() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlBookmarkRepository::new(db.connection());
        let owner = OwnerId::new();

        repo.create(&OwnerId::new(), "Other", &url("other.com"))
            .await
            .unwrap();
        assert!(repo.list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_requires_matching_owner() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlBookmarkRepository::new(db.connection());
        let owner = OwnerId::new();
        let record = repo.create(&owner, "Mine", &url("mine.com")).await.unwrap();

        let error = repo.delete(&record.id, &OwnerId::new()).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(repo.list(&owner).await.unwrap().len(), 1);

        repo.delete(&record.id, &owner).await.unwrap();
        assert!(repo.list(&owner).await.unwrap().is_empty());
        assert!(repo.delete(&record.id, &owner).await.is_err());
    }
}
