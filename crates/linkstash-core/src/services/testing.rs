//! Recording persistence double for workflow tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::BookmarkPersistence;
use crate::error::{Error, Result};
use crate::models::{BookmarkId, BookmarkRecord, OwnerId};
use crate::validation::NormalizedUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        owner: OwnerId,
        title: String,
        url: String,
    },
    List(OwnerId),
    Delete {
        id: BookmarkId,
        owner: OwnerId,
    },
}

/// Records every call; creates and deletes can be made to fail.
#[derive(Default)]
pub struct RecordingPersistence {
    calls: Mutex<Vec<Call>>,
    listed: Mutex<Vec<BookmarkRecord>>,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingPersistence {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_listed(&self, records: Vec<BookmarkRecord>) {
        *self.listed.lock().unwrap() = records;
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl BookmarkPersistence for RecordingPersistence {
    async fn create(
        &self,
        owner: &OwnerId,
        title: &str,
        url: &NormalizedUrl,
    ) -> Result<BookmarkRecord> {
        self.record(Call::Create {
            owner: *owner,
            title: title.to_string(),
            url: url.as_str().to_string(),
        });
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Error::Persistence("insert rejected".into()));
        }
        Ok(BookmarkRecord::new(*owner, title, url.as_str()))
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<BookmarkRecord>> {
        self.record(Call::List(*owner));
        Ok(self.listed.lock().unwrap().clone())
    }

    async fn delete(&self, id: &BookmarkId, owner: &OwnerId) -> Result<()> {
        self.record(Call::Delete {
            id: *id,
            owner: *owner,
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("delete rejected".into()));
        }
        Ok(())
    }
}
