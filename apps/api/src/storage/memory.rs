use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{fold_case, Jobseeker, JobseekerFilter, JobseekerPatch, NewJobseeker};
use crate::storage::{JobseekerStore, StorageError};

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, Jobseeker>,
}

/// Process-local store. Ids are never reused after a delete.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobseekerStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, new: &NewJobseeker) -> Result<Jobseeker, StorageError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let record = new.clone().into_record(inner.last_id);
        inner.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<Jobseeker>, StorageError> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list(&self, filter: &JobseekerFilter) -> Result<Vec<Jobseeker>, StorageError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Jobseeker> = inner
            .rows
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update(
        &self,
        id: i64,
        patch: &JobseekerPatch,
    ) -> Result<Option<Jobseeker>, StorageError> {
        let mut inner = self.inner.write().await;
        Ok(inner.rows.get_mut(&id).map(|record| {
            patch.apply_to(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn find_duplicate(
        &self,
        email: &str,
        contact_number: &str,
    ) -> Result<Option<Jobseeker>, StorageError> {
        let email = fold_case(email);
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .find(|r| fold_case(&r.email) == email || r.contact_number == contact_number)
            .cloned())
    }

    async fn close(&self) {}
}
