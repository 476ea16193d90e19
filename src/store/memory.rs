// In-process entity store. Backs the test suites and small demos; the
// server runs on the SQLite store.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{EntityKind, EntityStore, Filter, Record};

#[derive(Default)]
struct Inner {
    next_id: i64,
    records: Vec<Record>,
}

/// Store keeping every record behind a single `RwLock`. Writes are
/// serialized, which trivially gives the block-then-purge sequence the
/// atomicity the SQLite store only approximates.
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
impl EntityStore for MemoryStore {
    async fn find(
        &self,
        kind: EntityKind,
        filter: Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        let inner = self.inner.read().await;
        let mut matched: Vec<Record> = inner
            .records
            .iter()
            .filter(|r| r.kind == kind && filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn find_one(&self, kind: EntityKind, filter: Filter) -> Result<Option<Record>> {
        Ok(self.find(kind, filter, Some(1)).await?.into_iter().next())
    }

    async fn exists(&self, kind: EntityKind, filter: Filter) -> Result<bool> {
        Ok(self.find_one(kind, filter).await?.is_some())
    }

    async fn create(&self, kind: EntityKind, data: Value) -> Result<Record> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let record = Record {
            id: inner.next_id,
            kind,
            data,
            created_at: now,
            updated_at: now,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: &Record) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner
            .records
            .iter_mut()
            .find(|r| r.kind == record.kind && r.id == record.id)
        {
            Some(existing) => {
                existing.data = record.data.clone();
                existing.updated_at = Utc::now();
                Ok(())
            }
            None => bail!("{} record {} does not exist", record.kind, record.id),
        }
    }

    async fn delete_many(&self, kind: EntityKind, filter: Filter) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner
            .records
            .retain(|r| r.kind != kind || !filter.matches(r));
        Ok((before - inner.records.len()) as u64)
    }

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.kind == kind && filter.matches(r))
            .count() as i64)
    }
}
