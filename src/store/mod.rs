// Entity store contract - the document-store surface the engines run on.
// Two implementations: an in-process store for tests and demos, and a
// SQLite-backed store for the server.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::AppResult;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Pseudo-field addressing the store-assigned record key.
pub const ID_FIELD: &str = "id";

/// Collections the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
    Like,
    Follow,
    Block,
    Activity,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Post => "post",
            EntityKind::Like => "like",
            EntityKind::Follow => "follow",
            EntityKind::Block => "block",
            EntityKind::Activity => "activity",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query predicate over document fields: equality, set exclusion, and
/// boolean composition. `ID_FIELD` addresses the record key rather than a
/// document field.
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    Eq(&'static str, Value),
    NotIn(&'static str, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn by_id(id: i64) -> Self {
        Filter::Eq(ID_FIELD, Value::from(id))
    }

    pub fn not_in(field: &'static str, values: Vec<Value>) -> Self {
        Filter::NotIn(field, values)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// In-process evaluation against a record, used by the memory store.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => field_value(record, field) == *value,
            Filter::NotIn(field, values) => !values.contains(&field_value(record, field)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

fn field_value(record: &Record, field: &str) -> Value {
    if field == ID_FIELD {
        return Value::from(record.id);
    }
    record.data.get(field).cloned().unwrap_or(Value::Null)
}

/// A stored document plus the metadata the store maintains for it.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: i64,
    pub kind: EntityKind,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Deserialize the document body into a typed node.
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<Stored<T>> {
        let node = serde_json::from_value(self.data.clone())?;
        Ok(Stored {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            node,
        })
    }

    /// The same record carrying a replacement document body.
    pub fn with_data(&self, data: Value) -> Record {
        Record {
            data,
            ..self.clone()
        }
    }
}

/// Typed view of a record.
#[derive(Debug, Clone)]
pub struct Stored<T> {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub node: T,
}

impl<T: Serialize> Stored<T> {
    /// Re-assemble a record for writing the (possibly mutated) node back.
    pub fn to_record(&self, kind: EntityKind) -> AppResult<Record> {
        Ok(Record {
            id: self.id,
            kind,
            data: encode(&self.node)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Serialize a typed node into a document body.
pub fn encode<T: Serialize>(node: &T) -> AppResult<Value> {
    Ok(serde_json::to_value(node)?)
}

/// Durable record storage. Results come back newest first (creation time,
/// then record key) so feed-style reads need no extra ordering step.
/// Failures are fatal for the calling action; the engines never retry.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find(
        &self,
        kind: EntityKind,
        filter: Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Record>>;

    async fn find_one(&self, kind: EntityKind, filter: Filter) -> Result<Option<Record>>;

    async fn exists(&self, kind: EntityKind, filter: Filter) -> Result<bool>;

    async fn create(&self, kind: EntityKind, data: Value) -> Result<Record>;

    async fn update(&self, record: &Record) -> Result<()>;

    async fn delete_many(&self, kind: EntityKind, filter: Filter) -> Result<u64>;

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, data: Value) -> Record {
        Record {
            id,
            kind: EntityKind::Post,
            data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn eq_matches_document_fields_and_record_key() {
        let rec = record(3, json!({"author": 9, "status": "active"}));
        assert!(Filter::eq("author", 9).matches(&rec));
        assert!(Filter::eq("status", "active").matches(&rec));
        assert!(Filter::by_id(3).matches(&rec));
        assert!(!Filter::by_id(4).matches(&rec));
        assert!(!Filter::eq("author", 10).matches(&rec));
    }

    #[test]
    fn missing_fields_read_as_null() {
        let rec = record(1, json!({"author": 9}));
        assert!(Filter::eq("deleted_by", Value::Null).matches(&rec));
        assert!(!Filter::eq("deleted_by", 9).matches(&rec));
    }

    #[test]
    fn not_in_with_empty_set_matches_everything() {
        let rec = record(1, json!({"actor": 5}));
        assert!(Filter::not_in("actor", vec![]).matches(&rec));
        assert!(Filter::not_in("actor", vec![Value::from(6)]).matches(&rec));
        assert!(!Filter::not_in("actor", vec![Value::from(5)]).matches(&rec));
    }

    #[test]
    fn boolean_composition() {
        let rec = record(1, json!({"follower": 1, "following": 2}));
        let pair = Filter::or(vec![
            Filter::and(vec![Filter::eq("follower", 1), Filter::eq("following", 2)]),
            Filter::and(vec![Filter::eq("follower", 2), Filter::eq("following", 1)]),
        ]);
        assert!(pair.matches(&rec));

        let reversed = record(2, json!({"follower": 2, "following": 1}));
        assert!(pair.matches(&reversed));

        let unrelated = record(3, json!({"follower": 1, "following": 3}));
        assert!(!pair.matches(&unrelated));
    }
}
