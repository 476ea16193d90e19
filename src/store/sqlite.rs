// SQLite-backed entity store. Documents live as JSON text in a single
// `records` table; filters compile to `json_extract` predicates.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

use super::{EntityKind, EntityStore, Filter, Record, ID_FIELD};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(SqliteStore { pool })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                data TEXT NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_kind_created ON records(kind, created)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_kind_id ON records(kind, id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

fn field_path(field: &str) -> Result<String> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid filter field: {field:?}");
    }
    Ok(format!("json_extract(data, '$.{field}')"))
}

/// Render a filter into a SQL predicate, collecting bind values in order.
/// `Value::Null` renders as `IS NULL` and produces no bind.
fn render_filter(filter: &Filter, sql: &mut String, binds: &mut Vec<Value>) -> Result<()> {
    match filter {
        Filter::All => sql.push_str("1=1"),
        Filter::Eq(field, value) => {
            let column = if *field == ID_FIELD {
                "id".to_string()
            } else {
                field_path(field)?
            };
            if value.is_null() {
                sql.push_str(&column);
                sql.push_str(" IS NULL");
            } else {
                sql.push_str(&column);
                sql.push_str(" = ?");
                binds.push(value.clone());
            }
        }
        Filter::NotIn(field, values) => {
            if values.is_empty() {
                sql.push_str("1=1");
            } else {
                let column = if *field == ID_FIELD {
                    "id".to_string()
                } else {
                    field_path(field)?
                };
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{column} NOT IN ({placeholders})"));
                binds.extend(values.iter().cloned());
            }
        }
        Filter::And(filters) | Filter::Or(filters) => {
            if filters.is_empty() {
                sql.push_str("1=1");
                return Ok(());
            }
            let joiner = if matches!(filter, Filter::And(_)) {
                " AND "
            } else {
                " OR "
            };
            sql.push('(');
            for (i, inner) in filters.iter().enumerate() {
                if i > 0 {
                    sql.push_str(joiner);
                }
                render_filter(inner, sql, binds)?;
            }
            sql.push(')');
        }
    }
    Ok(())
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> Result<SqliteQuery<'q>> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(query.bind(i))
            } else if let Some(f) = n.as_f64() {
                Ok(query.bind(f))
            } else {
                bail!("unsupported numeric filter value: {n}")
            }
        }
        Value::String(s) => Ok(query.bind(s.clone())),
        Value::Bool(b) => Ok(query.bind(*b)),
        other => bail!("unsupported filter value: {other}"),
    }
}

fn row_to_record(row: &SqliteRow) -> Result<Record> {
    let kind: String = row.try_get("kind")?;
    let kind = match kind.as_str() {
        "user" => EntityKind::User,
        "post" => EntityKind::Post,
        "like" => EntityKind::Like,
        "follow" => EntityKind::Follow,
        "block" => EntityKind::Block,
        "activity" => EntityKind::Activity,
        other => bail!("unknown record kind: {other:?}"),
    };
    let data: String = row.try_get("data")?;
    Ok(Record {
        id: row.try_get("id")?,
        kind,
        data: serde_json::from_str(&data)?,
        created_at: millis_to_datetime(row.try_get("created")?)?,
        updated_at: millis_to_datetime(row.try_get("updated")?)?,
    })
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| anyhow!("timestamp out of range: {millis}"))
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn find(
        &self,
        kind: EntityKind,
        filter: Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        let mut predicate = String::new();
        let mut binds = Vec::new();
        render_filter(&filter, &mut predicate, &mut binds)?;

        let mut sql = format!(
            "SELECT id, kind, data, created, updated FROM records \
             WHERE kind = ? AND ({predicate}) ORDER BY created DESC, id DESC"
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query(&sql).bind(kind.as_str());
        for value in &binds {
            query = bind_value(query, value)?;
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn find_one(&self, kind: EntityKind, filter: Filter) -> Result<Option<Record>> {
        Ok(self.find(kind, filter, Some(1)).await?.into_iter().next())
    }

    async fn exists(&self, kind: EntityKind, filter: Filter) -> Result<bool> {
        Ok(self.find_one(kind, filter).await?.is_some())
    }

    async fn create(&self, kind: EntityKind, data: Value) -> Result<Record> {
        let now = Utc::now();
        let millis = now.timestamp_millis();
        let body = serde_json::to_string(&data)?;

        let result = sqlx::query(
            "INSERT INTO records (kind, data, created, updated) VALUES (?, ?, ?, ?)",
        )
        .bind(kind.as_str())
        .bind(&body)
        .bind(millis)
        .bind(millis)
        .execute(&self.pool)
        .await?;

        Ok(Record {
            id: result.last_insert_rowid(),
            kind,
            data,
            created_at: millis_to_datetime(millis)?,
            updated_at: millis_to_datetime(millis)?,
        })
    }

    async fn update(&self, record: &Record) -> Result<()> {
        let body = serde_json::to_string(&record.data)?;
        let result = sqlx::query(
            "UPDATE records SET data = ?, updated = ? WHERE id = ? AND kind = ?",
        )
        .bind(&body)
        .bind(Utc::now().timestamp_millis())
        .bind(record.id)
        .bind(record.kind.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("{} record {} does not exist", record.kind, record.id);
        }
        Ok(())
    }

    async fn delete_many(&self, kind: EntityKind, filter: Filter) -> Result<u64> {
        let mut predicate = String::new();
        let mut binds = Vec::new();
        render_filter(&filter, &mut predicate, &mut binds)?;

        let sql = format!("DELETE FROM records WHERE kind = ? AND ({predicate})");
        let mut query = sqlx::query(&sql).bind(kind.as_str());
        for value in &binds {
            query = bind_value(query, value)?;
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<i64> {
        let mut predicate = String::new();
        let mut binds = Vec::new();
        render_filter(&filter, &mut predicate, &mut binds)?;

        let sql = format!("SELECT COUNT(*) AS n FROM records WHERE kind = ? AND ({predicate})");
        let mut query = sqlx::query(&sql).bind(kind.as_str());
        for value in &binds {
            query = bind_value(query, value)?;
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get("n")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_boolean_filters() {
        let filter = Filter::or(vec![
            Filter::and(vec![Filter::eq("follower", 1), Filter::eq("following", 2)]),
            Filter::and(vec![Filter::eq("follower", 2), Filter::eq("following", 1)]),
        ]);
        let mut sql = String::new();
        let mut binds = Vec::new();
        render_filter(&filter, &mut sql, &mut binds).unwrap();
        assert_eq!(
            sql,
            "((json_extract(data, '$.follower') = ? AND json_extract(data, '$.following') = ?) \
             OR (json_extract(data, '$.follower') = ? AND json_extract(data, '$.following') = ?))"
        );
        assert_eq!(binds.len(), 4);
    }

    #[test]
    fn null_equality_renders_is_null_without_binds() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        render_filter(&Filter::eq("by", Value::Null), &mut sql, &mut binds).unwrap();
        assert_eq!(sql, "json_extract(data, '$.by') IS NULL");
        assert!(binds.is_empty());
    }

    #[test]
    fn rejects_malformed_field_names() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        let result = render_filter(
            &Filter::Eq("a') OR 1=1 --", Value::from(1)),
            &mut sql,
            &mut binds,
        );
        assert!(result.is_err());
    }
}
