//! `PostgreSQL`-backed document store.
//!
//! All collections share the `admin.document` table; each row holds one
//! document's fields as JSONB. Queries are built with `QueryBuilder` so field
//! names and values are always bound, never interpolated.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{Direction, Document, DocumentStore, Fields, Query, RepositoryError};

/// Internal row type for document queries.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Fields>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            fields: row.data.0,
        }
    }
}

/// Document store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new store from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT id, data
            FROM admin.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT id, data FROM admin.document WHERE collection = ");
        builder.push_bind(collection);

        if let Some(filter) = &query.filter {
            builder.push(" AND data -> ");
            builder.push_bind(filter.field.clone());
            builder.push(" = ");
            builder.push_bind(Json(filter.value.clone()));
        }

        if let Some(order) = &query.order_by {
            builder.push(" AND data -> ");
            builder.push_bind(order.field.clone());
            builder.push(" IS NOT NULL ORDER BY data -> ");
            builder.push_bind(order.field.clone());
            builder.push(match order.direction {
                Direction::Ascending => " ASC",
                Direction::Descending => " DESC",
            });
            builder.push(", id ASC");
        } else {
            builder.push(" ORDER BY id ASC");
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin.document (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = admin.document.data || EXCLUDED.data, updated_at = NOW()
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM admin.document WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
