//! Document store access for the admin console.
//!
//! The mobile backend keeps its data as schemaless documents grouped in
//! collections. The console only needs four primitives over them, captured by
//! the [`DocumentStore`] trait:
//!
//! - `get_by_id(collection, id)`
//! - `query(collection, filter?, order_by?, limit?)`
//! - `upsert(collection, id, fields)` (shallow merge, creates when absent)
//! - `delete(collection, id)`
//!
//! # Implementations
//!
//! - [`PgDocumentStore`] - one JSONB table in `PostgreSQL`
//! - [`MemoryDocumentStore`] - process memory (local development and tests)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p kinniku-cli -- migrate
//! ```

pub mod email_templates;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use email_templates::EmailTemplateRepository;
pub use memory::MemoryDocumentStore;
pub use orders::OrderRepository;
pub use postgres::PgDocumentStore;
pub use users::IdentityRepository;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

/// Collection names used by the console.
pub mod collections {
    /// Identity records, keyed by the identity provider's uid.
    pub const USERS: &str = "users";
    /// Notification templates, keyed by template type.
    pub const EMAIL_TEMPLATES: &str = "email_templates";
    /// Shop orders.
    pub const ORDERS: &str = "orders";
    /// Shop products; the console only touches their `images` field.
    pub const PRODUCTS: &str = "products";
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or does not match the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Top-level fields.
    pub fields: Fields,
}

impl Document {
    /// Deserialize the fields into a typed view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, RepositoryError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            RepositoryError::DataCorruption(format!("document {} has invalid shape: {e}", self.id))
        })
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Ordering on a top-level field.
///
/// Documents that lack the field are excluded from ordered results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query: optional equality filter, ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// An unfiltered, unordered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return documents whose `field` equals `value`.
    #[must_use]
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order results by `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The four document primitives the console relies on.
///
/// Writes are last-write-wins; no optimistic concurrency checks are made.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document.
    async fn get_by_id(&self, collection: &str, id: &str)
    -> Result<Option<Document>, RepositoryError>;

    /// Run a query over a collection.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, RepositoryError>;

    /// Merge `fields` into the document, creating it when absent.
    async fn upsert(&self, collection: &str, id: &str, fields: Fields)
    -> Result<(), RepositoryError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Serialize a typed value into a field map for [`DocumentStore::upsert`].
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if `value` does not serialize to
/// a JSON object.
pub fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RepositoryError::DataCorruption(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(RepositoryError::DataCorruption(e.to_string())),
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_builder() {
        let q = Query::new()
            .filter_eq("status", "pending")
            .order_by("createdAt", Direction::Descending)
            .limit(10);

        assert_eq!(q.filter.unwrap().value, json!("pending"));
        assert_eq!(q.order_by.unwrap().direction, Direction::Descending);
        assert_eq!(q.limit, Some(10));
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        assert!(to_fields(&json!({"a": 1})).is_ok());
        assert!(matches!(
            to_fields(&json!([1, 2])),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_document_decode_reports_id() {
        #[derive(Debug, serde::Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            count: u32,
        }

        let doc = Document {
            id: "doc-1".to_string(),
            fields: to_fields(&json!({"count": "many"})).unwrap(),
        };
        let err = doc.decode::<Shape>().unwrap_err();
        assert!(err.to_string().contains("doc-1"));
    }
}
