//! In-process document store.
//!
//! Used when no database URL is configured and by tests. Contents are lost
//! when the process exits.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Direction, Document, DocumentStore, Fields, Query, RepositoryError};

/// Document store backed by a map held in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, Fields>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, RepositoryError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<Document> = docs
            .iter()
            .filter(|(_, fields)| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|f| fields.get(&f.field) == Some(&f.value))
            })
            .filter(|(_, fields)| {
                query
                    .order_by
                    .as_ref()
                    .is_none_or(|o| fields.contains_key(&o.field))
            })
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();

        // Ties (and unordered queries) fall back to id order so results are stable
        results.sort_by(|a, b| {
            let primary = query.order_by.as_ref().map_or(Ordering::Equal, |o| {
                let ord = compare_values(a.fields.get(&o.field), b.fields.get(&o.field));
                match o.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
            primary.then_with(|| a.id.cmp(&b.id))
        });

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .entry(collection.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_default();
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

/// Order JSON values the way the `PostgreSQL` store orders `jsonb`:
/// numbers numerically, strings lexicographically, booleans false first.
/// Values of different kinds compare by kind.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (a, b) => kind_rank(a).cmp(&kind_rank(b)),
    }
}

const fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::Bool(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}
