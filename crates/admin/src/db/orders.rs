//! Order repository.

use chrono::Utc;
use serde_json::{Value, json};

use kinniku_core::{OrderId, OrderStatus};

use super::{Direction, Document, DocumentStore, Query, RepositoryError, collections, to_fields};
use crate::models::{Order, OrderStats};

impl TryFrom<&Document> for Order {
    type Error = RepositoryError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let mut doc = doc.clone();
        doc.fields.insert("id".to_string(), Value::String(doc.id.clone()));
        doc.decode()
    }
}

/// Repository for the `orders` collection.
pub struct OrderRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    /// Returns `RepositoryError::DataCorruption` if the order is malformed.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.store
            .get_by_id(collections::ORDERS, id.as_str())
            .await?
            .as_ref()
            .map(TryInto::try_into)
            .transpose()
    }

    /// Most recent orders first.
    ///
    /// Malformed orders are skipped with a warning so one bad document does
    /// not hide the rest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        let query = Query::new()
            .order_by("createdAt", Direction::Descending)
            .limit(limit);
        let docs = self.store.query(collections::ORDERS, &query).await?;

        Ok(docs
            .iter()
            .filter_map(|doc| match Order::try_from(doc) {
                Ok(order) => Some(order),
                Err(e) => {
                    tracing::warn!(order_id = %doc.id, error = %e, "Skipping malformed order");
                    None
                }
            })
            .collect())
    }

    /// Set the status of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let fields = to_fields(&json!({
            "status": status.as_str(),
            "updatedAt": Utc::now(),
        }))?;
        self.store
            .upsert(collections::ORDERS, id.as_str(), fields)
            .await
    }

    /// Count orders per status group and sum their totals.
    ///
    /// Reads only `status` and `total`, so partially written orders still count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let docs = self.store.query(collections::ORDERS, &Query::new()).await?;

        let mut stats = OrderStats::default();
        for doc in &docs {
            match doc.fields.get("status").and_then(Value::as_str) {
                Some("pending") => stats.pending += 1,
                Some("confirmed" | "processing") => stats.processing += 1,
                Some("shipped") => stats.shipped += 1,
                Some("delivered") => stats.delivered += 1,
                _ => {}
            }
            stats.total_sales += doc.fields.get("total").and_then(Value::as_i64).unwrap_or(0);
        }

        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;

    async fn put(store: &MemoryDocumentStore, id: &str, fields: Value) {
        store
            .upsert(collections::ORDERS, id, to_fields(&fields).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stats_groups_statuses() {
        let store = MemoryDocumentStore::new();
        put(&store, "o1", json!({"status": "pending", "total": 1200})).await;
        put(&store, "o2", json!({"status": "confirmed", "total": 3000})).await;
        put(&store, "o3", json!({"status": "processing", "total": 500})).await;
        put(&store, "o4", json!({"status": "shipped"})).await;
        put(&store, "o5", json!({"status": "cancelled", "total": 100})).await;

        let stats = OrderRepository::new(&store).stats().await.unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.processing, 2);
        assert_eq!(stats.shipped, 1);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.total_sales, 4800);
    }

    #[tokio::test]
    async fn test_set_status_keeps_other_fields() {
        let store = MemoryDocumentStore::new();
        put(&store, "o1", json!({"status": "pending", "total": 1200})).await;

        OrderRepository::new(&store)
            .set_status(&OrderId::new("o1"), OrderStatus::Confirmed)
            .await
            .unwrap();

        let doc = store.get_by_id(collections::ORDERS, "o1").await.unwrap().unwrap();
        assert_eq!(doc.fields.get("status"), Some(&json!("confirmed")));
        assert_eq!(doc.fields.get("total"), Some(&json!(1200)));
    }

    #[tokio::test]
    async fn test_get_malformed_order_is_corruption() {
        let store = MemoryDocumentStore::new();
        put(&store, "o1", json!({"status": "pending"})).await;

        let result = OrderRepository::new(&store).get(&OrderId::new("o1")).await;
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }
}
