//! In-memory store for tests and dry runs.
//!
//! This provides a [`TableStore`] backed by a `HashMap` of tables. The store is [`Clone`] so tests
//! can keep a handle for inspection while the driver owns a boxed copy. Every call is recorded in
//! order, and failures can be injected per operation to exercise error policies.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use skudrive_types::{Product, Sku};

use crate::common::{BatchWriteResponse, MAX_BATCH_SIZE, TableInfo, TableSchema, TableStore};
use crate::error::{StoreError, StoreResult};

type Table = BTreeMap<Sku, Product>;

/// A call received by an [`InMemoryStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    /// `delete_table` for the given table.
    DeleteTable(String),
    /// `create_table` with the given schema.
    CreateTable(TableSchema),
    /// `batch_write` with the identifiers of the submitted products.
    BatchWrite(String, Vec<Sku>),
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Table>,
    calls: Vec<StoreCall>,
    fail_deletes: bool,
    fail_creates: bool,
    fail_batch_writes: bool,
}

/// A [`TableStore`] that keeps all tables in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    /// Creates an empty store without any tables.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked while holding it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every subsequent `delete_table` fail with a remote error.
    pub fn fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    /// Makes every subsequent `create_table` fail with a remote error.
    pub fn fail_creates(&self, fail: bool) {
        self.lock().fail_creates = fail;
    }

    /// Makes every subsequent `batch_write` fail with a remote error.
    pub fn fail_batch_writes(&self, fail: bool) {
        self.lock().fail_batch_writes = fail;
    }

    /// Returns all calls received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Returns `true` if a table with this name exists.
    pub fn has_table(&self, table: &str) -> bool {
        self.lock().tables.contains_key(table)
    }

    /// Returns all products of a table ordered by identifier, or `None` if it does not exist.
    pub fn products(&self, table: &str) -> Option<Vec<Product>> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.values().cloned().collect())
    }
}

fn injected(context: &str) -> StoreError {
    StoreError::remote(context, io::Error::other("injected failure"))
}

#[async_trait::async_trait]
impl TableStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn delete_table(&self, table: &str) -> StoreResult<TableInfo> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::DeleteTable(table.to_owned()));

        if inner.fail_deletes {
            return Err(injected("failed to delete table"));
        }
        match inner.tables.remove(table) {
            Some(_) => Ok(TableInfo {
                table: table.to_owned(),
                status: Some("DELETING".to_owned()),
            }),
            None => Err(StoreError::TableNotFound {
                table: table.to_owned(),
            }),
        }
    }

    async fn create_table(&self, schema: &TableSchema) -> StoreResult<TableInfo> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::CreateTable(schema.clone()));

        if inner.fail_creates {
            return Err(injected("failed to create table"));
        }
        if inner.tables.contains_key(&schema.table) {
            return Err(StoreError::TableExists {
                table: schema.table.clone(),
            });
        }
        inner.tables.insert(schema.table.clone(), Table::new());
        Ok(TableInfo {
            table: schema.table.clone(),
            status: Some("ACTIVE".to_owned()),
        })
    }

    async fn batch_write(
        &self,
        table: &str,
        products: &[Product],
    ) -> StoreResult<BatchWriteResponse> {
        let mut inner = self.lock();
        let skus = products.iter().map(|p| p.sku).collect();
        inner
            .calls
            .push(StoreCall::BatchWrite(table.to_owned(), skus));

        if products.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge(products.len()));
        }
        if inner.fail_batch_writes {
            return Err(injected("failed to write batch"));
        }
        let Some(rows) = inner.tables.get_mut(table) else {
            return Err(StoreError::TableNotFound {
                table: table.to_owned(),
            });
        };
        for product in products {
            rows.insert(product.sku, product.clone());
        }

        Ok(BatchWriteResponse {
            written: products.len(),
            unprocessed: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use skudrive_types::Price;

    use super::*;

    fn product(n: u64) -> Product {
        Product::regular(Sku::new(n).unwrap(), Price::MIN)
    }

    #[tokio::test]
    async fn delete_missing_table() {
        let store = InMemoryStore::new();
        let err = store.delete_table("Products").await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound { .. }));
    }

    #[tokio::test]
    async fn create_write_and_delete() {
        let store = InMemoryStore::new();
        store
            .create_table(&TableSchema::products("Products"))
            .await
            .unwrap();

        let response = store
            .batch_write("Products", &[product(1), product(0)])
            .await
            .unwrap();
        assert_eq!(response.written, 2);

        let skus: Vec<_> = store
            .products("Products")
            .unwrap()
            .into_iter()
            .map(|p| p.sku.number())
            .collect();
        assert_eq!(skus, [0, 1]);

        store.delete_table("Products").await.unwrap();
        assert!(!store.has_table("Products"));
    }

    #[tokio::test]
    async fn create_existing_table() {
        let store = InMemoryStore::new();
        let schema = TableSchema::products("Products");
        store.create_table(&schema).await.unwrap();
        let err = store.create_table(&schema).await.unwrap_err();
        assert!(matches!(err, StoreError::TableExists { .. }));
    }

    #[tokio::test]
    async fn rejects_oversized_batch() {
        let store = InMemoryStore::new();
        store
            .create_table(&TableSchema::products("Products"))
            .await
            .unwrap();

        let products: Vec<_> = (0..26).map(product).collect();
        let err = store.batch_write("Products", &products).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge(26)));
    }

    #[tokio::test]
    async fn injected_failures_are_recorded() {
        let store = InMemoryStore::new();
        store.fail_creates(true);

        let schema = TableSchema::products("Products");
        assert!(store.create_table(&schema).await.is_err());
        assert!(!store.has_table("Products"));
        assert_eq!(store.calls(), [StoreCall::CreateTable(schema)]);
    }
}
