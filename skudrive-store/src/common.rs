use std::fmt::Debug;

use skudrive_types::Product;

use crate::error::StoreResult;

/// Maximum number of put requests a single batch write may carry.
///
/// This limit is imposed by DynamoDB's `BatchWriteItem` operation. All stores enforce it.
pub const MAX_BATCH_SIZE: usize = 25;

/// A type-erased [`TableStore`] instance.
pub type BoxedStore = Box<dyn TableStore>;

/// Definition of a table with a single string hash key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    /// Name of the table.
    pub table: String,
    /// Name of the string-typed hash key attribute.
    pub hash_key: String,
    /// Provisioned read capacity units.
    pub read_capacity: i64,
    /// Provisioned write capacity units.
    pub write_capacity: i64,
}

impl TableSchema {
    /// Schema of the products table: hash key `SKU` with one unit of read and write capacity.
    pub fn products(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            hash_key: "SKU".to_owned(),
            read_capacity: 1,
            write_capacity: 1,
        }
    }
}

/// What the store reported about a table after a delete or create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableInfo {
    /// Name of the table.
    pub table: String,
    /// The status reported by the store, e.g. `DELETING` or `CREATING`.
    pub status: Option<String>,
}

/// Result of a batch write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchWriteResponse {
    /// Number of put requests the store accepted.
    pub written: usize,
    /// Number of put requests the store handed back as unprocessed.
    ///
    /// These are not retried.
    pub unprocessed: usize,
}

/// A remote key-value store that holds product tables.
#[async_trait::async_trait]
pub trait TableStore: Debug + Send + Sync + 'static {
    /// The store name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Deletes the table with the given name.
    ///
    /// Returns [`StoreError::TableNotFound`](crate::StoreError::TableNotFound) if it does not
    /// exist.
    async fn delete_table(&self, table: &str) -> StoreResult<TableInfo>;

    /// Creates a table according to the given schema.
    async fn create_table(&self, schema: &TableSchema) -> StoreResult<TableInfo>;

    /// Writes up to [`MAX_BATCH_SIZE`] products to the table in one round trip.
    async fn batch_write(&self, table: &str, products: &[Product])
    -> StoreResult<BatchWriteResponse>;
}
