//! Remote table storage for seeded product records.
//!
//! The [`TableStore`] trait is the seam between the seed driver and the remote key-value store.
//! [`DynamoDbStore`] talks to DynamoDB (or any endpoint speaking its API, such as DynamoDB Local),
//! while [`InMemoryStore`] keeps tables in memory for tests and dry runs.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod common;
mod dynamodb;
mod error;
mod in_memory;

pub use common::{
    BatchWriteResponse, BoxedStore, MAX_BATCH_SIZE, TableInfo, TableSchema, TableStore,
};
pub use dynamodb::{DynamoDbStore, DynamoDbStoreConfig};
pub use error::{StoreError, StoreResult};
pub use in_memory::{InMemoryStore, StoreCall};
