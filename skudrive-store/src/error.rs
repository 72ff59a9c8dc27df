use thiserror::Error;

use crate::common::MAX_BATCH_SIZE;

/// Errors returned by [`TableStore`](crate::TableStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The table does not exist.
    #[error("table `{table}` not found")]
    TableNotFound {
        /// Name of the missing table.
        table: String,
    },

    /// A table with this name already exists.
    #[error("table `{table}` already exists")]
    TableExists {
        /// Name of the existing table.
        table: String,
    },

    /// A batch write carried more than [`MAX_BATCH_SIZE`] items.
    #[error("batch of {0} items exceeds maximum of {MAX_BATCH_SIZE}")]
    BatchTooLarge(usize),

    /// Any other error from the remote store, including network failures.
    #[error("store error: {context}")]
    Remote {
        /// What the store was doing when the error occurred.
        context: String,
        /// The underlying client error.
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub(crate) fn remote<E>(context: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Remote {
            context: context.into(),
            cause: Box::new(cause),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T, E = StoreError> = Result<T, E>;
