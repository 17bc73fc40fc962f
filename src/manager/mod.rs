//! The manager capability that executes queries, plus the in-memory reference manager.
pub mod cursor;
pub mod entity;
pub mod memory;
pub mod metrics;

use std::sync::Arc;

use crate::errors::DbError;
use crate::query::ColumnQuery;

pub use cursor::Cursor;
pub use entity::ColumnEntity;
pub use memory::InMemoryManager;
pub use metrics::{ManagerMetrics, MetricsSnapshot};

/// Lazy sequence of entities produced by a manager.
pub type EntityStream = Box<dyn Iterator<Item = ColumnEntity> + Send>;

/// Executes built queries against storage.
pub trait ColumnManager: Send + Sync {
    /// # Errors
    /// Implementation-defined execution failures.
    fn select(&self, query: &ColumnQuery) -> Result<EntityStream, DbError>;

    /// At most one entity; more than one match is a `NonUniqueResult`.
    ///
    /// # Errors
    /// `NonUniqueResult`, or any failure of [`select`](Self::select).
    fn single_result(&self, query: &ColumnQuery) -> Result<Option<ColumnEntity>, DbError> {
        let mut stream = self.select(query)?;
        let Some(first) = stream.next() else {
            return Ok(None);
        };
        match stream.count() {
            0 => Ok(Some(first)),
            extra => Err(DbError::NonUniqueResult(extra + 1)),
        }
    }

    /// # Errors
    /// Implementation-defined execution failures.
    fn count(&self, collection: &str) -> Result<u64, DbError>;
}

impl<M: ColumnManager + ?Sized> ColumnManager for Arc<M> {
    fn select(&self, query: &ColumnQuery) -> Result<EntityStream, DbError> {
        (**self).select(query)
    }

    fn single_result(&self, query: &ColumnQuery) -> Result<Option<ColumnEntity>, DbError> {
        (**self).single_result(query)
    }

    fn count(&self, collection: &str) -> Result<u64, DbError> {
        (**self).count(collection)
    }
}
