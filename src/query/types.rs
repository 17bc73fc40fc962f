use serde::{Deserialize, Serialize};
use std::fmt;

use crate::condition::ColumnCondition;
use crate::errors::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortType {
    #[default]
    Asc,
    Desc,
}

/// A field name plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    field: String,
    direction: SortType,
}

impl Sort {
    /// # Errors
    /// `InvalidArgument` when `field` is empty.
    pub fn of(field: impl Into<String>, direction: SortType) -> Result<Self, DbError> {
        let field = field.into();
        if field.is_empty() {
            return Err(DbError::InvalidArgument("sort field must not be empty".into()));
        }
        Ok(Self { field, direction })
    }

    /// # Errors
    /// `InvalidArgument` when `field` is empty.
    pub fn ascending(field: impl Into<String>) -> Result<Self, DbError> {
        Self::of(field, SortType::Asc)
    }

    /// # Errors
    /// `InvalidArgument` when `field` is empty.
    pub fn descending(field: impl Into<String>) -> Result<Self, DbError> {
        Self::of(field, SortType::Desc)
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn direction(&self) -> SortType {
        self.direction
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortType::Asc => "ASC",
            SortType::Desc => "DESC",
        };
        write!(f, "{} {dir}", self.field)
    }
}

/// Immutable description of a select: target collection, projection,
/// predicate tree, sort order and pagination.
///
/// Only [`QueryBuilder::build`](super::QueryBuilder::build) creates one.
/// `skip == 0` means no skip and `limit == 0` means no limit; an empty
/// projection selects every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnQuery {
    pub(crate) collection: String,
    pub(crate) columns: Vec<String>,
    pub(crate) condition: Option<ColumnCondition>,
    pub(crate) sorts: Vec<Sort>,
    pub(crate) skip: u64,
    pub(crate) limit: u64,
}

impl ColumnQuery {
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Projected column names, duplicates removed, in first-selected order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub const fn condition(&self) -> Option<&ColumnCondition> {
        self.condition.as_ref()
    }

    #[must_use]
    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.skip
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Renders the query in the JSON descriptor format accepted by
    /// [`parse_query_json`](super::parse_query_json).
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn to_json(&self) -> Result<String, DbError> {
        Ok(serde_json::to_string(&super::parse::QuerySerde::from(self))?)
    }
}

impl fmt::Display for ColumnQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            f.write_str("select *")?;
        } else {
            write!(f, "select {}", self.columns.join(", "))?;
        }
        write!(f, " from {}", self.collection)?;
        if let Some(c) = &self.condition {
            write!(f, " where {c}")?;
        }
        if !self.sorts.is_empty() {
            let sorts: Vec<String> = self.sorts.iter().map(ToString::to_string).collect();
            write!(f, " order by {}", sorts.join(", "))?;
        }
        if self.skip > 0 {
            write!(f, " skip {}", self.skip)?;
        }
        if self.limit > 0 {
            write!(f, " limit {}", self.limit)?;
        }
        Ok(())
    }
}
