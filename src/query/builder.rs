use super::types::{ColumnQuery, Sort};
use crate::condition::ColumnCondition;
use crate::errors::DbError;
use crate::manager::{ColumnEntity, ColumnManager, EntityStream};

/// Where a [`QueryBuilder`] is in its construction sequence:
/// `Empty -> ColumnsSelected -> FromSet -> ConditionSet? -> Sorted? -> Paged?`.
///
/// The phases after `FromSet` only advance once a collection is set, and
/// never move backwards; a `where_` after `sort` keeps the builder `Sorted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BuilderState {
    #[default]
    Empty,
    ColumnsSelected,
    FromSet,
    ConditionSet,
    Sorted,
    Paged,
}

/// Fluent assembler for [`ColumnQuery`].
///
/// Each step consumes the builder and hands it back, so a builder is owned by
/// exactly one construction sequence. It is not meant to be shared across
/// threads while being mutated.
///
/// Policies:
/// - `select` is only accepted before `from`.
/// - `from` is accepted once; a second call is an `IllegalState`.
/// - `where_` replaces any earlier condition.
/// - `sort` appends, keeping call order.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    state: BuilderState,
    columns: Vec<String>,
    collection: Option<String>,
    condition: Option<ColumnCondition>,
    sorts: Vec<Sort>,
    skip: u64,
    limit: u64,
}

/// Starts a builder that projects every column.
#[must_use]
pub fn builder() -> QueryBuilder {
    QueryBuilder::new()
}

/// Starts a builder projecting `columns`.
///
/// # Errors
/// `InvalidArgument` if any column name is empty.
pub fn select<I, S>(columns: I) -> Result<QueryBuilder, DbError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryBuilder::new().select(columns)
}

fn non_negative(what: &str, n: i64) -> Result<u64, DbError> {
    u64::try_from(n).map_err(|_| DbError::InvalidArgument(format!("{what} must not be negative: {n}")))
}

impl QueryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> BuilderState {
        self.state
    }

    fn advance(&mut self, to: BuilderState) {
        if self.collection.is_some() {
            self.state = self.state.max(to);
        }
    }

    /// Adds projected columns. Duplicates collapse onto their first occurrence.
    ///
    /// # Errors
    /// `IllegalState` once `from` has been called, `InvalidArgument` on an empty name.
    pub fn select<I, S>(mut self, columns: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.collection.is_some() {
            return Err(DbError::IllegalState("select must be called before from".into()));
        }
        for c in columns {
            let c = c.into();
            if c.is_empty() {
                return Err(DbError::InvalidArgument("selected column name must not be empty".into()));
            }
            if !self.columns.contains(&c) {
                self.columns.push(c);
            }
        }
        self.state = BuilderState::ColumnsSelected;
        Ok(self)
    }

    /// Sets the target collection.
    ///
    /// # Errors
    /// `InvalidArgument` on an empty name, `IllegalState` if already set.
    pub fn from(mut self, collection: impl Into<String>) -> Result<Self, DbError> {
        let collection = collection.into();
        if collection.is_empty() {
            return Err(DbError::InvalidArgument("collection name must not be empty".into()));
        }
        if let Some(existing) = &self.collection {
            return Err(DbError::IllegalState(format!(
                "collection already set to '{existing}', refusing '{collection}'"
            )));
        }
        log::debug!("query builder: from {collection}");
        self.collection = Some(collection);
        self.state = BuilderState::FromSet;
        Ok(self)
    }

    /// Attaches the root condition, replacing any earlier one.
    #[must_use]
    pub fn where_(mut self, condition: ColumnCondition) -> Self {
        if let Some(prev) = &self.condition {
            log::debug!("query builder: condition {prev} replaced by {condition}");
        }
        self.condition = Some(condition);
        self.advance(BuilderState::ConditionSet);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self.advance(BuilderState::Sorted);
        self
    }

    #[must_use]
    pub fn sorts(mut self, sorts: impl IntoIterator<Item = Sort>) -> Self {
        let before = self.sorts.len();
        self.sorts.extend(sorts);
        if self.sorts.len() > before {
            self.advance(BuilderState::Sorted);
        }
        self
    }

    /// # Errors
    /// `InvalidArgument` if `n` is negative.
    pub fn skip(mut self, n: i64) -> Result<Self, DbError> {
        self.skip = non_negative("skip", n)?;
        self.advance(BuilderState::Paged);
        Ok(self)
    }

    /// # Errors
    /// `InvalidArgument` if `n` is negative.
    pub fn limit(mut self, n: i64) -> Result<Self, DbError> {
        self.limit = non_negative("limit", n)?;
        self.advance(BuilderState::Paged);
        Ok(self)
    }

    /// Freezes the accumulated state into a query. Each call returns an
    /// independent snapshot.
    ///
    /// # Errors
    /// `IllegalState` when `from` was never called.
    pub fn build(&self) -> Result<ColumnQuery, DbError> {
        let Some(collection) = self.collection.clone() else {
            return Err(DbError::IllegalState("from must be called before build".into()));
        };
        Ok(ColumnQuery {
            collection,
            columns: self.columns.clone(),
            condition: self.condition.clone(),
            sorts: self.sorts.clone(),
            skip: self.skip,
            limit: self.limit,
        })
    }

    /// Builds the query and hands it to `manager.select`.
    ///
    /// # Errors
    /// Build failures, or whatever the manager reports.
    pub fn get_result<M: ColumnManager + ?Sized>(&self, manager: &M) -> Result<EntityStream, DbError> {
        let query = self.build()?;
        log::debug!("query builder: executing {query}");
        manager.select(&query)
    }

    /// Builds the query and hands it to `manager.single_result`.
    ///
    /// # Errors
    /// Build failures, `NonUniqueResult`, or whatever else the manager reports.
    pub fn get_single_result<M: ColumnManager + ?Sized>(
        &self,
        manager: &M,
    ) -> Result<Option<ColumnEntity>, DbError> {
        let query = self.build()?;
        log::debug!("query builder: executing single result {query}");
        manager.single_result(&query)
    }
}
