//! `ColumnTemplate`: a thin convenience layer over a [`ColumnManager`].
//!
//! It adds no semantics of its own. Built queries go straight to the manager;
//! JSON descriptors are parsed with the template's observer first.

use std::sync::Arc;

use crate::errors::DbError;
use crate::manager::{ColumnEntity, ColumnManager, EntityStream};
use crate::query::{ColumnObserver, ColumnQuery, IdentityObserver, PreparedStatement, parse_query_json_with};

pub struct ColumnTemplate<M: ColumnManager + ?Sized> {
    manager: Arc<M>,
    observer: Arc<dyn ColumnObserver>,
}

impl<M: ColumnManager + ?Sized> Clone for ColumnTemplate<M> {
    fn clone(&self) -> Self {
        Self { manager: Arc::clone(&self.manager), observer: Arc::clone(&self.observer) }
    }
}

impl<M: ColumnManager + ?Sized> std::fmt::Debug for ColumnTemplate<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnTemplate").finish_non_exhaustive()
    }
}

impl<M: ColumnManager + ?Sized> ColumnTemplate<M> {
    pub fn new(manager: Arc<M>) -> Self {
        Self { manager, observer: Arc::new(IdentityObserver) }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ColumnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// # Errors
    /// Whatever the manager reports.
    pub fn select(&self, query: &ColumnQuery) -> Result<EntityStream, DbError> {
        log::debug!("template select: {query}");
        self.manager.select(query)
    }

    /// # Errors
    /// `NonUniqueResult` when more than one entity matches, or a manager failure.
    pub fn single_result(&self, query: &ColumnQuery) -> Result<Option<ColumnEntity>, DbError> {
        log::debug!("template single_result: {query}");
        self.manager.single_result(query)
    }

    /// Parses a JSON descriptor and runs it.
    ///
    /// # Errors
    /// Descriptor errors (`Json`, `InvalidArgument`, `NullArgument`, `IllegalState`)
    /// or a manager failure.
    pub fn query(&self, json: &str) -> Result<EntityStream, DbError> {
        let q = parse_query_json_with(json, self.observer.as_ref())?;
        self.select(&q)
    }

    /// # Errors
    /// As [`query`](Self::query), plus `NonUniqueResult`.
    pub fn query_single(&self, json: &str) -> Result<Option<ColumnEntity>, DbError> {
        let q = parse_query_json_with(json, self.observer.as_ref())?;
        self.single_result(&q)
    }

    /// # Errors
    /// `Json` when the descriptor is not valid JSON of the expected shape.
    pub fn prepare(&self, json: &str) -> Result<PreparedStatement<'_, M>, DbError> {
        PreparedStatement::parse(json, self.manager.as_ref(), Arc::clone(&self.observer))
    }

    /// # Errors
    /// Whatever the manager reports.
    pub fn count(&self, collection: &str) -> Result<u64, DbError> {
        self.manager.count(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::InMemoryManager;
    use bson::doc;

    struct Prefixed;
    impl ColumnObserver for Prefixed {
        fn fire_entity(&self, entity: &str) -> String {
            format!("app_{entity}")
        }
    }

    fn template() -> ColumnTemplate<InMemoryManager> {
        let m = Arc::new(InMemoryManager::new());
        m.insert(ColumnEntity::from_document("app_God", doc! {"name": "Diana", "power": 9}).unwrap());
        m.insert(ColumnEntity::from_document("app_God", doc! {"name": "Poseidon", "power": 7}).unwrap());
        ColumnTemplate::new(m).with_observer(Arc::new(Prefixed))
    }

    #[test]
    fn json_queries_go_through_the_observer() {
        let t = template();
        let rows: Vec<_> = t.query(r#"{"from":"God","where":{"field":"power","$gt":8}}"#).unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(t.count("app_God").unwrap(), 2);
    }

    #[test]
    fn prepared_statement_uses_template_manager() {
        let t = template();
        let mut ps = t.prepare(r#"{"from":"God","where":{"field":"name","$eq":"@name"}}"#).unwrap();
        ps.bind("name", "Poseidon").unwrap();
        let god = ps.single_result().unwrap().unwrap();
        assert_eq!(god.find("power").unwrap().get_as::<i64>().unwrap(), 7);
    }

    #[test]
    fn query_single_reports_duplicates() {
        let t = template();
        assert!(matches!(t.query_single(r#"{"from":"God"}"#), Err(DbError::NonUniqueResult(2))));
    }
}
