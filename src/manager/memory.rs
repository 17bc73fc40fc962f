use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Instant;

use super::cursor::Cursor;
use super::entity::ColumnEntity;
use super::metrics::{ManagerMetrics, MetricsSnapshot};
use super::{ColumnManager, EntityStream};
use crate::condition::{CompiledCondition, compare_entities};
use crate::config::ManagerConfig;
use crate::errors::DbError;
use crate::query::ColumnQuery;
use crate::utils::num::{u128_to_u64_saturating, u64_to_usize_saturating, usize_to_u64};

/// Reference manager keeping every collection in memory.
///
/// Selects work on a snapshot taken under the read lock, so a returned stream
/// is unaffected by later writes.
#[derive(Default)]
pub struct InMemoryManager {
    families: RwLock<HashMap<String, Vec<ColumnEntity>>>,
    config: ManagerConfig,
    metrics: ManagerMetrics,
}

impl std::fmt::Debug for InMemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryManager")
            .field("config", &self.config)
            .field("collections", &self.families.read().len())
            .finish()
    }
}

impl InMemoryManager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ManagerConfig) -> Self {
        Self { families: RwLock::new(HashMap::new()), config, metrics: ManagerMetrics::default() }
    }

    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[must_use]
    pub fn metrics_text(&self) -> String {
        self.metrics.metrics_text()
    }

    /// Stores `entity` in the collection named by the entity.
    pub fn insert(&self, entity: ColumnEntity) {
        self.metrics.record_writes(1);
        self.families.write().entry(entity.name().to_string()).or_default().push(entity);
    }

    pub fn insert_many(&self, entities: impl IntoIterator<Item = ColumnEntity>) -> usize {
        let mut families = self.families.write();
        let mut n = 0usize;
        for e in entities {
            families.entry(e.name().to_string()).or_default().push(e);
            n += 1;
        }
        self.metrics.record_writes(usize_to_u64(n));
        n
    }

    /// Removes every entity of the query's collection matching its condition
    /// (all of them when there is none). Projection, sorts and paging are ignored.
    pub fn delete(&self, query: &ColumnQuery) -> u64 {
        let mut families = self.families.write();
        let Some(entities) = families.get_mut(query.collection()) else {
            return 0;
        };
        let before = entities.len();
        match query.condition() {
            Some(c) => {
                let c = CompiledCondition::new(c.clone());
                entities.retain(|e| !c.matches(e));
            }
            None => entities.clear(),
        }
        let deleted = usize_to_u64(before - entities.len());
        self.metrics.record_writes(deleted);
        log::debug!("deleted {deleted} entities from {}", query.collection());
        deleted
    }

    /// Collection names, sorted.
    #[must_use]
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn effective_limit(&self, limit: u64) -> Option<usize> {
        let cap = self.config.max_results;
        match (limit, cap) {
            (0, 0) => None,
            (0, cap) => Some(cap),
            (l, 0) => Some(u64_to_usize_saturating(l)),
            (l, cap) => Some(u64_to_usize_saturating(l).min(cap)),
        }
    }
}

impl InMemoryManager {
    /// Opens a cursor over a snapshot of the query's collection, yielding at
    /// most `remaining` entities.
    fn open(&self, query: &ColumnQuery, remaining: Option<usize>, op: &str) -> Cursor {
        let bench_start = Instant::now();
        let snapshot: Vec<ColumnEntity> =
            self.families.read().get(query.collection()).cloned().unwrap_or_default();
        let candidates = snapshot.len();

        let mut sorts = query.sorts();
        if sorts.len() > self.config.max_sort_fields {
            log::warn!(
                "too many sort keys: {}, using the first {}",
                sorts.len(),
                self.config.max_sort_fields
            );
            sorts = &sorts[..self.config.max_sort_fields];
        }

        let condition = query.condition().cloned().map(CompiledCondition::new);
        let cursor = if sorts.is_empty() {
            Cursor {
                entities: snapshot.into_iter(),
                condition,
                columns: query.columns().to_vec(),
                skip: u64_to_usize_saturating(query.skip()),
                remaining,
            }
        } else {
            let mut matched: Vec<ColumnEntity> = match &condition {
                Some(c) => snapshot.into_iter().filter(|e| c.matches(e)).collect(),
                None => snapshot,
            };
            matched.sort_by(|a, b| compare_entities(a, b, sorts));
            Cursor {
                entities: matched.into_iter(),
                condition: None,
                columns: query.columns().to_vec(),
                skip: u64_to_usize_saturating(query.skip()),
                remaining,
            }
        };

        let dur_ms = u128_to_u64_saturating(bench_start.elapsed().as_millis());
        self.metrics.record_query(query.collection(), dur_ms, self.config.slow_query_ms);
        crate::dev6!(
            "{{\"bench\":\"query\",\"op\":\"{}\",\"collection\":\"{}\",\"duration_ms\":{},\"sorted\":{},\"candidates\":{},\"limit\":{},\"skip\":{}}}",
            op,
            query.collection(),
            dur_ms,
            !sorts.is_empty(),
            usize_to_u64(candidates),
            query.limit(),
            query.skip()
        );
        log::debug!("{op}: {query}");
        cursor
    }
}

impl ColumnManager for InMemoryManager {
    fn select(&self, query: &ColumnQuery) -> Result<EntityStream, DbError> {
        Ok(Box::new(self.open(query, self.effective_limit(query.limit()), "select")))
    }

    /// Uniqueness is checked against every match within the query's own
    /// limit; `max_results` does not apply here.
    fn single_result(&self, query: &ColumnQuery) -> Result<Option<ColumnEntity>, DbError> {
        self.metrics.single_results_total.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let limit = (query.limit() > 0).then(|| u64_to_usize_saturating(query.limit()));
        let mut cursor = self.open(query, limit, "single_result");
        let Some(first) = cursor.next() else {
            return Ok(None);
        };
        match cursor.count() {
            0 => Ok(Some(first)),
            extra => {
                self.metrics.non_unique_total.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                Err(DbError::NonUniqueResult(extra + 1))
            }
        }
    }

    fn count(&self, collection: &str) -> Result<u64, DbError> {
        Ok(self.families.read().get(collection).map_or(0, |v| usize_to_u64(v.len())))
    }
}
