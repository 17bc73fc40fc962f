use bson::Bson;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::observer::ColumnObserver;
use super::parse::{ConditionSerde, QuerySerde};
use super::types::ColumnQuery;
use crate::errors::DbError;
use crate::manager::{ColumnEntity, ColumnManager, EntityStream};

/// Placeholder syntax inside a JSON descriptor: a string scalar `"@name"`.
/// A leading `"@@"` escapes a literal `@` and is never a placeholder.
fn param_name(v: &Bson) -> Option<&str> {
    match v {
        Bson::String(s) => s.strip_prefix('@').filter(|n| !n.is_empty() && !n.starts_with('@')),
        _ => None,
    }
}

/// `"@@rest"` with its escape removed.
fn unescaped(v: &Bson) -> Option<String> {
    match v {
        Bson::String(s) => s.strip_prefix("@@").map(|rest| format!("@{rest}")),
        _ => None,
    }
}

fn collect_value(v: &Bson, out: &mut BTreeMap<String, Option<Bson>>) {
    if let Some(name) = param_name(v) {
        out.entry(name.to_string()).or_insert(None);
    }
}

fn collect_condition(c: &ConditionSerde, out: &mut BTreeMap<String, Option<Bson>>) {
    for v in [&c.eq, &c.gt, &c.gte, &c.lt, &c.lte, &c.like].into_iter().flatten() {
        collect_value(v, out);
    }
    for vs in [&c.between, &c.in_vals].into_iter().flatten() {
        for v in vs {
            collect_value(v, out);
        }
    }
    for nodes in [&c.and, &c.or].into_iter().flatten() {
        for n in nodes {
            collect_condition(n, out);
        }
    }
    if let Some(n) = &c.not {
        collect_condition(n, out);
    }
}

fn substitute(v: &mut Bson, params: &BTreeMap<String, Option<Bson>>) -> Result<(), DbError> {
    if let Some(literal) = unescaped(v) {
        *v = Bson::String(literal);
        return Ok(());
    }
    let Some(name) = param_name(v).map(str::to_string) else {
        return Ok(());
    };
    match params.get(&name) {
        Some(Some(bound)) => {
            *v = bound.clone();
            Ok(())
        }
        _ => Err(DbError::UnboundParameter(name)),
    }
}

fn substitute_condition(
    c: &mut ConditionSerde,
    params: &BTreeMap<String, Option<Bson>>,
) -> Result<(), DbError> {
    for v in [&mut c.eq, &mut c.gt, &mut c.gte, &mut c.lt, &mut c.lte, &mut c.like]
        .into_iter()
        .flatten()
    {
        substitute(v, params)?;
    }
    for vs in [&mut c.between, &mut c.in_vals].into_iter().flatten() {
        for v in vs {
            substitute(v, params)?;
        }
    }
    for nodes in [&mut c.and, &mut c.or].into_iter().flatten() {
        for n in nodes {
            substitute_condition(n, params)?;
        }
    }
    if let Some(n) = &mut c.not {
        substitute_condition(n, params)?;
    }
    Ok(())
}

/// A parsed query descriptor with `@name` placeholders, bound and executed
/// against a manager.
///
/// Any string operand starting with `@` is a placeholder. Write `"@@text"`
/// to compare against the literal `"@text"`.
pub struct PreparedStatement<'m, M: ColumnManager + ?Sized> {
    manager: &'m M,
    observer: Arc<dyn ColumnObserver>,
    template: QuerySerde,
    params: BTreeMap<String, Option<Bson>>,
}

impl<M: ColumnManager + ?Sized> std::fmt::Debug for PreparedStatement<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("template", &self.template)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<'m, M: ColumnManager + ?Sized> PreparedStatement<'m, M> {
    /// # Errors
    /// Returns an error if `json` is not a valid query descriptor document.
    pub fn parse(
        json: &str,
        manager: &'m M,
        observer: Arc<dyn ColumnObserver>,
    ) -> Result<Self, DbError> {
        let template: QuerySerde = serde_json::from_str(json)?;
        let mut params = BTreeMap::new();
        if let Some(c) = &template.condition {
            collect_condition(c, &mut params);
        }
        log::debug!("prepared statement with {} parameter(s)", params.len());
        Ok(Self { manager, observer, template, params })
    }

    /// Binds a value to `@name`.
    ///
    /// # Errors
    /// `InvalidArgument` for a name the statement does not declare,
    /// `NullArgument` for a null value.
    pub fn bind(&mut self, name: &str, value: impl Into<Bson>) -> Result<&mut Self, DbError> {
        let value = value.into();
        if matches!(value, Bson::Null) {
            return Err(DbError::NullArgument(format!("value for @{name}")));
        }
        let Some(slot) = self.params.get_mut(name) else {
            return Err(DbError::InvalidArgument(format!("unknown parameter @{name}")));
        };
        *slot = Some(value);
        Ok(self)
    }

    /// Declared parameter names, sorted.
    #[must_use]
    pub fn params(&self) -> Vec<&str> {
        self.params.keys().map(String::as_str).collect()
    }

    /// The query with every placeholder substituted.
    ///
    /// # Errors
    /// `UnboundParameter` if a placeholder has no value, plus any descriptor error.
    pub fn query(&self) -> Result<ColumnQuery, DbError> {
        let mut qs = self.template.clone();
        if let Some(c) = &mut qs.condition {
            substitute_condition(c, &self.params)?;
        }
        qs.into_query(self.observer.as_ref())
    }

    /// # Errors
    /// Substitution errors, or whatever the manager reports.
    pub fn result(&self) -> Result<EntityStream, DbError> {
        self.manager.select(&self.query()?)
    }

    /// # Errors
    /// Substitution errors, `NonUniqueResult`, or whatever the manager reports.
    pub fn single_result(&self) -> Result<Option<ColumnEntity>, DbError> {
        self.manager.single_result(&self.query()?)
    }
}
