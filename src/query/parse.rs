use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize};

use super::builder::QueryBuilder;
use super::observer::{ColumnObserver, IdentityObserver};
use super::types::{ColumnQuery, Sort, SortType};
use crate::column::ColumnValue;
use crate::condition::{ColumnCondition, ConditionKind};
use crate::errors::DbError;

// A present-but-null operand must survive as `Some(Bson::Null)` so it is
// reported as a null argument rather than a missing operator.
fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Bson>, D::Error> {
    Bson::deserialize(d).map(Some)
}

const fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Serde-facing form of a condition node.
///
/// Exactly one operator key must be present. Comparison operators need
/// `field`; `$and`/`$or` take arrays of nodes and `$not` a single node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSerde {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, rename = "$eq", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub eq: Option<Bson>,
    #[serde(default, rename = "$gt", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub gt: Option<Bson>,
    #[serde(default, rename = "$gte", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub gte: Option<Bson>,
    #[serde(default, rename = "$lt", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub lt: Option<Bson>,
    #[serde(default, rename = "$lte", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub lte: Option<Bson>,
    #[serde(default, rename = "$like", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub like: Option<Bson>,
    #[serde(default, rename = "$between", skip_serializing_if = "Option::is_none")]
    pub between: Option<Vec<Bson>>,
    #[serde(default, rename = "$in", skip_serializing_if = "Option::is_none")]
    pub in_vals: Option<Vec<Bson>>,
    #[serde(default, rename = "$and", skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<ConditionSerde>>,
    #[serde(default, rename = "$or", skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<ConditionSerde>>,
    #[serde(default, rename = "$not", skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<ConditionSerde>>,
}

impl ConditionSerde {
    fn operator_count(&self) -> usize {
        [
            self.eq.is_some(),
            self.gt.is_some(),
            self.gte.is_some(),
            self.lt.is_some(),
            self.lte.is_some(),
            self.like.is_some(),
            self.between.is_some(),
            self.in_vals.is_some(),
            self.and.is_some(),
            self.or.is_some(),
            self.not.is_some(),
        ]
        .into_iter()
        .filter(|p| *p)
        .count()
    }

    /// Converts into a validated condition, mapping field names through `observer`.
    ///
    /// # Errors
    /// `InvalidArgument` unless exactly one operator is present, `NullArgument`
    /// for a comparison without `field` or with a null operand, plus every
    /// factory error of [`ColumnCondition`].
    pub fn into_condition(
        self,
        entity: &str,
        observer: &dyn ColumnObserver,
    ) -> Result<ColumnCondition, DbError> {
        let ops = self.operator_count();
        if ops != 1 {
            return Err(DbError::InvalidArgument(format!(
                "a condition needs exactly one operator, found {ops}"
            )));
        }
        let children = |nodes: Vec<Self>| -> Result<Vec<ColumnCondition>, DbError> {
            nodes.into_iter().map(|n| n.into_condition(entity, observer)).collect()
        };
        let Self { field, eq, gt, gte, lt, lte, like, between, in_vals, and, or, not } = self;
        if let Some(nodes) = and {
            return ColumnCondition::and(children(nodes)?);
        }
        if let Some(nodes) = or {
            return ColumnCondition::or(children(nodes)?);
        }
        if let Some(node) = not {
            return Ok(node.into_condition(entity, observer)?.negate());
        }
        let Some(field) = field else {
            return Err(DbError::NullArgument("condition field".into()));
        };
        let field = observer.fire_field(entity, &field);
        if let Some(v) = eq {
            ColumnCondition::equals(field, v)
        } else if let Some(v) = gt {
            ColumnCondition::greater_than(field, v)
        } else if let Some(v) = gte {
            ColumnCondition::greater_equals(field, v)
        } else if let Some(v) = lt {
            ColumnCondition::lesser_than(field, v)
        } else if let Some(v) = lte {
            ColumnCondition::lesser_equals(field, v)
        } else if let Some(v) = like {
            ColumnCondition::like(field, v)
        } else if let Some(bounds) = between {
            ColumnCondition::between(field, bounds)
        } else if let Some(values) = in_vals {
            ColumnCondition::is_in(field, values)
        } else {
            Err(DbError::InvalidArgument("no comparison operator provided".into()))
        }
    }
}

impl TryFrom<ConditionSerde> for ColumnCondition {
    type Error = DbError;
    fn try_from(cs: ConditionSerde) -> Result<Self, Self::Error> {
        cs.into_condition("", &IdentityObserver)
    }
}

impl From<&ColumnCondition> for ConditionSerde {
    fn from(c: &ColumnCondition) -> Self {
        let mut out = Self::default();
        let scalar = || c.column().get().ok().cloned();
        let list = || match c.column().value() {
            ColumnValue::List(vs) => Some(vs.clone()),
            _ => None,
        };
        match c.kind() {
            ConditionKind::And => out.and = Some(c.children().iter().map(Self::from).collect()),
            ConditionKind::Or => out.or = Some(c.children().iter().map(Self::from).collect()),
            ConditionKind::Not => out.not = c.children().first().map(|n| Box::new(Self::from(n))),
            kind => {
                out.field = Some(c.column().name().to_string());
                match kind {
                    ConditionKind::Equals => out.eq = scalar(),
                    ConditionKind::GreaterThan => out.gt = scalar(),
                    ConditionKind::GreaterEqualsThan => out.gte = scalar(),
                    ConditionKind::LesserThan => out.lt = scalar(),
                    ConditionKind::LesserEqualsThan => out.lte = scalar(),
                    ConditionKind::Like => out.like = scalar(),
                    ConditionKind::Between => out.between = list(),
                    ConditionKind::In => out.in_vals = list(),
                    ConditionKind::And | ConditionKind::Or | ConditionKind::Not => {}
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSerde {
    pub field: String,
    #[serde(default)]
    pub order: SortType,
}

/// Serde-facing form of a whole query; mirrors the builder calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySerde {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionSerde>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSerde>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub skip: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: i64,
}

impl QuerySerde {
    /// Replays the descriptor through a [`QueryBuilder`], so the same
    /// validation applies as for hand-built queries.
    ///
    /// # Errors
    /// `NullArgument` for null `select` entries, `IllegalState` without `from`,
    /// plus any builder or condition error.
    pub fn into_query(self, observer: &dyn ColumnObserver) -> Result<ColumnQuery, DbError> {
        let entity = self.from.as_deref().map(|f| observer.fire_entity(f));
        let entity_name = entity.clone().unwrap_or_default();
        let mut b = QueryBuilder::new();
        if !self.select.is_empty() {
            let columns = self
                .select
                .into_iter()
                .enumerate()
                .map(|(i, c)| {
                    c.map(|c| observer.fire_field(&entity_name, &c))
                        .ok_or_else(|| DbError::NullArgument(format!("select[{i}]")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            b = b.select(columns)?;
        }
        if let Some(e) = entity {
            b = b.from(e)?;
        }
        if let Some(c) = self.condition {
            b = b.where_(c.into_condition(&entity_name, observer)?);
        }
        for s in self.sort {
            b = b.sort(Sort::of(observer.fire_field(&entity_name, &s.field), s.order)?);
        }
        b.skip(self.skip)?.limit(self.limit)?.build()
    }
}

impl From<&ColumnQuery> for QuerySerde {
    fn from(q: &ColumnQuery) -> Self {
        Self {
            select: q.columns().iter().cloned().map(Some).collect(),
            from: Some(q.collection().to_string()),
            condition: q.condition().map(ConditionSerde::from),
            sort: q
                .sorts()
                .iter()
                .map(|s| SortSerde { field: s.field().to_string(), order: s.direction() })
                .collect(),
            skip: i64::try_from(q.skip()).unwrap_or(i64::MAX),
            limit: i64::try_from(q.limit()).unwrap_or(i64::MAX),
        }
    }
}

/// # Errors
/// Returns an error if the JSON cannot be parsed or the descriptor is invalid.
pub fn parse_query_json(json: &str) -> Result<ColumnQuery, DbError> {
    parse_query_json_with(json, &IdentityObserver)
}

/// Like [`parse_query_json`], mapping names through `observer`.
///
/// # Errors
/// Returns an error if the JSON cannot be parsed or the descriptor is invalid.
pub fn parse_query_json_with(json: &str, observer: &dyn ColumnObserver) -> Result<ColumnQuery, DbError> {
    let qs: QuerySerde = serde_json::from_str(json)?;
    qs.into_query(observer)
}

/// # Errors
/// Returns an error if the JSON cannot be parsed into a condition.
pub fn parse_condition_json(json: &str) -> Result<ColumnCondition, DbError> {
    let cs: ConditionSerde = serde_json::from_str(json)?;
    ColumnCondition::try_from(cs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_condition() {
        let c = parse_condition_json(r#"{"field":"age","$gt":10}"#).unwrap();
        assert_eq!(c.kind(), ConditionKind::GreaterThan);
        assert_eq!(c.column().get_as::<i64>().unwrap(), 10);
    }

    #[test]
    fn operator_count_must_be_one() {
        let none = parse_condition_json(r#"{"field":"age"}"#);
        assert!(matches!(none, Err(DbError::InvalidArgument(_))));
        let two = parse_condition_json(r#"{"field":"age","$gt":1,"$lt":5}"#);
        assert!(matches!(two, Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn null_operand_and_missing_field_are_null_arguments() {
        let null_value = parse_condition_json(r#"{"field":"age","$eq":null}"#);
        assert!(matches!(null_value, Err(DbError::NullArgument(_))));
        let no_field = parse_condition_json(r#"{"$eq":3}"#);
        assert!(matches!(no_field, Err(DbError::NullArgument(_))));
    }

    #[test]
    fn nested_not_collapses() {
        let c = parse_condition_json(r#"{"$not":{"$not":{"field":"name","$eq":"Ada"}}}"#).unwrap();
        assert_eq!(c, ColumnCondition::equals("name", "Ada").unwrap());
    }

    #[test]
    fn query_descriptor_runs_through_builder() {
        let q = parse_query_json(
            r#"{"select":["name"],"from":"Person",
                "where":{"$and":[{"field":"age","$between":[10,20]},{"field":"city","$in":["Assis","Salvador"]}]},
                "sort":[{"field":"name","order":"Desc"}],"skip":2,"limit":5}"#,
        )
        .unwrap();
        assert_eq!(q.collection(), "Person");
        assert_eq!(q.columns(), &["name".to_string()]);
        assert_eq!(q.condition().unwrap().kind(), ConditionKind::And);
        assert_eq!(q.sorts()[0], Sort::descending("name").unwrap());
        assert_eq!((q.skip(), q.limit()), (2, 5));
    }

    #[test]
    fn query_descriptor_errors() {
        assert!(matches!(parse_query_json(r#"{"select":["a"]}"#), Err(DbError::IllegalState(_))));
        assert!(matches!(
            parse_query_json(r#"{"select":["a",null],"from":"T"}"#),
            Err(DbError::NullArgument(_))
        ));
        assert!(matches!(
            parse_query_json(r#"{"from":"T","limit":-1}"#),
            Err(DbError::InvalidArgument(_))
        ));
        assert!(matches!(parse_query_json("{"), Err(DbError::Json(_))));
    }

    #[test]
    fn to_json_reparses_to_equal_query() {
        let q = parse_query_json(
            r#"{"from":"Person","where":{"$or":[{"field":"name","$like":"Ada%"},{"$not":{"field":"age","$lte":3}}]},"limit":10}"#,
        )
        .unwrap();
        let again = parse_query_json(&q.to_json().unwrap()).unwrap();
        assert_eq!(q, again);
    }
}
