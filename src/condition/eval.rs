use bson::Bson;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::core::ColumnCondition;
use super::kind::ConditionKind;
use crate::column::ColumnValue;
use crate::manager::ColumnEntity;
use crate::query::{Sort, SortType};

type LikeCache = HashMap<String, Option<Regex>>;

/// A condition with its LIKE patterns compiled up front, so evaluating it over
/// many entities builds each regex once.
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    condition: ColumnCondition,
    likes: LikeCache,
}

impl CompiledCondition {
    #[must_use]
    pub fn new(condition: ColumnCondition) -> Self {
        let mut likes = LikeCache::new();
        collect_likes(&condition, &mut likes);
        Self { condition, likes }
    }

    #[must_use]
    pub const fn condition(&self) -> &ColumnCondition {
        &self.condition
    }

    /// Number of distinct LIKE patterns held.
    #[must_use]
    pub fn like_patterns(&self) -> usize {
        self.likes.len()
    }

    #[must_use]
    pub fn matches(&self, entity: &ColumnEntity) -> bool {
        eval_with(entity, &self.condition, &self.likes)
    }
}

fn collect_likes(cond: &ColumnCondition, likes: &mut LikeCache) {
    match cond.kind() {
        ConditionKind::And | ConditionKind::Or | ConditionKind::Not => {
            for c in cond.children() {
                collect_likes(c, likes);
            }
        }
        ConditionKind::Like => {
            if let ColumnValue::Scalar(Bson::String(pattern)) = cond.column().value()
                && !likes.contains_key(pattern)
            {
                likes.insert(pattern.clone(), like_regex(pattern));
            }
        }
        _ => {}
    }
}

/// Evaluates a condition tree against one entity.
///
/// A leaf whose column is missing from the entity never matches; NOT inverts
/// whatever its child yields. Use [`CompiledCondition`] when evaluating the
/// same condition repeatedly.
#[must_use]
pub fn eval_condition(entity: &ColumnEntity, cond: &ColumnCondition) -> bool {
    let mut likes = LikeCache::new();
    collect_likes(cond, &mut likes);
    eval_with(entity, cond, &likes)
}

fn eval_with(entity: &ColumnEntity, cond: &ColumnCondition, likes: &LikeCache) -> bool {
    match cond.kind() {
        ConditionKind::And => cond.children().iter().all(|c| eval_with(entity, c, likes)),
        ConditionKind::Or => cond.children().iter().any(|c| eval_with(entity, c, likes)),
        ConditionKind::Not => !cond.children().iter().all(|c| eval_with(entity, c, likes)),
        kind => {
            let column = cond.column();
            let Some(actual) = entity.find(column.name()).and_then(|c| c.as_bson()) else {
                return false;
            };
            eval_leaf(kind, &actual, column.value(), likes)
        }
    }
}

fn eval_leaf(kind: ConditionKind, actual: &Bson, operand: &ColumnValue, likes: &LikeCache) -> bool {
    match (kind, operand) {
        (ConditionKind::Equals, ColumnValue::Scalar(v)) => compare_bson(actual, v) == Ordering::Equal,
        (ConditionKind::GreaterThan, ColumnValue::Scalar(v)) => {
            comparable(actual, v) && compare_bson(actual, v) == Ordering::Greater
        }
        (ConditionKind::GreaterEqualsThan, ColumnValue::Scalar(v)) => {
            comparable(actual, v) && compare_bson(actual, v) != Ordering::Less
        }
        (ConditionKind::LesserThan, ColumnValue::Scalar(v)) => {
            comparable(actual, v) && compare_bson(actual, v) == Ordering::Less
        }
        (ConditionKind::LesserEqualsThan, ColumnValue::Scalar(v)) => {
            comparable(actual, v) && compare_bson(actual, v) != Ordering::Greater
        }
        (ConditionKind::Like, ColumnValue::Scalar(Bson::String(pattern))) => match actual {
            Bson::String(s) => likes.get(pattern).and_then(Option::as_ref).is_some_and(|re| re.is_match(s)),
            _ => false,
        },
        (ConditionKind::Between, ColumnValue::List(bounds)) if bounds.len() == 2 => {
            comparable(actual, &bounds[0])
                && comparable(actual, &bounds[1])
                && compare_bson(actual, &bounds[0]) != Ordering::Less
                && compare_bson(actual, &bounds[1]) != Ordering::Greater
        }
        (ConditionKind::In, ColumnValue::List(values)) => {
            values.iter().any(|v| compare_bson(actual, v) == Ordering::Equal)
        }
        _ => false,
    }
}

/// Translates a SQL LIKE pattern (`%`, `_`) into an anchored regex.
pub(crate) fn like_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '%' | '_' => {
                re.push_str(&regex::escape(&literal));
                literal.clear();
                re.push_str(if ch == '%' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    match Regex::new(&re) {
        Ok(r) => Some(r),
        Err(e) => {
            log::warn!("LIKE pattern {pattern:?} did not compile: {e}");
            None
        }
    }
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

/// Ordering comparisons only make sense between values of the same family.
fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || type_rank(a) == type_rank(b)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        _ => f64::NAN,
    }
}

/// Total order over BSON values: numbers compare numerically across widths,
/// strings and booleans naturally, arrays element-wise, documents by their
/// key-sorted entries, and values of different types by type.
///
/// Two values compare `Equal` only when they are the same value (numbers of
/// different widths included).
#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        if let (Bson::Int64(x), Bson::Int64(y)) = (a, b) {
            return x.cmp(y);
        }
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Bson::Null, Bson::Null) => Ordering::Equal,
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::Array(x), Bson::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_bson(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => (x.time, x.increment).cmp(&(y.time, y.increment)),
        (Bson::Binary(x), Bson::Binary(y)) => {
            (u8::from(x.subtype), &x.bytes).cmp(&(u8::from(y.subtype), &y.bytes))
        }
        (Bson::Decimal128(x), Bson::Decimal128(y)) => x.bytes().cmp(&y.bytes()),
        _ if a == b => Ordering::Equal,
        // remaining kinds have no natural order; keep distinct values distinct
        _ => a.to_string().cmp(&b.to_string()).then_with(|| format!("{a:?}").cmp(&format!("{b:?}"))),
    }
}

fn compare_documents(x: &bson::Document, y: &bson::Document) -> Ordering {
    let mut xs: Vec<(&String, &Bson)> = x.iter().collect();
    let mut ys: Vec<(&String, &Bson)> = y.iter().collect();
    xs.sort_by(|l, r| l.0.cmp(r.0));
    ys.sort_by(|l, r| l.0.cmp(r.0));
    for ((lk, lv), (rk, rv)) in xs.iter().zip(&ys) {
        let ord = lk.cmp(rk).then_with(|| compare_bson(lv, rv));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    xs.len().cmp(&ys.len())
}

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::String(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::Boolean(_) => 5,
        Bson::DateTime(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Timestamp(_) => 8,
        Bson::Binary(_) => 9,
        Bson::Decimal128(_) => 10,
        Bson::RegularExpression(_) => 11,
        _ => 12,
    }
}

/// Multi-key ordering of two entities; a missing column sorts before a present one.
#[must_use]
pub fn compare_entities(a: &ColumnEntity, b: &ColumnEntity, sorts: &[Sort]) -> Ordering {
    for s in sorts {
        let va = a.find(s.field()).and_then(|c| c.as_bson());
        let vb = b.find(s.field()).and_then(|c| c.as_bson());
        let ord = match (va, vb) {
            (Some(x), Some(y)) => compare_bson(&x, &y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.direction() == SortType::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}
