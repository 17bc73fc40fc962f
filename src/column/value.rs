use bson::Bson;
use ordered_float::OrderedFloat;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::condition::ColumnCondition;
use crate::errors::DbError;

/// The payload of a [`Column`](super::Column).
///
/// Scalars and scalar lists are stored as BSON; composite conditions keep their
/// children as typed nodes so the tree never has to be re-decoded.
#[derive(Debug, Clone)]
pub enum ColumnValue {
    Scalar(Bson),
    List(Vec<Bson>),
    Condition(Box<ColumnCondition>),
    Conditions(Vec<ColumnCondition>),
}

impl ColumnValue {
    /// Shape name used in `TypeMismatch` errors.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::List(_) => "list of scalars",
            Self::Condition(_) => "condition",
            Self::Conditions(_) => "list of conditions",
        }
    }

    pub(crate) fn is_null(&self) -> bool {
        match self {
            Self::Scalar(v) => matches!(v, Bson::Null),
            Self::List(vs) => vs.iter().any(|v| matches!(v, Bson::Null)),
            Self::Condition(_) | Self::Conditions(_) => false,
        }
    }
}

impl From<Bson> for ColumnValue {
    fn from(v: Bson) -> Self {
        match v {
            Bson::Array(items) => Self::List(items),
            other => Self::Scalar(other),
        }
    }
}

impl From<Vec<Bson>> for ColumnValue {
    fn from(v: Vec<Bson>) -> Self {
        Self::List(v)
    }
}

impl From<ColumnCondition> for ColumnValue {
    fn from(c: ColumnCondition) -> Self {
        Self::Condition(Box::new(c))
    }
}

impl From<Vec<ColumnCondition>> for ColumnValue {
    fn from(v: Vec<ColumnCondition>) -> Self {
        Self::Conditions(v)
    }
}

impl PartialEq for ColumnValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => scalar_eq(a, b),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| scalar_eq(x, y))
            }
            (Self::Condition(a), Self::Condition(b)) => a == b,
            (Self::Conditions(a), Self::Conditions(b)) => same_multiset(a, b),
            _ => false,
        }
    }
}

impl Eq for ColumnValue {}

impl Hash for ColumnValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Scalar(v) => hash_bson(v, state),
            Self::List(vs) => {
                vs.len().hash(state);
                for v in vs {
                    hash_bson(v, state);
                }
            }
            Self::Condition(c) => c.hash(state),
            Self::Conditions(cs) => {
                // commutative combination keeps the hash consistent with multiset equality
                let mut acc = 0u64;
                for c in cs {
                    let mut h = DefaultHasher::new();
                    c.hash(&mut h);
                    acc = acc.wrapping_add(h.finish());
                }
                cs.len().hash(state);
                acc.hash(state);
            }
        }
    }
}

fn same_multiset(a: &[ColumnCondition], b: &[ColumnCondition]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let hit = b.iter().enumerate().find(|(i, y)| !used[*i] && x == *y).map(|(i, _)| i);
        if let Some(i) = hit {
            used[i] = true;
            true
        } else {
            false
        }
    })
}

/// Structural BSON equality where doubles compare by total order (so NaN == NaN)
/// and sub-documents ignore key order.
pub(crate) fn scalar_eq(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Double(x), Bson::Double(y)) => OrderedFloat(*x) == OrderedFloat(*y),
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| scalar_eq(l, r))
        }
        (Bson::Document(x), Bson::Document(y)) => {
            x.len() == y.len() && x.iter().all(|(k, l)| y.get(k).is_some_and(|r| scalar_eq(l, r)))
        }
        _ => a == b,
    }
}

pub(crate) fn hash_bson<H: Hasher>(v: &Bson, state: &mut H) {
    std::mem::discriminant(v).hash(state);
    match v {
        Bson::Null => {}
        Bson::Boolean(b) => b.hash(state),
        Bson::Int32(i) => i.hash(state),
        Bson::Int64(i) => i.hash(state),
        Bson::Double(f) => OrderedFloat(*f).hash(state),
        Bson::String(s) => s.hash(state),
        Bson::Array(items) => {
            items.len().hash(state);
            for item in items {
                hash_bson(item, state);
            }
        }
        Bson::Document(doc) => {
            // entries combine commutatively, matching the key-order-free equality
            let mut acc = 0u64;
            for (k, v) in doc {
                let mut h = DefaultHasher::new();
                k.hash(&mut h);
                hash_bson(v, &mut h);
                acc = acc.wrapping_add(h.finish());
            }
            doc.len().hash(state);
            acc.hash(state);
        }
        other => other.to_string().hash(state),
    }
}

/// Human-readable BSON kind, used when reporting mismatches.
pub(crate) fn bson_kind(v: &Bson) -> &'static str {
    match v {
        Bson::Null => "null",
        Bson::Boolean(_) => "bool",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        _ => "bson",
    }
}

/// Shapes a [`Column`](super::Column) value can be read back as.
///
/// This is the typed replacement for "get as type X": every implementation
/// either converts the stored value or fails with [`DbError::TypeMismatch`].
pub trait FromColumnValue: Sized {
    /// # Errors
    /// Returns `TypeMismatch` when the stored shape is incompatible.
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError>;
}

fn mismatch<T>(expected: &str, value: &ColumnValue) -> Result<T, DbError> {
    let found = match value {
        ColumnValue::Scalar(v) => bson_kind(v),
        other => other.shape(),
    };
    Err(DbError::type_mismatch(expected, found))
}

fn scalar_i64(v: &Bson) -> Option<i64> {
    match v {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn scalar_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

impl FromColumnValue for Bson {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Scalar(v) => Ok(v.clone()),
            other => mismatch("scalar", other),
        }
    }
}

impl FromColumnValue for String {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Scalar(Bson::String(s)) => Ok(s.clone()),
            other => mismatch("string", other),
        }
    }
}

impl FromColumnValue for bool {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Scalar(Bson::Boolean(b)) => Ok(*b),
            other => mismatch("bool", other),
        }
    }
}

impl FromColumnValue for i64 {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Scalar(v) => scalar_i64(v).map_or_else(|| mismatch("integer", value), Ok),
            other => mismatch("integer", other),
        }
    }
}

impl FromColumnValue for i32 {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Scalar(Bson::Int32(i)) => Ok(*i),
            ColumnValue::Scalar(Bson::Int64(i)) => {
                Self::try_from(*i).map_err(|_| DbError::type_mismatch("int32", "int64 out of range"))
            }
            other => mismatch("int32", other),
        }
    }
}

impl FromColumnValue for f64 {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Scalar(v) => scalar_f64(v).map_or_else(|| mismatch("number", value), Ok),
            other => mismatch("number", other),
        }
    }
}

impl FromColumnValue for Vec<Bson> {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::List(vs) => Ok(vs.clone()),
            other => mismatch("list of scalars", other),
        }
    }
}

impl FromColumnValue for Vec<i64> {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::List(vs) => vs
                .iter()
                .map(|v| scalar_i64(v).ok_or_else(|| DbError::type_mismatch("integer", bson_kind(v))))
                .collect(),
            other => mismatch("list of integers", other),
        }
    }
}

impl FromColumnValue for Vec<f64> {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::List(vs) => vs
                .iter()
                .map(|v| scalar_f64(v).ok_or_else(|| DbError::type_mismatch("number", bson_kind(v))))
                .collect(),
            other => mismatch("list of numbers", other),
        }
    }
}

impl FromColumnValue for Vec<String> {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::List(vs) => vs
                .iter()
                .map(|v| match v {
                    Bson::String(s) => Ok(s.clone()),
                    other => Err(DbError::type_mismatch("string", bson_kind(other))),
                })
                .collect(),
            other => mismatch("list of strings", other),
        }
    }
}

impl FromColumnValue for ColumnCondition {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Condition(c) => Ok((**c).clone()),
            other => mismatch("condition", other),
        }
    }
}

impl FromColumnValue for Vec<ColumnCondition> {
    fn from_column_value(value: &ColumnValue) -> Result<Self, DbError> {
        match value {
            ColumnValue::Conditions(cs) => Ok(cs.clone()),
            other => mismatch("list of conditions", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_bson_becomes_list() {
        let v = ColumnValue::from(Bson::Array(vec![Bson::Int32(1), Bson::Int32(2)]));
        assert!(matches!(v, ColumnValue::List(ref items) if items.len() == 2));
    }

    #[test]
    fn nan_doubles_are_equal() {
        let a = ColumnValue::Scalar(Bson::Double(f64::NAN));
        let b = ColumnValue::Scalar(Bson::Double(f64::NAN));
        assert_eq!(a, b);
    }

    #[test]
    fn numeric_list_coerces_widths() {
        let v = ColumnValue::List(vec![Bson::Int32(10), Bson::Int64(20)]);
        assert_eq!(Vec::<i64>::from_column_value(&v).unwrap(), vec![10, 20]);
        assert_eq!(Vec::<f64>::from_column_value(&v).unwrap(), vec![10.0, 20.0]);
        assert!(matches!(
            Vec::<String>::from_column_value(&v),
            Err(DbError::TypeMismatch { .. })
        ));
    }

    fn hash_of(v: &ColumnValue) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn documents_ignore_key_order_in_eq_and_hash() {
        let a = ColumnValue::Scalar(Bson::Document(bson::doc! {"x": 1, "y": {"p": 2.5, "q": "z"}}));
        let b = ColumnValue::Scalar(Bson::Document(bson::doc! {"y": {"q": "z", "p": 2.5}, "x": 1}));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        let c = ColumnValue::Scalar(Bson::Document(bson::doc! {"x": 1, "y": {"p": 2.5, "q": "w"}}));
        assert_ne!(a, c);
    }
}
