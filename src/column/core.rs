use bson::Bson;
use std::fmt;

use super::value::{ColumnValue, FromColumnValue, bson_kind};
use crate::errors::DbError;

/// A named, immutable value. Equality is deep: name plus value, with
/// composite condition lists compared regardless of order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
    value: ColumnValue,
}

impl Column {
    /// # Errors
    /// `InvalidArgument` when `name` is empty, `NullArgument` when the value is (or contains) `Bson::Null`.
    pub fn of(name: impl Into<String>, value: impl Into<ColumnValue>) -> Result<Self, DbError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DbError::InvalidArgument("column name must not be empty".into()));
        }
        let value = value.into();
        if value.is_null() {
            return Err(DbError::NullArgument(format!("value of column '{name}'")));
        }
        Ok(Self { name, value })
    }

    /// Columns of composite nodes; their names are fixed and their values never null.
    pub(crate) fn composite(name: &str, value: ColumnValue) -> Self {
        Self { name: name.to_string(), value }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value(&self) -> &ColumnValue {
        &self.value
    }

    /// The raw scalar.
    ///
    /// # Errors
    /// `TypeMismatch` when the column holds a list or a condition.
    pub fn get(&self) -> Result<&Bson, DbError> {
        match &self.value {
            ColumnValue::Scalar(v) => Ok(v),
            other => Err(DbError::type_mismatch("scalar", other.shape())),
        }
    }

    /// Reads the value back as shape `T`.
    ///
    /// # Errors
    /// `TypeMismatch` when the stored shape cannot be read as `T`.
    pub fn get_as<T: FromColumnValue>(&self) -> Result<T, DbError> {
        T::from_column_value(&self.value)
    }

    /// Flattens scalar and list values into a single BSON value for evaluation.
    pub(crate) fn as_bson(&self) -> Option<Bson> {
        match &self.value {
            ColumnValue::Scalar(v) => Some(v.clone()),
            ColumnValue::List(vs) => Some(Bson::Array(vs.clone())),
            ColumnValue::Condition(_) | ColumnValue::Conditions(_) => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ColumnValue::Scalar(v) => write!(f, "{}: {} ({})", self.name, v, bson_kind(v)),
            ColumnValue::List(vs) => write!(f, "{}: {}", self.name, Bson::Array(vs.clone())),
            ColumnValue::Condition(c) => write!(f, "{}: {c}", self.name),
            ColumnValue::Conditions(cs) => write!(f, "{}: [{} conditions]", self.name, cs.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ColumnCondition;

    #[test]
    fn rejects_empty_name_and_null_value() {
        assert!(matches!(Column::of("", Bson::Int32(1)), Err(DbError::InvalidArgument(_))));
        assert!(matches!(Column::of("age", Bson::Null), Err(DbError::NullArgument(_))));
    }

    #[test]
    fn scalar_get_and_typed_reads() {
        let c = Column::of("name", Bson::from("Ada Lovelace")).unwrap();
        assert_eq!(c.name(), "name");
        assert_eq!(c.get().unwrap(), &Bson::from("Ada Lovelace"));
        assert_eq!(c.get_as::<String>().unwrap(), "Ada Lovelace");
        assert!(matches!(c.get_as::<i64>(), Err(DbError::TypeMismatch { .. })));
        assert!(matches!(c.get_as::<Vec<Bson>>(), Err(DbError::TypeMismatch { .. })));
    }

    #[test]
    fn list_value_refuses_scalar_get() {
        let c = Column::of("age", vec![Bson::Int32(10), Bson::Int32(20)]).unwrap();
        assert!(matches!(c.get(), Err(DbError::TypeMismatch { .. })));
        assert_eq!(c.get_as::<Vec<i64>>().unwrap(), vec![10, 20]);
    }

    #[test]
    fn condition_values_read_back() {
        let inner = ColumnCondition::equals("name", "Ada").unwrap();
        let c = Column::of("_NOT", inner.clone()).unwrap();
        assert_eq!(c.get_as::<ColumnCondition>().unwrap(), inner);
        assert!(c.get_as::<Vec<ColumnCondition>>().is_err());
    }
}
