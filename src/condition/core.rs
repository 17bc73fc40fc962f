use bson::Bson;
use std::fmt;

use super::kind::ConditionKind;
use crate::column::{Column, ColumnValue};
use crate::errors::DbError;

/// A node of the predicate tree.
///
/// Leaves pair a comparison kind with a scalar (or a scalar list for BETWEEN
/// and IN); composite nodes hold their children inside the column value.
/// Nodes are built bottom-up by the factory functions and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnCondition {
    kind: ConditionKind,
    column: Column,
}

fn scalar_operand(name: &str, value: Bson) -> Result<Bson, DbError> {
    match value {
        Bson::Null => Err(DbError::NullArgument(format!("value for '{name}'"))),
        Bson::Array(_) => {
            Err(DbError::InvalidArgument(format!("value for '{name}' must be a single scalar")))
        }
        v => Ok(v),
    }
}

impl ColumnCondition {
    /// Builds a node from a kind and an existing column, enforcing the shape
    /// each kind requires.
    ///
    /// # Errors
    /// `InvalidArgument` when the column value does not fit `kind`.
    pub fn of(kind: ConditionKind, column: Column) -> Result<Self, DbError> {
        let ok = match (kind, column.value()) {
            (k, ColumnValue::Scalar(_)) if k.is_scalar() => true,
            (ConditionKind::Between, ColumnValue::List(bounds)) => bounds.len() == 2,
            (ConditionKind::In, ColumnValue::List(_)) => true,
            (ConditionKind::And | ConditionKind::Or, ColumnValue::Conditions(_)) => true,
            (ConditionKind::Not, ColumnValue::Condition(_)) => true,
            _ => false,
        };
        if !ok {
            return Err(DbError::InvalidArgument(format!(
                "{kind} cannot hold a {} operand",
                column.value().shape()
            )));
        }
        Ok(Self { kind, column })
    }

    fn scalar(kind: ConditionKind, name: String, value: Bson) -> Result<Self, DbError> {
        let value = scalar_operand(&name, value)?;
        Ok(Self { kind, column: Column::of(name, value)? })
    }

    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` on a null value.
    pub fn equals(name: impl Into<String>, value: impl Into<Bson>) -> Result<Self, DbError> {
        Self::scalar(ConditionKind::Equals, name.into(), value.into())
    }

    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` on a null value.
    pub fn greater_than(name: impl Into<String>, value: impl Into<Bson>) -> Result<Self, DbError> {
        Self::scalar(ConditionKind::GreaterThan, name.into(), value.into())
    }

    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` on a null value.
    pub fn greater_equals(
        name: impl Into<String>,
        value: impl Into<Bson>,
    ) -> Result<Self, DbError> {
        Self::scalar(ConditionKind::GreaterEqualsThan, name.into(), value.into())
    }

    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` on a null value.
    pub fn lesser_than(name: impl Into<String>, value: impl Into<Bson>) -> Result<Self, DbError> {
        Self::scalar(ConditionKind::LesserThan, name.into(), value.into())
    }

    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` on a null value.
    pub fn lesser_equals(
        name: impl Into<String>,
        value: impl Into<Bson>,
    ) -> Result<Self, DbError> {
        Self::scalar(ConditionKind::LesserEqualsThan, name.into(), value.into())
    }

    /// SQL-style pattern match: `%` matches any run, `_` one character.
    ///
    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` on a null value.
    pub fn like(name: impl Into<String>, value: impl Into<Bson>) -> Result<Self, DbError> {
        Self::scalar(ConditionKind::Like, name.into(), value.into())
    }

    /// Inclusive range; exactly two bounds, lower first.
    ///
    /// # Errors
    /// `InvalidArgument` unless two bounds are given, `NullArgument` on a null bound.
    pub fn between<I, V>(name: impl Into<String>, bounds: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let name = name.into();
        let bounds: Vec<Bson> = bounds.into_iter().map(Into::into).collect();
        if bounds.len() != 2 {
            return Err(DbError::InvalidArgument(format!(
                "BETWEEN on '{name}' needs exactly two bounds, got {}",
                bounds.len()
            )));
        }
        Self::of(ConditionKind::Between, Column::of(name, bounds)?)
    }

    /// Membership in a non-empty list of values.
    ///
    /// # Errors
    /// `InvalidArgument` when `values` is empty, `NullArgument` on a null entry.
    pub fn is_in<I, V>(name: impl Into<String>, values: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let name = name.into();
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(DbError::InvalidArgument(format!("IN on '{name}' needs at least one value")));
        }
        Self::of(ConditionKind::In, Column::of(name, values)?)
    }

    /// Conjunction of the given operands, kept exactly as passed (no flattening).
    ///
    /// # Errors
    /// `InvalidArgument` with fewer than two operands.
    pub fn and(conditions: impl IntoIterator<Item = Self>) -> Result<Self, DbError> {
        Self::compose(ConditionKind::And, conditions.into_iter().collect())
    }

    /// Disjunction of the given operands, kept exactly as passed (no flattening).
    ///
    /// # Errors
    /// `InvalidArgument` with fewer than two operands.
    pub fn or(conditions: impl IntoIterator<Item = Self>) -> Result<Self, DbError> {
        Self::compose(ConditionKind::Or, conditions.into_iter().collect())
    }

    fn compose(kind: ConditionKind, children: Vec<Self>) -> Result<Self, DbError> {
        if children.len() < 2 {
            return Err(DbError::InvalidArgument(format!(
                "{kind} needs at least two conditions, got {}",
                children.len()
            )));
        }
        let column = Column::composite(kind.name_field(), ColumnValue::Conditions(children));
        Ok(Self { kind, column })
    }

    /// Negation with double-negation cancellation: `NOT(NOT(x))` is `x`.
    #[must_use]
    pub fn negate(self) -> Self {
        if self.kind == ConditionKind::Not
            && let ColumnValue::Condition(inner) = self.column.value()
        {
            return (**inner).clone();
        }
        Self {
            kind: ConditionKind::Not,
            column: Column::composite(ConditionKind::Not.name_field(), ColumnValue::from(self)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ConditionKind {
        self.kind
    }

    #[must_use]
    pub const fn column(&self) -> &Column {
        &self.column
    }

    /// Children of AND/OR in construction order, the single child of NOT,
    /// and nothing for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self.column.value() {
            ColumnValue::Conditions(cs) => cs,
            ColumnValue::Condition(c) => std::slice::from_ref(&**c),
            _ => &[],
        }
    }

    /// Depth of the tree; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Names of the data columns referenced anywhere in the tree, in first-seen order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.kind.is_composite() {
            for c in self.children() {
                c.collect_names(out);
            }
        } else if !out.contains(&self.column.name()) {
            out.push(self.column.name());
        }
    }
}

impl fmt::Display for ColumnCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.column.name();
        match (self.kind, self.column.value()) {
            (ConditionKind::Not, ColumnValue::Condition(c)) => write!(f, "NOT ({c})"),
            (k @ (ConditionKind::And | ConditionKind::Or), ColumnValue::Conditions(cs)) => {
                f.write_str("(")?;
                for (i, c) in cs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", k.symbol())?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
            (ConditionKind::Between, ColumnValue::List(b)) if b.len() == 2 => {
                write!(f, "{name} BETWEEN {} AND {}", b[0], b[1])
            }
            (ConditionKind::In, ColumnValue::List(vs)) => {
                let items: Vec<String> = vs.iter().map(ToString::to_string).collect();
                write!(f, "{name} IN ({})", items.join(", "))
            }
            (k, ColumnValue::Scalar(v)) => write!(f, "{name} {} {v}", k.symbol()),
            (k, _) => write!(f, "{name} {} ?", k.symbol()),
        }
    }
}
