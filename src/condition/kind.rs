use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DbError;

/// Predicate operator carried by a [`ColumnCondition`](super::ColumnCondition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionKind {
    Equals,
    GreaterThan,
    GreaterEqualsThan,
    LesserThan,
    LesserEqualsThan,
    Like,
    Between,
    In,
    And,
    Or,
    Not,
}

impl ConditionKind {
    pub const ALL: [Self; 11] = [
        Self::Equals,
        Self::GreaterThan,
        Self::GreaterEqualsThan,
        Self::LesserThan,
        Self::LesserEqualsThan,
        Self::Like,
        Self::Between,
        Self::In,
        Self::And,
        Self::Or,
        Self::Not,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterEqualsThan => "GREATER_EQUALS_THAN",
            Self::LesserThan => "LESSER_THAN",
            Self::LesserEqualsThan => "LESSER_EQUALS_THAN",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }

    /// Column name used by composite nodes (`_AND`, `_OR`, `_NOT`).
    #[must_use]
    pub const fn name_field(self) -> &'static str {
        match self {
            Self::Equals => "_EQUALS",
            Self::GreaterThan => "_GREATER_THAN",
            Self::GreaterEqualsThan => "_GREATER_EQUALS_THAN",
            Self::LesserThan => "_LESSER_THAN",
            Self::LesserEqualsThan => "_LESSER_EQUALS_THAN",
            Self::Like => "_LIKE",
            Self::Between => "_BETWEEN",
            Self::In => "_IN",
            Self::And => "_AND",
            Self::Or => "_OR",
            Self::Not => "_NOT",
        }
    }

    /// True for AND, OR and NOT.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }

    /// True for the kinds whose operand is a single scalar.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::GreaterThan
                | Self::GreaterEqualsThan
                | Self::LesserThan
                | Self::LesserEqualsThan
                | Self::Like
        )
    }

    /// Infix symbol used when rendering.
    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::GreaterEqualsThan => ">=",
            Self::LesserThan => "<",
            Self::LesserEqualsThan => "<=",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConditionKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DbError::InvalidArgument(format!("unknown condition kind: {s}")))
    }
}
