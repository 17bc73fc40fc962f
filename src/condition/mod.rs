//! Condition algebra: predicate kinds, the condition tree, and its evaluation.
pub mod core;
pub mod eval;
pub mod kind;

pub use self::core::ColumnCondition;
pub use eval::{CompiledCondition, compare_bson, compare_entities, eval_condition};
pub use kind::ConditionKind;
