//! Columns: the named value unit shared by stored entities and condition operands.
pub mod core;
pub mod value;

pub use self::core::Column;
pub use value::{ColumnValue, FromColumnValue};
