//! Query model: sorts, the immutable `ColumnQuery`, its builder, the JSON
//! descriptor format and prepared statements.
pub mod builder;
pub mod observer;
pub mod parse;
pub mod prepared;
pub mod types;

pub use builder::{BuilderState, QueryBuilder, builder, select};
pub use observer::{ColumnObserver, IdentityObserver};
pub use parse::{
    ConditionSerde, QuerySerde, SortSerde, parse_condition_json, parse_query_json,
    parse_query_json_with,
};
pub use prepared::PreparedStatement;
pub use types::{ColumnQuery, Sort, SortType};
