//! Column-family query model.
//!
//! - [`column`]: named values (`Column`) and the tagged `ColumnValue`
//! - [`condition`]: the condition algebra (`ColumnCondition`) and its evaluator
//! - [`query`]: `ColumnQuery`, the staged `QueryBuilder`, JSON descriptors and prepared statements
//! - [`manager`]: the `ColumnManager` capability and an in-memory implementation
//! - [`template`]: `ColumnTemplate`, a convenience facade over a manager
//!
//! ```
//! use nexus_column::{ColumnCondition, ColumnEntity, ColumnManager, InMemoryManager, select};
//!
//! let manager = InMemoryManager::new();
//! manager.insert(ColumnEntity::from_document("Person", bson::doc! {"name": "Ada", "age": 36})?);
//! let found = select(["name"])?
//!     .from("Person")?
//!     .where_(ColumnCondition::greater_than("age", 30)?)
//!     .get_single_result(&manager)?;
//! assert!(found.is_some());
//! # Ok::<(), nexus_column::DbError>(())
//! ```

pub mod column;
pub mod condition;
pub mod config;
pub mod errors;
pub mod logger;
pub mod manager;
pub mod query;
pub mod template;
pub mod utils;

pub use column::{Column, ColumnValue, FromColumnValue};
pub use condition::{ColumnCondition, ConditionKind};
pub use config::ManagerConfig;
pub use errors::DbError;
pub use manager::{ColumnEntity, ColumnManager, EntityStream, InMemoryManager};
pub use query::{ColumnQuery, PreparedStatement, QueryBuilder, Sort, SortType, builder, select};
pub use template::ColumnTemplate;
