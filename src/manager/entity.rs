use bson::Document as BsonDocument;

use crate::column::{Column, ColumnValue};
use crate::errors::DbError;

/// One stored record: the collection it belongs to and an ordered mapping of
/// column name to [`Column`]. Column names are unique within an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntity {
    name: String,
    columns: Vec<Column>,
}

impl ColumnEntity {
    /// # Errors
    /// `InvalidArgument` when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, DbError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DbError::InvalidArgument("entity name must not be empty".into()));
        }
        Ok(Self { name, columns: Vec::new() })
    }

    /// Later columns replace earlier ones with the same name.
    ///
    /// # Errors
    /// `InvalidArgument` when `name` is empty.
    pub fn of(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = Column>,
    ) -> Result<Self, DbError> {
        let mut entity = Self::new(name)?;
        for c in columns {
            entity.add(c);
        }
        Ok(entity)
    }

    /// Builds an entity from a BSON document, one column per top-level field.
    ///
    /// # Errors
    /// `InvalidArgument` on an empty name, `NullArgument` when a field is null.
    pub fn from_document(name: impl Into<String>, doc: BsonDocument) -> Result<Self, DbError> {
        let mut entity = Self::new(name)?;
        for (k, v) in doc {
            entity.add(Column::of(k, v)?);
        }
        Ok(entity)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Adds a column, replacing in place any column with the same name.
    pub fn add(&mut self, column: Column) {
        if let Some(slot) = self.columns.iter_mut().find(|c| c.name() == column.name()) {
            *slot = column;
        } else {
            self.columns.push(column);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name() == name)?;
        Some(self.columns.remove(pos))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Keeps only the named columns; an empty projection keeps everything.
    #[must_use]
    pub fn project(&self, names: &[String]) -> Self {
        if names.is_empty() {
            return self.clone();
        }
        let columns =
            self.columns.iter().filter(|c| names.iter().any(|n| n == c.name())).cloned().collect();
        Self { name: self.name.clone(), columns }
    }

    /// Scalar and list columns as a BSON document; condition-valued columns are skipped.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut out = BsonDocument::new();
        for c in &self.columns {
            match c.value() {
                ColumnValue::Scalar(v) => {
                    out.insert(c.name(), v.clone());
                }
                ColumnValue::List(vs) => {
                    out.insert(c.name(), vs.clone());
                }
                ColumnValue::Condition(_) | ColumnValue::Conditions(_) => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};

    #[test]
    fn add_replaces_in_place() {
        let mut e = ColumnEntity::from_document("Person", doc! {"name": "Ada", "age": 36}).unwrap();
        e.add(Column::of("name", Bson::from("Grace")).unwrap());
        assert_eq!(e.len(), 2);
        assert_eq!(e.columns()[0].get().unwrap(), &Bson::from("Grace"));
        assert!(e.remove("age").is_some());
        assert!(e.find("age").is_none());
    }

    #[test]
    fn project_and_document_view() {
        let e = ColumnEntity::from_document("Person", doc! {"name": "Ada", "age": 36, "city": "London"})
            .unwrap();
        let p = e.project(&["city".to_string(), "name".to_string()]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.to_document(), doc! {"name": "Ada", "city": "London"});
        assert_eq!(e.project(&[]).len(), 3);
    }

    #[test]
    fn rejects_empty_name_and_null_fields() {
        assert!(ColumnEntity::new("").is_err());
        assert!(matches!(
            ColumnEntity::from_document("Person", doc! {"name": Bson::Null}),
            Err(DbError::NullArgument(_))
        ));
    }
}
