/// Hook that maps entity and field names while a JSON query descriptor is
/// turned into a [`ColumnQuery`](super::ColumnQuery).
///
/// Both methods default to the identity mapping.
pub trait ColumnObserver: Send + Sync {
    fn fire_entity(&self, entity: &str) -> String {
        entity.to_string()
    }

    fn fire_field(&self, entity: &str, field: &str) -> String {
        let _ = entity;
        field.to_string()
    }
}

/// Leaves every name untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityObserver;

impl ColumnObserver for IdentityObserver {}
