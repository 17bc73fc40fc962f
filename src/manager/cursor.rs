use super::entity::ColumnEntity;
use crate::condition::CompiledCondition;

/// Lazy walk over a snapshot of entities.
///
/// When `condition` is set the filter runs as the cursor advances; the sorted
/// path filters up front and leaves it empty. Skip, limit and projection are
/// always applied lazily.
pub struct Cursor {
    pub(crate) entities: std::vec::IntoIter<ColumnEntity>,
    pub(crate) condition: Option<CompiledCondition>,
    pub(crate) columns: Vec<String>,
    pub(crate) skip: usize,
    pub(crate) remaining: Option<usize>,
}

impl Cursor {
    pub fn advance(&mut self) -> Option<ColumnEntity> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let e = self.entities.next()?;
            if let Some(c) = &self.condition
                && !c.matches(&e)
            {
                continue;
            }
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            if let Some(r) = self.remaining.as_mut() {
                *r -= 1;
            }
            return Some(if self.columns.is_empty() { e } else { e.project(&self.columns) });
        }
    }

    #[must_use]
    pub fn to_vec(self) -> Vec<ColumnEntity> {
        self.collect()
    }
}

impl Iterator for Cursor {
    type Item = ColumnEntity;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
