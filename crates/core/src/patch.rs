//! Explicit partial-update values.

/// A single field of a partial update: either left alone or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Set(T),
}

impl<T> Patch<T> {
    /// Overwrite `target` when the field was supplied.
    pub fn apply_to(self, target: &mut T) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Unchanged,
        }
    }
}

/// Partial update of a product's text fields. The image is replaced
/// separately (it needs asset bytes), and `active` only changes via toggle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductPatch {
    pub title: Patch<String>,
    pub name: Patch<String>,
    pub description: Patch<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        !(self.title.is_set() || self.name.is_set() || self.description.is_set())
    }
}
