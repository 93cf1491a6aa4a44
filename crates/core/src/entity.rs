//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Brands, categories and products are all addressed by an [`EntityId`] that is
/// unique among their siblings.
pub trait Entity {
    /// Returns the entity identifier.
    fn id(&self) -> &EntityId;
}

/// Find a sibling by id.
pub fn find<'a, E: Entity>(items: &'a [E], id: &str) -> Option<&'a E> {
    items.iter().find(|e| e.id().as_str() == id)
}

/// Find a sibling by id (mutable).
pub fn find_mut<'a, E: Entity>(items: &'a mut [E], id: &str) -> Option<&'a mut E> {
    items.iter_mut().find(|e| e.id().as_str() == id)
}
