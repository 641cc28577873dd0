//! Registration pools for fog-relevant scene entities
//!
//! Components register under a stable [`EntityId`] and keep their slot for
//! the lifetime of the registration. A destroyed entity leaves a stale slot
//! behind until it is explicitly removed, so every consumer has to
//! null-check slots rather than assume they are live.

/// Unique identifier for a scene entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// Insertion-ordered pool of registered components.
pub struct EntityPool<T> {
    slots: Vec<(EntityId, Option<T>)>,
}

impl<T> EntityPool<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a component, replacing the value if `id` is already present.
    pub fn insert(&mut self, id: EntityId, value: T) {
        if let Some(slot) = self.slots.iter_mut().find(|(slot_id, _)| *slot_id == id) {
            slot.1 = Some(value);
        } else {
            self.slots.push((id, Some(value)));
        }
    }

    /// Unregister a component, dropping its slot entirely.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let index = self.slots.iter().position(|(slot_id, _)| *slot_id == id)?;
        self.slots.remove(index).1
    }

    /// Mark a component destroyed while keeping its slot registered.
    ///
    /// Returns false if `id` has no slot.
    pub fn invalidate(&mut self, id: EntityId) -> bool {
        match self.slots.iter_mut().find(|(slot_id, _)| *slot_id == id) {
            Some(slot) => {
                slot.1 = None;
                true
            }
            None => false,
        }
    }

    /// Get a live component, None for stale or unknown slots.
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.slots
            .iter()
            .find(|(slot_id, _)| *slot_id == id)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find(|(slot_id, _)| *slot_id == id)
            .and_then(|(_, value)| value.as_mut())
    }

    /// Number of registered slots, stale ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots in registration order, stale ones as None.
    pub fn slots(&self) -> impl Iterator<Item = Option<&T>> {
        self.slots.iter().map(|(_, value)| value.as_ref())
    }

    /// Live components only, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|(_, value)| value.as_ref())
    }
}

impl<T> Default for EntityPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
