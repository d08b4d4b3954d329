//! Dense, ID-indexed storage for graph entities.
//!
//! Unlike an append-only arena, the node list of a behavior graph shrinks and
//! is reordered: an entity's ID is its current position, so removal and
//! permutation hand back a remap table that callers use to renumber every
//! stored reference.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
///
/// Implementors must provide a bijection between `u32` indices and the ID type.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;

    /// Returns the index as a `usize`.
    fn index(self) -> usize {
        self.as_raw() as usize
    }
}

/// A dense, position-indexed container.
///
/// Serializes as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Appends an item and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns a reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.index()]
    }

    /// Returns a mutable reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.index()]
    }

    /// Returns the item with the given ID, or `None` if it is out of bounds.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.items.get(id.index())
    }

    /// Returns `true` if the ID addresses an item.
    pub fn contains(&self, id: I) -> bool {
        id.index() < self.items.len()
    }

    /// Returns the number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over all IDs in position order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len() as u32).map(I::from_raw)
    }

    /// Iterates over `(ID, &T)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over `(ID, &mut T)` pairs in position order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over references to items in position order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Iterates over mutable references to items in position order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Keeps only the items for which `keep` returns `true`, preserving order.
    ///
    /// Returns the remap table indexed by old position: `Some(new_id)` for a
    /// surviving item, `None` for a dropped one.
    pub fn retain(&mut self, mut keep: impl FnMut(I, &T) -> bool) -> Vec<Option<I>> {
        let mut remap = Vec::with_capacity(self.items.len());
        let mut next = 0u32;
        for (i, item) in self.items.iter().enumerate() {
            if keep(I::from_raw(i as u32), item) {
                remap.push(Some(I::from_raw(next)));
                next += 1;
            } else {
                remap.push(None);
            }
        }
        let mut position = 0;
        self.items.retain(|_| {
            let kept = remap[position].is_some();
            position += 1;
            kept
        });
        remap
    }

    /// Reorders the items so that `order[k]` moves to position `k`.
    ///
    /// `order` must be a permutation of all IDs. Returns the remap table
    /// indexed by old position.
    pub fn permute(&mut self, order: &[I]) -> Vec<I> {
        debug_assert_eq!(order.len(), self.items.len());
        let mut remap = vec![I::from_raw(0); self.items.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.index()] = I::from_raw(new as u32);
        }
        let mut slots: Vec<Option<T>> = std::mem::take(&mut self.items)
            .into_iter()
            .map(Some)
            .collect();
        self.items = order
            .iter()
            .filter_map(|old| slots[old.index()].take())
            .collect();
        remap
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}
