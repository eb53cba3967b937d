//! Slab storage for list nodes.
//!
//! Nodes live in a `Vec<T>` addressed by [`NodeId`]; neighbour links are ids
//! rather than pointers, with [`NULL_NODE`] standing for "no neighbour".
//! Freed slots go on a free list and are reused by the next allocation.

use std::convert::TryFrom;

pub type NodeId = u32;
pub const NULL_NODE: NodeId = u32::MAX;

/// Arena of `T` with a free list and a per-slot allocation mask.
#[derive(Debug, Clone)]
pub struct CompactArena<T> {
    storage: Vec<T>,
    free_list: Vec<usize>,
    allocated_mask: Vec<bool>,
    allocated: usize,
}

impl<T> CompactArena<T> {
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            free_list: Vec::new(),
            allocated_mask: Vec::new(),
            allocated: 0,
        }
    }

    /// Store `item` and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the arena outgrows the id space (`u32::MAX - 1` live slots).
    #[inline]
    pub fn allocate(&mut self, item: T) -> NodeId {
        let index = if let Some(free_index) = self.free_list.pop() {
            self.storage[free_index] = item;
            self.allocated_mask[free_index] = true;
            free_index
        } else {
            let index = self.storage.len();
            self.storage.push(item);
            self.allocated_mask.push(true);
            index
        };
        self.allocated += 1;

        NodeId::try_from(index)
            .ok()
            .filter(|&id| id != NULL_NODE)
            .expect("node arena exhausted the id space")
    }

    /// Free `id`, returning the value it held.
    #[inline]
    pub fn deallocate(&mut self, id: NodeId) -> Option<T>
    where
        T: Default,
    {
        let index = self.slot(id)?;
        self.allocated_mask[index] = false;
        self.free_list.push(index);
        self.allocated -= 1;
        Some(std::mem::take(&mut self.storage[index]))
    }

    #[inline]
    fn slot(&self, id: NodeId) -> Option<usize> {
        if id == NULL_NODE {
            return None;
        }
        let index = usize::try_from(id).ok()?;
        self.allocated_mask
            .get(index)
            .copied()
            .unwrap_or(false)
            .then_some(index)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slot(id).map(|index| &self.storage[index])
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slot(id).map(move |index| &mut self.storage[index])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.allocated
    }

    pub fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    pub fn clear(&mut self) {
        self.storage.clear();
        self.allocated_mask.clear();
        self.free_list.clear();
        self.allocated = 0;
    }
}

impl<T> Default for CompactArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
