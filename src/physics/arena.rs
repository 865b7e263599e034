//! Generational slot storage for bodies and shapes
//!
//! Slots are tombstoned on removal and reused later with a bumped generation,
//! so a stale handle never aliases a newer entry and indices stay stable while
//! other entries are removed.

use serde::{Deserialize, Serialize};

/// Index + generation pair identifying an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Index {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Slot arena with tombstoning and a free list
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a value, reusing the most recently freed slot if any
    pub fn insert(&mut self, value: T) -> Index {
        self.len += 1;
        if let Some(slot) = self.free_head {
            let entry = &mut self.slots[slot as usize];
            let (generation, next_free) = match entry {
                Slot::Vacant { generation, next_free } => (*generation, *next_free),
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            *entry = Slot::Occupied { generation, value };
            self.free_head = next_free;
            Index { slot, generation }
        } else {
            let slot = self.slots.len() as u32;
            self.slots.push(Slot::Occupied { generation: 0, value });
            Index { slot, generation: 0 }
        }
    }

    /// Remove and return the value behind `index` (None if already gone)
    pub fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        match entry {
            Slot::Occupied { generation, .. } if *generation == index.generation => {
                let vacant = Slot::Vacant {
                    generation: generation.wrapping_add(1),
                    next_free: self.free_head,
                };
                let old = std::mem::replace(entry, vacant);
                self.free_head = Some(index.slot);
                self.len -= 1;
                match old {
                    Slot::Occupied { value, .. } => Some(value),
                    Slot::Vacant { .. } => None,
                }
            }
            _ => None,
        }
    }

    pub fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        match self.slots.get(index.slot as usize)? {
            Slot::Occupied { generation, value } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        match self.slots.get_mut(index.slot as usize)? {
            Slot::Occupied { generation, value } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| match entry {
            Slot::Occupied { generation, value } => Some((
                Index {
                    slot: slot as u32,
                    generation: *generation,
                },
                value,
            )),
            Slot::Vacant { .. } => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(slot, entry)| match entry {
            Slot::Occupied { generation, value } => Some((
                Index {
                    slot: slot as u32,
                    generation: *generation,
                },
                value,
            )),
            Slot::Vacant { .. } => None,
        })
    }

    /// Snapshot of the live handles, safe to hold while mutating the arena
    pub fn indices(&self) -> Vec<Index> {
        self.iter().map(|(index, _)| index).collect()
    }
}
