use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::hash_map::Entry;

use crate::codec::SharedRead;
use crate::hash::{FIXED_HASHER, FixedHashMap};
use crate::{MalformedError, Reflect, Result};

// -----------------------------------------------------------------------------
// Write side

/// Identity table of shared instances already written in a session.
///
/// Indices are 1-based; 0 is the null reference.
pub(crate) struct WriteReferences {
    indices: FixedHashMap<usize, u32>,
}

impl WriteReferences {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            indices: FixedHashMap::with_hasher(FIXED_HASHER),
        }
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.indices.clear();
    }

    /// Returns the index of `address` and whether it was already present.
    pub(crate) fn lookup_or_insert(&mut self, address: usize) -> (u32, bool) {
        let next = self.indices.len() as u32 + 1;
        match self.indices.entry(address) {
            Entry::Occupied(entry) => (*entry.get(), true),
            Entry::Vacant(entry) => (*entry.insert(next), false),
        }
    }
}

// -----------------------------------------------------------------------------
// Read side

/// Shared instances materialized in a session, by 1-based index.
///
/// A slot is `None` while its instance is still being read.
pub(crate) struct ReadReferences {
    slots: Vec<Option<Box<dyn Reflect>>>,
}

impl ReadReferences {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    /// Classifies a reference index read from the stream.
    ///
    /// Only the next unused index starts a new instance.
    pub(crate) fn begin(&mut self, index: u32) -> Result<SharedRead> {
        let len = self.slots.len();
        match index as usize {
            0 => Ok(SharedRead::Null),
            slot if slot <= len => match self.slots[slot - 1] {
                Some(_) => Ok(SharedRead::Existing(index)),
                None => Err(MalformedError::PendingReference(index).into()),
            },
            slot if slot == len + 1 => {
                self.slots.push(None);
                Ok(SharedRead::First(index))
            }
            _ => Err(MalformedError::InvalidReference { index, len }.into()),
        }
    }

    pub(crate) fn get(&self, index: u32) -> Result<&dyn Reflect> {
        self.slots
            .get((index as usize).wrapping_sub(1))
            .and_then(|slot| slot.as_deref())
            .ok_or_else(|| {
                MalformedError::InvalidReference {
                    index,
                    len: self.slots.len(),
                }
                .into()
            })
    }

    pub(crate) fn complete(&mut self, index: u32, value: Box<dyn Reflect>) -> Result<()> {
        let len = self.slots.len();
        match self.slots.get_mut((index as usize).wrapping_sub(1)) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(MalformedError::InvalidReference { index, len }.into()),
        }
    }
}
