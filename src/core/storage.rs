use std::fmt;
use std::marker::PhantomData;

use crate::error::PhysicsError;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// An identifier handed out by an [`ObjectPool`]: a slot index plus the
/// generation the slot had when the object was allocated
pub trait PoolId: Copy + fmt::Display {
    /// Human readable name of the identified entity kind
    const NAME: &'static str;

    /// Creates an identifier
    fn from_parts(index: u32, generation: u32) -> Self;

    /// Slot index
    fn get_index(&self) -> usize;

    /// Slot generation
    fn get_generation(&self) -> u32;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl PoolId for $name {
            const NAME: &'static str = $label;

            #[inline]
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            #[inline]
            fn get_index(&self) -> usize {
                self.index as usize
            }

            #[inline]
            fn get_generation(&self) -> u32 {
                self.generation
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}v{}", $label, self.index, self.generation)
            }
        }
    };
}

define_id!(
    /// Identifier of a body in a world
    BodyId, "body"
);
define_id!(
    /// Identifier of a shape in a world
    ShapeId, "shape"
);
define_id!(
    /// Identifier of a joint in a world
    JointId, "joint"
);
define_id!(
    /// Identifier of a contact in a world
    ContactId, "contact"
);

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Slot storage with generation-checked identifiers.
///
/// Freed slots are recycled through a free list; a recycled slot gets a
/// new generation so that identifiers of the destroyed object stop
/// resolving. Lookups are O(1).
#[derive(Debug, Clone)]
pub struct ObjectPool<T, Id> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _id: PhantomData<Id>,
}

impl<T, Id: PoolId> Default for ObjectPool<T, Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Id: PoolId> ObjectPool<T, Id> {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` objects
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
            _id: PhantomData,
        }
    }

    /// Stores `value`, returning its identifier
    pub fn insert(&mut self, value: T) -> Result<Id> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.value = Some(value);
            self.len += 1;
            return Ok(Id::from_parts(index, slot.generation));
        }

        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|i| *i < u32::MAX)
            .ok_or_else(|| PhysicsError::LengthError(format!("too many {}s", Id::NAME)))?;
        self.slots.push(Slot { value: Some(value), generation: 0 });
        self.len += 1;
        Ok(Id::from_parts(index, 0))
    }

    /// Removes and returns the object identified by `id`
    pub fn remove(&mut self, id: Id) -> Result<T> {
        self.check(id)?;
        let slot = &mut self.slots[id.get_index()];
        let value = slot.value.take().ok_or_else(|| Self::destroyed(id))?;
        self.free.push(id.get_index() as u32);
        self.len -= 1;
        Ok(value)
    }

    /// The object identified by `id`
    pub fn get(&self, id: Id) -> Result<&T> {
        self.check(id)?;
        self.slots[id.get_index()].value.as_ref().ok_or_else(|| Self::destroyed(id))
    }

    /// The object identified by `id`, mutably
    pub fn get_mut(&mut self, id: Id) -> Result<&mut T> {
        self.check(id)?;
        self.slots[id.get_index()].value.as_mut().ok_or_else(|| Self::destroyed(id))
    }

    /// Whether `id` refers to a live object
    pub fn contains(&self, id: Id) -> bool {
        self.check(id).is_ok()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the pool holds no live objects
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the highest slot index ever used. Bitmaps indexed by slot
    /// are sized to this.
    pub fn range(&self) -> usize {
        self.slots.len()
    }

    /// Identifier of the live object in slot `index`, if any. Walking
    /// `0..range()` with this visits the live objects while the pool is
    /// being changed.
    pub fn id_at(&self, index: usize) -> Option<Id> {
        let slot = self.slots.get(index)?;
        slot.value.as_ref()?;
        Some(Id::from_parts(index as u32, slot.generation))
    }

    /// Iterates over the live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| (Id::from_parts(i as u32, slot.generation), v))
        })
    }

    /// Iterates mutably over the live objects in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| (Id::from_parts(i as u32, generation), v))
        })
    }

    /// Removes every object. Slot generations are kept so that old
    /// identifiers stay invalid.
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.value = None;
            self.free.push(i as u32);
        }
        self.len = 0;
    }

    fn check(&self, id: Id) -> Result<()> {
        match self.slots.get(id.get_index()) {
            None => Err(PhysicsError::OutOfRange(format!("{} was never allocated", id))),
            Some(slot) if slot.generation != id.get_generation() || slot.value.is_none() => {
                Err(Self::destroyed(id))
            }
            Some(_) => Ok(()),
        }
    }

    fn destroyed(id: Id) -> PhysicsError {
        PhysicsError::OutOfRange(format!("{} was destroyed", id))
    }
}
