use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// A bit mask representing collision categories
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct CollisionGroup: u16 {
        /// Default category (collides with everything)
        const DEFAULT  = 0x0001;

        /// Static world geometry
        const STATIC   = 0x0002;

        /// Dynamic objects
        const DYNAMIC  = 0x0004;

        /// Projectiles
        const PROJECTILE = 0x0008;

        /// Sensor/trigger objects
        const SENSOR   = 0x0010;

        /// Debris
        const DEBRIS   = 0x0020;

        /// All categories
        const ALL      = 0xFFFF;
    }
}

impl Default for CollisionGroup {
    fn default() -> Self {
        CollisionGroup::DEFAULT
    }
}

/// Contact filtering data attached to a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Filter {
    /// The categories this shape belongs to
    pub category_bits: CollisionGroup,

    /// The categories this shape accepts collisions with
    pub mask_bits: CollisionGroup,

    /// Shapes sharing a non-zero group index always collide (positive) or
    /// never collide (negative), regardless of the category and mask bits
    pub group_index: i16,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category_bits: CollisionGroup::DEFAULT,
            mask_bits: CollisionGroup::ALL,
            group_index: 0,
        }
    }
}

impl Filter {
    /// Creates a filter from raw category and mask bits
    pub fn new(category_bits: u16, mask_bits: u16, group_index: i16) -> Self {
        Self {
            category_bits: CollisionGroup::from_bits_retain(category_bits),
            mask_bits: CollisionGroup::from_bits_retain(mask_bits),
            group_index,
        }
    }
}

/// Determines whether two shapes' filters allow them to collide
pub fn should_collide(filter_a: &Filter, filter_b: &Filter) -> bool {
    if filter_a.group_index == filter_b.group_index && filter_a.group_index != 0 {
        return filter_a.group_index > 0;
    }
    filter_a.mask_bits.intersects(filter_b.category_bits)
        && filter_b.mask_bits.intersects(filter_a.category_bits)
}
