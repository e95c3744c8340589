use crate::core::{BodyId, ContactId, JointId, PoolId};

/// A set of bodies connected through touching contacts and joints, solved
/// together.
///
/// Static bodies may show up in several islands. Every other body is in at
/// most one island per step.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Island {
    /// The bodies in the island
    pub bodies: Vec<BodyId>,

    /// The contacts in the island
    pub contacts: Vec<ContactId>,

    /// The joints in the island
    pub joints: Vec<JointId>,
}

impl Island {
    /// Creates a new empty island
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the island, keeping its buffers
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }
}

/// Marks of which entities have been put in an island during a step,
/// indexed by pool slot
#[derive(Debug, Default, Clone)]
pub(crate) struct Islanded {
    bodies: Vec<bool>,
    contacts: Vec<bool>,
    joints: Vec<bool>,
}

macro_rules! islanded_accessors {
    ($field:ident, $id:ty, $is:ident, $set:ident) => {
        #[inline]
        pub fn $is(&self, id: $id) -> bool {
            self.$field.get(id.get_index()).copied().unwrap_or(false)
        }

        #[inline]
        pub fn $set(&mut self, id: $id, value: bool) {
            let index = id.get_index();
            if index >= self.$field.len() {
                self.$field.resize(index + 1, false);
            }
            self.$field[index] = value;
        }
    };
}

impl Islanded {
    /// Clears every mark and sizes the bitmaps to the pools' ranges
    pub fn reset(&mut self, body_range: usize, contact_range: usize, joint_range: usize) {
        Self::reset_one(&mut self.bodies, body_range);
        Self::reset_one(&mut self.contacts, contact_range);
        Self::reset_one(&mut self.joints, joint_range);
    }

    fn reset_one(marks: &mut Vec<bool>, range: usize) {
        marks.clear();
        marks.resize(range, false);
    }

    islanded_accessors!(bodies, BodyId, is_body, set_body);
    islanded_accessors!(contacts, ContactId, is_contact, set_contact);
    islanded_accessors!(joints, JointId, is_joint, set_joint);
}
