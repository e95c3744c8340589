use crate::collision::{ContactImpulses, Manifold};
use crate::core::{BodyId, ContactId, JointId, ShapeId, World};

/// Called with a shape that is about to be destroyed
pub type ShapeListener = Box<dyn FnMut(&mut World, ShapeId) + Send>;

/// Called with a shape being detached from a body by a destroy cascade
pub type DetachListener = Box<dyn FnMut(&mut World, BodyId, ShapeId) + Send>;

/// Called with a joint destroyed along with one of its bodies
pub type JointListener = Box<dyn FnMut(&mut World, JointId) + Send>;

/// Called when a contact begins or ends touching
pub type ContactListener = Box<dyn FnMut(&mut World, ContactId) + Send>;

/// Called after a touching contact's manifold was updated, with the
/// manifold it had before
pub type PreSolveListener = Box<dyn FnMut(&mut World, ContactId, &Manifold) + Send>;

/// Called after the velocity solver with a contact's impulses and the
/// number of position iterations used
pub type PostSolveListener = Box<dyn FnMut(&mut World, ContactId, &ContactImpulses, u32) + Send>;

/// The user's callbacks. None of them are carried over by `World::clone`.
#[derive(Default)]
pub(crate) struct Listeners {
    pub shape_destruction: Option<ShapeListener>,
    pub detach: Option<DetachListener>,
    pub joint_destruction: Option<JointListener>,
    pub begin_contact: Option<ContactListener>,
    pub end_contact: Option<ContactListener>,
    pub pre_solve: Option<PreSolveListener>,
    pub post_solve: Option<PostSolveListener>,
}

/// Calls the listener in `$slot`, if any, with the world locked.
///
/// The listener is taken out of the world for the duration of the call.
/// It is put back unless the call installed a replacement.
macro_rules! fire_listener {
    ($world:expr, $slot:ident $(, $arg:expr)*) => {
        if let Some(mut listener) = $world.listeners.$slot.take() {
            let was_locked = ::std::mem::replace(&mut $world.locked, true);
            listener(&mut *$world $(, $arg)*);
            $world.locked = was_locked;
            if $world.listeners.$slot.is_none() {
                $world.listeners.$slot = Some(listener);
            }
        }
    };
}

pub(crate) use fire_listener;
