use crate::core::{BodyId, ContactId, ShapeId};
use std::collections::VecDeque;

/// Types of contact events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEventType {
    /// The shapes have just started touching
    Begin,

    /// The shapes have just stopped touching
    End,
}

/// A change in a contact's touching state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    /// The type of contact event
    pub event_type: ContactEventType,

    /// The contact. It may already be destroyed for `End` events.
    pub contact: ContactId,

    /// Body of the first shape
    pub body_a: BodyId,

    /// The first shape
    pub shape_a: ShapeId,

    /// Body of the second shape
    pub body_b: BodyId,

    /// The second shape
    pub shape_b: ShapeId,
}

/// Types of body events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEventType {
    /// The body's island went to sleep
    Sleep,

    /// A sleeping body was woken
    Wake,
}

/// An event related to a single body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyEvent {
    /// The type of body event
    pub event_type: BodyEventType,

    /// The body that the event refers to
    pub body: BodyId,
}

/// Queue of the events recorded since the start of the last step
#[derive(Debug, Clone, Default)]
pub(crate) struct EventQueue {
    contact_events: VecDeque<ContactEvent>,

    body_events: VecDeque<BodyEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contact event to the queue
    pub fn add_contact_event(&mut self, event: ContactEvent) {
        self.contact_events.push_back(event);
    }

    /// Adds a body event to the queue
    pub fn add_body_event(&mut self, event: BodyEvent) {
        self.body_events.push_back(event);
    }

    /// Removes and yields every contact event, oldest first
    pub fn drain_contact_events(&mut self) -> impl Iterator<Item = ContactEvent> + '_ {
        self.contact_events.drain(..)
    }

    /// Removes and yields every body event, oldest first
    pub fn drain_body_events(&mut self) -> impl Iterator<Item = BodyEvent> + '_ {
        self.body_events.drain(..)
    }

    /// Clears all events from the queue
    pub fn clear(&mut self) {
        self.contact_events.clear();
        self.body_events.clear();
    }
}
