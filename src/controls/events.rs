//! Change notifications

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// What caused the camera to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeSource {
    /// The latest goal was set by pointer, touch, wheel or keyboard input.
    UserInteraction,
    /// The latest goal was set programmatically.
    None,
}

impl ChangeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSource::UserInteraction => "user-interaction",
            ChangeSource::None => "none",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatched whenever the camera position, orientation or field of view changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub source: ChangeSource,
}

/// Handle returned when registering a change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ChangeCallback = Box<dyn FnMut(&ChangeEvent)>;

/// Change listeners, invoked in registration order.
#[derive(Default)]
pub(crate) struct ChangeListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, ChangeCallback)>,
}

impl ChangeListeners {
    pub fn add(&mut self, callback: ChangeCallback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, callback));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn dispatch(&mut self, event: &ChangeEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// Change events recorded by a listener for delivery after the controls are
/// released.
///
/// Listeners run while the controls are mutably borrowed. Handlers that need to
/// read or drive the controls (as JavaScript callbacks usually do) pop events
/// from the queue afterwards instead.
#[derive(Debug, Clone, Default)]
pub struct ChangeQueue {
    events: Rc<RefCell<VecDeque<ChangeEvent>>>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A change listener that appends every event to this queue.
    pub fn recorder(&self) -> impl FnMut(&ChangeEvent) + 'static {
        let events = Rc::clone(&self.events);
        move |event| events.borrow_mut().push_back(*event)
    }

    /// Oldest undelivered event.
    pub fn pop(&self) -> Option<ChangeEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
