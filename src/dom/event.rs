//! Event handlers bound to element nodes

use std::fmt;
use std::rc::Rc;

use super::NodeId;

/// An event delivered to a [`Callback`] by [`Document::dispatch`](super::Document::dispatch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name without prefix, e.g. `click`
    pub name: String,
    /// Node the event was dispatched at
    pub target: NodeId,
    /// Node whose handler is currently running (differs from `target` while bubbling)
    pub current_target: NodeId,
}

/// A shared event handler
///
/// Two callbacks are the same handler only if they share one allocation;
/// cloning a `Callback` keeps its identity, wrapping the same closure twice
/// does not.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Event)>);

impl Callback {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Identity comparison (same allocation)
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", self.addr())
    }
}
