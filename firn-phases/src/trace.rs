use {
    firn_core::tree::Name,
    std::{cell::RefCell, rc::Rc},
};

/// Phase invocation recorded in a [`Trace`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event
{
    /// The phase, e.g. `attribute` or `lower`.
    pub phase: &'static str,

    /// The class the phase was invoked for.
    pub class: Name,
}

/// Shared record of phase invocations.
///
/// Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct Trace
{
    events: Rc<RefCell<Vec<Event>>>,
}

impl Trace
{
    /// Record that `phase` was invoked for `class`.
    pub fn record(&self, phase: &'static str, class: &Name)
    {
        tracing::trace!(phase, %class, "phase invoked");
        self.events.borrow_mut().push(Event{phase, class: class.clone()});
    }

    /// All recorded invocations, oldest first.
    pub fn events(&self) -> Vec<Event>
    {
        self.events.borrow().clone()
    }

    /// The classes `phase` was invoked for, in invocation order.
    pub fn classes(&self, phase: &str) -> Vec<String>
    {
        self.events.borrow().iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.class.to_string())
            .collect()
    }

    /// The number of times `phase` was invoked for `class`.
    pub fn count(&self, phase: &str, class: &str) -> usize
    {
        self.events.borrow().iter()
            .filter(|e| e.phase == phase && &*e.class == class)
            .count()
    }

    /// The index of the first invocation of `phase` for `class`.
    pub fn position(&self, phase: &str, class: &str) -> Option<usize>
    {
        self.events.borrow().iter()
            .position(|e| e.phase == phase && &*e.class == class)
    }
}
