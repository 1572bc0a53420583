//! Token-based publish/subscribe lists.
//!
//! Registration returns a [`ListenerToken`]; removal takes that token back.
//! Delivery works on a stable copy ([`Delivery`]) so callbacks may subscribe
//! or unsubscribe without invalidating the iteration, and so the owner can
//! release its own borrows before any callback runs.

use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Listeners::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

type Callback<E> = Rc<dyn Fn(&E)>;

pub struct Listeners<E> {
    next: u64,
    entries: Vec<(ListenerToken, Callback<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Registering the same closure twice yields two
    /// independent registrations.
    pub fn add(&mut self, callback: impl Fn(&E) + 'static) -> ListenerToken {
        let token = ListenerToken(self.next);
        self.next += 1;
        self.entries.push((token, Rc::new(callback)));
        token
    }

    /// Returns `false` if the token was not registered.
    pub fn remove(&mut self, token: ListenerToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != token);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current registrations, in registration order.
    pub fn delivery(&self) -> Delivery<E> {
        Delivery(self.entries.iter().map(|(_, cb)| Rc::clone(cb)).collect())
    }

    /// Like [`Listeners::delivery`], leaving out `skip`.
    pub fn delivery_except(&self, skip: ListenerToken) -> Delivery<E> {
        Delivery(
            self.entries
                .iter()
                .filter(|(t, _)| *t != skip)
                .map(|(_, cb)| Rc::clone(cb))
                .collect(),
        )
    }
}

/// Frozen set of callbacks taken from a [`Listeners`] list.
pub struct Delivery<E>(Vec<Callback<E>>);

impl<E> Delivery<E> {
    /// Invoke every callback with `event`.
    pub fn send(&self, event: &E) {
        for callback in &self.0 {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
