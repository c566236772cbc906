//! Typed subscription registries.

/// Token returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of listeners of one notification kind.
pub struct Observers<L: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<L>)>,
}

impl<L: ?Sized> Default for Observers<L> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for Observers<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<L: ?Sized> Observers<L> {
    pub fn subscribe(&mut self, listener: Box<L>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visit every listener in subscription order.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut L)) {
        for (_, listener) in &mut self.entries {
            f(listener.as_mut());
        }
    }
}
