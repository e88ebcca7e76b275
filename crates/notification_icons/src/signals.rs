/// Handle returned when connecting to a signal, used to disconnect again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("handler#{_0}")]
pub struct HandlerId(pub u64);

/// Bookkeeping of connected signal handlers, for implementors of [`crate::NotificationHost`] and
/// [`crate::PreferenceStore`].
///
/// The table only tracks *who* is listening to *what*. Delivering an event is up to the owner,
/// which should check [`SignalTable::is_connected`] first.
#[derive(Debug, Clone)]
pub struct SignalTable<K> {
    next_id: u64,
    handlers: Vec<(HandlerId, K)>,
}

impl<K> Default for SignalTable<K> {
    fn default() -> Self {
        Self { next_id: 1, handlers: Vec::new() }
    }
}

impl<K: PartialEq> SignalTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, key: K) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, key));
        id
    }

    /// Returns whether the handler was connected.
    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler, _)| *handler != id);
        before != self.handlers.len()
    }

    pub fn is_connected(&self, key: &K) -> bool {
        self.handlers.iter().any(|(_, k)| k == key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
