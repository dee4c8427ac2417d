use std::fmt;
use std::sync::{Arc, Weak};

use crate::state::AtomState;

/// Callback invoked with a fresh snapshot after every update.
pub type Subscriber = Arc<dyn Fn(&AtomState) + Send + Sync>;

/// Sequence id assigned to a subscriber at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

/// Removal side of the container, as seen from a [`Subscription`].
pub(crate) trait SubscriberRegistry: Send + Sync {
    fn remove_subscriber(&self, id: SubscriberId) -> bool;
}

/// Handle returned by `subscribe`.
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<dyn SubscriberRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, registry: Weak<dyn SubscriberRegistry>) -> Self {
        Self { id, registry }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Removes the subscriber. Returns false if it was already gone or
    /// the container no longer exists.
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove_subscriber(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub(crate) struct SubscriberEntry {
    pub(crate) id: SubscriberId,
    pub(crate) callback: Subscriber,
}
