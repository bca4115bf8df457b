//! Change-notification sources.
//!
//! An engine never raises notifications on its host. It only needs to
//! subscribe to "property X changed" announcements and, later, to
//! unsubscribe. [`NotifySource`] is that capability; [`ChangeNotifier`] is a
//! ready-made implementation a host can embed and delegate to.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handler invoked with the name of a changed property.
pub type ChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Token returned by [`NotifySource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw token value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SubscriptionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Something that announces property changes by name.
pub trait NotifySource: Send + Sync {
    /// Register `handler` for every subsequent change announcement.
    fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId;

    /// Remove a handler. Returns `false` if `id` was not subscribed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// A list of change handlers, invoked in subscription order.
///
/// [`raise`](Self::raise) calls the handlers without holding the internal
/// lock, so a handler may raise further notifications or change the
/// subscriptions of the same notifier. Handlers subscribed during a `raise`
/// are not called for that announcement.
#[derive(Default)]
pub struct ChangeNotifier {
    handlers: Mutex<Vec<(SubscriptionId, ChangeHandler)>>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    /// Create a notifier with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce that `property` changed.
    pub fn raise(&self, property: &str) {
        let snapshot: Vec<ChangeHandler> = self
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(property);
        }
    }

    /// Number of subscribed handlers
    pub fn handler_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, ChangeHandler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotifySource for ChangeNotifier {
    fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("handlers", &self.handler_count())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, ChangeHandler) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let handler: ChangeHandler = Arc::new(move |name: &str| {
            sink.lock().unwrap().push(name.to_string());
        });
        (log, handler)
    }

    #[test]
    fn test_raise_reaches_all_handlers_in_order() {
        let notifier = ChangeNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = Arc::clone(&log);
            notifier.subscribe(Arc::new(move |name: &str| {
                sink.lock().unwrap().push(format!("{tag}:{name}"));
            }));
        }

        notifier.raise("Total");

        assert_eq!(*log.lock().unwrap(), vec!["first:Total", "second:Total"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let (log, handler) = recorder();
        let id = notifier.subscribe(handler);

        notifier.raise("A");
        assert!(notifier.unsubscribe(id));
        notifier.raise("B");

        assert_eq!(*log.lock().unwrap(), vec!["A"]);
        assert_eq!(notifier.handler_count(), 0);
    }

    #[test]
    fn test_unsubscribe_twice_reports_false() {
        let notifier = ChangeNotifier::new();
        let (_log, handler) = recorder();
        let id = notifier.subscribe(handler);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
    }

    #[test]
    fn test_ids_are_unique() {
        let notifier = ChangeNotifier::new();
        let (_log, handler) = recorder();
        let a = notifier.subscribe(Arc::clone(&handler));
        let b = notifier.subscribe(handler);
        assert_ne!(a, b);
    }

    #[test]
    fn test_handler_may_raise_reentrantly() {
        let notifier = Arc::new(ChangeNotifier::new());
        let (log, handler) = recorder();
        notifier.subscribe(handler);

        let weak = Arc::downgrade(&notifier);
        notifier.subscribe(Arc::new(move |name: &str| {
            if name == "A" {
                if let Some(n) = weak.upgrade() {
                    n.raise("B");
                }
            }
        }));

        notifier.raise("A");

        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }
}
