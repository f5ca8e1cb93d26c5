//! Per-device status listeners.
//!
//! Listeners are stored per device id in an ordered map keyed by a handle id
//! issued at subscription time. Removal goes through that id, so two
//! subscriptions of the same closure are still removed independently.
//!
//! Callbacks are invoked outside the registry lock. A callback may therefore
//! subscribe or unsubscribe (itself included) without deadlocking.

use crate::types::DeviceStatus;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked with the new status of a device.
pub type StatusCallback = Arc<dyn Fn(&DeviceStatus) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_device: HashMap<String, BTreeMap<u64, StatusCallback>>,
}

/// Registry of status listeners, shared between the session manager and
/// the [`Subscription`] handles it gives out.
#[derive(Clone, Default)]
pub(crate) struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for status changes of `device_id`.
    ///
    /// The callback is not invoked with the current status; it only sees
    /// later transitions. Ids with no registered device are accepted; their
    /// listeners are simply never invoked.
    pub(crate) fn subscribe<F>(&self, device_id: &str, callback: F) -> Subscription
    where
        F: Fn(&DeviceStatus) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners
            .by_device
            .entry(device_id.to_string())
            .or_default()
            .insert(id, Arc::new(callback));

        Subscription {
            device_id: device_id.to_string(),
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Number of listeners currently registered for `device_id`.
    pub(crate) fn listener_count(&self, device_id: &str) -> usize {
        lock(&self.inner)
            .by_device
            .get(device_id)
            .map_or(0, BTreeMap::len)
    }

    /// Invoke every listener of `device_id` with `status`, in subscription
    /// order. Returns the number of callbacks invoked.
    pub(crate) fn notify(&self, device_id: &str, status: &DeviceStatus) -> usize {
        let callbacks: Vec<StatusCallback> = lock(&self.inner)
            .by_device
            .get(device_id)
            .map(|listeners| listeners.values().cloned().collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback(status);
        }

        callbacks.len()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = lock(&self.inner);
        let total: usize = listeners.by_device.values().map(BTreeMap::len).sum();
        f.debug_struct("ListenerRegistry")
            .field("devices", &listeners.by_device.len())
            .field("listeners", &total)
            .finish()
    }
}

/// Handle returned by a subscription.
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    device_id: String,
    id: u64,
    registry: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Remove exactly this listener.
    ///
    /// Returns `true` if the listener was still registered. Calling it again,
    /// or after the registry is gone, is a no-op returning `false`.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };

        let mut listeners = lock(&inner);
        let Some(device_listeners) = listeners.by_device.get_mut(&self.device_id) else {
            return false;
        };

        let removed = device_listeners.remove(&self.id).is_some();
        if device_listeners.is_empty() {
            listeners.by_device.remove(&self.device_id);
        }
        removed
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|inner| {
            lock(&inner)
                .by_device
                .get(&self.device_id)
                .is_some_and(|listeners| listeners.contains_key(&self.id))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use enroll_core::DeviceState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&DeviceStatus) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move |_: &DeviceStatus| {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_reaches_only_that_device() {
        let registry = ListenerRegistry::new();
        let (scanner_hits, scanner_cb) = counter();
        let (camera_hits, camera_cb) = counter();

        let _a = registry.subscribe("PER-001", scanner_cb);
        let _b = registry.subscribe("PER-004", camera_cb);

        let status = DeviceStatus::from_state(DeviceState::Connected);
        assert_eq!(registry.notify("PER-001", &status), 1);

        assert_eq!(scanner_hits.load(Ordering::SeqCst), 1);
        assert_eq!(camera_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let registry = ListenerRegistry::new();
        let (hits, cb) = counter();
        let cb = Arc::new(cb);

        let first = {
            let cb = Arc::clone(&cb);
            registry.subscribe("PER-002", move |s: &DeviceStatus| cb(s))
        };
        let _second = {
            let cb = Arc::clone(&cb);
            registry.subscribe("PER-002", move |s: &DeviceStatus| cb(s))
        };
        assert_eq!(registry.listener_count("PER-002"), 2);

        assert!(first.unsubscribe());
        assert!(!first.is_active());
        assert_eq!(registry.listener_count("PER-002"), 1);

        registry.notify("PER-002", &DeviceStatus::from_state(DeviceState::Error));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_twice_is_noop() {
        let registry = ListenerRegistry::new();
        let (_, cb) = counter();
        let subscription = registry.subscribe("PER-003", cb);

        assert!(subscription.is_active());
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        assert_eq!(registry.listener_count("PER-003"), 0);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = ListenerRegistry::new();
        let (_, cb) = counter();
        let subscription = registry.subscribe("PER-003", cb);

        drop(registry);
        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let registry = ListenerRegistry::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (hits, count) = counter();

        let inner_slot = Arc::clone(&slot);
        let subscription = registry.subscribe("PER-001", move |status: &DeviceStatus| {
            count(status);
            if let Some(subscription) = inner_slot.lock().unwrap().as_ref() {
                subscription.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(subscription);

        let status = DeviceStatus::from_state(DeviceState::Connecting);
        registry.notify("PER-001", &status);
        registry.notify("PER-001", &status);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.listener_count("PER-001"), 0);
    }

    #[test]
    fn test_notify_without_listeners() {
        let registry = ListenerRegistry::new();
        let status = DeviceStatus::from_state(DeviceState::Connected);
        assert_eq!(registry.notify("PER-009", &status), 0);
    }
}
