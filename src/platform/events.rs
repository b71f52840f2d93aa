/// Platform event feed.
///
/// Replaces ambient global listeners with an explicit subscription
/// interface: the host owns an `EventHub`, interested components call
/// `subscribe()`, and dropping the returned `Subscription` unsubscribes.
/// Delivery is per-subscriber queues (mpsc), drained from the main loop
/// the same way keyboard input is.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::platform::install::InstallPrompt;

/// Lifecycle signals emitted by the platform host.
#[derive(Clone, Debug)]
pub enum PlatformEvent {
    /// The app became eligible for installation; carries the one-shot
    /// prompt token. Clones share the same token (and its at-most-once
    /// guard), mirroring a single underlying native event.
    PromptAvailable(InstallPrompt),
    /// The app was installed (launcher entry written).
    AppInstalled,
}

struct HubInner {
    subscribers: Mutex<Vec<(u64, Sender<PlatformEvent>)>>,
    next_id: Mutex<u64>,
}

/// Cloneable handle to one shared subscriber list; the host keeps one
/// clone, deferred actions keep another for later emission.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    pub fn new() -> Self {
        EventHub {
            inner: Arc::new(HubInner {
                subscribers: Mutex::new(Vec::new()),
                next_id: Mutex::new(0),
            }),
        }
    }

    /// Register a new subscriber. The subscription receives every event
    /// emitted after this call, until it is dropped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = channel();
        let mut id_guard = self.inner.next_id.lock().unwrap_or_else(|e| e.into_inner());
        let id = *id_guard;
        *id_guard += 1;
        drop(id_guard);

        let mut subs = self.inner.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.push((id, tx));
        drop(subs);

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every live subscriber.
    pub fn emit(&self, event: PlatformEvent) {
        let subs = self.inner.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for (_, tx) in subs.iter() {
            // A closed receiver just means the subscription is mid-drop.
            let _ = tx.send(event.clone());
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// A live event subscription. Dropping it deterministically removes the
/// subscriber from the hub.
pub struct Subscription {
    id: u64,
    rx: Receiver<PlatformEvent>,
    hub: Weak<HubInner>,
}

impl Subscription {
    /// Non-blocking poll; call once per frame.
    pub fn poll(&self) -> Option<PlatformEvent> {
        self.rx.try_recv().ok()
    }

    /// Blocking wait with a fixed deadline. Used for the direct polled
    /// wait on an installability signal; returns None when the wait is
    /// abandoned.
    pub fn wait(&self, timeout: Duration) -> Option<PlatformEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            let mut subs = inner.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subs.retain(|(id, _)| *id != self.id);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════
