use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::event::{Channel, FrameType};
use crate::types::Frame;

/// Callback invoked for every frame routed to a subscribed channel.
pub type EventCallback = Arc<dyn Fn(&Frame) + Send + Sync + 'static>;

/// Opaque registration handle returned by [`Dispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(Uuid);

impl SubscriptionHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct Registration {
    handle: SubscriptionHandle,
    callback: EventCallback,
}

/// Fans inbound frames out to dynamically registered consumers.
///
/// Decouples the many independent consumers (chat views, room coordinators,
/// toasts, the signaling relay) from the single physical connection. Multiple
/// callbacks may be registered per channel; they are invoked in registration
/// order and a failing callback never prevents its siblings from running.
pub struct Dispatcher {
    subscribers: Mutex<HashMap<Channel, Vec<Registration>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a callback on a logical channel.
    ///
    /// The returned handle is the only way to remove the registration again;
    /// consumers must unsubscribe on teardown or their callback will keep
    /// firing for the lifetime of the session.
    pub fn subscribe(&self, channel: Channel, callback: EventCallback) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        let mut subscribers = self.subscribers.lock().expect("subscriber registry poisoned");
        subscribers
            .entry(channel)
            .or_default()
            .push(Registration { handle, callback });
        handle
    }

    /// Removes a registration. Idempotent; unknown handles are a no-op.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut subscribers = self.subscribers.lock().expect("subscriber registry poisoned");
        for registrations in subscribers.values_mut() {
            registrations.retain(|r| r.handle != handle);
        }
    }

    /// Routes a frame to every callback registered on its matched channels.
    ///
    /// The subscriber list is snapshotted before iterating, so callbacks may
    /// subscribe or unsubscribe (including themselves) without invalidating
    /// the iteration. Unrecognized discriminants are logged and dropped.
    pub fn route(&self, frame: &Frame) {
        if let FrameType::Unknown(kind) = &frame.kind {
            tracing::warn!(kind = %kind, "dropping frame with unrecognized type");
            return;
        }

        for channel in frame.kind.channels() {
            let snapshot: Vec<EventCallback> = {
                let subscribers = self.subscribers.lock().expect("subscriber registry poisoned");
                subscribers
                    .get(channel)
                    .map(|registrations| {
                        registrations
                            .iter()
                            .map(|r| Arc::clone(&r.callback))
                            .collect()
                    })
                    .unwrap_or_default()
            };

            for callback in snapshot {
                if catch_unwind(AssertUnwindSafe(|| callback(frame))).is_err() {
                    tracing::error!(
                        kind = %frame.kind,
                        channel = ?channel,
                        "subscriber callback panicked; continuing with remaining subscribers"
                    );
                }
            }
        }
    }

    /// Number of live registrations on a channel (diagnostics)
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        let subscribers = self.subscribers.lock().expect("subscriber registry poisoned");
        subscribers.get(&channel).map_or(0, Vec::len)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chat_frame() -> Frame {
        Frame::new(FrameType::ChatMessage).with_payload(serde_json::json!({"text": "hi"}))
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            dispatcher.subscribe(
                Channel::Chat,
                Arc::new(move |_| order.lock().unwrap().push(tag)),
            );
        }

        dispatcher.route(&chat_frame());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_before_route_means_zero_invocations() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in_cb = Arc::clone(&calls);
        let handle = dispatcher.subscribe(
            Channel::Chat,
            Arc::new(move |_| {
                calls_in_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );
        dispatcher.unsubscribe(handle);

        dispatcher.route(&chat_frame());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.subscribe(Channel::Chat, Arc::new(|_| {}));

        dispatcher.unsubscribe(handle);
        dispatcher.unsubscribe(handle);
        assert_eq!(dispatcher.subscriber_count(Channel::Chat), 0);
    }

    #[test]
    fn panicking_callback_does_not_starve_siblings() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        dispatcher.subscribe(Channel::Chat, Arc::new(|_| panic!("listener bug")));
        let calls_in_cb = Arc::clone(&calls);
        dispatcher.subscribe(
            Channel::Chat,
            Arc::new(move |_| {
                calls_in_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );

        dispatcher.route(&chat_frame());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_from_inside_callback_is_safe() {
        let dispatcher = Arc::new(Dispatcher::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handle_slot: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));
        let dispatcher_in_cb = Arc::clone(&dispatcher);
        let slot_in_cb = Arc::clone(&handle_slot);
        let calls_in_cb = Arc::clone(&calls);
        let handle = dispatcher.subscribe(
            Channel::Chat,
            Arc::new(move |_| {
                calls_in_cb.fetch_add(1, Ordering::SeqCst);
                if let Some(handle) = *slot_in_cb.lock().unwrap() {
                    dispatcher_in_cb.unsubscribe(handle);
                }
            }),
        );
        *handle_slot.lock().unwrap() = Some(handle);

        dispatcher.route(&chat_frame());
        dispatcher.route(&chat_frame());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_frame_is_dropped_without_panicking() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = Arc::clone(&calls);
        dispatcher.subscribe(
            Channel::Chat,
            Arc::new(move |_| {
                calls_in_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let frame: Frame = serde_json::from_str(r#"{"type":"hologram_sync"}"#).unwrap();
        dispatcher.route(&frame);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn multi_channel_frame_reaches_both_channels() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for channel in [Channel::Room, Channel::Presence] {
            let calls_in_cb = Arc::clone(&calls);
            dispatcher.subscribe(
                channel,
                Arc::new(move |_| {
                    calls_in_cb.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        let frame = Frame::new(FrameType::UserJoined)
            .with_payload(serde_json::json!({"user_id": "u1"}));
        dispatcher.route(&frame);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
