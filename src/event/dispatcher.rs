//! Event dispatch: listener bookkeeping and the outbound queue.
//!
//! [`EventDispatcher`] tracks which (view, event) pairs have listeners and
//! queues [`EventRecord`]s for delivery to the logic side. High-frequency
//! streams run through a per-listener [`ThrottleGate`]; everything else is
//! forwarded as-is. Events for views without a listener are dropped.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::throttle::ThrottleGate;
use crate::op::NodeHandle;

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// An event crossing from the presentation side to the logic side.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    /// View the event originated on.
    pub handle: NodeHandle,
    /// Event name, e.g. `"tap"` or `"scroll"`.
    pub event: String,
    /// Payload forwarded verbatim to the listener.
    pub payload: Value,
}

impl EventRecord {
    /// Create a record.
    pub fn new(handle: NodeHandle, event: impl Into<String>, payload: Value) -> Self {
        Self {
            handle,
            event: event.into(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

struct ListenerState {
    /// Present when the event name is throttled.
    gate: Option<ThrottleGate>,
}

/// Listener registry plus the outbound event queue.
///
/// Records are enqueued via [`EventDispatcher::dispatch`] and drained for
/// delivery via [`EventDispatcher::drain`]. The dispatcher does not itself
/// ship records across the bridge; that belongs to the session pump, which
/// also turns [`EventDispatcher::next_deadline`] into a timer for trailing
/// throttle fires.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: HashMap<NodeHandle, HashMap<String, ListenerState>>,
    outbound: VecDeque<EventRecord>,
}

impl EventDispatcher {
    /// Create a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. `throttle` carries the window length for
    /// throttled event names and `None` for pass-through delivery.
    ///
    /// Re-adding an existing listener is a no-op, so a pending trailing
    /// fire survives duplicate registration.
    pub fn add_listener(&mut self, handle: NodeHandle, event: &str, throttle: Option<Duration>) {
        self.listeners
            .entry(handle)
            .or_default()
            .entry(event.to_string())
            .or_insert_with(|| ListenerState {
                gate: throttle.map(ThrottleGate::new),
            });
    }

    /// Remove a listener, discarding any pending trailing fire. Returns
    /// `false` if no such listener existed.
    pub fn remove_listener(&mut self, handle: NodeHandle, event: &str) -> bool {
        let Some(by_event) = self.listeners.get_mut(&handle) else {
            return false;
        };
        let removed = by_event.remove(event).is_some();
        if by_event.is_empty() {
            self.listeners.remove(&handle);
        }
        removed
    }

    /// Drop every listener on a view. Used when the view is destroyed.
    pub fn remove_view(&mut self, handle: NodeHandle) {
        self.listeners.remove(&handle);
    }

    /// Whether the (view, event) pair has a listener.
    pub fn has_listener(&self, handle: NodeHandle, event: &str) -> bool {
        self.listeners
            .get(&handle)
            .is_some_and(|by_event| by_event.contains_key(event))
    }

    /// Total number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(HashMap::len).sum()
    }

    /// Ingest a native event. Returns `false` if it was dropped for lack of
    /// a listener; `true` means it was queued or coalesced.
    pub fn dispatch(
        &mut self,
        handle: NodeHandle,
        event: &str,
        payload: Value,
        now: Instant,
    ) -> bool {
        let Some(state) = self
            .listeners
            .get_mut(&handle)
            .and_then(|by_event| by_event.get_mut(event))
        else {
            debug!(%handle, event, "dropping event without listener");
            return false;
        };

        match &mut state.gate {
            Some(gate) => {
                // Flush an overdue trailing fire first so payloads stay in
                // stream order.
                if let Some(due) = gate.poll(now) {
                    self.outbound.push_back(EventRecord::new(handle, event, due));
                }
                if let Some(leading) = gate.offer(now, payload) {
                    self.outbound
                        .push_back(EventRecord::new(handle, event, leading));
                }
            }
            None => {
                self.outbound
                    .push_back(EventRecord::new(handle, event, payload));
            }
        }
        true
    }

    /// Fire every trailing edge whose deadline has passed.
    ///
    /// Due streams are visited in (handle, event) order so delivery is
    /// deterministic when several windows close at once.
    pub fn poll(&mut self, now: Instant) {
        let mut due: Vec<(NodeHandle, String)> = Vec::new();
        for (&handle, by_event) in &self.listeners {
            for (event, state) in by_event {
                let ready = state
                    .gate
                    .as_ref()
                    .and_then(ThrottleGate::next_deadline)
                    .is_some_and(|deadline| deadline <= now);
                if ready {
                    due.push((handle, event.clone()));
                }
            }
        }
        due.sort();

        for (handle, event) in due {
            let payload = self
                .listeners
                .get_mut(&handle)
                .and_then(|by_event| by_event.get_mut(&event))
                .and_then(|state| state.gate.as_mut())
                .and_then(|gate| gate.poll(now));
            if let Some(payload) = payload {
                self.outbound.push_back(EventRecord::new(handle, event, payload));
            }
        }
    }

    /// Earliest pending trailing-fire deadline across all gates.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.listeners
            .values()
            .flat_map(HashMap::values)
            .filter_map(|state| state.gate.as_ref())
            .filter_map(ThrottleGate::next_deadline)
            .min()
    }

    /// Drain all queued records and return them in dispatch order.
    ///
    /// The queue is empty after this call.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        self.outbound.drain(..).collect()
    }

    /// Number of queued records.
    pub fn pending_count(&self) -> usize {
        self.outbound.len()
    }

    /// Whether the outbound queue is empty.
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty()
    }

    /// Drop all listeners, gates, and queued records.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.outbound.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INTERVAL: Duration = Duration::from_millis(16);

    fn h(raw: u64) -> NodeHandle {
        NodeHandle::new(raw)
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    // ── Listener bookkeeping ─────────────────────────────────────────

    #[test]
    fn add_and_remove_listener() {
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "tap", None);

        assert!(disp.has_listener(h(1), "tap"));
        assert_eq!(disp.listener_count(), 1);

        assert!(disp.remove_listener(h(1), "tap"));
        assert!(!disp.has_listener(h(1), "tap"));
        assert_eq!(disp.listener_count(), 0);
    }

    #[test]
    fn remove_missing_listener_is_noop() {
        let mut disp = EventDispatcher::new();
        assert!(!disp.remove_listener(h(1), "tap"));

        disp.add_listener(h(1), "tap", None);
        assert!(!disp.remove_listener(h(1), "scroll"));
        assert!(disp.has_listener(h(1), "tap"));
    }

    #[test]
    fn remove_view_drops_all_listeners() {
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "tap", None);
        disp.add_listener(h(1), "scroll", Some(INTERVAL));
        disp.add_listener(h(2), "tap", None);

        disp.remove_view(h(1));
        assert!(!disp.has_listener(h(1), "tap"));
        assert!(!disp.has_listener(h(1), "scroll"));
        assert!(disp.has_listener(h(2), "tap"));
    }

    // ── Pass-through dispatch ────────────────────────────────────────

    #[test]
    fn unthrottled_events_queue_in_order() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "tap", None);

        assert!(disp.dispatch(h(1), "tap", json!(1), at(base, 0)));
        assert!(disp.dispatch(h(1), "tap", json!(2), at(base, 1)));
        assert_eq!(disp.pending_count(), 2);

        let records = disp.drain();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, json!(1));
        assert_eq!(records[1].payload, json!(2));
        assert!(disp.is_empty());
    }

    #[test]
    fn event_without_listener_is_dropped() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "tap", None);

        assert!(!disp.dispatch(h(1), "scroll", json!(1), at(base, 0)));
        assert!(!disp.dispatch(h(2), "tap", json!(1), at(base, 0)));
        assert!(disp.is_empty());
    }

    // ── Throttled dispatch ───────────────────────────────────────────

    #[test]
    fn throttled_burst_delivers_leading_and_trailing() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "scroll", Some(INTERVAL));

        disp.dispatch(h(1), "scroll", json!({"y": 0}), at(base, 0));
        disp.dispatch(h(1), "scroll", json!({"y": 5}), at(base, 5));
        disp.dispatch(h(1), "scroll", json!({"y": 10}), at(base, 10));

        // Leading fire only so far.
        assert_eq!(disp.pending_count(), 1);
        assert_eq!(disp.next_deadline(), Some(at(base, 16)));

        disp.poll(at(base, 16));
        let records = disp.drain();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, json!({"y": 0}));
        assert_eq!(records[1].payload, json!({"y": 10}));
        assert_eq!(disp.next_deadline(), None);
    }

    #[test]
    fn removing_listener_discards_pending_fire() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "scroll", Some(INTERVAL));

        disp.dispatch(h(1), "scroll", json!(1), at(base, 0));
        disp.dispatch(h(1), "scroll", json!(2), at(base, 5));
        disp.remove_listener(h(1), "scroll");

        disp.poll(at(base, 16));
        let records = disp.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, json!(1));
    }

    #[test]
    fn readding_listener_keeps_pending_fire() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "scroll", Some(INTERVAL));

        disp.dispatch(h(1), "scroll", json!(1), at(base, 0));
        disp.dispatch(h(1), "scroll", json!(2), at(base, 5));
        disp.add_listener(h(1), "scroll", Some(INTERVAL));

        disp.poll(at(base, 16));
        let records = disp.drain();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].payload, json!(2));
    }

    #[test]
    fn late_dispatch_flushes_overdue_trailing_first() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "scroll", Some(INTERVAL));

        disp.dispatch(h(1), "scroll", json!(1), at(base, 0));
        disp.dispatch(h(1), "scroll", json!(2), at(base, 5));
        // No poll ran; the next dispatch must not overtake the pending fire.
        disp.dispatch(h(1), "scroll", json!(3), at(base, 40));

        let records = disp.drain();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].payload, json!(1));
        assert_eq!(records[1].payload, json!(2));
        assert_eq!(records[2].payload, json!(3));
    }

    #[test]
    fn next_deadline_is_minimum_across_gates() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "scroll", Some(INTERVAL));
        disp.add_listener(h(2), "pan", Some(Duration::from_millis(32)));

        disp.dispatch(h(2), "pan", json!(1), at(base, 0));
        disp.dispatch(h(2), "pan", json!(2), at(base, 1));
        disp.dispatch(h(1), "scroll", json!(1), at(base, 4));
        disp.dispatch(h(1), "scroll", json!(2), at(base, 5));

        // scroll trails at t=20, pan at t=32.
        assert_eq!(disp.next_deadline(), Some(at(base, 20)));

        disp.poll(at(base, 20));
        assert_eq!(disp.next_deadline(), Some(at(base, 32)));
    }

    #[test]
    fn poll_fires_due_streams_in_handle_order() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(2), "scroll", Some(INTERVAL));
        disp.add_listener(h(1), "scroll", Some(INTERVAL));

        disp.dispatch(h(2), "scroll", json!("b0"), at(base, 0));
        disp.dispatch(h(2), "scroll", json!("b1"), at(base, 1));
        disp.dispatch(h(1), "scroll", json!("a0"), at(base, 0));
        disp.dispatch(h(1), "scroll", json!("a1"), at(base, 1));
        disp.drain();

        disp.poll(at(base, 16));
        let records = disp.drain();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].handle, h(1));
        assert_eq!(records[1].handle, h(2));
    }

    #[test]
    fn clear_resets_everything() {
        let base = Instant::now();
        let mut disp = EventDispatcher::new();
        disp.add_listener(h(1), "scroll", Some(INTERVAL));
        disp.dispatch(h(1), "scroll", json!(1), at(base, 0));
        disp.dispatch(h(1), "scroll", json!(2), at(base, 5));

        disp.clear();
        assert!(disp.is_empty());
        assert_eq!(disp.listener_count(), 0);
        assert_eq!(disp.next_deadline(), None);
    }
}
