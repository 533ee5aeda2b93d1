//! Event overlay: per-node, time-ordered annotations.
//!
//! Events are stored strictly per node: a child never sees its parent's
//! events. The per-node log keeps ascending timestamp order at insertion
//! time, with insertion order preserved among equal timestamps, so range
//! queries are two binary searches returning a contiguous run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Event;
use crate::forest::NodeId;

/// One node's annotations, ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Insert keeping timestamp order; an equal timestamp lands after the
    /// existing ones (stable).
    pub fn add(&mut self, event: Event) {
        let at = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(at, event);
    }

    /// Remove the first event equal to `event` (timestamp and text).
    /// Returns whether anything was removed.
    pub fn remove(&mut self, event: &Event) -> bool {
        match self.events.iter().position(|e| e == event) {
            Some(at) => {
                self.events.remove(at);
                true
            }
            None => false,
        }
    }

    /// Events with `t_min <= time <= t_max`, in stored order.
    pub fn in_range(&self, t_min: f64, t_max: f64) -> &[Event] {
        let start = self.events.partition_point(|e| e.time < t_min);
        let end = self.events.partition_point(|e| e.time <= t_max);
        &self.events[start..end]
    }
}

/// Event logs for a whole forest, keyed by node.
///
/// Kept beside the forest rather than inside the nodes: annotations are
/// presentation-adjacent state with their own save path, and the forest stays
/// a pure data hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOverlay {
    logs: BTreeMap<NodeId, EventLog>,
}

impl EventOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, node: NodeId, event: Event) {
        self.logs.entry(node).or_default().add(event);
    }

    pub fn remove_event(&mut self, node: NodeId, event: &Event) -> bool {
        match self.logs.get_mut(&node) {
            Some(log) => log.remove(event),
            None => false,
        }
    }

    /// Events on `node` within `[t_min, t_max]` (inclusive). A node with no
    /// log yields the empty slice; there is no inheritance from ancestors.
    pub fn events_in_range(&self, node: NodeId, t_min: f64, t_max: f64) -> &[Event] {
        match self.logs.get(&node) {
            Some(log) => log.in_range(t_min, t_max),
            None => &[],
        }
    }

    pub fn log(&self, node: NodeId) -> Option<&EventLog> {
        self.logs.get(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::Forest;

    #[test]
    fn range_query_inclusive_bounds() {
        let mut forest = Forest::new();
        let node = forest.add_root("rec");

        let mut overlay = EventOverlay::new();
        overlay.add_event(node, Event::new(1.0, "start"));
        overlay.add_event(node, Event::new(2.5, "stim"));
        overlay.add_event(node, Event::new(5.0, "end"));

        let hits = overlay.events_in_range(node, 1.0, 3.0);
        let texts: Vec<&str> = hits.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["start", "stim"]);

        // Both bounds are inclusive.
        let hits = overlay.events_in_range(node, 2.5, 5.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].text, "end");
    }

    #[test]
    fn insertion_keeps_timestamp_order_stably() {
        let mut log = EventLog::new();
        log.add(Event::new(2.0, "b"));
        log.add(Event::new(1.0, "a"));
        log.add(Event::new(2.0, "c"));
        log.add(Event::new(2.0, "d"));

        let texts: Vec<&str> = log.as_slice().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn remove_drops_one_matching_event() {
        let mut log = EventLog::new();
        log.add(Event::new(1.0, "x"));
        log.add(Event::new(1.0, "x"));
        assert!(log.remove(&Event::new(1.0, "x")));
        assert_eq!(log.len(), 1);
        assert!(!log.remove(&Event::new(9.0, "missing")));
    }

    #[test]
    fn no_inheritance_between_nodes() {
        let mut forest = Forest::new();
        let parent = forest.add_root("rec");
        let child = forest.add_child(parent, "sub");

        let mut overlay = EventOverlay::new();
        overlay.add_event(parent, Event::new(1.0, "parent-only"));

        assert!(overlay.events_in_range(child, 0.0, 10.0).is_empty());
        assert_eq!(overlay.events_in_range(parent, 0.0, 10.0).len(), 1);
    }

    #[test]
    fn overlay_serde_round_trip() {
        let mut forest = Forest::new();
        let node = forest.add_root("rec");
        let mut overlay = EventOverlay::new();
        overlay.add_event(node, Event::new(0.5, "stim on"));
        overlay.add_event(node, Event::new(1.5, "stim off"));

        let json = serde_json::to_string(&overlay).unwrap();
        let back: EventOverlay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, overlay);
    }
}
