//! Listener registry and per-dispatch event state.
//!
//! A listener couples a capture flag with a [`Reaction`]: a named,
//! data-carrying handler registered against an event channel. Reactions
//! replace free-form callbacks so dispatch stays run-to-completion and
//! the whole listener table is plain cloneable data.

use std::collections::HashMap;

use crate::dom::NodeId;
use crate::viewport::{ScrollAlignment, ScrollBehavior};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reaction {
    /// Suppress default navigation and ask the viewport to bring the
    /// element named by the affordance's `href` fragment into view.
    ScrollAffordance {
        behavior: ScrollBehavior,
        align: ScrollAlignment,
    },
    /// Repaint the navigation bar backdrop from the current scroll
    /// offset: strictly past the threshold means raised.
    NavBackdrop {
        nav: NodeId,
        threshold: f64,
        resting: String,
        raised: String,
    },
    /// Write a transform on the element the listener is attached to.
    LinkTransform { value: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) reaction: Reaction,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node: NodeId, event: &str, listener: Listener) {
        self.map
            .entry(node)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Cloned snapshot, so reactions may mutate the page while the
    /// dispatch loop iterates.
    pub(crate) fn get(&self, node: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) default_prevented: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
        }
    }
}

/// Enter/leave pairs target a single element and never bubble.
pub(crate) fn event_bubbles(event_type: &str) -> bool {
    !matches!(event_type, "mouseenter" | "mouseleave")
}
