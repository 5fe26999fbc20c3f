//! Simulated viewport: scroll offset, vertical flow metrics, and the
//! platform's smooth-scroll animation under a deterministic clock.
//!
//! Time only moves when the harness is told to move it, so an animation
//! requested by a binding progresses in observable, repeatable steps.

use crate::dom::{Dom, NodeId};
use crate::style;
use crate::{Error, Result};

/// Height assumed for an element with no inline height and no element
/// children. Keeps untyped fixtures scrollable without a layout engine.
pub(crate) const LEAF_BLOCK_HEIGHT: f64 = 120.0;

/// Elements that never take up vertical space in the flow.
const NON_RENDERED_TAGS: &[&str] = &[
    "base", "head", "link", "meta", "script", "style", "template", "title",
];

const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;
const DEFAULT_SMOOTH_DURATION_MS: i64 = 450;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Auto,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlignment {
    Start,
    Center,
    End,
}

/// One scroll command issued to the viewport, as observed by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: NodeId,
    pub behavior: ScrollBehavior,
    pub align: ScrollAlignment,
}

#[derive(Debug, Clone)]
struct ScrollAnimation {
    from: f64,
    to: f64,
    started_at: i64,
    duration_ms: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct Viewport {
    scroll_y: f64,
    height: f64,
    now_ms: i64,
    animation: Option<ScrollAnimation>,
    requests: Vec<ScrollRequest>,
    smooth_duration_ms: i64,
}

impl Viewport {
    pub(crate) fn new() -> Self {
        Self {
            scroll_y: 0.0,
            height: DEFAULT_VIEWPORT_HEIGHT,
            now_ms: 0,
            animation: None,
            requests: Vec::new(),
            smooth_duration_ms: DEFAULT_SMOOTH_DURATION_MS,
        }
    }

    pub(crate) fn scroll_offset(&self) -> f64 {
        self.scroll_y
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn set_height(&mut self, height: f64) -> Result<()> {
        if !height.is_finite() || height <= 0.0 {
            return Err(Error::Simulation(format!(
                "viewport height must be positive and finite, got {height}"
            )));
        }
        self.height = height;
        Ok(())
    }

    pub(crate) fn set_smooth_duration_ms(&mut self, duration_ms: i64) -> Result<()> {
        if duration_ms <= 0 {
            return Err(Error::Simulation(format!(
                "smooth scroll duration must be positive, got {duration_ms}"
            )));
        }
        self.smooth_duration_ms = duration_ms;
        Ok(())
    }

    pub(crate) fn requests(&self) -> &[ScrollRequest] {
        &self.requests
    }

    pub(crate) fn scroll_in_progress(&self) -> bool {
        self.animation.is_some()
    }

    /// Offset that aligns `target_top` per the request's alignment.
    fn aligned_offset(&self, target_top: f64, target_height: f64, align: ScrollAlignment) -> f64 {
        let raw = match align {
            ScrollAlignment::Start => target_top,
            ScrollAlignment::Center => target_top - (self.height - target_height) / 2.0,
            ScrollAlignment::End => target_top - (self.height - target_height),
        };
        raw.max(0.0)
    }

    /// Record a scroll command and either jump (`Auto`) or start the
    /// easing animation (`Smooth`). Returns true when the offset moved
    /// right away.
    pub(crate) fn begin_request(
        &mut self,
        request: ScrollRequest,
        target_top: f64,
        target_height: f64,
    ) -> bool {
        let to = self.aligned_offset(target_top, target_height, request.align);
        let behavior = request.behavior;
        self.requests.push(request);
        match behavior {
            ScrollBehavior::Auto => {
                self.animation = None;
                let changed = (to - self.scroll_y).abs() > f64::EPSILON;
                if changed {
                    self.scroll_y = to;
                }
                changed
            }
            ScrollBehavior::Smooth => {
                self.animation = Some(ScrollAnimation {
                    from: self.scroll_y,
                    to,
                    started_at: self.now_ms,
                    duration_ms: self.smooth_duration_ms,
                });
                false
            }
        }
    }

    /// A direct scroll replaces any animation in flight.
    pub(crate) fn scroll_to(&mut self, offset: f64) -> Result<bool> {
        if !offset.is_finite() {
            return Err(Error::Simulation(format!(
                "scroll offset must be finite, got {offset}"
            )));
        }
        self.animation = None;
        let clamped = offset.max(0.0);
        let changed = (clamped - self.scroll_y).abs() > f64::EPSILON;
        self.scroll_y = clamped;
        Ok(changed)
    }

    pub(crate) fn advance(&mut self, delta_ms: i64) -> Result<bool> {
        if delta_ms < 0 {
            return Err(Error::Simulation(format!(
                "advance_time requires non-negative milliseconds, got {delta_ms}"
            )));
        }
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        Ok(self.apply_animation())
    }

    /// Run the active animation to its end, advancing the clock past it.
    pub(crate) fn flush_scroll(&mut self) -> bool {
        let Some(animation) = &self.animation else {
            return false;
        };
        let ends_at = animation.started_at.saturating_add(animation.duration_ms);
        if ends_at > self.now_ms {
            self.now_ms = ends_at;
        }
        self.apply_animation()
    }

    fn apply_animation(&mut self) -> bool {
        let Some(animation) = &self.animation else {
            return false;
        };
        let elapsed = self.now_ms.saturating_sub(animation.started_at);
        let done = elapsed >= animation.duration_ms;
        let next = if done {
            animation.to
        } else {
            let t = (elapsed as f64 / animation.duration_ms as f64).clamp(0.0, 1.0);
            animation.from + (animation.to - animation.from) * ease_out_cubic(t)
        };
        let changed = (next - self.scroll_y).abs() > f64::EPSILON;
        if changed {
            self.scroll_y = next;
        }
        if done {
            self.animation = None;
        }
        changed
    }
}

/// Fast start, visible deceleration into the target.
fn ease_out_cubic(t: f64) -> f64 {
    let u = 1.0 - t;
    1.0 - u * u * u
}

/// Height of an element's block: inline `height` wins, otherwise the
/// sum of element children, otherwise the leaf default. Guarded against
/// attacker-shaped nesting depth.
pub(crate) fn block_height(dom: &Dom, node: NodeId) -> f64 {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        if dom
            .tag_name(node)
            .is_some_and(|tag| NON_RENDERED_TAGS.contains(&tag))
        {
            return 0.0;
        }
        if let Some(height) = dom
            .style_property(node, "height")
            .as_deref()
            .and_then(style::px_length)
        {
            return height;
        }
        let mut total = 0.0;
        let mut has_children = false;
        for child in dom.child_elements(node) {
            has_children = true;
            total += block_height(dom, child);
        }
        if has_children { total } else { LEAF_BLOCK_HEIGHT }
    })
}

/// Document-top offset of an element: its parent's offset plus the
/// heights of preceding element siblings.
pub(crate) fn document_top(dom: &Dom, node: NodeId) -> f64 {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        let Some(parent) = dom.parent(node) else {
            return 0.0;
        };
        let mut top = if dom.is_element(parent) {
            document_top(dom, parent)
        } else {
            0.0
        };
        for sibling in dom.child_elements(parent) {
            if sibling == node {
                break;
            }
            top += block_height(dom, sibling);
        }
        top
    })
}
