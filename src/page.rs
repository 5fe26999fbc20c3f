//! The page harness.
//!
//! Owns the document, the listener table, and the viewport, and is the
//! single thread of execution: every simulated event runs its listeners
//! to completion before the next one is processed. Scroll notifications
//! produced while a reaction runs are queued and delivered after the
//! triggering dispatch finishes, never re-entrantly.

use crate::dom::{Dom, NodeId};
use crate::events::{EventState, Listener, ListenerStore, Reaction, event_bubbles};
use crate::viewport::{self, ScrollRequest, Viewport};
use crate::{Error, Result, html, selector};

const DEFAULT_TRACE_LOG_LIMIT: usize = 10_000;

pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    viewport: Viewport,
    followed_links: Vec<String>,
    pending_scroll_notify: bool,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Ok(Self {
            dom: html::parse_document(html)?,
            listeners: ListenerStore::default(),
            viewport: Viewport::new(),
            followed_links: Vec::new(),
            pending_scroll_notify: false,
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: DEFAULT_TRACE_LOG_LIMIT,
            trace_to_stderr: true,
        })
    }

    // ---- simulation -----------------------------------------------------

    /// Click the first element matching `selector`. The default action
    /// (following an anchor's `href`) runs unless a listener prevented
    /// it; followed hrefs land in [`Page::followed_links`].
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_node(selector)?;
        let event = self.dispatch_to(target, "click")?;
        if !event.default_prevented {
            if let Some(href) = self.enclosing_link_href(target) {
                self.trace_line(format!("[event] follow href={href}"));
                self.followed_links.push(href);
            }
        }
        self.drain_scroll_notifications()
    }

    /// Pointer enters the element: deliver `mouseenter` (non-bubbling).
    pub fn hover(&mut self, selector: &str) -> Result<()> {
        let target = self.select_node(selector)?;
        self.dispatch_to(target, "mouseenter")?;
        self.drain_scroll_notifications()
    }

    /// Pointer leaves the element: deliver `mouseleave` (non-bubbling).
    pub fn unhover(&mut self, selector: &str) -> Result<()> {
        let target = self.select_node(selector)?;
        self.dispatch_to(target, "mouseleave")?;
        self.drain_scroll_notifications()
    }

    /// Deliver an arbitrary event with no default action.
    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<()> {
        let target = self.select_node(selector)?;
        self.dispatch_to(target, event_type)?;
        self.drain_scroll_notifications()
    }

    /// Move the viewport to `offset` (clamped at zero) and deliver a
    /// scroll notification. Always notifies, even at an unchanged
    /// offset — a notification at the current offset is how tests probe
    /// idempotence. Replaces any smooth scroll in flight.
    pub fn scroll_to(&mut self, offset: f64) -> Result<()> {
        self.viewport.scroll_to(offset)?;
        self.notify_scroll()
    }

    /// Advance the deterministic clock; an active smooth scroll moves
    /// along its curve and, if the offset changed, one scroll
    /// notification is delivered.
    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if self.viewport.advance(delta_ms)? {
            self.notify_scroll()?;
        }
        Ok(())
    }

    /// Run the active smooth scroll to completion.
    pub fn flush_scroll(&mut self) -> Result<()> {
        if self.viewport.flush_scroll() {
            self.notify_scroll()?;
        }
        Ok(())
    }

    /// Append parsed fragment markup under the first element matching
    /// `selector`. Elements appended this way carry no listeners.
    pub fn append_html(&mut self, selector: &str, fragment: &str) -> Result<()> {
        let parent = self.select_node(selector)?;
        html::parse_into(&mut self.dom, parent, fragment)
    }

    // ---- observation ----------------------------------------------------

    pub fn scroll_offset(&self) -> f64 {
        self.viewport.scroll_offset()
    }

    pub fn now_ms(&self) -> i64 {
        self.viewport.now_ms()
    }

    pub fn scroll_in_progress(&self) -> bool {
        self.viewport.scroll_in_progress()
    }

    /// Every scroll command issued to the viewport, oldest first.
    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        self.viewport.requests()
    }

    pub fn last_scroll_request(&self) -> Option<&ScrollRequest> {
        self.viewport.requests().last()
    }

    /// Hrefs of anchors whose click default action ran.
    pub fn followed_links(&self) -> &[String] {
        &self.followed_links
    }

    /// Resolve a selector to its first matching element handle.
    pub fn query(&self, selector: &str) -> Result<NodeId> {
        self.select_node(selector)
    }

    /// All elements matching a selector, in document order.
    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.select_nodes(selector)
    }

    pub fn style_property(&self, selector: &str, property: &str) -> Result<Option<String>> {
        let node = self.select_node(selector)?;
        Ok(self.dom.style_property(node, property))
    }

    pub fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let node = self.select_node(selector)?;
        Ok(self.dom.attr(node, name).map(str::to_string))
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let node = self.select_node(selector)?;
        Ok(self.dom.text_content(node))
    }

    pub fn document_top(&self, selector: &str) -> Result<f64> {
        let node = self.select_node(selector)?;
        Ok(viewport::document_top(&self.dom, node))
    }

    // ---- assertions -----------------------------------------------------

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let node = self.select_node(selector)?;
        let actual = self
            .dom
            .style_property(node, property)
            .unwrap_or_else(|| "(unset)".to_string());
        if actual == expected {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            property: property.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: self.dom.snippet(node),
        })
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let node = self.select_node(selector)?;
        let actual = self.dom.text_content(node);
        if actual == expected {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            property: "text".to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: self.dom.snippet(node),
        })
    }

    pub fn assert_scroll_offset(&self, expected: f64) -> Result<()> {
        let actual = self.viewport.scroll_offset();
        if (actual - expected).abs() < 1e-6 {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: "(viewport)".to_string(),
            property: "scroll-offset".to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            dom_snippet: "#document".to_string(),
        })
    }

    // ---- configuration --------------------------------------------------

    pub fn set_viewport_height(&mut self, height: f64) -> Result<()> {
        self.viewport.set_height(height)
    }

    pub fn set_smooth_scroll_duration(&mut self, duration_ms: i64) -> Result<()> {
        self.viewport.set_smooth_duration_ms(duration_ms)
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Simulation(
                "set_trace_log_limit requires at least 1 entry".to_string(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    // ---- internals ------------------------------------------------------

    pub(crate) fn select_node(&self, selector: &str) -> Result<NodeId> {
        selector::select_one(&self.dom, selector)
    }

    pub(crate) fn select_nodes(&self, selector: &str) -> Result<Vec<NodeId>> {
        selector::select_all(&self.dom, selector)
    }

    pub(crate) fn root_id(&self) -> NodeId {
        self.dom.root()
    }

    pub(crate) fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        reaction: Reaction,
    ) {
        self.listeners
            .add(node, event_type, Listener { capture, reaction });
    }

    fn dispatch_to(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        let mut event = EventState::new(event_type, target);

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        // Capture phase, root toward the target's parent.
        if path.len() >= 2 {
            for node in &path[..path.len() - 1] {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, true)?;
            }
        }

        // Target phase: capture listeners first, then bubble listeners.
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        self.invoke_listeners(target, &mut event, false)?;

        // Bubble phase, skipped entirely for non-bubbling event types.
        if event_bubbles(event_type) && path.len() >= 2 {
            for node in path[..path.len() - 1].iter().rev() {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
            }
        }

        if self.trace {
            let label = self.trace_node_label(event.target);
            self.trace_line(format!(
                "[event] {event_type} target={label} default_prevented={}",
                event.default_prevented
            ));
        }
        Ok(event)
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut EventState, capture: bool) -> Result<()> {
        let listeners = self.listeners.get(node, &event.event_type, capture);
        for listener in &listeners {
            self.run_reaction(&listener.reaction, event)?;
        }
        Ok(())
    }

    fn run_reaction(&mut self, reaction: &Reaction, event: &mut EventState) -> Result<()> {
        match reaction {
            Reaction::ScrollAffordance { behavior, align } => {
                event.default_prevented = true;
                let Some(href) = self
                    .dom
                    .attr(event.current_target, "href")
                    .map(str::to_string)
                else {
                    return Ok(());
                };
                let Some(fragment) = href.strip_prefix('#') else {
                    self.trace_line(format!("[anim] skip non-fragment href={href}"));
                    return Ok(());
                };
                if fragment.is_empty() {
                    return Ok(());
                }
                let Some(target) = self.dom.element_by_id(fragment) else {
                    self.trace_line(format!("[anim] skip dangling target #{fragment}"));
                    return Ok(());
                };
                let top = viewport::document_top(&self.dom, target);
                let height = viewport::block_height(&self.dom, target);
                let moved = self.viewport.begin_request(
                    ScrollRequest {
                        target,
                        behavior: *behavior,
                        align: *align,
                    },
                    top,
                    height,
                );
                self.trace_line(format!("[anim] request target=#{fragment} top={top}"));
                if moved {
                    self.pending_scroll_notify = true;
                }
            }
            Reaction::NavBackdrop {
                nav,
                threshold,
                resting,
                raised,
            } => {
                if !self.dom.is_element(*nav) {
                    return Ok(());
                }
                let offset = self.viewport.scroll_offset();
                let color = if offset > *threshold { raised } else { resting };
                self.dom.set_style_property(*nav, "background-color", color);
            }
            Reaction::LinkTransform { value } => {
                if self.dom.is_element(event.current_target) {
                    self.dom
                        .set_style_property(event.current_target, "transform", value);
                }
            }
        }
        Ok(())
    }

    fn enclosing_link_href(&self, node: NodeId) -> Option<String> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if self.dom.tag_name(id) == Some("a") {
                if let Some(href) = self.dom.attr(id, "href") {
                    return Some(href.to_string());
                }
            }
            cursor = self.dom.parent(id);
        }
        None
    }

    fn notify_scroll(&mut self) -> Result<()> {
        self.trace_line(format!("[scroll] offset={}", self.viewport.scroll_offset()));
        let root = self.dom.root();
        self.dispatch_to(root, "scroll")?;
        self.drain_scroll_notifications()
    }

    /// Deliver notifications queued by reactions (an `Auto` scroll
    /// request jumping the offset) once the triggering dispatch is done.
    fn drain_scroll_notifications(&mut self) -> Result<()> {
        while self.pending_scroll_notify {
            self.pending_scroll_notify = false;
            self.notify_scroll()?;
        }
        Ok(())
    }

    fn trace_node_label(&self, node: NodeId) -> String {
        let Some(tag) = self.dom.tag_name(node) else {
            return "document".to_string();
        };
        if let Some(id) = self.dom.attr(node, "id") {
            return format!("{tag}#{id}");
        }
        if let Some(class) = self
            .dom
            .attr(node, "class")
            .and_then(|classes| classes.split_ascii_whitespace().next())
        {
            return format!("{tag}.{class}");
        }
        tag.to_string()
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{ScrollAlignment, ScrollBehavior};

    const PAGE: &str = r#"
        <nav class='main-nav'>
          <a class='nav-link' href='#shop'>Shop</a>
        </nav>
        <a class='scroll-down' href='#shop'>v</a>
        <section id='shop' style='height: 700px'>shop</section>
    "#;

    #[test]
    fn capture_listeners_run_before_target_bubble_listeners() -> Result<()> {
        let mut page = Page::from_html("<div id='outer'><a id='inner' href='#x'>x</a></div>")?;
        let outer = page.select_node("#outer")?;
        let inner = page.select_node("#inner")?;
        page.add_listener(
            outer,
            "click",
            true,
            Reaction::LinkTransform {
                value: "translateY(-1px)".to_string(),
            },
        );
        page.add_listener(
            inner,
            "click",
            false,
            Reaction::LinkTransform {
                value: "translateY(-2px)".to_string(),
            },
        );
        page.click("#inner")?;
        page.assert_style("#outer", "transform", "translateY(-1px)")?;
        page.assert_style("#inner", "transform", "translateY(-2px)")?;
        Ok(())
    }

    #[test]
    fn unprevented_anchor_click_follows_the_href() -> Result<()> {
        let mut page = Page::from_html(PAGE)?;
        page.click(".nav-link")?;
        assert_eq!(page.followed_links(), ["#shop"]);
        Ok(())
    }

    #[test]
    fn scroll_affordance_prevents_navigation_and_requests_scroll() -> Result<()> {
        let mut page = Page::from_html(PAGE)?;
        let affordance = page.select_node(".scroll-down")?;
        page.add_listener(
            affordance,
            "click",
            false,
            Reaction::ScrollAffordance {
                behavior: ScrollBehavior::Smooth,
                align: ScrollAlignment::Start,
            },
        );
        page.click(".scroll-down")?;
        assert!(page.followed_links().is_empty());
        let request = page.last_scroll_request().expect("scroll request logged");
        assert_eq!(request.behavior, ScrollBehavior::Smooth);
        assert_eq!(request.align, ScrollAlignment::Start);
        assert_eq!(request.target, page.select_node("#shop")?);
        assert!(page.scroll_in_progress());
        Ok(())
    }

    #[test]
    fn auto_affordance_jumps_and_notifies_after_the_click() -> Result<()> {
        let mut page = Page::from_html(PAGE)?;
        let affordance = page.select_node(".scroll-down")?;
        let nav = page.select_node(".main-nav")?;
        page.add_listener(
            affordance,
            "click",
            false,
            Reaction::ScrollAffordance {
                behavior: ScrollBehavior::Auto,
                align: ScrollAlignment::Start,
            },
        );
        page.add_listener(
            page.root_id(),
            "scroll",
            false,
            Reaction::NavBackdrop {
                nav,
                threshold: 50.0,
                resting: "white".to_string(),
                raised: "black".to_string(),
            },
        );
        page.click(".scroll-down")?;
        let expected_top = page.document_top("#shop")?;
        page.assert_scroll_offset(expected_top)?;
        page.assert_style(".main-nav", "background-color", "black")?;
        Ok(())
    }

    #[test]
    fn alignment_variants_position_the_target_in_the_viewport() -> Result<()> {
        // The target is 700 tall at offset 800; with a 1000-tall
        // viewport, Center leaves 150 above it and End leaves 300.
        for (align, expected) in [(ScrollAlignment::Center, 650.0), (ScrollAlignment::End, 500.0)] {
            let mut page = Page::from_html(
                r#"
                <a class='scroll-down' href='#shop'>v</a>
                <header style='height: 680px'>hero</header>
                <section id='shop' style='height: 700px'>shop</section>
                "#,
            )?;
            page.set_viewport_height(1000.0)?;
            let affordance = page.select_node(".scroll-down")?;
            page.add_listener(
                affordance,
                "click",
                false,
                Reaction::ScrollAffordance {
                    behavior: ScrollBehavior::Auto,
                    align,
                },
            );
            page.click(".scroll-down")?;
            page.assert_scroll_offset(expected)?;
        }
        Ok(())
    }

    #[test]
    fn dangling_fragment_is_a_quiet_no_op() -> Result<()> {
        let mut page = Page::from_html(
            "<a class='scroll-down' href='#nowhere'>v</a><section id='real'>r</section>",
        )?;
        let affordance = page.select_node(".scroll-down")?;
        page.add_listener(
            affordance,
            "click",
            false,
            Reaction::ScrollAffordance {
                behavior: ScrollBehavior::Smooth,
                align: ScrollAlignment::Start,
            },
        );
        page.click(".scroll-down")?;
        assert!(page.scroll_requests().is_empty());
        assert!(page.followed_links().is_empty());
        assert_eq!(page.scroll_offset(), 0.0);
        Ok(())
    }

    #[test]
    fn hover_does_not_bubble_to_ancestors() -> Result<()> {
        let mut page = Page::from_html("<div id='outer'><span id='inner'>x</span></div>")?;
        let outer = page.select_node("#outer")?;
        page.add_listener(
            outer,
            "mouseenter",
            false,
            Reaction::LinkTransform {
                value: "translateY(-9px)".to_string(),
            },
        );
        page.hover("#inner")?;
        assert_eq!(page.style_property("#outer", "transform")?, None);

        // Entering the outer element itself still fires.
        page.hover("#outer")?;
        page.assert_style("#outer", "transform", "translateY(-9px)")?;
        Ok(())
    }

    #[test]
    fn trace_log_is_bounded_and_drainable() -> Result<()> {
        let mut page = Page::from_html(PAGE)?;
        page.enable_trace(true);
        page.set_trace_stderr(false);
        page.set_trace_log_limit(2)?;
        page.scroll_to(10.0)?;
        page.scroll_to(20.0)?;
        page.scroll_to(30.0)?;
        let logs = page.take_trace_logs();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|line| line.starts_with('[')));
        assert!(page.take_trace_logs().is_empty());
        assert!(matches!(
            page.set_trace_log_limit(0),
            Err(Error::Simulation(_))
        ));
        Ok(())
    }

    #[test]
    fn append_html_adds_elements_without_listeners() -> Result<()> {
        let mut page = Page::from_html(PAGE)?;
        page.append_html(".main-nav", "<a class='nav-link' href='#late'>Late</a>")?;
        assert_eq!(page.select_nodes(".nav-link")?.len(), 2);
        page.hover("a[href='#late']")?;
        assert_eq!(page.style_property("a[href='#late']", "transform")?, None);
        Ok(())
    }

    #[test]
    fn simulation_against_missing_elements_reports_the_selector() {
        let mut page = Page::from_html(PAGE).unwrap();
        assert_eq!(
            page.click(".missing"),
            Err(Error::SelectorNotFound(".missing".to_string()))
        );
    }

    #[test]
    fn assertion_failures_carry_a_snippet() -> Result<()> {
        let page = Page::from_html(PAGE)?;
        let err = page
            .assert_style(".main-nav", "background-color", "black")
            .unwrap_err();
        match err {
            Error::AssertionFailed {
                actual, dom_snippet, ..
            } => {
                assert_eq!(actual, "(unset)");
                assert!(dom_snippet.starts_with("<nav"), "snippet: {dom_snippet}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
