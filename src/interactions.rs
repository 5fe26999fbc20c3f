//! The page's interaction bindings.
//!
//! Three independent enhancements wired once against a loaded document:
//! a smooth-scroll affordance, a scroll-reactive navigation backdrop,
//! and hover lift on navigation links. They share nothing but the
//! document and the viewport.

use crate::events::Reaction;
use crate::page::Page;
use crate::viewport::{ScrollAlignment, ScrollBehavior};
use crate::Result;

/// Selectors and visual constants for the bindings. `Default` matches
/// the storefront landing page this layer was written for.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// The clickable "scroll down" element; its `href` fragment names
    /// the scroll target.
    pub scroll_affordance: String,
    /// The fixed navigation bar whose backdrop reacts to scrolling.
    pub nav_bar: String,
    /// The links inside the navigation bar that lift on hover.
    pub nav_link: String,
    /// Offsets strictly greater than this raise the backdrop.
    pub scroll_threshold: f64,
    pub nav_resting_background: String,
    pub nav_raised_background: String,
    /// Upward translation applied to a hovered link, in pixels.
    pub link_lift_px: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            scroll_affordance: ".scroll-down".to_string(),
            nav_bar: ".main-nav".to_string(),
            nav_link: ".nav-link".to_string(),
            scroll_threshold: 50.0,
            nav_resting_background: "rgba(20, 20, 20, 0.95)".to_string(),
            nav_raised_background: "rgba(10, 10, 10, 0.98)".to_string(),
            link_lift_px: 3.0,
        }
    }
}

impl InteractionConfig {
    fn lift_transform(&self) -> String {
        format!("translateY({}px)", -self.link_lift_px)
    }
}

impl Page {
    /// Wire the three bindings against the current document.
    ///
    /// The affordance and the navigation bar must exist — they are
    /// resolved once, here, into typed handles (`SelectorNotFound`
    /// otherwise). Navigation links are collected once too: zero links
    /// is fine, links added later are not covered.
    pub fn install_interactions(&mut self, config: &InteractionConfig) -> Result<()> {
        let affordance = self.select_node(&config.scroll_affordance)?;
        let nav = self.select_node(&config.nav_bar)?;
        let links = self.select_nodes(&config.nav_link)?;

        self.add_listener(
            affordance,
            "click",
            false,
            Reaction::ScrollAffordance {
                behavior: ScrollBehavior::Smooth,
                align: ScrollAlignment::Start,
            },
        );

        self.add_listener(
            self.root_id(),
            "scroll",
            false,
            Reaction::NavBackdrop {
                nav,
                threshold: config.scroll_threshold,
                resting: config.nav_resting_background.clone(),
                raised: config.nav_raised_background.clone(),
            },
        );

        let lift = config.lift_transform();
        for link in links {
            self.add_listener(
                link,
                "mouseenter",
                false,
                Reaction::LinkTransform { value: lift.clone() },
            );
            self.add_listener(
                link,
                "mouseleave",
                false,
                Reaction::LinkTransform {
                    value: "translateY(0)".to_string(),
                },
            );
        }
        Ok(())
    }
}
