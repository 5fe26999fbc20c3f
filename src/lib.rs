//! Deterministic harness for a static page's navigation interactions.
//!
//! Models the enhancement layer of a storefront landing page — a
//! smooth-scroll affordance, a scroll-reactive navigation backdrop, and
//! hover lift on navigation links — over a small in-memory DOM and a
//! simulated viewport. Everything runs single-threaded with a manual
//! clock, so tests drive the page as a sequence of simulated events and
//! observe styles, scroll requests, and followed links directly.
//!
//! ```
//! use page_interactions::{InteractionConfig, Page};
//!
//! let html = r#"
//!     <nav class='main-nav'>
//!       <a class='nav-link' href='#about'>About</a>
//!     </nav>
//!     <a class='scroll-down' href='#about'>v</a>
//!     <section id='about' style='height: 900px'>About us</section>
//! "#;
//!
//! let mut page = Page::from_html(html).unwrap();
//! page.install_interactions(&InteractionConfig::default()).unwrap();
//! page.scroll_to(120.0).unwrap();
//! page.assert_style(".main-nav", "background-color", "rgba(10, 10, 10, 0.98)")
//!     .unwrap();
//! ```

use std::error::Error as StdError;
use std::fmt;

mod dom;
mod events;
mod html;
mod interactions;
mod page;
mod selector;
mod style;
mod viewport;

pub use dom::NodeId;
pub use interactions::InteractionConfig;
pub use page::Page;
pub use viewport::{ScrollAlignment, ScrollBehavior, ScrollRequest};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    Simulation(String),
    AssertionFailed {
        selector: String,
        property: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::Simulation(msg) => write!(f, "simulation error: {msg}"),
            Self::AssertionFailed {
                selector,
                property,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector} {property}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
