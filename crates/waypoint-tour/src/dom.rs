#![forbid(unsafe_code)]

//! Queryable DOM capability.
//!
//! The resolver never touches a live document. The host measures what the
//! tour needs (selector matches, links, the compact navigation region) and
//! hands it over as a [`DomSnapshot`], or implements [`DomQuery`] directly.
//!
//! # Landmark contract
//!
//! Every element that can be a tour target must be reachable through one of
//! the resolution strategies: a stable selector, link text equal to the step
//! title, or a link whose `href` matches the one embedded in the step target.
//! The tour engine cannot enforce this; the application layer upholds it.

use serde::{Deserialize, Serialize};
use waypoint_core::geometry::Rect;

/// One `<a>` element as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkNode {
    /// Rendered text content.
    pub text: String,
    /// Raw `href` attribute.
    pub href: Option<String>,
    /// Bounding box in viewport coordinates. Empty when not laid out yet.
    pub rect: Rect,
    /// Inside the compact navigation region.
    pub in_nav_region: bool,
}

impl LinkNode {
    #[must_use]
    pub fn new(text: impl Into<String>, href: impl Into<String>, rect: Rect) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
            rect,
            in_nav_region: false,
        }
    }

    #[must_use]
    pub fn in_nav(mut self) -> Self {
        self.in_nav_region = true;
        self
    }

    /// Laid out with a non-empty box.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        !self.rect.is_empty()
    }
}

/// An element matched by a selector the host evaluated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementNode {
    pub selector: String,
    pub rect: Rect,
}

/// Read-only view of the document used for landmark resolution.
pub trait DomQuery {
    /// Bounding box of the first element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Option<Rect>;

    /// Every link in document order.
    fn links(&self) -> &[LinkNode];

    /// Bounds of the compact navigation region, when it is mounted.
    fn nav_region(&self) -> Option<Rect>;
}

/// Serializable snapshot of the measurements a host took for one step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomSnapshot {
    pub elements: Vec<ElementNode>,
    pub links: Vec<LinkNode>,
    pub nav_region: Option<Rect>,
}

impl DomSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_element(mut self, selector: impl Into<String>, rect: Rect) -> Self {
        self.elements.push(ElementNode {
            selector: selector.into(),
            rect,
        });
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: LinkNode) -> Self {
        self.links.push(link);
        self
    }

    #[must_use]
    pub fn with_nav_region(mut self, rect: Rect) -> Self {
        self.nav_region = Some(rect);
        self
    }
}

impl DomQuery for DomSnapshot {
    fn query_selector(&self, selector: &str) -> Option<Rect> {
        let selector = selector.trim();
        self.elements
            .iter()
            .find(|element| element.selector.trim() == selector)
            .map(|element| element.rect)
    }

    fn links(&self) -> &[LinkNode] {
        &self.links
    }

    fn nav_region(&self) -> Option<Rect> {
        self.nav_region
    }
}
