#![forbid(unsafe_code)]

//! Landmark resolution.
//!
//! [`resolve`] is a pure function of a step, the layout class, and a
//! [`DomQuery`]. Strategies run in order and the first match wins:
//!
//! | # | Strategy | Layout |
//! |---|----------|--------|
//! | 1 | Selector match on `step.target` (each selector of a group, in order) | all |
//! | 2 | Rendered link whose text equals the title (case-insensitive) | compact |
//! | 3 | Rendered link whose text contains the title (case-insensitive) | compact |
//! | 4 | Rendered link whose `href` equals the one embedded in the target | compact |
//! | 5 | Link inside the navigation region whose text equals the title | compact |
//!
//! Strategies 2–4 only consider links that have been laid out. Strategy 5
//! also accepts links that are mounted but still collapsed, which is the
//! state of the compact menu while it animates open.
//!
//! A miss is recoverable: it is logged with the step id and title and the
//! positioner falls back to a layout-appropriate placement.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use waypoint_core::geometry::Rect;
use waypoint_core::viewport::LayoutClass;

use crate::catalog::TourStep;
use crate::dom::{DomQuery, LinkNode};

static HREF_ATTR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*"([^"]+)""#).ok());

/// Which strategy located the landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Selector,
    ExactText,
    PartialText,
    Href,
    NavRegionText,
}

impl MatchStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Selector => "selector",
            Self::ExactText => "exact_text",
            Self::PartialText => "partial_text",
            Self::Href => "href",
            Self::NavRegionText => "nav_region_text",
        }
    }
}

/// A located landmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTarget {
    /// Bounding box. May be empty for a collapsed navigation link.
    pub rect: Rect,
    pub strategy: MatchStrategy,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(ResolvedTarget),
    NotFound,
}

impl Resolution {
    #[must_use]
    pub const fn target(&self) -> Option<&ResolvedTarget> {
        match self {
            Self::Found(target) => Some(target),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Extract the destination from an `href="..."` fragment of a selector.
///
/// Only works because the compact catalog writes its targets that way; other
/// selector forms yield `None`.
#[must_use]
pub fn parse_href(target: &str) -> Option<&str> {
    HREF_ATTR
        .as_ref()?
        .captures(target)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Locate the landmark for `step`.
pub fn resolve(step: &TourStep, layout: LayoutClass, dom: &dyn DomQuery) -> Resolution {
    let found = by_selector(&step.target, dom)
        .map(|rect| (rect, MatchStrategy::Selector))
        .or_else(|| {
            if layout.is_compact() {
                by_fallbacks(step, dom)
            } else {
                None
            }
        });

    match found {
        Some((rect, strategy)) => {
            if strategy != MatchStrategy::Selector {
                tracing::debug!(
                    step_id = %step.id,
                    strategy = strategy.as_str(),
                    "tour target resolved through fallback"
                );
            }
            Resolution::Found(ResolvedTarget { rect, strategy })
        }
        None => {
            tracing::warn!(
                step_id = %step.id,
                title = %step.title,
                target = %step.target,
                layout = layout.as_str(),
                "tour target not found"
            );
            Resolution::NotFound
        }
    }
}

fn by_selector(target: &str, dom: &dyn DomQuery) -> Option<Rect> {
    target
        .split(',')
        .map(str::trim)
        .filter(|selector| !selector.is_empty())
        .find_map(|selector| dom.query_selector(selector))
}

fn by_fallbacks(step: &TourStep, dom: &dyn DomQuery) -> Option<(Rect, MatchStrategy)> {
    let title = normalize(&step.title);
    let links = dom.links();
    let rendered = || links.iter().filter(|link| link.is_rendered());

    if title.is_empty() {
        return by_href(step, rendered());
    }

    rendered()
        .find(|link| normalize(&link.text) == title)
        .map(|link| (link.rect, MatchStrategy::ExactText))
        .or_else(|| {
            rendered()
                .find(|link| normalize(&link.text).contains(&title))
                .map(|link| (link.rect, MatchStrategy::PartialText))
        })
        .or_else(|| by_href(step, rendered()))
        .or_else(|| {
            links
                .iter()
                .filter(|link| link.in_nav_region)
                .find(|link| normalize(&link.text) == title)
                .map(|link| (link.rect, MatchStrategy::NavRegionText))
        })
}

fn by_href<'a>(
    step: &TourStep,
    mut links: impl Iterator<Item = &'a LinkNode>,
) -> Option<(Rect, MatchStrategy)> {
    let href = parse_href(&step.target)?;
    links
        .find(|link| link.href.as_deref() == Some(href))
        .map(|link| (link.rect, MatchStrategy::Href))
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Placement, select_catalog};
    use crate::dom::DomSnapshot;

    fn step(title: &str, target: &str) -> TourStep {
        TourStep::new("step", title, "", target, Placement::Bottom, 1)
    }

    fn rect(x: f64) -> Rect {
        Rect::new(x, 100.0, 80.0, 24.0)
    }

    #[test]
    fn parse_href_extracts_destination() {
        assert_eq!(parse_href(".mobile-nav a[href=\"/recipes\"]"), Some("/recipes"));
        assert_eq!(parse_href("a[href = \"/x\"]"), Some("/x"));
        assert_eq!(parse_href("#recipes"), None);
        assert_eq!(parse_href("a[href^='/r']"), None);
    }

    #[test]
    fn selector_group_tries_each_in_order() {
        let dom = DomSnapshot::new().with_element("a[href=\"/news\"]", rect(5.0));
        let step = step("News", "[data-tour=\"nav-news\"], a[href=\"/news\"]");
        let resolution = resolve(&step, LayoutClass::Wide, &dom);
        assert_eq!(
            resolution,
            Resolution::Found(ResolvedTarget {
                rect: rect(5.0),
                strategy: MatchStrategy::Selector,
            })
        );
    }

    #[test]
    fn wide_layout_never_uses_fallbacks() {
        let dom = DomSnapshot::new().with_link(LinkNode::new("Recipes", "/recipes", rect(0.0)));
        let step = step("Recipes", "#missing");
        assert_eq!(resolve(&step, LayoutClass::Wide, &dom), Resolution::NotFound);
        assert!(resolve(&step, LayoutClass::Compact, &dom).is_found());
    }

    #[test]
    fn exact_text_beats_substring() {
        let dom = DomSnapshot::new()
            .with_link(LinkNode::new("Saved Recipes", "/saved", rect(0.0)))
            .with_link(LinkNode::new("  recipes ", "/recipes", rect(200.0)));
        let resolution = resolve(&step("Recipes", "#missing"), LayoutClass::Compact, &dom);
        let target = resolution.target().expect("resolved");
        assert_eq!(target.strategy, MatchStrategy::ExactText);
        assert_eq!(target.rect, rect(200.0));
    }

    #[test]
    fn substring_match_when_no_exact() {
        let dom = DomSnapshot::new()
            .with_link(LinkNode::new("Home", "/", rect(0.0)))
            .with_link(LinkNode::new("My Meal Plans", "/plans", rect(90.0)));
        let resolution = resolve(&step("meal plans", "#missing"), LayoutClass::Compact, &dom);
        assert_eq!(
            resolution.target().map(|t| t.strategy),
            Some(MatchStrategy::PartialText)
        );
    }

    #[test]
    fn href_match_when_text_differs() {
        let dom = DomSnapshot::new().with_link(LinkNode::new("Groceries", "/shopping-list", rect(40.0)));
        let step = step("Shopping List", ".mobile-nav a[href=\"/shopping-list\"]");
        let resolution = resolve(&step, LayoutClass::Compact, &dom);
        assert_eq!(resolution.target().map(|t| t.strategy), Some(MatchStrategy::Href));
    }

    #[test]
    fn collapsed_nav_link_matches_only_through_nav_region() {
        let dom = DomSnapshot::new()
            .with_link(LinkNode::new("Profile", "/profile", Rect::default()).in_nav())
            .with_link(LinkNode::new("Profile", "/profile", Rect::default()));
        let resolution = resolve(&step("Profile", "#missing"), LayoutClass::Compact, &dom);
        assert_eq!(
            resolution.target().map(|t| t.strategy),
            Some(MatchStrategy::NavRegionText)
        );
    }

    #[test]
    fn unrendered_links_are_skipped_by_page_strategies() {
        let dom = DomSnapshot::new().with_link(LinkNode::new("News", "/news", Rect::default()));
        assert_eq!(
            resolve(&step("News", "a[href=\"/news\"]"), LayoutClass::Compact, &dom),
            Resolution::NotFound
        );
    }

    #[test]
    fn builtin_compact_catalog_resolves_against_full_menu() {
        let catalog = select_catalog(LayoutClass::Compact);
        let mut dom = DomSnapshot::new().with_element(
            catalog.get(0).expect("menu step").target.clone(),
            Rect::new(340.0, 10.0, 40.0, 40.0),
        );
        for (i, step) in catalog.iter().skip(1).enumerate() {
            let href = parse_href(&step.target).expect("compact targets embed href");
            dom = dom.with_link(
                LinkNode::new(step.title.clone(), href, Rect::new(0.0, 80.0 + 48.0 * i as f64, 300.0, 44.0))
                    .in_nav(),
            );
        }
        for step in catalog.iter() {
            assert!(
                resolve(step, LayoutClass::Compact, &dom).is_found(),
                "{} did not resolve",
                step.id
            );
        }
    }
}
