#![forbid(unsafe_code)]

//! Step catalogs: the ordered landmarks the tour visits.
//!
//! Two static catalogs exist, one per [`LayoutClass`]. The compact catalog is
//! the wide one prefixed by a step that teaches the user to open the mobile
//! navigation menu, with targets pointing into the compact navigation region.
//!
//! Compact targets embed `href="..."` in their selectors; the resolver's
//! destination fallback relies on that (see [`crate::resolver::parse_href`]).

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use waypoint_core::viewport::LayoutClass;

/// Preferred side of the landmark for the tooltip (wide layout only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Placement {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// One landmark to visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourStep {
    /// Stable identifier, unique within a catalog.
    pub id: String,
    /// Tooltip header.
    pub title: String,
    /// Tooltip body.
    pub description: String,
    /// Selector (or comma-separated selector group) for the landmark.
    pub target: String,
    pub position: Placement,
    /// 1-based sequence number.
    pub order: u32,
}

impl TourStep {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        target: impl Into<String>,
        position: Placement,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            target: target.into(),
            position,
            order,
        }
    }
}

/// Reasons a step list is not a valid catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No steps at all.
    Empty,
    /// `order` at `index` is not `index + 1`.
    OrderGap {
        index: usize,
        expected: u32,
        found: u32,
    },
    /// Two steps share an id.
    DuplicateId(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "catalog has no steps"),
            Self::OrderGap {
                index,
                expected,
                found,
            } => write!(
                f,
                "step at index {index} has order {found}, expected {expected}"
            ),
            Self::DuplicateId(id) => write!(f, "duplicate step id: {id}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// A validated, ordered sequence of steps.
///
/// Index `i` always holds the step with `order == i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    steps: Vec<TourStep>,
}

impl Catalog {
    /// Sort `steps` by `order` and validate contiguity and id uniqueness.
    pub fn new(mut steps: Vec<TourStep>) -> Result<Self, CatalogError> {
        if steps.is_empty() {
            return Err(CatalogError::Empty);
        }
        steps.sort_by_key(|step| step.order);

        for (index, step) in steps.iter().enumerate() {
            let expected = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if step.order != expected {
                return Err(CatalogError::OrderGap {
                    index,
                    expected,
                    found: step.order,
                });
            }
            if steps[..index].iter().any(|prev| prev.id == step.id) {
                return Err(CatalogError::DuplicateId(step.id.clone()));
            }
        }
        Ok(Self { steps })
    }

    /// A catalog with no steps. Starting a tour on it is a logged no-op.
    #[must_use]
    pub const fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TourStep> {
        self.steps.get(index)
    }

    #[must_use]
    pub fn steps(&self) -> &[TourStep] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &TourStep> {
        self.steps.iter()
    }

    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }
}

/// Selector of the button that expands the compact navigation menu.
pub const MENU_TOGGLE_SELECTOR: &str = "[data-tour=\"mobile-menu-toggle\"]";

/// Selector of the compact navigation region.
pub const COMPACT_NAV_SELECTOR: &str = ".mobile-nav";

/// Landmarks shared by both catalogs: (id, title, description, path, wide placement).
const LANDMARKS: &[(&str, &str, &str, &str, Placement)] = &[
    (
        "dashboard",
        "Dashboard",
        "Your daily overview: calories, macros, and today's meals at a glance.",
        "/dashboard",
        Placement::Bottom,
    ),
    (
        "meal-plans",
        "Meal Plans",
        "Generate a personalised weekly meal plan from your goals and preferences.",
        "/meal-plans",
        Placement::Bottom,
    ),
    (
        "recipes",
        "Recipes",
        "Get recipe suggestions built around what you already have in the kitchen.",
        "/recipes",
        Placement::Bottom,
    ),
    (
        "food-scanner",
        "Food Scanner",
        "Snap a photo of your plate and we'll estimate what's on it.",
        "/food-scanner",
        Placement::Bottom,
    ),
    (
        "nutrition-tracker",
        "Nutrition Tracker",
        "Log what you eat and watch your trends build up over the week.",
        "/tracker",
        Placement::Bottom,
    ),
    (
        "shopping-list",
        "Shopping List",
        "Everything your meal plan needs, grouped by aisle.",
        "/shopping-list",
        Placement::Bottom,
    ),
    (
        "news",
        "News",
        "Articles and community posts from people working toward similar goals.",
        "/news",
        Placement::Bottom,
    ),
    (
        "profile",
        "Profile",
        "Keep your height, weight, and activity level current for accurate targets.",
        "/profile",
        Placement::Left,
    ),
    (
        "settings",
        "Settings",
        "Units, notifications, and account options live here. You can replay this tour from Help.",
        "/settings",
        Placement::Left,
    ),
];

fn wide_steps() -> Vec<TourStep> {
    LANDMARKS
        .iter()
        .zip(1u32..)
        .map(|(&(id, title, description, path, position), order)| {
            TourStep::new(
                id,
                title,
                description,
                format!("[data-tour=\"nav-{id}\"], a[href=\"{path}\"]"),
                position,
                order,
            )
        })
        .collect()
}

fn compact_steps() -> Vec<TourStep> {
    let mut steps = vec![TourStep::new(
        "open-menu",
        "Open the Menu",
        "Tap here any time to open the menu and jump between sections.",
        MENU_TOGGLE_SELECTOR,
        Placement::Bottom,
        1,
    )];
    steps.extend(LANDMARKS.iter().zip(2u32..).map(
        |(&(id, title, description, path, position), order)| {
            TourStep::new(
                id,
                title,
                description,
                format!("{COMPACT_NAV_SELECTOR} a[href=\"{path}\"]"),
                position,
                order,
            )
        },
    ));
    steps
}

static WIDE_CATALOG: LazyLock<Catalog> =
    LazyLock::new(|| Catalog::new(wide_steps()).unwrap_or_default());

static COMPACT_CATALOG: LazyLock<Catalog> =
    LazyLock::new(|| Catalog::new(compact_steps()).unwrap_or_default());

/// The catalog for a layout class.
#[must_use]
pub fn select_catalog(layout: LayoutClass) -> &'static Catalog {
    match layout {
        LayoutClass::Compact => &COMPACT_CATALOG,
        LayoutClass::Wide => &WIDE_CATALOG,
    }
}
