#![forbid(unsafe_code)]

//! Highlight and tooltip geometry.
//!
//! - **Wide**: the tooltip sits `tooltip_offset` px from the landmark on the
//!   side named by the step's [`Placement`], centred on the other axis.
//! - **Compact**: placement is ignored; the tooltip is a bottom-anchored,
//!   horizontally centred sheet whose width shrinks to fit narrow screens.
//! - In both cases the tooltip box first shrinks to the usable area (the
//!   viewport less `edge_margin` on every side), then is clamped to stay
//!   `edge_margin` px inside every viewport edge. A viewport no larger than
//!   twice the margin leaves no usable area; the box is pinned to the
//!   top/left margin.
//!
//! Misses: on compact layouts past step 0 the navigation region is
//! highlighted instead of a specific element; on wide layouts the tooltip is
//! centred with no highlight.

use serde::{Deserialize, Serialize};
use waypoint_core::geometry::{Rect, Sides, Size, clamp_or_min};
use waypoint_core::viewport::LayoutClass;

use crate::catalog::Placement;
use crate::config::TourConfig;
use crate::resolver::Resolution;

/// How the tooltip was anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "side")]
pub enum TooltipAnchor {
    /// Next to the landmark on the given side.
    Beside(Placement),
    /// Bottom sheet on compact layouts.
    BottomSheet,
    /// Centred in the viewport; no landmark to point at.
    Centered,
}

/// What the presentation shell paints for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepGeometry {
    pub tooltip: Rect,
    pub highlight: Option<Rect>,
    pub anchor: TooltipAnchor,
}

/// Inputs for [`position`].
#[derive(Debug, Clone, Copy)]
pub struct PositionRequest<'a> {
    pub layout: LayoutClass,
    pub step_index: usize,
    pub placement: Placement,
    pub resolution: &'a Resolution,
    pub viewport: Size,
    /// Navigation region bounds reported by the host, if mounted.
    pub nav_region: Option<Rect>,
}

/// Compute highlight and tooltip geometry for one step.
#[must_use]
pub fn position(request: &PositionRequest<'_>, config: &TourConfig) -> StepGeometry {
    let viewport = request.viewport;
    let target = request
        .resolution
        .target()
        .map(|target| target.rect)
        .filter(|rect| !rect.is_empty());

    match request.layout {
        LayoutClass::Wide => match target {
            Some(rect) => StepGeometry {
                tooltip: tooltip_beside(
                    rect,
                    request.placement,
                    config.wide_tooltip,
                    viewport,
                    config.tooltip_offset,
                    config.edge_margin,
                ),
                highlight: highlight(rect, config.highlight_padding, viewport),
                anchor: TooltipAnchor::Beside(request.placement),
            },
            None => StepGeometry {
                tooltip: tooltip_centered(config.wide_tooltip, viewport, config.edge_margin),
                highlight: None,
                anchor: TooltipAnchor::Centered,
            },
        },
        LayoutClass::Compact => {
            let highlight = match target {
                Some(rect) => highlight(rect, config.highlight_padding, viewport),
                // Found but collapsed, or missed past the menu step: frame the
                // whole navigation region so the user still sees feedback.
                None if request.resolution.is_found() || request.step_index > 0 => {
                    let region = request.nav_region.unwrap_or(config.fallback_nav_region);
                    highlight(region, 0.0, viewport)
                }
                None => None,
            };
            StepGeometry {
                tooltip: tooltip_bottom_sheet(config.compact_tooltip, viewport, config.edge_margin),
                highlight,
                anchor: TooltipAnchor::BottomSheet,
            }
        }
    }
}

/// Clamp a box so it stays `margin` px inside the viewport.
#[must_use]
pub fn clamp_to_viewport(rect: Rect, viewport: Size, margin: f64) -> Rect {
    let x = clamp_or_min(rect.x, margin, viewport.width - rect.width - margin);
    let y = clamp_or_min(rect.y, margin, viewport.height - rect.height - margin);
    rect.with_origin(x, y)
}

/// Shrink `estimate` so it fits between the margins.
#[must_use]
pub fn fit_to_usable(estimate: Size, viewport: Size, margin: f64) -> Size {
    let usable = Rect::from_size(viewport).inner(Sides::all(margin));
    estimate.clamp_max(usable.size())
}

/// Tooltip beside `target` on the preferred side, then clamped.
#[must_use]
pub fn tooltip_beside(
    target: Rect,
    placement: Placement,
    estimate: Size,
    viewport: Size,
    offset: f64,
    margin: f64,
) -> Rect {
    let tooltip = fit_to_usable(estimate, viewport, margin);
    let (x, y) = match placement {
        Placement::Top => (
            target.center_x() - tooltip.width / 2.0,
            target.top() - tooltip.height - offset,
        ),
        Placement::Bottom => (
            target.center_x() - tooltip.width / 2.0,
            target.bottom() + offset,
        ),
        Placement::Left => (
            target.left() - tooltip.width - offset,
            target.center_y() - tooltip.height / 2.0,
        ),
        Placement::Right => (
            target.right() + offset,
            target.center_y() - tooltip.height / 2.0,
        ),
    };
    clamp_to_viewport(
        Rect::new(x, y, tooltip.width, tooltip.height),
        viewport,
        margin,
    )
}

/// Bottom-anchored, horizontally centred sheet for compact layouts.
#[must_use]
pub fn tooltip_bottom_sheet(estimate: Size, viewport: Size, margin: f64) -> Rect {
    let size = fit_to_usable(estimate, viewport, margin);
    let x = (viewport.width - size.width) / 2.0;
    let y = viewport.height - size.height - margin;
    clamp_to_viewport(Rect::new(x, y, size.width, size.height), viewport, margin)
}

/// Tooltip centred in the viewport.
#[must_use]
pub fn tooltip_centered(estimate: Size, viewport: Size, margin: f64) -> Rect {
    let tooltip = fit_to_usable(estimate, viewport, margin);
    let x = (viewport.width - tooltip.width) / 2.0;
    let y = (viewport.height - tooltip.height) / 2.0;
    clamp_to_viewport(
        Rect::new(x, y, tooltip.width, tooltip.height),
        viewport,
        margin,
    )
}

/// Padded highlight box, cut to the viewport. `None` when off-screen.
#[must_use]
pub fn highlight(target: Rect, padding: f64, viewport: Size) -> Option<Rect> {
    target
        .outer(Sides::all(padding))
        .intersection_opt(&Rect::from_size(viewport))
}
