//! Tooltip clamping: whatever the landmark position, the tooltip box stays
//! inside the viewport minus the edge margin.

use proptest::prelude::*;
use waypoint_core::geometry::{Rect, Size};
use waypoint_core::viewport::LayoutClass;
use waypoint_tour::{
    MatchStrategy, Placement, PositionRequest, Resolution, ResolvedTarget, TourConfig, position,
};

fn placement_strategy() -> impl Strategy<Value = Placement> {
    prop_oneof![
        Just(Placement::Top),
        Just(Placement::Bottom),
        Just(Placement::Left),
        Just(Placement::Right),
    ]
}

/// Any viewport that leaves some room between the two 20px margins, down to
/// ones far smaller than the tooltip estimate.
fn viewport_strategy() -> impl Strategy<Value = Size> {
    (41u16..=2560, 41u16..=1600).prop_map(|(w, h)| Size::new(f64::from(w), f64::from(h)))
}

/// A target hugging one of the four edges (within 10px).
fn edge_target(viewport: Size) -> impl Strategy<Value = Rect> {
    (0u8..4, 0u16..=10, 0u16..=10_000, 8u16..=200, 8u16..=80).prop_map(
        move |(edge, inset, along, w, h)| {
            let (w, h) = (f64::from(w), f64::from(h));
            let inset = f64::from(inset);
            let along_x = f64::from(along) % (viewport.width - w).max(1.0);
            let along_y = f64::from(along) % (viewport.height - h).max(1.0);
            match edge {
                0 => Rect::new(along_x, inset, w, h),
                1 => Rect::new(along_x, viewport.height - h - inset, w, h),
                2 => Rect::new(inset, along_y, w, h),
                _ => Rect::new(viewport.width - w - inset, along_y, w, h),
            }
        },
    )
}

fn assert_inside_margin(tooltip: Rect, viewport: Size, margin: f64) -> Result<(), TestCaseError> {
    let eps = 1e-9;
    prop_assert!(tooltip.left() >= margin - eps, "left {tooltip:?} in {viewport:?}");
    prop_assert!(tooltip.top() >= margin - eps, "top {tooltip:?} in {viewport:?}");
    prop_assert!(
        tooltip.right() <= viewport.width - margin + eps,
        "right {tooltip:?} in {viewport:?}"
    );
    prop_assert!(
        tooltip.bottom() <= viewport.height - margin + eps,
        "bottom {tooltip:?} in {viewport:?}"
    );
    Ok(())
}

proptest! {
    #[test]
    fn wide_tooltip_stays_inside_margin(
        (viewport, target) in viewport_strategy().prop_flat_map(|v| (Just(v), edge_target(v))),
        placement in placement_strategy(),
        found in any::<bool>(),
    ) {
        let config = TourConfig::default();
        let resolution = if found {
            Resolution::Found(ResolvedTarget { rect: target, strategy: MatchStrategy::Selector })
        } else {
            Resolution::NotFound
        };
        let geometry = position(
            &PositionRequest {
                layout: LayoutClass::Wide,
                step_index: 1,
                placement,
                resolution: &resolution,
                viewport,
                nav_region: None,
            },
            &config,
        );
        assert_inside_margin(geometry.tooltip, viewport, config.edge_margin)?;
    }

    #[test]
    fn compact_tooltip_stays_inside_margin(
        (viewport, target) in viewport_strategy().prop_flat_map(|v| (Just(v), edge_target(v))),
        found in any::<bool>(),
        step_index in 0usize..10,
    ) {
        let config = TourConfig::default();
        let resolution = if found {
            Resolution::Found(ResolvedTarget { rect: target, strategy: MatchStrategy::ExactText })
        } else {
            Resolution::NotFound
        };
        let geometry = position(
            &PositionRequest {
                layout: LayoutClass::Compact,
                step_index,
                placement: Placement::Right,
                resolution: &resolution,
                viewport,
                nav_region: None,
            },
            &config,
        );
        assert_inside_margin(geometry.tooltip, viewport, config.edge_margin)?;
        if let Some(highlight) = geometry.highlight {
            prop_assert!(Rect::from_size(viewport).contains_rect(&highlight));
        }
    }
}
