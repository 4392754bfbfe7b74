//! Property-based invariant tests for geometry primitives (Rect, Sides).
//!
//! 1. Intersection is commutative.
//! 2. Intersection result fits within both inputs.
//! 3. Inner margin shrinks, outer padding grows.
//! 4. `clamp_or_min` never leaves `[min, max]` when the range is valid.

use proptest::prelude::*;
use waypoint_core::geometry::{Rect, Sides, clamp_or_min};

// ── Helpers ─────────────────────────────────────────────────────────────

// Whole-pixel coordinates keep edge arithmetic exact.
fn px(range: std::ops::RangeInclusive<u16>) -> impl Strategy<Value = f64> {
    range.prop_map(f64::from)
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (px(0..=2000), px(0..=2000), px(0..=800), px(0..=800))
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn sides_strategy() -> impl Strategy<Value = Sides> {
    (px(0..=64), px(0..=64), px(0..=64), px(0..=64))
        .prop_map(|(t, r, b, l)| Sides::new(t, r, b, l))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Intersection is commutative
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intersection_commutative(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(
            a.intersection(&b),
            b.intersection(&a),
            "intersection is not commutative: a={:?}, b={:?}",
            a, b
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Intersection result fits within both inputs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intersection_fits_within_both(a in rect_strategy(), b in rect_strategy()) {
        let inter = a.intersection(&b);
        if !inter.is_empty() {
            prop_assert!(a.contains_rect(&inter));
            prop_assert!(b.contains_rect(&inter));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Margins and padding
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn inner_margin_shrinks(rect in rect_strategy(), sides in sides_strategy()) {
        let inner = rect.inner(sides);
        prop_assert!(inner.width <= rect.width);
        prop_assert!(inner.height <= rect.height);
        prop_assert!(inner.width >= 0.0 && inner.height >= 0.0);
    }

    #[test]
    fn outer_padding_contains_original(rect in rect_strategy(), sides in sides_strategy()) {
        let outer = rect.outer(sides);
        prop_assert!(outer.contains_rect(&rect));
        prop_assert_eq!(outer.inner(sides), rect);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. clamp_or_min
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamp_or_min_stays_in_range(value in px(0..=4000), min in px(0..=100), span in px(0..=2000)) {
        let max = min + span;
        let clamped = clamp_or_min(value, min, max);
        prop_assert!(clamped >= min && clamped <= max);
    }

    #[test]
    fn clamp_or_min_inverted_returns_min(value in px(0..=4000), min in px(1..=100), gap in px(1..=100)) {
        prop_assert_eq!(clamp_or_min(value, min, min - gap), min);
    }
}
