#![forbid(unsafe_code)]

//! Geometric primitives in logical (CSS) pixels.
//!
//! Coordinates follow the browser convention: origin at the top-left of the
//! viewport, `x` grows right, `y` grows down. Values are `f64` because element
//! bounding boxes are fractional on high-DPI displays.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, typically an element's bounding box or a
/// tooltip/highlight box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width in logical pixels.
    pub width: f64,
    /// Height in logical pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Left edge. Alias for `self.x`.
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge. Alias for `self.y`.
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Horizontal centre.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical centre.
    #[inline]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the rectangle has zero (or negative) area.
    ///
    /// Elements that are mounted but not laid out report an empty box.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Check whether `other` lies entirely inside `self`.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Shrink the rectangle by the given margin. Dimensions never go negative.
    pub fn inner(&self, margin: Sides) -> Rect {
        Rect {
            x: self.x + margin.left,
            y: self.y + margin.top,
            width: (self.width - margin.horizontal_sum()).max(0.0),
            height: (self.height - margin.vertical_sum()).max(0.0),
        }
    }

    /// Grow the rectangle by the given padding on every side.
    pub fn outer(&self, padding: Sides) -> Rect {
        Rect {
            x: self.x - padding.left,
            y: self.y - padding.top,
            width: self.width + padding.horizontal_sum(),
            height: self.height + padding.vertical_sum(),
        }
    }

    /// Move the rectangle so its top-left corner is at `(x, y)`.
    #[inline]
    pub const fn with_origin(self, x: f64, y: f64) -> Rect {
        Rect::new(x, y, self.width, self.height)
    }
}

/// A width/height pair, e.g. the viewport or an estimated tooltip box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp each dimension to at most `max`.
    #[inline]
    pub fn clamp_max(self, max: Size) -> Size {
        Size::new(self.width.min(max.width), self.height.min(max.height))
    }

    /// Portrait when taller than wide.
    #[inline]
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Sides for padding/margin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Create new sides with equal values.
    pub const fn all(val: f64) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

impl From<f64> for Sides {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

/// Clamp `value` into `[min, max]`, preferring `min` when the range is inverted.
///
/// `f64::clamp` panics when `min > max`; a viewport narrower than the tooltip
/// plus its margins produces exactly that range.
#[inline]
pub fn clamp_or_min(value: f64, min: f64, max: f64) -> f64 {
    if max < min { min } else { value.clamp(min, max) }
}

#[cfg(test)]
mod tests {
    use super::{Rect, Sides, Size, clamp_or_min};
    use pretty_assertions::assert_eq;

    #[test]
    fn rect_intersection_overlaps() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection(&b), Rect::new(2.0, 2.0, 2.0, 2.0));
    }

    #[test]
    fn rect_intersection_no_overlap_is_empty() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 3.0, 2.0, 2.0);
        assert_eq!(a.intersection(&b), Rect::default());
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn rect_inner_reduces_and_saturates() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let inner = rect.inner(Sides::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(inner, Rect::new(4.0, 1.0, 4.0, 6.0));

        let tiny = Rect::new(0.0, 0.0, 10.0, 10.0).inner(Sides::all(20.0));
        assert_eq!(tiny.width, 0.0);
        assert_eq!(tiny.height, 0.0);
    }

    #[test]
    fn rect_outer_pads_every_side() {
        let rect = Rect::new(10.0, 10.0, 20.0, 5.0);
        assert_eq!(rect.outer(Sides::all(8.0)), Rect::new(2.0, 2.0, 36.0, 21.0));
    }

    #[test]
    fn rect_centres() {
        let rect = Rect::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(rect.center_x(), 60.0);
        assert_eq!(rect.center_y(), 40.0);
    }

    #[test]
    fn unmeasured_rect_is_empty() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(5.0, 5.0, 0.0, 12.0).is_empty());
        assert!(!Rect::new(5.0, 5.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn contains_rect_checks_all_edges() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 80.0, 80.0)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(50.0, 50.0, 60.0, 10.0)));
    }

    #[test]
    fn size_orientation() {
        assert!(Size::new(390.0, 844.0).is_portrait());
        assert!(!Size::new(1280.0, 800.0).is_portrait());
        assert_eq!(
            Size::new(500.0, 500.0).clamp_max(Size::new(320.0, 600.0)),
            Size::new(320.0, 500.0)
        );
    }

    #[test]
    fn clamp_or_min_handles_inverted_range() {
        assert_eq!(clamp_or_min(50.0, 20.0, 100.0), 50.0);
        assert_eq!(clamp_or_min(5.0, 20.0, 100.0), 20.0);
        assert_eq!(clamp_or_min(500.0, 20.0, 100.0), 100.0);
        assert_eq!(clamp_or_min(50.0, 20.0, 10.0), 20.0);
    }
}
