//! Screen rectangles in virtual-desktop coordinates.

use serde::{Deserialize, Serialize};

/// Screen region, edges exclusive on the right/bottom
///
/// A zero-area rectangle is a valid "no display" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rectangle {
    pub const EMPTY: Rectangle = Rectangle {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from origin + size. Negative sizes collapse to zero.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add(width.max(0)),
            bottom: y.saturating_add(height.max(0)),
        }
    }

    /// Normalize a rectangle reported by the platform.
    /// Inverted rectangles become `Rectangle::EMPTY`.
    pub fn from_raw(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        if right < left || bottom < top {
            return Self::EMPTY;
        }
        Self::new(left, top, right, bottom)
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top).max(0)
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.left, self.top)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Bounding box of both rectangles; empty rectangles do not contribute.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rectangle {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Overlapping area, or `EMPTY` when the rectangles are disjoint.
    pub fn intersect(&self, other: &Rectangle) -> Rectangle {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left >= right || top >= bottom {
            return Rectangle::EMPTY;
        }
        Rectangle::new(left, top, right, bottom)
    }

    /// True if `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Bounding box of every rectangle in the sequence.
    pub fn bounding<'a, I>(rects: I) -> Rectangle
    where
        I: IntoIterator<Item = &'a Rectangle>,
    {
        rects
            .into_iter()
            .fold(Rectangle::EMPTY, |acc, r| acc.union(r))
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{})-({},{}) {}x{}",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}
