use core::cmp::{max, min};

use msgpacker::MsgPacker;
use serde::{Deserialize, Serialize};

/// A quadrant of a [`Rect`], fixing the child ordering used by the node codec.
///
/// The numeric values are load-bearing: the encoding of an internal node stores
/// exactly four child hashes in this order, and changing it changes every hash
/// in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, MsgPacker)]
#[repr(u8)]
pub enum Quadrant {
    /// `x < center.x`, `y < center.y`.
    TopLeft = 0,
    /// `x >= center.x`, `y < center.y`.
    TopRight = 1,
    /// `x < center.x`, `y >= center.y`.
    BottomLeft = 2,
    /// `x >= center.x`, `y >= center.y`.
    BottomRight = 3,
}

impl Quadrant {
    /// All four quadrants in codec order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Returns the quadrant associated with the given index, if valid.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Quadrant::TopLeft),
            1 => Some(Quadrant::TopRight),
            2 => Some(Quadrant::BottomLeft),
            3 => Some(Quadrant::BottomRight),
            _ => None,
        }
    }

    /// Returns the codec index of the quadrant.
    pub fn index(self) -> usize {
        self as u8 as usize
    }
}

/// A 2-D point with 32-bit integer coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, MsgPacker)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point, computed in 64-bit arithmetic to avoid
    /// overflow on the difference of two 32-bit coordinates.
    pub fn squared_distance(&self, other: &Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);

        dx * dx + dy * dy
    }
}

/// A circle with an integer center and radius.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, MsgPacker)]
pub struct Circle {
    /// Center of the circle.
    pub center: Point,
    /// Radius of the circle.
    pub r: i64,
}

impl Circle {
    /// Creates a new circle.
    pub const fn new(center: Point, r: i64) -> Self {
        Self { center, r }
    }

    /// Returns `true` if the point lies within the circle, radius included.
    pub fn contains(&self, point: &Point) -> bool {
        self.center.squared_distance(point) <= self.r * self.r
    }
}

/// An axis-aligned rectangle, half-open on the upper bound: `[min, max)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, MsgPacker)]
pub struct Rect {
    /// Inclusive lower corner.
    pub min: Point,
    /// Exclusive upper corner.
    pub max: Point,
}

impl Rect {
    /// Creates a rect from an origin and a width/height.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            min: Point::new(x, y),
            max: Point::new(x + width, y + height),
        }
    }

    /// Creates a rect directly from its min/max corners.
    pub const fn from_corners(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Width of the rect. May be negative or zero for a degenerate rect.
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    /// Height of the rect. May be negative or zero for a degenerate rect.
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Center of the rect, using integer division truncating toward zero.
    ///
    /// This must match the node codec's quadrant routing bit-for-bit: a different rounding
    /// mode would change which quadrant a boundary point lands in.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2,
            (self.min.y + self.max.y) / 2,
        )
    }

    /// Returns the half-open sub-rect for the given quadrant, meeting at [`Rect::center`].
    pub fn quadrant(&self, q: Quadrant) -> Rect {
        let c = self.center();

        match q {
            Quadrant::TopLeft => Rect::from_corners(self.min, c),
            Quadrant::TopRight => {
                Rect::from_corners(Point::new(c.x, self.min.y), Point::new(self.max.x, c.y))
            }
            Quadrant::BottomLeft => {
                Rect::from_corners(Point::new(self.min.x, c.y), Point::new(c.x, self.max.y))
            }
            Quadrant::BottomRight => Rect::from_corners(c, self.max),
        }
    }

    /// Returns the quadrant that would contain `point`, comparing against the center.
    ///
    /// Defined even when `point` lies outside the rect: descent routes by this result
    /// regardless, relying on the caller having already checked containment at the root.
    pub fn which_quadrant(&self, point: &Point) -> Quadrant {
        let c = self.center();

        match (point.x < c.x, point.y < c.y) {
            (true, true) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }

    /// Returns `true` if `point` lies within the half-open rect.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x < self.max.x
            && point.y >= self.min.y
            && point.y < self.max.y
    }

    /// Returns `true` if `other` lies entirely within this rect.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// Strict rect intersection: a shared edge with no overlapping area does not count.
    pub fn intersects_rect(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.min.y < other.max.y
            && self.max.x > other.min.x
            && self.max.y > other.min.y
    }

    /// Squared distance from the nearest point on the rect's boundary (or interior) to `point`,
    /// computed axis-wise.
    pub fn squared_distance_to_point(&self, point: &Point) -> i64 {
        let dx = axis_distance(self.min.x, self.max.x, point.x);
        let dy = axis_distance(self.min.y, self.max.y, point.y);

        dx * dx + dy * dy
    }

    /// Returns `true` if the circle overlaps the rect.
    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        self.squared_distance_to_point(&circle.center) <= circle.r * circle.r
    }

    /// Returns `true` if the circle is fully contained within the rect.
    ///
    /// This combines two checks: the center must lie inside the rect, and the distance from the
    /// center to the nearest edge must be at least `r`. The center-containment check must run
    /// first, since the distance check alone is meaningless once the center is outside.
    pub fn contains_circle(&self, circle: &Circle) -> bool {
        self.contains(&circle.center)
            && self.squared_distance_to_point(&circle.center) >= circle.r * circle.r
    }

    /// Returns the overlapping region of two rects. The result may be degenerate (zero or
    /// negative width/height) if the rects do not overlap.
    pub fn overlap(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            Point::new(max(self.min.x, other.min.x), max(self.min.y, other.min.y)),
            Point::new(min(self.max.x, other.max.x), min(self.max.y, other.max.y)),
        )
    }

    /// Returns the smallest rect containing both rects.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            Point::new(min(self.min.x, other.min.x), min(self.min.y, other.min.y)),
            Point::new(max(self.max.x, other.max.x), max(self.max.y, other.max.y)),
        )
    }
}

fn axis_distance(lo: i32, hi: i32, p: i32) -> i64 {
    let d_lo = i64::from(lo) - i64::from(p);
    let d_hi = i64::from(hi) - i64::from(p);

    min(d_lo.abs(), d_hi.abs())
}
