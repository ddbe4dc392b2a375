use super::geometry::Point2;

/// Axis-aligned box in pixel coordinates: top-left corner plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width * self.height
        }
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Overlapping part of both boxes; the default (empty) rect when disjoint.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return Rect::default();
        }
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Standard intersection over union.
    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersection(other).area();
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Overlap score used to suppress proposals that an active slot already
    /// tracks: `inter / (area_a + area_b - 2 * inter)`.
    ///
    /// The denominator is the area covered by exactly one of the boxes, not
    /// the usual union, so the score is unbounded: identical boxes yield
    /// `f64::INFINITY`. The 0.5 suppression threshold is calibrated against
    /// this score, so it must not be swapped for [`Rect::iou`].
    pub fn tracker_overlap(&self, other: &Rect) -> f64 {
        let inter = self.intersection(other).area();
        if inter == 0.0 {
            return 0.0;
        }
        let exclusive = self.area() + other.area() - 2.0 * inter;
        if exclusive <= 0.0 {
            return f64::INFINITY;
        }
        inter / exclusive
    }
}
