use crate::shared::face_observation::FaceObservation;
use crate::shared::rect::Rect;

/// Anything the identity matcher can place in the image.
pub trait Locatable {
    fn bounds(&self) -> Rect;

    /// Distance used for nearest-neighbour matching: centre offset and
    /// size change combined, so it grows with spatial separation.
    fn tracking_distance<L: Locatable + ?Sized>(&self, other: &L) -> f64 {
        rect_distance(&self.bounds(), &other.bounds())
    }
}

pub fn rect_distance(a: &Rect, b: &Rect) -> f64 {
    let ca = a.center();
    let cb = b.center();
    let dx = ca.x - cb.x;
    let dy = ca.y - cb.y;
    let dw = a.width - b.width;
    let dh = a.height - b.height;
    (dx * dx + dy * dy + dw * dw + dh * dh).sqrt()
}

impl Locatable for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

impl Locatable for FaceObservation {
    fn bounds(&self) -> Rect {
        self.bounding_box
    }
}

impl<T: Locatable + ?Sized> Locatable for &T {
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }
}
