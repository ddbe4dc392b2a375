use std::ops::{Add, Div, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalized(&self) -> Point3 {
        let n = self.norm();
        if n == 0.0 {
            *self
        } else {
            *self / n
        }
    }

    /// Centroid of `points`, or the origin when empty.
    pub fn mean(points: &[Point3]) -> Point3 {
        if points.is_empty() {
            return Point3::default();
        }
        let sum = points.iter().fold(Point3::default(), |acc, p| acc + *p);
        sum / points.len() as f64
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;
    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Point3 {
    type Output = Point3;
    fn div(self, rhs: f64) -> Point3 {
        Point3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Head pose as `[tx, ty, tz, rx, ry, rz]`: translation in millimetres
/// (camera frame), rotation as Euler angles in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose(pub [f64; 6]);

impl Pose {
    pub fn new(translation: Point3, rotation: Point3) -> Self {
        Self([
            translation.x,
            translation.y,
            translation.z,
            rotation.x,
            rotation.y,
            rotation.z,
        ])
    }

    pub fn translation(&self) -> Point3 {
        Point3::new(self.0[0], self.0[1], self.0[2])
    }

    pub fn rotation(&self) -> Point3 {
        Point3::new(self.0[3], self.0[4], self.0[5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point2_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_normalized_has_unit_length() {
        let p = Point3::new(3.0, 0.0, -4.0).normalized();
        assert_relative_eq!(p.norm(), 1.0);
        assert_relative_eq!(p.x, 0.6);
        assert_relative_eq!(p.z, -0.8);
    }

    #[test]
    fn test_normalized_zero_stays_zero() {
        assert_eq!(Point3::default().normalized(), Point3::default());
    }

    #[test]
    fn test_mean_of_points() {
        let m = Point3::mean(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)]);
        assert_eq!(m, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_mean_of_nothing_is_origin() {
        assert_eq!(Point3::mean(&[]), Point3::default());
    }

    #[test]
    fn test_pose_accessors() {
        let pose = Pose::new(Point3::new(1.0, 2.0, 3.0), Point3::new(0.1, 0.2, 0.3));
        assert_eq!(pose.translation(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.rotation(), Point3::new(0.1, 0.2, 0.3));
    }
}
