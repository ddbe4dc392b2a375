use serde::{Deserialize, Serialize};

use super::geometry::{Point2, Point3};

/// Pinhole camera intrinsics used for pose, eye landmark and gaze estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

pub const DEFAULT_FOCAL_LENGTH: f64 = 500.0;

impl CameraIntrinsics {
    /// Rough intrinsics for an uncalibrated webcam: fixed focal length,
    /// principal point at the image centre.
    pub fn for_image(width: u32, height: u32) -> Self {
        Self {
            fx: DEFAULT_FOCAL_LENGTH,
            fy: DEFAULT_FOCAL_LENGTH,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    pub fn project(&self, p: Point3) -> Point2 {
        if p.z == 0.0 {
            return Point2::new(self.cx, self.cy);
        }
        Point2::new(self.fx * p.x / p.z + self.cx, self.fy * p.y / p.z + self.cy)
    }

    /// Point at `depth` along the ray through `pixel`.
    pub fn back_project(&self, pixel: Point2, depth: f64) -> Point3 {
        Point3::new(
            (pixel.x - self.cx) * depth / self.fx,
            (pixel.y - self.cy) * depth / self.fy,
            depth,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_for_image_centres_principal_point() {
        let cam = CameraIntrinsics::for_image(640, 480);
        assert_relative_eq!(cam.fx, 500.0);
        assert_relative_eq!(cam.fy, 500.0);
        assert_relative_eq!(cam.cx, 320.0);
        assert_relative_eq!(cam.cy, 240.0);
    }

    #[test]
    fn test_project_back_project_round_trip() {
        let cam = CameraIntrinsics::for_image(640, 480);
        let pixel = Point2::new(400.0, 100.0);
        let p = cam.back_project(pixel, 600.0);
        let back = cam.project(p);
        assert_relative_eq!(back.x, pixel.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, pixel.y, epsilon = 1e-9);
    }

    #[test]
    fn test_principal_point_projects_on_axis() {
        let cam = CameraIntrinsics::for_image(640, 480);
        let p = cam.back_project(Point2::new(320.0, 240.0), 500.0);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);
    }
}
