//! Five-point face landmarks reported alongside a detection.
//!
//! Point order follows the detector output: left eye, right eye, nose tip,
//! left mouth corner, right mouth corner. A point with x <= 0 was not
//! confidently detected and is treated as missing.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landmark {
    LeftEye = 0,
    RightEye = 1,
    Nose = 2,
    LeftMouth = 3,
    RightMouth = 4,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn point(&self, landmark: Landmark) -> Option<(f64, f64)> {
        let p = self.points[landmark as usize];
        (p.0 > 0.0).then_some(p)
    }

    pub fn visible_count(&self) -> usize {
        self.points.iter().filter(|(x, _)| *x > 0.0).count()
    }

    /// Distance between the eye centers, if both eyes are visible.
    pub fn eye_distance(&self) -> Option<f64> {
        let (l, r) = self.eyes()?;
        Some(((r.0 - l.0).powi(2) + (r.1 - l.1).powi(2)).sqrt())
    }

    /// In-plane head rotation in degrees; positive when the right eye sits
    /// lower than the left.
    pub fn roll_degrees(&self) -> Option<f64> {
        let (l, r) = self.eyes()?;
        Some((r.1 - l.1).atan2(r.0 - l.0).to_degrees())
    }

    fn eyes(&self) -> Option<((f64, f64), (f64, f64))> {
        Some((self.point(Landmark::LeftEye)?, self.point(Landmark::RightEye)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frontal() -> FaceLandmarks {
        FaceLandmarks::new([
            (440.0, 350.0),
            (560.0, 350.0),
            (500.0, 420.0),
            (460.0, 470.0),
            (540.0, 470.0),
        ])
    }

    #[test]
    fn test_missing_points_are_none() {
        let mut pts = frontal().points;
        pts[Landmark::Nose as usize] = (0.0, 0.0);
        let lm = FaceLandmarks::new(pts);

        assert!(lm.point(Landmark::Nose).is_none());
        assert_eq!(lm.point(Landmark::LeftEye), Some((440.0, 350.0)));
        assert_eq!(lm.visible_count(), 4);
    }

    #[test]
    fn test_eye_distance() {
        assert_relative_eq!(frontal().eye_distance().unwrap(), 120.0);
    }

    #[test]
    fn test_level_eyes_have_zero_roll() {
        assert_relative_eq!(frontal().roll_degrees().unwrap(), 0.0);
    }

    #[test]
    fn test_tilted_eyes_roll() {
        let lm = FaceLandmarks::new([
            (100.0, 100.0),
            (200.0, 200.0),
            (150.0, 160.0),
            (120.0, 200.0),
            (180.0, 220.0),
        ]);
        assert_relative_eq!(lm.roll_degrees().unwrap(), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_eye_metrics_need_both_eyes() {
        let mut pts = frontal().points;
        pts[Landmark::RightEye as usize] = (0.0, 0.0);
        let lm = FaceLandmarks::new(pts);
        assert!(lm.eye_distance().is_none());
        assert!(lm.roll_degrees().is_none());
    }
}
