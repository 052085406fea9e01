use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Landmarks per frame produced by BlazePose-style estimators.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// One skeletal landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }
}

/// Flattens landmarks to `[x0, y0, x1, y1, ...]`, keeping their order.
pub fn flatten_xy(landmarks: &[Landmark]) -> Array1<f64> {
    landmarks.iter().flat_map(|l| [l.x, l.y]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_flatten_xy_drops_depth() {
        let landmarks = [
            Landmark { x: 0.1, y: 0.2, z: -0.5, visibility: Some(0.9) },
            Landmark::new(0.3, 0.4),
        ];
        assert_eq!(flatten_xy(&landmarks), array![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_full_pose_dimension() {
        let pose = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        assert_eq!(flatten_xy(&pose).len(), 66);
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let l: Landmark = serde_json::from_str(r#"{"x": 0.25, "y": 0.75}"#).unwrap();
        assert_eq!(l, Landmark::new(0.25, 0.75));
    }
}
