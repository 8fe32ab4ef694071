// Joint angle geometry - pure functions, safe to call from any thread

use crate::models::pose::Landmark;

/// Vectors shorter than this cannot define an angle
pub const DEGENERATE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("Degenerate geometry: joint vector has near-zero length")]
    DegenerateGeometry,
}

pub type GeometryResult<T> = Result<T, GeometryError>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<&Landmark> for Point2D {
    fn from(landmark: &Landmark) -> Self {
        Self::new(landmark.x, landmark.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<&Landmark> for Point3D {
    fn from(landmark: &Landmark) -> Self {
        Self::new(landmark.x, landmark.y, landmark.z)
    }
}

/// Angle in degrees at `vertex` between the rays towards `point_a` and `point_b`.
///
/// Uses cos(θ) = (v1 · v2) / (|v1| × |v2|) with the ratio clamped to [-1, 1],
/// so the result is always in [0, 180]. Fails instead of returning NaN when
/// either ray is too short to have a direction.
pub fn angle_at(point_a: Point2D, vertex: Point2D, point_b: Point2D) -> GeometryResult<f32> {
    let v1 = [point_a.x - vertex.x, point_a.y - vertex.y];
    let v2 = [point_b.x - vertex.x, point_b.y - vertex.y];
    angle_between(&v1, &v2)
}

/// Same as [`angle_at`] using the landmark depth as a third axis
pub fn angle_at_3d(point_a: Point3D, vertex: Point3D, point_b: Point3D) -> GeometryResult<f32> {
    let v1 = [point_a.x - vertex.x, point_a.y - vertex.y, point_a.z - vertex.z];
    let v2 = [point_b.x - vertex.x, point_b.y - vertex.y, point_b.z - vertex.z];
    angle_between(&v1, &v2)
}

fn angle_between(v1: &[f32], v2: &[f32]) -> GeometryResult<f32> {
    let dot: f32 = v1.iter().zip(v2).map(|(a, b)| a * b).sum();
    let mag1 = v1.iter().map(|a| a * a).sum::<f32>().sqrt();
    let mag2 = v2.iter().map(|b| b * b).sum::<f32>().sqrt();

    // NaN magnitudes fail this comparison too
    if !(mag1 >= DEGENERATE_EPSILON && mag2 >= DEGENERATE_EPSILON) || !dot.is_finite() {
        return Err(GeometryError::DegenerateGeometry);
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Ok(cos_angle.acos().to_degrees())
}
