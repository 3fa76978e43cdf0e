//! Math utilities and types
//!
//! Provides the vector types used by the raw geometry tables and the color type
//! carried by material libraries.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Linear RGB color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Color {
    /// Diffuse color given to materials that never set one
    pub const DEFAULT_DIFFUSE: Self = Self::new(0.8, 0.8, 0.8);

    /// Create a new color
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Channels as a vector
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_DIFFUSE
    }
}

impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_vec3_conversion() {
        let color = Color::new(0.2, 0.6, 1.0);
        assert_eq!(Color::from(color.to_vec3()), color);
        assert_eq!(Color::default(), Color::DEFAULT_DIFFUSE);
    }

    #[test]
    fn test_color_is_plain_bytes() {
        let color = Color::new(1.0, 0.0, 0.5);
        assert_eq!(bytemuck::bytes_of(&color).len(), 12);
    }
}
