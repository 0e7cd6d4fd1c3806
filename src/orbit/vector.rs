//! Plain 3D vector used throughout the integrator.
//!
//! Components are expressed in whatever unit system the owning
//! simulation was built with; the type itself is dimensionless.
//! The horizontal orbital plane of the presets is XZ with +Y up, and
//! in-plane angles are measured from +X toward +Z.

use serde::{Deserialize, Serialize};

/// 3D vector for positions, velocities and forces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Unit vector along +X.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit vector along +Y.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit vector along +Z.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Magnitude squared.
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude (length).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Normalize to unit vector.
    ///
    /// Returns the zero vector when the magnitude is below `f64::EPSILON`
    /// so that NaN never leaks out of a degenerate direction.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag < f64::EPSILON {
            Self::zero()
        } else {
            self.scale(1.0 / mag)
        }
    }

    /// Scale by scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Rotate about the +Y axis by `angle` radians, turning +X toward +Z.
    #[must_use]
    pub fn rotate_about_y(&self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            x: self.x * cos_a - self.z * sin_a,
            y: self.y,
            z: self.x * sin_a + self.z * cos_a,
        }
    }

    /// In-plane angle of the XZ projection, measured from +X toward +Z (radians).
    #[must_use]
    pub fn xz_angle(&self) -> f64 {
        self.z.atan2(self.x)
    }

    /// Unsigned angle between two vectors in radians.
    ///
    /// Zero when either vector is degenerate.
    #[must_use]
    pub fn angle_between(&self, other: &Self) -> f64 {
        let denom = self.magnitude() * other.magnitude();
        if denom < f64::EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Check if all components are finite.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // is_finite not const
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs.scale(self)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_vec3_operations() {
        let v1 = Vec3::new(1.0, 2.0, 3.0);
        let v2 = Vec3::new(4.0, 5.0, 6.0);

        let sum = v1 + v2;
        assert!((sum.x - 5.0).abs() < f64::EPSILON);
        assert!((sum.z - 9.0).abs() < f64::EPSILON);

        let dot = v1.dot(&v2);
        assert!((dot - 32.0).abs() < f64::EPSILON);

        let cross = v1.cross(&v2);
        assert!((cross.x - (-3.0)).abs() < f64::EPSILON);
        assert!((cross.y - 6.0).abs() < f64::EPSILON);
        assert!((cross.z - (-3.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_degenerate_is_zero() {
        let n = Vec3::zero().normalize();
        assert_eq!(n, Vec3::zero());
        assert!(n.is_finite());
    }

    #[test]
    fn test_rotate_about_y_turns_x_toward_z() {
        let r = Vec3::X.rotate_about_y(FRAC_PI_2);
        assert!(r.x.abs() < EPSILON);
        assert!((r.z - 1.0).abs() < EPSILON);
        assert!((r.xz_angle() - FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_angle_between() {
        let a = Vec3::X;
        let b = Vec3::new(1.0, 0.0, 1.0);
        assert!((a.angle_between(&b) - FRAC_PI_2 / 2.0).abs() < EPSILON);
        assert!(a.angle_between(&Vec3::zero()).abs() < EPSILON);
    }

    #[test]
    fn test_scalar_multiplication_commutes() {
        let v = Vec3::new(1.0, -2.0, 0.5);
        assert_eq!(2.0 * v, v * 2.0);
    }
}
