//! Rigid transforms (translation, orientation, scale) used by sockets and plugs

use bevy_math::{DMat3, DQuat, DVec3};

/// World or local transform: translation, orientation and per-axis scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xfo {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Default for Xfo {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Xfo {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Create a transform with unit scale
    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
            scale: DVec3::ONE,
        }
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self::new(translation, DQuat::IDENTITY)
    }

    /// Build a frame whose +Z axis points along `dir`.
    ///
    /// +X is `up × dir`, +Y completes the right-handed frame. Falls back to the
    /// identity orientation when `dir` is degenerate or parallel to `up`.
    pub fn from_direction_and_up(position: DVec3, dir: DVec3, up: DVec3) -> Self {
        let z = dir.normalize_or_zero();
        let x = up.cross(z).normalize_or_zero();
        if z == DVec3::ZERO || x == DVec3::ZERO {
            return Self::from_translation(position);
        }
        let y = z.cross(x);
        let rotation = DQuat::from_mat3(&DMat3::from_cols(x, y, z)).normalize();
        Self::new(position, rotation)
    }

    pub fn x_axis(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    pub fn y_axis(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    pub fn z_axis(&self) -> DVec3 {
        self.rotation * DVec3::Z
    }

    /// Compose `self * child`: `child` is expressed in the frame of `self`
    pub fn mul_xfo(&self, child: &Xfo) -> Xfo {
        Xfo {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// Inverse transform. Zero scale components are treated as unit scale.
    pub fn inverse(&self) -> Xfo {
        let inv_scale = DVec3::new(
            recip_or_one(self.scale.x),
            recip_or_one(self.scale.y),
            recip_or_one(self.scale.z),
        );
        let inv_rotation = self.rotation.inverse();
        Xfo {
            translation: inv_scale * (inv_rotation * -self.translation),
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Translation and orientation equal within `eps` (scale ignored)
    pub fn approx_eq(&self, other: &Xfo, eps: f64) -> bool {
        self.translation.distance(other.translation) <= eps
            && self.rotation.angle_between(other.rotation) <= eps
    }
}

fn recip_or_one(v: f64) -> f64 {
    if v == 0.0 {
        1.0
    } else {
        1.0 / v
    }
}

/// Unsigned angle between two vectors in radians, in `[0, π]`
pub fn angle_between(a: DVec3, b: DVec3) -> f64 {
    if a.length_squared() == 0.0 || b.length_squared() == 0.0 {
        return 0.0;
    }
    a.angle_between(b)
}
