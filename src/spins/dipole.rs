use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Moment direction in spherical angles (physics convention, radians).
///
/// This is the only orientation representation in the crate; unit vectors
/// exist transiently for energy evaluation and CSV rows carry degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Azimuth, measured from +x in the xy-plane.
    pub phi: f64,
    /// Polar angle, measured from +z.
    pub theta: f64,
}

impl Orientation {
    pub fn new(phi: f64, theta: f64) -> Self {
        Self { phi, theta }
    }

    /// In-plane orientation (theta = 90°).
    pub fn in_plane(phi: f64) -> Self {
        Self {
            phi,
            theta: FRAC_PI_2,
        }
    }

    /// Unit moment direction `(cos φ sin θ, sin φ sin θ, cos θ)`.
    pub fn direction(&self) -> Vector3<f64> {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vector3::new(cos_phi * sin_theta, sin_phi * sin_theta, cos_theta)
    }

    /// Recover spherical angles from a direction. Zero vectors map to +z.
    pub fn from_direction(v: &Vector3<f64>) -> Self {
        let norm = v.norm();
        if norm == 0.0 {
            return Self::new(0.0, 0.0);
        }
        Self {
            phi: v.y.atan2(v.x),
            theta: (v.z / norm).clamp(-1.0, 1.0).acos(),
        }
    }

    /// Draw φ ~ U[0, 2π) and θ ~ U[0, π] (θ pinned to 90° when `lock_2d`).
    ///
    /// Uniform in the angles, not uniform on the sphere.
    pub fn random<R: Rng>(rng: &mut R, lock_2d: bool) -> Self {
        let phi = rng.gen::<f64>() * TAU;
        let theta = if lock_2d {
            FRAC_PI_2
        } else {
            rng.gen::<f64>() * PI
        };
        Self { phi, theta }
    }
}

/// A point magnetic dipole: fixed position, mutable orientation, and a
/// scalar moment magnitude in Bohr magnetons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dipole {
    /// Cartesian position in storage units (scaled by `10^dist_coef` for
    /// energy evaluation).
    pub position: Vector3<f64>,
    pub orientation: Orientation,
    /// Moment magnitude in units of the Bohr magneton.
    pub moment: f64,
}

impl Dipole {
    pub fn new(position: Vector3<f64>, orientation: Orientation, moment: f64) -> Self {
        Self {
            position,
            orientation,
            moment,
        }
    }
}
