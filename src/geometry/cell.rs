use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Centering family of a Bravais cell: P plus the base (A/B/C), face (F),
/// and body (I) centerings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Centering {
    Primitive,
    BaseA,
    BaseB,
    BaseC,
    Face,
    Body,
}

/// The four parameterized 2D crystal systems, plus free-form cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum System2D {
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Hexagonal,
    Custom,
}

/// The seven parameterized 3D crystal systems (hexagonal split into its
/// rhombohedral and hexagonal settings), plus free-form cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum System3D {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Rhombohedral,
    Hexagonal,
    Cubic,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrystalSystem {
    TwoD(System2D),
    ThreeD(System3D),
}

/// Which of the six cell parameters are determined by the crystal system
/// rather than independently settable. Locked parameters are silently
/// overridden on [`Cell::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedParams {
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub alpha: bool,
    pub beta: bool,
    pub gamma: bool,
}

impl CrystalSystem {
    pub fn is_2d(&self) -> bool {
        matches!(self, CrystalSystem::TwoD(_))
    }

    /// The locking table. In 2D, c, alpha, and beta are always fixed.
    pub fn locked(&self) -> LockedParams {
        use self::{System2D as S2, System3D as S3};
        match self {
            CrystalSystem::TwoD(sys) => LockedParams {
                a: false,
                b: matches!(sys, S2::Tetragonal | S2::Hexagonal),
                c: true,
                alpha: true,
                beta: true,
                gamma: matches!(sys, S2::Orthorhombic | S2::Tetragonal | S2::Hexagonal),
            },
            CrystalSystem::ThreeD(sys) => LockedParams {
                a: false,
                b: matches!(
                    sys,
                    S3::Tetragonal | S3::Rhombohedral | S3::Hexagonal | S3::Cubic
                ),
                c: matches!(sys, S3::Rhombohedral | S3::Cubic),
                alpha: !matches!(sys, S3::Triclinic | S3::Custom),
                beta: !matches!(sys, S3::Triclinic | S3::Monoclinic | S3::Custom),
                gamma: !matches!(sys, S3::Triclinic | S3::Rhombohedral | S3::Custom),
            },
        }
    }
}

/// Requested cell parameters. `None` means "use the system default"; locked
/// parameters are overridden regardless of what is passed.
///
/// Lengths are in storage units, angles in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellSpec {
    pub system: CrystalSystem,
    pub centering: Centering,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    /// Additional fractional-coordinate basis points. For `Custom` systems
    /// this is the entire basis (no corners are added).
    pub extra_translations: Vec<Vector3<f64>>,
}

impl CellSpec {
    pub fn new(system: CrystalSystem, centering: Centering) -> Self {
        Self {
            system,
            centering,
            a: None,
            b: None,
            c: None,
            alpha: None,
            beta: None,
            gamma: None,
            extra_translations: Vec::new(),
        }
    }
}

impl Default for CellSpec {
    fn default() -> Self {
        Self::new(
            CrystalSystem::ThreeD(System3D::Cubic),
            Centering::Primitive,
        )
    }
}

const CORNERS_2D: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
];

const CORNERS_3D: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

fn centering_extras(centering: Centering, is_2d: bool) -> Vec<Vector3<f64>> {
    let raw: &[[f64; 3]] = if is_2d {
        // Only P/A/B/I are meaningful on a plane; C and F add nothing.
        match centering {
            Centering::BaseA => &[[0.5, 0.0, 0.0], [0.5, 1.0, 0.0]],
            Centering::BaseB => &[[0.0, 0.5, 0.0], [1.0, 0.5, 0.0]],
            Centering::Body => &[[0.5, 0.5, 0.0]],
            _ => &[],
        }
    } else {
        match centering {
            Centering::BaseA => &[[0.0, 0.5, 0.5], [1.0, 0.5, 0.5]],
            Centering::BaseB => &[[0.5, 0.0, 0.5], [0.5, 1.0, 0.5]],
            Centering::BaseC => &[[0.5, 0.5, 0.0], [0.5, 0.5, 1.0]],
            Centering::Face => &[
                [0.0, 0.5, 0.5],
                [1.0, 0.5, 0.5],
                [0.5, 0.0, 0.5],
                [0.5, 1.0, 0.5],
                [0.5, 0.5, 0.0],
                [0.5, 0.5, 1.0],
            ],
            Centering::Body => &[[0.5, 0.5, 0.5]],
            Centering::Primitive => &[],
        }
    };
    raw.iter().map(|p| Vector3::new(p[0], p[1], p[2])).collect()
}

/// A fully resolved primitive cell: concrete lengths and angles, the
/// fractional basis, and the projected Cartesian basis points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub system: CrystalSystem,
    pub centering: Centering,
    /// Edge lengths in storage units; c is 0 for 2D cells.
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Angles in degrees; alpha and beta are 0 for 2D cells.
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    translations: Vec<Vector3<f64>>,
    basis: Matrix3<f64>,
    points: Vec<Vector3<f64>>,
    min_dist: f64,
}

impl Cell {
    /// Resolve a [`CellSpec`] into a concrete cell.
    ///
    /// Applies the per-system defaults and the locking table, validates the
    /// angles before projecting (no NaN leaves this function), projects the
    /// fractional basis, and caches the minimum pairwise spacing.
    pub fn resolve(spec: &CellSpec) -> Result<Cell, GeometryError> {
        let (a, b, c, alpha, beta, gamma) = resolve_params(spec)?;

        for (name, value) in [("a", a), ("b", b)] {
            if value <= 0.0 {
                return Err(GeometryError::NonPositiveEdge { name, value });
            }
        }
        if !spec.system.is_2d() && c <= 0.0 {
            return Err(GeometryError::NonPositiveEdge { name: "c", value: c });
        }
        if !(gamma > 0.0 && gamma < 180.0) || gamma.to_radians().sin().abs() < 1e-12 {
            return Err(GeometryError::DegenerateGamma(gamma));
        }

        let basis = cell_basis(spec.system, a, b, c, alpha, beta, gamma)?;

        let is_custom = matches!(
            spec.system,
            CrystalSystem::TwoD(System2D::Custom) | CrystalSystem::ThreeD(System3D::Custom)
        );
        let mut translations: Vec<Vector3<f64>> = if is_custom {
            Vec::new()
        } else if spec.system.is_2d() {
            CORNERS_2D
                .iter()
                .map(|p| Vector3::new(p[0], p[1], p[2]))
                .collect()
        } else {
            CORNERS_3D
                .iter()
                .map(|p| Vector3::new(p[0], p[1], p[2]))
                .collect()
        };
        if !is_custom {
            translations.extend(centering_extras(spec.centering, spec.system.is_2d()));
        }
        translations.extend(spec.extra_translations.iter().copied());

        let points: Vec<Vector3<f64>> = translations.iter().map(|t| basis * t).collect();
        let min_dist = min_pair_distance(&points)?;

        Ok(Cell {
            system: spec.system,
            centering: spec.centering,
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            translations,
            basis,
            points,
            min_dist,
        })
    }

    pub fn is_2d(&self) -> bool {
        self.system.is_2d()
    }

    /// Fractional → Cartesian conversion through the cell basis matrix.
    pub fn frac_to_cart(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.basis * frac
    }

    /// Fractional basis points of one cell (origin, non-origin corners,
    /// centering extras).
    pub fn translations(&self) -> &[Vector3<f64>] {
        &self.translations
    }

    /// The basis projected into Cartesian space.
    pub fn basis_points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Minimum pairwise distance among the projected basis points. A display
    /// and sizing unit, not a physical scale.
    pub fn min_dist(&self) -> f64 {
        self.min_dist
    }
}

fn resolve_params(spec: &CellSpec) -> Result<(f64, f64, f64, f64, f64, f64), GeometryError> {
    let (a, b, c, alpha, beta, gamma);
    match spec.system {
        CrystalSystem::TwoD(sys) => {
            alpha = 0.0;
            beta = 0.0;
            c = 0.0;
            match sys {
                System2D::Monoclinic => {
                    gamma = spec.gamma.unwrap_or(15.0);
                    a = spec.a.unwrap_or(150.0);
                    b = spec.b.unwrap_or(200.0);
                }
                System2D::Orthorhombic => {
                    gamma = 90.0;
                    a = spec.a.unwrap_or(300.0);
                    b = spec.b.unwrap_or(200.0);
                }
                System2D::Tetragonal => {
                    gamma = 90.0;
                    a = spec.a.unwrap_or(200.0);
                    b = a;
                }
                System2D::Hexagonal => {
                    gamma = 120.0;
                    a = spec.a.unwrap_or(300.0);
                    b = a;
                }
                System2D::Custom => {
                    a = require(spec.a, "2D", "a")?;
                    b = require(spec.b, "2D", "b")?;
                    gamma = require(spec.gamma, "2D", "gamma")?;
                }
            }
        }
        CrystalSystem::ThreeD(sys) => match sys {
            System3D::Triclinic => {
                gamma = spec.gamma.unwrap_or(60.0);
                alpha = spec.alpha.unwrap_or(70.0);
                beta = spec.beta.unwrap_or(70.0);
                a = spec.a.unwrap_or(200.0);
                b = spec.b.unwrap_or(200.0);
                c = spec.c.unwrap_or(300.0);
            }
            System3D::Monoclinic => {
                gamma = 90.0;
                alpha = 90.0;
                beta = spec.beta.unwrap_or(70.0);
                a = spec.a.unwrap_or(200.0);
                b = spec.b.unwrap_or(200.0);
                c = spec.c.unwrap_or(300.0);
            }
            System3D::Orthorhombic => {
                gamma = 90.0;
                alpha = 90.0;
                beta = 90.0;
                a = spec.a.unwrap_or(200.0);
                b = spec.b.unwrap_or(250.0);
                c = spec.c.unwrap_or(300.0);
            }
            System3D::Tetragonal => {
                gamma = 90.0;
                alpha = 90.0;
                beta = 90.0;
                a = spec.a.unwrap_or(200.0);
                b = a;
                c = spec.c.unwrap_or(300.0);
            }
            System3D::Rhombohedral => {
                gamma = spec.gamma.unwrap_or(60.0);
                alpha = gamma;
                beta = gamma;
                a = spec.a.unwrap_or(200.0);
                b = a;
                c = a;
            }
            System3D::Hexagonal => {
                gamma = 120.0;
                alpha = 90.0;
                beta = 90.0;
                a = spec.a.unwrap_or(200.0);
                b = a;
                c = spec.c.unwrap_or(300.0);
            }
            System3D::Cubic => {
                gamma = 90.0;
                alpha = 90.0;
                beta = 90.0;
                a = spec.a.unwrap_or(200.0);
                b = a;
                c = a;
            }
            System3D::Custom => {
                a = require(spec.a, "3D", "a")?;
                b = require(spec.b, "3D", "b")?;
                c = require(spec.c, "3D", "c")?;
                alpha = require(spec.alpha, "3D", "alpha")?;
                beta = require(spec.beta, "3D", "beta")?;
                gamma = require(spec.gamma, "3D", "gamma")?;
            }
        },
    }
    Ok((a, b, c, alpha, beta, gamma))
}

fn require(
    value: Option<f64>,
    kind: &'static str,
    name: &'static str,
) -> Result<f64, GeometryError> {
    value.ok_or(GeometryError::MissingParameter(kind, name))
}

/// Column basis for the triclinic → Cartesian transform:
/// a = (a, 0, 0), b = b·(cos γ, sin γ, 0),
/// c = c·(cos β, (cos α − cos β cos γ)/sin γ, √(1 − cx² − cy²)).
fn cell_basis(
    system: CrystalSystem,
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> Result<Matrix3<f64>, GeometryError> {
    let gamma_rad = gamma.to_radians();
    let a_vec = Vector3::new(a, 0.0, 0.0);
    let b_vec = Vector3::new(b * gamma_rad.cos(), b * gamma_rad.sin(), 0.0);
    let c_vec = if system.is_2d() {
        Vector3::zeros()
    } else {
        let cx = beta.to_radians().cos();
        let cy = (alpha.to_radians().cos() - cx * gamma_rad.cos()) / gamma_rad.sin();
        let cz2 = 1.0 - cx * cx - cy * cy;
        if cz2 <= 0.0 {
            return Err(GeometryError::DegenerateHeight { alpha, beta, gamma });
        }
        Vector3::new(c * cx, c * cy, c * cz2.sqrt())
    };
    Ok(Matrix3::from_columns(&[a_vec, b_vec, c_vec]))
}

fn min_pair_distance(points: &[Vector3<f64>]) -> Result<f64, GeometryError> {
    let mut min = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        for q in points.iter().skip(i + 1) {
            min = min.min((p - q).norm());
        }
    }
    if min.is_finite() {
        Ok(min)
    } else {
        Err(GeometryError::BasisTooSmall)
    }
}
