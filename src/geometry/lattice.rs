use nalgebra::Vector3;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::error::GeometryError;
use crate::geometry::{Cell, CellSpec};
use crate::spins::{Dipole, Orientation};

/// Fill the ball of `radius` around the origin with copies of the cell
/// basis, one dipole per lattice point.
///
/// Basis points sitting on the far cell boundary (a fractional coordinate
/// equal to 1) are dropped first; they reappear as the origin-side points
/// of the neighboring translated cell, so keeping them would double-count
/// shared positions. Index bounds along each axis are conservative:
/// `floor(ceil(R / sin γ) / edge) + 1`, symmetric around zero.
///
/// Emission order is unspecified. Every dipole gets a fresh random
/// orientation (in-plane when the cell is 2D) and a 1 µB moment.
pub fn generate_lattice(cell: &Cell, radius: f64, rng: &mut Xoshiro256StarStar) -> Vec<Dipole> {
    let interior: Vec<Vector3<f64>> = cell
        .translations()
        .iter()
        .filter(|t| t.x != 1.0 && t.y != 1.0 && t.z != 1.0)
        .map(|t| cell.frac_to_cart(t))
        .collect();
    if interior.is_empty() {
        return Vec::new();
    }

    let reach = radius.abs();
    let sin_gamma = cell.gamma.to_radians().sin();
    let n_a = ((reach / sin_gamma).ceil() / cell.a).floor() as i64 + 1;
    let n_b = ((reach / sin_gamma).ceil() / cell.b).floor() as i64 + 1;
    let n_c = if cell.is_2d() {
        0
    } else {
        (reach.ceil() / cell.c).floor() as i64 + 1
    };

    let mut dipoles = Vec::new();
    for ia in -n_a..=n_a {
        for ib in -n_b..=n_b {
            for ic in -n_c..=n_c {
                let origin = cell.frac_to_cart(&Vector3::new(ia as f64, ib as f64, ic as f64));
                for point in &interior {
                    let position = origin + point;
                    if position.norm() <= reach {
                        dipoles.push(Dipole::new(
                            position,
                            Orientation::random(rng, cell.is_2d()),
                            1.0,
                        ));
                    }
                }
            }
        }
    }
    dipoles
}

/// Resolve a spec and enumerate it in one call, seeding the orientation RNG
/// deterministically.
pub fn generate_from_spec(
    spec: &CellSpec,
    radius: f64,
    seed: u64,
) -> Result<Vec<Dipole>, GeometryError> {
    let cell = Cell::resolve(spec)?;
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    Ok(generate_lattice(&cell, radius, &mut rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Centering, CrystalSystem, System2D, System3D};
    use approx::assert_relative_eq;

    fn cubic_cell(a: f64) -> Cell {
        let spec = CellSpec {
            a: Some(a),
            ..CellSpec::new(
                CrystalSystem::ThreeD(System3D::Cubic),
                Centering::Primitive,
            )
        };
        Cell::resolve(&spec).unwrap()
    }

    #[test]
    fn test_cubic_ball_counts() {
        let cell = cubic_cell(200.0);
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        // R = a keeps the origin and its six axis neighbors.
        let dipoles = generate_lattice(&cell, 200.0, &mut rng);
        assert_eq!(dipoles.len(), 7);
    }

    #[test]
    fn test_no_duplicate_positions() {
        let cell = cubic_cell(100.0);
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);
        let dipoles = generate_lattice(&cell, 350.0, &mut rng);
        for (i, d) in dipoles.iter().enumerate() {
            for other in dipoles.iter().skip(i + 1) {
                assert!((d.position - other.position).norm() > 1e-9);
            }
        }
    }

    #[test]
    fn test_centrosymmetric_closure() {
        let cell = cubic_cell(150.0);
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let dipoles = generate_lattice(&cell, 400.0, &mut rng);
        for d in &dipoles {
            let negated = -d.position;
            let found = dipoles
                .iter()
                .any(|e| (e.position - negated).norm() < 1e-9);
            assert!(found, "missing mirror of {:?}", d.position);
        }
    }

    #[test]
    fn test_all_points_within_radius() {
        let spec = CellSpec::new(
            CrystalSystem::ThreeD(System3D::Triclinic),
            Centering::Primitive,
        );
        let cell = Cell::resolve(&spec).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(4);
        let radius = 500.0;
        let dipoles = generate_lattice(&cell, radius, &mut rng);
        assert!(!dipoles.is_empty());
        for d in &dipoles {
            assert!(d.position.norm() <= radius + 1e-9);
        }
    }

    #[test]
    fn test_2d_lattice_stays_in_plane() {
        let spec = CellSpec::new(
            CrystalSystem::TwoD(System2D::Hexagonal),
            Centering::Primitive,
        );
        let cell = Cell::resolve(&spec).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let dipoles = generate_lattice(&cell, 600.0, &mut rng);
        assert!(!dipoles.is_empty());
        for d in &dipoles {
            assert_eq!(d.position.z, 0.0);
            // Orientations follow the cell's planarity.
            assert_relative_eq!(d.orientation.direction().z, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_body_centering_densifies() {
        let primitive = cubic_cell(120.0);
        let spec = CellSpec {
            a: Some(120.0),
            centering: Centering::Body,
            ..CellSpec::new(
                CrystalSystem::ThreeD(System3D::Cubic),
                Centering::Primitive,
            )
        };
        let body = Cell::resolve(&spec).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(6);
        let n_p = generate_lattice(&primitive, 360.0, &mut rng).len();
        let n_i = generate_lattice(&body, 360.0, &mut rng).len();
        assert!(n_i > n_p);
    }

    #[test]
    fn test_generate_from_spec_is_deterministic() {
        let spec = CellSpec::new(
            CrystalSystem::ThreeD(System3D::Cubic),
            Centering::Primitive,
        );
        let a = generate_from_spec(&spec, 300.0, 42).unwrap();
        let b = generate_from_spec(&spec, 300.0, 42).unwrap();
        assert_eq!(a, b);
    }
}
