use crate::spins::Dipole;
use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};

/// Vacuum permeability, T·m/A.
pub const MU_0: f64 = 1.256_637_062_12e-6;
/// Bohr magneton, J/T.
pub const BOHR_MAGNETON: f64 = 9.27e-24;
/// Joule-to-electronvolt conversion.
pub const EV_PER_JOULE: f64 = 6.242e18;
/// Boltzmann constant, J/K.
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// One ordered-pair term of the dipole-dipole sum:
/// `mᵢ·mⱼ/r³ − 3(mᵢ·rᵢⱼ)(mⱼ·rᵢⱼ)/r⁵`.
#[inline]
fn pair_term(mi: &Vector3<f64>, mj: &Vector3<f64>, rij: &Vector3<f64>) -> f64 {
    let r2 = rij.norm_squared();
    let r = r2.sqrt();
    let r3 = r2 * r;
    let r5 = r3 * r2;
    mi.dot(mj) / r3 - 3.0 * mi.dot(rij) * mj.dot(rij) / r5
}

/// Raw double sum over all ordered pairs i ≠ j with the `μ0/8π` prefactor.
///
/// Every unordered pair is counted twice, which halves out against the
/// usual `μ0/4π` over unordered pairs; the two forms are equal.
fn double_sum(positions: &[Vector3<f64>], moments: &[Vector3<f64>]) -> f64 {
    let mut e = 0.0;
    for i in 0..positions.len() {
        for j in 0..positions.len() {
            if j != i {
                let rij = positions[j] - positions[i];
                e += pair_term(&moments[i], &moments[j], &rij);
            }
        }
    }
    e * MU_0 / (8.0 * PI)
}

/// Dipole `i`'s share of the double sum (both orderings of every pair that
/// touches it), in eV. The energy change of a single-site orientation move
/// is `site_energy(new) − site_energy(old)`.
///
/// `positions` must already be scaled to meters and `moments` to J/T.
pub fn site_energy(positions: &[Vector3<f64>], moments: &[Vector3<f64>], i: usize) -> f64 {
    let mut e = 0.0;
    for j in 0..positions.len() {
        if j != i {
            let rij = positions[j] - positions[i];
            e += 2.0 * pair_term(&moments[i], &moments[j], &rij);
        }
    }
    e * MU_0 / (8.0 * PI) * EV_PER_JOULE
}

/// Total interaction energy of a configuration in eV.
///
/// Positions are scaled by `10^dist_coef` to meters, moments by the Bohr
/// magneton. Fewer than two dipoles have no interaction and give exactly 0.
pub fn total_energy(dipoles: &[Dipole], dist_coef: f64) -> f64 {
    if dipoles.len() < 2 {
        return 0.0;
    }
    let unit = 10f64.powf(dist_coef);
    let positions: Vec<Vector3<f64>> = dipoles.iter().map(|d| d.position * unit).collect();
    let moments: Vec<Vector3<f64>> = dipoles
        .iter()
        .map(|d| d.orientation.direction() * (d.moment * BOHR_MAGNETON))
        .collect();
    double_sum(&positions, &moments) * EV_PER_JOULE
}

/// Scaled positions and moment vectors for incremental evaluation.
///
/// The annealer mutates one moment at a time and keeps the rest of the
/// buffers fixed.
pub fn scaled_state(dipoles: &[Dipole], dist_coef: f64) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>) {
    let unit = 10f64.powf(dist_coef);
    let positions = dipoles.iter().map(|d| d.position * unit).collect();
    let moments = dipoles
        .iter()
        .map(|d| d.orientation.direction() * (d.moment * BOHR_MAGNETON))
        .collect();
    (positions, moments)
}

/// Minimizer objective: the double sum for unit moments at unscaled
/// positions, parameterized by packed angles.
///
/// 3D packs `[φ₀, θ₀, φ₁, θ₁, …]`; with `lock_2d` one φ per dipole and
/// θ ≡ 90°. Scale factors (moment magnitudes, distance unit) shift the
/// objective by a constant factor only, so they are left out here and
/// applied in the reported energy.
pub fn angle_energy(angles: &[f64], positions: &[Vector3<f64>], lock_2d: bool) -> f64 {
    let moments: Vec<Vector3<f64>> = if lock_2d {
        angles
            .iter()
            .map(|&phi| {
                let (sin_phi, cos_phi) = phi.sin_cos();
                Vector3::new(cos_phi, sin_phi, 0.0)
            })
            .collect()
    } else {
        angles
            .chunks_exact(2)
            .map(|pair| {
                let (sin_phi, cos_phi) = pair[0].sin_cos();
                let (sin_theta, cos_theta) = pair[1].sin_cos();
                Vector3::new(cos_phi * sin_theta, sin_phi * sin_theta, cos_theta)
            })
            .collect()
    };
    double_sum(positions, &moments)
}

/// Number of packed angles for `n` dipoles in the given mode.
pub fn angle_count(n: usize, lock_2d: bool) -> usize {
    if lock_2d {
        n
    } else {
        2 * n
    }
}

/// Unpack a solver angle vector back into per-dipole orientations.
pub fn unpack_angles(angles: &[f64], lock_2d: bool) -> Vec<crate::spins::Orientation> {
    if lock_2d {
        angles
            .iter()
            .map(|&phi| crate::spins::Orientation::new(phi, FRAC_PI_2))
            .collect()
    } else {
        angles
            .chunks_exact(2)
            .map(|pair| crate::spins::Orientation::new(pair[0], pair[1]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spins::Orientation;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn head_to_tail_pair() -> Vec<Dipole> {
        // Two 1 µB dipoles 1 nm apart, both aligned with the separation axis.
        vec![
            Dipole::new(Vector3::zeros(), Orientation::in_plane(0.0), 1.0),
            Dipole::new(Vector3::new(1.0, 0.0, 0.0), Orientation::in_plane(0.0), 1.0),
        ]
    }

    #[test]
    fn test_empty_and_single_are_zero() {
        assert_eq!(total_energy(&[], -9.0), 0.0);
        let one = vec![Dipole::new(
            Vector3::zeros(),
            Orientation::new(1.0, 2.0),
            1.0,
        )];
        assert_eq!(total_energy(&one, -9.0), 0.0);
    }

    #[test]
    fn test_head_to_tail_matches_closed_form() {
        // E = -(μ0/4π) · 2 M² / r³ for aligned head-to-tail dipoles.
        let dipoles = head_to_tail_pair();
        let m = BOHR_MAGNETON;
        let r: f64 = 1e-9;
        let expected = -(MU_0 / (4.0 * PI)) * 2.0 * m * m / r.powi(3) * EV_PER_JOULE;
        assert_relative_eq!(total_energy(&dipoles, -9.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_swap_symmetry() {
        let mut dipoles = vec![
            Dipole::new(Vector3::new(0.3, -0.2, 0.9), Orientation::new(0.7, 1.9), 1.5),
            Dipole::new(Vector3::new(-1.1, 0.4, 0.0), Orientation::new(4.0, 0.6), 0.8),
        ];
        let e01 = total_energy(&dipoles, -9.0);
        dipoles.swap(0, 1);
        let e10 = total_energy(&dipoles, -9.0);
        assert_relative_eq!(e01, e10, epsilon = 1e-12);
    }

    #[test]
    fn test_site_energy_matches_total_difference() {
        let mut dipoles = vec![
            Dipole::new(Vector3::new(0.0, 0.0, 0.0), Orientation::new(0.2, 1.0), 1.0),
            Dipole::new(Vector3::new(1.0, 0.0, 0.0), Orientation::new(2.5, 2.0), 2.0),
            Dipole::new(Vector3::new(0.0, 1.5, 0.0), Orientation::new(4.4, 0.3), 1.0),
        ];
        let before = total_energy(&dipoles, -9.0);
        let (positions, mut moments) = scaled_state(&dipoles, -9.0);
        let site_before = site_energy(&positions, &moments, 1);

        let flipped = Orientation::new(1.0, 1.3);
        dipoles[1].orientation = flipped;
        moments[1] = flipped.direction() * (dipoles[1].moment * BOHR_MAGNETON);
        let after = total_energy(&dipoles, -9.0);
        let site_after = site_energy(&positions, &moments, 1);

        assert_relative_eq!(site_after - site_before, after - before, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_energy_agrees_with_unit_moment_total() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 1.0),
        ];
        let angles = [0.4, 1.2, 2.2, 0.9, 5.1, 2.6];
        let dipoles: Vec<Dipole> = positions
            .iter()
            .zip(angles.chunks_exact(2))
            .map(|(p, a)| Dipole::new(*p, Orientation::new(a[0], a[1]), 1.0))
            .collect();

        // Same sum, different normalization: angle_energy omits the Bohr
        // magneton and eV factors.
        let scale = BOHR_MAGNETON * BOHR_MAGNETON * EV_PER_JOULE;
        assert_relative_eq!(
            angle_energy(&angles, &positions, false) * scale,
            total_energy(&dipoles, 0.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_locked_angle_energy_pins_theta() {
        let positions = vec![Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0)];
        let phis = [0.3, 4.2];
        let packed: Vec<f64> = phis
            .iter()
            .flat_map(|&phi| [phi, std::f64::consts::FRAC_PI_2])
            .collect();
        assert_abs_diff_eq!(
            angle_energy(&phis, &positions, true),
            angle_energy(&packed, &positions, false),
            epsilon = 1e-15
        );
    }
}
