use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::AnnealConfig;
use crate::error::ComputeError;
use crate::spins::energy::{
    scaled_state, site_energy, total_energy, BOHR_MAGNETON, BOLTZMANN, EV_PER_JOULE,
};
use crate::spins::{Dipole, Orientation};

/// Metropolis acceptance at thermal energy `kt` (eV). Downhill moves always
/// pass; at `kt = 0` every uphill move is rejected (greedy descent).
#[inline]
fn accept(delta_e: f64, kt: f64, rng: &mut Xoshiro256StarStar) -> bool {
    if delta_e <= 0.0 {
        return true;
    }
    if kt <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < (-delta_e / kt).exp()
}

/// Run exactly `config.iterations` single-site Metropolis steps in place.
///
/// Each step picks a site uniformly, proposes a fresh random orientation
/// (in-plane when `lock_2d`), and accepts or restores by the Metropolis
/// rule. The energy change of a proposal is the touched site's share of the
/// pair sum; the returned energy is a full recomputation.
///
/// `interrupted` is polled every step; a cancelled run reports
/// [`ComputeError::Cancelled`] and leaves the slice in its last accepted
/// state.
pub fn metropolis_anneal(
    dipoles: &mut [Dipole],
    config: &AnnealConfig,
    rng: &mut Xoshiro256StarStar,
    interrupted: &AtomicBool,
) -> Result<f64, ComputeError> {
    if dipoles.len() < 2 {
        return Ok(0.0);
    }

    if !total_energy(dipoles, config.dist_coef).is_finite() {
        return Err(ComputeError::NonFiniteEnergy);
    }
    let (positions, mut moments) = scaled_state(dipoles, config.dist_coef);
    let kt = BOLTZMANN * config.temperature * EV_PER_JOULE;

    for _ in 0..config.iterations {
        if interrupted.load(Ordering::Relaxed) {
            return Err(ComputeError::Cancelled);
        }

        let i = rng.gen_range(0..dipoles.len());
        let previous = moments[i];
        let site_before = site_energy(&positions, &moments, i);

        let proposal = Orientation::random(rng, config.lock_2d);
        moments[i] = proposal.direction() * (dipoles[i].moment * BOHR_MAGNETON);
        let delta_e = site_energy(&positions, &moments, i) - site_before;

        if delta_e.is_nan() {
            return Err(ComputeError::NonFiniteEnergy);
        }
        if accept(delta_e, kt, rng) {
            dipoles[i].orientation = proposal;
        } else {
            moments[i] = previous;
        }
    }

    let energy = total_energy(dipoles, config.dist_coef);
    if !energy.is_finite() {
        return Err(ComputeError::NonFiniteEnergy);
    }
    Ok(energy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use rand::SeedableRng;

    fn square_of_dipoles() -> Vec<Dipole> {
        let mut rng = Xoshiro256StarStar::seed_from_u64(100);
        [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
            .iter()
            .map(|p| {
                Dipole::new(
                    Vector3::new(p[0], p[1], 0.0),
                    Orientation::random(&mut rng, false),
                    1.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_zero_temperature_rejects_uphill() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        for _ in 0..100 {
            assert!(!accept(1e-12, 0.0, &mut rng));
            assert!(accept(-1e-12, 0.0, &mut rng));
            assert!(accept(0.0, 0.0, &mut rng));
        }
    }

    #[test]
    fn test_acceptance_probability_shrinks_with_cost() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        let kt = 1.0;
        let count = |delta: f64, rng: &mut Xoshiro256StarStar| {
            (0..20_000).filter(|_| accept(delta, kt, rng)).count()
        };
        let cheap = count(0.1, &mut rng);
        let dear = count(3.0, &mut rng);
        assert!(cheap > dear);
        // exp(-3) ≈ 0.0498
        assert!((dear as f64 / 20_000.0 - 0.0498).abs() < 0.01);
    }

    #[test]
    fn test_zero_temperature_never_raises_energy() {
        let mut dipoles = square_of_dipoles();
        let config = AnnealConfig {
            iterations: 1,
            temperature: 0.0,
            ..AnnealConfig::default()
        };
        let interrupted = AtomicBool::new(false);
        let mut rng = Xoshiro256StarStar::seed_from_u64(9);
        // Stepwise: each single-iteration run must not increase the energy.
        let mut last = total_energy(&dipoles, config.dist_coef);
        for _ in 0..300 {
            let e = metropolis_anneal(&mut dipoles, &config, &mut rng, &interrupted).unwrap();
            assert!(e <= last + 1e-12, "energy rose from {last} to {e}");
            last = e;
        }
    }

    #[test]
    fn test_anneal_is_deterministic_for_a_seed() {
        let config = AnnealConfig {
            iterations: 2_000,
            ..AnnealConfig::default()
        };
        let interrupted = AtomicBool::new(false);

        let mut first = square_of_dipoles();
        let mut rng = Xoshiro256StarStar::seed_from_u64(77);
        let e1 = metropolis_anneal(&mut first, &config, &mut rng, &interrupted).unwrap();

        let mut second = square_of_dipoles();
        let mut rng = Xoshiro256StarStar::seed_from_u64(77);
        let e2 = metropolis_anneal(&mut second, &config, &mut rng, &interrupted).unwrap();

        assert_eq!(e1, e2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_small_configurations_are_zero() {
        let config = AnnealConfig::default();
        let interrupted = AtomicBool::new(false);
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);

        let mut empty: Vec<Dipole> = vec![];
        assert_eq!(
            metropolis_anneal(&mut empty, &config, &mut rng, &interrupted).unwrap(),
            0.0
        );

        let mut single = vec![Dipole::new(
            Vector3::zeros(),
            Orientation::in_plane(0.0),
            1.0,
        )];
        assert_eq!(
            metropolis_anneal(&mut single, &config, &mut rng, &interrupted).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_cancellation_stops_the_run() {
        let mut dipoles = square_of_dipoles();
        let config = AnnealConfig::default();
        let interrupted = AtomicBool::new(true);
        let mut rng = Xoshiro256StarStar::seed_from_u64(4);
        assert!(matches!(
            metropolis_anneal(&mut dipoles, &config, &mut rng, &interrupted),
            Err(ComputeError::Cancelled)
        ));
    }

    #[test]
    fn test_overlapping_positions_are_reported() {
        let mut dipoles = vec![
            Dipole::new(Vector3::zeros(), Orientation::in_plane(0.0), 1.0),
            Dipole::new(Vector3::zeros(), Orientation::in_plane(1.0), 1.0),
        ];
        let config = AnnealConfig::default();
        let interrupted = AtomicBool::new(false);
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        assert!(matches!(
            metropolis_anneal(&mut dipoles, &config, &mut rng, &interrupted),
            Err(ComputeError::NonFiniteEnergy)
        ));
    }
}
