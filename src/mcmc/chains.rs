use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use std::sync::atomic::AtomicBool;

use crate::config::AnnealConfig;
use crate::error::ComputeError;
use crate::mcmc::metropolis_anneal;
use crate::spins::Dipole;

/// Run `config.chains` independent Metropolis chains and keep the
/// lowest-energy result.
///
/// Every chain owns a private copy of the input and a private RNG seeded
/// `config.seed + k`; chains share nothing but the interruption flag and
/// are combined by a single min-energy reduction at the end. A single
/// chain runs on the current thread without touching the rayon pool.
pub fn anneal_ensemble(
    dipoles: &[Dipole],
    config: &AnnealConfig,
    interrupted: &AtomicBool,
) -> Result<(Vec<Dipole>, f64), ComputeError> {
    let run_chain = |k: usize| {
        let mut chain = dipoles.to_vec();
        let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed + k as u64);
        metropolis_anneal(&mut chain, config, &mut rng, interrupted).map(|energy| (chain, energy))
    };

    if config.chains <= 1 {
        return run_chain(0);
    }

    let results: Vec<Result<(Vec<Dipole>, f64), ComputeError>> =
        (0..config.chains).into_par_iter().map(run_chain).collect();
    let runs: Vec<(Vec<Dipole>, f64)> = results.into_iter().collect::<Result<_, _>>()?;

    Ok(runs
        .into_iter()
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .expect("at least one chain"))
}
