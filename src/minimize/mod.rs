use argmin::core::{CostFunction, Error as SolverError, Executor, Gradient, State};
use argmin::solver::conjugategradient::beta::PolakRibiere;
use argmin::solver::conjugategradient::NonlinearConjugateGradient;
use argmin::solver::linesearch::MoreThuenteLineSearch;
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::MinimizeConfig;
use crate::error::ComputeError;
use crate::spins::energy::{angle_count, angle_energy, total_energy, unpack_angles};
use crate::spins::{Dipole, Orientation};

/// Forward-difference step, sqrt(machine epsilon).
const GRAD_STEP: f64 = 1.490_116_119_384_765_6e-8;

type BestPoint = Arc<Mutex<Option<(Vec<f64>, f64)>>>;

/// The angle-parameterized pair-interaction sum as an argmin problem.
///
/// Moments are unit vectors and positions unscaled here; magnitudes and the
/// distance unit only rescale the objective, so they are applied to the
/// reported energy instead. Every evaluation polls the interruption flag
/// and records the best point seen so far.
struct OrientationObjective<'a> {
    positions: Vec<Vector3<f64>>,
    lock_2d: bool,
    interrupted: &'a AtomicBool,
    best: BestPoint,
}

impl OrientationObjective<'_> {
    fn record(&self, angles: &[f64], energy: f64) {
        let mut best = self.best.lock().unwrap();
        if best.as_ref().map_or(true, |(_, e)| energy < *e) {
            *best = Some((angles.to_vec(), energy));
        }
    }
}

impl CostFunction for OrientationObjective<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, angles: &Self::Param) -> Result<Self::Output, SolverError> {
        if self.interrupted.load(Ordering::Relaxed) {
            return Err(ComputeError::Cancelled.into());
        }
        let energy = angle_energy(angles, &self.positions, self.lock_2d);
        if !energy.is_finite() {
            return Err(ComputeError::NonFiniteEnergy.into());
        }
        self.record(angles, energy);
        Ok(energy)
    }
}

impl Gradient for OrientationObjective<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, angles: &Self::Param) -> Result<Self::Gradient, SolverError> {
        let base = self.cost(angles)?;
        let mut shifted = angles.clone();
        let mut grad = vec![0.0; angles.len()];
        for (i, g) in grad.iter_mut().enumerate() {
            shifted[i] = angles[i] + GRAD_STEP;
            *g = (self.cost(&shifted)? - base) / GRAD_STEP;
            shifted[i] = angles[i];
        }
        Ok(grad)
    }
}

/// Random starting angles: φ ~ U[0, 2π) per dipole, θ pinned to 90° (3D
/// runs are seeded in-plane too; the solver is free to tilt out of it).
fn initial_angles(n: usize, lock_2d: bool, rng: &mut Xoshiro256StarStar) -> Vec<f64> {
    let mut angles = Vec::with_capacity(angle_count(n, lock_2d));
    for _ in 0..n {
        angles.push(rng.gen::<f64>() * TAU);
        if !lock_2d {
            angles.push(FRAC_PI_2);
        }
    }
    angles
}

/// Find a low-energy orientation assignment by nonlinear conjugate gradient
/// (Polak–Ribière, More–Thuente line search, numerical gradients), capped at
/// `config.max_iters` iterations from one random start.
///
/// Orientations are overwritten with the best angle vector; the returned
/// energy is [`total_energy`] of the result, with actual moment magnitudes
/// and `dist_coef` applied.
pub fn minimize_orientations(
    dipoles: &mut [Dipole],
    config: &MinimizeConfig,
    interrupted: &AtomicBool,
) -> Result<f64, ComputeError> {
    let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);
    if dipoles.len() < 2 {
        for d in dipoles.iter_mut() {
            d.orientation = Orientation::random(&mut rng, config.lock_2d);
        }
        return Ok(0.0);
    }

    let init = initial_angles(dipoles.len(), config.lock_2d, &mut rng);
    let best: BestPoint = Arc::new(Mutex::new(None));
    let objective = OrientationObjective {
        positions: dipoles.iter().map(|d| d.position).collect(),
        lock_2d: config.lock_2d,
        interrupted,
        best: Arc::clone(&best),
    };

    let linesearch = MoreThuenteLineSearch::new();
    let solver = NonlinearConjugateGradient::new(linesearch, PolakRibiere::new());
    let outcome = Executor::new(objective, solver)
        .configure(|state| state.param(init).max_iters(config.max_iters))
        .run();

    let angles = match outcome {
        Ok(result) => match result.state().get_best_param() {
            Some(param) => param.clone(),
            None => take_best(&best)?,
        },
        Err(err) => {
            if let Some(compute) = err.downcast_ref::<ComputeError>() {
                return Err(compute.clone());
            }
            // A failed line search at a stationary point still leaves the
            // best evaluated point.
            take_best(&best).map_err(|_| ComputeError::Solver(err.to_string()))?
        }
    };

    for (dipole, orientation) in dipoles
        .iter_mut()
        .zip(unpack_angles(&angles, config.lock_2d))
    {
        dipole.orientation = orientation;
    }

    let energy = total_energy(dipoles, config.dist_coef);
    if !energy.is_finite() {
        return Err(ComputeError::NonFiniteEnergy);
    }
    Ok(energy)
}

fn take_best(best: &BestPoint) -> Result<Vec<f64>, ComputeError> {
    best.lock()
        .unwrap()
        .take()
        .map(|(angles, _)| angles)
        .ok_or(ComputeError::Disconnected)
}
