use validator::{Validate, ValidationError};

fn validate_anneal_config(cfg: &AnnealConfig) -> Result<(), ValidationError> {
    if cfg.iterations < 1 {
        return Err(ValidationError::new("iterations must be >= 1"));
    }
    if !cfg.temperature.is_finite() || cfg.temperature < 0.0 {
        return Err(ValidationError::new("temperature must be finite and >= 0"));
    }
    if cfg.chains < 1 {
        return Err(ValidationError::new("chains must be >= 1"));
    }
    if !cfg.dist_coef.is_finite() {
        return Err(ValidationError::new("dist_coef must be finite"));
    }
    Ok(())
}

/// Parameters for one Metropolis annealing run.
///
/// Defaults: 10 000 iterations at 4 K with positions interpreted as
/// nanometers (`dist_coef = -9`).
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_anneal_config"))]
pub struct AnnealConfig {
    /// Number of Metropolis steps (attempted moves).
    pub iterations: usize,
    /// Bath temperature in kelvin. Zero reduces acceptance to greedy descent.
    pub temperature: f64,
    /// Power-of-ten scale applied to stored positions before energy
    /// evaluation (-9 reads positions as nanometers).
    pub dist_coef: f64,
    /// Confine proposed moments to the xy-plane (theta fixed at 90°).
    pub lock_2d: bool,
    /// Number of independent chains; the lowest-energy chain wins.
    pub chains: usize,
    /// Base RNG seed. Chain `k` uses `seed + k`.
    pub seed: u64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            temperature: 4.0,
            dist_coef: -9.0,
            lock_2d: false,
            chains: 1,
            seed: 0,
        }
    }
}

fn validate_minimize_config(cfg: &MinimizeConfig) -> Result<(), ValidationError> {
    if cfg.max_iters < 1 {
        return Err(ValidationError::new("max_iters must be >= 1"));
    }
    if !cfg.dist_coef.is_finite() {
        return Err(ValidationError::new("dist_coef must be finite"));
    }
    Ok(())
}

/// Parameters for one conjugate-gradient minimization run.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_minimize_config"))]
pub struct MinimizeConfig {
    /// Iteration cap for the conjugate-gradient solver.
    pub max_iters: u64,
    /// Power-of-ten scale applied to stored positions in the reported energy.
    pub dist_coef: f64,
    /// Optimize one in-plane angle per dipole instead of two.
    pub lock_2d: bool,
    /// Seed for the randomized initial orientation guess.
    pub seed: u64,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self {
            max_iters: 10_000,
            dist_coef: -9.0,
            lock_2d: false,
            seed: 0,
        }
    }
}
