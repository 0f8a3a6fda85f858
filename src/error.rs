use thiserror::Error;

/// Cell validation failures. Raised synchronously by [`Cell::resolve`]
/// before any projection happens, so no NaN ever reaches the enumerator.
///
/// [`Cell::resolve`]: crate::geometry::Cell::resolve
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// gamma at 0 or 180 degrees makes the oblique projection singular.
    #[error("degenerate cell: gamma = {0}° has sin(gamma) = 0")]
    DegenerateGamma(f64),

    /// The angle triple leaves the c axis with no out-of-plane component.
    #[error(
        "degenerate cell: angles alpha = {alpha}°, beta = {beta}°, gamma = {gamma}° \
         leave no out-of-plane component for the c axis"
    )]
    DegenerateHeight { alpha: f64, beta: f64, gamma: f64 },

    /// Edge lengths must be strictly positive after resolution.
    #[error("cell edge {name} must be positive, got {value}")]
    NonPositiveEdge { name: &'static str, value: f64 },

    /// Custom systems carry no defaults; every parameter must be supplied.
    #[error("custom {0} cells require an explicit value for {1}")]
    MissingParameter(&'static str, &'static str),

    /// A minimum pairwise distance needs at least two basis points.
    #[error("cell basis needs at least two points to define a spacing")]
    BasisTooSmall,
}

/// Failures of the minimizer/annealer compute paths. `Config` and `Busy` are
/// reported synchronously when a run is submitted; everything else travels
/// through the worker's result channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Non-finite energy, typically from two dipoles at the same position.
    #[error("energy evaluation produced a non-finite value")]
    NonFiniteEnergy,

    #[error("run cancelled before completion")]
    Cancelled,

    #[error("minimizer failed: {0}")]
    Solver(String),

    /// A run of this kind is already in flight on the scheduler.
    #[error("a {0} run is already in flight")]
    Busy(&'static str),

    /// The worker exited without reporting a result.
    #[error("worker disconnected without a result")]
    Disconnected,
}

/// Per-file CSV import/export failures. Batch import keeps going when one
/// file fails; see [`import_files`](crate::io::import_files).
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse dipole row (at line {line}): {details}")]
    Parse { line: usize, details: String },
}

impl CsvError {
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}
