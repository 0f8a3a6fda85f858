pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mcmc;
pub mod minimize;
pub mod simulation;
pub mod spins;

pub use config::{AnnealConfig, MinimizeConfig};
pub use error::{ComputeError, CsvError, GeometryError};
pub use geometry::{
    generate_from_spec, generate_lattice, random_dipoles, Cell, CellSpec, Centering,
    CrystalSystem, RandomRegion, System2D, System3D,
};
pub use simulation::{
    spawn_anneal, spawn_minimize, CancelToken, JobHandle, JobOutput, Scheduler,
};
pub use spins::energy::total_energy;
pub use spins::{Dipole, Orientation};
