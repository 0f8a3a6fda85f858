pub mod cell;
pub mod lattice;
pub mod random;

pub use cell::{Cell, CellSpec, Centering, CrystalSystem, LockedParams, System2D, System3D};
pub use lattice::{generate_from_spec, generate_lattice};
pub use random::{random_dipoles, RandomRegion};
