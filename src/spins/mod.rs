pub mod dipole;
pub mod energy;

pub use dipole::{Dipole, Orientation};
