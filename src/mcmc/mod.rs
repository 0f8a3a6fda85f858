pub mod anneal;
pub mod chains;

pub use anneal::metropolis_anneal;
pub use chains::anneal_ensemble;
