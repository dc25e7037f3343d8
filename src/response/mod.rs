//! Construction of the densities that a linear-response (TDDFT) calculation needs in
//! its process sub-group: the ground-state density in the primary basis and its
//! projection into the auxiliary fitting basis of ADMM.
mod aux_fit;
mod ground_state;
pub(crate) mod logging;

pub use aux_fit::construct_aux_fit_density;
pub use ground_state::construct_ground_state_density;
