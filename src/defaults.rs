// CONFIGURATION
// config file, written with the defaults if it does not exist
pub const CONFIG_FILE_NAME: &str = "lrdens.toml";
// output files of the driver
pub const DENSITY_ORB_FILE: &str = "density_orb.npy";
pub const DENSITY_AUX_FIT_FILE: &str = "density_aux_fit.npy";

// RESPONSE CALCULATION
// basis treatment: "standard", "gapw" or "gapw_xc"
pub const BASIS_TREATMENT: &str = "standard";
pub const TRIPLET: bool = false;

// SUB-GROUP
// number of cooperating workers that share the dense matrix algebra
pub const GROUP_SIZE: usize = 1;

// GRID
// quadrature weight of a single grid point in bohr^3
pub const GRID_DVOL: f64 = 1.0;
// fraction of the on-site density that is kept in the soft (grid) part
pub const SOFT_FRACTION: f64 = 0.5;

// SPARSITY
// blocks of a dense matrix with a max. norm below this value are not
// added to the pattern of a block-sparse matrix
pub const BLOCK_DROP_THRESHOLD: f64 = 1.0e-12;

// ADMM
pub const USE_ADMM: bool = false;
