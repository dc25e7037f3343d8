use crate::defaults::*;
use crate::environment::{BasisTreatment, WavefunctionKind};
use crate::matrices::NeighborList;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

fn default_verbose() -> i8 {
    0
}
fn default_basis_treatment() -> BasisTreatment {
    toml::Value::String(String::from(BASIS_TREATMENT))
        .try_into()
        .unwrap_or(BasisTreatment::Standard)
}
fn default_triplet() -> bool {
    TRIPLET
}
fn default_wavefunction() -> WavefunctionKind {
    WavefunctionKind::Real
}
fn default_group_size() -> usize {
    GROUP_SIZE
}
fn default_block_sizes() -> Vec<usize> {
    Vec::new()
}
fn default_neighbor_pairs() -> Vec<[usize; 2]> {
    Vec::new()
}
fn default_soft_fraction() -> f64 {
    SOFT_FRACTION
}
fn default_primary_collocation() -> String {
    String::from("phi_orb.npy")
}
fn default_aux_collocation() -> String {
    String::from("phi_aux_fit.npy")
}
fn default_dvol() -> f64 {
    GRID_DVOL
}
fn default_n_recip() -> usize {
    0
}
fn default_use_admm() -> bool {
    USE_ADMM
}
fn default_projection() -> String {
    String::from("admm_a.npy")
}
fn default_response_config() -> ResponseConfig {
    let config: ResponseConfig = toml::from_str("").unwrap();
    config
}
fn default_subgroup_config() -> SubgroupConfig {
    let config: SubgroupConfig = toml::from_str("").unwrap();
    config
}
fn default_system_config() -> SystemConfig {
    let config: SystemConfig = toml::from_str("").unwrap();
    config
}
fn default_grid_config() -> GridConfig {
    let config: GridConfig = toml::from_str("").unwrap();
    config
}
fn default_admm_config() -> AdmmConfig {
    let config: AdmmConfig = toml::from_str("").unwrap();
    config
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    #[serde(default = "default_verbose")]
    pub verbose: i8,
    #[serde(default = "default_response_config")]
    pub response: ResponseConfig,
    #[serde(default = "default_subgroup_config")]
    pub subgroup: SubgroupConfig,
    #[serde(default = "default_system_config")]
    pub system: SystemConfig,
    #[serde(default = "default_grid_config")]
    pub grid: GridConfig,
    #[serde(default = "default_admm_config")]
    pub admm: AdmmConfig,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ResponseConfig {
    #[serde(default = "default_basis_treatment")]
    pub basis_treatment: BasisTreatment,
    #[serde(default = "default_triplet")]
    pub triplet: bool,
    #[serde(default = "default_wavefunction")]
    pub wavefunction: WavefunctionKind,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct SubgroupConfig {
    #[serde(default = "default_group_size")]
    pub group_size: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SystemConfig {
    /// Number of primary basis functions of every atom. An empty list puts all functions
    /// on a single center.
    #[serde(default = "default_block_sizes")]
    pub primary_block_sizes: Vec<usize>,
    #[serde(default = "default_block_sizes")]
    pub aux_block_sizes: Vec<usize>,
    /// Atom pairs within the interaction cutoff. An empty list couples all atoms.
    #[serde(default = "default_neighbor_pairs")]
    pub neighbor_pairs: Vec<[usize; 2]>,
    #[serde(default = "default_soft_fraction")]
    pub soft_fraction: f64,
}

impl SystemConfig {
    /// Block sizes for `n_functions` basis functions.
    pub fn block_sizes(sizes: &[usize], n_functions: usize) -> Result<Vec<usize>> {
        if sizes.is_empty() {
            return Ok(vec![n_functions]);
        }
        let total: usize = sizes.iter().sum();
        if total != n_functions {
            bail!(
                "the block sizes add up to {} basis functions, but {} were expected",
                total,
                n_functions
            );
        }
        Ok(sizes.to_vec())
    }

    pub fn neighbor_list(&self, n_atoms: usize) -> Result<NeighborList> {
        if self.neighbor_pairs.is_empty() {
            return Ok(NeighborList::full(n_atoms));
        }
        if let Some(pair) = self
            .neighbor_pairs
            .iter()
            .find(|pair| pair[0] >= n_atoms || pair[1] >= n_atoms)
        {
            bail!("neighbor pair {:?} refers to an atom outside of 0..{}", pair, n_atoms);
        }
        let pairs: Vec<(usize, usize)> = self
            .neighbor_pairs
            .iter()
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Ok(NeighborList::from_pairs(n_atoms, &pairs))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GridConfig {
    /// npy file with the values of the primary basis functions (n_points x n_ao)
    #[serde(default = "default_primary_collocation")]
    pub primary_collocation: String,
    /// npy file with the values of the auxiliary basis functions (n_points x n_aux)
    #[serde(default = "default_aux_collocation")]
    pub aux_collocation: String,
    #[serde(default = "default_dvol")]
    pub dvol: f64,
    /// Number of reciprocal-space components, zero means one per grid point.
    #[serde(default = "default_n_recip")]
    pub n_recip: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdmmConfig {
    #[serde(default = "default_use_admm")]
    pub use_admm: bool,
    /// npy file with the projection operator (n_aux x n_ao)
    #[serde(default = "default_projection")]
    pub projection: String,
}
