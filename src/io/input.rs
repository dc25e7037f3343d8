use crate::defaults::CONFIG_FILE_NAME;
use crate::io::Configuration;
use anyhow::{bail, Context, Result};
use ndarray::prelude::*;
use ndarray_npy::read_npy;
use std::fs;
use std::path::Path;

/// Occupied MO coefficients of both spin channels and the configuration.
///
/// The alpha coefficients are mandatory, a file with beta coefficients turns the
/// calculation into a two-spin one.
pub fn read_input(alpha_file: &str, beta_file: Option<&str>) -> Result<(Vec<Array2<f64>>, Configuration)> {
    let mut mos_occ: Vec<Array2<f64>> = vec![read_matrix(alpha_file)?];
    if let Some(beta_file) = beta_file {
        let beta: Array2<f64> = read_matrix(beta_file)?;
        if beta.nrows() != mos_occ[0].nrows() {
            bail!(
                "the beta coefficients have {} rows, but the alpha coefficients {}",
                beta.nrows(),
                mos_occ[0].nrows()
            );
        }
        mos_occ.push(beta);
    }

    // The configuration file is read, if it does not exist in the directory
    // the default settings are used and written to the directory.
    let config_file_path: &Path = Path::new(CONFIG_FILE_NAME);
    let config: Configuration = read_config(config_file_path)?;
    if !config_file_path.exists() {
        let config_string: String = toml::to_string(&config)?;
        fs::write(config_file_path, config_string)
            .with_context(|| format!("Unable to write config file {}", CONFIG_FILE_NAME))?;
    }
    Ok((mos_occ, config))
}

pub fn read_config(path: &Path) -> Result<Configuration> {
    let config_string: String = if path.exists() {
        fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?
    } else {
        String::new()
    };
    let config: Configuration = toml::from_str(&config_string)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn read_matrix(path: &str) -> Result<Array2<f64>> {
    read_npy(path).with_context(|| format!("Unable to read the matrix in {}", path))
}
