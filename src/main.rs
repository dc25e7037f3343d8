#![allow(dead_code)]

use crate::defaults::{DENSITY_AUX_FIT_FILE, DENSITY_ORB_FILE};
use crate::initialization::{ResponseDensities, ResponseSystem};
use crate::io::{read_input, write_footer, write_header, Configuration};
use crate::utils::Timer;
use anyhow::{Context, Result};
use clap::{App, Arg};
use env_logger::Builder;
use log::{error, info, LevelFilter};
use ndarray::prelude::*;
use ndarray_npy::write_npy;
use std::convert::TryFrom;
use std::io::Write;
use std::process;

mod defaults;
mod environment;
mod grid;
mod initialization;
mod io;
mod matrices;
mod response;
mod services;
mod utils;

#[macro_use]
extern crate clap;

fn main() {
    // Input.
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about("ground-state densities of linear-response calculations")
        .arg(
            Arg::new("mo-coefficients")
                .about("Sets the npy file with the occupied (alpha) MO coefficients")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("beta-coefficients")
                .about("Sets the npy file with the occupied beta MO coefficients")
                .index(2),
        )
        .get_matches();
    let alpha_file: &str = matches.value_of("mo-coefficients").unwrap();
    let beta_file: Option<&str> = matches.value_of("beta-coefficients");
    let (mos_occ, config): (Vec<Array2<f64>>, Configuration) = match read_input(alpha_file, beta_file) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("{:?}", err);
            process::exit(1);
        }
    };

    // Multithreading.
    // The members of the response sub-group are the threads of the global pool.
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.subgroup.group_size)
        .build_global()
    {
        eprintln!("{}", err);
    }

    // Logging.
    // The log level is set.
    let log_level: LevelFilter = match config.verbose {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    // and the logger is build.
    Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level)
        .init();

    // The program header is written to the command line.
    write_header();
    // and the total wall-time timer is started.
    let timer: Timer = Timer::start();

    // Computations.
    // ................................................................
    if let Err(err) = run(mos_occ, config) {
        error!("{:?}", err);
        process::exit(1);
    }
    // ................................................................

    write_footer(timer);
}

fn run(mos_occ: Vec<Array2<f64>>, config: Configuration) -> Result<()> {
    let mut system: ResponseSystem = ResponseSystem::try_from((mos_occ, config))?;
    let densities: ResponseDensities = system.run()?;

    let rho_orb: Array3<f64> = system.dense_densities(&densities.rho_orb)?;
    write_npy(DENSITY_ORB_FILE, &rho_orb)
        .with_context(|| format!("Unable to write {}", DENSITY_ORB_FILE))?;
    info!("{: <25} {}", "primary density:", DENSITY_ORB_FILE);

    if let Some(rho_aux_fit) = densities.rho_aux_fit.as_ref() {
        let rho_aux: Array3<f64> = system.dense_densities(rho_aux_fit)?;
        write_npy(DENSITY_AUX_FIT_FILE, &rho_aux)
            .with_context(|| format!("Unable to write {}", DENSITY_AUX_FIT_FILE))?;
        info!("{: <25} {}", "auxiliary density:", DENSITY_AUX_FIT_FILE);
    }
    Ok(())
}
