use crate::environment::{BasisTreatment, DensityContainer, WavefunctionKind};
use crate::utils::Timer;
use log::{debug, info};

pub fn print_density_init(
    title: &str,
    n_spins: usize,
    treatment: BasisTreatment,
    wavefunction: WavefunctionKind,
    group: &str,
) {
    info!("{:^80}", "");
    info!("{: ^80}", title);
    info!("{:-^80}", "");
    info!("{: <25} {}", "spin channels:", n_spins);
    info!("{: <25} {:?}", "basis treatment:", treatment);
    info!("{: <25} {:?}", "wavefunction:", wavefunction);
    info!("{: <25} {}", "process group:", group);
}

pub fn print_spin_charge(ispin: usize, task_list: &str, charge: f64) {
    debug!(
        "spin {: >2} {: <24} integrated charge: {:>18.12}",
        ispin + 1,
        task_list,
        charge
    );
}

pub fn print_density_end(density: &DensityContainer, timer: Timer) {
    info!("{:-^80}", "");
    for (ispin, charge) in density.tot_rho_r.iter().enumerate() {
        info!("{: <10} {: >2} {:>18.12}", "charge spin", ispin + 1, charge);
    }
    info!("{: <13} {:>18.12}", "total charge", density.total_charge());
    info!("{}", timer);
}
