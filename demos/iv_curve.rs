//! Sweep a two-site, two-solute channel and print its current-voltage curve.
//!
//! ```sh
//! cargo run --example iv_curve
//! ```

use anyhow::Result;
use channelsol::prelude::*;

fn main() -> Result<()> {
    let model = ModelSpec::new(2, vec!["Na", "Ca"], vec![1, 2]).compile()?;
    let conditions = Conditions::new(
        Concentrations::new()
            .with_solute("Na", 0.12, 0.12)
            .with_solute("Ca", 0.002, 0.002),
        EnergyProfile::new(vec![0.167, 0.333, 0.5, 0.667, 0.8333])
            .with_solute("Na", vec![8.0, -4.0, 20.0, -4.0, 8.0])
            .with_solute("Ca", vec![9.0, -12.0, 20.0, -12.0, 9.0]),
    );
    let voltages: Vec<f64> = (-15..=10).map(|i| i as f64 * 10.0).collect();

    let sweep = VoltageSweep::new(&model, &conditions, voltages)?;
    let results = sweep.run();

    println!("{} states, {} voltage points", model.num_states(), results.len());
    println!("{:>8}  {:>14}  {:>14}  {:>10}", "V (mV)", "I (pA)", "I_Na (ions/s)", "residual");
    for record in &results.eigen {
        println!(
            "{:>8.1}  {:>14.6e}  {:>14.6e}  {:>10.2e}",
            record.voltage,
            record.current[0],
            record.transport["Na"][0],
            record.solver.residual_abs_sum,
        );
    }

    let substituted = results
        .svd
        .iter()
        .filter(|r| matches!(r.status, MethodStatus::Substituted { .. }))
        .count();
    if substituted > 0 {
        println!("svd failed to converge at {substituted} voltage point(s)");
    }
    Ok(())
}
