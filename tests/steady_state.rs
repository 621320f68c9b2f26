use approx::assert_relative_eq;
use channelsol::prelude::*;

const NORMALIZATION_TOL: f64 = 1e-9;

#[test]
fn symmetric_single_site_carries_no_current_at_zero_voltage() {
    let (model, conditions) = single_site(0.145, 0.145);
    let results = VoltageSweep::new(&model, &conditions, vec![0.0])
        .unwrap()
        .run();

    for record in [&results.eigen[0], &results.svd[0], &results.qr[0]] {
        assert_eq!(record.status, MethodStatus::Converged);
        let sum: f64 = record.steady_state.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = NORMALIZATION_TOL);

        // equal baths, symmetric profile, no applied field: detailed balance
        // holds exactly, so every barrier carries zero net flux and current
        for flux in &record.transport["Na"] {
            assert!(flux.abs() < 1e-3, "flux {flux} should vanish");
        }
        for current in &record.current {
            assert!(current.abs() < 1e-8, "current {current} pA should vanish");
        }

        // occupancy follows the detailed-balance ratio Ce*exp(10)
        let ratio = record.steady_state[1] / record.steady_state[0];
        assert_relative_eq!(ratio, 0.145 * 10.0_f64.exp(), max_relative = 1e-8);

        assert!(record.solver.residual_abs_sum < 1e-6);
    }
}

#[test]
fn zero_extracellular_bath_gives_conserved_outward_flux() {
    let (model, conditions) = single_site(0.145, 0.0);
    let results = VoltageSweep::new(&model, &conditions, vec![0.0])
        .unwrap()
        .run();
    let record = &results.eigen[0];

    let flux = &record.transport["Na"];
    assert_eq!(flux.len(), 2);
    // influx is impossible, so net transport points outward at every barrier
    assert!(flux[0] < 0.0);
    assert!(flux[1] < 0.0);
    // and is conserved along the pore
    let scale = flux[0].abs().max(1.0);
    assert!((flux[0] - flux[1]).abs() < 1e-8 * scale);

    // occupancy ratio from the intracellular bath alone
    let ratio = record.steady_state[1] / record.steady_state[0];
    assert_relative_eq!(ratio, 0.0725 * 10.0_f64.exp(), max_relative = 1e-8);
}

#[test]
fn methods_agree_elementwise_on_a_well_conditioned_model() {
    let (model, conditions) = two_site();
    let results = VoltageSweep::new(&model, &conditions, vec![-60.0])
        .unwrap()
        .run();

    let eigen = &results.eigen[0];
    let svd = &results.svd[0];
    let qr = &results.qr[0];
    assert_eq!(svd.status, MethodStatus::Converged);

    for i in 0..eigen.steady_state.len() {
        assert_relative_eq!(eigen.steady_state[i], svd.steady_state[i], epsilon = 1e-8);
        assert_relative_eq!(eigen.steady_state[i], qr.steady_state[i], epsilon = 1e-8);
    }
    for b in 0..eigen.current.len() {
        let scale = eigen.current[b].abs().max(1e-3);
        assert!((eigen.current[b] - svd.current[b]).abs() < 1e-6 * scale);
        assert!((eigen.current[b] - qr.current[b]).abs() < 1e-6 * scale);
    }
}

#[test]
fn transport_is_conserved_across_all_barriers() {
    let (model, conditions) = two_site();
    let results = VoltageSweep::new(&model, &conditions, vec![-60.0, 40.0])
        .unwrap()
        .run();

    for record in &results.eigen {
        for solute in ["Na", "Ca"] {
            let flux = &record.transport[solute];
            assert_eq!(flux.len(), 3);
            let scale = flux
                .iter()
                .fold(0.0_f64, |m, f| m.max(f.abs()))
                .max(1.0);
            assert!(
                record.transport_errors[solute] < 1e-6 * scale,
                "{solute} flux spread {} at {} mV",
                record.transport_errors[solute],
                record.voltage
            );
        }
    }
}

#[test]
fn sweep_rejects_invalid_conditions_up_front() {
    let (model, mut conditions) = two_site();
    conditions.q_values = vec![2.0];
    assert!(matches!(
        VoltageSweep::new(&model, &conditions, vec![0.0]),
        Err(ChannelsolError::CoefficientCount { .. })
    ));
}

fn single_site(intra: f64, extra: f64) -> (CompiledModel, Conditions) {
    let model = ModelSpec::new(1, vec!["Na"], vec![1]).compile().unwrap();
    let conditions = Conditions::new(
        Concentrations::new().with_solute("Na", intra, extra),
        EnergyProfile::new(vec![0.25, 0.5, 0.75]).with_solute("Na", vec![8.0, -10.0, 8.0]),
    );
    (model, conditions)
}

fn two_site() -> (CompiledModel, Conditions) {
    let model = ModelSpec::new(2, vec!["Na", "Ca"], vec![1, 2])
        .compile()
        .unwrap();
    let conditions = Conditions::new(
        Concentrations::new()
            .with_solute("Na", 0.12, 0.12)
            .with_solute("Ca", 0.002, 0.002),
        EnergyProfile::new(vec![0.167, 0.333, 0.5, 0.667, 0.8333])
            .with_solute("Na", vec![8.0, -4.0, 20.0, -4.0, 8.0])
            .with_solute("Ca", vec![9.0, -12.0, 20.0, -12.0, 9.0]),
    );
    (model, conditions)
}
