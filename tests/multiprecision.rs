use approx::assert_relative_eq;
use channelsol::prelude::*;

#[test]
fn backends_agree_on_a_single_site_model() {
    let (double, conditions) = single_site(NumericBackend::Double);
    let (multi, _) = single_site(NumericBackend::MultiPrecision);

    let voltages = vec![-100.0, 0.0, 60.0];
    let d = VoltageSweep::new(&double, &conditions, voltages.clone())
        .unwrap()
        .run();
    let m = VoltageSweep::new(&multi, &conditions, voltages)
        .unwrap()
        .run();

    for (a, b) in d.eigen.iter().zip(&m.eigen) {
        for (x, y) in a.steady_state.iter().zip(&b.steady_state) {
            assert_relative_eq!(x, y, epsilon = 1e-10);
        }
        for (x, y) in a.current.iter().zip(&b.current) {
            let scale = x.abs().max(1e-3);
            assert!((x - y).abs() < 1e-6 * scale, "current {x} vs {y}");
        }
    }
    for (a, b) in d.qr.iter().zip(&m.qr) {
        for (x, y) in a.steady_state.iter().zip(&b.steady_state) {
            assert_relative_eq!(x, y, epsilon = 1e-10);
        }
    }
}

#[test]
fn multiprecision_svd_and_qr_agree_on_a_two_site_model() {
    let model = ModelSpec::new(2, vec!["Na", "Ca"], vec![1, 2])
        .with_backend(NumericBackend::MultiPrecision)
        .with_precision_digits(40)
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
    let results = VoltageSweep::new(&model, &conditions, vec![-60.0])
        .unwrap()
        .run();

    let svd = &results.svd[0];
    let qr = &results.qr[0];
    assert_eq!(svd.status, MethodStatus::Converged);
    for (x, y) in svd.steady_state.iter().zip(&qr.steady_state) {
        assert_relative_eq!(x, y, epsilon = 1e-12);
    }
    let sum: f64 = svd.steady_state.iter().sum();
    assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
    // at 40 digits the null vector is resolved far below double roundoff
    assert!(svd.solver.residual_abs_sum < 1e-3 * svd.matrix.largest_element);
}

#[test]
fn extreme_profiles_remain_solvable_at_high_precision() {
    // a deep well behind a tall barrier spreads the rate constants over
    // ~16 orders of magnitude and pins nearly all probability on the
    // occupied state; the distribution must still come out exact
    let model = ModelSpec::new(1, vec!["Na"], vec![1])
        .with_backend(NumericBackend::MultiPrecision)
        .with_precision_digits(60)
        .compile()
        .unwrap();
    let conditions = Conditions::new(
        Concentrations::new().with_solute("Na", 0.145, 0.145),
        EnergyProfile::new(vec![0.25, 0.5, 0.75]).with_solute("Na", vec![18.0, -18.0, 18.0]),
    );
    let results = VoltageSweep::new(&model, &conditions, vec![0.0])
        .unwrap()
        .run();
    let record = &results.qr[0];

    let sum: f64 = record.steady_state.iter().sum();
    assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
    // detailed balance ratio Ce * exp(-G_well)
    let ratio = record.steady_state[1] / record.steady_state[0];
    assert_relative_eq!(ratio, 0.145 * 18.0_f64.exp(), max_relative = 1e-6);
    for current in &record.current {
        assert!(current.abs() < 1e-6);
    }
}

fn single_site(backend: NumericBackend) -> (CompiledModel, Conditions) {
    let model = ModelSpec::new(1, vec!["Na"], vec![1])
        .with_backend(backend)
        .with_precision_digits(40)
        .compile()
        .unwrap();
    let conditions = Conditions::new(
        Concentrations::new().with_solute("Na", 0.145, 0.145),
        EnergyProfile::new(vec![0.25, 0.5, 0.75]).with_solute("Na", vec![8.0, -10.0, 8.0]),
    );
    (model, conditions)
}
