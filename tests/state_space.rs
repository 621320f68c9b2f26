use channelsol::prelude::*;

#[test]
fn state_count_is_full_cartesian_space() {
    for sites in 1..=4 {
        for ions in 1..=3 {
            if (ions + 1_usize).pow(sites as u32) > 1000 {
                continue;
            }
            let solutes: Vec<String> = (0..ions).map(|i| format!("solute_{}", i + 1)).collect();
            let charges = vec![1; ions];
            let model = ModelSpec::new(sites, solutes, charges).compile().unwrap();
            assert_eq!(
                model.num_states(),
                (ions + 1).pow(sites as u32),
                "sites={sites} ions={ions}"
            );
        }
    }
}

#[test]
fn discovery_order_matches_reference_enumeration() {
    // three sites, two solutes: the canonical 27-state ordering produced by
    // breadth-first exploration with entries first, hops left to right, then
    // exit
    let model = ModelSpec::new(3, vec!["solute_1", "solute_2"], vec![0, 0])
        .compile()
        .unwrap();
    let expected = [
        "000", "100", "200", "010", "020", "110", "210", "001", "120", "220", "002", "101",
        "201", "102", "202", "011", "021", "012", "022", "111", "211", "121", "221", "112",
        "212", "122", "222",
    ];
    assert_eq!(model.num_states(), expected.len());
    for (state, want) in model.states().iter().zip(expected) {
        let got: String = (0..state.num_sites())
            .map(|i| match state.site(i) {
                Some(ion) => char::from_digit(ion as u32 + 1, 10).unwrap(),
                None => '0',
            })
            .collect();
        assert_eq!(got, want);
    }
}

#[test]
fn generator_columns_sum_to_zero() {
    let (model, conditions) = two_site_model(InteractionMode::None, vec![]);
    for voltage in [-120.0, 0.0, 80.0] {
        let matrix = model.transition_matrix(&conditions, voltage).unwrap();
        let scale = matrix.iter().fold(0.0_f64, |m, e| m.max(e.abs()));
        for j in 0..matrix.ncols() {
            let sum: f64 = matrix.column(j).iter().sum();
            assert!(
                sum.abs() <= scale * 1e-12,
                "column {j} sums to {sum} at {voltage} mV"
            );
        }
    }
}

#[test]
fn rate_listing_reproduces_reference_assignments() {
    // the zero-charge three-site instance matches the reference model's
    // generated assignments literally
    let model = ModelSpec::new(3, vec!["solute_1", "solute_2"], vec![0, 0])
        .compile()
        .unwrap();
    let listing = model.rate_listing();
    for line in [
        "k_0_1_solute_1 = solute_1e*k0*exp(-Gsolute_11)*exp(0*q*-d1*V)",
        "k_1_0_solute_1 = k0*exp(Gsolute_12-Gsolute_11)*exp(0*q*(d2-d1)*V)",
        "k_1_2_solute_2 = k0*exp(Gsolute_22-Gsolute_23)*exp(0*q*(d2-d3)*V)",
        "k_2_1_solute_1 = k0*exp(Gsolute_14-Gsolute_13)*exp(0*q*(d4-d3)*V)",
        "k_3_4_solute_2 = k0*exp(Gsolute_26-Gsolute_27)*exp(0*q*(d6-d7)*V)",
        "k_4_3_solute_1 = solute_1i*k0*exp(-Gsolute_17)*exp(0*q*(1-d7)*V)",
    ] {
        assert!(listing.contains(line), "missing assignment: {line}");
    }
}

#[test]
fn neutral_interaction_coefficients_leave_the_matrix_bit_identical() {
    let (plain, plain_cond) = two_site_model(InteractionMode::None, vec![]);
    let (single, single_cond) = two_site_model(InteractionMode::SingleQ, vec![1.0]);
    for voltage in [-90.0, 0.0, 45.0] {
        let a = plain.transition_matrix(&plain_cond, voltage).unwrap();
        let b = single.transition_matrix(&single_cond, voltage).unwrap();
        assert_eq!(a, b, "matrices diverge at {voltage} mV");
    }
}

#[test]
fn coefficient_slot_counts_follow_the_mode() {
    let base = ModelSpec::new(3, vec!["Na", "Ca"], vec![1, 2]);
    let none = base.clone().compile().unwrap();
    assert_eq!((none.q_slot_count(), none.r_slot_count()), (0, 0));
    let single = base
        .clone()
        .with_interaction(InteractionMode::SingleQr)
        .compile()
        .unwrap();
    assert_eq!((single.q_slot_count(), single.r_slot_count()), (1, 1));
    let full = base
        .with_interaction(InteractionMode::FullQr)
        .compile()
        .unwrap();
    assert_eq!((full.q_slot_count(), full.r_slot_count()), (3, 3));
}

fn two_site_model(
    interaction: InteractionMode,
    q_values: Vec<f64>,
) -> (CompiledModel, Conditions) {
    let model = ModelSpec::new(2, vec!["Na", "Ca"], vec![1, 2])
        .with_interaction(interaction)
        .compile()
        .unwrap();
    let conditions = Conditions::new(
        Concentrations::new()
            .with_solute("Na", 0.12, 0.12)
            .with_solute("Ca", 0.002, 0.002),
        EnergyProfile::new(vec![0.167, 0.333, 0.5, 0.667, 0.8333])
            .with_solute("Na", vec![8.0, -4.0, 20.0, -4.0, 8.0])
            .with_solute("Ca", vec![9.0, -12.0, 20.0, -12.0, 9.0]),
    )
    .with_q_values(q_values);
    (model, conditions)
}
