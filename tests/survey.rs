use spsat::cnf::parse_dimacs;
use spsat::graph::WalkSatParams;
use spsat::sp::{Outcome, SpParams, SpResult, SurveyPropagation};

fn solver(text: &str, seed: u64) -> SurveyPropagation {
    let cnf = parse_dimacs(text).expect("parse");
    SurveyPropagation::new(
        cnf,
        SpParams {
            seed,
            ..SpParams::default()
        },
    )
    .expect("valid params")
}

#[test]
fn rejects_bad_parameters() {
    let cnf = parse_dimacs("p cnf 1 1\n1 0\n").expect("parse");
    let bad = SpParams {
        precision: 0.0,
        ..SpParams::default()
    };
    assert!(SurveyPropagation::new(cnf.clone(), bad).is_err());

    let bad_noise = SpParams {
        walksat: WalkSatParams {
            noise: 1.5,
            ..WalkSatParams::default()
        },
        ..SpParams::default()
    };
    assert!(SurveyPropagation::new(cnf, bad_noise).is_err());
}

#[test]
fn update_on_a_unit_clause_yields_survey_one() {
    // no other literals: the empty product leaves the survey at 1
    let mut sp = solver("p cnf 1 1\n1 0\n", 9);
    sp.update(0, 1);
    assert_eq!(sp.graph().edge_weight_for(0, 1), Some(1.0));
}

#[test]
fn update_ignores_missing_connections() {
    let mut sp = solver("p cnf 2 1\n1 0\n", 9);
    let before = sp.graph().clause_weights(0).to_vec();
    sp.update(0, 2);
    assert_eq!(sp.graph().clause_weights(0), &before[..]);
}

#[test]
fn zero_denominator_snaps_survey_to_zero() {
    // After the unit clauses push their surveys to 1, variable 2 is fully
    // blocked on both sides and the normalization for edge (0, 1) is 0/0.
    let mut sp = solver("p cnf 2 3\n1 2 0\n2 0\n-2 0\n", 4);
    sp.update(1, 2);
    sp.update(2, 2);
    assert_eq!(sp.graph().edge_weight_for(1, 2), Some(1.0));
    assert_eq!(sp.graph().edge_weight_for(2, 2), Some(1.0));

    sp.update(0, 1);
    assert_eq!(sp.graph().edge_weight_for(0, 1), Some(0.0));
    assert_eq!(sp.zero_denominator_events(), 1);
}

#[test]
fn loosely_constrained_formula_converges_trivially() {
    // every survey collapses to 0: SP has nothing to say about this formula
    let mut sp = solver("p cnf 3 2\n1 2 0\n-1 3 0\n", 21);
    assert_eq!(sp.run(), SpResult::Converged { trivial: true });
}

#[test]
fn forced_variable_converges_non_trivially() {
    let mut sp = solver("p cnf 2 2\n1 0\n1 2 0\n", 21);
    assert_eq!(sp.run(), SpResult::Converged { trivial: false });
    assert_eq!(sp.graph().edge_weight_for(0, 1), Some(1.0));

    let (biases, best) = sp.biases();
    let best = best.expect("variables present");
    assert_eq!(biases[best].var, 1);
    assert!(biases[best].positive_w > biases[best].negative_w);
}

#[test]
fn biases_skip_absent_variables() {
    // variable 3 is declared but occurs in no clause
    let mut sp = solver("p cnf 3 2\n1 0\n1 2 0\n", 3);
    sp.run();
    let (biases, _) = sp.biases();
    assert_eq!(biases.len(), 2);
    assert!(biases.iter().all(|b| b.var != 3));
}

#[test]
fn tight_precision_exhausts_the_sweep_budget() {
    // random initial surveys sit strictly below the unit clause's fixed point
    // of 1, so a single sweep can never move less than this threshold
    let cnf = parse_dimacs("p cnf 1 1\n1 0\n").expect("parse");
    let params = SpParams {
        max_iters: 1,
        precision: 1e-300,
        ..SpParams::default()
    };
    let mut sp = SurveyPropagation::new(cnf, params).expect("valid params");
    assert_eq!(sp.run(), SpResult::Unconverged);
}

#[test]
fn sid_surfaces_non_convergence() {
    let cnf = parse_dimacs("p cnf 1 1\n1 0\n").expect("parse");
    let params = SpParams {
        max_iters: 1,
        precision: 1e-300,
        ..SpParams::default()
    };
    let mut sp = SurveyPropagation::new(cnf, params).expect("valid params");
    assert_eq!(sp.sid(100).expect("valid arguments"), Outcome::SpUnconverged);
}

#[test]
fn exhausted_walksat_budget_reports_prob_unsat() {
    // trivial surveys hand off to WalkSAT, which gets zero tries
    let cnf = parse_dimacs("p cnf 3 2\n1 2 0\n-1 3 0\n").expect("parse");
    let params = SpParams {
        walksat: WalkSatParams {
            max_tries: 0,
            ..WalkSatParams::default()
        },
        seed: 21,
        ..SpParams::default()
    };
    let mut sp = SurveyPropagation::new(cnf, params).expect("valid params");
    assert_eq!(sp.sid(100).expect("valid arguments"), Outcome::ProbUnsat);
}

#[test]
fn exhausted_decimation_budget_reports_prob_unsat() {
    // one round fixes the forced variable but the residual (3 4)(-3 4) part
    // is neither solved nor contradictory, and no budget remains
    let mut sp = solver("p cnf 4 4\n1 0\n1 2 0\n3 4 0\n-3 4 0\n", 7);
    assert_eq!(sp.sid(1).expect("valid arguments"), Outcome::ProbUnsat);
}

#[test]
fn sid_solves_a_forced_formula() {
    let mut sp = solver("p cnf 2 2\n1 0\n1 2 0\n", 13);
    let outcome = sp.sid(100).expect("valid arguments");
    // variable 1 is fixed true by decimation, variable 2 stays free
    assert_eq!(outcome, Outcome::Sat(vec![true, false]));
    assert!(sp.check_assignment(&[true, false]));
}

#[test]
fn sid_falls_back_to_walksat_on_trivial_surveys() {
    let mut sp = solver("p cnf 3 2\n1 2 0\n-1 3 0\n", 8);
    match sp.sid(100).expect("valid arguments") {
        Outcome::Sat(model) => assert!(sp.check_assignment(&model)),
        other => panic!("expected SAT, got {:?}", other),
    }
}

#[test]
fn sid_detects_a_contradiction() {
    let mut sp = solver("p cnf 1 2\n1 0\n-1 0\n", 5);
    assert_eq!(sp.sid(100).expect("valid arguments"), Outcome::Contradiction);
}

#[test]
fn sid_reports_an_input_empty_clause_as_contradiction() {
    let mut sp = solver("p cnf 1 1\n0\n", 5);
    assert_eq!(sp.sid(10).expect("valid arguments"), Outcome::Contradiction);
}

#[test]
fn sid_solves_a_formula_with_no_clauses() {
    let mut sp = solver("p cnf 2 0\n", 5);
    assert_eq!(sp.sid(10).expect("valid arguments"), Outcome::Sat(vec![false, false]));
}

#[test]
fn sid_rejects_zero_budget() {
    let mut sp = solver("p cnf 1 1\n1 0\n", 5);
    assert!(sp.sid(0).is_err());
}

#[test]
fn sidf_solves_a_random_satisfiable_instance() {
    // chained implications: 1, 1->2, 2->3, 3->4
    let mut sp = solver("p cnf 4 4\n1 0\n-1 2 0\n-2 3 0\n-3 4 0\n", 2);
    match sp.sidf(0.5, 100).expect("valid arguments") {
        Outcome::Sat(model) => assert!(sp.check_assignment(&model)),
        other => panic!("expected SAT, got {:?}", other),
    }
}

#[test]
fn sidf_rejects_bad_fraction() {
    let mut sp = solver("p cnf 1 1\n1 0\n", 5);
    assert!(sp.sidf(0.0, 10).is_err());
    assert!(sp.sidf(1.5, 10).is_err());
}

#[test]
fn decimation_records_fixed_variables() {
    let mut sp = solver("p cnf 2 2\n1 0\n1 2 0\n", 1);
    sp.sid(100).expect("valid arguments");
    assert_eq!(sp.fixed_assignment()[0], Some(true));
    assert_eq!(sp.fixed_assignment()[1], None);
}
