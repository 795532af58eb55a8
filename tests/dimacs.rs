use spsat::cnf::{load_witness, parse_dimacs, to_dimacs, write_witness, FormatError};
use spsat::graph::{EdgeInit, FactorGraph};

#[test]
fn parses_header_comments_and_clauses() {
    let text = "\
c a comment
c another one
p cnf 3 2
1 2 0
-1 3 0
";
    let cnf = parse_dimacs(text).expect("parse");
    assert_eq!(cnf.num_vars, 3);
    assert_eq!(cnf.clauses, vec![vec![1, 2], vec![-1, 3]]);
}

#[test]
fn stops_after_declared_clause_count() {
    let text = "p cnf 2 1\n1 2 0\n-1 -2 0\n";
    let cnf = parse_dimacs(text).expect("parse");
    assert_eq!(cnf.clauses.len(), 1);
}

#[test]
fn rejects_missing_header() {
    let err = parse_dimacs("c only comments\n").expect_err("should fail");
    assert!(matches!(err, FormatError::MissingHeader));
}

#[test]
fn rejects_malformed_header() {
    let err = parse_dimacs("p dnf 3 2\n").expect_err("should fail");
    assert!(matches!(err, FormatError::InvalidHeader(_)));

    let err = parse_dimacs("p cnf three 2\n").expect_err("should fail");
    assert!(matches!(err, FormatError::InvalidHeader(_)));
}

#[test]
fn rejects_clause_without_terminator() {
    let err = parse_dimacs("p cnf 2 1\n1 2\n").expect_err("should fail");
    assert!(matches!(err, FormatError::MissingTerminator { line: 2 }));
}

#[test]
fn rejects_literal_out_of_range() {
    let err = parse_dimacs("p cnf 2 1\n1 5 0\n").expect_err("should fail");
    assert!(matches!(
        err,
        FormatError::LiteralOutOfRange { lit: 5, num_vars: 2, .. }
    ));
}

#[test]
fn rejects_truncated_formula() {
    let err = parse_dimacs("p cnf 2 3\n1 2 0\n").expect_err("should fail");
    assert!(matches!(
        err,
        FormatError::TooFewClauses {
            expected: 3,
            found: 1
        }
    ));
}

#[test]
fn rejects_tokens_after_terminator() {
    let err = parse_dimacs("p cnf 2 1\n1 0 2 0\n").expect_err("should fail");
    assert!(matches!(err, FormatError::TrailingTokens { line: 2 }));
}

#[test]
fn text_round_trip_preserves_structure() {
    let text = "p cnf 4 3\n1 -2 0\n3 4 -1 0\n-4 0\n";
    let cnf = parse_dimacs(text).expect("parse");
    let reparsed = parse_dimacs(&to_dimacs(&cnf)).expect("reparse");
    assert_eq!(cnf, reparsed);
}

#[test]
fn witness_file_round_trip() {
    let path = std::env::temp_dir().join("spsat_witness_round_trip.txt");
    write_witness(&path, &[true, false, true]).expect("write");
    let values = load_witness(&path, 3).expect("load");
    assert_eq!(values, vec![true, false, true]);
    std::fs::remove_file(&path).expect("cleanup");
}

#[test]
fn witness_rejects_bad_token() {
    let path = std::env::temp_dir().join("spsat_witness_bad_token.txt");
    std::fs::write(&path, "1 yes 0\n").expect("write");
    let err = load_witness(&path, 3).expect_err("should fail");
    assert!(matches!(err, FormatError::WitnessToken(token) if token == "yes"));
    std::fs::remove_file(&path).expect("cleanup");
}

#[test]
fn witness_rejects_wrong_length() {
    let path = std::env::temp_dir().join("spsat_witness_wrong_length.txt");
    write_witness(&path, &[true, false]).expect("write");
    let err = load_witness(&path, 3).expect_err("should fail");
    assert!(matches!(
        err,
        FormatError::WitnessLength {
            found: 2,
            expected: 3
        }
    ));
    std::fs::remove_file(&path).expect("cleanup");
}

#[test]
fn graph_round_trip_preserves_structure() {
    let text = "p cnf 4 3\n1 -2 0\n3 4 -1 0\n-4 0\n";
    let cnf = parse_dimacs(text).expect("parse");
    let graph = FactorGraph::from_cnf(&cnf, EdgeInit::Ones);
    let exported = graph.to_cnf();
    let rebuilt = FactorGraph::from_cnf(
        &parse_dimacs(&to_dimacs(&exported)).expect("reparse"),
        EdgeInit::Ones,
    );
    assert_eq!(graph, rebuilt);
}
