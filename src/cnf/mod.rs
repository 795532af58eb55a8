pub mod cnf;
pub mod dimacs;

pub use cnf::Cnf;
pub use dimacs::{
    load_cnf, load_witness, parse_dimacs, to_dimacs, write_cnf, write_witness, FormatError,
};
