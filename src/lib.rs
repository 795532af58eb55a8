pub mod cnf;
pub mod graph;
pub mod sp;
