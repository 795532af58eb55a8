pub mod factor_graph;
pub mod walksat;

pub use factor_graph::{EdgeInit, FactorGraph};
pub use walksat::{walksat, WalkSatParams};
