use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A CNF formula over variables `1..=num_vars`. Clauses are lists of nonzero
/// signed literals: `v` means the variable is required true, `-v` false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cnf {
    pub num_vars: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl Cnf {
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            clauses: Vec::new(),
        }
    }

    pub fn add_clause(&mut self, clause: Vec<i32>) {
        self.clauses.push(clause);
    }

    /// True iff at least one literal of `clause` matches the assignment's
    /// polarity for its variable. `assignment[v - 1]` is the value of variable `v`.
    pub fn clause_satisfied(clause: &[i32], assignment: &[bool]) -> bool {
        clause.iter().any(|&lit| {
            let var = lit.unsigned_abs() as usize;
            match assignment.get(var - 1) {
                Some(&value) => value == (lit > 0),
                None => false,
            }
        })
    }

    /// Evaluates the whole formula under a complete assignment.
    pub fn satisfied_by(&self, assignment: &[bool]) -> bool {
        self.clauses
            .iter()
            .all(|clause| Self::clause_satisfied(clause, assignment))
    }

    /// Random k-SAT instance: each clause draws `clause_len` distinct variables
    /// and flips each sign with probability 1/2. Used by the CLI and tests.
    pub fn generate_random(
        num_vars: usize,
        num_clauses: usize,
        clause_len: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut vars: Vec<u32> = (1..=num_vars as u32).collect();
        let width = clause_len.min(num_vars);
        let mut cnf = Self::new(num_vars);
        for _ in 0..num_clauses {
            vars.shuffle(&mut rng);
            let clause = vars[..width]
                .iter()
                .map(|&v| if rng.random_bool(0.5) { v as i32 } else { -(v as i32) })
                .collect();
            cnf.add_clause(clause);
        }
        cnf
    }
}
