use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cnf::Cnf;

/// Initial value of the edge surveys when a graph is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeInit {
    /// Every edge starts at 1.0.
    Ones,
    /// Every edge starts at a seeded uniform draw from [0, 1).
    Random(u64),
}

/// One clause of the graph: its positive and negative variables plus the
/// survey attached to each literal occurrence. The weight vector is indexed
/// positives first, then negatives, and always has exactly one entry per
/// literal. All mutation goes through these methods so the two stay in
/// lock-step.
#[derive(Debug, Clone, PartialEq)]
struct ClauseRecord {
    positives: Vec<u32>,
    negatives: Vec<u32>,
    weights: Vec<f64>,
}

impl ClauseRecord {
    fn len(&self) -> usize {
        self.positives.len() + self.negatives.len()
    }

    fn is_empty(&self) -> bool {
        self.positives.is_empty() && self.negatives.is_empty()
    }

    /// Position of `var` within its sign list, plus the sign (true = positive).
    fn find(&self, var: u32) -> Option<(usize, bool)> {
        if let Some(pos) = self.positives.iter().position(|&v| v == var) {
            return Some((pos, true));
        }
        self.negatives
            .iter()
            .position(|&v| v == var)
            .map(|pos| (pos, false))
    }

    /// Index into `weights` for the occurrence at `pos` in the given sign list.
    fn weight_index(&self, pos: usize, positive: bool) -> usize {
        if positive {
            pos
        } else {
            self.positives.len() + pos
        }
    }

    /// Removes `var`'s occurrence and its weight at the matching offset.
    fn remove_var(&mut self, var: u32) {
        if let Some((pos, positive)) = self.find(var) {
            self.weights.remove(self.weight_index(pos, positive));
            if positive {
                self.positives.remove(pos);
            } else {
                self.negatives.remove(pos);
            }
        }
    }

    /// Signed literals, positives first, index-matched to `weights`.
    fn literals(&self) -> Vec<i32> {
        self.positives
            .iter()
            .map(|&v| v as i32)
            .chain(self.negatives.iter().map(|&v| -(v as i32)))
            .collect()
    }
}

/// Bipartite factor graph of a CNF formula: clause records on one side,
/// variables on the other, with a survey weight on every edge. Variables are
/// 1-based ids; the occurrence tables are stored 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorGraph {
    clauses: Vec<ClauseRecord>,
    positive_occurrences: Vec<Vec<usize>>,
    negative_occurrences: Vec<Vec<usize>>,
    num_vars: usize,
}

impl FactorGraph {
    pub fn from_cnf(cnf: &Cnf, init: EdgeInit) -> Self {
        let mut rng = match init {
            EdgeInit::Ones => None,
            EdgeInit::Random(seed) => Some(ChaCha8Rng::seed_from_u64(seed)),
        };
        let clauses = cnf
            .clauses
            .iter()
            .map(|clause| {
                let positives = clause
                    .iter()
                    .filter(|&&l| l > 0)
                    .map(|&l| l as u32)
                    .collect::<Vec<_>>();
                let negatives = clause
                    .iter()
                    .filter(|&&l| l < 0)
                    .map(|&l| l.unsigned_abs())
                    .collect::<Vec<_>>();
                let weights = (0..positives.len() + negatives.len())
                    .map(|_| match rng.as_mut() {
                        Some(rng) => rng.random::<f64>(),
                        None => 1.0,
                    })
                    .collect();
                ClauseRecord {
                    positives,
                    negatives,
                    weights,
                }
            })
            .collect();
        let mut graph = Self {
            clauses,
            positive_occurrences: Vec::new(),
            negative_occurrences: Vec::new(),
            num_vars: cnf.num_vars,
        };
        graph.rebuild_occurrences();
        graph
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn clause_len(&self, clause: usize) -> usize {
        self.clauses[clause].len()
    }

    /// Signed literals of a clause, positives first, index-matched to the
    /// clause's weight vector.
    pub fn clause(&self, clause: usize) -> Vec<i32> {
        self.clauses[clause].literals()
    }

    /// Whether `var` occurs in `clause`: its position within the positive or
    /// negative list and the sign of the occurrence.
    pub fn connection(&self, clause: usize, var: u32) -> Option<(usize, bool)> {
        self.clauses[clause].find(var)
    }

    /// Index into the clause's weight vector for a signed literal, honoring
    /// the positives-first convention.
    pub fn weight_index(&self, clause: usize, lit: i32) -> Option<usize> {
        let record = &self.clauses[clause];
        let (pos, positive) = record.find(lit.unsigned_abs())?;
        if positive != (lit > 0) {
            return None;
        }
        Some(record.weight_index(pos, positive))
    }

    pub fn clause_weights(&self, clause: usize) -> &[f64] {
        &self.clauses[clause].weights
    }

    /// Survey on the edge between `clause` and `var`, whichever sign the
    /// occurrence has.
    pub fn edge_weight_for(&self, clause: usize, var: u32) -> Option<f64> {
        let record = &self.clauses[clause];
        let (pos, positive) = record.find(var)?;
        Some(record.weights[record.weight_index(pos, positive)])
    }

    pub fn set_edge_weight_for(&mut self, clause: usize, var: u32, weight: f64) -> bool {
        let record = &mut self.clauses[clause];
        match record.find(var) {
            Some((pos, positive)) => {
                let idx = record.weight_index(pos, positive);
                record.weights[idx] = weight;
                true
            }
            None => false,
        }
    }

    /// Clause ids where `var` occurs positively.
    pub fn positive_clauses_of(&self, var: u32) -> &[usize] {
        &self.positive_occurrences[(var - 1) as usize]
    }

    /// Clause ids where `var` occurs negatively.
    pub fn negative_clauses_of(&self, var: u32) -> &[usize] {
        &self.negative_occurrences[(var - 1) as usize]
    }

    /// Variables forced by clauses of length one, mapped to the forced
    /// polarity. When several unit clauses name the same variable the first
    /// one in clause order wins; opposite-polarity pairs surface later as a
    /// contradiction during propagation.
    pub fn unit_vars(&self) -> IndexMap<u32, bool> {
        let mut units = IndexMap::new();
        for record in &self.clauses {
            if record.len() != 1 {
                continue;
            }
            let (var, value) = match record.positives.first() {
                Some(&v) => (v, true),
                None => (record.negatives[0], false),
            };
            units.entry(var).or_insert(value);
        }
        units
    }

    /// Fixes `var` to `value`: clauses satisfied by the assignment are deleted
    /// wholesale, surviving clauses lose the falsified occurrence together
    /// with its weight, and the occurrence tables are rebuilt.
    pub fn partial_assignment(&mut self, var: u32, value: bool) {
        debug_assert!(var >= 1 && (var as usize) <= self.num_vars);
        let satisfied_in = if value {
            &self.positive_occurrences[(var - 1) as usize]
        } else {
            &self.negative_occurrences[(var - 1) as usize]
        };
        let mut satisfied = vec![false; self.clauses.len()];
        for &c in satisfied_in {
            satisfied[c] = true;
        }

        let old = std::mem::take(&mut self.clauses);
        for (c, mut record) in old.into_iter().enumerate() {
            if satisfied[c] {
                continue;
            }
            record.remove_var(var);
            self.clauses.push(record);
        }
        self.rebuild_occurrences();
    }

    /// Drives `unit_vars` + `partial_assignment` to a fixed point, returning
    /// the assignments that were applied. Stops as soon as a contradiction
    /// appears; callers inspect `has_contradiction` / `is_solved` afterwards.
    pub fn unit_propagation(&mut self) -> Vec<(u32, bool)> {
        let mut assigned = Vec::new();
        loop {
            let units = self.unit_vars();
            if units.is_empty() {
                return assigned;
            }
            for (var, value) in units {
                self.partial_assignment(var, value);
                assigned.push((var, value));
                if self.has_contradiction() {
                    return assigned;
                }
            }
        }
    }

    /// All clauses satisfied and deleted: the residual formula is trivially true.
    pub fn is_solved(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Some clause has lost all its literals: the residual is unsatisfiable.
    pub fn has_contradiction(&self) -> bool {
        self.clauses.iter().any(|record| record.is_empty())
    }

    /// Clause satisfaction under a complete assignment (`assignment[v - 1]`
    /// is the value of variable `v`).
    pub fn clause_satisfied(&self, clause: usize, assignment: &[bool]) -> bool {
        let record = &self.clauses[clause];
        record
            .positives
            .iter()
            .any(|&v| assignment[(v - 1) as usize])
            || record
                .negatives
                .iter()
                .any(|&v| !assignment[(v - 1) as usize])
    }

    pub fn satisfies(&self, assignment: &[bool]) -> bool {
        (0..self.clauses.len()).all(|c| self.clause_satisfied(c, assignment))
    }

    /// Exports the current (possibly simplified) clause structure. Weights do
    /// not round-trip; they are regenerated on construction.
    pub fn to_cnf(&self) -> Cnf {
        Cnf {
            num_vars: self.num_vars,
            clauses: self.clauses.iter().map(ClauseRecord::literals).collect(),
        }
    }

    fn rebuild_occurrences(&mut self) {
        self.positive_occurrences = vec![Vec::new(); self.num_vars];
        self.negative_occurrences = vec![Vec::new(); self.num_vars];
        for (c, record) in self.clauses.iter().enumerate() {
            for &v in &record.positives {
                self.positive_occurrences[(v - 1) as usize].push(c);
            }
            for &v in &record.negatives {
                self.negative_occurrences[(v - 1) as usize].push(c);
            }
        }
    }
}
