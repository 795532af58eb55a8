use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cnf::Cnf;
use crate::graph::{EdgeInit, FactorGraph, WalkSatParams};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpParams {
    /// Sweeps of the fixed-point loop before declaring non-convergence.
    pub max_iters: usize,
    /// Convergence threshold on per-edge survey deltas between sweeps.
    pub precision: f64,
    /// Surveys and partial products below this are snapped to 0.
    pub lower_bound: f64,
    pub walksat: WalkSatParams,
    pub seed: u64,
}

impl Default for SpParams {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            precision: 1e-3,
            lower_bound: 1e-16,
            walksat: WalkSatParams::default(),
            seed: 0,
        }
    }
}

/// Terminal states of one fixed-point run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpResult {
    /// Every edge moved by at most `precision` in the last sweep. `trivial`
    /// means every survey is exactly 0: SP carries no information and the
    /// caller should fall back to local search.
    Converged { trivial: bool },
    Unconverged,
}

/// Per-variable bias derived from converged surveys: the normalized weight of
/// the variable being forced true, forced false, or unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBias {
    pub var: u32,
    pub positive_w: f64,
    pub negative_w: f64,
    pub zero_w: f64,
}

impl VariableBias {
    pub fn magnitude(&self) -> f64 {
        (self.positive_w - self.negative_w).abs()
    }
}

/// Survey propagation over a factor graph it owns exclusively. Decimation
/// shrinks the graph in place; the original formula is kept aside so a
/// witness can always be checked against the unsimplified instance.
pub struct SurveyPropagation {
    pub(crate) graph: FactorGraph,
    pub(crate) original: Cnf,
    pub(crate) params: SpParams,
    pub(crate) rng: ChaCha8Rng,
    /// Accumulated decimation and propagation assignments, indexed `var - 1`.
    pub(crate) fixed: Vec<Option<bool>>,
    /// Edges whose survey normalization hit a 0/0; those surveys are set to 0.
    pub(crate) zero_denominator_events: usize,
}

impl SurveyPropagation {
    pub fn new(cnf: Cnf, params: SpParams) -> Result<Self> {
        if params.max_iters == 0 {
            bail!("max_iters must be >= 1");
        }
        if !(params.precision > 0.0 && params.precision.is_finite()) {
            bail!("precision must be > 0, got {}", params.precision);
        }
        if !(params.lower_bound >= 0.0 && params.lower_bound < 1.0) {
            bail!("lower_bound must be in [0, 1), got {}", params.lower_bound);
        }
        if !(0.0..=1.0).contains(&params.walksat.noise) {
            bail!("noise must be in [0, 1], got {}", params.walksat.noise);
        }
        let graph = FactorGraph::from_cnf(&cnf, EdgeInit::Random(params.seed));
        let fixed = vec![None; cnf.num_vars];
        Ok(Self {
            graph,
            original: cnf,
            params,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            fixed,
            zero_denominator_events: 0,
        })
    }

    pub fn graph(&self) -> &FactorGraph {
        &self.graph
    }

    pub fn fixed_assignment(&self) -> &[Option<bool>] {
        &self.fixed
    }

    pub fn zero_denominator_events(&self) -> usize {
        self.zero_denominator_events
    }

    /// Independently verifies a witness against the original, unsimplified
    /// formula. Decimation mutates the graph, so this is the only trustworthy
    /// check for a final assignment.
    pub fn check_assignment(&self, assignment: &[bool]) -> bool {
        self.original.satisfied_by(assignment)
    }

    /// SP-Update for the edge between `clause` and `var`: the survey is the
    /// product over the clause's other literals of the probability that the
    /// literal is forced against this clause. A 0/0 normalization makes the
    /// whole survey 0 (counted in `zero_denominator_events`); a clause with no
    /// other literals keeps the empty-product survey of 1.
    pub fn update(&mut self, clause: usize, var: u32) {
        if self.graph.connection(clause, var).is_none() {
            return;
        }
        let lower_bound = self.params.lower_bound;
        let mut survey = 1.0;
        for lit in self.graph.clause(clause) {
            let j = lit.unsigned_abs();
            if j == var {
                continue;
            }
            let (same_sign, opposite_sign) = if lit > 0 {
                (
                    self.graph.positive_clauses_of(j),
                    self.graph.negative_clauses_of(j),
                )
            } else {
                (
                    self.graph.negative_clauses_of(j),
                    self.graph.positive_clauses_of(j),
                )
            };
            let product_s = floored_product(&self.graph, same_sign, Some(clause), j, lower_bound);
            let product_u = floored_product(&self.graph, opposite_sign, Some(clause), j, lower_bound);

            let pi_u = (1.0 - product_u) * product_s;
            let pi_s = (1.0 - product_s) * product_u;
            let pi_0 = product_s * product_u;
            let total = pi_u + pi_s + pi_0;
            if total == 0.0 {
                self.zero_denominator_events += 1;
                survey = 0.0;
                break;
            }
            survey *= pi_u / total;
        }
        if survey < lower_bound {
            survey = 0.0;
        }
        self.graph.set_edge_weight_for(clause, var, survey);
    }

    /// Runs the fixed-point loop: up to `max_iters` full sweeps, each visiting
    /// clauses and their literals in a freshly shuffled order and updating
    /// surveys in place. Converges when no edge moved by more than
    /// `precision` relative to the pre-sweep snapshot.
    pub fn run(&mut self) -> SpResult {
        let num_clauses = self.graph.num_clauses();
        let mut order: Vec<usize> = (0..num_clauses).collect();
        for _ in 0..self.params.max_iters {
            let snapshot: Vec<Vec<f64>> = (0..num_clauses)
                .map(|c| self.graph.clause_weights(c).to_vec())
                .collect();

            order.shuffle(&mut self.rng);
            for &clause in &order {
                let mut literals = self.graph.clause(clause);
                literals.shuffle(&mut self.rng);
                for lit in literals {
                    self.update(clause, lit.unsigned_abs());
                }
            }

            let mut converged = true;
            let mut trivial = true;
            for (c, previous) in snapshot.iter().enumerate() {
                for (i, &weight) in self.graph.clause_weights(c).iter().enumerate() {
                    if (weight - previous[i]).abs() > self.params.precision {
                        converged = false;
                    }
                    if weight != 0.0 {
                        trivial = false;
                    }
                }
            }
            if converged {
                return SpResult::Converged { trivial };
            }
        }
        SpResult::Unconverged
    }

    /// Per-variable biases from the current surveys, aggregated over every
    /// clause containing the variable, plus the index (into the returned list)
    /// of the variable with the largest |positive_w - negative_w|. Variables
    /// no longer present in the graph are skipped.
    pub fn biases(&self) -> (Vec<VariableBias>, Option<usize>) {
        let lower_bound = self.params.lower_bound;
        let mut biases = Vec::new();
        let mut best: Option<usize> = None;
        for var in 1..=self.graph.num_vars() as u32 {
            let positive = self.graph.positive_clauses_of(var);
            let negative = self.graph.negative_clauses_of(var);
            if positive.is_empty() && negative.is_empty() {
                continue;
            }
            let product_pos = floored_product(&self.graph, positive, None, var, lower_bound);
            let product_neg = floored_product(&self.graph, negative, None, var, lower_bound);

            let positive_pi = (1.0 - product_pos) * product_neg;
            let negative_pi = (1.0 - product_neg) * product_pos;
            let zero_pi = product_pos * product_neg;
            let total = positive_pi + negative_pi + zero_pi;
            let bias = if total == 0.0 {
                VariableBias {
                    var,
                    positive_w: 0.0,
                    negative_w: 0.0,
                    zero_w: 0.0,
                }
            } else {
                VariableBias {
                    var,
                    positive_w: positive_pi / total,
                    negative_w: negative_pi / total,
                    zero_w: zero_pi / total,
                }
            };
            biases.push(bias);
            match best {
                Some(b) if biases[b].magnitude() >= bias.magnitude() => {}
                _ => best = Some(biases.len() - 1),
            }
        }
        (biases, best)
    }
}

/// Π over `clauses` (excluding `skip`) of (1 - survey on the edge to `var`),
/// snapped to 0 when it falls below `lower_bound`.
fn floored_product(
    graph: &FactorGraph,
    clauses: &[usize],
    skip: Option<usize>,
    var: u32,
    lower_bound: f64,
) -> f64 {
    let mut product = 1.0;
    for &b in clauses {
        if Some(b) == skip {
            continue;
        }
        if let Some(weight) = graph.edge_weight_for(b, var) {
            product *= 1.0 - weight;
        }
    }
    if product < lower_bound {
        0.0
    } else {
        product
    }
}
