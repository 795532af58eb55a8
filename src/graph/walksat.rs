use anyhow::{bail, Result};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::factor_graph::FactorGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkSatParams {
    /// Random restarts before giving up.
    pub max_tries: usize,
    /// Variable flips per try.
    pub max_flips: usize,
    /// Probability of a random walk move when no freebie exists.
    pub noise: f64,
}

impl Default for WalkSatParams {
    fn default() -> Self {
        Self {
            max_tries: 100,
            max_flips: 10_000,
            noise: 0.5,
        }
    }
}

/// WalkSAT local search over the graph's current clauses. Entries of `pinned`
/// that are `Some` seed the initial assignment and are never flipped; the rest
/// start at a seeded random draw on every try. Returns a complete satisfying
/// assignment (pins included) or `None` once the try budget is exhausted,
/// which callers read as "probably unsatisfiable".
pub fn walksat(
    graph: &FactorGraph,
    params: &WalkSatParams,
    pinned: &[Option<bool>],
    rng: &mut ChaCha8Rng,
) -> Result<Option<Vec<bool>>> {
    if !(0.0..=1.0).contains(&params.noise) {
        bail!("noise must be in [0, 1], got {}", params.noise);
    }
    for _ in 0..params.max_tries {
        let mut assignment: Vec<bool> = (0..graph.num_vars())
            .map(|v| match pinned.get(v) {
                Some(&Some(value)) => value,
                _ => rng.random_bool(0.5),
            })
            .collect();
        let mut true_counts = count_true_literals(graph, &assignment);

        let mut flips = 0;
        loop {
            let unsat: Vec<usize> = (0..graph.num_clauses())
                .filter(|&c| true_counts[c] == 0)
                .collect();
            if unsat.is_empty() {
                return Ok(Some(assignment));
            }
            if flips == params.max_flips {
                break;
            }
            flips += 1;

            let clause = unsat[rng.random_range(0..unsat.len())];
            let candidates: Vec<u32> = graph
                .clause(clause)
                .iter()
                .map(|lit| lit.unsigned_abs())
                .filter(|&v| pinned.get((v - 1) as usize).copied().flatten().is_none())
                .collect();
            let Some(var) = pick_flip(graph, &candidates, &assignment, &true_counts, params, rng)
            else {
                // every literal of the clause is pinned; this try cannot fix it
                break;
            };
            flip(graph, var, &mut assignment, &mut true_counts);
        }
    }
    Ok(None)
}

/// Break-count of flipping `var`: satisfied clauses whose only true literal
/// is `var`'s current occurrence.
fn break_count(
    graph: &FactorGraph,
    var: u32,
    assignment: &[bool],
    true_counts: &[usize],
) -> usize {
    let satisfied_through = if assignment[(var - 1) as usize] {
        graph.positive_clauses_of(var)
    } else {
        graph.negative_clauses_of(var)
    };
    satisfied_through
        .iter()
        .filter(|&&c| true_counts[c] == 1)
        .count()
}

/// Standard WalkSAT move policy: a zero-break literal is taken outright;
/// otherwise a uniformly random candidate with probability `noise`, else the
/// minimum break-count with first-seen tie-break.
fn pick_flip(
    graph: &FactorGraph,
    candidates: &[u32],
    assignment: &[bool],
    true_counts: &[usize],
    params: &WalkSatParams,
    rng: &mut ChaCha8Rng,
) -> Option<u32> {
    if candidates.is_empty() {
        return None;
    }
    let breaks: Vec<usize> = candidates
        .iter()
        .map(|&v| break_count(graph, v, assignment, true_counts))
        .collect();
    if let Some(free) = breaks.iter().position(|&b| b == 0) {
        return Some(candidates[free]);
    }
    if rng.random_bool(params.noise) {
        return Some(candidates[rng.random_range(0..candidates.len())]);
    }
    let mut best = 0;
    for (i, &b) in breaks.iter().enumerate() {
        if b < breaks[best] {
            best = i;
        }
    }
    Some(candidates[best])
}

fn flip(graph: &FactorGraph, var: u32, assignment: &mut [bool], true_counts: &mut [usize]) {
    let value = !assignment[(var - 1) as usize];
    assignment[(var - 1) as usize] = value;
    for &c in graph.positive_clauses_of(var) {
        if value {
            true_counts[c] += 1;
        } else {
            true_counts[c] -= 1;
        }
    }
    for &c in graph.negative_clauses_of(var) {
        if value {
            true_counts[c] -= 1;
        } else {
            true_counts[c] += 1;
        }
    }
}

fn count_true_literals(graph: &FactorGraph, assignment: &[bool]) -> Vec<usize> {
    (0..graph.num_clauses())
        .map(|c| {
            graph
                .clause(c)
                .iter()
                .filter(|&&lit| {
                    let value = assignment[(lit.unsigned_abs() - 1) as usize];
                    value == (lit > 0)
                })
                .count()
        })
        .collect()
}
