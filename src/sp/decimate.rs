use anyhow::{bail, Result};

use crate::graph::walksat;

use super::survey::{SpResult, SurveyPropagation};

/// Four-way result of a decimation run. `Sat` carries the witness; the two
/// negative outcomes are not certificates, the algorithm is incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sat(Vec<bool>),
    Contradiction,
    SpUnconverged,
    ProbUnsat,
}

impl SurveyPropagation {
    /// Survey-inspired decimation: run SP to a fixed point, fix the single
    /// most biased variable, simplify, repeat. Trivial surveys hand the
    /// residual graph to WalkSAT; non-convergence aborts the whole solve.
    pub fn sid(&mut self, max_decimations: usize) -> Result<Outcome> {
        if max_decimations == 0 {
            bail!("max_decimations must be >= 1");
        }
        if let Some(outcome) = self.terminal_state() {
            return Ok(outcome);
        }
        for _ in 0..max_decimations {
            match self.run() {
                SpResult::Unconverged => return Ok(Outcome::SpUnconverged),
                SpResult::Converged { trivial: true } => return self.close_with_walksat(),
                SpResult::Converged { trivial: false } => {}
            }
            let (biases, best) = self.biases();
            let Some(best) = best else {
                // no variable left to decide
                return self.close_with_walksat();
            };
            let bias = biases[best];
            self.fix(bias.var, bias.positive_w > bias.negative_w);
            if let Some(outcome) = self.simplify() {
                return Ok(outcome);
            }
        }
        Ok(Outcome::ProbUnsat)
    }

    /// Fractional decimation: like `sid` but fixes the top
    /// `ceil(fraction * remaining-variables)` variables by bias magnitude in
    /// every round, trading decimation precision for speed.
    pub fn sidf(&mut self, fraction: f64, max_rounds: usize) -> Result<Outcome> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            bail!("fraction must be in (0, 1], got {}", fraction);
        }
        if max_rounds == 0 {
            bail!("max_rounds must be >= 1");
        }
        if let Some(outcome) = self.terminal_state() {
            return Ok(outcome);
        }
        for _ in 0..max_rounds {
            match self.run() {
                SpResult::Unconverged => return Ok(Outcome::SpUnconverged),
                SpResult::Converged { trivial: true } => return self.close_with_walksat(),
                SpResult::Converged { trivial: false } => {}
            }
            let (mut biases, _) = self.biases();
            if biases.is_empty() {
                return self.close_with_walksat();
            }
            biases.sort_by(|a, b| {
                b.magnitude()
                    .partial_cmp(&a.magnitude())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let batch = ((fraction * biases.len() as f64).ceil() as usize)
                .clamp(1, biases.len());
            for bias in &biases[..batch] {
                self.fix(bias.var, bias.positive_w > bias.negative_w);
                if self.graph.has_contradiction() {
                    break;
                }
            }
            if let Some(outcome) = self.simplify() {
                return Ok(outcome);
            }
        }
        Ok(Outcome::ProbUnsat)
    }

    /// Degenerate inputs resolve before any survey is computed.
    fn terminal_state(&self) -> Option<Outcome> {
        if self.graph.has_contradiction() {
            return Some(Outcome::Contradiction);
        }
        if self.graph.is_solved() {
            return Some(Outcome::Sat(self.witness()));
        }
        None
    }

    /// Permanently assigns one variable and records it for the witness.
    fn fix(&mut self, var: u32, value: bool) {
        self.graph.partial_assignment(var, value);
        self.fixed[(var - 1) as usize] = Some(value);
    }

    /// Unit-propagates the residual graph and reports a terminal outcome if
    /// one is reached.
    fn simplify(&mut self) -> Option<Outcome> {
        for (var, value) in self.graph.unit_propagation() {
            self.fixed[(var - 1) as usize] = Some(value);
        }
        if self.graph.has_contradiction() {
            return Some(Outcome::Contradiction);
        }
        if self.graph.is_solved() {
            return Some(Outcome::Sat(self.witness()));
        }
        None
    }

    /// Closing move once surveys go trivial: local search over the residual
    /// graph, flipping only variables decimation has not pinned.
    fn close_with_walksat(&mut self) -> Result<Outcome> {
        let found = walksat(
            &self.graph,
            &self.params.walksat,
            &self.fixed,
            &mut self.rng,
        )?;
        Ok(match found {
            Some(assignment) => Outcome::Sat(assignment),
            None => Outcome::ProbUnsat,
        })
    }

    /// Complete assignment from the fixed variables; variables the solve never
    /// constrained default to false.
    fn witness(&self) -> Vec<bool> {
        self.fixed
            .iter()
            .map(|value| value.unwrap_or(false))
            .collect()
    }
}
