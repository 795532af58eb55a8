use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use spsat::cnf::{load_cnf, load_witness, to_dimacs, write_cnf, write_witness, Cnf};
use spsat::graph::{walksat, EdgeInit, FactorGraph, WalkSatParams};
use spsat::sp::{Outcome, SpParams, SurveyPropagation};

#[derive(Parser, Debug)]
#[command(name = "spsat")]
#[command(about = "Survey propagation SAT solver with WalkSAT fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Survey-inspired decimation, one variable per round.
    Sid {
        #[arg(long)]
        cnf: String,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1000)]
        sp_iters: usize,
        #[arg(long, default_value_t = 1e-3)]
        precision: f64,
        #[arg(long, default_value_t = 1e-16)]
        lower_bound: f64,
        #[arg(long, default_value_t = 1000)]
        decimations: usize,
        #[arg(long, default_value_t = 100)]
        walksat_tries: usize,
        #[arg(long, default_value_t = 10_000)]
        walksat_flips: usize,
        #[arg(long, default_value_t = 0.5)]
        noise: f64,
        #[arg(long)]
        witness_out: Option<String>,
    },
    /// Fractional decimation: fix a batch of variables per round.
    Sidf {
        #[arg(long)]
        cnf: String,
        #[arg(long, default_value_t = 0.05)]
        fraction: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1000)]
        sp_iters: usize,
        #[arg(long, default_value_t = 1e-3)]
        precision: f64,
        #[arg(long, default_value_t = 1e-16)]
        lower_bound: f64,
        #[arg(long, default_value_t = 1000)]
        rounds: usize,
        #[arg(long, default_value_t = 100)]
        walksat_tries: usize,
        #[arg(long, default_value_t = 10_000)]
        walksat_flips: usize,
        #[arg(long, default_value_t = 0.5)]
        noise: f64,
        #[arg(long)]
        witness_out: Option<String>,
    },
    /// Plain WalkSAT local search, no survey propagation.
    Walksat {
        #[arg(long)]
        cnf: String,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 100)]
        tries: usize,
        #[arg(long, default_value_t = 10_000)]
        flips: usize,
        #[arg(long, default_value_t = 0.5)]
        noise: f64,
        #[arg(long)]
        witness_out: Option<String>,
    },
    /// Verify a witness file against a formula.
    Check {
        #[arg(long)]
        cnf: String,
        #[arg(long)]
        witness: String,
    },
    /// Unit-propagate a formula and write the simplified DIMACS.
    Simplify {
        #[arg(long)]
        cnf: String,
        #[arg(long)]
        out: Option<String>,
    },
    /// Generate a random k-SAT instance.
    GenRandom {
        #[arg(long)]
        vars: usize,
        #[arg(long)]
        clauses: usize,
        #[arg(long, default_value_t = 3)]
        clause_len: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sid {
            cnf,
            seed,
            sp_iters,
            precision,
            lower_bound,
            decimations,
            walksat_tries,
            walksat_flips,
            noise,
            witness_out,
        } => {
            let formula = load_cnf(&cnf)?;
            let params = SpParams {
                max_iters: sp_iters,
                precision,
                lower_bound,
                walksat: WalkSatParams {
                    max_tries: walksat_tries,
                    max_flips: walksat_flips,
                    noise,
                },
                seed,
            };
            let mut solver = SurveyPropagation::new(formula, params)?;
            let outcome = solver.sid(decimations)?;
            report_outcome("SID", &solver, &outcome, witness_out.as_deref())?;
        }
        Commands::Sidf {
            cnf,
            fraction,
            seed,
            sp_iters,
            precision,
            lower_bound,
            rounds,
            walksat_tries,
            walksat_flips,
            noise,
            witness_out,
        } => {
            let formula = load_cnf(&cnf)?;
            let params = SpParams {
                max_iters: sp_iters,
                precision,
                lower_bound,
                walksat: WalkSatParams {
                    max_tries: walksat_tries,
                    max_flips: walksat_flips,
                    noise,
                },
                seed,
            };
            let mut solver = SurveyPropagation::new(formula, params)?;
            let outcome = solver.sidf(fraction, rounds)?;
            report_outcome("SIDF", &solver, &outcome, witness_out.as_deref())?;
        }
        Commands::Walksat {
            cnf,
            seed,
            tries,
            flips,
            noise,
            witness_out,
        } => {
            let formula = load_cnf(&cnf)?;
            let graph = FactorGraph::from_cnf(&formula, EdgeInit::Ones);
            let params = WalkSatParams {
                max_tries: tries,
                max_flips: flips,
                noise,
            };
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let pinned = vec![None; formula.num_vars];
            match walksat(&graph, &params, &pinned, &mut rng)? {
                Some(assignment) => {
                    println!("WALKSAT: SAT | verified={}", formula.satisfied_by(&assignment));
                    if let Some(path) = witness_out {
                        write_witness(&path, &assignment)?;
                        println!("WALKSAT: wrote witness to {}", path);
                    }
                }
                None => println!("WALKSAT: PROB_UNSAT (budget exhausted)"),
            }
        }
        Commands::Check { cnf, witness } => {
            let formula = load_cnf(&cnf)?;
            let assignment = load_witness(&witness, formula.num_vars)?;
            let ok = formula.satisfied_by(&assignment);
            println!("CHECK: {}", if ok { "SATISFIED" } else { "NOT SATISFIED" });
        }
        Commands::Simplify { cnf, out } => {
            let formula = load_cnf(&cnf)?;
            let mut graph = FactorGraph::from_cnf(&formula, EdgeInit::Ones);
            let assigned = graph.unit_propagation();
            for (var, value) in &assigned {
                println!("SIMPLIFY: forced {} = {}", var, value);
            }
            println!(
                "SIMPLIFY: {} clauses remain | contradiction={} solved={}",
                graph.num_clauses(),
                graph.has_contradiction(),
                graph.is_solved()
            );
            let simplified = graph.to_cnf();
            match out {
                Some(path) => write_cnf(&path, &simplified)?,
                None => print!("{}", to_dimacs(&simplified)),
            }
        }
        Commands::GenRandom {
            vars,
            clauses,
            clause_len,
            seed,
            out,
        } => {
            let formula = Cnf::generate_random(vars, clauses, clause_len, seed);
            write_cnf(&out, &formula)?;
            println!(
                "GEN: wrote {} | vars={} clauses={} k={}",
                out, vars, clauses, clause_len
            );
        }
    }
    Ok(())
}

fn report_outcome(
    tag: &str,
    solver: &SurveyPropagation,
    outcome: &Outcome,
    witness_out: Option<&str>,
) -> Result<()> {
    match outcome {
        Outcome::Sat(assignment) => {
            println!(
                "{}: SAT | verified={} | zero_denominators={}",
                tag,
                solver.check_assignment(assignment),
                solver.zero_denominator_events()
            );
            if let Some(path) = witness_out {
                write_witness(path, assignment)?;
                println!("{}: wrote witness to {}", tag, path);
            }
        }
        Outcome::Contradiction => println!("{}: CONTRADICTION", tag),
        Outcome::SpUnconverged => println!("{}: SP_UNCONVERGED", tag),
        Outcome::ProbUnsat => println!("{}: PROB_UNSAT", tag),
    }
    Ok(())
}
