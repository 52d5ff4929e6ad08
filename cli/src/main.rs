//! DDAR batch solver
//!
//! Loads problem files, runs each problem on its own state (in parallel
//! across problems) and prints one line per problem.

use anyhow::{bail, Context};
use clap::Parser;
use ddar_core::{load_problem, load_problems, solve_problem, ChainConfig, ForwardChainer, GeometryProblem, RuleCatalogue};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ddar-solve")]
#[command(version)]
#[command(about = "Prove geometry goals by deduction and algebraic elimination", long_about = None)]
struct Args {
    /// Problem files, or directories of `.json` problem files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Stop each run after this many rounds
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Print one JSON report per line instead of a table
    #[arg(long)]
    json: bool,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Accept premises without checking them on the diagram
    #[arg(long)]
    no_validate: bool,

    /// Apply the rule catalogue in reverse order
    #[arg(long)]
    reverse_rules: bool,
}

fn collect_problems(inputs: &[PathBuf]) -> anyhow::Result<Vec<(PathBuf, GeometryProblem)>> {
    let mut problems = Vec::new();
    for input in inputs {
        if input.is_dir() {
            problems.extend(load_problems(input).with_context(|| format!("loading {}", input.display()))?);
        } else {
            let problem = load_problem(input).with_context(|| format!("loading {}", input.display()))?;
            problems.push((input.clone(), problem));
        }
    }
    Ok(problems)
}

/// `RUST_LOG` when set and valid, otherwise `info`
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let problems = collect_problems(&args.inputs)?;

    let config = ChainConfig {
        max_rounds: args.max_rounds,
        validate_premises: !args.no_validate,
        ..ChainConfig::default()
    };
    let catalogue = if args.reverse_rules {
        RuleCatalogue::standard().reversed()
    } else {
        RuleCatalogue::standard()
    };
    let chainer = ForwardChainer::with_catalogue(catalogue, config);

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("building worker pool")?;
    let results: Vec<_> = pool.install(|| {
        problems
            .par_iter()
            .map(|(path, problem)| (path, solve_problem(problem, &chainer)))
            .collect()
    });

    let (mut proven, mut failed) = (0usize, 0usize);
    for (path, result) in &results {
        match result {
            Ok(report) => {
                if report.passed() {
                    proven += 1;
                }
                if args.json {
                    println!("{}", serde_json::to_string(report)?);
                } else {
                    let status = if report.passed() { "PASS" } else { "FAIL" };
                    println!(
                        "{} {:<32} {} ({} facts, {} ms)",
                        status, report.problem_id, report.verdict, report.facts, report.elapsed_ms
                    );
                }
            }
            Err(err) => {
                failed += 1;
                error!(path = %path.display(), error = %err, "run failed");
            }
        }
    }

    if !args.json {
        println!("{}/{} proven", proven, results.len());
    }
    if failed > 0 {
        bail!("{} of {} problems failed with an error", failed, results.len());
    }
    Ok(())
}
