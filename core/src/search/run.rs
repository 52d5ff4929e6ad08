//! One problem, one report

use super::closure::{ChainStats, ForwardChainer, Verdict};
use crate::error::DdarResult;
use crate::loader::{GeometryProblem, ResolvedProblem};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub problem_id: String,
    pub verdict: Verdict,
    pub rounds: usize,
    pub facts: usize,
    pub angle_rows: usize,
    pub ratio_rows: usize,
    pub length_rows: usize,
    pub stats: ChainStats,
    pub elapsed_ms: u128,
}

impl RunReport {
    /// The goal was proven
    pub fn passed(&self) -> bool {
        self.verdict.is_proven()
    }
}

/// Run one resolved problem on its own state
pub fn run_problem(problem: ResolvedProblem, chainer: &ForwardChainer) -> DdarResult<RunReport> {
    let start = Instant::now();
    let ResolvedProblem {
        mut state,
        premises,
        distinct,
    } = problem;
    let (verdict, stats) = chainer.prove(&mut state, &premises, &distinct)?;
    Ok(RunReport {
        problem_id: state.metadata.problem_id.clone(),
        rounds: stats.rounds,
        verdict,
        facts: state.num_facts(),
        angle_rows: state.angles.len(),
        ratio_rows: state.ratios.len(),
        length_rows: state.lengths.len(),
        stats,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Resolve and run a problem as read from a file.
///
/// An undefined construction is reported as a `ConstructionError` verdict;
/// malformed problems are errors.
pub fn solve_problem(problem: &GeometryProblem, chainer: &ForwardChainer) -> DdarResult<RunReport> {
    let start = Instant::now();
    match problem.resolve() {
        Ok(resolved) => run_problem(resolved, chainer),
        Err(err) if err.is_verdict() => {
            let verdict = Verdict::ConstructionError {
                reason: err.to_string(),
            };
            info!(problem = %problem.id, %verdict, "run finished");
            Ok(RunReport {
                problem_id: problem.id.clone(),
                verdict,
                rounds: 0,
                facts: 0,
                angle_rows: 0,
                ratio_rows: 0,
                length_rows: 0,
                stats: ChainStats::default(),
                elapsed_ms: start.elapsed().as_millis(),
            })
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_problem;

    const SQUARE: &str = r#"{
        "id": "square",
        "points": [
            {"name": "a", "at": [0.0, 0.0]},
            {"name": "b", "at": [1.0, 0.0]},
            {"name": "c", "at": [1.0, 1.0]},
            {"name": "d", "at": [0.0, 1.0]}
        ],
        "premises": [
            {"name": "para", "points": ["a", "b", "c", "d"]},
            {"name": "perp", "points": ["a", "b", "b", "c"]}
        ],
        "goal": {"name": "perp", "points": ["c", "d", "b", "c"]}
    }"#;

    #[test]
    fn test_report_counts_rows() {
        let problem = parse_problem(SQUARE).unwrap();
        let report = solve_problem(&problem, &ForwardChainer::default()).unwrap();
        assert!(report.passed());
        assert_eq!(report.problem_id, "square");
        assert_eq!(report.angle_rows, 2);
        assert_eq!(report.facts, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"]["status"], "proven");
    }

    #[test]
    fn test_undefined_construction_is_a_verdict() {
        let problem = parse_problem(
            r#"{"id": "bad", "points": [
                {"name": "a", "at": [0.0, 0.0]},
                {"name": "b", "at": [1.0, 0.0]},
                {"name": "c", "at": [2.0, 0.0]},
                {"name": "o", "construct": {"circumcenter": ["a", "b", "c"]}}
            ]}"#,
        )
        .unwrap();
        let report = solve_problem(&problem, &ForwardChainer::default()).unwrap();
        assert!(matches!(report.verdict, Verdict::ConstructionError { .. }));
        assert!(!report.passed());
    }
}
