//! Search module - forward chaining to a fixpoint
//!
//! The chainer owns a rule catalogue and a config; `run_problem` wraps one
//! chained run into a serializable report.

pub mod closure;
pub mod run;

pub use closure::{ChainConfig, ChainStats, ForwardChainer, Verdict};
pub use run::{run_problem, solve_problem, RunReport};
