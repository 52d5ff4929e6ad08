//! Forward chaining to a fixpoint
//!
//! Each round asks every rule of the catalogue for candidates, drops the
//! ones the oracle rejects, and asserts the rest. A run stops when the goal
//! is verifiable, when a full round changes nothing, or at the round cap.

use crate::error::{DdarError, DdarResult};
use crate::geometry::{Construct, Detect};
use crate::ir::{GeoState, PointId, Predicate, Provenance};
use crate::rules::RuleCatalogue;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Forward chaining configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Stop after this many rounds; `None` runs to the fixpoint
    pub max_rounds: Option<usize>,

    /// Reject premises the oracle finds numerically false
    pub validate_premises: bool,

    /// Evaluate the goal on the diagram before chaining and after proving it
    pub check_goal_numerically: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_rounds: None,
            validate_premises: true,
            check_goal_numerically: true,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Proven { rounds: usize },

    /// `exhausted` is true when the fixpoint was reached, false when the
    /// round cap stopped the run or the goal is numerically false
    NotProven { rounds: usize, exhausted: bool },

    /// Undefined construction or contradictory premises
    ConstructionError { reason: String },
}

impl Verdict {
    pub fn is_proven(&self) -> bool {
        matches!(self, Verdict::Proven { .. })
    }

    pub fn rounds(&self) -> usize {
        match self {
            Verdict::Proven { rounds } | Verdict::NotProven { rounds, .. } => *rounds,
            Verdict::ConstructionError { .. } => 0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Proven { rounds } => write!(f, "proven in {} rounds", rounds),
            Verdict::NotProven { rounds, exhausted: true } => write!(f, "not proven, fixpoint after {} rounds", rounds),
            Verdict::NotProven { rounds, exhausted: false } => write!(f, "not proven, stopped after {} rounds", rounds),
            Verdict::ConstructionError { reason } => write!(f, "construction error: {}", reason),
        }
    }
}

/// Candidate bookkeeping across a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    pub rounds: usize,
    pub proposed: usize,
    /// Numerically false candidates
    pub rejected: usize,
    /// Candidates already implied by the state
    pub already_known: usize,
    pub asserted: usize,
}

/// Forward chainer over a rule catalogue
pub struct ForwardChainer {
    catalogue: RuleCatalogue,
    config: ChainConfig,
}

impl Default for ForwardChainer {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl ForwardChainer {
    /// Chainer over the standard catalogue
    pub fn new(config: ChainConfig) -> Self {
        Self::with_catalogue(RuleCatalogue::standard(), config)
    }

    pub fn with_catalogue(catalogue: RuleCatalogue, config: ChainConfig) -> Self {
        Self { catalogue, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &RuleCatalogue {
        &self.catalogue
    }

    /// Assert the distinctness requirements and premises, then chain.
    ///
    /// Construction faults and contradictions become a `ConstructionError`
    /// verdict; consistency faults are returned as errors.
    pub fn prove(
        &self,
        state: &mut GeoState,
        premises: &[Predicate],
        distinct: &[(PointId, PointId)],
    ) -> DdarResult<(Verdict, ChainStats)> {
        let mut stats = ChainStats::default();
        let outcome = self
            .assert_premises(state, premises, distinct)
            .and_then(|()| self.saturate(state, &mut stats));
        let verdict = match outcome {
            Ok(verdict) => verdict,
            Err(err) if err.is_verdict() => Verdict::ConstructionError {
                reason: err.to_string(),
            },
            Err(err) => return Err(err),
        };
        info!(problem = %state.metadata.problem_id, %verdict, asserted = stats.asserted, "run finished");
        Ok((verdict, stats))
    }

    /// Record distinctness requirements and premises as given facts
    pub fn assert_premises(
        &self,
        state: &mut GeoState,
        premises: &[Predicate],
        distinct: &[(PointId, PointId)],
    ) -> DdarResult<()> {
        for &(a, b) in distinct {
            state.force_distinct(a, b)?;
        }
        for premise in premises {
            if self.config.validate_premises && !state.oracle.evaluate(premise)? {
                return Err(DdarError::Contradiction(format!(
                    "premise `{}` is false on the diagram",
                    premise.describe(&state.symbols)
                )));
            }
            state.force_pred(premise, Provenance::Premise)?;
        }
        debug!(premises = premises.len(), facts = state.num_facts(), "premises asserted");
        Ok(())
    }

    /// Apply the catalogue round by round until the goal holds or nothing changes
    pub fn saturate(&self, state: &mut GeoState, stats: &mut ChainStats) -> DdarResult<Verdict> {
        if let Some(goal) = &state.goal {
            if self.config.check_goal_numerically && !state.oracle.evaluate(&goal.target)? {
                warn!(goal = %goal.target.describe(&state.symbols), "goal is false on the diagram");
                return Ok(Verdict::NotProven {
                    rounds: 0,
                    exhausted: false,
                });
            }
        }
        if self.goal_reached(state)? {
            return Ok(Verdict::Proven { rounds: 0 });
        }

        loop {
            if self.config.max_rounds.is_some_and(|max| stats.rounds >= max) {
                return Ok(Verdict::NotProven {
                    rounds: stats.rounds,
                    exhausted: false,
                });
            }
            stats.rounds += 1;
            let round = stats.rounds;
            let mut changed = false;

            for rule in self.catalogue.iter() {
                let candidates = rule.propose(state)?;
                let (proposed, mut asserted) = (candidates.len(), 0);
                for fact in candidates {
                    if !state.admits(&fact) {
                        stats.rejected += 1;
                        continue;
                    }
                    let provenance = Provenance::Derived { rule: rule.id(), round };
                    if state.assert_fact(fact, provenance)? {
                        asserted += 1;
                    } else {
                        stats.already_known += 1;
                    }
                }
                debug!(rule = rule.id(), round, proposed, asserted, "applied rule");
                stats.proposed += proposed;
                stats.asserted += asserted;
                changed |= asserted > 0;
            }

            if self.goal_reached(state)? {
                return Ok(Verdict::Proven { rounds: round });
            }
            if !changed {
                return Ok(Verdict::NotProven {
                    rounds: round,
                    exhausted: true,
                });
            }
        }
    }

    /// The goal holds symbolically; the oracle must agree
    fn goal_reached(&self, state: &GeoState) -> DdarResult<bool> {
        let Some(goal) = &state.goal else {
            return Ok(false);
        };
        if !state.is_goal_satisfied()? {
            return Ok(false);
        }
        if self.config.check_goal_numerically && !state.oracle.evaluate(&goal.target)? {
            let expr = goal.target.describe(&state.symbols);
            error!(goal = %expr, "tables prove a goal the diagram refutes");
            return Err(DdarError::ConsistencyFault {
                domain: "goal",
                expr,
                residual: f64::NAN,
            });
        }
        Ok(true)
    }
}
