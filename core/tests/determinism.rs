//! Runs are deterministic, independent of rule order, and thread-safe

use ddar_core::*;
use std::path::PathBuf;

fn problems() -> Vec<GeometryProblem> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/problems");
    load_problems(dir)
        .expect("fixtures load")
        .into_iter()
        .map(|(_, p)| p)
        .collect()
}

/// Everything in a report except wall-clock time
fn fingerprint(report: &RunReport) -> (Verdict, usize, usize, usize, usize) {
    (
        report.verdict.clone(),
        report.facts,
        report.angle_rows,
        report.ratio_rows,
        report.length_rows,
    )
}

#[test]
fn test_repeated_runs_agree() {
    let chainer = ForwardChainer::default();
    for problem in problems() {
        let first = solve_problem(&problem, &chainer).unwrap();
        let second = solve_problem(&problem, &chainer).unwrap();
        assert_eq!(fingerprint(&first), fingerprint(&second), "{}", problem.id);
        assert_eq!(first.stats, second.stats, "{}", problem.id);
    }
}

#[test]
fn test_reversed_rule_order_reaches_same_verdicts() {
    let forward = ForwardChainer::default();
    let backward = ForwardChainer::with_catalogue(RuleCatalogue::standard().reversed(), ChainConfig::default());
    for problem in problems() {
        let a = solve_problem(&problem, &forward).unwrap();
        let b = solve_problem(&problem, &backward).unwrap();
        assert_eq!(a.passed(), b.passed(), "{}", problem.id);
        assert_eq!(
            std::mem::discriminant(&a.verdict),
            std::mem::discriminant(&b.verdict),
            "{}",
            problem.id
        );
    }
}

#[test]
fn test_runs_on_separate_threads() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<GeoState>();
    assert_send::<RunReport>();
    assert_sync::<ForwardChainer>();

    let chainer = ForwardChainer::default();
    let problems = problems();
    let sequential: Vec<_> = problems
        .iter()
        .map(|p| fingerprint(&solve_problem(p, &chainer).unwrap()))
        .collect();
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = problems
            .iter()
            .map(|p| {
                let chainer = &chainer;
                scope.spawn(move || fingerprint(&solve_problem(p, chainer).unwrap()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sequential, parallel);
}

#[test]
fn test_round_cap_stops_midline_early() {
    let problem = problems().into_iter().find(|p| p.id == "p04_midline").unwrap();
    let capped = ForwardChainer::new(ChainConfig {
        max_rounds: Some(1),
        ..ChainConfig::default()
    });
    let report = solve_problem(&problem, &capped).unwrap();
    assert!(matches!(
        report.verdict,
        Verdict::NotProven { rounds: 1, exhausted: false } | Verdict::Proven { rounds: 1 }
    ));
}

/// Tables, live objects and point classes of a state
#[derive(Debug, PartialEq)]
struct Snapshot {
    rows: Vec<(algebra::Term, algebra::LinComb)>,
    lines: Vec<(LineId, Vec<PointId>)>,
    circles: Vec<(CircleId, Vec<PointId>, Vec<PointId>)>,
    reps: Vec<PointId>,
    facts: usize,
}

fn snapshot(state: &GeoState) -> Snapshot {
    let rows = state
        .angles
        .rows()
        .chain(state.ratios.rows())
        .chain(state.lengths.rows())
        .map(|(term, row)| (*term, row.clone()))
        .collect();
    Snapshot {
        rows,
        lines: state.registry.live_lines().map(|(id, l)| (id, l.points.clone())).collect(),
        circles: state
            .registry
            .live_circles()
            .map(|(id, c)| (id, c.points.clone(), c.centers.clone()))
            .collect(),
        reps: (0..state.registry.num_points() as u32)
            .map(|i| state.registry.point_rep(PointId(i)))
            .collect(),
        facts: state.facts.len(),
    }
}

#[test]
fn test_saturated_state_absorbs_known_facts() {
    let problem = problems().into_iter().find(|p| p.id == "p04_midline").unwrap();
    let ResolvedProblem {
        mut state,
        premises,
        distinct,
    } = problem.resolve().unwrap();
    let goal = state.goal.take().unwrap().target;

    let chainer = ForwardChainer::default();
    let (verdict, _) = chainer.prove(&mut state, &premises, &distinct).unwrap();
    assert!(matches!(verdict, Verdict::NotProven { exhausted: true, .. }));
    assert!(state.check_pred(&goal).unwrap());
    let before = snapshot(&state);

    let derived = Provenance::Derived { rule: "replay", round: 0 };
    assert!(!state.force_pred(&goal, derived).unwrap());
    for fact_type in [
        FactType::Collinear,
        FactType::Concyclic,
        FactType::Similar,
        FactType::SamePoint,
        FactType::AngleZero,
        FactType::RatioZero,
        FactType::LengthZero,
    ] {
        let known = state.facts.facts_of_type(fact_type).to_vec();
        for fact in known {
            assert!(!state.assert_fact(fact.clone(), derived).unwrap(), "{}", fact);
        }
    }
    assert_eq!(snapshot(&state), before);

    let mut stats = ChainStats::default();
    chainer.saturate(&mut state, &mut stats).unwrap();
    assert_eq!(stats.asserted, 0);
    assert_eq!(snapshot(&state), before);
}
