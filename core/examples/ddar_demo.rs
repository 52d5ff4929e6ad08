//! Demonstration of a deduction run
//!
//! Run with: cargo run --example ddar_demo

use ddar_core::*;

fn main() -> Result<(), DdarError> {
    println!("=== DDAR Demo ===\n");

    // 1. Diagram: a triangle and the midpoints of two sides
    println!("1. Construct points:");
    let names = ["a", "b", "c", "m", "n"];
    let steps = vec![
        Construction::Free { x: 0.1, y: 0.2 },
        Construction::Free { x: 3.7, y: 0.4 },
        Construction::Free { x: 1.3, y: 2.9 },
        Construction::Midpoint(PointId(0), PointId(1)),
        Construction::Midpoint(PointId(0), PointId(2)),
    ];
    let oracle = Oracle::from_constructions(&steps, names.iter().map(|s| s.to_string()).collect())?;
    let mut symbols = SymbolTable::new();
    for name in names {
        let p = symbols.get_or_intern_point(name);
        let at = oracle.coord(p);
        println!("   {} = ({:.3}, {:.3})", name, at.x, at.y);
    }
    println!();

    // 2. State: one direction, log-length and length symbol per pair
    let [a, b, c, m, n] = [0, 1, 2, 3, 4].map(PointId);
    let goal = Predicate::Parallel([m, n, b, c]);
    let mut state = GeoState::new(symbols, oracle)
        .with_goal(Goal::single(goal.clone()))
        .with_metadata(Metadata::new("midline"));
    println!("2. Seeded state:");
    println!("   Lines: {}", state.registry.live_lines().count());
    println!("   Angle symbols: {}\n", state.angles.num_symbols());

    // 3. Chain
    let premises = [
        Predicate::Midpoint { mid: m, a, b },
        Predicate::Midpoint { mid: n, a, b: c },
    ];
    let (verdict, stats) = ForwardChainer::default().prove(&mut state, &premises, &[(a, b), (a, c)])?;
    println!("3. Goal `{}`:", goal.describe(&state.symbols));
    println!("   Verdict: {}", verdict);
    println!(
        "   Candidates: {} proposed, {} rejected, {} asserted",
        stats.proposed, stats.rejected, stats.asserted
    );
    println!(
        "   Rows: {} angle, {} ratio, {} length",
        state.angles.len(),
        state.ratios.len(),
        state.lengths.len()
    );

    Ok(())
}
