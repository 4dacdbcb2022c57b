//! Property tests for driver and portfolio invariants.
//!
//! Uses proptest to verify:
//! 1. Accounting identity: every snapshot's total equals cash plus positions at the step's price
//! 2. One snapshot per market event, one fill per accepted order
//! 3. Deterministic replay: identical inputs give identical histories
//! 4. Fill application moves cash and position by exactly the fill's amounts
//! 5. Drawdown series is the distance to the running high-water mark
//! 6. Sharpe ratio is invariant to scaling returns

mod common;

use common::{source, ScriptedStrategy};
use eventide_core::domain::{Direction, FillEvent, OrderSide};
use eventide_core::execution::{SimulatedExecutionHandler, TieredFees};
use eventide_core::portfolio::{FixedQuantitySizing, Portfolio};
use eventide_core::risk::{drawdowns, sharpe_ratio, Period};
use eventide_core::{Backtest, BacktestReport};
use proptest::prelude::*;

const CAPITAL: f64 = 100_000.0;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0),
        1..40,
    )
}

fn arb_direction() -> impl Strategy<Value = Option<Direction>> {
    prop_oneof![
        3 => Just(None),
        1 => Just(Some(Direction::Long)),
        1 => Just(Some(Direction::Short)),
        1 => Just(Some(Direction::Exit)),
    ]
}

/// Prices plus one optional signal per step.
fn arb_script() -> impl Strategy<Value = (Vec<f64>, Vec<Option<Direction>>)> {
    arb_closes().prop_flat_map(|closes| {
        let n = closes.len();
        (Just(closes), prop::collection::vec(arb_direction(), n))
    })
}

fn arb_side() -> impl Strategy<Value = OrderSide> {
    prop_oneof![Just(OrderSide::Buy), Just(OrderSide::Sell)]
}

fn run(closes: &[f64], steps: &[Option<Direction>], quantity: u64) -> BacktestReport {
    Backtest::builder()
        .data_source(source("X", closes))
        .strategy(ScriptedStrategy::from_steps("X", steps))
        .execution(SimulatedExecutionHandler::new(
            "SIM",
            Box::new(TieredFees::default()),
        ))
        .sizing(FixedQuantitySizing::new(quantity).unwrap())
        .initial_capital(CAPITAL)
        .build()
        .unwrap()
        .run()
        .unwrap()
}

// ── 1 & 2. Accounting and counts ─────────────────────────────────────

proptest! {
    #[test]
    fn snapshots_balance_at_step_prices(
        (closes, steps) in arb_script(),
        quantity in 1u64..200,
    ) {
        let report = run(&closes, &steps, quantity);

        prop_assert_eq!(report.holdings_history.len(), closes.len());
        prop_assert_eq!(report.positions_history.len(), closes.len());
        prop_assert_eq!(report.counts.markets, closes.len());
        prop_assert_eq!(report.counts.fills, report.counts.orders);

        for ((holdings, positions), close) in report
            .holdings_history
            .iter()
            .zip(&report.positions_history)
            .zip(&closes)
        {
            prop_assert_eq!(holdings.timestamp, positions.timestamp);
            let held = positions.positions.get("X").unwrap();
            let expected = holdings.cash + held as f64 * close;
            prop_assert!((holdings.total - expected).abs() < 1e-6);
            prop_assert!(holdings.is_balanced(1e-6));
        }
    }

    /// Fixed sizing never pyramids: a position is flat or exactly one lot.
    #[test]
    fn fixed_sizing_never_exceeds_one_lot(
        (closes, steps) in arb_script(),
        quantity in 1u64..200,
    ) {
        let report = run(&closes, &steps, quantity);
        for snapshot in &report.positions_history {
            let held = snapshot.positions.get("X").unwrap();
            prop_assert!(held.unsigned_abs() == 0 || held.unsigned_abs() == quantity);
        }
    }
}

// ── 3. Deterministic replay ──────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replay_is_deterministic((closes, steps) in arb_script()) {
        let first = run(&closes, &steps, 10);
        let second = run(&closes, &steps, 10);

        prop_assert_eq!(first.counts, second.counts);
        prop_assert_eq!(&first.positions_history, &second.positions_history);
        prop_assert_eq!(&first.holdings_history, &second.holdings_history);
        prop_assert_eq!(
            first.equity_curve.fingerprint(),
            second.equity_curve.fingerprint()
        );
    }
}

// ── 4. Fill application ──────────────────────────────────────────────

proptest! {
    #[test]
    fn fill_moves_cash_and_position_exactly(
        quantity in 1u64..10_000,
        price in 0.01..1_000.0_f64,
        commission in 0.0..50.0_f64,
        side in arb_side(),
    ) {
        let sizing = Box::new(FixedQuantitySizing::new(1).unwrap());
        let mut portfolio = Portfolio::new(vec!["X".into()], CAPITAL, sizing).unwrap();
        let fill = FillEvent {
            timestamp: common::day(0),
            symbol: "X".into(),
            venue: "SIM".into(),
            quantity,
            side,
            fill_price: price,
            commission,
        };
        portfolio.update_fill(&fill).unwrap();

        let sign = side.sign() as f64;
        let expected_cash = CAPITAL - sign * price * quantity as f64 - commission;
        prop_assert!((portfolio.current_holdings().cash - expected_cash).abs() < 1e-6);
        prop_assert_eq!(portfolio.current_holdings().commission, commission);
        prop_assert_eq!(portfolio.position("X"), side.signed(quantity));
        // Fills never write history.
        prop_assert!(portfolio.holdings_history().is_empty());
    }
}

// ── 5. Drawdowns ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_is_distance_to_high_water_mark(
        equity in prop::collection::vec(0.1..10.0_f64, 1..100),
    ) {
        let dd = drawdowns(&equity);
        prop_assert_eq!(dd.series.len(), equity.len());
        prop_assert_eq!(dd.durations.len(), equity.len());

        let mut hwm = f64::NEG_INFINITY;
        for (i, &value) in equity.iter().enumerate() {
            hwm = hwm.max(value);
            prop_assert!(dd.series[i] >= 0.0);
            prop_assert!((dd.series[i] - (hwm - value)).abs() < 1e-12);
            prop_assert_eq!(dd.durations[i] == 0, dd.series[i] == 0.0);
            if i > 0 && dd.durations[i] > 0 {
                prop_assert_eq!(dd.durations[i], dd.durations[i - 1] + 1);
            }
        }
        prop_assert!(dd.max_drawdown <= hwm);
        prop_assert_eq!(dd.max_duration, *dd.durations.iter().max().unwrap());
    }
}

// ── 6. Sharpe ratio ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn sharpe_is_scale_invariant(
        returns in prop::collection::vec(-0.05..0.05_f64, 2..60),
        scale in 0.5..4.0_f64,
    ) {
        let scaled: Vec<f64> = returns.iter().map(|r| r * scale).collect();
        match (sharpe_ratio(&returns, Period::Day), sharpe_ratio(&scaled, Period::Day)) {
            (Ok(a), Ok(b)) => prop_assert!((a - b).abs() < 1e-6 * a.abs().max(1.0)),
            (Err(_), _) | (_, Err(_)) => {}
        }
    }
}
