use rust_decimal::Decimal;

/// Net P&L of unwinding a delta-neutral position at the provided exit quotes, in percent
/// of the spot entry cost, with taker fees applied to all four executions.
///
/// Entry legs: buy spot at `entry_spot_px`, sell futures at `entry_futures_px`.
/// Exit legs: sell spot into `spot_bid`, buy futures back at `futures_ask`.
pub fn exit_net_pnl_pct(
    entry_spot_px: Decimal,
    entry_futures_px: Decimal,
    spot_bid: Decimal,
    futures_ask: Decimal,
    spot_fee: Decimal,
    futures_fee: Decimal,
) -> Decimal {
    let spot_entry_cost = entry_spot_px * (Decimal::ONE + spot_fee);
    let futures_entry_credit = entry_futures_px * (Decimal::ONE - futures_fee);
    let spot_exit_credit = spot_bid * (Decimal::ONE - spot_fee);
    let futures_exit_cost = futures_ask * (Decimal::ONE + futures_fee);

    ((spot_exit_credit - spot_entry_cost) + (futures_entry_credit - futures_exit_cost))
        / spot_entry_cost
        * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exit_net_pnl_pct_profitable_unwind() {
        // Entry: buy spot 100.00, sell futures 100.80. Exit quotes: spot bid 100.50,
        // futures ask 100.20. Taker 5bps on every execution.
        let pnl_pct = exit_net_pnl_pct(
            dec!(100.00),
            dec!(100.80),
            dec!(100.50),
            dec!(100.20),
            dec!(0.0005),
            dec!(0.0005),
        );

        // Clears a 0.1% take-profit threshold comfortably
        assert!(pnl_pct > dec!(0.1), "pnl_pct = {pnl_pct}");
        assert!(pnl_pct < dec!(1.0), "pnl_pct = {pnl_pct}");
    }

    #[test]
    fn test_exit_net_pnl_pct_zero_without_fees_or_movement() {
        let pnl_pct = exit_net_pnl_pct(
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(100),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(pnl_pct, Decimal::ZERO);
    }

    #[test]
    fn test_exit_net_pnl_pct_fees_erode_a_flat_unwind() {
        // No price movement: four taker executions at 5bps each are pure cost
        let pnl_pct = exit_net_pnl_pct(
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(0.0005),
            dec!(0.0005),
        );

        assert!(pnl_pct < Decimal::ZERO);
    }

    #[test]
    fn test_exit_net_pnl_pct_basis_convergence_is_profit() {
        // Entered at a +80bps basis (futures above spot); exiting after full convergence
        // captures the basis minus fees
        let converged = exit_net_pnl_pct(
            dec!(100.00),
            dec!(100.80),
            dec!(100.00),
            dec!(100.00),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(converged, dec!(0.8));
    }
}
