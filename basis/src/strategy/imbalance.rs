use crate::strategy::position::PositionsState;
use basis_instrument::{Side, exchange::ExchangeRole};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A corrective order intent that drives `delta_usdt` toward zero.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct CorrectionIntent {
    pub role: ExchangeRole,
    pub side: Side,
    pub quantity: Decimal,
}

/// Determine the corrective order (if any) for the current positions.
///
/// Returns at most one intent per invocation - the caller submits at most one corrective
/// order per tick per venue. The correction quantity equals the absolute imbalance, so a
/// filled correction can never amplify `|delta|`.
///
/// No intent is produced while `|delta_usdt|` is below `min_quote_quantity`, since the
/// venue would reject the order anyway.
pub fn imbalance_correction(
    positions: &PositionsState,
    mark_price: Decimal,
    min_quote_quantity: Decimal,
) -> Option<CorrectionIntent> {
    let delta = positions.delta();
    let delta_usdt = delta * mark_price;

    if delta_usdt.abs() < min_quote_quantity {
        return None;
    }

    // Correct on the leg carrying the excess exposure: the most positive leg is sold
    // down, the most negative leg is bought back
    let (role, side) = if delta > Decimal::ZERO {
        let role = [ExchangeRole::Spot, ExchangeRole::Futures]
            .into_iter()
            .max_by_key(|role| positions.signed_quantity(*role))?;
        (role, Side::Sell)
    } else {
        let role = [ExchangeRole::Spot, ExchangeRole::Futures]
            .into_iter()
            .min_by_key(|role| positions.signed_quantity(*role))?;
        (role, Side::Buy)
    };

    Some(CorrectionIntent {
        role,
        side,
        quantity: delta.abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn positions(spot_signed: Decimal, futures_signed: Decimal) -> PositionsState {
        let mut state = PositionsState::default();
        if !spot_signed.is_zero() {
            let side = if spot_signed > Decimal::ZERO {
                Side::Buy
            } else {
                Side::Sell
            };
            state.apply_fill(ExchangeRole::Spot, side, spot_signed.abs(), dec!(100));
        }
        if !futures_signed.is_zero() {
            let side = if futures_signed > Decimal::ZERO {
                Side::Buy
            } else {
                Side::Sell
            };
            state.apply_fill(ExchangeRole::Futures, side, futures_signed.abs(), dec!(100));
        }
        state
    }

    #[test]
    fn test_imbalance_correction() {
        struct TestCase {
            positions: PositionsState,
            mark_price: Decimal,
            min_quote: Decimal,
            expected: Option<CorrectionIntent>,
        }

        let tests = vec![
            TestCase {
                // TC0: balanced pair needs no correction
                positions: positions(dec!(5), dec!(-5)),
                mark_price: dec!(100),
                min_quote: dec!(5),
                expected: None,
            },
            TestCase {
                // TC1: spot leg overfilled (+2 base, +200 quote) - sell the excess on spot
                positions: positions(dec!(5), dec!(-3)),
                mark_price: dec!(100),
                min_quote: dec!(5),
                expected: Some(CorrectionIntent {
                    role: ExchangeRole::Spot,
                    side: Side::Sell,
                    quantity: dec!(2),
                }),
            },
            TestCase {
                // TC2: futures leg overfilled short - buy it back
                positions: positions(dec!(3), dec!(-5)),
                mark_price: dec!(100),
                min_quote: dec!(5),
                expected: Some(CorrectionIntent {
                    role: ExchangeRole::Futures,
                    side: Side::Buy,
                    quantity: dec!(2),
                }),
            },
            TestCase {
                // TC3: imbalance below the venue minimum is left alone
                positions: positions(dec!(5), dec!(-4.96)),
                mark_price: dec!(100),
                min_quote: dec!(5),
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                imbalance_correction(&test.positions, test.mark_price, test.min_quote),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_correction_never_amplifies_delta() {
        // A filled correction applied to the positions must reduce |delta|
        let mut state = positions(dec!(5), dec!(-3));
        let before = state.delta().abs();

        let intent = imbalance_correction(&state, dec!(100), dec!(5)).unwrap();
        state.apply_fill(intent.role, intent.side, intent.quantity, dec!(100));

        assert!(state.delta().abs() < before);
        assert_eq!(state.delta(), Decimal::ZERO);
    }
}
