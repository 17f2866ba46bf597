use crate::instrument::name::InstrumentNameExchange;
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Venue trading rules for an instrument.
///
/// Loaded once at connector initialisation and refreshed on reconnect. All order
/// construction must respect these limits before a request reaches the wire.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct SymbolInfo {
    /// Instrument name in the venue's wire format.
    pub name_exchange: InstrumentNameExchange,

    /// Number of decimal places permitted for base asset quantities.
    pub base_precision: u32,

    /// Number of decimal places permitted for quote asset prices.
    pub quote_precision: u32,

    /// Minimum order quantity denominated in the base asset.
    pub min_base_quantity: Decimal,

    /// Minimum order notional denominated in the quote asset.
    pub min_quote_quantity: Decimal,

    /// Maker fee rate as a fraction (eg/ 0.0005 is 5bps).
    pub maker_fee: Decimal,

    /// Taker fee rate as a fraction.
    pub taker_fee: Decimal,

    /// Futures contract lot size in base asset units. `None` for spot venues.
    pub contract_size: Option<Decimal>,

    /// Trading suspended by the venue.
    pub inactive: bool,
}

impl SymbolInfo {
    /// Truncate a base quantity to this instrument's `base_precision`.
    pub fn truncate_base(&self, quantity: Decimal) -> Decimal {
        quantity.trunc_with_scale(self.base_precision)
    }

    /// Round a base quantity down to a whole number of futures contracts.
    ///
    /// Spot instruments (no `contract_size`) are truncated to `base_precision` only.
    pub fn round_to_contracts(&self, quantity: Decimal) -> Decimal {
        match self.contract_size {
            Some(contract_size) if !contract_size.is_zero() => {
                (quantity / contract_size).trunc() * contract_size
            }
            _ => self.truncate_base(quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn symbol_info(contract_size: Option<Decimal>) -> SymbolInfo {
        SymbolInfo {
            name_exchange: InstrumentNameExchange::from("BTC_USDT"),
            base_precision: 4,
            quote_precision: 2,
            min_base_quantity: dec!(0.0001),
            min_quote_quantity: dec!(5),
            maker_fee: dec!(0.0002),
            taker_fee: dec!(0.0005),
            contract_size,
            inactive: false,
        }
    }

    #[test]
    fn test_round_to_contracts() {
        struct TestCase {
            info: SymbolInfo,
            input: Decimal,
            expected: Decimal,
        }

        let tests = vec![
            TestCase {
                // TC0: spot venue truncates to base precision
                info: symbol_info(None),
                input: dec!(1.23456789),
                expected: dec!(1.2345),
            },
            TestCase {
                // TC1: futures venue truncates toward zero to whole contracts
                info: symbol_info(Some(dec!(0.01))),
                input: dec!(1.2345),
                expected: dec!(1.23),
            },
            TestCase {
                // TC2: quantity below one contract rounds to zero
                info: symbol_info(Some(dec!(0.1))),
                input: dec!(0.09),
                expected: dec!(0.0),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                test.info.round_to_contracts(test.input),
                test.expected,
                "TC{index} failed"
            );
        }
    }
}
