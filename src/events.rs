use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// One normalized row of the trade ledger.
///
/// Quantity is signed (positive = acquisition, negative = disposal) and the
/// total follows the cash direction: negative on buys, positive on sells.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub date: NaiveDate,
    /// Intraday time string, used only as a sort tiebreaker within a day.
    pub time: String,
    pub isin: String,
    pub product: String,
    pub quantity: Decimal,
    pub total_eur: Decimal,
    pub fee_eur: Decimal,
    /// Stable insertion index, assigned after the chronological sort.
    pub index: usize,
}

impl TradeEvent {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn is_acquisition(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

/// One normalized row of the cash-account ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CashEvent {
    pub date: NaiveDate,
    /// May be empty for account-level rows (fees, deposits).
    pub isin: String,
    pub product: String,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
}

impl CashEvent {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
