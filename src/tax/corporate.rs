use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::events::CashEvent;

/// Days searched on each side of a takeover disposal for its cash leg.
const TAKEOVER_CASH_WINDOW_DAYS: i64 = 10;

/// Proceeds below this are a nominal placeholder, not a real sale.
const DEGENERATE_PROCEEDS: Decimal = dec!(0.1);

/// Corporate-action tag attached to a disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorporateEvent {
    /// Plain market sale.
    #[default]
    Ordinary,
    /// Subscription rights; cost basis is forced to zero.
    Rights,
    /// Takeover or merger; real cash may sit in the account ledger.
    Takeover,
    /// Share exchange or split, reported as a nominal disposal.
    Exchange,
}

impl CorporateEvent {
    /// Label used in report notes. Ordinary sales carry no note.
    pub fn label(&self) -> &'static str {
        match self {
            CorporateEvent::Ordinary => "",
            CorporateEvent::Rights => "DERECHOS",
            CorporateEvent::Takeover => "OPA/FUSIÓN",
            CorporateEvent::Exchange => "CANJE/SPLIT",
        }
    }
}

/// Classify a disposal from its product name and proceeds; takeovers get
/// their proceeds rewritten to the discovered cash leg when one exists.
///
/// First match wins, case-insensitive on the product name.
pub fn classify(
    product: &str,
    isin: &str,
    date: NaiveDate,
    proceeds: Decimal,
    cash: &[CashEvent],
) -> (CorporateEvent, Decimal) {
    let name = product.to_uppercase();

    if name.contains("RTS") || name.contains("DERECHO") {
        return (CorporateEvent::Rights, proceeds);
    }
    if name.contains("OPA") || name.contains("FUSION") {
        let found = takeover_cash(cash, isin, date);
        let proceeds = if found > Decimal::ZERO { found } else { proceeds };
        return (CorporateEvent::Takeover, proceeds);
    }
    if name.contains("CANJE") || name.contains("SPLIT") {
        return (CorporateEvent::Exchange, proceeds);
    }
    if proceeds.abs() < DEGENERATE_PROCEEDS {
        return (CorporateEvent::Exchange, proceeds);
    }
    (CorporateEvent::Ordinary, proceeds)
}

/// Sum of positive same-ISIN cash movements within ±10 days of the trade.
fn takeover_cash(cash: &[CashEvent], isin: &str, date: NaiveDate) -> Decimal {
    let start = date - Duration::days(TAKEOVER_CASH_WINDOW_DAYS);
    let end = date + Duration::days(TAKEOVER_CASH_WINDOW_DAYS);
    cash.iter()
        .filter(|c| c.isin == isin && c.date >= start && c.date <= end && c.amount > Decimal::ZERO)
        .map(|c| c.amount)
        .sum()
}
