//! Two-month anti-application rule ("regla anti-aplicación").
//!
//! A realized loss is blocked for tax purposes when the same security is
//! acquired within two months (62 days each side) of the loss-taking
//! disposal. Whether an in-window row counts as before or after the
//! disposal is decided by the stable insertion index, never by the date:
//! same-day rows are only ordered by their position in the sorted stream.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::Serialize;

/// Window half-width on each side of the disposal.
pub const WINDOW_DAYS: i64 = 62;

/// In-window net quantity flow above this blocks the loss (condition c).
const NET_FLOW_EPSILON: Decimal = dec!(0.001);

/// Minimal view of a same-ISIN trade row used by the window scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRef {
    pub index: usize,
    pub date: NaiveDate,
    pub quantity: Decimal,
}

/// Lifecycle of a blocked loss relative to the report date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlockedStatus {
    #[default]
    None,
    /// Still inside the repurchase window; the loss cannot be declared yet.
    Active,
    /// The window has elapsed since the blocking was triggered.
    Released,
}

/// Per-disposal tax classification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaxStatus {
    pub blocked: bool,
    pub status: BlockedStatus,
    pub unlock_date: Option<NaiveDate>,
    /// Loss is recent and a repurchase would still block it.
    pub wash_sale_risk: bool,
    /// Loss is old enough that no repurchase can block it anymore.
    pub loss_consolidated: bool,
    pub safe_repurchase_date: Option<NaiveDate>,
}

/// Classify one disposal.
///
/// `history` holds every trade row of the disposal's ISIN in chronological
/// order; `disposal_index` is the disposal row's own insertion index;
/// `oldest_lot` is the acquisition date of the oldest lot FIFO touched
/// (absent when the book ran dry before touching any); `today` decides the
/// active/released and risk/consolidated splits.
pub fn analyze(
    history: &[TradeRef],
    disposal_index: usize,
    pnl: Decimal,
    sale_date: NaiveDate,
    oldest_lot: Option<NaiveDate>,
    today: NaiveDate,
) -> TaxStatus {
    if pnl >= Decimal::ZERO {
        return TaxStatus::default();
    }

    let window_start = sale_date - Duration::days(WINDOW_DAYS);
    let window_end = sale_date + Duration::days(WINDOW_DAYS);
    let window: Vec<&TradeRef> = history
        .iter()
        .filter(|t| t.date >= window_start && t.date <= window_end)
        .collect();

    let blocked = is_blocked(&window, disposal_index, window_start, oldest_lot);
    if blocked {
        log::debug!(
            "loss of {pnl} on {sale_date} (row {disposal_index}) blocked by repurchase window"
        );
    }

    let safe_date = sale_date + Duration::days(WINDOW_DAYS);
    let status = match (blocked, today < safe_date) {
        (true, true) => BlockedStatus::Active,
        (true, false) => BlockedStatus::Released,
        (false, _) => BlockedStatus::None,
    };

    TaxStatus {
        blocked,
        status,
        unlock_date: blocked.then_some(safe_date),
        wash_sale_risk: !blocked && today < safe_date,
        loss_consolidated: !blocked && today >= safe_date,
        safe_repurchase_date: Some(safe_date),
    }
}

fn is_blocked(
    window: &[&TradeRef],
    disposal_index: usize,
    window_start: NaiveDate,
    oldest_lot: Option<NaiveDate>,
) -> bool {
    // (a) An acquisition strictly after the sale, still inside the window.
    if window
        .iter()
        .any(|t| t.index > disposal_index && t.quantity > Decimal::ZERO)
    {
        return true;
    }

    // (b) FIFO reached back to pre-window shares while a replacement
    // purchase inside the window was already on the books at sale time.
    if let Some(oldest) = oldest_lot {
        if oldest < window_start
            && window
                .iter()
                .any(|t| t.index <= disposal_index && t.quantity > Decimal::ZERO)
        {
            return true;
        }
    }

    // (c) Net quantity flow up to and including the sale is still positive:
    // the position was being built up through the loss-taking disposal.
    let bought: Decimal = window
        .iter()
        .filter(|t| t.index <= disposal_index && t.quantity > Decimal::ZERO)
        .map(|t| t.quantity)
        .sum();
    let sold: Decimal = window
        .iter()
        .filter(|t| t.index <= disposal_index && t.quantity < Decimal::ZERO)
        .map(|t| t.quantity.abs())
        .sum();
    bought - sold > NET_FLOW_EPSILON
}
