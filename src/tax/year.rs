use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Serialize, Serializer};

use crate::tax::wash::BlockedStatus;

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format("%d-%m-%Y").to_string())
}

fn serialize_opt_date<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => serialize_date(d, serializer),
        None => serializer.serialize_none(),
    }
}

/// One reported acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Purchase {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub product: String,
    pub isin: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub fee: Decimal,
}

/// Fiscal result of one disposal.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Disposal {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub product: String,
    pub isin: String,
    /// Sold quantity, positive.
    pub quantity: Decimal,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub pnl: Decimal,
    /// The lot book ran dry while matching this disposal.
    pub warning: bool,
    /// Corporate-action label, prefixed with the blocked marker when the
    /// loss falls under the two-month rule.
    pub note: String,
    pub blocked: bool,
    pub blocked_status: BlockedStatus,
    #[serde(serialize_with = "serialize_opt_date")]
    pub unlock_date: Option<NaiveDate>,
    pub wash_sale_risk: bool,
    pub loss_consolidated: bool,
    #[serde(serialize_with = "serialize_opt_date")]
    pub safe_repurchase_date: Option<NaiveDate>,
}

/// One aggregated dividend payment.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Dividend {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub product: String,
    pub isin: String,
    pub currency: String,
    pub gross: Decimal,
    pub withholding: Decimal,
    pub net: Decimal,
}

/// One open position in an end-of-year snapshot, valued at cost.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Position {
    pub name: String,
    pub isin: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub total_cost: Decimal,
}

/// Everything computed for one fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct YearStats {
    pub year: i32,
    pub disposals: Vec<Disposal>,
    pub purchases: Vec<Purchase>,
    pub dividends: Vec<Dividend>,
    /// End-of-year open positions.
    pub portfolio: Vec<Position>,
    /// Sum of the snapshot's total costs.
    pub portfolio_value: Decimal,
    /// P&L excluding blocked losses.
    pub fiscal_pnl: Decimal,
    /// P&L over all disposals, blocked or not.
    pub real_pnl: Decimal,
    pub trading_fees: Decimal,
    pub connectivity_fees: Decimal,
    pub wins: u32,
    pub losses: u32,
    /// Sum of |P&L| over blocked disposals.
    pub blocked_loss: Decimal,
}

impl YearStats {
    pub fn new(year: i32) -> Self {
        YearStats {
            year,
            ..Default::default()
        }
    }

    pub fn dividends_net(&self) -> Decimal {
        self.dividends.iter().map(|d| d.net).sum()
    }

    pub fn total_fees(&self) -> Decimal {
        self.trading_fees + self.connectivity_fees
    }

    pub fn has_activity(&self) -> bool {
        !self.disposals.is_empty()
            || !self.purchases.is_empty()
            || !self.dividends.is_empty()
            || !self.portfolio.is_empty()
            || self.connectivity_fees > Decimal::ZERO
    }
}
