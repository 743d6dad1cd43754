use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::events::CashEvent;
use crate::tax::year::Dividend;

/// Gross below this is ledger noise, not a dividend.
const GROSS_EPSILON: Decimal = dec!(0.01);

/// Cash rows bucketed by year.
#[derive(Debug, Default)]
pub struct CashSummary {
    pub dividends: Vec<(i32, Dividend)>,
    pub connectivity_fees: BTreeMap<i32, Decimal>,
}

#[derive(Debug, Default)]
struct Accum {
    gross: Decimal,
    withholding: Decimal,
}

type DividendKey = (i32, NaiveDate, String, String, String);

/// Pair gross dividend credits with their separately-reported withholdings
/// and pick up connectivity fees along the way.
///
/// Gross and withholding arrive as separate ledger rows sharing date, ISIN,
/// product and currency; the withholding row's description carries
/// "Retención". One record per key is emitted once all rows are seen, so
/// ordering between the two rows never matters.
pub fn summarize_cash(cash: &[CashEvent]) -> CashSummary {
    let mut buckets: BTreeMap<DividendKey, Accum> = BTreeMap::new();
    let mut summary = CashSummary::default();

    for row in cash {
        let desc = &row.description;
        let lower = desc.to_lowercase();

        if lower.contains("conectividad") {
            *summary
                .connectivity_fees
                .entry(row.year())
                .or_insert(Decimal::ZERO) += row.amount.abs();
            continue;
        }

        let is_dividend_row =
            desc.contains("Dividendo") || (desc.contains("Retención") && lower.contains("dividendo"));
        if !is_dividend_row {
            continue;
        }

        let key = (
            row.year(),
            row.date,
            row.isin.clone(),
            row.product.clone(),
            row.currency.clone(),
        );
        let accum = buckets.entry(key).or_default();
        if desc.contains("Retención") {
            accum.withholding += row.amount.abs();
        } else {
            accum.gross += row.amount;
        }
    }

    for ((year, date, isin, product, currency), accum) in buckets {
        if accum.gross > GROSS_EPSILON {
            let net = (accum.gross - accum.withholding).max(Decimal::ZERO);
            summary.dividends.push((
                year,
                Dividend {
                    date,
                    product,
                    isin,
                    currency,
                    gross: accum.gross,
                    withholding: accum.withholding,
                    net,
                },
            ));
        }
    }
    summary
}
