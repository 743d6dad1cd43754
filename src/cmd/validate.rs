//! Validate command - surface ledger quality issues without a full report

use std::collections::BTreeMap;

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::cmd::report::{format_eur, format_qty};
use crate::cmd::LedgerArgs;
use crate::tax::lots::LOT_EPSILON;
use crate::tax::TaxReport;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    ledgers: LedgerArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: &'static str,
    subject: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let report = self.ledgers.load()?;
        let issues = collect_issues(&report);

        if self.json {
            let output = ValidationOutput {
                issue_count: issues.len(),
                issues: issues.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&issues);
        }

        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn collect_issues(report: &TaxReport) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for stats in report.years.values() {
        for d in &stats.disposals {
            if d.warning {
                issues.push(ValidationIssue {
                    issue_type: "InsufficientLots",
                    subject: format!("{} {} {}", d.date.format("%d-%m-%Y"), d.isin, d.product),
                    message: format!(
                        "sold {} with not enough open lots; cost basis kept at {}",
                        format_qty(d.quantity),
                        format_eur(d.cost_basis)
                    ),
                });
            }
            if d.note.contains("OPA/FUSIÓN") && d.proceeds.abs() < dec!(0.1) {
                issues.push(ValidationIssue {
                    issue_type: "TakeoverWithoutCash",
                    subject: format!("{} {} {}", d.date.format("%d-%m-%Y"), d.isin, d.product),
                    message: "no cash credit found within ±10 days; proceeds kept at the ledger value"
                        .to_string(),
                });
            }
        }

        // Fiscal identity: the fiscal P&L must be the real P&L with the
        // blocked losses added back.
        let fiscal: Decimal = stats
            .disposals
            .iter()
            .filter(|d| !d.blocked)
            .map(|d| d.pnl)
            .sum();
        let real: Decimal = stats.disposals.iter().map(|d| d.pnl).sum();
        if fiscal != stats.fiscal_pnl || real != stats.real_pnl {
            issues.push(ValidationIssue {
                issue_type: "FiscalIdentity",
                subject: stats.year.to_string(),
                message: format!(
                    "year totals disagree with the disposal list: fiscal {} vs {}, real {} vs {}",
                    format_eur(stats.fiscal_pnl),
                    format_eur(fiscal),
                    format_eur(stats.real_pnl),
                    format_eur(real)
                ),
            });
        }
    }

    issues.extend(conservation_issues(report));
    issues
}

/// Per-ISIN share conservation against the terminal snapshot:
/// bought minus sold must equal what is still open.
fn conservation_issues(report: &TaxReport) -> Vec<ValidationIssue> {
    let mut net: BTreeMap<String, Decimal> = BTreeMap::new();
    for stats in report.years.values() {
        for p in &stats.purchases {
            *net.entry(p.isin.clone()).or_insert(Decimal::ZERO) += p.quantity;
        }
        for d in &stats.disposals {
            // Rights line items sell quantities that never had a purchase
            // row behind them, so they stay out of the balance.
            if d.note.contains("DERECHOS") {
                continue;
            }
            *net.entry(d.isin.clone()).or_insert(Decimal::ZERO) -= d.quantity;
        }
    }
    for p in &report.global.current_portfolio {
        *net.entry(p.isin.clone()).or_insert(Decimal::ZERO) -= p.quantity;
    }

    net.into_iter()
        .filter(|(_, residue)| residue.abs() > LOT_EPSILON)
        .map(|(isin, residue)| ValidationIssue {
            issue_type: "ShareConservation",
            subject: isin,
            message: format!(
                "bought minus sold differs from the open position by {}",
                format_qty(residue)
            ),
        })
        .collect()
}

fn print_text(issues: &[ValidationIssue]) {
    println!();
    if issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }
    println!("\u{26A0} {} issue(s) found:", issues.len());
    println!();
    for (i, issue) in issues.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, issue.issue_type, issue.subject);
        println!("     {}", issue.message);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TradeEvent;
    use crate::tax::analyze_ledgers;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn trade(day: &str, qty: Decimal, total: Decimal) -> TradeEvent {
        TradeEvent {
            date: date(day),
            time: "10:00".to_string(),
            isin: "ES0101010101".to_string(),
            product: "ACME CORP".to_string(),
            quantity: qty,
            total_eur: total,
            fee_eur: Decimal::ZERO,
            index: 0,
        }
    }

    #[test]
    fn clean_history_has_no_issues() {
        let report = analyze_ledgers(
            vec![
                trade("2023-01-05", dec!(10), dec!(-100)),
                trade("2023-06-15", dec!(-5), dec!(60)),
            ],
            vec![],
            date("2030-01-01"),
        );
        assert!(collect_issues(&report).is_empty());
    }

    #[test]
    fn oversold_isin_is_flagged_twice() {
        // One insufficient-lots warning and one conservation break.
        let report = analyze_ledgers(
            vec![trade("2023-06-15", dec!(-5), dec!(60))],
            vec![],
            date("2030-01-01"),
        );
        let issues = collect_issues(&report);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].issue_type, "InsufficientLots");
        assert_eq!(issues[1].issue_type, "ShareConservation");
    }

    #[test]
    fn rights_sales_do_not_break_conservation() {
        let report = analyze_ledgers(
            vec![TradeEvent {
                product: "ACME RTS 06/23".to_string(),
                ..trade("2023-06-15", dec!(-10), dec!(10))
            }],
            vec![],
            date("2030-01-01"),
        );
        assert!(collect_issues(&report).is_empty());
    }

    #[test]
    fn takeover_without_cash_is_flagged() {
        let report = analyze_ledgers(
            vec![
                trade("2023-01-05", dec!(10), dec!(-100)),
                TradeEvent {
                    product: "ACME OPA".to_string(),
                    ..trade("2023-06-15", dec!(-10), dec!(0))
                },
            ],
            vec![],
            date("2030-01-01"),
        );
        let issues = collect_issues(&report);
        assert!(issues
            .iter()
            .any(|i| i.issue_type == "TakeoverWithoutCash"));
    }
}
