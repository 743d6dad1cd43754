//! Summary command - cross-year totals and the current portfolio

use clap::Args;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cmd::report::{format_eur, format_num, format_qty};
use crate::cmd::LedgerArgs;
use crate::tax::TaxReport;

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    ledgers: LedgerArgs,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct YearRow {
    #[tabled(rename = "Año")]
    year: i32,
    #[tabled(rename = "P&L fiscal")]
    fiscal_pnl: String,
    #[tabled(rename = "P&L real")]
    real_pnl: String,
    #[tabled(rename = "Bloqueado")]
    blocked_loss: String,
    #[tabled(rename = "Dividendos")]
    dividends_net: String,
    #[tabled(rename = "Comisiones")]
    fees: String,
    #[tabled(rename = "G/P")]
    win_loss: String,
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Producto")]
    name: String,
    #[tabled(rename = "ISIN")]
    isin: String,
    #[tabled(rename = "Títulos")]
    quantity: String,
    #[tabled(rename = "Precio medio")]
    avg_price: String,
    #[tabled(rename = "Total coste")]
    total_cost: String,
}

/// Summary data for JSON output
#[derive(Debug, Serialize)]
struct SummaryData {
    years: Vec<i32>,
    total_pnl: String,
    total_pnl_real: String,
    total_divs_net: String,
    total_fees: String,
    current_portfolio_value: String,
    open_positions: usize,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let report = self.ledgers.load()?;

        if self.json {
            return self.print_json(&report);
        }
        self.print_tables(&report);
        Ok(())
    }

    fn print_tables(&self, report: &TaxReport) {
        let rows: Vec<YearRow> = report
            .global
            .years_list
            .iter()
            .filter_map(|year| report.years.get(year))
            .map(|stats| YearRow {
                year: stats.year,
                fiscal_pnl: format_eur(stats.fiscal_pnl),
                real_pnl: format_eur(stats.real_pnl),
                blocked_loss: format_eur(stats.blocked_loss),
                dividends_net: format_eur(stats.dividends_net()),
                fees: format_eur(stats.total_fees()),
                win_loss: format!("{}/{}", stats.wins, stats.losses),
            })
            .collect();

        println!();
        println!("RESUMEN POR EJERCICIO");
        println!("{}", Table::new(rows).with(Style::rounded()));

        println!();
        println!(
            "TOTALES  P&L fiscal: {} | P&L real: {} | Dividendos netos: {} | Comisiones: {}",
            format_eur(report.global.total_pnl),
            format_eur(report.global.total_pnl_real),
            format_eur(report.global.total_divs_net),
            format_eur(report.global.total_fees),
        );

        if !report.global.current_portfolio.is_empty() {
            let positions: Vec<PositionRow> = report
                .global
                .current_portfolio
                .iter()
                .map(|p| PositionRow {
                    name: p.name.clone(),
                    isin: p.isin.clone(),
                    quantity: format_qty(p.quantity),
                    avg_price: format_num(p.avg_price.round_dp(4)),
                    total_cost: format_eur(p.total_cost),
                })
                .collect();

            println!();
            println!(
                "CARTERA ACTUAL ({})",
                format_eur(report.global.current_portfolio_value)
            );
            println!("{}", Table::new(positions).with(Style::rounded()));
        }
        println!();
    }

    fn print_json(&self, report: &TaxReport) -> anyhow::Result<()> {
        let data = SummaryData {
            years: report.global.years_list.clone(),
            total_pnl: format_num(report.global.total_pnl),
            total_pnl_real: format_num(report.global.total_pnl_real),
            total_divs_net: format_num(report.global.total_divs_net),
            total_fees: format_num(report.global.total_fees),
            current_portfolio_value: format_num(report.global.current_portfolio_value),
            open_positions: report.global.current_portfolio.len(),
        };
        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}
