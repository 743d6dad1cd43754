//! Report command - per-year fiscal detail

use clap::Args;
use rust_decimal::Decimal;

use crate::cmd::LedgerArgs;
use crate::tax::YearStats;

#[derive(Args, Debug)]
pub struct ReportCommand {
    #[command(flatten)]
    ledgers: LedgerArgs,

    /// Fiscal year to report (defaults to every year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output the full result structure as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let report = self.ledgers.load()?;

        if let Some(year) = self.year {
            if !report.years.contains_key(&year) {
                anyhow::bail!("no data for year {year}");
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        for (year, stats) in &report.years {
            if self.year.is_some_and(|y| y != *year) {
                continue;
            }
            print_year(*year, stats);
        }
        Ok(())
    }
}

fn print_year(year: i32, stats: &YearStats) {
    println!("══════════════════════ EJERCICIO {year} ══════════════════════");

    if !stats.purchases.is_empty() {
        println!();
        println!("COMPRAS");
        println!(
            "  {:<10} {:<24} {:>10} {:>12} {:>12} {:>10}",
            "Fecha", "Producto", "Títulos", "Precio", "Total", "Comisión"
        );
        for p in &stats.purchases {
            println!(
                "  {:<10} {:<24} {:>10} {:>12} {:>12} {:>10}",
                p.date.format("%d-%m-%Y"),
                truncate(&p.product, 24),
                format_qty(p.quantity),
                format_eur(p.unit_price.round_dp(4)),
                format_eur(p.total),
                format_eur(p.fee),
            );
        }
    }

    if !stats.disposals.is_empty() {
        println!();
        println!("VENTAS");
        println!(
            "  {:<10} {:<24} {:>10} {:>12} {:>12} {:>12}  {}",
            "Fecha", "Producto", "Títulos", "Transmisión", "Adquisición", "P&L", "Notas"
        );
        for d in &stats.disposals {
            let mut note = d.note.clone();
            if d.warning {
                if !note.is_empty() {
                    note.push(' ');
                }
                note.push_str("(sin lotes suficientes)");
            }
            println!(
                "  {:<10} {:<24} {:>10} {:>12} {:>12} {:>12}  {}",
                d.date.format("%d-%m-%Y"),
                truncate(&d.product, 24),
                format_qty(d.quantity),
                format_eur(d.proceeds),
                format_eur(d.cost_basis),
                format_eur(d.pnl),
                note,
            );
        }
    }

    if !stats.dividends.is_empty() {
        println!();
        println!("DIVIDENDOS");
        println!(
            "  {:<10} {:<24} {:>5} {:>10} {:>10} {:>10}",
            "Fecha", "Producto", "Div", "Bruto", "Retención", "Neto"
        );
        for d in &stats.dividends {
            println!(
                "  {:<10} {:<24} {:>5} {:>10} {:>10} {:>10}",
                d.date.format("%d-%m-%Y"),
                truncate(&d.product, 24),
                d.currency,
                format_num(d.gross),
                format_num(d.withholding),
                format_num(d.net),
            );
        }
    }

    if !stats.portfolio.is_empty() {
        println!();
        println!("CARTERA A 31-12-{year}");
        println!(
            "  {:<24} {:<14} {:>10} {:>12} {:>14}",
            "Producto", "ISIN", "Títulos", "Precio medio", "Total coste"
        );
        for p in &stats.portfolio {
            println!(
                "  {:<24} {:<14} {:>10} {:>12} {:>14}",
                truncate(&p.name, 24),
                p.isin,
                format_qty(p.quantity),
                format_eur(p.avg_price.round_dp(4)),
                format_eur(p.total_cost),
            );
        }
    }

    println!();
    println!(
        "  P&L fiscal: {} | P&L real: {} | Pérdidas bloqueadas: {}",
        format_eur(stats.fiscal_pnl),
        format_eur(stats.real_pnl),
        format_eur(stats.blocked_loss),
    );
    println!(
        "  Dividendos netos: {} | Comisiones: {} | Conectividad: {} | {} ganadoras / {} perdedoras",
        format_eur(stats.dividends_net()),
        format_eur(stats.trading_fees),
        format_eur(stats.connectivity_fees),
        stats.wins,
        stats.losses,
    );
    println!();
}

pub(crate) fn format_eur(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-{:.2}€", amount.abs())
    } else {
        format!("{:.2}€", amount)
    }
}

pub(crate) fn format_num(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

pub(crate) fn format_qty(qty: Decimal) -> String {
    let s = format!("{:.4}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        s.chars().take(max_len).collect()
    }
}
