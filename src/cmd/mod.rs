pub mod report;
pub mod schema;
pub mod summary;
pub mod validate;

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;

use crate::tax::{self, TaxReport};

/// Ledger files and report date shared by every analyzing command.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Trade ledger CSV (Transactions.csv)
    #[arg(short, long)]
    pub transactions: PathBuf,

    /// Cash-account ledger CSV (Account.csv)
    #[arg(short, long)]
    pub account: PathBuf,

    /// Report date (YYYY-MM-DD) for the repurchase-window lifecycle;
    /// defaults to the local date
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

impl LedgerArgs {
    /// Open both ledgers and run the engine. Fails when no trade rows parse.
    pub fn load(&self) -> anyhow::Result<TaxReport> {
        let trades = File::open(&self.transactions)
            .with_context(|| format!("cannot open trade ledger {}", self.transactions.display()))?;
        let cash = File::open(&self.account)
            .with_context(|| format!("cannot open account ledger {}", self.account.display()))?;

        let today = self.today.unwrap_or_else(|| chrono::Local::now().date_naive());
        let report = tax::analyze(trades, cash, today);
        if report.years.is_empty() {
            anyhow::bail!(
                "no trade rows could be parsed from {}",
                self.transactions.display()
            );
        }
        Ok(report)
    }
}
