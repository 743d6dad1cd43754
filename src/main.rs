mod cmd;
mod degiro;
mod events;
mod tax;

use clap::{Parser, Subcommand};

use cmd::report::ReportCommand;
use cmd::schema::SchemaCommand;
use cmd::summary::SummaryCommand;
use cmd::validate::ValidateCommand;

#[derive(Parser, Debug)]
#[command(name = "fisco", version, about = "Spanish capital gains, wash-sale and dividend calculator for broker CSV ledgers")]
struct Fisco {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-year fiscal report (disposals, dividends, portfolio)
    Report(ReportCommand),
    /// Cross-year totals and the current portfolio
    Summary(SummaryCommand),
    /// Surface ledger quality issues and invariant breaks
    Validate(ValidateCommand),
    /// JSON Schema of the result structure
    Schema(SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let fisco = Fisco::parse();

    match fisco.cmd {
        Command::Report(cmd) => cmd.exec(),
        Command::Summary(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
