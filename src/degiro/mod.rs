//! Readers for the two DEGIRO CSV exports: the trade ledger
//! (`Transactions.csv`) and the cash-account ledger (`Account.csv`).
//!
//! Columns are recognized by substring on the header row, so the readers
//! keep working when the broker renames or reorders columns around the
//! ones we need. Rows with unparsable dates are dropped before the engine
//! ever sees them.

pub mod account;
pub mod normalize;
pub mod transactions;

pub use account::read_account;
pub use transactions::read_transactions;

use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Buffer the stream and pick the field delimiter from the header line.
///
/// DEGIRO exports with a comma, but re-saved files from European Excel
/// installs come back with semicolons.
pub(crate) fn buffer_with_delimiter<R: Read>(mut reader: R) -> Result<(Vec<u8>, u8), ImportError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;

    let header_end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let header = &buf[..header_end];
    let delimiter = if !header.contains(&b',') && header.contains(&b';') {
        b';'
    } else {
        b','
    };
    Ok((buf, delimiter))
}

pub(crate) fn csv_reader(buf: &[u8], delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(buf)
}
