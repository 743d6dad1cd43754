//! Trade-ledger reader.

use std::io::Read;

use rust_decimal::Decimal;

use super::normalize::{parse_amount, parse_date};
use super::{buffer_with_delimiter, csv_reader, ImportError};
use crate::events::TradeEvent;

/// Header positions resolved by substring match, per the export format.
#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    time: Option<usize>,
    isin: Option<usize>,
    product: Option<usize>,
    quantity: Option<usize>,
    total_eur: Option<usize>,
    fee_eur: Option<usize>,
}

impl Columns {
    fn map(headers: &csv::StringRecord) -> Self {
        let mut cols = Columns::default();
        for (i, raw) in headers.iter().enumerate() {
            let h = raw.trim();
            if h.contains("Fecha") {
                cols.date.get_or_insert(i);
            } else if h.contains("Hora") {
                cols.time.get_or_insert(i);
            } else if h.contains("ISIN") {
                cols.isin.get_or_insert(i);
            } else if h.contains("Producto") {
                cols.product.get_or_insert(i);
            } else if h.contains("Número") || h.contains("Cantidad") {
                cols.quantity.get_or_insert(i);
            } else if h.contains("Total") && h.contains("EUR") {
                cols.total_eur.get_or_insert(i);
            } else if h.contains("Costes") || h.contains("Comisión") {
                cols.fee_eur.get_or_insert(i);
            }
        }
        cols
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Read the trade ledger into unordered [`TradeEvent`]s.
///
/// Rows with an unparsable date are dropped. The insertion index is left at
/// zero here; the engine assigns it after the chronological sort.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<TradeEvent>, ImportError> {
    let (buf, delimiter) = buffer_with_delimiter(reader)?;
    let mut rdr = csv_reader(&buf, delimiter);

    let cols = Columns::map(rdr.headers()?);
    let date_col = cols.date.ok_or(ImportError::MissingColumn("Fecha"))?;
    if cols.quantity.is_none() {
        return Err(ImportError::MissingColumn("Número/Cantidad"));
    }
    if cols.total_eur.is_none() {
        return Err(ImportError::MissingColumn("Total (EUR)"));
    }

    let mut events = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(date) = record.get(date_col).and_then(parse_date) else {
            log::debug!("dropping trade row with unparsable date: {record:?}");
            continue;
        };

        let time = field(&record, cols.time).trim();
        events.push(TradeEvent {
            date,
            time: if time.is_empty() { "00:00".to_string() } else { time.to_string() },
            isin: field(&record, cols.isin).trim().to_string(),
            product: field(&record, cols.product).trim().to_string(),
            quantity: parse_amount(field(&record, cols.quantity)),
            total_eur: parse_amount(field(&record, cols.total_eur)),
            // Missing fee column defaults to zero.
            fee_eur: cols
                .fee_eur
                .map(|i| parse_amount(record.get(i).unwrap_or("")))
                .unwrap_or(Decimal::ZERO),
            index: 0,
        });
    }
    Ok(events)
}
