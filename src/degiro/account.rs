//! Cash-account ledger reader.

use std::io::Read;

use super::normalize::{parse_amount, parse_date};
use super::{buffer_with_delimiter, csv_reader, ImportError};
use crate::events::CashEvent;

#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    isin: Option<usize>,
    product: Option<usize>,
    description: Option<usize>,
    /// "Variación" cell holds the currency; the unnamed column right after
    /// it holds the amount.
    variation: Option<usize>,
    /// Fallback amount column, always EUR.
    importe: Option<usize>,
}

impl Columns {
    fn map(headers: &csv::StringRecord) -> Self {
        let mut cols = Columns::default();
        for (i, raw) in headers.iter().enumerate() {
            let h = raw.trim();
            if h.contains("Fecha") {
                cols.date.get_or_insert(i);
            } else if h.contains("ISIN") {
                cols.isin.get_or_insert(i);
            } else if h.contains("Producto") {
                cols.product.get_or_insert(i);
            } else if h.contains("Descripción") {
                cols.description.get_or_insert(i);
            } else if h == "Variación" {
                cols.variation.get_or_insert(i);
            } else if h == "Importe" {
                cols.importe.get_or_insert(i);
            }
        }
        cols
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Read the cash-account ledger into [`CashEvent`]s, dropping rows with
/// unparsable dates.
pub fn read_account<R: Read>(reader: R) -> Result<Vec<CashEvent>, ImportError> {
    let (buf, delimiter) = buffer_with_delimiter(reader)?;
    let mut rdr = csv_reader(&buf, delimiter);

    let cols = Columns::map(rdr.headers()?);
    let date_col = cols.date.ok_or(ImportError::MissingColumn("Fecha"))?;
    if cols.variation.is_none() && cols.importe.is_none() {
        return Err(ImportError::MissingColumn("Variación/Importe"));
    }

    let mut events = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(date) = record.get(date_col).and_then(parse_date) else {
            log::debug!("dropping cash row with unparsable date: {record:?}");
            continue;
        };

        let (amount, currency) = match cols.variation {
            Some(i) => (
                parse_amount(record.get(i + 1).unwrap_or("")),
                record.get(i).unwrap_or("").trim().to_string(),
            ),
            None => (
                parse_amount(field(&record, cols.importe)),
                "EUR".to_string(),
            ),
        };

        events.push(CashEvent {
            date,
            isin: field(&record, cols.isin).trim().to_string(),
            product: field(&record, cols.product).trim().to_string(),
            description: field(&record, cols.description).trim().to_string(),
            amount,
            currency,
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn variation_column_carries_currency_and_amount() {
        let csv = "\
Fecha,Producto,ISIN,Descripción,Variación,,Saldo
10-03-2023,ACME CORP,ES0101010101,Dividendo,EUR,\"100,00\",\"1.100,00\"
10-03-2023,ACME CORP,ES0101010101,Retención del dividendo,USD,\"-15,00\",\"1.085,00\"
";
        let events = read_account(csv.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].currency, "EUR");
        assert_eq!(events[0].amount, dec!(100));
        assert_eq!(events[0].description, "Dividendo");
        assert_eq!(events[1].currency, "USD");
        assert_eq!(events[1].amount, dec!(-15));
    }

    #[test]
    fn importe_column_defaults_to_eur() {
        let csv = "\
Fecha,Descripción,Importe
01-02-2023,Costes de conectividad,\"-2,50\"
";
        let events = read_account(csv.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].currency, "EUR");
        assert_eq!(events[0].amount, dec!(-2.50));
        assert_eq!(events[0].isin, "");
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
    }

    #[test]
    fn rows_with_bad_dates_are_dropped() {
        let csv = "Fecha,Descripción,Importe\n,Dividendo,\"10,00\"\n??,Dividendo,\"10,00\"\n";
        let events = read_account(csv.as_bytes()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn no_amount_column_is_rejected() {
        let csv = "Fecha,Descripción\n01-02-2023,Dividendo\n";
        let err = read_account(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(_)));
    }
}
