//! Locale-tolerant number and date parsing for the exported ledgers.
//!
//! DEGIRO exports mix Spanish and English numeric conventions depending on
//! the account locale and the export date, so the amount parser has to
//! decide per-value which separator is the decimal one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a free-form amount string into a `Decimal`.
///
/// Rules, applied in order: strip whitespace and quotes; drop every
/// character outside `[0-9,.-]`; when both `.` and `,` occur, the
/// last-occurring of the two is the decimal separator and the other is a
/// thousands separator; a lone `,` is the decimal separator; a lone `.` is
/// a thousands separator when it repeats or when a single dot is followed
/// by exactly three digits, otherwise it is the decimal point. Empty or
/// unparsable input yields zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let mut s: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => {
            if comma > dot {
                s.retain(|c| c != '.');
                s = s.replace(',', ".");
            } else {
                s.retain(|c| c != ',');
            }
        }
        (None, Some(_)) => {
            s = s.replace(',', ".");
        }
        (Some(dot), None) => {
            let repeated = s.matches('.').count() > 1;
            let frac = &s[dot + 1..];
            let grouped = frac.len() == 3 && frac.bytes().all(|b| b.is_ascii_digit());
            if repeated || grouped {
                s.retain(|c| c != '.');
            }
        }
        (None, None) => {}
    }

    Decimal::from_str(&s).unwrap_or_default()
}

/// Parse a day-first date, trying `%d-%m-%Y` then `%d/%m/%Y`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn spanish_convention() {
        assert_eq!(parse_amount("1.234,56"), dec!(1234.56));
        assert_eq!(parse_amount("-1.234,56"), dec!(-1234.56));
        assert_eq!(parse_amount("12.345.678,90"), dec!(12345678.90));
    }

    #[test]
    fn english_convention() {
        assert_eq!(parse_amount("1,234.56"), dec!(1234.56));
        assert_eq!(parse_amount("12,345,678.90"), dec!(12345678.90));
    }

    #[test]
    fn lone_comma_is_decimal() {
        assert_eq!(parse_amount("1234,5678"), dec!(1234.5678));
        assert_eq!(parse_amount("-0,5"), dec!(-0.5));
    }

    #[test]
    fn lone_dot_grouping_heuristic() {
        // Exactly three digits after a single dot reads as a thousands group.
        assert_eq!(parse_amount("1.234"), dec!(1234));
        assert_eq!(parse_amount("1.234.567"), dec!(1234567));
        // Anything else keeps the dot as the decimal point.
        assert_eq!(parse_amount("1.5"), dec!(1.5));
        assert_eq!(parse_amount("12.34"), dec!(12.34));
        assert_eq!(parse_amount("3.1416"), dec!(3.1416));
    }

    #[test]
    fn strips_symbols_and_quotes() {
        assert_eq!(parse_amount("\"1.234,56 EUR\""), dec!(1234.56));
        assert_eq!(parse_amount(" € -42,10 "), dec!(-42.10));
    }

    #[test]
    fn empty_or_garbage_is_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("   "), Decimal::ZERO);
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
        assert_eq!(parse_amount("--"), Decimal::ZERO);
    }

    #[test]
    fn idempotent_on_comma_decimal_rendering() {
        // The report renders amounts with a comma decimal; re-parsing one
        // must return the same value.
        for raw in ["1234,5678", "0,1", "-987,65"] {
            let value = parse_amount(raw);
            let rendered = value.to_string().replace('.', ",");
            assert_eq!(parse_amount(&rendered), value);
        }
    }

    #[test]
    fn dates_day_first() {
        assert_eq!(
            parse_date("05-01-2023"),
            NaiveDate::from_ymd_opt(2023, 1, 5)
        );
        assert_eq!(
            parse_date("15/06/2023"),
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
        assert_eq!(parse_date("2023-01-05"), None);
        assert_eq!(parse_date("31-02-2023"), None);
        assert_eq!(parse_date(""), None);
    }
}
