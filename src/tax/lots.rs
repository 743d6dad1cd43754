use std::collections::VecDeque;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Below this remaining quantity a lot counts as depleted.
pub const LOT_EPSILON: Decimal = dec!(0.0001);

/// One undepleted acquisition parcel.
///
/// The unit cost is the full acquisition cash outflow per share, so it
/// already carries the buy-side commission baked into the ledger total.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub date: NaiveDate,
}

/// Outcome of a FIFO consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    pub cost_basis: Decimal,
    /// The book ran dry before the request was satisfied.
    pub insufficient: bool,
    /// Acquisition date of the oldest lot touched, if any lot was.
    pub oldest_date: Option<NaiveDate>,
}

/// Per-security queue of open lots, oldest first.
///
/// Also caches the most recently seen product name: names change
/// mid-history (ticker renames, rights line items) and the snapshot must
/// show the latest one.
#[derive(Debug, Clone, Default)]
pub struct LotBook {
    name: String,
    lots: VecDeque<Lot>,
}

impl LotBook {
    pub fn new(name: &str) -> Self {
        LotBook {
            name: name.to_string(),
            lots: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Enqueue an acquisition at the tail.
    pub fn append(&mut self, quantity: Decimal, unit_cost: Decimal, date: NaiveDate) {
        log::debug!(
            "lot book {} ADD: qty={quantity}, unit_cost={unit_cost}, date={date}",
            self.name
        );
        self.lots.push_back(Lot {
            quantity,
            unit_cost,
            date,
        });
    }

    /// Consume `quantity` oldest-first, returning the accumulated cost
    /// basis, whether the book ran dry, and the oldest lot date touched.
    pub fn consume(&mut self, quantity: Decimal) -> Consumption {
        let mut remaining = quantity;
        let mut cost_basis = Decimal::ZERO;
        let mut insufficient = false;
        let mut oldest_date = None;

        while remaining > LOT_EPSILON {
            let Some(head) = self.lots.front_mut() else {
                insufficient = true;
                break;
            };
            oldest_date.get_or_insert(head.date);

            if head.quantity > remaining {
                cost_basis += remaining * head.unit_cost;
                head.quantity -= remaining;
                remaining = Decimal::ZERO;
            } else {
                cost_basis += head.quantity * head.unit_cost;
                remaining -= head.quantity;
                self.lots.pop_front();
            }
        }

        log::debug!(
            "lot book {} CONSUME: qty={quantity}, basis={cost_basis}, dry={insufficient}",
            self.name
        );
        Consumption {
            cost_basis,
            insufficient,
            oldest_date,
        }
    }

    /// Current open position.
    pub fn open_quantity(&self) -> Decimal {
        self.lots.iter().map(|l| l.quantity).sum()
    }

    /// Total cost of the open position.
    pub fn open_cost(&self) -> Decimal {
        self.lots.iter().map(|l| l.quantity * l.unit_cost).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn partial_consumption_leaves_head_lot() {
        let mut book = LotBook::new("ACME");
        book.append(dec!(10), dec!(10), date("2023-01-05"));

        let result = book.consume(dec!(5));
        assert_eq!(result.cost_basis, dec!(50));
        assert!(!result.insufficient);
        assert_eq!(result.oldest_date, Some(date("2023-01-05")));
        assert_eq!(book.open_quantity(), dec!(5));
        assert_eq!(book.open_cost(), dec!(50));
    }

    #[test]
    fn consumption_crosses_lots_in_order() {
        let mut book = LotBook::new("ACME");
        book.append(dec!(10), dec!(10), date("2023-01-05"));
        book.append(dec!(10), dec!(12), date("2023-02-05"));

        let result = book.consume(dec!(15));
        assert_eq!(result.cost_basis, dec!(160));
        assert_eq!(result.oldest_date, Some(date("2023-01-05")));
        assert_eq!(book.open_quantity(), dec!(5));
        assert_eq!(book.open_cost(), dec!(60));
    }

    #[test]
    fn running_dry_flags_insufficient() {
        let mut book = LotBook::new("ACME");
        book.append(dec!(3), dec!(10), date("2023-01-05"));

        let result = book.consume(dec!(5));
        assert!(result.insufficient);
        assert_eq!(result.cost_basis, dec!(30));
        assert_eq!(book.open_quantity(), Decimal::ZERO);
    }

    #[test]
    fn empty_book_consumes_nothing() {
        let mut book = LotBook::new("ACME");
        let result = book.consume(dec!(5));
        assert!(result.insufficient);
        assert_eq!(result.cost_basis, Decimal::ZERO);
        assert_eq!(result.oldest_date, None);
    }

    #[test]
    fn sub_epsilon_request_is_a_no_op() {
        let mut book = LotBook::new("ACME");
        book.append(dec!(10), dec!(10), date("2023-01-05"));

        let result = book.consume(dec!(0.00005));
        assert_eq!(result.cost_basis, Decimal::ZERO);
        assert!(!result.insufficient);
        assert_eq!(book.open_quantity(), dec!(10));
    }

    #[test]
    fn exact_depletion_removes_the_lot() {
        let mut book = LotBook::new("ACME");
        book.append(dec!(10), dec!(10), date("2023-01-05"));

        let result = book.consume(dec!(10));
        assert_eq!(result.cost_basis, dec!(100));
        assert!(!result.insufficient);
        assert_eq!(book.open_quantity(), Decimal::ZERO);
    }

    #[test]
    fn name_cache_keeps_latest() {
        let mut book = LotBook::new("ACME CORP");
        book.set_name("ACME CORP NEW");
        assert_eq!(book.name(), "ACME CORP NEW");
    }
}
