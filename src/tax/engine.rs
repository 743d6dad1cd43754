use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

use crate::degiro;
use crate::events::{CashEvent, TradeEvent};
use crate::tax::corporate::{self, CorporateEvent};
use crate::tax::dividends;
use crate::tax::lots::{LotBook, LOT_EPSILON};
use crate::tax::wash::{self, TradeRef};
use crate::tax::year::{Disposal, Position, Purchase, YearStats};

/// Full result of one analysis run: one entry per fiscal year plus the
/// cross-year aggregate consumed by reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct TaxReport {
    pub years: BTreeMap<i32, YearStats>,
    pub global: GlobalStats,
}

/// Cross-year totals and the parallel chart arrays, indexed by
/// `years_list`: the ordered years with activity plus the last year seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct GlobalStats {
    /// Fiscal P&L (blocked losses excluded).
    pub total_pnl: Decimal,
    pub total_pnl_real: Decimal,
    pub total_divs_net: Decimal,
    pub total_fees: Decimal,
    pub years_list: Vec<i32>,
    pub chart_pnl: Vec<Decimal>,
    pub chart_divs: Vec<Decimal>,
    pub chart_fees: Vec<Decimal>,
    /// Mirror of the last listed year's snapshot.
    pub current_portfolio: Vec<Position>,
    pub current_portfolio_value: Decimal,
}

/// Parse both ledgers and compute the full report.
///
/// A ledger that fails to parse degrades to an empty event list; an input
/// yielding no trade rows produces the empty report.
pub fn analyze<T: Read, A: Read>(transactions: T, account: A, today: NaiveDate) -> TaxReport {
    let trades = degiro::read_transactions(transactions).unwrap_or_else(|err| {
        log::warn!("trade ledger rejected: {err}");
        Vec::new()
    });
    let cash = degiro::read_account(account).unwrap_or_else(|err| {
        log::warn!("cash ledger rejected: {err}");
        Vec::new()
    });
    analyze_ledgers(trades, cash, today)
}

/// Compute the report from already-normalized events.
///
/// `today` is the only wall-clock input; it feeds the anti-application
/// lifecycle fields and nothing else.
pub fn analyze_ledgers(
    mut trades: Vec<TradeEvent>,
    cash: Vec<CashEvent>,
    today: NaiveDate,
) -> TaxReport {
    if trades.is_empty() {
        return TaxReport::default();
    }

    sort_and_index(&mut trades);

    let mut engine = Engine::new(&cash, today);
    engine.index_history(&trades);
    engine.process(&trades);
    engine.apply_cash();

    let years = engine.years;
    let global = build_global(&years);
    TaxReport { years, global }
}

/// Chronological order (date, then intraday time) with stable insertion
/// indices assigned afterwards. The index is the only comparator the
/// anti-application scan may use within a day.
fn sort_and_index(trades: &mut [TradeEvent]) {
    trades.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
    for (index, trade) in trades.iter_mut().enumerate() {
        trade.index = index;
    }
}

struct Engine<'a> {
    cash: &'a [CashEvent],
    today: NaiveDate,
    portfolio: HashMap<String, LotBook>,
    years: BTreeMap<i32, YearStats>,
    history: HashMap<String, Vec<TradeRef>>,
}

impl<'a> Engine<'a> {
    fn new(cash: &'a [CashEvent], today: NaiveDate) -> Self {
        Engine {
            cash,
            today,
            portfolio: HashMap::new(),
            years: BTreeMap::new(),
            history: HashMap::new(),
        }
    }

    fn year_stats(&mut self, year: i32) -> &mut YearStats {
        self.years.entry(year).or_insert_with(|| YearStats::new(year))
    }

    /// Pre-group trade rows by ISIN for the anti-application window scans.
    fn index_history(&mut self, trades: &[TradeEvent]) {
        for trade in trades {
            if trade.isin.is_empty() {
                continue;
            }
            self.history
                .entry(trade.isin.clone())
                .or_default()
                .push(TradeRef {
                    index: trade.index,
                    date: trade.date,
                    quantity: trade.quantity,
                });
        }
    }

    /// Single pass over the sorted trade stream, snapshotting the open
    /// portfolio at every year boundary (gap years included) and after the
    /// final row.
    fn process(&mut self, trades: &[TradeEvent]) {
        let mut current_year: Option<i32> = None;

        for trade in trades {
            let row_year = trade.year();
            if let Some(prev) = current_year {
                if row_year > prev {
                    for year in prev..row_year {
                        self.snapshot(year);
                    }
                }
            }
            current_year = Some(row_year);
            self.dispatch(trade);
        }

        if let Some(last) = current_year {
            self.snapshot(last);
        }
    }

    fn dispatch(&mut self, trade: &TradeEvent) {
        if trade.isin.is_empty() || trade.quantity == Decimal::ZERO {
            return;
        }

        self.portfolio
            .entry(trade.isin.clone())
            .and_modify(|book| book.set_name(&trade.product))
            .or_insert_with(|| LotBook::new(&trade.product));

        if trade.is_acquisition() {
            self.handle_buy(trade);
        } else {
            self.handle_sell(trade);
        }

        self.year_stats(trade.year()).trading_fees += trade.fee_eur.abs();
    }

    fn handle_buy(&mut self, trade: &TradeEvent) {
        let cost = trade.total_eur.abs();
        let unit_cost = cost / trade.quantity;

        if let Some(book) = self.portfolio.get_mut(&trade.isin) {
            book.append(trade.quantity, unit_cost, trade.date);
        }

        self.year_stats(trade.year()).purchases.push(Purchase {
            date: trade.date,
            product: trade.product.clone(),
            isin: trade.isin.clone(),
            quantity: trade.quantity,
            unit_price: unit_cost,
            total: cost,
            fee: trade.fee_eur,
        });
    }

    fn handle_sell(&mut self, trade: &TradeEvent) {
        let quantity = trade.quantity.abs();

        let (event, proceeds) = corporate::classify(
            &trade.product,
            &trade.isin,
            trade.date,
            trade.total_eur,
            self.cash,
        );

        let mut consumption = match self.portfolio.get_mut(&trade.isin) {
            Some(book) => book.consume(quantity),
            None => return,
        };
        // Rights carry no acquisition cost under the simplified convention,
        // even when FIFO found nothing to consume.
        if event == CorporateEvent::Rights {
            consumption.cost_basis = Decimal::ZERO;
            consumption.insufficient = false;
        }

        let pnl = proceeds - consumption.cost_basis;

        let history = self
            .history
            .get(&trade.isin)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let status = wash::analyze(
            history,
            trade.index,
            pnl,
            trade.date,
            consumption.oldest_date,
            self.today,
        );

        let note = if status.blocked {
            format!("⚠️ BLOQ (2 Meses) {}", event.label())
                .trim_end()
                .to_string()
        } else {
            event.label().to_string()
        };

        let stats = self.year_stats(trade.year());
        if status.blocked {
            stats.blocked_loss += pnl.abs();
        }
        if pnl > Decimal::ZERO {
            stats.wins += 1;
        } else if pnl < Decimal::ZERO {
            stats.losses += 1;
        }

        stats.disposals.push(Disposal {
            date: trade.date,
            product: trade.product.clone(),
            isin: trade.isin.clone(),
            quantity,
            proceeds,
            cost_basis: consumption.cost_basis,
            pnl,
            warning: consumption.insufficient,
            note,
            blocked: status.blocked,
            blocked_status: status.status,
            unlock_date: status.unlock_date,
            wash_sale_risk: status.wash_sale_risk,
            loss_consolidated: status.loss_consolidated,
            safe_repurchase_date: status.safe_repurchase_date,
        });

        stats.real_pnl += pnl;
        if !status.blocked {
            stats.fiscal_pnl += pnl;
        }
    }

    fn snapshot(&mut self, year: i32) {
        let mut positions: Vec<Position> = self
            .portfolio
            .iter()
            .filter_map(|(isin, book)| {
                let quantity = book.open_quantity();
                if quantity > LOT_EPSILON {
                    let total_cost = book.open_cost();
                    Some(Position {
                        name: book.name().to_string(),
                        isin: isin.clone(),
                        quantity,
                        avg_price: total_cost / quantity,
                        total_cost,
                    })
                } else {
                    None
                }
            })
            .collect();
        positions.sort_by(|a, b| a.isin.cmp(&b.isin));

        let portfolio_value = positions.iter().map(|p| p.total_cost).sum();
        let stats = self.year_stats(year);
        stats.portfolio = positions;
        stats.portfolio_value = portfolio_value;
    }

    fn apply_cash(&mut self) {
        let summary = dividends::summarize_cash(self.cash);
        for (year, fee) in summary.connectivity_fees {
            self.year_stats(year).connectivity_fees += fee;
        }
        for (year, dividend) in summary.dividends {
            self.year_stats(year).dividends.push(dividend);
        }
    }
}

fn build_global(years: &BTreeMap<i32, YearStats>) -> GlobalStats {
    let mut global = GlobalStats::default();
    let last_year = years.keys().next_back().copied();

    for (&year, stats) in years {
        if !stats.has_activity() && Some(year) != last_year {
            continue;
        }
        let divs_net = stats.dividends_net();
        let fees = stats.total_fees();

        global.total_pnl += stats.fiscal_pnl;
        global.total_pnl_real += stats.real_pnl;
        global.total_divs_net += divs_net;
        global.total_fees += fees;

        global.years_list.push(year);
        global.chart_pnl.push(stats.fiscal_pnl.round_dp(2));
        global.chart_divs.push(divs_net.round_dp(2));
        global.chart_fees.push(fees.round_dp(2));
    }

    if let Some(&last) = global.years_list.last() {
        let stats = &years[&last];
        global.current_portfolio = stats.portfolio.clone();
        global.current_portfolio_value = stats.portfolio_value;
    }
    global
}
