//! In-memory event journal.
//!
//! Implements every listener trait and records events in arrival order, so
//! a single journal registered with a simulation captures the full ledger.
//! The journal can be exported as CSV for downstream tooling; richer
//! persistence (search indexes, databases) is a collaborator's concern.

use std::io::Write;

use crate::domain::error::PapertraderError;
use crate::domain::event::{
    BrokerageEvent, BrokerageEventListener, CashEvent, CashEventListener, EquityEvent,
    EquityEventListener, OrderEvent, OrderEventListener,
};

#[derive(Debug, Clone, PartialEq)]
pub enum JournalRecord {
    Cash(CashEvent),
    Brokerage(BrokerageEvent),
    Equity(EquityEvent),
    Order(OrderEvent),
}

#[derive(Debug, Default)]
pub struct EventJournal {
    records: Vec<JournalRecord>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[JournalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cash_events(&self) -> impl Iterator<Item = &CashEvent> {
        self.records.iter().filter_map(|r| match r {
            JournalRecord::Cash(event) => Some(event),
            _ => None,
        })
    }

    pub fn order_events(&self) -> impl Iterator<Item = &OrderEvent> {
        self.records.iter().filter_map(|r| match r {
            JournalRecord::Order(event) => Some(event),
            _ => None,
        })
    }

    /// Export all records as CSV: kind, event, date, amount, before, after.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), PapertraderError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["kind", "event", "date", "amount", "before", "after"])
            .map_err(csv_error)?;

        for record in &self.records {
            let row = match record {
                JournalRecord::Cash(e) => [
                    "cash".to_string(),
                    e.event_type.to_string(),
                    e.date.to_string(),
                    e.amount.to_string(),
                    e.before.to_string(),
                    e.after.to_string(),
                ],
                JournalRecord::Brokerage(e) => [
                    "brokerage".to_string(),
                    e.event_type.to_string(),
                    e.date.to_string(),
                    e.amount.to_string(),
                    e.before.to_string(),
                    e.after.to_string(),
                ],
                JournalRecord::Equity(e) => [
                    "equity".to_string(),
                    e.event_type.to_string(),
                    e.date.to_string(),
                    e.amount.to_string(),
                    e.before.to_string(),
                    e.after.to_string(),
                ],
                JournalRecord::Order(e) => [
                    "order".to_string(),
                    e.class.to_string(),
                    e.date.to_string(),
                    e.total_cost.to_string(),
                    e.before.to_string(),
                    e.after.to_string(),
                ],
            };
            out.write_record(&row).map_err(csv_error)?;
        }
        out.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> PapertraderError {
    PapertraderError::Data {
        reason: format!("event export failed: {}", e),
    }
}

impl CashEventListener for EventJournal {
    fn cash_event(&mut self, event: &CashEvent) {
        self.records.push(JournalRecord::Cash(event.clone()));
    }
}

impl BrokerageEventListener for EventJournal {
    fn brokerage_event(&mut self, event: &BrokerageEvent) {
        self.records.push(JournalRecord::Brokerage(event.clone()));
    }
}

impl EquityEventListener for EventJournal {
    fn equity_event(&mut self, event: &EquityEvent) {
        self.records.push(JournalRecord::Equity(event.clone()));
    }
}

impl OrderEventListener for EventJournal {
    fn order_event(&mut self, event: &OrderEvent) {
        self.records.push(JournalRecord::Order(event.clone()));
    }
}
