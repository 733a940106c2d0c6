use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::totals::LineItem;
use crate::models::transaction::{TransactionItem, TransactionRecord};

use super::items_resolver::PricedLine;
use super::totals_service::TotalsCalculator;

/// Builds transaction records from a priced selection and manages the history.
///
/// Pure business logic; persistence is the caller's job.
pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        Self
    }

    /// Turn the priced selection into a record.
    ///
    /// Rows with quantity 0 are left out; at least one row must remain and
    /// the seller must be non-blank.
    pub fn build_record(
        &self,
        calculator: &mut TotalsCalculator,
        user: &str,
        seller: &str,
        lines: &[PricedLine],
    ) -> Result<TransactionRecord, CoreError> {
        let seller = seller.trim();
        if seller.is_empty() {
            return Err(CoreError::ValidationError("Seller must not be empty".into()));
        }

        let lines: Vec<&PricedLine> = lines.iter().filter(|line| line.quantity > 0).collect();
        if lines.is_empty() {
            return Err(CoreError::ValidationError(
                "A transaction needs at least one item with a quantity".into(),
            ));
        }

        let line_items: Vec<LineItem> = lines.iter().map(|line| line.line_item()).collect();
        let totals = calculator.calculate_totals(&line_items);
        let items = lines
            .iter()
            .map(|line| TransactionItem {
                name: line.item.name.clone(),
                quantity: line.quantity,
            })
            .collect();

        Ok(TransactionRecord::new(
            user,
            seller,
            items,
            totals.total_buy,
            totals.total_sell,
        ))
    }

    /// Append a record, keeping the history in date order (oldest first).
    pub fn add(&self, history: &mut Vec<TransactionRecord>, record: TransactionRecord) {
        let pos = history.partition_point(|existing| existing.date <= record.date);
        history.insert(pos, record);
    }

    /// Remove a record entirely.
    pub fn delete(
        &self,
        history: &mut Vec<TransactionRecord>,
        id: Uuid,
    ) -> Result<TransactionRecord, CoreError> {
        let idx = history
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        Ok(history.remove(idx))
    }

    /// History newest first.
    #[must_use]
    pub fn newest_first<'a>(&self, history: &'a [TransactionRecord]) -> Vec<&'a TransactionRecord> {
        history.iter().rev().collect()
    }
}

impl Default for TransactionService {
    fn default() -> Self {
        Self::new()
    }
}
