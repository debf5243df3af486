//! Non-cash adjustment collection and mortality valuation.
//!
//! Mortality is valued at the simple lot average: total lot cost divided by
//! the initial head count. Changing the valuation method would silently alter
//! historical reconciliation numbers, so it stays the simple average.

use crate::classifier::CategoryMap;
use crate::error::{ReconciliationError, Result};
use crate::schema::{FinancialTransaction, NonCashBreakdown, TransactionKind};
use crate::splitter::{self, NonCashKind};
use crate::utils::in_month;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

/// Sums the period's non-cash transactions into the four adjustment buckets,
/// using each transaction's accrual date for period membership.
pub fn collect<'a, I>(year: i32, month: u32, transactions: I, map: &CategoryMap) -> NonCashBreakdown
where
    I: IntoIterator<Item = &'a FinancialTransaction>,
{
    let mut breakdown = NonCashBreakdown::default();

    for tx in transactions {
        if !in_month(tx.reference_date, year, month) {
            continue;
        }
        let group = map.classify(&tx.raw_category, tx.kind);
        let Some(kind) = splitter::non_cash_kind(tx, group) else {
            continue;
        };
        let amount = tx.amount.abs();
        match kind {
            NonCashKind::Depreciation => breakdown.depreciation += amount,
            NonCashKind::Mortality => breakdown.mortality += amount,
            NonCashKind::BiologicalAdjustment => breakdown.biological_adjustments += amount,
            NonCashKind::Other => breakdown.other += amount,
        }
    }

    breakdown
}

/// Accumulated cost of one purchased lot, including the freight, commission
/// and running costs attributed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotCost {
    pub lot_code: String,
    pub purchase_value: f64,
    pub freight: f64,
    pub commission: f64,
    pub health: f64,
    pub feed: f64,
    pub operational: f64,
    pub initial_quantity: u32,
    pub current_quantity: u32,
}

impl LotCost {
    pub fn total(&self) -> f64 {
        self.purchase_value + self.freight + self.commission + self.health + self.feed + self.operational
    }

    /// Simple lot average: total cost over the initial head count.
    pub fn average_cost_per_head(&self) -> Result<f64> {
        if self.initial_quantity == 0 {
            return Err(ReconciliationError::EmptyLot(format!(
                "lot {} has no initial animals",
                self.lot_code
            )));
        }
        Ok(self.total() / self.initial_quantity as f64)
    }
}

/// Valuation of `quantity` head lost from one lot.
pub fn mortality_loss(lot: &LotCost, quantity: u32) -> Result<f64> {
    Ok(lot.average_cost_per_head()? * quantity as f64)
}

/// One lot's share of a pen at the time of a loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenLotShare {
    pub lot: LotCost,
    pub animals_in_pen: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotImpact {
    pub lot_code: String,
    pub percentage: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalityAssessment {
    pub total_loss: f64,
    pub average_cost_per_head: f64,
    pub lots_affected: Vec<LotImpact>,
}

/// Values a pen-level death event by averaging the cost of the lots currently
/// sharing the pen, then distributes the loss proportionally to head counts.
pub fn assess_pen_mortality(shares: &[PenLotShare], quantity: u32) -> Result<MortalityAssessment> {
    if shares.is_empty() {
        return Err(ReconciliationError::EmptyLot(
            "no active lots in pen".to_string(),
        ));
    }

    let mut total_value = 0.0;
    let mut total_animals: u32 = 0;

    for share in shares {
        let proportional_value = if share.lot.current_quantity > 0 {
            share.lot.total() * share.animals_in_pen as f64 / share.lot.current_quantity as f64
        } else {
            0.0
        };
        total_value += proportional_value;
        total_animals += share.animals_in_pen;
    }

    if total_animals == 0 {
        return Err(ReconciliationError::EmptyLot(
            "no animals in pen".to_string(),
        ));
    }

    let average_cost_per_head = total_value / total_animals as f64;
    let total_loss = average_cost_per_head * quantity as f64;

    let lots_affected = shares
        .iter()
        .map(|share| {
            let fraction = share.animals_in_pen as f64 / total_animals as f64;
            LotImpact {
                lot_code: share.lot.lot_code.clone(),
                percentage: fraction * 100.0,
                value: fraction * total_loss,
            }
        })
        .collect();

    info!(
        "Assessed pen mortality: {} head, loss {:.2}, average cost/head {:.2}, {} lots affected",
        quantity,
        total_loss,
        average_cost_per_head,
        shares.len()
    );

    Ok(MortalityAssessment {
        total_loss,
        average_cost_per_head,
        lots_affected,
    })
}

/// Materializes a death event as a non-cash ledger entry, valued at the lot's
/// average cost per head.
pub fn death_event_to_transaction(
    id: &str,
    death_date: NaiveDate,
    cause: &str,
    quantity: u32,
    lot: &LotCost,
) -> Result<FinancialTransaction> {
    let loss = mortality_loss(lot, quantity)?;
    Ok(FinancialTransaction {
        id: id.to_string(),
        reference_date: death_date,
        description: format!("Mortalidade - {}", cause),
        amount: loss,
        kind: TransactionKind::Expense,
        raw_category: "mortality".to_string(),
        cash_flow_date: None,
        impacts_cash: false,
        is_reconciled: false,
        cycle_id: None,
        notes: None,
    })
}
