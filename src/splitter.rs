//! Decides, per transaction, whether it affects cash now, later, or never.
//!
//! Mortality, weight-loss, depreciation and biological revaluations are
//! valuation write-offs, not money movement: they stay non-cash even when an
//! upstream service marked them as paid.

use crate::classifier::AccountingGroup;
use crate::schema::{CashFlowActivity, FinancialTransaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NonCashKind {
    Depreciation,
    Mortality,
    BiologicalAdjustment,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CashImpact {
    /// Cash moved on the given date.
    Settled { date: NaiveDate },
    /// Accrual-only: counted in net income but absent from cash figures
    /// until payment or receipt is confirmed.
    Pending,
    NonCash(NonCashKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashSplit {
    pub impact: CashImpact,
    pub activity: CashFlowActivity,
}

/// Non-cash bucket for a transaction, if it is a non-cash item at all.
/// Depreciation and biological revaluations are recognized by category even
/// when their group is a cash one.
pub fn non_cash_kind(tx: &FinancialTransaction, group: &AccountingGroup) -> Option<NonCashKind> {
    let raw = tx.raw_category.to_lowercase();
    if raw.contains("deprecia") {
        return Some(NonCashKind::Depreciation);
    }
    if raw.contains("biolog") {
        return Some(NonCashKind::BiologicalAdjustment);
    }
    if group.non_cash {
        if raw.contains("peso") || raw.contains("weight") {
            return Some(NonCashKind::Other);
        }
        return Some(NonCashKind::Mortality);
    }
    None
}

/// Splits one transaction into its cash impact and activity. Total: every
/// transaction gets a split, never an error.
pub fn split(tx: &FinancialTransaction, group: &AccountingGroup) -> CashSplit {
    let impact = match non_cash_kind(tx, group) {
        Some(kind) => CashImpact::NonCash(kind),
        None => match tx.cash_flow_date {
            Some(date) if tx.impacts_cash => CashImpact::Settled { date },
            _ => CashImpact::Pending,
        },
    };

    CashSplit {
        impact,
        activity: group.activity,
    }
}
