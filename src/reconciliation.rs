//! Period reconciliation: accrual net income against cash-basis net flow.
//!
//! Accrual membership uses each transaction's reference date; cash membership
//! uses its confirmed cash-flow date. The two sets can differ for the same
//! period, and the residual between them is the reconciliation difference.

use crate::classifier::CategoryMap;
use crate::error::Result;
use crate::noncash;
use crate::schema::{
    CashFlowBreakdown, FinancialTransaction, NonCashBreakdown, QualityMetrics,
    ReconciliationResult, TransactionKind,
};
use crate::splitter::{self, CashImpact};
use crate::statement::IncomeStatement;
use crate::utils::{in_month, safe_div, validate_month};
use log::debug;

/// Default absolute tolerance on the reconciliation difference before the
/// period is flagged for review.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

const ACCURACY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// When false, non-cash transactions are excluded from accrual totals and
    /// the non-cash breakdown is zeroed. Cash figures never contained them.
    pub include_non_cash_items: bool,
    /// Restrict the analysis to one production cycle.
    pub cycle_id: Option<String>,
    pub tolerance: f64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            include_non_cash_items: true,
            cycle_id: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Computed result for one period, before it is wrapped into a persisted
/// snapshot.
#[derive(Debug, Clone)]
pub struct PeriodAnalysis {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub cash_flow: CashFlowBreakdown,
    pub non_cash: NonCashBreakdown,
    pub reconciliation: ReconciliationResult,
    pub quality: QualityMetrics,
    pub statement: IncomeStatement,
    pub transaction_count: usize,
}

/// Reconciles one period. Pure over the transaction set: the same inputs
/// always produce the same analysis.
pub fn reconcile(
    year: i32,
    month: u32,
    transactions: &[FinancialTransaction],
    map: &CategoryMap,
    options: &ReconcileOptions,
) -> Result<PeriodAnalysis> {
    validate_month(year, month)?;

    let filtered: Vec<&FinancialTransaction> = transactions
        .iter()
        .filter(|tx| match &options.cycle_id {
            Some(cycle) => tx.cycle_id.as_deref() == Some(cycle.as_str()),
            None => true,
        })
        .collect();

    // Accrual set: reference date in-period, optionally without non-cash items.
    let accrual: Vec<&FinancialTransaction> = filtered
        .iter()
        .copied()
        .filter(|tx| in_month(tx.reference_date, year, month))
        .filter(|tx| {
            if options.include_non_cash_items {
                return true;
            }
            let group = map.classify(&tx.raw_category, tx.kind);
            splitter::non_cash_kind(tx, group).is_none()
        })
        .collect();

    let grouped = map.group_totals(accrual.iter().copied());
    let total_revenue = grouped.total_revenue;
    let total_expenses = grouped.total_expenses;
    let net_income = grouped.net_income();

    // Cash set: confirmed cash-flow date in-period, regardless of accrual
    // membership.
    let mut cash_flow = CashFlowBreakdown::default();
    for tx in &filtered {
        let group = map.classify(&tx.raw_category, tx.kind);
        let split = splitter::split(tx, group);
        if let CashImpact::Settled { date } = split.impact {
            if in_month(date, year, month) {
                let flow = cash_flow.flow_mut(split.activity);
                match tx.kind {
                    TransactionKind::Revenue => flow.add_receipt(tx.amount.abs()),
                    TransactionKind::Expense => flow.add_payment(tx.amount.abs()),
                }
            }
        }
    }
    let net_cash_flow = cash_flow.net_cash_flow();

    let non_cash = if options.include_non_cash_items {
        noncash::collect(year, month, filtered.iter().copied(), map)
    } else {
        NonCashBreakdown::default()
    };
    let non_cash_adjustments = non_cash.total();

    let reconciliation = ReconciliationResult::derive(net_income, non_cash_adjustments, net_cash_flow);

    let quality = QualityMetrics {
        cash_conversion_rate: safe_div(net_cash_flow, net_income, 0.0),
        non_cash_portion: safe_div(non_cash_adjustments, total_revenue, 0.0),
        reconciliation_accuracy: (1.0
            - reconciliation.difference.abs() / net_income.abs().max(ACCURACY_EPSILON))
        .max(0.0),
        balanced: reconciliation.difference.abs() <= options.tolerance,
    };

    debug!(
        "Reconciled {}-{:02}: {} accrual transactions, net income {:.2}, net cash flow {:.2}, difference {:.2}",
        year,
        month,
        accrual.len(),
        net_income,
        net_cash_flow,
        reconciliation.difference
    );

    Ok(PeriodAnalysis {
        total_revenue,
        total_expenses,
        cash_flow,
        non_cash,
        reconciliation,
        quality,
        statement: IncomeStatement::from_groups(&grouped),
        transaction_count: accrual.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn revenue(id: &str, date: NaiveDate, amount: f64, received: Option<NaiveDate>) -> FinancialTransaction {
        FinancialTransaction {
            id: id.to_string(),
            reference_date: date,
            description: id.to_string(),
            amount,
            kind: TransactionKind::Revenue,
            raw_category: "cattle_sales".to_string(),
            cash_flow_date: received,
            impacts_cash: received.is_some(),
            is_reconciled: false,
            cycle_id: None,
            notes: None,
        }
    }

    fn expense(
        id: &str,
        category: &str,
        date: NaiveDate,
        amount: f64,
        paid: Option<NaiveDate>,
    ) -> FinancialTransaction {
        FinancialTransaction {
            id: id.to_string(),
            reference_date: date,
            description: id.to_string(),
            amount,
            kind: TransactionKind::Expense,
            raw_category: category.to_string(),
            cash_flow_date: paid,
            impacts_cash: paid.is_some(),
            is_reconciled: false,
            cycle_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_received_revenue_and_unpaid_expense() {
        // One revenue of 15,000 received, one expense of 10,000 accrual-only:
        // net income 5,000, net cash flow 15,000, difference -10,000.
        let map = CategoryMap::default_feedlot();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let transactions = vec![
            revenue("r1", sep, 15_000.0, Some(sep)),
            expense("e1", "feed", sep, 10_000.0, None),
        ];

        let analysis =
            reconcile(2025, 9, &transactions, &map, &ReconcileOptions::default()).unwrap();

        assert_eq!(analysis.reconciliation.net_income, 5_000.0);
        assert_eq!(analysis.reconciliation.net_cash_flow, 15_000.0);
        assert_eq!(analysis.reconciliation.non_cash_adjustments, 0.0);
        assert_eq!(analysis.reconciliation.difference, -10_000.0);
        assert_eq!(analysis.cash_flow.operating.receipts, 15_000.0);
        assert_eq!(analysis.cash_flow.operating.payments, 0.0);
        assert!((analysis.quality.cash_conversion_rate - 3.0).abs() < 1e-9);
        assert!(!analysis.quality.balanced);
    }

    #[test]
    fn test_identity_holds_with_non_cash_items() {
        let map = CategoryMap::default_feedlot();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 12).unwrap();
        let transactions = vec![
            revenue("r1", sep, 50_000.0, Some(sep)),
            expense("e1", "feed", sep, 20_000.0, Some(sep)),
            expense("m1", "mortality", sep, 5_812.0, None),
        ];

        let analysis =
            reconcile(2025, 9, &transactions, &map, &ReconcileOptions::default()).unwrap();

        let r = &analysis.reconciliation;
        assert_eq!(r.net_income, 24_188.0);
        assert_eq!(r.net_cash_flow, 30_000.0);
        assert_eq!(r.non_cash_adjustments, 5_812.0);
        assert!(
            (r.difference - (r.net_income - r.non_cash_adjustments - r.net_cash_flow)).abs()
                < 1e-9
        );
        assert_eq!(analysis.non_cash.mortality, 5_812.0);
    }

    #[test]
    fn test_cash_membership_uses_cash_flow_date() {
        let map = CategoryMap::default_feedlot();
        let aug = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();

        // Accrued in August, settled in September: cash counts in September
        // only, accrual counts in August only.
        let transactions = vec![revenue("r1", aug, 10_000.0, Some(sep))];

        let august = reconcile(2025, 8, &transactions, &map, &ReconcileOptions::default()).unwrap();
        assert_eq!(august.reconciliation.net_income, 10_000.0);
        assert_eq!(august.reconciliation.net_cash_flow, 0.0);

        let september =
            reconcile(2025, 9, &transactions, &map, &ReconcileOptions::default()).unwrap();
        assert_eq!(september.reconciliation.net_income, 0.0);
        assert_eq!(september.reconciliation.net_cash_flow, 10_000.0);
    }

    #[test]
    fn test_activity_buckets() {
        let map = CategoryMap::default_feedlot();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let transactions = vec![
            revenue("r1", sep, 30_000.0, Some(sep)),
            expense("e1", "Equipamentos", sep, 12_000.0, Some(sep)),
            expense("e2", "interest", sep, 2_000.0, Some(sep)),
        ];

        let analysis =
            reconcile(2025, 9, &transactions, &map, &ReconcileOptions::default()).unwrap();

        assert_eq!(analysis.cash_flow.operating.net, 30_000.0);
        assert_eq!(analysis.cash_flow.investing.net, -12_000.0);
        assert_eq!(analysis.cash_flow.financing.net, -2_000.0);
        assert_eq!(analysis.reconciliation.net_cash_flow, 16_000.0);
    }

    #[test]
    fn test_exclude_non_cash_items() {
        let map = CategoryMap::default_feedlot();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let transactions = vec![
            revenue("r1", sep, 20_000.0, Some(sep)),
            expense("m1", "mortality", sep, 4_000.0, None),
        ];

        let options = ReconcileOptions {
            include_non_cash_items: false,
            ..Default::default()
        };
        let analysis = reconcile(2025, 9, &transactions, &map, &options).unwrap();

        assert_eq!(analysis.reconciliation.net_income, 20_000.0);
        assert_eq!(analysis.reconciliation.non_cash_adjustments, 0.0);
        assert_eq!(analysis.non_cash, NonCashBreakdown::default());
        assert_eq!(analysis.transaction_count, 1);

        // Identity still holds by construction.
        let r = &analysis.reconciliation;
        assert_eq!(r.difference, r.net_income - r.non_cash_adjustments - r.net_cash_flow);
    }

    #[test]
    fn test_cycle_filter() {
        let map = CategoryMap::default_feedlot();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let mut in_cycle = revenue("r1", sep, 10_000.0, Some(sep));
        in_cycle.cycle_id = Some("cycle-1".to_string());
        let out_of_cycle = revenue("r2", sep, 99_000.0, Some(sep));

        let options = ReconcileOptions {
            cycle_id: Some("cycle-1".to_string()),
            ..Default::default()
        };
        let analysis =
            reconcile(2025, 9, &[in_cycle, out_of_cycle], &map, &options).unwrap();

        assert_eq!(analysis.total_revenue, 10_000.0);
        assert_eq!(analysis.transaction_count, 1);
    }

    #[test]
    fn test_empty_period_is_all_zero_and_finite() {
        let map = CategoryMap::default_feedlot();
        let analysis = reconcile(2025, 9, &[], &map, &ReconcileOptions::default()).unwrap();

        assert_eq!(analysis.reconciliation.net_income, 0.0);
        assert_eq!(analysis.reconciliation.difference, 0.0);
        assert_eq!(analysis.quality.cash_conversion_rate, 0.0);
        assert_eq!(analysis.quality.non_cash_portion, 0.0);
        assert!(analysis.quality.reconciliation_accuracy.is_finite());
        assert!(analysis.quality.balanced);
    }

    #[test]
    fn test_invalid_month_rejected() {
        let map = CategoryMap::default_feedlot();
        assert!(reconcile(2025, 13, &[], &map, &ReconcileOptions::default()).is_err());
        assert!(reconcile(2025, 0, &[], &map, &ReconcileOptions::default()).is_err());
    }

    #[test]
    fn test_deterministic() {
        let map = CategoryMap::default_feedlot();
        let sep = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let transactions = vec![
            revenue("r1", sep, 15_000.0, Some(sep)),
            expense("e1", "feed", sep, 10_000.0, None),
        ];

        let first = reconcile(2025, 9, &transactions, &map, &ReconcileOptions::default()).unwrap();
        let second = reconcile(2025, 9, &transactions, &map, &ReconcileOptions::default()).unwrap();

        assert_eq!(first.reconciliation, second.reconciliation);
        assert_eq!(first.cash_flow, second.cash_flow);
        assert_eq!(first.statement, second.statement);
    }
}
