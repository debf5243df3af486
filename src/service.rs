//! The exposed analysis surface plus its persistence seams.
//!
//! `PeriodStore` keys snapshots by their natural (year, month) key, so a
//! regeneration always replaces, never appends. SQL-backed callers implement
//! the trait over a unique constraint on the same key; the in-memory map here
//! carries the identical upsert semantics for tests and embedded use.

use crate::classifier::CategoryMap;
use crate::dashboard::{self, ComparisonReport, YearDashboard};
use crate::error::{ReconciliationError, Result};
use crate::reconciliation::{reconcile, ReconcileOptions};
use crate::schema::{AnalysisStatus, FinancialTransaction, IntegratedAnalysisPeriod};
use crate::utils::PeriodKey;
use log::{info, warn};
use std::collections::BTreeMap;

pub trait PeriodStore {
    fn upsert(&mut self, period: IntegratedAnalysisPeriod) -> Result<()>;
    fn get(&self, year: i32, month: u32) -> Option<IntegratedAnalysisPeriod>;
    fn list_year(&self, year: i32) -> Vec<IntegratedAnalysisPeriod>;
    fn list_range(&self, start: PeriodKey, end: PeriodKey) -> Vec<IntegratedAnalysisPeriod>;
}

/// Read-only supplier of ledger transactions.
pub trait LedgerSource {
    fn transactions(&self) -> Vec<FinancialTransaction>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    periods: BTreeMap<PeriodKey, IntegratedAnalysisPeriod>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

impl PeriodStore for MemoryStore {
    fn upsert(&mut self, period: IntegratedAnalysisPeriod) -> Result<()> {
        self.periods.insert(period.key(), period);
        Ok(())
    }

    fn get(&self, year: i32, month: u32) -> Option<IntegratedAnalysisPeriod> {
        let key = PeriodKey { year, month };
        self.periods.get(&key).cloned()
    }

    fn list_year(&self, year: i32) -> Vec<IntegratedAnalysisPeriod> {
        let start = PeriodKey { year, month: 1 };
        let end = PeriodKey { year, month: 12 };
        self.periods.range(start..=end).map(|(_, p)| p.clone()).collect()
    }

    fn list_range(&self, start: PeriodKey, end: PeriodKey) -> Vec<IntegratedAnalysisPeriod> {
        self.periods.range(start..=end).map(|(_, p)| p.clone()).collect()
    }
}

#[derive(Debug, Default)]
pub struct VecLedger {
    transactions: Vec<FinancialTransaction>,
}

impl VecLedger {
    pub fn new(transactions: Vec<FinancialTransaction>) -> Self {
        Self { transactions }
    }

    pub fn push(&mut self, tx: FinancialTransaction) {
        self.transactions.push(tx);
    }
}

impl LedgerSource for VecLedger {
    fn transactions(&self) -> Vec<FinancialTransaction> {
        self.transactions.clone()
    }
}

/// Integrated analysis service: generation, retrieval, comparison, dashboard
/// and the period lifecycle.
pub struct AnalysisService<S, L> {
    store: S,
    ledger: L,
    category_map: CategoryMap,
}

impl<S: PeriodStore, L: LedgerSource> AnalysisService<S, L> {
    pub fn new(store: S, ledger: L) -> Self {
        Self {
            store,
            ledger,
            category_map: CategoryMap::default_feedlot(),
        }
    }

    pub fn with_category_map(store: S, ledger: L, category_map: CategoryMap) -> Self {
        Self {
            store,
            ledger,
            category_map,
        }
    }

    pub fn category_map(&self) -> &CategoryMap {
        &self.category_map
    }

    /// Computes or recomputes one period and upserts the snapshot. Locked
    /// (approved/closed) periods are rejected until explicitly reopened.
    /// Generation is idempotent: the computation is a pure function of the
    /// ledger at read time, and the store replaces by natural key.
    pub fn generate(
        &mut self,
        year: i32,
        month: u32,
        options: &ReconcileOptions,
    ) -> Result<IntegratedAnalysisPeriod> {
        PeriodKey::new(year, month)?;

        let status = match self.store.get(year, month) {
            Some(existing) if existing.status.is_locked() => {
                return Err(ReconciliationError::PeriodLocked {
                    year,
                    month,
                    status: existing.status,
                });
            }
            Some(existing) => existing.status,
            None => AnalysisStatus::Draft,
        };

        info!("Generating integrated analysis for {}-{:02}", year, month);

        let transactions = self.ledger.transactions();
        let analysis = reconcile(year, month, &transactions, &self.category_map, options)?;

        if !analysis.quality.balanced {
            warn!(
                "Reconciliation difference {:.2} for {}-{:02} exceeds tolerance; period flagged for review",
                analysis.reconciliation.difference, year, month
            );
        }

        let period = IntegratedAnalysisPeriod {
            reference_year: year,
            reference_month: month,
            total_revenue: analysis.total_revenue,
            total_expenses: analysis.total_expenses,
            cash_flow: analysis.cash_flow,
            non_cash: analysis.non_cash,
            reconciliation: analysis.reconciliation,
            quality: analysis.quality,
            statement: analysis.statement,
            status,
            transaction_count: analysis.transaction_count,
            cycle_id: options.cycle_id.clone(),
        };

        self.store.upsert(period.clone())?;
        Ok(period)
    }

    pub fn get_by_period(&self, year: i32, month: u32) -> Result<IntegratedAnalysisPeriod> {
        PeriodKey::new(year, month)?;
        self.store
            .get(year, month)
            .ok_or(ReconciliationError::PeriodNotFound { year, month })
    }

    pub fn get_by_year(&self, year: i32) -> Vec<IntegratedAnalysisPeriod> {
        self.store.list_year(year)
    }

    pub fn compare(
        &self,
        start_year: i32,
        start_month: u32,
        end_year: i32,
        end_month: u32,
    ) -> Result<ComparisonReport> {
        let start = PeriodKey::new(start_year, start_month)?;
        let end = PeriodKey::new(end_year, end_month)?;
        if start > end {
            return Err(ReconciliationError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(dashboard::compare(&self.store.list_range(start, end)))
    }

    pub fn dashboard(&self, year: i32) -> YearDashboard {
        dashboard::build_dashboard(year, &self.store.list_year(year))
    }

    pub fn submit_for_review(&mut self, year: i32, month: u32) -> Result<IntegratedAnalysisPeriod> {
        self.transition(year, month, AnalysisStatus::Reviewing)
    }

    pub fn approve(&mut self, year: i32, month: u32) -> Result<IntegratedAnalysisPeriod> {
        self.transition(year, month, AnalysisStatus::Approved)
    }

    pub fn close(&mut self, year: i32, month: u32) -> Result<IntegratedAnalysisPeriod> {
        self.transition(year, month, AnalysisStatus::Closed)
    }

    /// Reopens an approved period for regeneration. Closed periods are
    /// terminal and stay closed.
    pub fn reopen(&mut self, year: i32, month: u32) -> Result<IntegratedAnalysisPeriod> {
        self.transition(year, month, AnalysisStatus::Draft)
    }

    fn transition(
        &mut self,
        year: i32,
        month: u32,
        to: AnalysisStatus,
    ) -> Result<IntegratedAnalysisPeriod> {
        PeriodKey::new(year, month)?;
        let mut period = self
            .store
            .get(year, month)
            .ok_or(ReconciliationError::PeriodNotFound { year, month })?;

        if !period.status.can_transition(to) {
            return Err(ReconciliationError::InvalidTransition {
                from: period.status,
                to,
            });
        }

        info!(
            "Period {}-{:02}: {:?} -> {:?}",
            year, month, period.status, to
        );
        period.status = to;
        self.store.upsert(period.clone())?;
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TransactionKind;
    use chrono::NaiveDate;

    fn ledger_with_one_sale() -> VecLedger {
        let date = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        VecLedger::new(vec![FinancialTransaction {
            id: "r1".to_string(),
            reference_date: date,
            description: "Venda".to_string(),
            amount: 15_000.0,
            kind: TransactionKind::Revenue,
            raw_category: "cattle_sales".to_string(),
            cash_flow_date: Some(date),
            impacts_cash: true,
            is_reconciled: false,
            cycle_id: None,
            notes: None,
        }])
    }

    fn service() -> AnalysisService<MemoryStore, VecLedger> {
        AnalysisService::new(MemoryStore::new(), ledger_with_one_sale())
    }

    #[test]
    fn test_generate_creates_draft() {
        let mut service = service();
        let period = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap();

        assert_eq!(period.status, AnalysisStatus::Draft);
        assert_eq!(period.total_revenue, 15_000.0);
        assert_eq!(service.get_by_period(2025, 9).unwrap(), period);
    }

    #[test]
    fn test_generate_is_idempotent_upsert() {
        let mut service = service();
        let first = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap();
        let second = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.get_by_year(2025).len(), 1);
    }

    #[test]
    fn test_generate_preserves_reviewing_status() {
        let mut service = service();
        service.generate(2025, 9, &ReconcileOptions::default()).unwrap();
        service.submit_for_review(2025, 9).unwrap();

        let regenerated = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap();
        assert_eq!(regenerated.status, AnalysisStatus::Reviewing);
    }

    #[test]
    fn test_generate_rejects_locked_periods() {
        let mut service = service();
        service.generate(2025, 9, &ReconcileOptions::default()).unwrap();
        service.submit_for_review(2025, 9).unwrap();
        service.approve(2025, 9).unwrap();

        let err = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReconciliationError::PeriodLocked { .. }));

        service.close(2025, 9).unwrap();
        let err = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReconciliationError::PeriodLocked { .. }));
    }

    #[test]
    fn test_reopen_allows_regeneration() {
        let mut service = service();
        service.generate(2025, 9, &ReconcileOptions::default()).unwrap();
        service.submit_for_review(2025, 9).unwrap();
        service.approve(2025, 9).unwrap();

        service.reopen(2025, 9).unwrap();
        let period = service
            .generate(2025, 9, &ReconcileOptions::default())
            .unwrap();
        assert_eq!(period.status, AnalysisStatus::Draft);
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut service = service();
        service.generate(2025, 9, &ReconcileOptions::default()).unwrap();
        service.submit_for_review(2025, 9).unwrap();
        service.approve(2025, 9).unwrap();
        service.close(2025, 9).unwrap();

        let err = service.reopen(2025, 9).unwrap_err();
        assert!(matches!(err, ReconciliationError::InvalidTransition { .. }));
    }

    #[test]
    fn test_lifecycle_requires_existing_period() {
        let mut service = service();
        let err = service.approve(2025, 9).unwrap_err();
        assert!(matches!(err, ReconciliationError::PeriodNotFound { .. }));
    }

    #[test]
    fn test_validation_errors() {
        let mut service = service();
        assert!(service
            .generate(2025, 13, &ReconcileOptions::default())
            .is_err());
        assert!(service.get_by_period(2025, 0).is_err());
        assert!(service.compare(2025, 6, 2025, 3).is_err());
        assert!(service.compare(2025, 3, 2024, 12).is_err());
    }

    #[test]
    fn test_compare_range_spans_years() {
        let mut service = service();
        service.generate(2025, 9, &ReconcileOptions::default()).unwrap();

        let report = service.compare(2024, 1, 2026, 12).unwrap();
        assert_eq!(report.periods.len(), 1);
        assert_eq!(report.summary.total_revenue, 15_000.0);
    }

    #[test]
    fn test_dashboard_over_store() {
        let mut service = service();
        service.generate(2025, 9, &ReconcileOptions::default()).unwrap();

        let dashboard = service.dashboard(2025);
        assert_eq!(dashboard.summary.total_revenue, 15_000.0);
        assert_eq!(dashboard.trends.len(), 1);
        assert_eq!(dashboard.trends[0].month, 9);

        // Empty year stays zero-guarded.
        let empty = service.dashboard(2024);
        assert_eq!(empty.summary.total_revenue, 0.0);
    }
}
