//! # Feedlot Reconciliation
//!
//! An integrated financial reconciliation and reporting engine for livestock
//! feedlot operations: it turns raw ledger entries (expenses and revenues tied
//! to purchases, sales and mortality events) into period statements, and
//! reconciles accrual-basis net income against cash-basis net cash flow.
//!
//! ## Core Concepts
//!
//! - **Accrual basis**: a transaction counts in the period of its reference
//!   date, paid or not
//! - **Cash basis**: a transaction counts only when cash actually moved, in
//!   the period of its cash-flow date
//! - **Non-cash items**: mortality write-offs, depreciation and biological
//!   revaluations affect income but never cash
//! - **Reconciliation identity**: `difference = net income − non-cash
//!   adjustments − net cash flow`, held by construction
//!
//! ## Example
//!
//! ```rust,ignore
//! use feedlot_reconciliation::*;
//! use chrono::NaiveDate;
//!
//! let ledger = VecLedger::new(vec![FinancialTransaction {
//!     id: "r1".to_string(),
//!     reference_date: NaiveDate::from_ymd_opt(2025, 9, 10).unwrap(),
//!     description: "Venda de gado - Lote 42".to_string(),
//!     amount: 15_000.0,
//!     kind: TransactionKind::Revenue,
//!     raw_category: "cattle_sales".to_string(),
//!     cash_flow_date: NaiveDate::from_ymd_opt(2025, 9, 10),
//!     impacts_cash: true,
//!     is_reconciled: false,
//!     cycle_id: None,
//!     notes: None,
//! }]);
//!
//! let mut service = AnalysisService::new(MemoryStore::new(), ledger);
//! let period = service.generate(2025, 9, &ReconcileOptions::default())?;
//!
//! assert_eq!(period.reconciliation.net_income, 15_000.0);
//! let dashboard = service.dashboard(2025);
//! ```

pub mod classifier;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod noncash;
pub mod reconciliation;
pub mod schema;
pub mod service;
pub mod splitter;
pub mod statement;
pub mod utils;

pub use classifier::{
    display_name, technical_name, AccountingGroup, CategoryMap, GroupId, GroupKind, GroupedTotals,
};
pub use dashboard::{
    build_dashboard, compare, AggregateQuality, CategoryBreakdown, ComparisonReport,
    ComparisonRow, ComparisonSummary, DashboardSummary, MonthlyTrend, YearDashboard,
};
pub use error::{ReconciliationError, Result};
pub use ledger::{
    collect_transactions, death_to_transaction, expense_to_transaction, purchase_to_transaction,
    sale_to_transaction, DeathRecord, ExpenseRecord, PurchaseRecord, SaleRecord,
};
pub use noncash::{
    assess_pen_mortality, death_event_to_transaction, mortality_loss, LotCost, LotImpact,
    MortalityAssessment, PenLotShare,
};
pub use reconciliation::{reconcile, PeriodAnalysis, ReconcileOptions, DEFAULT_TOLERANCE};
pub use schema::{
    ActivityFlow, AnalysisStatus, CashFlowActivity, CashFlowBreakdown, FinancialTransaction,
    IntegratedAnalysisPeriod, NonCashBreakdown, QualityMetrics, ReconciliationResult,
    TransactionKind,
};
pub use service::{AnalysisService, LedgerSource, MemoryStore, PeriodStore, VecLedger};
pub use splitter::{split, CashImpact, CashSplit, NonCashKind};
pub use statement::IncomeStatement;
pub use utils::{safe_div, PeriodKey};

/// Reconciles one period directly, without a store or service around it.
pub fn reconcile_period(
    year: i32,
    month: u32,
    transactions: &[FinancialTransaction],
    map: &CategoryMap,
    options: &ReconcileOptions,
) -> Result<PeriodAnalysis> {
    reconciliation::reconcile(year, month, transactions, map, options)
}
