use crate::statement::IncomeStatement;
use crate::utils::PeriodKey;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    #[schemars(description = "A revenue movement (credit balance): sales, leases, financial income")]
    Revenue,

    #[schemars(description = "An expense movement (debit balance): purchases, costs, losses")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowActivity {
    #[schemars(
        description = "Day-to-day operations: animal acquisition, feed, freight, commissions, admin"
    )]
    Operating,

    #[schemars(description = "Long-lived assets: equipment, construction, infrastructure")]
    Investing,

    #[schemars(description = "Funding: loans, interest, bank fees")]
    Financing,
}

/// One ledger movement. Immutable once created except for payment/receipt
/// confirmation, which sets `cash_flow_date` and `impacts_cash` upstream.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinancialTransaction {
    #[schemars(description = "Identifier minted by the upstream expense/revenue service")]
    pub id: String,

    #[schemars(description = "Accrual date: when the movement was economically incurred")]
    pub reference_date: NaiveDate,

    pub description: String,

    #[schemars(description = "Non-negative magnitude; the sign comes from `kind`")]
    pub amount: f64,

    pub kind: TransactionKind,

    #[schemars(
        description = "Free-form or coded category as recorded upstream (e.g. 'feed', 'Frete de Gado')"
    )]
    pub raw_category: String,

    #[serde(default)]
    #[schemars(description = "Date cash actually moved, if payment/receipt was confirmed")]
    pub cash_flow_date: Option<NaiveDate>,

    #[serde(default)]
    pub impacts_cash: bool,

    #[serde(default)]
    pub is_reconciled: bool,

    #[serde(default)]
    #[schemars(description = "Production cycle this movement belongs to, if any")]
    pub cycle_id: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl FinancialTransaction {
    /// Revenue positive, expense negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Revenue => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Receipts, payments and their net for one cash-flow activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityFlow {
    pub receipts: f64,
    pub payments: f64,
    pub net: f64,
}

impl ActivityFlow {
    pub fn add_receipt(&mut self, amount: f64) {
        self.receipts += amount;
        self.net = self.receipts - self.payments;
    }

    pub fn add_payment(&mut self, amount: f64) {
        self.payments += amount;
        self.net = self.receipts - self.payments;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowBreakdown {
    pub operating: ActivityFlow,
    pub investing: ActivityFlow,
    pub financing: ActivityFlow,
}

impl CashFlowBreakdown {
    pub fn flow_mut(&mut self, activity: CashFlowActivity) -> &mut ActivityFlow {
        match activity {
            CashFlowActivity::Operating => &mut self.operating,
            CashFlowActivity::Investing => &mut self.investing,
            CashFlowActivity::Financing => &mut self.financing,
        }
    }

    /// The three activity nets always sum to the period's net cash flow.
    pub fn net_cash_flow(&self) -> f64 {
        self.operating.net + self.investing.net + self.financing.net
    }

    pub fn total_receipts(&self) -> f64 {
        self.operating.receipts + self.investing.receipts + self.financing.receipts
    }

    pub fn total_payments(&self) -> f64 {
        self.operating.payments + self.investing.payments + self.financing.payments
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NonCashBreakdown {
    pub depreciation: f64,
    pub mortality: f64,
    pub biological_adjustments: f64,
    pub other: f64,
}

impl NonCashBreakdown {
    pub fn total(&self) -> f64 {
        self.depreciation + self.mortality + self.biological_adjustments + self.other
    }
}

/// Accrual net income reconciled against cash flow. `difference` is derived in
/// the constructor and nowhere else, so the identity
/// `difference = net_income - non_cash_adjustments - net_cash_flow` holds by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub net_income: f64,
    pub non_cash_adjustments: f64,
    pub net_cash_flow: f64,
    pub difference: f64,
}

impl ReconciliationResult {
    pub fn derive(net_income: f64, non_cash_adjustments: f64, net_cash_flow: f64) -> Self {
        Self {
            net_income,
            non_cash_adjustments,
            net_cash_flow,
            difference: net_income - non_cash_adjustments - net_cash_flow,
        }
    }
}

/// Quality signals surfaced alongside each reconciliation. A large difference
/// is not an error: `balanced = false` keeps the period in draft for human
/// review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub cash_conversion_rate: f64,
    pub non_cash_portion: f64,
    pub reconciliation_accuracy: f64,
    pub balanced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Draft,
    Reviewing,
    Approved,
    Closed,
}

impl AnalysisStatus {
    /// Forward-only lifecycle. The single back-transition is the explicit
    /// reopen of an approved period; nothing leaves `Closed`.
    pub fn can_transition(self, to: AnalysisStatus) -> bool {
        use AnalysisStatus::*;
        matches!(
            (self, to),
            (Draft, Reviewing) | (Reviewing, Approved) | (Approved, Closed) | (Approved, Draft)
        )
    }

    /// Locked periods reject regeneration until explicitly reopened.
    pub fn is_locked(self) -> bool {
        matches!(self, AnalysisStatus::Approved | AnalysisStatus::Closed)
    }
}

/// Persisted snapshot of one period's analysis, keyed by
/// (`reference_year`, `reference_month`). Regeneration upserts in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedAnalysisPeriod {
    pub reference_year: i32,
    pub reference_month: u32,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub cash_flow: CashFlowBreakdown,
    pub non_cash: NonCashBreakdown,
    pub reconciliation: ReconciliationResult,
    pub quality: QualityMetrics,
    pub statement: IncomeStatement,
    pub status: AnalysisStatus,
    pub transaction_count: usize,
    pub cycle_id: Option<String>,
}

impl IntegratedAnalysisPeriod {
    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            year: self.reference_year,
            month: self.reference_month,
        }
    }
}
