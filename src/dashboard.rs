//! Year dashboards, monthly trends and cross-period comparisons, derived from
//! persisted analysis snapshots. Nothing here is persisted.

use crate::schema::IntegratedAnalysisPeriod;
use crate::utils::safe_div;
use serde::{Deserialize, Serialize};

const ACCURACY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: u32,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub cash_flow: f64,
    pub reconciliation_difference: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_net_income: f64,
    pub total_cash_flow: f64,
    pub total_non_cash_items: f64,
    pub net_margin: f64,
    pub cash_flow_margin: f64,
}

/// Cash and non-cash composition across the year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub cash_receipts: f64,
    pub cash_payments: f64,
    pub depreciation: f64,
    pub mortality: f64,
    pub biological_changes: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateQuality {
    pub cash_conversion_rate: f64,
    pub non_cash_portion: f64,
    pub reconciliation_accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearDashboard {
    pub year: i32,
    pub summary: DashboardSummary,
    pub trends: Vec<MonthlyTrend>,
    pub breakdown: CategoryBreakdown,
    pub quality: AggregateQuality,
}

/// Builds the consolidated dashboard for one year from whatever snapshots
/// exist (0 to 12). All ratios are zero-guarded, so an empty year yields an
/// all-zero dashboard rather than an error.
pub fn build_dashboard(year: i32, periods: &[IntegratedAnalysisPeriod]) -> YearDashboard {
    let mut rows: Vec<&IntegratedAnalysisPeriod> = periods
        .iter()
        .filter(|p| p.reference_year == year)
        .collect();
    rows.sort_by_key(|p| p.reference_month);

    let total_revenue: f64 = rows.iter().map(|p| p.total_revenue).sum();
    let total_expenses: f64 = rows.iter().map(|p| p.total_expenses).sum();
    let total_net_income: f64 = rows.iter().map(|p| p.reconciliation.net_income).sum();
    let total_cash_flow: f64 = rows.iter().map(|p| p.reconciliation.net_cash_flow).sum();
    let total_non_cash_items: f64 = rows.iter().map(|p| p.non_cash.total()).sum();
    let total_abs_difference: f64 = rows
        .iter()
        .map(|p| p.reconciliation.difference.abs())
        .sum();

    let trends = rows
        .iter()
        .map(|p| MonthlyTrend {
            month: p.reference_month,
            revenue: p.total_revenue,
            expenses: p.total_expenses,
            net_income: p.reconciliation.net_income,
            cash_flow: p.reconciliation.net_cash_flow,
            reconciliation_difference: p.reconciliation.difference,
        })
        .collect();

    let breakdown = CategoryBreakdown {
        cash_receipts: rows.iter().map(|p| p.cash_flow.total_receipts()).sum(),
        cash_payments: rows.iter().map(|p| p.cash_flow.total_payments()).sum(),
        depreciation: rows.iter().map(|p| p.non_cash.depreciation).sum(),
        mortality: rows.iter().map(|p| p.non_cash.mortality).sum(),
        biological_changes: rows
            .iter()
            .map(|p| p.non_cash.biological_adjustments.abs())
            .sum(),
    };

    let quality = AggregateQuality {
        cash_conversion_rate: safe_div(total_cash_flow, total_net_income, 0.0),
        non_cash_portion: safe_div(total_non_cash_items, total_revenue, 0.0),
        reconciliation_accuracy: (1.0
            - total_abs_difference / total_net_income.abs().max(ACCURACY_EPSILON))
        .max(0.0),
    };

    YearDashboard {
        year,
        summary: DashboardSummary {
            total_revenue,
            total_expenses,
            total_net_income,
            total_cash_flow,
            total_non_cash_items,
            net_margin: safe_div(total_net_income, total_revenue, 0.0) * 100.0,
            cash_flow_margin: safe_div(total_cash_flow, total_revenue, 0.0) * 100.0,
        },
        trends,
        breakdown,
        quality,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub year: i32,
    pub month: u32,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_income: f64,
    pub net_cash_flow: f64,
    pub reconciliation_difference: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_net_income: f64,
    pub total_cash_flow: f64,
    pub average_monthly_revenue: f64,
    pub average_monthly_expenses: f64,
    pub average_monthly_net_income: f64,
    pub average_monthly_cash_flow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub periods: Vec<ComparisonRow>,
    pub summary: ComparisonSummary,
}

/// Per-period rows plus period-count-normalized averages over an arbitrary
/// range of snapshots.
pub fn compare(periods: &[IntegratedAnalysisPeriod]) -> ComparisonReport {
    let mut rows: Vec<ComparisonRow> = periods
        .iter()
        .map(|p| ComparisonRow {
            year: p.reference_year,
            month: p.reference_month,
            total_revenue: p.total_revenue,
            total_expenses: p.total_expenses,
            net_income: p.reconciliation.net_income,
            net_cash_flow: p.reconciliation.net_cash_flow,
            reconciliation_difference: p.reconciliation.difference,
        })
        .collect();
    rows.sort_by_key(|r| (r.year, r.month));

    let count = rows.len() as f64;
    let total_revenue: f64 = rows.iter().map(|r| r.total_revenue).sum();
    let total_expenses: f64 = rows.iter().map(|r| r.total_expenses).sum();
    let total_net_income: f64 = rows.iter().map(|r| r.net_income).sum();
    let total_cash_flow: f64 = rows.iter().map(|r| r.net_cash_flow).sum();

    let summary = ComparisonSummary {
        total_revenue,
        total_expenses,
        total_net_income,
        total_cash_flow,
        average_monthly_revenue: safe_div(total_revenue, count, 0.0),
        average_monthly_expenses: safe_div(total_expenses, count, 0.0),
        average_monthly_net_income: safe_div(total_net_income, count, 0.0),
        average_monthly_cash_flow: safe_div(total_cash_flow, count, 0.0),
    };

    ComparisonReport {
        periods: rows,
        summary,
    }
}
