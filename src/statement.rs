//! Income statement (DRE) waterfall built from classified group totals.

use crate::classifier::{GroupId, GroupedTotals};
use crate::utils::safe_div;
use serde::{Deserialize, Serialize};

/// Fixed waterfall: gross revenue → gross result → operating result → net
/// result, with margins. Margins fall back to 0 when their denominator is 0,
/// never NaN or infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub gross_revenue: f64,
    pub other_revenue: f64,
    pub total_revenue: f64,

    pub acquisition_cost: f64,
    pub logistics_cost: f64,
    pub commission_cost: f64,
    pub total_acquisition_cost: f64,

    pub gross_result: f64,
    pub gross_margin: f64,

    pub production_expenses: f64,
    pub operational_losses: f64,
    pub admin_expenses: f64,
    pub total_operating_expenses: f64,

    pub operating_result: f64,
    pub operating_margin: f64,

    pub financial_expenses: f64,

    pub net_result: f64,
    pub net_margin: f64,
}

impl IncomeStatement {
    pub fn from_groups(grouped: &GroupedTotals) -> Self {
        let gross_revenue = grouped.total(GroupId::OperationalRevenue);
        let other_revenue = grouped.total(GroupId::OtherRevenue);
        let total_revenue = gross_revenue + other_revenue;

        let acquisition_cost = grouped.total(GroupId::AcquisitionCosts);
        let logistics_cost = grouped.total(GroupId::LogisticsCosts);
        let commission_cost = grouped.total(GroupId::CommissionCosts);
        let total_acquisition_cost = acquisition_cost + logistics_cost + commission_cost;

        let gross_result = gross_revenue - total_acquisition_cost;
        let gross_margin = safe_div(gross_result, gross_revenue, 0.0) * 100.0;

        let production_expenses = grouped.total(GroupId::ProductionExpenses);
        let operational_losses = grouped.total(GroupId::OperationalLosses);
        let admin_expenses = grouped.total(GroupId::AdminExpenses);
        let total_operating_expenses = production_expenses + operational_losses + admin_expenses;

        let operating_result = gross_result - total_operating_expenses;
        let operating_margin = safe_div(operating_result, gross_revenue, 0.0) * 100.0;

        let financial_expenses = grouped.total(GroupId::FinancialExpenses);

        let net_result = operating_result - financial_expenses + other_revenue;
        let net_margin = safe_div(net_result, total_revenue, 0.0) * 100.0;

        Self {
            gross_revenue,
            other_revenue,
            total_revenue,
            acquisition_cost,
            logistics_cost,
            commission_cost,
            total_acquisition_cost,
            gross_result,
            gross_margin,
            production_expenses,
            operational_losses,
            admin_expenses,
            total_operating_expenses,
            operating_result,
            operating_margin,
            financial_expenses,
            net_result,
            net_margin,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Line,Amount\n");
        output.push_str(&format!("Gross Revenue,{:.2}\n", self.gross_revenue));
        output.push_str(&format!("Other Revenue,{:.2}\n", self.other_revenue));
        output.push_str(&format!("Total Revenue,{:.2}\n", self.total_revenue));
        output.push_str(&format!("Acquisition Cost,{:.2}\n", self.acquisition_cost));
        output.push_str(&format!("Logistics Cost,{:.2}\n", self.logistics_cost));
        output.push_str(&format!("Commission Cost,{:.2}\n", self.commission_cost));
        output.push_str(&format!(
            "Total Acquisition Cost,{:.2}\n",
            self.total_acquisition_cost
        ));
        output.push_str(&format!("Gross Result,{:.2}\n", self.gross_result));
        output.push_str(&format!("Gross Margin %,{:.2}\n", self.gross_margin));
        output.push_str(&format!(
            "Production Expenses,{:.2}\n",
            self.production_expenses
        ));
        output.push_str(&format!(
            "Operational Losses,{:.2}\n",
            self.operational_losses
        ));
        output.push_str(&format!("Admin Expenses,{:.2}\n", self.admin_expenses));
        output.push_str(&format!(
            "Total Operating Expenses,{:.2}\n",
            self.total_operating_expenses
        ));
        output.push_str(&format!("Operating Result,{:.2}\n", self.operating_result));
        output.push_str(&format!("Operating Margin %,{:.2}\n", self.operating_margin));
        output.push_str(&format!(
            "Financial Expenses,{:.2}\n",
            self.financial_expenses
        ));
        output.push_str(&format!("Net Result,{:.2}\n", self.net_result));
        output.push_str(&format!("Net Margin %,{:.2}\n", self.net_margin));
        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("# Income Statement\n\n");
        output.push_str("| Line | Amount |\n");
        output.push_str("|---|---:|\n");
        output.push_str(&format!("| Gross Revenue | {:.2} |\n", self.gross_revenue));
        output.push_str(&format!(
            "| (-) Acquisition Costs | {:.2} |\n",
            self.total_acquisition_cost
        ));
        output.push_str(&format!(
            "| **Gross Result** | **{:.2}** |\n",
            self.gross_result
        ));
        output.push_str(&format!("| Gross Margin | {:.2}% |\n", self.gross_margin));
        output.push_str(&format!(
            "| (-) Operating Expenses | {:.2} |\n",
            self.total_operating_expenses
        ));
        output.push_str(&format!(
            "| **Operating Result** | **{:.2}** |\n",
            self.operating_result
        ));
        output.push_str(&format!(
            "| Operating Margin | {:.2}% |\n",
            self.operating_margin
        ));
        output.push_str(&format!(
            "| (-) Financial Expenses | {:.2} |\n",
            self.financial_expenses
        ));
        output.push_str(&format!(
            "| (+) Other Revenue | {:.2} |\n",
            self.other_revenue
        ));
        output.push_str(&format!(
            "| **Net Result** | **{:.2}** |\n",
            self.net_result
        ));
        output.push_str(&format!("| Net Margin | {:.2}% |\n", self.net_margin));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CategoryMap;
    use crate::schema::{FinancialTransaction, TransactionKind};
    use chrono::NaiveDate;

    fn tx(category: &str, amount: f64, kind: TransactionKind) -> FinancialTransaction {
        FinancialTransaction {
            id: category.to_string(),
            reference_date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
            description: category.to_string(),
            amount,
            kind,
            raw_category: category.to_string(),
            cash_flow_date: None,
            impacts_cash: false,
            is_reconciled: false,
            cycle_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_waterfall_math() {
        let map = CategoryMap::default_feedlot();
        let transactions = vec![
            tx("cattle_sales", 100_000.0, TransactionKind::Revenue),
            tx("other_income", 5_000.0, TransactionKind::Revenue),
            tx("animal_purchase", 40_000.0, TransactionKind::Expense),
            tx("freight", 5_000.0, TransactionKind::Expense),
            tx("commission", 3_000.0, TransactionKind::Expense),
            tx("feed", 10_000.0, TransactionKind::Expense),
            tx("mortality", 2_000.0, TransactionKind::Expense),
            tx("general_admin", 8_000.0, TransactionKind::Expense),
            tx("interest", 1_500.0, TransactionKind::Expense),
        ];

        let statement = IncomeStatement::from_groups(&map.group_totals(&transactions));

        assert_eq!(statement.gross_revenue, 100_000.0);
        assert_eq!(statement.other_revenue, 5_000.0);
        assert_eq!(statement.total_acquisition_cost, 48_000.0);
        assert_eq!(statement.gross_result, 52_000.0);
        assert!((statement.gross_margin - 52.0).abs() < 1e-9);

        assert_eq!(statement.total_operating_expenses, 20_000.0);
        assert_eq!(statement.operating_result, 32_000.0);
        assert!((statement.operating_margin - 32.0).abs() < 1e-9);

        // 32,000 - 1,500 + 5,000
        assert_eq!(statement.net_result, 35_500.0);
        assert!((statement.net_margin - 35_500.0 / 105_000.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_revenue_margins_are_zero() {
        let map = CategoryMap::default_feedlot();
        let transactions = vec![
            tx("feed", 10_000.0, TransactionKind::Expense),
            tx("interest", 500.0, TransactionKind::Expense),
        ];

        let statement = IncomeStatement::from_groups(&map.group_totals(&transactions));

        assert_eq!(statement.gross_revenue, 0.0);
        assert_eq!(statement.gross_margin, 0.0);
        assert_eq!(statement.operating_margin, 0.0);
        assert_eq!(statement.net_margin, 0.0);
        assert!(statement.gross_margin.is_finite());
        assert!(statement.net_result < 0.0);
    }

    #[test]
    fn test_empty_statement_is_all_zero() {
        let statement = IncomeStatement::from_groups(&GroupedTotals::default());
        assert_eq!(statement, IncomeStatement::default());
    }

    #[test]
    fn test_exports() {
        let map = CategoryMap::default_feedlot();
        let transactions = vec![tx("cattle_sales", 1_000.0, TransactionKind::Revenue)];
        let statement = IncomeStatement::from_groups(&map.group_totals(&transactions));

        let csv = statement.to_csv();
        assert!(csv.contains("Line,Amount"));
        assert!(csv.contains("Gross Revenue,1000.00"));

        let markdown = statement.to_markdown();
        assert!(markdown.contains("# Income Statement"));
        assert!(markdown.contains("**Net Result**"));

        let json = statement.to_json().unwrap();
        assert!(json.contains("gross_revenue"));
    }
}
