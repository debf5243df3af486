//! Converts upstream collaborator records (sales, purchases, expenses, death
//! events) into ledger transactions. Pure functions, no persistence: the
//! engine treats the resulting list as read-only input.

use crate::schema::{FinancialTransaction, TransactionKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub description: String,
    pub total_amount: f64,
    pub due_date: NaiveDate,
    pub receipt_date: Option<NaiveDate>,
    pub is_received: bool,
    pub buyer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: String,
    pub lot_code: String,
    pub purchase_value: f64,
    pub purchase_date: NaiveDate,
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub description: String,
    pub category: String,
    pub total_amount: f64,
    pub due_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub is_paid: bool,
    pub impacts_cash_flow: bool,
    pub cost_center: Option<String>,
}

/// Death event with its valuation already computed by the mortality source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathRecord {
    pub id: String,
    pub cause: String,
    pub quantity: u32,
    pub death_date: NaiveDate,
    pub valuation: f64,
}

pub fn sale_to_transaction(sale: &SaleRecord) -> FinancialTransaction {
    let settled = sale.is_received && sale.receipt_date.is_some();
    FinancialTransaction {
        id: sale.id.clone(),
        reference_date: sale.receipt_date.unwrap_or(sale.due_date),
        description: format!("Venda de gado - {}", sale.description),
        amount: sale.total_amount,
        kind: TransactionKind::Revenue,
        raw_category: "cattle_sales".to_string(),
        cash_flow_date: if settled { sale.receipt_date } else { None },
        impacts_cash: settled,
        is_reconciled: false,
        cycle_id: None,
        notes: sale.buyer.clone(),
    }
}

/// Purchases settle on the purchase date.
pub fn purchase_to_transaction(purchase: &PurchaseRecord) -> FinancialTransaction {
    FinancialTransaction {
        id: purchase.id.clone(),
        reference_date: purchase.purchase_date,
        description: format!("Compra de gado - {}", purchase.lot_code),
        amount: purchase.purchase_value,
        kind: TransactionKind::Expense,
        raw_category: "cattle_purchase".to_string(),
        cash_flow_date: Some(purchase.purchase_date),
        impacts_cash: true,
        is_reconciled: false,
        cycle_id: None,
        notes: purchase.vendor.clone(),
    }
}

pub fn expense_to_transaction(expense: &ExpenseRecord) -> FinancialTransaction {
    let settled = expense.is_paid && expense.payment_date.is_some() && expense.impacts_cash_flow;
    FinancialTransaction {
        id: expense.id.clone(),
        reference_date: expense.payment_date.unwrap_or(expense.due_date),
        description: expense.description.clone(),
        amount: expense.total_amount,
        kind: TransactionKind::Expense,
        raw_category: expense.category.clone(),
        cash_flow_date: if settled { expense.payment_date } else { None },
        impacts_cash: settled,
        is_reconciled: false,
        cycle_id: None,
        notes: expense.cost_center.clone(),
    }
}

/// Death events become non-cash mortality losses.
pub fn death_to_transaction(death: &DeathRecord) -> FinancialTransaction {
    FinancialTransaction {
        id: death.id.clone(),
        reference_date: death.death_date,
        description: format!("Mortalidade - {}", death.cause),
        amount: death.valuation,
        kind: TransactionKind::Expense,
        raw_category: "mortality".to_string(),
        cash_flow_date: None,
        impacts_cash: false,
        is_reconciled: false,
        cycle_id: None,
        notes: Some(format!("{} head", death.quantity)),
    }
}

/// Flattens one month's worth of collaborator records into the ledger shape
/// the engine consumes.
pub fn collect_transactions(
    sales: &[SaleRecord],
    purchases: &[PurchaseRecord],
    expenses: &[ExpenseRecord],
    deaths: &[DeathRecord],
) -> Vec<FinancialTransaction> {
    let mut transactions =
        Vec::with_capacity(sales.len() + purchases.len() + expenses.len() + deaths.len());
    transactions.extend(sales.iter().map(sale_to_transaction));
    transactions.extend(purchases.iter().map(purchase_to_transaction));
    transactions.extend(expenses.iter().map(expense_to_transaction));
    transactions.extend(deaths.iter().map(death_to_transaction));
    transactions
}
