//! Maps raw transaction categories onto normalized accounting groups.
//!
//! The mapping table is plain data injected at construction time, so custom
//! charts can be loaded from JSON and swapped in tests. Classification is
//! total: every category lands in exactly one group, with a deterministic
//! default bucket per transaction kind for anything never seen before.

use crate::error::{ReconciliationError, Result};
use crate::schema::{CashFlowActivity, FinancialTransaction, TransactionKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum GroupId {
    OperationalRevenue,
    OtherRevenue,
    AcquisitionCosts,
    LogisticsCosts,
    CommissionCosts,
    ProductionExpenses,
    OperationalLosses,
    AdminExpenses,
    FinancialExpenses,
    Infrastructure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupKind {
    Revenue,
    Expense,
}

/// One normalized bucket of the statement layout.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AccountingGroup {
    pub id: GroupId,

    #[schemars(description = "Display name used in statement layouts")]
    pub name: String,

    pub kind: GroupKind,

    #[schemars(description = "Ordering rank for statement layout")]
    pub order: u8,

    #[schemars(description = "Canonical category names this group absorbs (exact match first)")]
    pub categories: Vec<String>,

    #[schemars(description = "Alternate technical codes this group absorbs")]
    pub codes: Vec<String>,

    #[schemars(description = "Cash-flow activity every transaction in this group belongs to")]
    pub activity: CashFlowActivity,

    #[serde(default)]
    #[schemars(
        description = "Valuation write-off bucket: transactions never move cash regardless of payment status"
    )]
    pub non_cash: bool,
}

/// Immutable category mapping table, injected into the engine at construction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryMap {
    groups: Vec<AccountingGroup>,
}

impl CategoryMap {
    /// Both default buckets must exist so classification can never fail.
    pub fn new(mut groups: Vec<AccountingGroup>) -> Result<Self> {
        for required in [GroupId::OtherRevenue, GroupId::AdminExpenses] {
            if !groups.iter().any(|g| g.id == required) {
                return Err(ReconciliationError::InvalidCategoryMap(format!(
                    "missing default bucket {:?}",
                    required
                )));
            }
        }
        groups.sort_by_key(|g| g.order);
        Ok(Self { groups })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let map: CategoryMap = serde_json::from_str(json)?;
        Self::new(map.groups)
    }

    pub fn groups(&self) -> &[AccountingGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> &AccountingGroup {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .unwrap_or_else(|| self.default_group(GroupKind::Expense))
    }

    fn default_group(&self, kind: GroupKind) -> &AccountingGroup {
        let id = match kind {
            GroupKind::Revenue => GroupId::OtherRevenue,
            GroupKind::Expense => GroupId::AdminExpenses,
        };
        // Presence checked in new().
        self.groups.iter().find(|g| g.id == id).unwrap()
    }

    /// Resolves a raw category to its accounting group. First match wins,
    /// case-insensitive: exact canonical name, then exact code, then substring
    /// in either direction, then the default bucket for the transaction kind.
    pub fn classify(&self, raw_category: &str, kind: TransactionKind) -> &AccountingGroup {
        let raw = raw_category.trim().to_lowercase();
        let default_kind = match kind {
            TransactionKind::Revenue => GroupKind::Revenue,
            TransactionKind::Expense => GroupKind::Expense,
        };
        if raw.is_empty() {
            return self.default_group(default_kind);
        }

        for group in &self.groups {
            if group.categories.iter().any(|c| c.to_lowercase() == raw) {
                return group;
            }
        }

        for group in &self.groups {
            if group.codes.iter().any(|c| c.to_lowercase() == raw) {
                return group;
            }
        }

        for group in &self.groups {
            if group.categories.iter().any(|c| {
                let canonical = c.to_lowercase();
                raw.contains(&canonical) || canonical.contains(&raw)
            }) {
                return group;
            }
        }

        self.default_group(default_kind)
    }

    /// Partitions a set of transactions into per-group magnitudes. The grand
    /// total always equals the sum of the raw amounts: no transaction is
    /// dropped or double-counted.
    pub fn group_totals<'a, I>(&self, transactions: I) -> GroupedTotals
    where
        I: IntoIterator<Item = &'a FinancialTransaction>,
    {
        let mut totals: BTreeMap<GroupId, f64> = BTreeMap::new();
        let mut total_revenue = 0.0;
        let mut total_expenses = 0.0;

        for tx in transactions {
            let group = self.classify(&tx.raw_category, tx.kind);
            *totals.entry(group.id).or_insert(0.0) += tx.amount.abs();
            match tx.kind {
                TransactionKind::Revenue => total_revenue += tx.amount.abs(),
                TransactionKind::Expense => total_expenses += tx.amount.abs(),
            }
        }

        GroupedTotals {
            totals,
            total_revenue,
            total_expenses,
        }
    }

    /// Production table: Portuguese canonical names from the cash-flow ledger
    /// plus the technical codes used by the expense services.
    pub fn default_feedlot() -> Self {
        let groups = vec![
            AccountingGroup {
                id: GroupId::OperationalRevenue,
                name: "Receita Operacional Bruta".to_string(),
                kind: GroupKind::Revenue,
                order: 1,
                categories: str_vec(&[
                    "Venda de Gado Gordo",
                    "Venda de Bezerros",
                    "Venda de Matrizes",
                    "Venda de Reprodutores",
                    "Venda de Esterco",
                    "Venda de Couro",
                    "Venda de Gado",
                ]),
                codes: str_vec(&["cattle_sales", "product_sales"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::OtherRevenue,
                name: "Outras Receitas".to_string(),
                kind: GroupKind::Revenue,
                order: 2,
                categories: str_vec(&[
                    "Arrendamento de Pasto",
                    "Aluguel de Curral",
                    "Prestação de Serviços",
                    "Rendimentos Financeiros",
                    "Juros Recebidos",
                    "Dividendos",
                    "Indenizações",
                    "Prêmios e Bonificações",
                    "Outras Receitas",
                ]),
                codes: str_vec(&["service_income", "other_income"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::AcquisitionCosts,
                name: "Aquisição de Animais".to_string(),
                kind: GroupKind::Expense,
                order: 3,
                categories: str_vec(&[
                    "Compra de Gado",
                    "Aquisição de Animais",
                    "Compra de Bezerros",
                    "Compra de Matrizes",
                    "Compra de Reprodutores",
                ]),
                codes: str_vec(&["animal_purchase", "cattle_purchase"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::LogisticsCosts,
                name: "Custos Logísticos".to_string(),
                kind: GroupKind::Expense,
                order: 4,
                categories: str_vec(&["Frete de Gado", "Frete", "Transporte", "Logística"]),
                codes: str_vec(&["freight", "transport", "logistics"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::CommissionCosts,
                name: "Comissões".to_string(),
                kind: GroupKind::Expense,
                order: 5,
                categories: str_vec(&[
                    "Comissão de Compra",
                    "Comissão",
                    "Comissões",
                    "Taxa de Corretagem",
                ]),
                codes: str_vec(&["commission", "broker_fee"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::ProductionExpenses,
                name: "Despesas de Produção".to_string(),
                kind: GroupKind::Expense,
                order: 6,
                categories: str_vec(&[
                    "Ração",
                    "Suplementos",
                    "Sal Mineral",
                    "Silagem",
                    "Vacinas",
                    "Medicamentos",
                    "Veterinário",
                    "Exames Laboratoriais",
                    "Manutenção de Currais",
                    "Manutenção de Cercas",
                    "Combustível",
                    "Energia Elétrica",
                    "Água",
                    "Depreciação",
                ]),
                codes: str_vec(&["feed", "health_costs", "operational_costs", "depreciation"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::OperationalLosses,
                name: "Perdas Operacionais".to_string(),
                kind: GroupKind::Expense,
                order: 7,
                categories: str_vec(&[
                    "Perdas Operacionais (Mortalidade)",
                    "Mortalidade",
                    "Perdas",
                    "Morte de Animais",
                    "Perda de Peso",
                    "Ajuste de Ativo Biológico",
                ]),
                codes: str_vec(&["deaths", "weight_loss", "mortality", "biological_adjustment"]),
                activity: CashFlowActivity::Operating,
                non_cash: true,
            },
            AccountingGroup {
                id: GroupId::AdminExpenses,
                name: "Despesas Administrativas".to_string(),
                kind: GroupKind::Expense,
                order: 8,
                categories: str_vec(&[
                    "Salários",
                    "Encargos Trabalhistas",
                    "Benefícios",
                    "Treinamento",
                    "Material de Escritório",
                    "Contabilidade",
                    "Telefone/Internet",
                    "Seguros",
                    "Outras Despesas",
                    "Retirada Particular",
                    "Ajustes Mercado Futuro",
                ]),
                codes: str_vec(&["general_admin", "personnel", "marketing", "admin_other"]),
                activity: CashFlowActivity::Operating,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::FinancialExpenses,
                name: "Despesas Financeiras".to_string(),
                kind: GroupKind::Expense,
                order: 9,
                categories: str_vec(&[
                    "Despesas Bancárias",
                    "Juros e Multas",
                    "Impostos e Taxas",
                    "Fee de Crédito",
                    "Empréstimos",
                    "Financiamentos",
                ]),
                codes: str_vec(&["interest", "fees", "financial_management", "financial_other"]),
                activity: CashFlowActivity::Financing,
                non_cash: false,
            },
            AccountingGroup {
                id: GroupId::Infrastructure,
                name: "Infraestrutura e Equipamentos".to_string(),
                kind: GroupKind::Expense,
                order: 10,
                categories: str_vec(&[
                    "Construções",
                    "Equipamentos",
                    "Instalações",
                    "Infraestrutura",
                ]),
                codes: str_vec(&["infrastructure", "equipment_purchase", "construction"]),
                activity: CashFlowActivity::Investing,
                non_cash: false,
            },
        ];

        // The table above always carries both default buckets.
        Self::new(groups).unwrap()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CategoryMap)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

/// Per-group magnitudes for one period, plus revenue/expense totals taken
/// from the transaction kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedTotals {
    pub totals: BTreeMap<GroupId, f64>,
    pub total_revenue: f64,
    pub total_expenses: f64,
}

impl GroupedTotals {
    pub fn total(&self, id: GroupId) -> f64 {
        self.totals.get(&id).copied().unwrap_or(0.0)
    }

    pub fn net_income(&self) -> f64 {
        self.total_revenue - self.total_expenses
    }

    /// Sum across all buckets; equals the sum of raw magnitudes.
    pub fn grand_total(&self) -> f64 {
        self.totals.values().sum()
    }
}

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("animal_purchase", "Compra de Animais"),
    ("commission", "Comissão"),
    ("freight", "Frete"),
    ("acquisition_other", "Outras Aquisições"),
    ("feed", "Alimentação"),
    ("health_costs", "Saúde Animal"),
    ("operational_costs", "Custos Operacionais"),
    ("deaths", "Mortalidade"),
    ("weight_loss", "Perda de Peso"),
    ("general_admin", "Administrativo Geral"),
    ("marketing", "Marketing"),
    ("personnel", "Pessoal"),
    ("admin_other", "Outros Administrativos"),
    ("interest", "Juros"),
    ("fees", "Taxas"),
    ("financial_management", "Gestão Financeira"),
    ("financial_other", "Outros Financeiros"),
    ("cattle_sales", "Venda de Gado"),
    ("product_sales", "Venda de Produtos"),
    ("service_income", "Receita de Serviços"),
    ("other_income", "Outras Receitas"),
];

/// Friendly display name for a technical category code. Unknown codes are
/// title-cased from snake_case.
pub fn display_name(technical: &str) -> String {
    if technical.is_empty() {
        return "Sem Categoria".to_string();
    }
    if DISPLAY_NAMES.iter().any(|(_, d)| *d == technical) {
        return technical.to_string();
    }
    if let Some((_, display)) = DISPLAY_NAMES.iter().find(|(t, _)| *t == technical) {
        return (*display).to_string();
    }
    technical
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Technical code for a display name. Unknown names are snake_cased.
pub fn technical_name(display: &str) -> String {
    if display.is_empty() {
        return String::new();
    }
    if DISPLAY_NAMES.iter().any(|(t, _)| *t == display) {
        return display.to_string();
    }
    if let Some((technical, _)) = DISPLAY_NAMES.iter().find(|(_, d)| *d == display) {
        return (*technical).to_string();
    }
    display
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}


fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
