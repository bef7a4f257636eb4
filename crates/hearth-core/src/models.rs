//! Transaction, card and user models as exchanged with the backend

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::installment::InstallmentLabel;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "INCOME"),
            TransactionType::Expense => write!(f, "EXPENSE"),
        }
    }
}

/// Transaction category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    Salary,
    Commission,
    Bonus,
    Advance,
    CorporateCard,
    CompanyRevenue,
    Transport,
    Food,
    Health,
    Education,
    Entertainment,
    Shopping,
    Bills,
    #[serde(other)]
    Other,
}

impl TransactionCategory {
    pub const ALL: [TransactionCategory; 14] = [
        TransactionCategory::Salary,
        TransactionCategory::Commission,
        TransactionCategory::Bonus,
        TransactionCategory::Advance,
        TransactionCategory::CorporateCard,
        TransactionCategory::CompanyRevenue,
        TransactionCategory::Transport,
        TransactionCategory::Food,
        TransactionCategory::Health,
        TransactionCategory::Education,
        TransactionCategory::Entertainment,
        TransactionCategory::Shopping,
        TransactionCategory::Bills,
        TransactionCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Salary => "SALARY",
            TransactionCategory::Commission => "COMMISSION",
            TransactionCategory::Bonus => "BONUS",
            TransactionCategory::Advance => "ADVANCE",
            TransactionCategory::CorporateCard => "CORPORATE_CARD",
            TransactionCategory::CompanyRevenue => "COMPANY_REVENUE",
            TransactionCategory::Transport => "TRANSPORT",
            TransactionCategory::Food => "FOOD",
            TransactionCategory::Health => "HEALTH",
            TransactionCategory::Education => "EDUCATION",
            TransactionCategory::Entertainment => "ENTERTAINMENT",
            TransactionCategory::Shopping => "SHOPPING",
            TransactionCategory::Bills => "BILLS",
            TransactionCategory::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for TransactionCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace(['-', ' '], "_");
        TransactionCategory::ALL
            .iter()
            .find(|c| c.as_str() == wanted)
            .copied()
            .ok_or_else(|| format!("Invalid category: {}", s))
    }
}

impl std::fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: TransactionCategory,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    /// Reference date used for grouping (ISO 8601)
    pub date: String,
    /// Original purchase date from the statement
    #[serde(default)]
    pub purchase_date: Option<String>,
    /// `current/total` or `Única`
    #[serde(default)]
    pub installment: Option<String>,
    #[serde(default, rename = "amountUSD")]
    pub amount_usd: Option<Decimal>,
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub redirect_type: Option<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl Transaction {
    /// Parse the date part of `date`
    pub fn date_naive(&self) -> Option<NaiveDate> {
        parse_date_prefix(&self.date)
    }

    /// Parse the date part of `purchase_date`
    pub fn purchase_date_naive(&self) -> Option<NaiveDate> {
        self.purchase_date.as_deref().and_then(parse_date_prefix)
    }

    /// Parsed installment label, if present and well formed
    pub fn installment_label(&self) -> Option<InstallmentLabel> {
        self.installment.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Amount with the sign of its direction
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    pub fn is_redirected(&self) -> bool {
        self.redirect_type.as_deref().is_some_and(|s| !s.is_empty())
    }
}

fn parse_date_prefix(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Page of transactions returned by `GET /transactions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionList {
    pub data: Vec<Transaction>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub limit: usize,
}

/// Body of `POST /transactions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: TransactionCategory,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

/// Body of `PATCH /transactions/{id}`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransaction {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TransactionCategory>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl UpdateTransaction {
    /// Update that only moves the transaction to someone else
    pub fn redirect(redirect_type: &str, redirect_to: &str) -> Self {
        Self {
            redirect_type: Some(redirect_type.to_string()),
            redirect_to: Some(redirect_to.to_string()),
            ..Default::default()
        }
    }
}

/// Answer of `POST /transactions/{id}/generate-installments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedInstallments {
    pub created: u64,
    #[serde(default)]
    pub message: String,
}

// ==================== Cards ====================

/// Credit card the statements belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-card totals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub card_id: String,
    pub card_name: String,
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    pub balance: Decimal,
    pub transaction_count: u64,
}

/// Body of `POST /cards` and `PUT /cards/{id}`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ==================== Users ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    CompanyAdmin,
    Employee,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

// ==================== Tests ====================
