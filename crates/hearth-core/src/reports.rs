//! Report, settings, shared-account and admin structures for API responses

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Transaction;

// ==================== Reports ====================

/// Report aggregation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPeriod {
    Monthly,
    Quarterly,
    Semester,
    Yearly,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Monthly => "MONTHLY",
            ReportPeriod::Quarterly => "QUARTERLY",
            ReportPeriod::Semester => "SEMESTER",
            ReportPeriod::Yearly => "YEARLY",
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(ReportPeriod::Monthly),
            "quarterly" | "quarter" => Ok(ReportPeriod::Quarterly),
            "semester" => Ok(ReportPeriod::Semester),
            "yearly" | "year" => Ok(ReportPeriod::Yearly),
            _ => Err(format!("Invalid report period: {}", s)),
        }
    }
}

/// Income and expense of one category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTotals {
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub expense: Decimal,
}

/// Report as generated by `GET /reports`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub period: ReportPeriod,
    pub start_date: String,
    pub end_date: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub by_category: HashMap<String, CategoryTotals>,
}

impl ReportData {
    /// Categories sorted by expense, largest first
    pub fn top_expenses(&self) -> Vec<(&str, Decimal)> {
        let mut entries: Vec<(&str, Decimal)> = self
            .by_category
            .iter()
            .filter(|(_, totals)| !totals.expense.is_zero())
            .map(|(name, totals)| (name.as_str(), totals.expense))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }
}

// ==================== Settings ====================

/// Read/write switches for one module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
}

/// What a partner may do on a shared account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouplePermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<AccessFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<AccessFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports: Option<AccessFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AccessFlags>,
}

/// Shared account with a partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleData {
    pub id: String,
    pub partner_name: String,
    #[serde(default)]
    pub partner_email: Option<String>,
    #[serde(default)]
    pub permissions: CouplePermissions,
    pub is_active: bool,
}

/// Body of `POST /couple` and `PATCH /couple`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<CouplePermissions>,
}

/// Answer of `GET /settings/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub couple: Option<CoupleData>,
    #[serde(default)]
    pub effective_permissions: Option<CouplePermissions>,
}

impl UserSettings {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }

    pub fn has_couple(&self) -> bool {
        self.couple.as_ref().is_some_and(|c| c.is_active)
    }
}

/// Body of `PUT /settings/me`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body of `PATCH /settings/password`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

// ==================== Admin ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub module: String,
    pub actions: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub key: String,
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Answer of `GET /admin/permissions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsOverview {
    pub available_permissions: Vec<PermissionDefinition>,
    pub feature_flags: Vec<FeatureFlag>,
}

/// Body of `PATCH /admin/feature-flags/{key}`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateFeatureFlag {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditActor {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    #[serde(default)]
    pub actor_user_id: Option<String>,
    pub action: String,
    pub target_type: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: String,
    #[serde(default)]
    pub actor: Option<AuditActor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogPage {
    pub data: Vec<AuditLog>,
    pub total: usize,
}

/// Filters for `GET /admin/audit-logs`
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub target_type: Option<String>,
    pub actor_user_id: Option<String>,
}

impl AuditLogQuery {
    /// Query-string pairs in the order the backend documents them
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(ref action) = self.action {
            pairs.push(("action", action.clone()));
        }
        if let Some(ref target_type) = self.target_type {
            pairs.push(("targetType", target_type.clone()));
        }
        if let Some(ref actor) = self.actor_user_id {
            pairs.push(("actorUserId", actor.clone()));
        }
        pairs
    }
}
