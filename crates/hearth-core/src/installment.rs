//! Installment labels and detection of missing future installments
//!
//! Statements list a recurring charge once per month with a label such as
//! `2/10`. When only some parts of a series were imported, the remaining ones
//! can be generated by the backend. Whether that action is offered is decided
//! here by looking for the expected future parts among the loaded
//! transactions.
//!
//! Matching is heuristic: a future part counts as present when its
//! description equals `"{base} ({i}/{total})"` or merely starts with the base
//! description, its amount is within 0.01 of the original and its label is
//! `i/total`. Two unrelated series sharing a description prefix and amount
//! can hide each other. A backend-assigned series id would remove the
//! guesswork.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::Transaction;

/// Label the backend uses for one-off charges
pub const SINGLE_INSTALLMENT: &str = "Única";

/// Position of a charge within its series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentLabel {
    /// One-off charge
    Single,
    /// Part `current` of `total`
    Part { current: u32, total: u32 },
}

impl InstallmentLabel {
    /// True when no later parts can exist
    pub fn is_final(&self) -> bool {
        match self {
            InstallmentLabel::Single => true,
            InstallmentLabel::Part { current, total } => current >= total,
        }
    }

    /// Number of parts after this one
    pub fn remaining(&self) -> u32 {
        match self {
            InstallmentLabel::Single => 0,
            InstallmentLabel::Part { current, total } => total.saturating_sub(*current),
        }
    }
}

impl std::str::FromStr for InstallmentLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == SINGLE_INSTALLMENT {
            return Ok(InstallmentLabel::Single);
        }

        static LABEL_PATTERN: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
        let label_regex = LABEL_PATTERN.get_or_init(|| regex::Regex::new(r"^(\d+)/(\d+)$").unwrap());

        let invalid = || CoreError::InvalidInstallment { label: s.to_string() };
        let caps = label_regex.captures(s).ok_or_else(invalid)?;
        let current = caps[1].parse::<u32>().map_err(|_| invalid())?;
        let total = caps[2].parse::<u32>().map_err(|_| invalid())?;

        Ok(InstallmentLabel::Part { current, total })
    }
}

impl std::fmt::Display for InstallmentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallmentLabel::Single => write!(f, "{}", SINGLE_INSTALLMENT),
            InstallmentLabel::Part { current, total } => write!(f, "{}/{}", current, total),
        }
    }
}

/// Description without its trailing `(n/total)` marker
pub fn base_description(description: Option<&str>) -> String {
    static SUFFIX_PATTERN: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let suffix_regex = SUFFIX_PATTERN.get_or_init(|| regex::Regex::new(r"\s*\(\d+/\d+\)$").unwrap());

    match description {
        Some(desc) => suffix_regex.replace(desc, "").trim().to_string(),
        None => String::new(),
    }
}

/// Open part of a series: (current, total), or None when nothing can follow
fn open_series(transaction: &Transaction) -> Option<(u32, u32)> {
    let label = transaction.installment.as_deref()?;
    match label.parse::<InstallmentLabel>() {
        Ok(InstallmentLabel::Part { current, total }) if current < total => Some((current, total)),
        _ => None,
    }
}

fn amount_matches(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < Decimal::new(1, 2)
}

/// Whether part `index` of the series of `transaction` is among `loaded`
fn part_exists(transaction: &Transaction, base: &str, index: u32, total: u32, loaded: &[Transaction]) -> bool {
    let expected_label = format!("{}/{}", index, total);
    let expected_description = format!("{} ({})", base, expected_label);

    loaded.iter().any(|t| {
        let same_description = t
            .description
            .as_deref()
            .is_some_and(|d| d == expected_description || d.starts_with(base));
        same_description
            && amount_matches(t.amount, transaction.amount)
            && t.installment.as_deref() == Some(expected_label.as_str())
    })
}

/// Future installment numbers of `transaction` missing from `loaded`
pub fn missing_installments(transaction: &Transaction, loaded: &[Transaction]) -> Vec<u32> {
    let Some((current, total)) = open_series(transaction) else {
        return Vec::new();
    };
    let base = base_description(transaction.description.as_deref());

    (current + 1..=total)
        .filter(|i| !part_exists(transaction, &base, *i, total, loaded))
        .collect()
}

/// Whether generating future installments should be offered for `transaction`
pub fn has_missing_installments(transaction: &Transaction, loaded: &[Transaction]) -> bool {
    let Some((current, total)) = open_series(transaction) else {
        return false;
    };
    let base = base_description(transaction.description.as_deref());

    (current + 1..=total).any(|i| !part_exists(transaction, &base, i, total, loaded))
}

/// Number of parts the backend would be asked to create for `transaction`
///
/// Used for the confirmation prompt; fails when the transaction has no
/// series to continue.
pub fn plan_generation(transaction: &Transaction) -> Result<u32, CoreError> {
    let label = match transaction.installment.as_deref() {
        None | Some(SINGLE_INSTALLMENT) => {
            return Err(CoreError::NothingToGenerate {
                reason: "transaction has no installments".to_string(),
            });
        }
        Some(label) => label.parse::<InstallmentLabel>()?,
    };

    if label.is_final() {
        return Err(CoreError::NothingToGenerate {
            reason: "all installments were already posted".to_string(),
        });
    }

    Ok(label.remaining())
}

/// Transactions of `loaded` for which generation should be offered
pub fn with_missing_installments(loaded: &[Transaction]) -> Vec<&Transaction> {
    loaded
        .iter()
        .filter(|t| has_missing_installments(t, loaded))
        .collect()
}

// ==================== Tests ====================
