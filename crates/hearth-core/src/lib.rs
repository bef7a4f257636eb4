//! Transaction model, installment reconciliation and the statement upload flow

pub mod error;
pub mod flow;
pub mod installment;
pub mod models;
pub mod reports;
pub mod time;
pub mod upload;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger, ErrorSeverity};
pub use flow::{UploadFlow, UploadState};
pub use installment::{
    base_description, has_missing_installments, missing_installments, plan_generation,
    with_missing_installments, InstallmentLabel, SINGLE_INSTALLMENT,
};
pub use models::{
    Card, CardInput, CardStats, CreateTransaction, GeneratedInstallments, Transaction,
    TransactionCategory, TransactionList, TransactionType, UpdateTransaction, User, UserRole,
};
pub use reports::{
    AuditLog, AuditLogPage, AuditLogQuery, CoupleData, CoupleInput, CouplePermissions, FeatureFlag,
    PermissionsOverview, ReportData, ReportPeriod, UserSettings,
};
pub use time::ReferenceMonth;
pub use upload::{validate_upload, UploadFile, UploadRequest};

// ==================== Transaction Source ====================

/// Source reference type
pub type SourceRef<E> = Arc<dyn TransactionSource<Error = E>>;

/// Anything the transaction list can be (re)loaded from
#[async_trait]
pub trait TransactionSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the current transaction list
    async fn load_transactions(&self) -> Result<Vec<Transaction>, Self::Error>;
}

/// Fixed list, for offline use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTransactions(pub Vec<Transaction>);

#[async_trait]
impl TransactionSource for StaticTransactions {
    type Error = std::convert::Infallible;

    async fn load_transactions(&self) -> Result<Vec<Transaction>, Self::Error> {
        Ok(self.0.clone())
    }
}

/// Reload `source` and report the transactions that still miss future installments
pub async fn find_installment_gaps<S>(source: &S) -> Result<Vec<Transaction>, S::Error>
where
    S: TransactionSource + ?Sized,
{
    let loaded = source.load_transactions().await?;
    let gaps: Vec<Transaction> = with_missing_installments(&loaded).into_iter().cloned().collect();
    log::debug!(
        target: "hearth::core",
        "{} of {} transactions have missing installments",
        gaps.len(),
        loaded.len()
    );
    Ok(gaps)
}
