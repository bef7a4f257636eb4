//! Endpoint groups of the backend
//!
//! Each service borrows the [`ApiClient`] and maps one resource:
//! - auth: login and registration
//! - transactions: list, edit, redirect and installment generation
//! - cards: cards and their totals
//! - reports: period reports
//! - settings: profile and password
//! - couple: shared account with a partner
//! - admin: feature flags and audit logs

pub mod admin;
pub mod auth;
pub mod cards;
pub mod couple;
pub mod reports;
pub mod settings;
pub mod transactions;

use crate::client::ApiClient;

pub use admin::AdminService;
pub use auth::{AuthService, RegisterData};
pub use cards::CardService;
pub use couple::CoupleService;
pub use reports::ReportService;
pub use settings::SettingsService;
pub use transactions::TransactionService;

impl ApiClient {
    pub fn auth(&self) -> AuthService<'_> {
        AuthService { client: self }
    }

    pub fn transactions(&self) -> TransactionService<'_> {
        TransactionService { client: self }
    }

    pub fn cards(&self) -> CardService<'_> {
        CardService { client: self }
    }

    pub fn reports(&self) -> ReportService<'_> {
        ReportService { client: self }
    }

    pub fn settings(&self) -> SettingsService<'_> {
        SettingsService { client: self }
    }

    pub fn couple(&self) -> CoupleService<'_> {
        CoupleService { client: self }
    }

    pub fn admin(&self) -> AdminService<'_> {
        AdminService { client: self }
    }
}
