//! Subcommand handlers

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::NaiveDate;
use hearth_client::{
    ApiClient, ImportReport, PasswordPrompt, PasswordRequest, RegisterData, SessionStore, StatementImport,
};
use hearth_config::Config;
use hearth_core::{
    missing_installments, plan_generation, with_missing_installments, ReferenceMonth, ReportPeriod, Transaction,
    UploadFile, UploadRequest,
};
use hearth_utils::{display_date, format_amount, progress_bar, truncate};
use zeroize::Zeroizing;

pub async fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, use --force to overwrite it", path.display());
    }
    tokio::fs::write(path, Config::generate_default())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("[INFO] Wrote default configuration to {}", path.display());
    Ok(())
}

// ==================== Session ====================

pub async fn login(client: &ApiClient, store: &SessionStore, email: &str) -> anyhow::Result<()> {
    let password = read_hidden("Password: ").await?;
    let session = client.auth().login(email, &password).await?;
    store.save(&session).await?;
    println!("Logged in as {} <{}>", session.user.name, session.user.email);
    Ok(())
}

pub async fn register(client: &ApiClient, email: &str, name: &str) -> anyhow::Result<()> {
    let password = read_hidden("Password: ").await?;
    let confirmation = read_hidden("Confirm password: ").await?;
    if *password != *confirmation {
        bail!("Passwords do not match");
    }
    let data = RegisterData {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
        role: None,
    };
    let user = client.auth().register(&data).await?;
    println!("Registered {} <{}>; run `hearth login {}` to start a session", user.name, user.email, user.email);
    Ok(())
}

pub async fn logout(client: &ApiClient, store: &SessionStore) -> anyhow::Result<()> {
    client.auth().logout();
    if store.remove().await? {
        println!("Logged out");
    } else {
        println!("No stored session");
    }
    Ok(())
}

// ==================== Statement import ====================

/// Reads statement passwords from the terminal; an empty answer gives up
struct TerminalPrompt;

#[async_trait]
impl PasswordPrompt for TerminalPrompt {
    async fn request_password(&mut self, request: PasswordRequest<'_>) -> Option<Zeroizing<String>> {
        eprintln!();
        if request.invalid {
            eprintln!("[WARN] {}: {}", request.file_name, request.message);
        } else {
            eprintln!("[INFO] {} is password protected: {}", request.file_name, request.message);
        }
        match read_hidden("Statement password (empty to cancel): ").await {
            Ok(password) if !password.trim().is_empty() => Some(password),
            Ok(_) => None,
            Err(e) => {
                log::warn!(target: "hearth::import", "could not read password: {}", e);
                None
            }
        }
    }
}

pub async fn upload(
    client: &ApiClient,
    config: &Config,
    path: &Path,
    month: Option<ReferenceMonth>,
    card: Option<String>,
) -> anyhow::Result<()> {
    if !client.session().is_active() {
        bail!("Not logged in; run `hearth login <email>` first");
    }

    let file = UploadFile::from_path(path, &config.upload).await?;
    let mut request = UploadRequest::new(file);
    if let Some(month) = month {
        request = request.with_reference_month(month);
    }
    if let Some(card) = card {
        request = request.with_card(card);
    }

    // failures are reported right away by the caller
    let mut import =
        StatementImport::new(client.clone(), client.clone(), &config.upload).with_dismiss_delay(Duration::ZERO);

    let cancel = import.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = import
        .run(request, &mut TerminalPrompt, |event| {
            eprint!("\r{} {:<48}", progress_bar(event.progress, 30), truncate(&event.message, 48));
            let _ = std::io::stderr().flush();
        })
        .await;
    eprintln!();

    match report? {
        ImportReport::Imported { created, transactions } => {
            println!("{} transactions imported", created);
            match transactions {
                Some(loaded) => {
                    let gaps = with_missing_installments(&loaded).len();
                    if gaps > 0 {
                        println!("{} transactions have future installments missing; see `hearth installments gaps`", gaps);
                    }
                }
                None => eprintln!("[WARN] Could not reload transactions after the import"),
            }
        }
        ImportReport::Abandoned => println!("Import cancelled, no password given"),
    }
    Ok(())
}

// ==================== Transactions ====================

fn transaction_row(t: &Transaction, config: &Config) -> String {
    format!(
        "{:<10}  {:<24}  {:<40}  {:<14}  {:>6}  {:>16}",
        display_date(&t.date),
        t.id,
        truncate(t.description_or_empty(), 40),
        t.category,
        t.installment.as_deref().unwrap_or("-"),
        format_amount(t.signed_amount(), &config.currency),
    )
}

pub async fn list_transactions(client: &ApiClient, config: &Config, limit: Option<usize>) -> anyhow::Result<()> {
    let list = client.transactions().list().await?;
    let shown = limit.unwrap_or(list.data.len()).min(list.data.len());

    for t in &list.data[..shown] {
        let mut row = transaction_row(t, config);
        if let Some(to) = &t.redirect_to {
            row.push_str(&format!("  -> {}", to));
        }
        println!("{}", row);
    }
    println!("{} of {} transactions", shown, list.total);
    Ok(())
}

pub async fn delete_transaction(client: &ApiClient, id: &str) -> anyhow::Result<()> {
    client.transactions().delete(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub async fn redirect_transaction(client: &ApiClient, id: &str, redirect_type: &str, to: &str) -> anyhow::Result<()> {
    let updated = client.transactions().redirect(id, redirect_type, to).await?;
    println!(
        "{} now redirected to {}",
        truncate(updated.description_or_empty(), 40),
        updated.redirect_to.as_deref().unwrap_or(to)
    );
    Ok(())
}

// ==================== Installments ====================

pub async fn installment_gaps(client: &ApiClient, config: &Config) -> anyhow::Result<()> {
    let list = client.transactions().list().await?;
    let gaps = with_missing_installments(&list.data);
    if gaps.is_empty() {
        println!("No missing installments");
        return Ok(());
    }

    for t in gaps {
        let missing: Vec<String> = missing_installments(t, &list.data)
            .iter()
            .map(|i| i.to_string())
            .collect();
        println!("{}", transaction_row(t, config));
        println!("            missing: {}", missing.join(", "));
    }
    Ok(())
}

pub async fn generate_installments(client: &ApiClient, id: &str, yes: bool) -> anyhow::Result<()> {
    let transaction = client.transactions().find(id).await?;
    let count = plan_generation(&transaction)?;

    if !yes {
        let question = format!(
            "Generate {} future installments for \"{}\"? [y/N] ",
            count,
            transaction.description_or_empty()
        );
        if !confirm(question).await? {
            println!("Nothing generated");
            return Ok(());
        }
    }

    let generated = client.transactions().generate_installments(id).await?;
    println!("{} ({} created)", generated.message, generated.created);
    Ok(())
}

// ==================== Cards, reports, settings ====================

pub async fn list_cards(client: &ApiClient) -> anyhow::Result<()> {
    for card in client.cards().list().await? {
        println!("{:<24}  {:<24}  {}", card.id, card.name, card.description.unwrap_or_default());
    }
    Ok(())
}

pub async fn card_stats(client: &ApiClient, config: &Config) -> anyhow::Result<()> {
    for stats in client.cards().stats().await? {
        println!(
            "{:<24}  {:>5} tx  in {:>16}  out {:>16}  balance {:>16}",
            stats.card_name,
            stats.transaction_count,
            format_amount(stats.total_income, &config.currency),
            format_amount(stats.total_expenses, &config.currency),
            format_amount(stats.balance, &config.currency),
        );
    }
    Ok(())
}

pub async fn report(
    client: &ApiClient,
    config: &Config,
    period: ReportPeriod,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let report = client.reports().generate(period, from, to).await?;
    println!(
        "{} report, {} to {}",
        report.period.as_str(),
        display_date(&report.start_date),
        display_date(&report.end_date)
    );
    println!("  income   {:>16}", format_amount(report.total_income, &config.currency));
    println!("  expenses {:>16}", format_amount(report.total_expense, &config.currency));
    println!("  balance  {:>16}", format_amount(report.balance, &config.currency));

    let top = report.top_expenses();
    if !top.is_empty() {
        println!("Expenses by category:");
        for (category, amount) in top {
            println!("  {:<16} {:>16}", category, format_amount(amount, &config.currency));
        }
    }
    Ok(())
}

pub async fn me(client: &ApiClient) -> anyhow::Result<()> {
    let settings = client.settings().me().await?;
    println!("{} <{}>", settings.name, settings.email);
    println!("role: {}", settings.role);
    if let Some(couple) = &settings.couple {
        println!("shared with: {}", couple.partner_name);
    }
    Ok(())
}

pub async fn couple(client: &ApiClient) -> anyhow::Result<()> {
    match client.couple().get().await? {
        Some(couple) => {
            println!("{} {}", couple.partner_name, couple.partner_email.unwrap_or_default());
            println!("active: {}", couple.is_active);
        }
        None => println!("No shared account"),
    }
    Ok(())
}

// ==================== Terminal input ====================

async fn read_hidden(prompt: &'static str) -> anyhow::Result<Zeroizing<String>> {
    let password = tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt)).await??;
    Ok(Zeroizing::new(password))
}

async fn confirm(question: String) -> anyhow::Result<bool> {
    let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        eprint!("{}", question);
        std::io::stderr().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line)
    })
    .await??;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim"))
}
