use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hearth_client::{ApiClient, ClientError, SessionContext, SessionStore};
use hearth_config::{Config, ConfigError};
use hearth_core::{CoreError, ReferenceMonth, ReportPeriod};
use tokio::runtime::Runtime;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(version = "0.1.0")]
#[command(about = "Household finance client: statement imports, installments and reports", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long)]
        name: String,
    },
    /// Log in and remember the session
    Login { email: String },
    /// Forget the stored session
    Logout,
    /// Import a bank statement
    Upload {
        file: PathBuf,
        /// Reference month, `YYYY-MM` or a month number of the current year
        #[arg(short, long)]
        month: Option<ReferenceMonth>,
        /// Card the statement belongs to
        #[arg(long)]
        card: Option<String>,
    },
    #[command(subcommand)]
    Transactions(TransactionCommand),
    #[command(subcommand)]
    Installments(InstallmentCommand),
    #[command(subcommand)]
    Cards(CardCommand),
    /// Income and expense summary
    Report {
        #[arg(short, long, default_value = "monthly")]
        period: ReportPeriod,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Show the current profile
    Me,
    /// Show the shared account
    Couple,
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// List transactions, most recent first
    List {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Delete a transaction
    Delete { id: String },
    /// Mark a transaction as paid by someone else
    Redirect {
        id: String,
        #[arg(long = "type")]
        redirect_type: String,
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand, Debug)]
enum InstallmentCommand {
    /// Transactions whose future installments were not imported
    Gaps,
    /// Ask the backend to create the missing installments of a transaction
    Generate {
        id: String,
        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CardCommand {
    List,
    Stats,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[ERROR] Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    if let Command::InitConfig { force } = args.command {
        init_logging("info");
        return commands::init_config(&args.config, force).await;
    }

    let config = Config::load_or_default(&args.config).await?;
    init_logging(&config.logging.level);

    let store = SessionStore::new(session_path(&config));
    let session = SessionContext::new();
    match store.load().await {
        Ok(Some(saved)) => session.set(saved),
        Ok(None) => {}
        Err(e) => log::warn!(target: "hearth::session", "ignoring unreadable session file: {}", e),
    }
    let client = ApiClient::from_config(&config, session);

    let result = dispatch(args.command, &args.config, &client, &config, &store).await;

    if let Err(err) = &result {
        if matches!(err.downcast_ref::<ClientError>(), Some(ClientError::Unauthorized { .. })) {
            store.remove().await?;
        }
    }
    result
}

async fn dispatch(
    command: Command,
    config_path: &Path,
    client: &ApiClient,
    config: &Config,
    store: &SessionStore,
) -> anyhow::Result<()> {
    match command {
        Command::InitConfig { force } => commands::init_config(config_path, force).await,
        Command::Register { email, name } => commands::register(client, &email, &name).await,
        Command::Login { email } => commands::login(client, store, &email).await,
        Command::Logout => commands::logout(client, store).await,
        Command::Upload { file, month, card } => commands::upload(client, config, &file, month, card).await,
        Command::Transactions(TransactionCommand::List { limit }) => {
            commands::list_transactions(client, config, limit).await
        }
        Command::Transactions(TransactionCommand::Delete { id }) => commands::delete_transaction(client, &id).await,
        Command::Transactions(TransactionCommand::Redirect { id, redirect_type, to }) => {
            commands::redirect_transaction(client, &id, &redirect_type, &to).await
        }
        Command::Installments(InstallmentCommand::Gaps) => commands::installment_gaps(client, config).await,
        Command::Installments(InstallmentCommand::Generate { id, yes }) => {
            commands::generate_installments(client, &id, yes).await
        }
        Command::Cards(CardCommand::List) => commands::list_cards(client).await,
        Command::Cards(CardCommand::Stats) => commands::card_stats(client, config).await,
        Command::Report { period, from, to } => commands::report(client, config, period, from, to).await,
        Command::Me => commands::me(client).await,
        Command::Couple => commands::couple(client).await,
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Configured session file, or `~/.hearth/session.json`
fn session_path(config: &Config) -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    match &config.session.path {
        Some(path) => expand_home(path, &home),
        None => home.join(".hearth").join("session.json"),
    }
}

fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

fn report_error(err: &anyhow::Error) {
    if let Some(client_err) = err.downcast_ref::<ClientError>() {
        if matches!(client_err, ClientError::Cancelled) {
            eprintln!("[INFO] Cancelled");
            return;
        }
        eprintln!("[ERROR] {}", client_err);
        if let Some(hint) = client_err.suggestion() {
            eprintln!("        {}", hint);
        }
        return;
    }
    if let Some(core_err) = err.downcast_ref::<CoreError>() {
        eprintln!("[ERROR] {}", core_err);
        if let Some(hint) = core_err.suggestion() {
            eprintln!("        {}", hint);
        }
        return;
    }
    if let Some(config_err) = err.downcast_ref::<ConfigError>() {
        eprintln!("[ERROR] {}", config_err);
        if let Some(hint) = config_err.hint() {
            eprintln!("        {}", hint);
        }
        return;
    }
    eprintln!("[ERROR] {:#}", err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_arguments() {
        let args = Args::try_parse_from(["hearth", "upload", "fatura.pdf", "--month", "2024-03", "--card", "c1"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.yaml"));
        match args.command {
            Command::Upload { file, month, card } => {
                assert_eq!(file, PathBuf::from("fatura.pdf"));
                assert_eq!(month.unwrap().to_string(), "2024-03");
                assert_eq!(card.as_deref(), Some("c1"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(Args::try_parse_from(["hearth", "upload", "fatura.pdf", "--month", "2024-13"]).is_err());
    }

    #[test]
    fn test_parse_report_arguments() {
        let args = Args::try_parse_from([
            "hearth", "-c", "other.yaml", "report", "--period", "yearly", "--from", "2024-01-01",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("other.yaml"));
        match args.command {
            Command::Report { period, from, to } => {
                assert_eq!(period, ReportPeriod::Yearly);
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert!(to.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/ana");
        assert_eq!(
            expand_home(Path::new("~/.hearth/s.json"), home),
            PathBuf::from("/home/ana/.hearth/s.json")
        );
        assert_eq!(expand_home(Path::new("/tmp/s.json"), home), PathBuf::from("/tmp/s.json"));
    }
}
