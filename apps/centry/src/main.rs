//! Centry binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use centry::cli::{self, CliError};

const DEFAULT_DB: &str = "centry.db";
const DEFAULT_BIND: &str = "127.0.0.1:8420";

#[derive(Parser)]
#[command(name = "centry", version, about = "Personal finance with resilient pages")]
struct Args {
    /// Database path. Falls back to CENTRY_DB, then centry.db.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Persistence backend: file or redb.
    #[arg(long, global = true, default_value = "file")]
    backend: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty ledger database.
    Init {
        /// Overwrite an existing database.
        #[arg(long)]
        force: bool,
    },
    /// Populate the ledger with deterministic demo data.
    Seed {
        /// Reseed even if the ledger already has data.
        #[arg(long)]
        force: bool,
    },
    /// Add an account.
    AddAccount {
        name: String,
        /// checking, savings, credit-card, cash, or investment.
        #[arg(long, default_value = "checking")]
        kind: String,
        #[arg(long, default_value = "0.00")]
        opening: String,
    },
    /// Add a spending category.
    AddCategory { name: String },
    /// Record a transaction against a named account.
    Add {
        account: String,
        amount: String,
        /// Date as YYYY-MM-DD; today when omitted.
        #[arg(long)]
        date: Option<String>,
        /// income or expense.
        #[arg(long, default_value = "expense")]
        kind: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Set a monthly budget for a category.
    SetBudget {
        category: String,
        limit: String,
        /// Month as YYYY-MM; current month when omitted.
        #[arg(long)]
        month: Option<String>,
    },
    /// Show ledger counts, net worth, and the finance stage.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Print a report: net-worth, spending, or budgets.
    Report {
        kind: String,
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Export the ledger to a file.
    Export {
        output: PathBuf,
        /// canonical or json.
        #[arg(long, default_value = "canonical")]
        format: String,
    },
    /// Import a canonical export, replacing the database.
    Import { input: PathBuf },
    /// Serve the web app.
    Serve {
        /// Listen address. Falls back to CENTRY_ADDR, then 127.0.0.1:8420.
        #[arg(long)]
        bind: Option<String>,
        /// Require this bearer token on /api routes. Falls back to
        /// CENTRY_API_TOKEN.
        #[arg(long)]
        auth_token: Option<String>,
    },
}

/// Flag value first, then the environment, then the built-in default.
fn resolve(flag: Option<String>, env_key: &str, default: &str) -> String {
    flag.or_else(|| std::env::var(env_key).ok())
        .unwrap_or_else(|| default.to_owned())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("centry=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let db = args
        .db
        .or_else(|| std::env::var_os("CENTRY_DB").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
    let db = db.as_path();
    let backend = args.backend.as_str();
    match args.command {
        Command::Init { force } => cli::cmd_init(db, backend, force),
        Command::Seed { force } => cli::cmd_seed(db, backend, force),
        Command::AddAccount {
            name,
            kind,
            opening,
        } => cli::cmd_add_account(db, backend, &name, &kind, &opening).map(|_| ()),
        Command::AddCategory { name } => cli::cmd_add_category(db, backend, &name).map(|_| ()),
        Command::Add {
            account,
            amount,
            date,
            kind,
            category,
            memo,
        } => cli::cmd_add(
            db,
            backend,
            &account,
            &amount,
            date.as_deref(),
            &kind,
            category.as_deref(),
            &memo,
        )
        .map(|_| ()),
        Command::SetBudget {
            category,
            limit,
            month,
        } => cli::cmd_set_budget(db, backend, &category, &limit, month.as_deref()),
        Command::Status { json } => cli::cmd_status(db, backend, json),
        Command::Report { kind, month, json } => {
            cli::cmd_report(db, backend, &kind, month.as_deref(), json)
        }
        Command::Export { output, format } => cli::cmd_export(db, backend, &output, &format),
        Command::Import { input } => cli::cmd_import(db, backend, &input),
        Command::Serve { bind, auth_token } => {
            let bind = resolve(bind, "CENTRY_ADDR", DEFAULT_BIND);
            let auth_token = auth_token.or_else(|| std::env::var("CENTRY_API_TOKEN").ok());
            cli::cmd_serve(db, backend, &bind, auth_token).await
        }
    }
}
