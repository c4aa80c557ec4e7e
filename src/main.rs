//! checkman - batch API response validation from captured cURL commands.
//!
//! Parse a captured cURL command into a template, expand it against CSV
//! parameter rows, execute each case with retries, compare extracted JSON
//! values against a baseline, and persist the whole session for later
//! inspection and manual overrides.

mod csv;
mod domain;
mod engine;
mod storage;
mod template;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use domain::{ComparisonConfig, FetchMode, MatchStrategy, TestStatus};
use engine::cancel::CancelRegistry;
use engine::http::make_transport;
use engine::runner::{
    apply_manual_override, generate_test_cases, report_rows, run_batch, RunnerConfig,
};
use storage::SessionState;

const RUN_ID: &str = "batch";

#[derive(Parser)]
#[command(name = "checkman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the session database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of test cases against a cURL template
    Run(RunArgs),

    /// Re-evaluate one case from a manually supplied response body
    Override(OverrideArgs),

    /// Print the stored session and optionally export it as CSV
    Report(ReportArgs),

    /// Delete the stored session
    Clear,
}

#[derive(clap::Args)]
struct RunArgs {
    /// File containing the captured cURL command
    #[arg(long)]
    curl_file: PathBuf,

    /// CSV file with one parameter row per test case
    #[arg(long)]
    input: PathBuf,

    /// CSV file with baseline rows, aligned by index with the input rows
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Baseline column holding the expected value
    #[arg(long, default_value = "expected")]
    expected_field: String,

    /// Dot/bracket path into the JSON response; empty selects the whole body
    #[arg(long, default_value = "")]
    json_path: String,

    /// Comparison strategy
    #[arg(long, value_enum, default_value_t = MatchStrategy::Contains)]
    strategy: MatchStrategy,

    /// Transport mode
    #[arg(long, value_enum, default_value_t = FetchMode::Direct)]
    mode: FetchMode,

    /// Write a CSV report here after the run
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
struct OverrideArgs {
    /// Id of the case to re-evaluate
    #[arg(long)]
    case: String,

    /// File containing the replacement response body
    #[arg(long)]
    response_file: PathBuf,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Write the report CSV here instead of printing a summary only
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(message) => {
            error!("{message}");
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode, String> {
    let db_path = cli.db.unwrap_or_else(storage::default_db_path);
    let conn = storage::open_db(&db_path)?;

    match cli.command {
        Commands::Run(args) => run_command(args, &conn, cli.verbose).await,
        Commands::Override(args) => override_command(args, &conn),
        Commands::Report(args) => report_command(args, &conn),
        Commands::Clear => {
            storage::clear_session(&conn)?;
            println!("session cleared");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_command(
    args: RunArgs,
    conn: &rusqlite::Connection,
    verbose: bool,
) -> Result<ExitCode, String> {
    let curl_text = read_file(&args.curl_file)?;
    let template = template::parse_curl(&curl_text);

    let inputs = csv::parse_csv(&read_file(&args.input)?);
    let baselines = match &args.baseline {
        Some(path) => csv::parse_csv(&read_file(path)?),
        None => Vec::new(),
    };
    let mut cases = generate_test_cases(&inputs, &baselines, &args.expected_field);

    let comparison = ComparisonConfig {
        json_path: args.json_path.clone(),
        strategy: args.strategy,
    };
    let transport = make_transport(args.mode)?;
    let config = RunnerConfig::default();

    let registry = CancelRegistry::new();
    let mut cancel_rx = registry.register(RUN_ID);
    let signal_registry = registry.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_registry.cancel(RUN_ID);
        }
    });

    info!(mode = %args.mode, cases = cases.len(), "run starting");
    let outcome = run_batch(
        &template,
        &mut cases,
        &comparison,
        &config,
        transport.as_ref(),
        &mut cancel_rx,
        |progress, case| {
            println!("[{progress:>3}%] {} {}", case.id, case.status);
        },
    )
    .await?;
    registry.remove(RUN_ID);

    let session = SessionState {
        template,
        comparison,
        fetch_mode: args.mode,
        cases,
    };
    storage::save_session(conn, &session)?;

    if let Some(path) = &args.report {
        let report = csv::write_csv(&report_rows(&session.cases));
        fs::write(path, report)
            .map_err(|err| format!("Failed to write report `{}`: {err}", path.display()))?;
        println!("report written to {}", path.display());
    }

    print_summary(&session.cases, verbose);
    if outcome.cancelled {
        println!(
            "run cancelled after {} of {} cases",
            outcome.completed,
            session.cases.len()
        );
    }

    let all_passed = session
        .cases
        .iter()
        .all(|case| case.status == TestStatus::Passed);
    Ok(if all_passed && !outcome.cancelled {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn override_command(args: OverrideArgs, conn: &rusqlite::Connection) -> Result<ExitCode, String> {
    let mut session = storage::load_session(conn)?
        .ok_or_else(|| "No stored session; run a batch first".to_string())?;
    let response = read_file(&args.response_file)?;

    let status =
        apply_manual_override(&mut session.cases, &args.case, &response, &session.comparison)?;
    storage::save_session(conn, &session)?;

    println!("{} {status}", args.case);
    Ok(ExitCode::SUCCESS)
}

fn report_command(args: ReportArgs, conn: &rusqlite::Connection) -> Result<ExitCode, String> {
    let session = storage::load_session(conn)?
        .ok_or_else(|| "No stored session; run a batch first".to_string())?;

    if let Some(path) = &args.output {
        let report = csv::write_csv(&report_rows(&session.cases));
        fs::write(path, report)
            .map_err(|err| format!("Failed to write report `{}`: {err}", path.display()))?;
        println!("report written to {}", path.display());
    }

    print_summary(&session.cases, true);
    Ok(ExitCode::SUCCESS)
}

fn print_summary(cases: &[domain::TestCase], verbose: bool) {
    let passed = cases.iter().filter(|c| c.status == TestStatus::Passed).count();
    let failed = cases.iter().filter(|c| c.status == TestStatus::Failed).count();
    let errored = cases.iter().filter(|c| c.status == TestStatus::Error).count();
    println!(
        "{} cases: {passed} passed, {failed} failed, {errored} errored",
        cases.len()
    );

    if verbose {
        for case in cases
            .iter()
            .filter(|c| matches!(c.status, TestStatus::Failed | TestStatus::Error))
        {
            println!("  {} {}", case.id, case.status);
            println!("    expected:  {}", case.expected_result);
            println!("    extracted: {}", case.compared_value.as_deref().unwrap_or(""));
            if let Some(url) = &case.final_url {
                println!("    url:       {url}");
            }
            if let Some(code) = case.status_code {
                println!("    http:      {code}");
            }
            if let Some(message) = &case.error_message {
                println!("    error:     {message}");
            }
        }
    }
}

fn read_file(path: &std::path::Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read `{}`: {err}", path.display()))
}
