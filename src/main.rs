use std::path::PathBuf;

use anyhow::Context;
use attendance_engine::config::AppConfig;
use attendance_engine::models::{BatchResolution, DeadlineStatus, StudentAlerts};
use attendance_engine::report::{self, ReportInput};
use attendance_engine::{aggregate, alerts, db, justification, TierPolicy};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "attendance-engine")]
#[command(about = "Attendance status and justification resolution for the academic portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StudentScope {
    /// Student email as registered in the portal
    #[arg(long = "student", value_name = "EMAIL")]
    email: String,
    #[arg(long, default_value_t = 120)]
    since_days: i64,
    /// Tier policy: effective (default) or absence-share
    #[arg(long)]
    policy: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a submission against the 48 hour justification window
    CheckDeadline {
        /// Class start, e.g. 2025-01-01T08:00:00
        #[arg(long)]
        class: Option<NaiveDateTime>,
        /// Submission time, e.g. 2025-01-03T08:00:00
        #[arg(long)]
        submitted: Option<NaiveDateTime>,
    },
    #[command(flatten)]
    Portal(PortalCommands),
}

/// Commands that read or write the portal database.
#[derive(Subcommand)]
enum PortalCommands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import attendance rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Effective attendance and status tier per course
    Summary(StudentScope),
    /// Critical and warning alerts for a student
    Alerts(StudentScope),
    /// Per-sprint course summaries
    Sprints(StudentScope),
    /// Aggregate status of each justification batch
    Batches {
        #[command(flatten)]
        scope: StudentScope,
        /// Store the derived status back on each batch
        #[arg(long)]
        persist: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: StudentScope,
        #[arg(long, default_value = "attendance-report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_policy(config: &AppConfig, scope: &StudentScope) -> anyhow::Result<TierPolicy> {
    match scope.policy.as_deref() {
        Some(value) => value.parse(),
        None => Ok(config.tier_policy),
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

fn resolve_batches(
    batches: &[justification::JustificationBatch],
) -> anyhow::Result<Vec<BatchResolution>> {
    batches
        .iter()
        .map(|batch| batch.resolve().map_err(anyhow::Error::from))
        .collect()
}

fn check_deadline(class: Option<NaiveDateTime>, submitted: Option<NaiveDateTime>) {
    match justification::within_deadline(class, submitted) {
        DeadlineStatus::Within => println!("Submitted within the 48 hour window."),
        DeadlineStatus::Late => println!("Submitted after the 48 hour window."),
        DeadlineStatus::Indeterminate => {
            println!("Cannot determine compliance: class or submission time is missing.")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckDeadline { class, submitted } => {
            check_deadline(class, submitted);
            Ok(())
        }
        Commands::Portal(command) => {
            let config = AppConfig::from_env()?;
            let pool = connect(&config).await?;
            run(command, &config, &pool).await
        }
    }
}

async fn run(command: PortalCommands, config: &AppConfig, pool: &PgPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();

    match command {
        PortalCommands::InitDb => {
            db::init_db(pool).await?;
            println!("Schema ready.");
        }
        PortalCommands::Seed => {
            db::seed(pool).await?;
            println!("Seed data inserted.");
        }
        PortalCommands::Import { csv } => {
            let inserted = db::import_csv(pool, &csv).await?;
            println!("Inserted {inserted} attendance rows from {}.", csv.display());
        }
        PortalCommands::Summary(scope) => {
            let policy = resolve_policy(config, &scope)?;
            let student_id = db::student_id_by_email(pool, &scope.email).await?;
            let since = aggregate::window_start(today, scope.since_days);
            let records = db::fetch_attendance(pool, student_id, since).await?;
            let summaries = aggregate::summarize_courses(&records, policy);

            if scope.json {
                return print_json(&summaries);
            }
            if summaries.is_empty() {
                println!("No attendance found for this window.");
                return Ok(());
            }

            println!("Attendance for {} since {} ({} policy):", scope.email, since, policy.name());
            for summary in summaries.iter() {
                println!("- {}", report::format_summary_line(summary));
            }
        }
        PortalCommands::Alerts(scope) => {
            let policy = resolve_policy(config, &scope)?;
            let student_id = db::student_id_by_email(pool, &scope.email).await?;
            let since = aggregate::window_start(today, scope.since_days);
            let records = db::fetch_attendance(pool, student_id, since).await?;
            let summaries = aggregate::summarize_courses(&records, policy);
            let student_alerts: StudentAlerts = alerts::generate_alerts(student_id, &summaries);

            if scope.json {
                return print_json(&student_alerts);
            }
            if student_alerts.is_empty() {
                println!("No attendance alerts for {}.", scope.email);
                return Ok(());
            }

            for alert in student_alerts.critical.iter() {
                println!("CRITICAL {}", report::format_alert_line(alert));
            }
            for alert in student_alerts.warning.iter() {
                println!("WARNING  {}", report::format_alert_line(alert));
            }
        }
        PortalCommands::Sprints(scope) => {
            let policy = resolve_policy(config, &scope)?;
            let student_id = db::student_id_by_email(pool, &scope.email).await?;
            let since = aggregate::window_start(today, scope.since_days);
            let sprints = db::fetch_sprints(pool, since).await?;
            let from = aggregate::history_start(since, &sprints);
            let records = db::fetch_attendance(pool, student_id, from).await?;
            let history = aggregate::summarize_sprints(&records, &sprints, policy);

            if scope.json {
                return print_json(&history);
            }
            if history.is_empty() {
                println!("No sprints defined for this window.");
                return Ok(());
            }

            for sprint in history.iter() {
                println!("{} ({} to {}):", sprint.sprint.name, sprint.sprint.start, sprint.sprint.end);
                for summary in sprint.courses.iter() {
                    println!("- {}", report::format_summary_line(summary));
                }
            }
        }
        PortalCommands::Batches { scope, persist } => {
            let student_id = db::student_id_by_email(pool, &scope.email).await?;
            let batches = db::fetch_batches(pool, student_id).await?;
            let resolutions = resolve_batches(&batches)?;

            if persist {
                let resolved_at = Utc::now().naive_utc();
                for resolution in resolutions.iter() {
                    db::persist_batch_status(pool, resolution, resolved_at).await?;
                }
                info!(count = resolutions.len(), "stored batch statuses");
            }

            if scope.json {
                return print_json(&resolutions);
            }
            if resolutions.is_empty() {
                println!("No justification requests for {}.", scope.email);
                return Ok(());
            }

            for resolution in resolutions.iter() {
                if resolution.within_deadline == DeadlineStatus::Indeterminate {
                    warn!(batch_id = %resolution.batch_id, "batch has submissions without timestamps");
                }
                println!("- {}", report::format_batch_line(resolution));
            }
        }
        PortalCommands::Report { scope, out } => {
            let policy = resolve_policy(config, &scope)?;
            let student_id = db::student_id_by_email(pool, &scope.email).await?;
            let since = aggregate::window_start(today, scope.since_days);
            let sprints = db::fetch_sprints(pool, since).await?;
            let from = aggregate::history_start(since, &sprints);
            let records = db::fetch_attendance(pool, student_id, from).await?;
            let batches = db::fetch_batches(pool, student_id).await?;

            let current = aggregate::in_window(&records, since, NaiveDate::MAX);
            let courses = aggregate::summarize_courses(current, policy);
            let student_alerts = alerts::generate_alerts(student_id, &courses);
            let history = aggregate::summarize_sprints(&records, &sprints, policy);
            let resolutions = resolve_batches(&batches)?;

            let report = report::build_report(&ReportInput {
                student_label: &scope.email,
                policy_name: policy.name(),
                cutoff: since,
                courses: &courses,
                alerts: &student_alerts,
                sprints: &history,
                batches: &resolutions,
            });
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
