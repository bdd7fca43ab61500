use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use lib_attendance::loggers::loggerlocal::LoggerLocalOptions;
use lib_attendance::{AttendanceFetcher, LogLevel, LogSink, LoggerLocal, VitalDocConfig, find_attendance_in_record};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Fetch a patient's attendance from VitalDoc, falling back to the previous day.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Looks up the attendance history of one subject for one day. If the day has no attendances, the previous day is tried; the whole lookup is retried with a fixed delay while nothing is found. Settings come from an optional JSON5 file and VITALDOC_* environment variables (a .env file is honoured)."
)]
struct Args {
    /// Subject (sponsor) identifier. Defaults to the configured SponsorId.
    #[arg(short, long)]
    subject: Option<String>,

    /// Attendance date as YYYY-MM-DD. Defaults to today.
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Optional JSON5 configuration file.
    #[arg(short, long, env = "VITALDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Print only the subject's own record (`{}` when absent).
    #[arg(short, long)]
    find: bool,

    /// Also write JSON-line logs to this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = VitalDocConfig::load(args.config.as_deref()).context("loading VitalDoc configuration")?;

    let min_level = if args.quiet { LogLevel::Warn } else { LogLevel::Info };
    let options = match args.log_dir {
        Some(dir) => LoggerLocalOptions::tty_and_file(min_level, Some(dir)),
        None => LoggerLocalOptions::tty_only(min_level),
    };
    let logger = Arc::new(LoggerLocal::new("fetch-attendance".to_string(), Some(options)));

    let subject = args
        .subject
        .or_else(|| Some(config.sponsor_id.clone()).filter(|id| !id.is_empty()))
        .context("no subject given and no SponsorId configured")?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let fetcher = AttendanceFetcher::from_config(&config, logger.clone())?;
    let response = match fetcher.execute(&subject, date).await {
        Ok(response) => response,
        Err(e) => {
            logger.error(
                &format!("Attendance lookup failed: {e}"),
                Some(serde_json::json!({"subject_id": subject, "attendance_date": date.to_string()})),
            );
            return Err(e.into());
        }
    };

    let output = if args.find {
        match find_attendance_in_record(&response, &subject) {
            Some(record) => serde_json::to_string_pretty(record)?,
            None => "{}".to_string(),
        }
    } else {
        serde_json::to_string_pretty(&response)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
