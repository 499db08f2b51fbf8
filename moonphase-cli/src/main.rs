mod report;
mod settings_file;

use chrono::{DateTime, NaiveDate, Utc};
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use colored::Colorize;
use moonphase_core::Harvest;
use std::ffi::OsString;
use std::io::{Write, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use report::{ReportFormat, Reporter};
use settings_file::update_settings_file;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

const AFTER_HELP: &str = "\
During a real world full moon the harvest multiplier is increased and NPCs hit harder;
during a new moon everything drops back to normal.

Previewing with --days never updates the settings file.

Example:
  moonphase --file /srv/conan/ConanSandbox/Saved/Config/WindowsServer/ServerSettings.ini";

#[derive(Debug, Parser)]
#[command(name = "moonphase", version)]
#[command(about = "Update Conan Exiles settings based on the real world lunar phase")]
#[command(after_help = AFTER_HELP)]
struct Args {
    /// Path to the settings file to update
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Number of days to preview moon phases (settings file is not updated)
    #[arg(short, long, default_value_t = 0)]
    days: u32,

    /// Specific date to show the moon phase for (YYYY-MM-DD or M/D/YYYY)
    #[arg(long, alias = "dt", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Increase debug message verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DD or M/D/YYYY, got '{raw}'"))
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    HelpShown,
    PreviewShown,
}

impl Outcome {
    const fn exit_code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::HelpShown => 10,
            Self::PreviewShown => 15,
        }
    }
}

#[derive(Debug, Error)]
enum RunError {
    #[error("setting file '{}' does not exist.", .0.display())]
    MissingSettingsFile(PathBuf),
    #[error("updating settings file {}: {cause:#}", .path.display())]
    SettingsUpdate { path: PathBuf, cause: anyhow::Error },
    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),
}

impl RunError {
    const fn exit_code(&self) -> u8 {
        match self {
            Self::MissingSettingsFile(_) => 20,
            Self::SettingsUpdate { .. } => 30,
            Self::Output(_) => 1,
        }
    }
}

const USAGE_ERROR_CODE: u8 = 5;

/// Either parsed arguments or the exit code for a run that stops at parsing.
enum Parsed {
    Run(Args),
    Exit(u8),
}

fn parse_args<I, T>(argv: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    if argv.len() <= 1 {
        let _ = Args::command().print_help();
        return Parsed::Exit(Outcome::HelpShown.exit_code());
    }
    match Args::try_parse_from(argv) {
        Ok(args) => Parsed::Run(args),
        Err(err) => {
            let _ = err.print();
            match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    Parsed::Exit(Outcome::HelpShown.exit_code())
                }
                ErrorKind::DisplayVersion => Parsed::Exit(Outcome::Completed.exit_code()),
                _ => Parsed::Exit(USAGE_ERROR_CODE),
            }
        }
    }
}

const fn default_log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let env = env_logger::Env::default().default_filter_or(default_log_filter(verbosity));
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args_os()) {
        Parsed::Run(args) => args,
        Parsed::Exit(code) => return ExitCode::from(code),
    };
    init_logging(args.verbose);

    let mut out = stdout().lock();
    match run(&args, Utc::now(), &mut out) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            log::debug!("{err:?}");
            eprintln!("{} {err}", "ERROR:".red().bold());
            ExitCode::from(err.exit_code())
        }
    }
}

fn run<W: Write>(args: &Args, now: DateTime<Utc>, out: &mut W) -> Result<Outcome, RunError> {
    let target_date = args.date.unwrap_or_else(|| now.date_naive());
    let mut reporter = Reporter::new(args.report, out);
    reporter.banner(now)?;

    if args.days > 0 {
        if let Some(path) = &args.file {
            log::warn!(
                "previewing {} days; {} will not be updated",
                args.days,
                path.display()
            );
        }
        for harvest in Harvest::preview(target_date, args.days) {
            reporter.harvest(&harvest)?;
        }
        reporter.finish()?;
        return Ok(Outcome::PreviewShown);
    }

    let harvest = Harvest::for_date(target_date);
    log::info!(
        "{} is phase index {} ({})",
        target_date,
        harvest.phase_index(),
        harvest.phase_name()
    );

    if let Some(path) = &args.file {
        if !path.is_file() {
            return Err(RunError::MissingSettingsFile(path.clone()));
        }
        reporter.harvest(&harvest)?;
        reporter.updating_file(now, path)?;
        let records =
            update_settings_file(path, &harvest).map_err(|cause| RunError::SettingsUpdate {
                path: path.clone(),
                cause,
            })?;
        reporter.updates(&records)?;
    } else {
        reporter.harvest(&harvest)?;
    }

    reporter.finish()?;
    Ok(Outcome::Completed)
}
