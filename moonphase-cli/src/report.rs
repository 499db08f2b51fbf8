use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use moonphase_core::{Harvest, MoonPhase, UpsertAction};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human readable lines as the run progresses
    Console,
    /// A single JSON document once the run finishes
    Json,
}

/// One merged `key=value` line and how it got into the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRecord {
    pub key: String,
    pub value: String,
    pub action: UpsertAction,
}

#[derive(Debug, Default, Serialize)]
struct JsonReport {
    harvests: Vec<Harvest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    updates: Vec<UpdateRecord>,
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M").to_string()
}

fn colored_phase(phase: MoonPhase) -> colored::ColoredString {
    match phase {
        MoonPhase::Full => phase.name().bright_yellow().bold(),
        MoonPhase::New => phase.name().bright_black(),
        _ if phase.is_waxing() => phase.name().cyan(),
        _ => phase.name().blue(),
    }
}

/// Routes run output either straight to the console or into a JSON document.
pub struct Reporter<'w, W: Write> {
    format: ReportFormat,
    out: &'w mut W,
    json: JsonReport,
}

impl<'w, W: Write> Reporter<'w, W> {
    pub fn new(format: ReportFormat, out: &'w mut W) -> Self {
        Self {
            format,
            out,
            json: JsonReport::default(),
        }
    }

    pub fn banner(&mut self, now: DateTime<Utc>) -> std::io::Result<()> {
        if self.format == ReportFormat::Console {
            writeln!(
                self.out,
                "{}",
                format!("{}: Running Moon Harvest Multiplier...", timestamp(now)).bright_cyan()
            )?;
        }
        Ok(())
    }

    pub fn harvest(&mut self, harvest: &Harvest) -> std::io::Result<()> {
        match self.format {
            ReportFormat::Console => {
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "Date: {}\t{}x,{}",
                    harvest.date(),
                    harvest.harvest_multiplier(),
                    colored_phase(harvest.phase())
                )?;
                for (key, value) in harvest.key_values() {
                    writeln!(self.out, "{key}={value}")?;
                }
            }
            ReportFormat::Json => self.json.harvests.push(harvest.clone()),
        }
        Ok(())
    }

    pub fn updating_file(&mut self, now: DateTime<Utc>, path: &Path) -> std::io::Result<()> {
        match self.format {
            ReportFormat::Console => writeln!(
                self.out,
                "{}: Updating setting file: {}",
                timestamp(now),
                path.display()
            )?,
            ReportFormat::Json => self.json.settings_file = Some(path.to_path_buf()),
        }
        Ok(())
    }

    pub fn updates(&mut self, records: &[UpdateRecord]) -> std::io::Result<()> {
        match self.format {
            ReportFormat::Console => {
                for record in records {
                    let label = match record.action {
                        UpsertAction::Updated => "UPDATING VALUE:".green(),
                        UpsertAction::Added => "ADDING VALUE:".yellow(),
                    };
                    writeln!(self.out, "{label} {}={}", record.key, record.value)?;
                }
            }
            ReportFormat::Json => self.json.updates.extend_from_slice(records),
        }
        Ok(())
    }

    /// Flush console output or emit the collected JSON document.
    pub fn finish(self) -> std::io::Result<()> {
        if self.format == ReportFormat::Json {
            serde_json::to_writer_pretty(&mut *self.out, &self.json)?;
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}
