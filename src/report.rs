//! Result rendering
//!
//! Turns the per-target outcomes of a run into plain text, JSON or CSV,
//! written to stdout or a file.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::executor::Outcome;
use crate::types::{ContactReport, Target};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(Error::Config(format!(
                "Unknown output format '{}'. Must be one of: plain, json, csv",
                other
            ))),
        }
    }
}

/// One target with its final outcome, in submission order.
pub struct ReportEntry {
    pub target: Target,
    pub outcome: Outcome<ContactReport>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    input: &'a Target,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a ContactReport>,
}

/// Render all entries in the requested format.
pub fn render(entries: &[ReportEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => render_plain(entries),
        OutputFormat::Json => render_json(entries),
        OutputFormat::Csv => render_csv(entries),
    }
}

fn render_plain(entries: &[ReportEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        match &entry.outcome {
            Outcome::Success(report) => out.push_str(&report.to_string()),
            Outcome::Empty => {}
            Outcome::Failed(message) => {
                out.push_str(&format!("{}: lookup failed ({})\n", entry.target, message));
            }
        }
    }
    if out.is_empty() {
        out.push_str("No records found.\n");
    }
    out
}

fn render_json(entries: &[ReportEntry]) -> String {
    let json_entries: Vec<JsonEntry> = entries
        .iter()
        .map(|entry| match &entry.outcome {
            Outcome::Success(report) => JsonEntry {
                input: &entry.target,
                status: "found",
                error: None,
                output: Some(report),
            },
            Outcome::Empty => JsonEntry {
                input: &entry.target,
                status: "empty",
                error: None,
                output: None,
            },
            Outcome::Failed(message) => JsonEntry {
                input: &entry.target,
                status: "failed",
                error: Some(message.as_str()),
                output: None,
            },
        })
        .collect();

    // A Vec of plain structs cannot fail to serialize
    serde_json::to_string_pretty(&json_entries).unwrap_or_else(|_| "[]".to_string())
}

fn render_csv(entries: &[ReportEntry]) -> String {
    let mut out = String::from("input,domain,status,value,contact_type,agreement_id,address\n");

    for entry in entries {
        match &entry.outcome {
            Outcome::Success(report) => {
                for record in &report.records {
                    out.push_str(&format!(
                        "{},{},found,{},{},{},{}\n",
                        csv_escape(&entry.target.value),
                        csv_escape(&record.domain),
                        csv_escape(&record.value),
                        record.contact_type,
                        csv_escape(record.agreement_id.as_deref().unwrap_or("")),
                        csv_escape(record.address.as_deref().unwrap_or("")),
                    ));
                }
            }
            Outcome::Empty => {
                out.push_str(&format!(
                    "{},{},empty,,,,\n",
                    csv_escape(&entry.target.value),
                    csv_escape(&entry.target.domain),
                ));
            }
            Outcome::Failed(message) => {
                out.push_str(&format!(
                    "{},{},failed,{},,,\n",
                    csv_escape(&entry.target.value),
                    csv_escape(&entry.target.domain),
                    csv_escape(message),
                ));
            }
        }
    }

    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write rendered output to a file, or stdout when no path is given.
pub fn write_output(content: &str, path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => {
            let path = PathBuf::from(path);
            fs::write(&path, content).map_err(|e| Error::IoWrite {
                path: path.clone(),
                source: e,
            })?;
            eprintln!("Results written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
