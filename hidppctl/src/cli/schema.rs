use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hidpp::feature::{MessageDescriptor, registry::KnownFeature};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use super::{Cli, parse_feature, report_name};

/// Print the functions and events of one feature version.
#[derive(Args)]
pub struct TableCommand {
    /// The feature name or ID
    #[arg(value_parser = parse_feature)]
    feature: (u16, KnownFeature),

    version: u8,
}

impl TableCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let (id, feat) = self.feature;
        let entry = feat.table.entry(self.version)?;
        let mut stdout = BufWriter::new(anstream::stdout());

        if root.json {
            let functions: Vec<_> = entry
                .functions
                .iter()
                .map(|(index, function)| {
                    json!({
                        "index": index,
                        "request": function.request.name(),
                        "request_report": report_name(function.request.report),
                        "response": function.response.name(),
                        "response_report": report_name(function.response.report),
                    })
                })
                .collect();
            let events: Vec<_> = entry
                .events
                .iter()
                .map(|(index, event)| {
                    json!({
                        "index": index,
                        "report": event.name(),
                        "report_kind": report_name(event.report),
                    })
                })
                .collect();
            writeln!(
                stdout,
                "{}",
                json!({
                    "feature": feat.name,
                    "id": id,
                    "version": self.version,
                    "main": entry.main.name,
                    "max_function_index": entry.main.max_function_index,
                    "functions": functions,
                    "events": events,
                })
            )?;
            return Ok(stdout.flush()?);
        }

        writeln!(
            stdout,
            "{} {} v{}: {}, max function index {}",
            feat.name.bold(),
            format!("({id:#06x})").bright_black(),
            self.version,
            entry.main.name,
            entry.main.max_function_index
        )?;
        writeln!(stdout, " │")?;
        for (index, function) in &entry.functions {
            writeln!(
                stdout,
                " ├─ {} {} {} {}",
                format!("fn {index}").bright_blue(),
                describe(function.request),
                "→".bright_black(),
                describe(function.response)
            )?;
        }

        let events_len = entry.events.len();
        if events_len == 0 {
            writeln!(stdout, " ╰─ {}", "No events.".bright_black().italic())?;
        }
        for (i, (index, event)) in entry.events.iter().enumerate() {
            writeln!(
                stdout,
                "{} {} {}",
                if i == events_len - 1 { " ╰─" } else { " ├─" },
                format!("ev {index}").green(),
                describe(event)
            )?;
        }

        Ok(stdout.flush()?)
    }
}

fn describe(desc: &MessageDescriptor) -> String {
    format!("{} {}", desc.name(), format!("({})", report_name(desc.report)).bright_black())
}

/// One row of the `layout` output in `--json` mode.
#[derive(Serialize)]
struct FieldRow {
    id: u8,
    name: &'static str,
    offset: usize,
    bits: usize,
    default: Option<u64>,
    optional: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum Target {
    Function,
    Event,
}

/// Print the field table of one message type.
#[derive(Args)]
pub struct LayoutCommand {
    /// The feature name or ID
    #[arg(value_parser = parse_feature)]
    feature: (u16, KnownFeature),

    version: u8,

    #[arg(value_enum)]
    target: Target,

    /// The function or event index
    index: u8,

    /// Show the response instead of the request of a function
    #[arg(long)]
    response: bool,
}

impl LayoutCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let (_, feat) = self.feature;
        let desc = match (self.target, self.response) {
            (Target::Function, false) => feat.table.get_request_type(self.version, self.index),
            (Target::Function, true) => feat.table.get_response_type(self.version, self.index),
            (Target::Event, _) => feat.table.get_report_type(self.version, self.index),
        }
        .context("could not resolve the message type")?;

        let mut stdout = BufWriter::new(anstream::stdout());

        if root.json {
            let fields: Vec<_> = desc
                .layout
                .iter()
                .map(|(field, offset)| FieldRow {
                    id: field.id,
                    name: field.name,
                    offset,
                    bits: field.bit_length,
                    default: field.default_value,
                    optional: field.optional,
                })
                .collect();
            writeln!(
                stdout,
                "{}",
                json!({
                    "name": desc.name(),
                    "kind": desc.kind.to_string(),
                    "report": report_name(desc.report),
                    "versions": desc.versions,
                    "request_list": desc.request_list,
                    "fields": fields,
                })
            )?;
            return Ok(stdout.flush()?);
        }

        writeln!(stdout, "{}", describe(desc).bold())?;
        if !desc.request_list.is_empty() {
            writeln!(stdout, "answers {}", desc.request_list.join(", ").bright_black())?;
        }
        writeln!(
            stdout,
            "{}",
            format!("{:<4} {:<36} {:>6} {:>5} {:>8}  optional", "id", "name", "offset", "bits", "default")
                .bright_black()
        )?;
        for (field, offset) in desc.layout.iter() {
            writeln!(
                stdout,
                "{:<4} {:<36} {:>6} {:>5} {:>8}  {}",
                format!("{:#04x}", field.id),
                field.name,
                offset,
                field.bit_length,
                field.default_value.map_or_else(|| "-".to_owned(), |v| format!("{v:#x}")),
                if field.optional { "yes" } else { "no" }
            )?;
        }

        Ok(stdout.flush()?)
    }
}
