mod capabilities;
mod codec;
mod effect;
mod schema;
mod send;

use std::fmt::Write as _;

use anyhow::Result;
use capabilities::CapabilitiesCommand;
use clap::{Parser, Subcommand};
use codec::{DecodeCommand, EncodeCommand};
use effect::EffectCommand;
use hidpp::{
    bitfield::FieldValue,
    feature::{DecodedMessage, registry::{self, KnownFeature}},
    layout::FieldValues,
    protocol::v20::ReportKind,
};
use itertools::Itertools;
use owo_colors::OwoColorize;
use schema::{LayoutCommand, TableCommand};
use send::SendCommand;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    color: colorchoice_clap::Color,

    #[command(subcommand)]
    command: Commands,

    /// Output plain JSON without color
    #[arg(short, long, global = true)]
    json: bool,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    Table(TableCommand),
    Layout(LayoutCommand),
    Encode(EncodeCommand),
    Decode(DecodeCommand),
    Effect(EffectCommand),
    Capabilities(CapabilitiesCommand),
    Send(SendCommand),
}

pub async fn execute() -> Result<()> {
    let cli = Cli::parse();

    cli.color.write_global();
    init_logging(&cli.log_level);

    match &cli.command {
        Commands::Table(cmd) => cmd.execute(&cli),
        Commands::Layout(cmd) => cmd.execute(&cli),
        Commands::Encode(cmd) => cmd.execute(&cli),
        Commands::Decode(cmd) => cmd.execute(&cli),
        Commands::Effect(cmd) => cmd.execute(&cli),
        Commands::Capabilities(cmd) => cmd.execute(&cli),
        Commands::Send(cmd) => cmd.execute(&cli).await,
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses a feature given by name (`RgbEffects`) or ID (`0x8071`).
pub(crate) fn parse_feature(arg: &str) -> Result<(u16, KnownFeature), String> {
    if let Some((id, feat)) = registry::lookup_name(arg) {
        return Ok((id, feat));
    }

    let id = parse_int(arg)
        .ok()
        .and_then(|id| u16::try_from(id).ok())
        .ok_or_else(|| format!("`{arg}` is neither a feature name nor a feature ID"))?;
    registry::lookup(id)
        .map(|feat| (id, feat))
        .ok_or_else(|| format!("feature {id:#06x} is not known"))
}

/// Parses a decimal or `0x` prefixed hexadecimal integer.
pub(crate) fn parse_int(arg: &str) -> Result<u64, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|err| format!("invalid number `{arg}`: {err}"))
}

pub(crate) fn parse_u8(arg: &str) -> Result<u8, String> {
    let value = parse_int(arg)?;
    u8::try_from(value).map_err(|_| format!("{value:#x} does not fit a byte"))
}

pub(crate) fn parse_u16(arg: &str) -> Result<u16, String> {
    let value = parse_int(arg)?;
    u16::try_from(value).map_err(|_| format!("{value:#x} does not fit 16 bits"))
}

/// Parses bytes written as hex, with or without separating whitespace,
/// colons or dashes.
pub(crate) fn parse_hex(arg: &str) -> Result<Vec<u8>, String> {
    let digits: String = arg
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    let digits = digits.strip_prefix("0x").unwrap_or(digits.as_str());
    if digits.len() % 2 != 0 {
        return Err(format!("`{arg}` has an odd number of hex digits"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|err| format!("invalid hex `{arg}`: {err}")))
        .collect()
}

/// A `name=value` pair given on the command line.
///
/// Values that do not fit 64 bits are taken as raw bytes.
#[derive(Clone, Debug)]
pub(crate) struct Assignment {
    pub name: String,
    pub value: FieldValue,
}

pub(crate) fn parse_assignment(arg: &str) -> Result<Assignment, String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `name=value`, got `{arg}`"))?;
    let value = match parse_int(value) {
        Ok(int) => FieldValue::Int(int),
        Err(_) if value.starts_with("0x") => FieldValue::Bytes(parse_hex(value)?),
        Err(err) => return Err(err),
    };

    Ok(Assignment {
        name: name.trim().to_owned(),
        value,
    })
}

pub(crate) fn field_values(assignments: &[Assignment]) -> FieldValues {
    assignments
        .iter()
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect()
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).join(" ")
}

pub(crate) fn report_name(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Short => "short",
        ReportKind::Long => "long",
    }
}

/// Renders the fields of a decoded message in layout order.
pub(crate) fn render_decoded(decoded: &DecodedMessage) -> String {
    let mut out = format!(
        "{} {}\n",
        decoded.descriptor.name().bold(),
        format!("({} {})", report_name(decoded.descriptor.report), decoded.descriptor.kind).bright_black()
    );
    for field in decoded.descriptor.layout.fields() {
        if field.name == "padding" {
            continue;
        }
        if let Some(value) = decoded.values.get(field.name) {
            let _ = writeln!(out, "  {:<36} {}", field.name, value.blue());
        }
    }
    out
}
