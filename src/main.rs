//! Compensation Engine CLI
//!
//! Reads raw case records from JSON or CSV, evaluates them and dumps the
//! itemized results. Logging follows `RUST_LOG` (e.g. `RUST_LOG=info`).

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;

use compensation_engine::case::loader::load_cases;
use compensation_engine::case::RawValue;
use compensation_engine::money::format_yen;
use compensation_engine::{CalculationResult, CalculationStandard, Engine, EngineConfig, EngineError, RawCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "compensation_engine", version, about = "Itemized damage awards for personal-injury cases")]
struct Args {
    /// Case records (.json with one object or an array, or .csv with one case per row)
    input: PathBuf,

    /// Engine configuration JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the table CSV files
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Force the fee standard for every case (old or new)
    #[arg(long, value_parser = parse_standard)]
    standard: Option<CalculationStandard>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_standard(value: &str) -> Result<CalculationStandard, String> {
    CalculationStandard::parse(value).ok_or_else(|| format!("unknown standard {:?}, expected old or new", value))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.tables {
        config.table_dir = dir.clone();
    }
    if let Some(standard) = args.standard {
        config.default_standard = standard;
    }

    let engine = Engine::new(config).context("loading tables")?;
    log::info!("Tables {}", engine.tables().version());

    let mut cases = load_cases(&args.input)
        .with_context(|| format!("reading cases from {}", args.input.display()))?;
    if let Some(standard) = args.standard {
        for case in &mut cases {
            case.standard = Some(RawValue::from(standard.as_str()));
        }
    }

    let results = engine.evaluate_batch(&cases);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    match args.format {
        OutputFormat::Json => write_json(&mut out, &cases, &results)?,
        OutputFormat::Csv => write_csv(&mut out, &cases, &results)?,
    }
    out.flush()?;

    let failed = results.iter().filter(|r| r.is_err()).count();
    for result in results.iter().flatten() {
        log::info!("{}: {} yen", result.case_id, format_yen(result.grand_total));
    }
    if failed > 0 {
        bail!("{} of {} cases failed", failed, results.len());
    }
    Ok(())
}

/// Case id as entered, or its position in the input when missing
fn case_label(index: usize, raw: &RawCase) -> String {
    raw.case_id
        .as_ref()
        .map(|id| id.as_text())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("#{}", index + 1))
}

fn write_json(
    out: &mut dyn Write,
    cases: &[RawCase],
    results: &[Result<CalculationResult, EngineError>],
) -> Result<()> {
    let entries: Vec<_> = cases
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (raw, result))| match result {
            Ok(result) => json!({ "case_id": result.case_id, "result": result }),
            Err(err) => json!({ "case_id": case_label(index, raw), "error": err.to_string() }),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &entries)?;
    writeln!(out)?;
    Ok(())
}

/// One row per line item, then offset, fee, interest and total rows
fn write_csv(
    out: &mut dyn Write,
    cases: &[RawCase],
    results: &[Result<CalculationResult, EngineError>],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["case_id", "item", "amount", "detail"])?;

    for (index, (raw, result)) in cases.iter().zip(results).enumerate() {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                writer.write_record([case_label(index, raw).as_str(), "error", "", err.to_string().as_str()])?;
                continue;
            }
        };
        let id = result.case_id.as_str();
        for item in &result.line_items {
            writer.write_record([
                id,
                item.category.as_str(),
                item.signed_amount().to_string().as_str(),
                item.trace.render().as_str(),
            ])?;
        }
        let rows = [
            ("gross_total", result.gross_total, String::new()),
            ("fault_offset", -result.offset.fault_offset, result.offset.trace.render()),
            ("prior_payments", -result.offset.prior_payment_deduction, String::new()),
            ("post_offset_total", result.post_offset_total, String::new()),
            ("professional_fee", result.fee.amount, result.fee.trace.render()),
            ("delay_interest", result.interest.amount, result.interest.trace.render()),
            ("grand_total", result.grand_total, format!("tables={}", result.table_version)),
        ];
        for (item, amount, detail) in rows {
            writer.write_record([id, item, amount.to_string().as_str(), detail.as_str()])?;
        }
    }
    writer.flush()?;
    Ok(())
}
