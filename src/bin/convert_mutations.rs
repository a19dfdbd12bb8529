use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use mutmerge::cli::{self, format_count};
use mutmerge::convert::{self, ConversionStats};
use mutmerge::genetic_code::GeneticCode;
use mutmerge::input;

#[derive(Parser)]
#[command(
    name = "convert_mutations",
    about = "Convert gofasta mutation calls to merged JSON records"
)]
struct Cli {
    /// gofasta CSV with `query` and `mutations` columns (optionally gzipped)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output JSON file
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Number of example records to print after conversion
    #[arg(short = 'n', long = "examples", default_value_t = 3)]
    examples: usize,
}

fn report(stats: &ConversionStats) {
    cli::kv("Rows", &format_count(stats.rows_read));
    if stats.rows_without_mutations > 0 {
        cli::kv("Skipped (no mutations)", &format_count(stats.rows_without_mutations));
    }
    if stats.rows_unmatched_query > 0 {
        cli::kv("Skipped (query name)", &format_count(stats.rows_unmatched_query));
    }
    cli::kv("Tokens", &format_count(stats.tokens_parsed));
    if stats.tokens_dropped > 0 {
        cli::kv("Tokens dropped", &format_count(stats.tokens_dropped));
    }
    cli::kv("Records", &format_count(stats.records_emitted));
    cli::kv("Duplicates", &format_count(stats.duplicates_discarded));
    if stats.ambiguous_resolutions > 0 {
        cli::warning(&format!(
            "{} codon pairs are not consistent with a single-base substitution",
            format_count(stats.ambiguous_resolutions)
        ));
    }
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();

    cli::banner("Convert Mutations");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");
    cli::kv("Input", &cli_args.input.display().to_string());
    cli::kv("Output", &cli_args.output.display().to_string());
    eprintln!();

    // ── Conversion ───────────────────────────────────────
    cli::section("Conversion");

    let code = GeneticCode::standard();
    let reader = input::open(&cli_args.input)?;
    let (records, stats) = convert::convert_gofasta(reader, &code)
        .with_context(|| format!("failed to convert {}", cli_args.input.display()))?;
    report(&stats);

    let file = File::create(&cli_args.output)
        .with_context(|| format!("failed to create {}", cli_args.output.display()))?;
    convert::write_json(&records, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", cli_args.output.display()))?;
    cli::success(&format!(
        "converted {} mutations to {}",
        format_count(records.len()),
        cli_args.output.display()
    ));
    eprintln!();

    // ── Examples ─────────────────────────────────────────
    if cli_args.examples > 0 && !records.is_empty() {
        cli::section("Examples");
        let examples = convert::example_records(&records, cli_args.examples);
        if examples.iter().all(|r| r.aa_mutations.is_empty()) {
            cli::kv("Note", &"no records with amino-acid mutations".dimmed().to_string());
        }
        for (i, record) in examples.iter().enumerate() {
            if i > 0 {
                eprintln!("{}", "─".repeat(40).dimmed());
            }
            eprintln!("{}", serde_json::to_string_pretty(record)?);
        }
    }

    cli::print_summary(start);
    Ok(())
}
