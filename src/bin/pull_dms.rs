use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use mutmerge::cli::{self, format_count};
use mutmerge::config::DmsConfig;
use mutmerge::dms::DmsTable;
use mutmerge::dms::score::{collect_protein_changes, score_sequences, write_scores_tsv};
use mutmerge::input;

#[derive(Parser)]
#[command(
    name = "pull_dms",
    about = "Attach DMS scores to the amino-acid mutations of each consensus sequence"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// gofasta CSV with `query` and `mutations` columns
    #[arg(short = 'm', long = "mutation-file")]
    mutation_file: PathBuf,

    /// Output TSV file
    #[arg(short = 'o', long = "output-file")]
    output_file: PathBuf,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();

    cli::banner("Pull DMS");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let config = DmsConfig::from_file(&cli_args.config)?;
    cli::kv("Config", &cli_args.config.display().to_string());
    for (name, path) in config.files() {
        cli::kv(name, &path.display().to_string());
    }
    cli::kv("Site header", &config.site_header);
    eprintln!();

    // ── DMS Table ────────────────────────────────────────
    cli::section("DMS Table");

    let table = DmsTable::load(&config).context("failed to load DMS data")?;
    cli::kv("Entries", &format_count(table.len()));
    cli::kv("Score columns", &table.score_columns().len().to_string());
    if table.skipped_rows() > 0 {
        cli::warning(&format!(
            "{} rows skipped: site is not a positive integer",
            format_count(table.skipped_rows())
        ));
    }
    eprintln!();

    // ── Scoring ──────────────────────────────────────────
    cli::section("Scoring");

    let reader = input::open(&cli_args.mutation_file)?;
    let sequences = collect_protein_changes(reader)
        .with_context(|| format!("failed to read {}", cli_args.mutation_file.display()))?;
    let scored = score_sequences(&table, &sequences);
    let with_scores = scored
        .iter()
        .filter(|s| s.scores.iter().any(Option::is_some))
        .count();

    cli::kv("Sequences", &format_count(sequences.len()));
    cli::kv("Mutations", &format_count(scored.len()));
    cli::kv("With scores", &format_count(with_scores));

    let file = File::create(&cli_args.output_file)
        .with_context(|| format!("failed to create {}", cli_args.output_file.display()))?;
    write_scores_tsv(&table, &scored, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", cli_args.output_file.display()))?;
    cli::success(&format!(
        "wrote DMS scores to {}",
        cli_args.output_file.display()
    ));

    cli::print_summary(start);
    Ok(())
}
