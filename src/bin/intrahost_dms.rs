use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use mutmerge::cli::{self, format_count};
use mutmerge::config::DmsConfig;
use mutmerge::dms::DmsTable;
use mutmerge::dms::intrahost::{annotate, discover_variant_files, read_tables, write_outputs};

#[derive(Parser)]
#[command(
    name = "intrahost_dms",
    about = "Annotate intrahost variant tables with DMS scores"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Directory with variant TSV files
    #[arg(short = 'd', long = "data-dir")]
    data_dir: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "output-dir")]
    output_dir: PathBuf,

    /// Rows per parallel scoring chunk
    #[arg(long = "chunk-size", default_value_t = 10_000)]
    chunk_size: usize,

    /// Number of worker threads
    #[arg(short = 't', long = "threads", default_value_t = 4)]
    threads: usize,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();

    cli::banner("Intrahost DMS");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let config = DmsConfig::from_file(&cli_args.config)?;
    cli::kv("Config", &cli_args.config.display().to_string());
    cli::kv("Data", &cli_args.data_dir.display().to_string());
    cli::kv("Output", &cli_args.output_dir.display().to_string());
    cli::kv("Threads", &cli_args.threads.to_string());
    eprintln!();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli_args.threads)
        .build()
        .context("failed to build thread pool")?;

    pool.install(|| -> Result<()> {
        // ── Variant Files ────────────────────────────────
        cli::section("Variant Files");

        let files = discover_variant_files(&cli_args.data_dir)
            .with_context(|| format!("failed to list {}", cli_args.data_dir.display()))?;
        let mut ha = read_tables(&files.ha).context("failed to read HA variant files")?;
        let other = read_tables(&files.other).context("failed to read variant files")?;

        cli::kv("HA files", &files.ha.len().to_string());
        cli::kv("Other files", &files.other.len().to_string());
        if ha.is_empty() && other.is_empty() {
            cli::warning("no .tsv variant files found");
        }
        eprintln!();

        // ── DMS Scores ───────────────────────────────────
        cli::section("DMS Scores");

        let table = DmsTable::load(&config).context("failed to load DMS data")?;
        cli::kv("Entries", &format_count(table.len()));
        cli::kv("Score columns", &table.score_columns().len().to_string());

        let mut rows = 0;
        for variants in &mut ha {
            annotate(variants, &table, cli_args.chunk_size);
            rows += variants.rows.len();
        }
        cli::kv("HA variants scored", &format_count(rows));
        eprintln!();

        // ── Output ───────────────────────────────────────
        cli::section("Output");

        let written = write_outputs(&cli_args.output_dir, &ha, &other)
            .with_context(|| format!("failed to write to {}", cli_args.output_dir.display()))?;
        cli::kv("Files", &written.files.len().to_string());
        cli::kv("Combined rows", &format_count(written.combined_rows));
        cli::success("saved outputs");
        Ok(())
    })?;

    cli::print_summary(start);
    Ok(())
}
