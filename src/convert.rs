//! Conversion of gofasta mutation tables into merged, deduplicated records.

use std::io::{Read, Write};

use crate::dedup::Deduplicator;
use crate::error::Error;
use crate::genetic_code::GeneticCode;
use crate::input::column_index;
use crate::mutation::parse_mutations;
use crate::query::parse_query;
use crate::record::{MergedMutationRecord, MutationRecordMerger};
use crate::resolver::CodonResolver;

/// Counters collected over one conversion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionStats {
    pub rows_read: usize,
    pub rows_without_mutations: usize,
    pub rows_unmatched_query: usize,
    pub tokens_parsed: usize,
    pub tokens_dropped: usize,
    pub records_emitted: usize,
    pub duplicates_discarded: usize,
    pub ambiguous_resolutions: usize,
}

/// Single-threaded conversion engine. One instance is one run: its
/// deduplication state spans every row pushed into it.
pub struct MutationConverter<'a> {
    resolver: CodonResolver<'a>,
    dedup: Deduplicator,
    records: Vec<MergedMutationRecord>,
    stats: ConversionStats,
}

impl<'a> MutationConverter<'a> {
    #[must_use]
    pub fn new(code: &'a GeneticCode) -> Self {
        Self {
            resolver: CodonResolver::new(code),
            dedup: Deduplicator::new(),
            records: Vec::new(),
            stats: ConversionStats::default(),
        }
    }

    /// Process one table row. Rows with no mutations or an unrecognized query
    /// name are skipped.
    pub fn push_row(&mut self, query: &str, mutations: &str) {
        self.stats.rows_read += 1;

        if mutations.trim().is_empty() {
            self.stats.rows_without_mutations += 1;
            return;
        }
        let Some(context) = parse_query(query) else {
            self.stats.rows_unmatched_query += 1;
            return;
        };

        let parsed = parse_mutations(mutations);
        self.stats.tokens_parsed += parsed.tokens.len();
        self.stats.tokens_dropped += parsed.dropped;

        let outcome = MutationRecordMerger::new(&context).merge(&parsed.tokens, &self.resolver);
        self.stats.ambiguous_resolutions += outcome.ambiguous_resolutions;

        let candidates = outcome.records.len();
        let before = self.records.len();
        self.records.extend(self.dedup.filter(outcome.records));
        let kept = self.records.len() - before;
        self.stats.records_emitted += kept;
        self.stats.duplicates_discarded += candidates - kept;
    }

    #[must_use]
    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }

    /// Records in emission order, with the run statistics.
    #[must_use]
    pub fn finish(self) -> (Vec<MergedMutationRecord>, ConversionStats) {
        (self.records, self.stats)
    }
}

/// Convert a gofasta CSV (header with `query` and `mutations` columns).
pub fn convert_gofasta<R: Read>(
    reader: R,
    code: &GeneticCode,
) -> Result<(Vec<MergedMutationRecord>, ConversionStats), Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let query_column = column_index(&headers, "query")?;
    let mutations_column = column_index(&headers, "mutations")?;

    let mut converter = MutationConverter::new(code);
    for row in csv_reader.records() {
        let row = row?;
        let query = row.get(query_column).unwrap_or("");
        let mutations = row.get(mutations_column).unwrap_or("");
        converter.push_row(query, mutations);
    }
    Ok(converter.finish())
}

/// Write records as a pretty-printed JSON array.
pub fn write_json<W: Write>(records: &[MergedMutationRecord], mut writer: W) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Up to `n` records carrying amino-acid annotations, or the first `n` records
/// when none carry any.
#[must_use]
pub fn example_records(records: &[MergedMutationRecord], n: usize) -> Vec<&MergedMutationRecord> {
    let annotated: Vec<_> = records
        .iter()
        .filter(|r| !r.aa_mutations.is_empty())
        .take(n)
        .collect();
    if annotated.is_empty() {
        records.iter().take(n).collect()
    } else {
        annotated
    }
}
