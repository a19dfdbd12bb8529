//! DMS scores for the amino-acid changes of each consensus sequence.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::dms::{DmsTable, format_score};
use crate::error::Error;
use crate::input::column_index;
use crate::mutation::{ProteinChange, parse_protein_change};
use crate::query::sample_segment;

/// Amino-acid changes of one consensus sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusChanges {
    pub consensus: String,
    pub changes: Vec<ProteinChange>,
}

/// A change with the scores found for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChange {
    pub consensus: String,
    pub change: ProteinChange,
    /// Same width as the table's score columns.
    pub scores: Vec<Option<f64>>,
    /// `Some("")` when the table has antibody sets but none for this change.
    pub antibody_set: Option<String>,
    /// The table has an entry for this (site, mutant).
    pub matched: bool,
}

/// Read the amino-acid changes of every row of a gofasta CSV, in row order.
///
/// A repeated query keeps its first position; its change list is replaced.
pub fn collect_protein_changes<R: Read>(reader: R) -> Result<Vec<ConsensusChanges>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let query_column = column_index(&headers, "query")?;
    let mutations_column = column_index(&headers, "mutations")?;

    let mut sequences: Vec<ConsensusChanges> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in csv_reader.records() {
        let row = row?;
        let consensus = row.get(query_column).unwrap_or("").to_string();
        let changes: Vec<ProteinChange> = row
            .get(mutations_column)
            .unwrap_or("")
            .split('|')
            .filter_map(parse_protein_change)
            .collect();

        match positions.get(&consensus) {
            Some(&i) => sequences[i].changes = changes,
            None => {
                positions.insert(consensus.clone(), sequences.len());
                sequences.push(ConsensusChanges { consensus, changes });
            }
        }
    }

    Ok(sequences)
}

/// Look up every change of every sequence. Sequences without changes are
/// dropped; changes without table entries are kept with empty scores.
#[must_use]
pub fn score_sequences(table: &DmsTable, sequences: &[ConsensusChanges]) -> Vec<ScoredChange> {
    let width = table.score_columns().len();
    sequences
        .iter()
        .flat_map(|seq| seq.changes.iter().map(move |c| (seq.consensus.as_str(), *c)))
        .map(|(consensus, change)| {
            let entry = table.lookup(change.position, change.alternate);
            let antibody_set = table.has_antibody_set().then(|| {
                entry
                    .and_then(|e| e.antibody_set.clone())
                    .unwrap_or_default()
            });
            ScoredChange {
                consensus: consensus.to_string(),
                change,
                scores: entry.map_or_else(|| vec![None; width], |e| e.scores.clone()),
                antibody_set,
                matched: entry.is_some(),
            }
        })
        .collect()
}

/// Write scored changes as TSV. Score columns are written only when at least
/// one change matched a table entry; empty values of a matched entry stay as
/// empty cells.
pub fn write_scores_tsv<W: Write>(
    table: &DmsTable,
    scored: &[ScoredChange],
    writer: W,
) -> Result<(), Error> {
    let width = if scored.iter().any(|s| s.matched) {
        table.score_columns().len()
    } else {
        0
    };

    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    let mut header = vec!["Consensus", "ref", "pos", "mutant", "sra", "antibody_set"];
    header.extend(table.score_columns()[..width].iter().map(String::as_str));
    tsv.write_record(&header)?;

    for s in scored {
        let mut row = vec![
            s.consensus.clone(),
            (s.change.reference as char).to_string(),
            s.change.position.to_string(),
            (s.change.alternate as char).to_string(),
            sample_segment(&s.consensus).to_string(),
            s.antibody_set.clone().unwrap_or_default(),
        ];
        row.extend(s.scores[..width].iter().map(|&v| format_score(v)));
        tsv.write_record(&row)?;
    }

    tsv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOFASTA: &str = "\
query,mutations
Consensus_SRR1_HA_a,nuc:A3G|aa:HA:M1A(nuc:T2C)|aa:HA:K2R
Consensus_SRR2_HA_a,
Consensus_SRR3_HA_a,aa:HA:Q9L(nuc:A26T)
Consensus_SRR1_HA_a,aa:HA:M1C(nuc:T2G)
";

    const DMS: &str = "\
site,wildtype,mutant,antibody_set,entry,stability
1,M,A,set1,-0.5,
1,M,C,set1,0.5,
2,K,R,set2,0.75,
";

    fn table() -> DmsTable {
        DmsTable::from_reader(DMS.as_bytes(), "site").unwrap()
    }

    #[test]
    fn collect_changes() {
        let sequences = collect_protein_changes(GOFASTA.as_bytes()).unwrap();
        assert_eq!(sequences.len(), 3);
        assert_eq!(sequences[0].consensus, "Consensus_SRR1_HA_a");
        // replaced by the later row for the same query
        assert_eq!(sequences[0].changes.len(), 1);
        assert_eq!(sequences[0].changes[0].alternate, b'C');
        assert!(sequences[1].changes.is_empty());
        assert_eq!(sequences[2].changes[0].position, 9);
    }

    #[test]
    fn scoring_drops_empty_sequences() {
        let sequences = collect_protein_changes(GOFASTA.as_bytes()).unwrap();
        let scored = score_sequences(&table(), &sequences);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].scores, [Some(0.5), None]);
        assert_eq!(scored[0].antibody_set.as_deref(), Some("set1"));
        assert!(scored[0].matched);
        assert_eq!(scored[1].scores, [None, None]);
        assert!(!scored[1].matched);
        assert_eq!(scored[1].antibody_set.as_deref(), Some(""));
    }

    #[test]
    fn tsv_output() {
        let sequences = vec![ConsensusChanges {
            consensus: "Consensus_SRR1_HA_a".to_string(),
            changes: vec![
                ProteinChange {
                    reference: b'M',
                    position: 1,
                    alternate: b'A',
                },
                ProteinChange {
                    reference: b'K',
                    position: 2,
                    alternate: b'R',
                },
                ProteinChange {
                    reference: b'Q',
                    position: 9,
                    alternate: b'L',
                },
            ],
        }];
        let table = table();
        let scored = score_sequences(&table, &sequences);
        let mut out = Vec::new();
        write_scores_tsv(&table, &scored, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // stability has no values but stays, since matched entries carry it
        assert_eq!(
            lines[0],
            "Consensus\tref\tpos\tmutant\tsra\tantibody_set\tentry\tstability"
        );
        assert_eq!(lines[1], "Consensus_SRR1_HA_a\tM\t1\tA\tSRR1\tset1\t-0.5\t");
        assert_eq!(lines[2], "Consensus_SRR1_HA_a\tK\t2\tR\tSRR1\tset2\t0.75\t");
        assert_eq!(lines[3], "Consensus_SRR1_HA_a\tQ\t9\tL\tSRR1\t\t\t");
    }

    #[test]
    fn tsv_without_matches_has_no_score_columns() {
        let sequences = vec![ConsensusChanges {
            consensus: "Consensus_SRR3_HA_a".to_string(),
            changes: vec![ProteinChange {
                reference: b'Q',
                position: 9,
                alternate: b'L',
            }],
        }];
        let table = table();
        let scored = score_sequences(&table, &sequences);
        let mut out = Vec::new();
        write_scores_tsv(&table, &scored, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Consensus\tref\tpos\tmutant\tsra\tantibody_set");
        assert_eq!(lines[1], "Consensus_SRR3_HA_a\tQ\t9\tL\tSRR3\t");
    }
}
