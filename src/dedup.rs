//! Run-scoped deduplication of merged records.

use std::collections::HashSet;

use crate::mutation::NucleotideKey;
use crate::record::MergedMutationRecord;

/// Keeps the first record seen for each (sample, region, position, ref, alt).
///
/// Owned by a single conversion run; not shared between threads.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<(String, String, NucleotideKey)>,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and marks the key seen if `record` is new. A duplicate is
    /// rejected whole, annotations included.
    pub fn admit(&mut self, record: &MergedMutationRecord) -> bool {
        self.seen.insert((
            record.sample.clone(),
            record.region.clone(),
            record.nucleotide_key(),
        ))
    }

    /// Keep only first occurrences, preserving input order.
    pub fn filter(
        &mut self,
        records: impl IntoIterator<Item = MergedMutationRecord>,
    ) -> impl Iterator<Item = MergedMutationRecord> {
        records.into_iter().filter(move |r| self.admit(r))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic_code::Codon;
    use crate::record::AminoAcidAnnotation;

    fn record(sample: &str, region: &str, position: u64, features: usize) -> MergedMutationRecord {
        MergedMutationRecord {
            sample: sample.to_string(),
            region: region.to_string(),
            position,
            reference: b'T',
            alternate: b'A',
            aa_mutations: vec![
                AminoAcidAnnotation {
                    feature: "cds-M".to_string(),
                    reference_codon: Codon::new(*b"TTT"),
                    alternate_codon: Codon::new(*b"TTA"),
                    reference_amino_acid: b'F',
                    alternate_amino_acid: b'L',
                    amino_acid_position: 2,
                };
                features
            ],
        }
    }

    #[test]
    fn first_seen_wins() {
        let mut dedup = Deduplicator::new();
        let kept: Vec<_> = dedup
            .filter([record("S1", "HA", 3, 0), record("S1", "HA", 3, 2)])
            .collect();
        assert_eq!(kept.len(), 1);
        assert!(kept[0].aa_mutations.is_empty());
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn key_includes_sample_and_region() {
        let mut dedup = Deduplicator::new();
        let kept: Vec<_> = dedup
            .filter([
                record("S1", "HA", 3, 0),
                record("S2", "HA", 3, 0),
                record("S1", "NA", 3, 0),
                record("S1", "HA", 4, 0),
            ])
            .collect();
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn state_persists_across_calls() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit(&record("S1", "HA", 3, 0)));
        assert!(!dedup.admit(&record("S1", "HA", 3, 1)));
        let kept: Vec<_> = dedup.filter([record("S1", "HA", 3, 0)]).collect();
        assert!(kept.is_empty());
    }
}
