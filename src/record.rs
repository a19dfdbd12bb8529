//! Merged per-nucleotide mutation records.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::genetic_code::Codon;
use crate::mutation::{MutationToken, NucleotideKey, NucleotideMutation};
use crate::resolver::{CodonResolver, ResolvedCodonPair};

fn as_char<S: Serializer>(value: &u8, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_char(*value as char)
}

/// Sample and genome segment a mutation string belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleContext {
    pub sample: String,
    pub region: String,
}

/// One amino-acid consequence of a nucleotide change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AminoAcidAnnotation {
    #[serde(rename = "GFF_FEATURE")]
    pub feature: String,
    #[serde(rename = "ref_codon")]
    pub reference_codon: Codon,
    #[serde(rename = "alt_codon")]
    pub alternate_codon: Codon,
    #[serde(rename = "ref_aa", serialize_with = "as_char")]
    pub reference_amino_acid: u8,
    #[serde(rename = "alt_aa", serialize_with = "as_char")]
    pub alternate_amino_acid: u8,
    #[serde(rename = "pos_aa")]
    pub amino_acid_position: u32,
}

/// A nucleotide change within one sample and region, with every amino-acid
/// annotation attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedMutationRecord {
    #[serde(rename = "sra")]
    pub sample: String,
    pub region: String,
    #[serde(rename = "pos")]
    pub position: u64,
    #[serde(rename = "ref", serialize_with = "as_char")]
    pub reference: u8,
    #[serde(rename = "alt", serialize_with = "as_char")]
    pub alternate: u8,
    pub aa_mutations: Vec<AminoAcidAnnotation>,
}

impl MergedMutationRecord {
    fn new(context: &SampleContext, nucleotide: &NucleotideMutation) -> Self {
        Self {
            sample: context.sample.clone(),
            region: context.region.clone(),
            position: nucleotide.position,
            reference: nucleotide.reference,
            alternate: nucleotide.alternate,
            aa_mutations: Vec::new(),
        }
    }

    #[must_use]
    pub fn nucleotide_key(&self) -> NucleotideKey {
        (self.position, self.reference, self.alternate)
    }
}

/// Result of merging one sample's tokens.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Records in first-insertion order.
    pub records: Vec<MergedMutationRecord>,
    /// Codon pairs not consistent with a single-base substitution.
    pub ambiguous_resolutions: usize,
}

/// Folds one sample's tokens into records keyed by nucleotide change.
///
/// Insertion order is kept explicitly: `records` holds the order and `index`
/// maps each key to its slot.
pub struct MutationRecordMerger<'a> {
    context: &'a SampleContext,
    records: Vec<MergedMutationRecord>,
    index: HashMap<NucleotideKey, usize>,
}

impl<'a> MutationRecordMerger<'a> {
    #[must_use]
    pub fn new(context: &'a SampleContext) -> Self {
        Self {
            context,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Slot for `nucleotide`, created at the end if absent.
    fn slot(&mut self, nucleotide: &NucleotideMutation) -> usize {
        let key = nucleotide.key();
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        let slot = self.records.len();
        self.records
            .push(MergedMutationRecord::new(self.context, nucleotide));
        self.index.insert(key, slot);
        slot
    }

    /// Merge all tokens. Explicit nucleotide tokens are placed first; keys only
    /// seen through an amino-acid token follow in amino-acid encounter order.
    pub fn merge(mut self, tokens: &[MutationToken], resolver: &CodonResolver<'_>) -> MergeOutcome {
        for token in tokens {
            if let MutationToken::Nucleotide(nucleotide) = token {
                self.slot(nucleotide);
            }
        }

        let mut ambiguous_resolutions = 0;
        for token in tokens {
            let MutationToken::AminoAcid(mutation) = token else {
                continue;
            };
            let ResolvedCodonPair {
                reference,
                alternate,
                resolution,
            } = resolver.resolve(mutation);
            if resolution.is_ambiguous() {
                ambiguous_resolutions += 1;
            }

            let slot = self.slot(&mutation.linked);
            self.records[slot].aa_mutations.push(AminoAcidAnnotation {
                feature: mutation.feature.clone(),
                reference_codon: reference,
                alternate_codon: alternate,
                reference_amino_acid: mutation.change.reference,
                alternate_amino_acid: mutation.change.alternate,
                amino_acid_position: mutation.change.position,
            });
        }

        MergeOutcome {
            records: self.records,
            ambiguous_resolutions,
        }
    }
}
