//! Codon inference for amino-acid substitutions.
//!
//! An `aa:` token reports the amino-acid change and exactly one nucleotide
//! substitution inside the affected codon. The other two bases are not observed,
//! so the codon pair is inferred from the genetic code. Strategies are tried in
//! order and the first to produce a pair wins:
//!
//! 1. [`Resolution::SingleSubstitution`]: the first (reference, alternate) candidate
//!    pair, in table enumeration order, that differs only at the known position.
//! 2. [`Resolution::IndependentCandidates`]: the first reference candidate and the
//!    first alternate candidate, chosen independently.
//! 3. [`Resolution::Synthesized`]: whatever side has no candidate is built from
//!    the known base, with `N` at unobserved positions.
//!
//! Resolution never fails. A pair from strategy 2 or 3 is a best-effort guess.

use crate::genetic_code::{Codon, GeneticCode};
use crate::mutation::AminoAcidMutation;

/// How a [`ResolvedCodonPair`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    SingleSubstitution,
    IndependentCandidates,
    Synthesized,
}

impl Resolution {
    /// True unless the pair is consistent with a single-base substitution.
    #[must_use]
    pub fn is_ambiguous(self) -> bool {
        self != Self::SingleSubstitution
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCodonPair {
    pub reference: Codon,
    pub alternate: Codon,
    pub resolution: Resolution,
}

/// Observed evidence for one amino-acid substitution.
struct Evidence<'a> {
    position_in_codon: usize,
    reference_base: u8,
    alternate_base: u8,
    reference_candidates: Vec<&'a Codon>,
    alternate_candidates: Vec<&'a Codon>,
}

type Strategy = fn(&Evidence<'_>) -> Option<ResolvedCodonPair>;

const STRATEGIES: [Strategy; 2] = [single_substitution, independent_candidates];

fn single_substitution(e: &Evidence<'_>) -> Option<ResolvedCodonPair> {
    e.reference_candidates.iter().find_map(|&reference| {
        e.alternate_candidates
            .iter()
            .find(|alternate| reference.agrees_outside(alternate, e.position_in_codon))
            .map(|&&alternate| ResolvedCodonPair {
                reference: *reference,
                alternate,
                resolution: Resolution::SingleSubstitution,
            })
    })
}

fn independent_candidates(e: &Evidence<'_>) -> Option<ResolvedCodonPair> {
    let reference = **e.reference_candidates.first()?;
    let alternate = **e.alternate_candidates.first()?;
    Some(ResolvedCodonPair {
        reference,
        alternate,
        resolution: Resolution::IndependentCandidates,
    })
}

/// Terminal strategy: always produces a pair.
fn synthesize(e: &Evidence<'_>) -> ResolvedCodonPair {
    let reference = e
        .reference_candidates
        .first()
        .map(|&&c| c)
        .unwrap_or_else(|| Codon::unknown_except(e.position_in_codon, e.reference_base));
    let alternate = e
        .alternate_candidates
        .first()
        .map(|&&c| c)
        .unwrap_or_else(|| reference.with_base(e.position_in_codon, e.alternate_base));
    ResolvedCodonPair {
        reference,
        alternate,
        resolution: Resolution::Synthesized,
    }
}

/// Infers codon pairs against a shared genetic code.
#[derive(Clone, Copy)]
pub struct CodonResolver<'a> {
    code: &'a GeneticCode,
}

impl<'a> CodonResolver<'a> {
    #[must_use]
    pub fn new(code: &'a GeneticCode) -> Self {
        Self { code }
    }

    #[must_use]
    pub fn resolve(&self, mutation: &AminoAcidMutation) -> ResolvedCodonPair {
        let linked = &mutation.linked;
        let position_in_codon = linked.position_in_codon();
        let candidates = |amino_acid: u8, base: u8| -> Vec<&'a Codon> {
            self.code
                .codons_encoding(amino_acid)
                .iter()
                .filter(|c| c.base(position_in_codon) == base)
                .collect()
        };

        let evidence = Evidence {
            position_in_codon,
            reference_base: linked.reference,
            alternate_base: linked.alternate,
            reference_candidates: candidates(mutation.change.reference, linked.reference),
            alternate_candidates: candidates(mutation.change.alternate, linked.alternate),
        };

        STRATEGIES
            .iter()
            .find_map(|strategy| strategy(&evidence))
            .unwrap_or_else(|| synthesize(&evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::parse_amino_acid;

    fn resolve(token: &str) -> ResolvedCodonPair {
        let code = GeneticCode::standard();
        let mutation = parse_amino_acid(token).unwrap();
        CodonResolver::new(&code).resolve(&mutation)
    }

    fn codons(pair: &ResolvedCodonPair) -> (String, String) {
        (pair.reference.to_string(), pair.alternate.to_string())
    }

    #[test]
    fn single_substitution_third_position() {
        let pair = resolve("aa:M:F2L(nuc:T3A)");
        assert_eq!(codons(&pair), ("TTT".to_string(), "TTA".to_string()));
        assert_eq!(pair.resolution, Resolution::SingleSubstitution);
        assert!(!pair.resolution.is_ambiguous());
    }

    #[test]
    fn single_substitution_first_position() {
        // position 4 → index 0; D→N with G→A at first base: GAT→AAT
        let pair = resolve("aa:HA:D2N(nuc:G4A)");
        assert_eq!(codons(&pair), ("GAT".to_string(), "AAT".to_string()));
        assert_eq!(pair.resolution, Resolution::SingleSubstitution);
    }

    #[test]
    fn first_agreeing_pair_in_enumeration_order() {
        // S→L with C→T at the middle base: TCA→TTA comes before TCG→TTG
        let pair = resolve("aa:NA:S5L(nuc:C14T)");
        assert_eq!(codons(&pair), ("TCA".to_string(), "TTA".to_string()));
    }

    #[test]
    fn independent_fallback_when_no_pair_agrees() {
        // F codons start with T, P codons with C: no pair differs only at index 1
        let pair = resolve("aa:M:F3P(nuc:T8C)");
        assert_eq!(pair.resolution, Resolution::IndependentCandidates);
        assert_eq!(codons(&pair), ("TTT".to_string(), "CCT".to_string()));
        assert!(pair.resolution.is_ambiguous());
    }

    #[test]
    fn synthesized_reference_for_inconsistent_base() {
        // No F codon has G at index 2
        let pair = resolve("aa:M:F2L(nuc:G3A)");
        assert_eq!(pair.resolution, Resolution::Synthesized);
        assert_eq!(pair.reference.to_string(), "NNG");
        // L candidates with A at index 2 exist; first is TTA
        assert_eq!(pair.alternate.to_string(), "TTA");
    }

    #[test]
    fn synthesized_alternate_from_resolved_reference() {
        // W is only TGG; no W codon has C at index 2
        let pair = resolve("aa:M:C2W(nuc:T3C)");
        assert_eq!(pair.resolution, Resolution::Synthesized);
        assert_eq!(codons(&pair), ("TGT".to_string(), "TGC".to_string()));
    }

    #[test]
    fn unknown_amino_acid_degrades_to_placeholders() {
        let pair = resolve("aa:X:Z9Q(nuc:A1T)");
        assert_eq!(pair.resolution, Resolution::Synthesized);
        assert_eq!(pair.reference.to_string(), "ANN");
        // Q codons (CAA, CAG) never start with T
        assert_eq!(pair.alternate.to_string(), "TNN");
        assert_eq!(GeneticCode::standard().amino_acid_of(&pair.reference), None);
    }
}
