//! Parser for gofasta mutation tokens.
//!
//! A mutation string is a `|`-delimited list of tokens. Two shapes are recognized:
//!
//! - `nuc:<REF><POS><ALT>`: a nucleotide substitution
//! - `aa:<FEATURE>:<REFAA><POSAA><ALTAA>(nuc:<REF><POS><ALT>)`: an amino-acid
//!   substitution anchored to the nucleotide substitution that caused it
//!
//! Anything else is dropped without failing the row.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Namespace prefix applied to feature identifiers at parse time.
pub const FEATURE_PREFIX: &str = "cds-";

static NUCLEOTIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^nuc:([ACGT])(\d+)([ACGT])").expect("valid regex"));

static AMINO_ACID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^aa:([^:]+):([A-Z])(\d+)([A-Z])\(nuc:([ACGT])(\d+)([ACGT])\)")
        .expect("valid regex")
});

static PROTEIN_CHANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"aa:[^:]+:([A-Z])(\d+)([A-Z])").expect("valid regex"));

/// Identity key of a nucleotide substitution: (position, reference, alternate).
pub type NucleotideKey = (u64, u8, u8);

/// A single-base substitution at a 1-based genome position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NucleotideMutation {
    pub position: u64,
    pub reference: u8,
    pub alternate: u8,
}

impl NucleotideMutation {
    #[must_use]
    pub fn key(&self) -> NucleotideKey {
        (self.position, self.reference, self.alternate)
    }

    /// Zero-based index of this base within its codon.
    #[must_use]
    pub fn position_in_codon(&self) -> usize {
        ((self.position - 1) % 3) as usize
    }
}

/// An amino-acid substitution at a 1-based codon index within a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProteinChange {
    pub reference: u8,
    pub position: u32,
    pub alternate: u8,
}

/// An amino-acid substitution with the nucleotide change that anchors it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AminoAcidMutation {
    /// Feature identifier, already carrying [`FEATURE_PREFIX`].
    pub feature: String,
    pub change: ProteinChange,
    pub linked: NucleotideMutation,
}

/// One recognized token of a mutation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationToken {
    Nucleotide(NucleotideMutation),
    AminoAcid(AminoAcidMutation),
}

/// Tokens recognized in one mutation string.
#[derive(Debug, Default)]
pub struct ParsedMutations {
    pub tokens: Vec<MutationToken>,
    /// Non-empty tokens that matched neither grammar.
    pub dropped: usize,
}

fn byte_at(caps: &Captures<'_>, group: usize) -> u8 {
    caps[group].as_bytes()[0]
}

/// Parse a strictly positive integer; zero or overflow is rejected.
fn positive<T>(digits: &str) -> Option<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    digits.parse::<T>().ok().filter(|v| *v != T::default())
}

fn nucleotide_from(caps: &Captures<'_>, first: usize) -> Option<NucleotideMutation> {
    Some(NucleotideMutation {
        reference: byte_at(caps, first),
        position: positive(&caps[first + 1])?,
        alternate: byte_at(caps, first + 2),
    })
}

/// Parse a `nuc:` token.
#[must_use]
pub fn parse_nucleotide(token: &str) -> Option<NucleotideMutation> {
    let caps = NUCLEOTIDE_RE.captures(token)?;
    nucleotide_from(&caps, 1)
}

/// Parse an `aa:` token including its linked nucleotide substitution.
#[must_use]
pub fn parse_amino_acid(token: &str) -> Option<AminoAcidMutation> {
    let caps = AMINO_ACID_RE.captures(token)?;
    Some(AminoAcidMutation {
        feature: format!("{FEATURE_PREFIX}{}", &caps[1]),
        change: ProteinChange {
            reference: byte_at(&caps, 2),
            position: positive(&caps[3])?,
            alternate: byte_at(&caps, 4),
        },
        linked: nucleotide_from(&caps, 5)?,
    })
}

/// Parse a single token, dispatching on its prefix.
#[must_use]
pub fn parse_token(token: &str) -> Option<MutationToken> {
    if token.starts_with("nuc:") {
        parse_nucleotide(token).map(MutationToken::Nucleotide)
    } else if token.starts_with("aa:") {
        parse_amino_acid(token).map(MutationToken::AminoAcid)
    } else {
        None
    }
}

/// Parse every token of a `|`-delimited mutation string.
#[must_use]
pub fn parse_mutations(mutations: &str) -> ParsedMutations {
    let mut parsed = ParsedMutations::default();
    for token in mutations.split('|') {
        if token.is_empty() {
            continue;
        }
        match parse_token(token) {
            Some(t) => parsed.tokens.push(t),
            None => parsed.dropped += 1,
        }
    }
    parsed
}

/// Lenient amino-acid change extraction: only `aa:<FEATURE>:<REF><POS><ALT>` is
/// required, the linked nucleotide suffix may be absent.
#[must_use]
pub fn parse_protein_change(token: &str) -> Option<ProteinChange> {
    if !token.starts_with("aa:") {
        return None;
    }
    let caps = PROTEIN_CHANGE_RE.captures(token)?;
    Some(ProteinChange {
        reference: byte_at(&caps, 1),
        position: positive(&caps[2])?,
        alternate: byte_at(&caps, 3),
    })
}
