//! Standard genetic code with a reverse (amino acid → codons) index.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Placeholder for a codon base that could not be inferred.
pub const UNKNOWN_BASE: u8 = b'N';

/// Bases in table order. Codon index = first*16 + second*4 + third.
const BASES: [u8; 4] = [b'T', b'C', b'A', b'G'];

/// NCBI translation table 1, indexed in TCAG order.
#[rustfmt::skip]
const STANDARD_TABLE: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn base_to_index(b: u8) -> Option<usize> {
    match b {
        b'T' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// A nucleotide triplet. May contain [`UNKNOWN_BASE`] placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codon([u8; 3]);

impl Codon {
    #[must_use]
    pub const fn new(bases: [u8; 3]) -> Self {
        Self(bases)
    }

    /// A codon whose only known base is `base` at `position`.
    #[must_use]
    pub fn unknown_except(position: usize, base: u8) -> Self {
        Self([UNKNOWN_BASE; 3]).with_base(position, base)
    }

    #[must_use]
    pub fn base(&self, position: usize) -> u8 {
        self.0[position]
    }

    /// Copy of this codon with `position` replaced by `base`.
    #[must_use]
    pub fn with_base(mut self, position: usize, base: u8) -> Self {
        self.0[position] = base;
        self
    }

    /// True if both codons carry the same bases everywhere except `position`.
    #[must_use]
    pub fn agrees_outside(&self, other: &Codon, position: usize) -> bool {
        (0..3)
            .filter(|&i| i != position)
            .all(|i| self.0[i] == other.0[i])
    }
}

impl fmt::Display for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl Serialize for Codon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Codon → amino acid lookup and its inverse.
///
/// Built once and shared by reference; never mutated after construction.
pub struct GeneticCode {
    table: [u8; 64],
    reverse: HashMap<u8, Vec<Codon>>,
}

impl GeneticCode {
    /// Standard genetic code (NCBI translation table 1). Stop is `*`.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_table(*STANDARD_TABLE)
    }

    fn from_table(table: [u8; 64]) -> Self {
        let mut reverse: HashMap<u8, Vec<Codon>> = HashMap::new();
        for (index, codon) in Self::codons().enumerate() {
            reverse.entry(table[index]).or_default().push(codon);
        }
        Self { table, reverse }
    }

    /// All 64 codons in TCAG enumeration order.
    pub fn codons() -> impl Iterator<Item = Codon> {
        (0..64).map(|i| Codon([BASES[i / 16], BASES[(i / 4) % 4], BASES[i % 4]]))
    }

    /// Amino acid encoded by `codon`, or `None` if it contains a non-ACGT base.
    #[must_use]
    pub fn amino_acid_of(&self, codon: &Codon) -> Option<u8> {
        let [a, b, c] = codon.0;
        match (base_to_index(a), base_to_index(b), base_to_index(c)) {
            (Some(a), Some(b), Some(c)) => Some(self.table[a * 16 + b * 4 + c]),
            _ => None,
        }
    }

    /// Codons encoding `amino_acid` in enumeration order. Empty for unknown symbols.
    #[must_use]
    pub fn codons_encoding(&self, amino_acid: u8) -> &[Codon] {
        self.reverse
            .get(&amino_acid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for GeneticCode {
    fn default() -> Self {
        Self::standard()
    }
}
