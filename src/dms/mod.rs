//! Deep mutational scanning (DMS) score tables.
//!
//! A table maps (site, mutant amino acid) to one value per score column and an
//! optional antibody set label. Wide tables are read directly; long-format sera
//! escape tables are pivoted to one column per antibody.

pub mod intrahost;
pub mod score;

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use csv::StringRecord;

use crate::config::DmsConfig;
use crate::error::Error;
use crate::input::{self, column_index};

const MUTANT: &str = "mutant";
const WILDTYPE: &str = "wildtype";
const ANTIBODY_SET: &str = "antibody_set";
const ANTIBODY: &str = "antibody";
const ESCAPE: &str = "escape";

/// Suffix appended to antibody names when pivoting an escape table.
pub const ESCAPE_SUFFIX: &str = " sera escape";

/// Scores for one (site, mutant).
#[derive(Debug, Clone, PartialEq)]
pub struct DmsEntry {
    /// One slot per score column; `None` where the table has no value.
    pub scores: Vec<Option<f64>>,
    pub antibody_set: Option<String>,
}

#[derive(Debug, Default)]
pub struct DmsTable {
    score_columns: Vec<String>,
    entries: HashMap<(u32, u8), DmsEntry>,
    has_antibody_set: bool,
    skipped_rows: usize,
}

/// Site number, or `None` when the cell is not a positive integer.
fn parse_site(cell: &str) -> Option<u32> {
    cell.trim().parse::<u32>().ok().filter(|&s| s > 0)
}

fn parse_mutant(cell: &str, site: u32) -> Result<u8, Error> {
    match cell.trim().as_bytes() {
        [aa] => Ok(*aa),
        _ => Err(Error::Validation(format!(
            "mutant at site {site} must be a single amino acid, got '{cell}'"
        ))),
    }
}

fn parse_score(cell: &str, column: &str, site: u32) -> Result<Option<f64>, Error> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|e| {
        Error::Parse(format!(
            "invalid score '{cell}' in column '{column}' at site {site}: {e}"
        ))
    })
}

fn optional_text(row: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl DmsTable {
    /// Read a wide DMS table. Every column other than the site column,
    /// `wildtype`, `mutant` and `antibody_set` is a score column.
    pub fn from_reader<R: Read>(reader: R, site_header: &str) -> Result<Self, Error> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let site_column = column_index(&headers, site_header)?;
        let mutant_column = column_index(&headers, MUTANT)?;
        let antibody_column = column_index(&headers, ANTIBODY_SET).ok();

        let metadata = ["site", WILDTYPE, MUTANT, ANTIBODY_SET, site_header];
        let score_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (i, h.trim().to_string()))
            .filter(|(_, h)| !metadata.contains(&h.as_str()))
            .collect();

        let mut table = Self {
            score_columns: score_columns.iter().map(|(_, h)| h.clone()).collect(),
            has_antibody_set: antibody_column.is_some(),
            ..Self::default()
        };

        for row in csv_reader.records() {
            let row = row?;
            let Some(site) = row.get(site_column).and_then(parse_site) else {
                table.skipped_rows += 1;
                continue;
            };
            let mutant = parse_mutant(row.get(mutant_column).unwrap_or(""), site)?;
            let scores = score_columns
                .iter()
                .map(|(i, name)| parse_score(row.get(*i).unwrap_or(""), name, site))
                .collect::<Result<Vec<_>, _>>()?;
            let entry = DmsEntry {
                scores,
                antibody_set: optional_text(&row, antibody_column),
            };
            table.insert(site, mutant, entry)?;
        }

        Ok(table)
    }

    /// Read a long-format escape table (`antibody`, `escape` columns) and pivot
    /// it to one `<antibody> sera escape` column per antibody, sorted by name.
    /// Repeated (site, mutant, antibody) values are averaged.
    pub fn from_escape_reader<R: Read>(reader: R, site_header: &str) -> Result<Self, Error> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let site_column = column_index(&headers, site_header)?;
        let mutant_column = column_index(&headers, MUTANT)?;
        let antibody_column = column_index(&headers, ANTIBODY)?;
        let escape_column = column_index(&headers, ESCAPE)?;
        let antibody_set_column = column_index(&headers, ANTIBODY_SET).ok();

        let mut sums: HashMap<(u32, u8), BTreeMap<String, (f64, u32)>> = HashMap::new();
        let mut antibody_sets: HashMap<(u32, u8), String> = HashMap::new();
        let mut antibodies: BTreeMap<String, usize> = BTreeMap::new();
        let mut skipped_rows = 0;

        for row in csv_reader.records() {
            let row = row?;
            let Some(site) = row.get(site_column).and_then(parse_site) else {
                skipped_rows += 1;
                continue;
            };
            let mutant = parse_mutant(row.get(mutant_column).unwrap_or(""), site)?;
            let antibody = row.get(antibody_column).unwrap_or("").trim().to_string();
            let Some(escape) = parse_score(row.get(escape_column).unwrap_or(""), ESCAPE, site)?
            else {
                continue;
            };

            if let Some(set) = optional_text(&row, antibody_set_column) {
                antibody_sets.entry((site, mutant)).or_insert(set);
            }
            antibodies.entry(antibody.clone()).or_default();
            let slot = sums
                .entry((site, mutant))
                .or_default()
                .entry(antibody)
                .or_insert((0.0, 0));
            slot.0 += escape;
            slot.1 += 1;
        }

        for (index, slot) in antibodies.values_mut().enumerate() {
            *slot = index;
        }

        let mut table = Self {
            score_columns: antibodies
                .keys()
                .map(|a| format!("{a}{ESCAPE_SUFFIX}"))
                .collect(),
            has_antibody_set: antibody_set_column.is_some(),
            skipped_rows,
            ..Self::default()
        };

        for ((site, mutant), by_antibody) in sums {
            let mut scores = vec![None; table.score_columns.len()];
            for (antibody, (sum, count)) in by_antibody {
                scores[antibodies[&antibody]] = Some(sum / f64::from(count));
            }
            let entry = DmsEntry {
                scores,
                antibody_set: antibody_sets.remove(&(site, mutant)),
            };
            table.insert(site, mutant, entry)?;
        }

        Ok(table)
    }

    /// Load the configured DMS file, combined with the escape file if present.
    pub fn load(config: &DmsConfig) -> Result<Self, Error> {
        let table = Self::from_reader(input::open(&config.dms_file)?, &config.site_header)?;
        match &config.escape_file {
            Some(path) => {
                let escape = Self::from_escape_reader(input::open(path)?, &config.site_header)?;
                Ok(table.combine(escape))
            }
            None => Ok(table),
        }
    }

    fn insert(&mut self, site: u32, mutant: u8, entry: DmsEntry) -> Result<(), Error> {
        if self.entries.insert((site, mutant), entry).is_some() {
            return Err(Error::Validation(format!(
                "each site must have a unique mutant: site {site} mutant {} appears twice",
                mutant as char
            )));
        }
        Ok(())
    }

    /// Outer join on (site, mutant). Columns of `self` come first; the antibody
    /// set is taken from `self` when both sides carry one.
    #[must_use]
    pub fn combine(self, other: DmsTable) -> DmsTable {
        let left_width = self.score_columns.len();
        let right_width = other.score_columns.len();
        let mut right_entries = other.entries;

        let mut entries = HashMap::with_capacity(self.entries.len() + right_entries.len());
        for (key, mut left) in self.entries {
            match right_entries.remove(&key) {
                Some(right) => {
                    left.scores.extend(right.scores);
                    left.antibody_set = left.antibody_set.or(right.antibody_set);
                }
                None => left.scores.resize(left_width + right_width, None),
            }
            entries.insert(key, left);
        }
        for (key, right) in right_entries {
            let mut scores = vec![None; left_width];
            scores.extend(right.scores);
            entries.insert(
                key,
                DmsEntry {
                    scores,
                    antibody_set: right.antibody_set,
                },
            );
        }

        let mut score_columns = self.score_columns;
        score_columns.extend(other.score_columns);
        DmsTable {
            score_columns,
            entries,
            has_antibody_set: self.has_antibody_set || other.has_antibody_set,
            skipped_rows: self.skipped_rows + other.skipped_rows,
        }
    }

    #[must_use]
    pub fn lookup(&self, site: u32, mutant: u8) -> Option<&DmsEntry> {
        self.entries.get(&(site, mutant))
    }

    #[must_use]
    pub fn score_columns(&self) -> &[String] {
        &self.score_columns
    }

    #[must_use]
    pub fn has_antibody_set(&self) -> bool {
        self.has_antibody_set
    }

    /// Rows ignored because their site was not a positive integer.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Format a score for tabular output; missing values are empty cells.
#[must_use]
pub fn format_score(score: Option<f64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}
