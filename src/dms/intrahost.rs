//! DMS annotation of intrahost variant tables.
//!
//! Variant tables are tab-separated files with a header row. HA tables carry
//! `POS_AA` and `ALT_AA` columns and receive one extra column per DMS score.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::dms::{DmsTable, format_score};
use crate::error::Error;
use crate::input;

const SRA: &str = "sra";
const POS_AA: &str = "POS_AA";
const ALT_AA: &str = "ALT_AA";

/// Variant files of a data directory, split by segment.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VariantFiles {
    pub ha: Vec<PathBuf>,
    pub other: Vec<PathBuf>,
}

/// `.tsv` files in `dir`; names containing `HA` go to [`VariantFiles::ha`].
/// Both lists are sorted.
pub fn discover_variant_files(dir: &Path) -> Result<VariantFiles, Error> {
    let mut files = VariantFiles::default();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".tsv") {
            continue;
        }
        if name.contains("HA") {
            files.ha.push(path);
        } else {
            files.other.push(path);
        }
    }
    files.ha.sort();
    files.other.sort();
    Ok(files)
}

/// Sample accession of a variant file: its name up to the first `_`.
#[must_use]
pub fn sample_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('_').next())
        .unwrap_or("")
        .to_string()
}

/// An in-memory tab-separated table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl VariantTable {
    /// Read a variant TSV and set its `sra` column from the file name.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(input::open(path)?);
        let headers: Vec<String> = tsv.headers()?.iter().map(str::to_string).collect();
        let rows = tsv
            .records()
            .map(|r| r.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;

        let mut table = Self { headers, rows };
        table.pad_rows();
        table.set_column(SRA, &sample_from_path(path));
        Ok(table)
    }

    fn pad_rows(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Set every cell of `name` to `value`, appending the column if absent.
    pub fn set_column(&mut self, name: &str, value: &str) {
        match self.column(name) {
            Some(i) => self.rows.iter_mut().for_each(|r| r[i] = value.to_string()),
            None => {
                self.headers.push(name.to_string());
                self.rows.iter_mut().for_each(|r| r.push(value.to_string()));
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create {}: {e}", path.display()),
            ))
        })?;
        self.write_to(BufWriter::new(file))
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_writer(writer);
        tsv.write_record(&self.headers)?;
        for row in &self.rows {
            tsv.write_record(row)?;
        }
        tsv.flush()?;
        Ok(())
    }
}

/// Read tables in parallel, keeping the order of `paths`.
pub fn read_tables(paths: &[PathBuf]) -> Result<Vec<VariantTable>, Error> {
    paths.par_iter().map(|p| VariantTable::read(p)).collect()
}

/// Append one column per DMS score, looked up by (`POS_AA`, `ALT_AA`).
/// Rows that cannot be looked up get empty cells. Rows are scored in parallel
/// chunks of `chunk_size`.
pub fn annotate(table: &mut VariantTable, dms: &DmsTable, chunk_size: usize) {
    let position_column = table.column(POS_AA);
    let alternate_column = table.column(ALT_AA);
    let width = dms.score_columns().len();

    table
        .rows
        .par_chunks_mut(chunk_size.max(1))
        .for_each(|chunk| {
            for row in chunk {
                let entry = position_column
                    .zip(alternate_column)
                    .and_then(|(p, a)| lookup_key(&row[p], &row[a]))
                    .and_then(|(site, mutant)| dms.lookup(site, mutant));
                match entry {
                    Some(e) => row.extend(e.scores.iter().map(|&s| format_score(s))),
                    None => row.extend(std::iter::repeat_n(String::new(), width)),
                }
            }
        });
    table.headers.extend(dms.score_columns().iter().cloned());
}

fn lookup_key(position: &str, alternate: &str) -> Option<(u32, u8)> {
    let site = position.trim().parse::<u32>().ok()?;
    match alternate.trim().as_bytes() {
        [aa] => Some((site, *aa)),
        _ => None,
    }
}

/// Concatenate tables; headers are the union in order of first appearance and
/// cells missing from a table are empty.
#[must_use]
pub fn concat(tables: &[VariantTable]) -> VariantTable {
    let mut headers: Vec<String> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for header in tables.iter().flat_map(|t| &t.headers) {
        if !index.contains_key(header.as_str()) {
            index.insert(header.as_str(), headers.len());
            headers.push(header.clone());
        }
    }

    let rows = tables
        .iter()
        .flat_map(|t| {
            let slots: Vec<usize> = t.headers.iter().map(|h| index[h.as_str()]).collect();
            let width = headers.len();
            t.rows.iter().map(move |row| {
                let mut out = vec![String::new(); width];
                for (cell, &slot) in row.iter().zip(&slots) {
                    out[slot] = cell.clone();
                }
                out
            })
        })
        .collect();

    VariantTable { headers, rows }
}

/// Output files written by [`write_outputs`].
#[derive(Debug, Default)]
pub struct WrittenOutputs {
    pub files: Vec<PathBuf>,
    pub combined_rows: usize,
}

/// Write each table and their concatenation (HA tables first) into `out_dir`.
pub fn write_outputs(
    out_dir: &Path,
    ha: &[VariantTable],
    other: &[VariantTable],
) -> Result<WrittenOutputs, Error> {
    fs::create_dir_all(out_dir)?;

    let jobs: Vec<(PathBuf, &VariantTable)> = ha
        .iter()
        .enumerate()
        .map(|(i, t)| (out_dir.join(format!("ha_variant_{i}.tsv")), t))
        .chain(
            other
                .iter()
                .enumerate()
                .map(|(i, t)| (out_dir.join(format!("non_ha_variant_{i}.tsv")), t)),
        )
        .collect();
    jobs.par_iter().try_for_each(|(path, t)| t.write(path))?;

    let all: Vec<VariantTable> = ha.iter().chain(other).cloned().collect();
    let combined = concat(&all);
    let combined_path = out_dir.join("combined_variants.tsv");
    combined.write(&combined_path)?;

    let mut files: Vec<PathBuf> = jobs.into_iter().map(|(p, _)| p).collect();
    files.push(combined_path);
    Ok(WrittenOutputs {
        files,
        combined_rows: combined.rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DMS: &str = "\
site,wildtype,mutant,entry,stability
10,K,R,0.5,-1
11,D,N,,2.5
";

    fn dms() -> DmsTable {
        DmsTable::from_reader(DMS.as_bytes(), "site").unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn discovery_splits_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "SRR2_HA.tsv", "");
        write(dir.path(), "SRR1_HA.tsv", "");
        write(dir.path(), "SRR1_NA.tsv", "");
        write(dir.path(), "SRR1_HA.csv", "");
        fs::create_dir(dir.path().join("nested_HA.tsv")).unwrap();

        let files = discover_variant_files(dir.path()).unwrap();
        let names = |v: &[PathBuf]| -> Vec<String> {
            v.iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };
        assert_eq!(names(&files.ha), ["SRR1_HA.tsv", "SRR2_HA.tsv"]);
        assert_eq!(names(&files.other), ["SRR1_NA.tsv"]);
    }

    #[test]
    fn read_adds_sample_column() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "SRR9_HA_variants.tsv", "POS\tPOS_AA\tALT_AA\n30\t10\tR\n31\n");
        let table = VariantTable::read(&path).unwrap();
        assert_eq!(table.headers, ["POS", "POS_AA", "ALT_AA", "sra"]);
        assert_eq!(table.rows[0], ["30", "10", "R", "SRR9"]);
        assert_eq!(table.rows[1], ["31", "", "", "SRR9"]);
    }

    #[test]
    fn read_overwrites_existing_sample_column() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "SRR9_HA.tsv", "sra\tPOS\nold\t1\n");
        let table = VariantTable::read(&path).unwrap();
        assert_eq!(table.headers, ["sra", "POS"]);
        assert_eq!(table.rows[0], ["SRR9", "1"]);
    }

    #[test]
    fn annotation_appends_scores() {
        let mut table = VariantTable {
            headers: vec!["POS_AA".into(), "ALT_AA".into()],
            rows: vec![
                vec!["10".into(), "R".into()],
                vec!["11".into(), "N".into()],
                vec!["12".into(), "A".into()],
                vec!["NA".into(), "R".into()],
            ],
        };
        annotate(&mut table, &dms(), 1);
        assert_eq!(table.headers, ["POS_AA", "ALT_AA", "entry", "stability"]);
        assert_eq!(table.rows[0], ["10", "R", "0.5", "-1"]);
        assert_eq!(table.rows[1], ["11", "N", "", "2.5"]);
        assert_eq!(table.rows[2], ["12", "A", "", ""]);
        assert_eq!(table.rows[3], ["NA", "R", "", ""]);
    }

    #[test]
    fn annotation_without_lookup_columns() {
        let mut table = VariantTable {
            headers: vec!["POS".into()],
            rows: vec![vec!["1".into()]],
        };
        annotate(&mut table, &dms(), 100);
        assert_eq!(table.rows[0], ["1", "", ""]);
    }

    #[test]
    fn concat_unions_headers() {
        let a = VariantTable {
            headers: vec!["POS".into(), "entry".into()],
            rows: vec![vec!["1".into(), "0.5".into()]],
        };
        let b = VariantTable {
            headers: vec!["REF".into(), "POS".into()],
            rows: vec![vec!["A".into(), "2".into()]],
        };
        let combined = concat(&[a, b]);
        assert_eq!(combined.headers, ["POS", "entry", "REF"]);
        assert_eq!(combined.rows[0], ["1", "0.5", ""]);
        assert_eq!(combined.rows[1], ["2", "", "A"]);
    }

    #[test]
    fn outputs_written() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        write(&data, "SRR1_HA.tsv", "POS_AA\tALT_AA\n10\tR\n");
        write(&data, "SRR1_NA.tsv", "POS\n5\n");

        let files = discover_variant_files(&data).unwrap();
        let mut ha = read_tables(&files.ha).unwrap();
        let other = read_tables(&files.other).unwrap();
        for table in &mut ha {
            annotate(table, &dms(), 10);
        }

        let out = dir.path().join("out");
        let written = write_outputs(&out, &ha, &other).unwrap();
        assert_eq!(written.files.len(), 3);
        assert_eq!(written.combined_rows, 2);

        let ha_text = fs::read_to_string(out.join("ha_variant_0.tsv")).unwrap();
        assert_eq!(ha_text, "POS_AA\tALT_AA\tsra\tentry\tstability\n10\tR\tSRR1\t0.5\t-1\n");
        let combined = fs::read_to_string(out.join("combined_variants.tsv")).unwrap();
        assert_eq!(
            combined.lines().next().unwrap(),
            "POS_AA\tALT_AA\tsra\tentry\tstability\tPOS"
        );
        assert!(out.join("non_ha_variant_0.tsv").exists());
    }
}
