//! Opening tabular inputs, gzip-compressed or plain.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use flate2::read::MultiGzDecoder;

use crate::error::Error;

/// Open `path` for reading, decompressing it when the name ends in `.gz`.
pub fn open(path: &Path) -> Result<BufReader<Box<dyn Read + Send>>, Error> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open {}: {e}", path.display()),
        ))
    })?;
    let reader: Box<dyn Read + Send> = if is_gzipped(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(BufReader::new(reader))
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Index of the header column called `name`.
pub fn column_index(headers: &StringRecord, name: &str) -> Result<usize, Error> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| Error::Format(format!("missing required column '{name}'")))
}
