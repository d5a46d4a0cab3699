use crate::error::CsvError;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

// =============================================================================
// Two-field record
// =============================================================================

/// A validated `first,last` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    fields: [String; 2],
}

impl CsvRecord {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            fields: [first.into(), last.into()],
        }
    }

    /// Role: enforce the exactly-two-fields rule
    pub fn from_fields<I, S>(fields: I, line: usize) -> Result<Self, CsvError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.len() != 2 {
            return Err(CsvError::InvalidRecord {
                line,
                fields: fields.len(),
            });
        }
        let last = fields.pop().unwrap_or_default();
        let first = fields.pop().unwrap_or_default();
        Ok(Self::new(first, last))
    }

    pub fn first(&self) -> &str {
        &self.fields[0]
    }

    pub fn last(&self) -> &str {
        &self.fields[1]
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// `first,last\n`
    pub fn to_line(&self) -> String {
        format!("{},{}\n", self.first(), self.last())
    }
}

/// Stable sort by the second field, ascending.
pub fn sort_by_last(records: &mut [CsvRecord]) {
    records.sort_by(|a, b| a.last().cmp(b.last()));
}

// =============================================================================
// Line-splitting pipeline
// =============================================================================

/// Read every record, stopping at the first invalid line.
///
/// Line numbers in errors are 1-based and count the header and blank lines.
pub fn read_records<R: BufRead>(reader: R, has_header: bool) -> Result<Vec<CsvRecord>, CsvError> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;

        if has_header && index == 0 {
            debug!("skipping header line");
            continue;
        }
        if line.trim().is_empty() {
            debug!(line = index + 1, "skipping empty line");
            continue;
        }

        records.push(CsvRecord::from_fields(line.split(','), index + 1)?);
    }

    Ok(records)
}

pub fn read_records_from_path(path: &Path, has_header: bool) -> Result<Vec<CsvRecord>, CsvError> {
    let file = File::open(path)?;
    read_records(BufReader::new(file), has_header)
}

/// Sort `records` by second field, then write them one per line.
pub fn write_records<W: Write>(writer: &mut W, records: &mut [CsvRecord]) -> Result<(), CsvError> {
    sort_by_last(records);
    for record in records.iter() {
        writer.write_all(record.to_line().as_bytes())?;
    }
    Ok(())
}

/// Create or truncate `path` and write the sorted records into it.
pub fn write_records_to_path(path: &Path, records: &mut [CsvRecord]) -> Result<(), CsvError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_records(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// `csv` crate pipeline
// =============================================================================

/// Read with a real CSV parser: quoted fields, trimmed whitespace, and
/// records whose first field starts with `#` or `;` skipped.
pub fn read_records_csv<R: Read>(reader: R, has_header: bool) -> Result<Vec<CsvRecord>, CsvError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(Trim::Fields)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;

        if let Some(first) = row.get(0) {
            if first.starts_with('#') || first.starts_with(';') {
                debug!(?row, "skipping comment record");
                continue;
            }
        }

        let line = row.position().map(|p| p.line() as usize).unwrap_or_default();
        records.push(CsvRecord::from_fields(row.iter(), line)?);
    }

    Ok(records)
}

/// Write in the given order through `csv::Writer`, quoting where needed.
pub fn write_records_csv<W: Write>(writer: W, records: &[CsvRecord]) -> Result<(), CsvError> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    for record in records {
        writer.write_record(record.fields())?;
    }
    writer.flush()?;
    Ok(())
}
