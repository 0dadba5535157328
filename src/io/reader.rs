//! Streaming CSV record reader
//!
//! `RecordReader<T>` yields one deserialized row at a time from a CSV file,
//! annotating errors with the line they came from. It backs every input file
//! of the batch driver; the row type decides the format.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `open()`
//! - Individual row errors are yielded as `Err` items
//! - Line numbers count the header as line 1

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;

#[derive(Debug)]
pub struct RecordReader<T> {
    reader: csv::Reader<File>,
    line_num: usize,
    _row: PhantomData<T>,
}

impl<T: DeserializeOwned> RecordReader<T> {
    /// Open a CSV file with a header row
    ///
    /// Fields are trimmed and rows may omit trailing optional columns.
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
            _row: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> Iterator for RecordReader<T> {
    type Item = Result<T, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<T>();
        let row = deserializer.next()?;
        self.line_num += 1;
        Some(row.map_err(|e| format!("Line {}: CSV parse error: {}", self.line_num, e)))
    }
}

/// Read and convert every row of a seed file, failing on the first bad row
pub fn load_records<T, U, F>(path: &Path, mut convert: F) -> Result<Vec<U>, String>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<U, String>,
{
    let mut reader = RecordReader::<T>::open(path)?;
    let mut converted = Vec::new();
    while let Some(row) = reader.next() {
        let line = reader.line_num;
        let value = row
            .and_then(&mut convert)
            .map_err(|e| format!("{}: {}", path.display(), prefix_line(line, e)))?;
        converted.push(value);
    }
    Ok(converted)
}

fn prefix_line(line: usize, message: String) -> String {
    if message.starts_with("Line ") {
        message
    } else {
        format!("Line {}: {}", line, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::{convert_request_record, EventRecord, RequestRecord};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_open_fails_on_missing_file() {
        let result = RecordReader::<EventRecord>::open(Path::new("nonexistent.csv"));
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_reads_rows_with_whitespace() {
        let file = create_temp_csv(
            "event_id, client_id\n\
             00000000-0000-0000-0000-000000000001, 00000000-0000-0000-0000-000000000002\n",
        );

        let rows: Vec<_> = RecordReader::<EventRecord>::open(file.path())
            .unwrap()
            .collect();

        assert_eq!(rows.len(), 1);
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.client_id, uuid::Uuid::from_u128(2));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let file = create_temp_csv(
            "event_id,client_id\n\
             00000000-0000-0000-0000-000000000001,00000000-0000-0000-0000-000000000002\n\
             not-a-uuid,00000000-0000-0000-0000-000000000002\n",
        );

        let rows: Vec<_> = RecordReader::<EventRecord>::open(file.path())
            .unwrap()
            .collect();

        assert!(rows[0].is_ok());
        assert!(rows[1].as_ref().unwrap_err().starts_with("Line 3:"));
    }

    #[test]
    fn test_load_records_stops_on_first_bad_row() {
        let file = create_temp_csv(
            "request_id,event_id,event_name,amount,tickets\n\
             00000000-0000-0000-0000-000000000001,00000000-0000-0000-0000-000000000009,Expo,10.00,5\n\
             00000000-0000-0000-0000-000000000002,00000000-0000-0000-0000-000000000009,Expo,-1,5\n",
        );

        let result = load_records::<RequestRecord, _, _>(file.path(), convert_request_record);

        let err = result.unwrap_err();
        assert!(err.contains("Line 3:"), "unexpected error: {}", err);
    }

    #[test]
    fn test_load_records_converts_every_row() {
        let file = create_temp_csv(
            "request_id,event_id,event_name,amount,tickets,status\n\
             00000000-0000-0000-0000-000000000001,00000000-0000-0000-0000-000000000009,Expo,10.00,5,\n\
             00000000-0000-0000-0000-000000000002,00000000-0000-0000-0000-000000000009,Expo,2.50,1,rejected\n",
        );

        let requests =
            load_records::<RequestRecord, _, _>(file.path(), convert_request_record).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].status, crate::types::RequestStatus::Rejected);
    }
}
