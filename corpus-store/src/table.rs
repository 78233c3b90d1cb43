use csv::{ReaderBuilder, StringRecord, Writer};
use leanscope_core::StoreError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// A CSV file held in memory as strings. Columns are addressed by header
/// name and can be replaced or appended as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            source: PathBuf::new(),
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(Self {
            source: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row<S: ToString>(&mut self, values: &[S]) {
        let mut row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, StoreError> {
        self.column_index(name).ok_or_else(|| StoreError::MissingColumn {
            column: name.to_string(),
            path: self.source.clone(),
        })
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>, StoreError> {
        let index = self.require(name)?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// The first column, whatever its name.
    pub fn first_column(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.first().map(String::as_str).unwrap_or(""))
            .collect()
    }

    /// Parses a column; blank cells become `None`.
    pub fn parse_column<T: FromStr>(&self, name: &str) -> Result<Vec<Option<T>>, StoreError> {
        self.column(name)?
            .into_iter()
            .map(|cell| {
                let trimmed = cell.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| StoreError::InvalidValue {
                        column: name.to_string(),
                        value: cell.to_string(),
                    })
            })
            .collect()
    }

    /// Replaces the column if present, otherwise appends it.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), StoreError> {
        if values.len() != self.rows.len() {
            return Err(StoreError::ColumnLength {
                path: self.source.clone(),
                rows: self.rows.len(),
                values: values.len(),
            });
        }

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }
}
