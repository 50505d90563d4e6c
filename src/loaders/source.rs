use anyhow::{Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A headed CSV stream read one record at a time.
///
/// Short rows are accepted and padded with empty fields.
pub struct CsvSource {
    name: String,
    reader: Reader<Box<dyn Read + Send>>,
    headers: StringRecord,
    record: StringRecord,
}

impl CsvSource {
    /// Open a CSV file on disk
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV '{}'", path.display()))?;
        debug!("Opened {}", path.display());
        Self::from_reader(path.display().to_string(), file)
    }

    /// Wrap any reader; `name` is only used in error messages
    pub fn from_reader(name: impl Into<String>, reader: impl Read + Send + 'static) -> Result<Self> {
        let name = name.into();
        let boxed: Box<dyn Read + Send> = Box::new(reader);
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(boxed);
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header row of {}", name))?
            .clone();

        Ok(Self {
            name,
            reader,
            headers,
            record: StringRecord::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read and decode the next row, or `None` at end of input
    pub fn next_row<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .with_context(|| format!("Failed to read {}", self.name))?;
        if !more {
            return Ok(None);
        }

        while self.record.len() < self.headers.len() {
            self.record.push_field("");
        }

        let line = self.record.position().map(|p| p.line()).unwrap_or_default();
        let row = self
            .record
            .deserialize(Some(&self.headers))
            .with_context(|| format!("Malformed row in {} at line {}", self.name, line))?;
        Ok(Some(row))
    }
}
