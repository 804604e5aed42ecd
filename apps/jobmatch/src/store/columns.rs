use csv::StringRecord;

use crate::errors::PipelineError;

/// Case-insensitive header lookup for a CSV file.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    headers: Vec<String>,
}

impl ColumnMap {
    pub fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        let wanted = column.to_lowercase();
        self.headers.iter().position(|h| *h == wanted)
    }

    pub fn require(&self, column: &str) -> Result<usize, PipelineError> {
        self.position(column)
            .ok_or_else(|| PipelineError::MissingInputColumn(column.to_string()))
    }
}

/// Reads a cell, treating a missing position or short row as empty.
pub fn cell(record: &StringRecord, position: Option<usize>) -> &str {
    position.and_then(|i| record.get(i)).unwrap_or("")
}
