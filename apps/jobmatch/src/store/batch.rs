#![allow(dead_code)]

use std::io::Read;

use tracing::debug;

use crate::errors::PipelineError;
use crate::models::posting::RawPosting;
use crate::store::columns::{cell, ColumnMap};

/// Columns a scraped batch must carry. `Date` is optional.
pub const REQUIRED_BATCH_COLUMNS: [&str; 4] = ["Title", "Company", "Location", "Skills"];

/// Parses a scraped CSV batch with a header row.
///
/// A missing required header fails the whole batch. Missing cell values are
/// data-quality issues and are recovered per row: an empty `Date` or `Skills`
/// cell becomes `None`.
pub fn read_batch<R: Read>(reader: R) -> Result<Vec<RawPosting>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new(rdr.headers()?);

    let title = columns.require("Title")?;
    let company = columns.require("Company")?;
    let location = columns.require("Location")?;
    let skills = columns.require("Skills")?;
    let date = columns.position("Date");

    let mut postings = Vec::new();
    for record in rdr.records() {
        let record = record?;
        postings.push(RawPosting {
            title: cell(&record, Some(title)).to_string(),
            company: cell(&record, Some(company)).to_string(),
            location: cell(&record, Some(location)).to_string(),
            date: non_empty(cell(&record, date)),
            skills: non_empty(cell(&record, Some(skills))),
        });
    }

    debug!("Read batch of {} postings", postings.len());
    Ok(postings)
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
