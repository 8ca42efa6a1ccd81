use anyhow::Result;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::models::{MessageDate, MessageHit};
use crate::selection::Selection;

pub const CSV_HEADER: [&str; 6] = ["ID", "Subject", "From", "To", "Date", "Size"];

/// Hits to export: the selected ones when anything is selected, otherwise everything shown
pub fn rows_to_export<'a>(hits: &'a [MessageHit], selection: &Selection<String>) -> Vec<&'a MessageHit> {
    if selection.is_empty() {
        hits.iter().collect()
    } else {
        hits.iter().filter(|h| selection.contains(&h.id)).collect()
    }
}

/// `archive_export_2024-05-01.csv`
pub fn default_file_name(day: NaiveDate) -> String {
    format!("archive_export_{}.csv", day.format("%Y-%m-%d"))
}

fn raw_date(date: &Option<MessageDate>) -> String {
    match date {
        Some(MessageDate::Epoch(secs)) => secs.to_string(),
        Some(MessageDate::Text(text)) => text.clone(),
        None => String::new(),
    }
}

/// Write the CSV and return the number of data rows
pub fn write_csv<W: Write>(writer: W, rows: &[&MessageHit]) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for hit in rows {
        csv.write_record([
            hit.id.as_str(),
            hit.subject.as_str(),
            hit.from.as_str(),
            hit.to.as_str(),
            raw_date(&hit.date).as_str(),
            hit.size.map(|s| s.to_string()).unwrap_or_default().as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(rows.len())
}

pub fn export_to_file(path: impl AsRef<Path>, rows: &[&MessageHit]) -> Result<usize> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let count = write_csv(file, rows)?;
    info!("Exported {} messages to {}", count, path.display());
    Ok(count)
}

/// Audit payload for `EXPORT_CSV`
pub fn export_details(count: usize, selected: bool) -> Value {
    json!({ "count": count, "selected": selected })
}
