//! JSON export of crawl results

use crate::crawler::PageResult;
use crate::output::traits::{CrawlSummary, OutputResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level JSON document: the summary plus every result with its text
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub summary: &'a CrawlSummary,
    pub results: &'a [PageResult],
}

/// Serializes the report as pretty-printed JSON
pub fn format_json_report(summary: &CrawlSummary, results: &[PageResult]) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(&JsonReport { summary, results })?)
}

/// Writes the JSON report to `output_path`
pub fn write_json_report(
    summary: &CrawlSummary,
    results: &[PageResult],
    output_path: &Path,
) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, &JsonReport { summary, results })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
