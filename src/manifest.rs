//! CSV listing of every generated label and where it was printed.

use crate::layout::Sheet;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ManifestRecord<'a> {
    identifier: &'a str,
    url: &'a str,
    number: u64,
    /// 1-based page number
    sheet: usize,
    /// 1-based, top to bottom
    row: u32,
    /// 1-based, left to right
    column: u32,
}

pub fn manifest_bytes(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for label in sheets.iter().flat_map(|sheet| sheet.labels.iter()) {
        writer.serialize(ManifestRecord {
            identifier: &label.identifier,
            url: &label.url,
            number: label.number,
            sheet: label.sheet_index + 1,
            row: label.cell.row + 1,
            column: label.cell.column + 1,
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish manifest: {}", e.error()))
}
