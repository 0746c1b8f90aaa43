// Batch generation from CSV rows of `url[,name]`

use crate::color::Color;
use crate::error::{Error, Result};
use crate::export::{to_png, Artifact};
use crate::render::render_symbol;
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;

/// Edge length of batch thumbnails
pub const BATCH_RENDER_SIZE: u32 = 80;
/// Characters of the url used as a name when the row has none
pub const DEFAULT_NAME_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub url: String,
    pub name: String,
}

/// Parse CSV text into batch entries.
///
/// Rows have no header. The first field is the url, the second an
/// optional display name; further fields are ignored. Blank rows are
/// skipped. Quotes are plain characters, so every line is its own row.
pub fn parse_csv(text: &str) -> Result<Vec<BatchEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| Error::Asset(format!("Failed to read CSV row {}: {}", row_idx + 1, e)))?;
        let url = record.get(0).unwrap_or("");
        if url.is_empty() {
            continue;
        }
        let name = match record.get(1) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => url.chars().take(DEFAULT_NAME_CHARS).collect(),
        };
        entries.push(BatchEntry {
            url: url.to_string(),
            name,
        });
    }
    Ok(entries)
}

/// File name for a batch item: `qr-<name>.png` with every character
/// outside `[A-Za-z0-9]` removed
pub fn file_name_for(name: &str, index: usize) -> String {
    let stem: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if stem.is_empty() {
        format!("qr-{}.png", index + 1)
    } else {
        format!("qr-{}.png", stem)
    }
}

/// One rendered batch row
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub entry: BatchEntry,
    pub artifact: Artifact,
}

/// Render every entry as an 80px PNG at level H.
///
/// Pattern and logo styling are not applied. Rows that fail to render are
/// logged and skipped. Colliding file names get a numeric suffix.
pub fn render_batch(
    entries: &[BatchEntry],
    foreground: Color,
    background: Color,
) -> Vec<BatchItem> {
    let mut items = Vec::with_capacity(entries.len());
    let mut used_names: HashMap<String, usize> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let plane = match render_symbol(&entry.url, BATCH_RENDER_SIZE, foreground, background) {
            Ok(plane) => plane,
            Err(e) => {
                log::error!("Error generating QR code for '{}': {}", entry.name, e);
                continue;
            }
        };
        let bytes = match to_png(&plane) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Error encoding QR code for '{}': {}", entry.name, e);
                continue;
            }
        };

        let file_name = unique_name(file_name_for(&entry.name, index), &mut used_names);
        items.push(BatchItem {
            entry: entry.clone(),
            artifact: Artifact { file_name, bytes },
        });
    }

    items
}

fn unique_name(file_name: String, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(file_name.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return file_name;
    }
    let stem = file_name.trim_end_matches(".png");
    format!("{}-{}.png", stem, count)
}
