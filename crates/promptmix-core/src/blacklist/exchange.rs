//! Blacklist exchange formats
//!
//! - text: one pattern per line, `#` prefix marks a disabled entry
//! - csv: header row `pattern,enabled[,use_regex,use_word_boundary]`
//! - json: list of bare pattern strings and/or item objects
//!
//! Text lines and bare JSON strings carry no matching flags. On import a `*`
//! in the pattern switches on glob matching and word-start anchoring is on,
//! so an item whose flags differ from that comes back changed after a text
//! round trip. CSV and JSON objects keep every flag.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PromptMixError, Result};

use super::item::{BlacklistItem, BlacklistRecord};

const CSV_HEADER: [&str; 4] = ["pattern", "enabled", "use_regex", "use_word_boundary"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistFormat {
    Text,
    Csv,
    Json,
}

impl BlacklistFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(PromptMixError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for BlacklistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for BlacklistFormat {
    type Err = PromptMixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(PromptMixError::ImportFormat {
                message: format!("unknown format '{}'", other),
            }),
        }
    }
}

/// Parse exported blacklist content.
///
/// Pattern text is kept as written. Blank content yields no items for every
/// format.
pub fn parse(content: &str, format: BlacklistFormat) -> Result<Vec<BlacklistItem>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    match format {
        BlacklistFormat::Text => Ok(parse_text(content)),
        BlacklistFormat::Csv => parse_csv(content),
        BlacklistFormat::Json => parse_json(content),
    }
}

/// Render items in the given format
pub fn render(items: &[BlacklistItem], format: BlacklistFormat) -> Result<String> {
    match format {
        BlacklistFormat::Text => Ok(render_text(items)),
        BlacklistFormat::Csv => render_csv(items),
        BlacklistFormat::Json => render_json(items),
    }
}

fn parse_text(content: &str) -> Vec<BlacklistItem> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (pattern, enabled) = match line.strip_prefix('#') {
                Some(rest) => (rest.trim(), false),
                None => (line, true),
            };
            if pattern.is_empty() {
                return None;
            }
            Some(BlacklistItem::from_bare(pattern, enabled))
        })
        .collect()
}

fn render_text(items: &[BlacklistItem]) -> String {
    let mut out = String::new();
    for item in items {
        if !item.is_enabled() {
            out.push('#');
        }
        out.push_str(item.pattern());
        out.push('\n');
    }
    out
}

fn parse_csv(content: &str) -> Result<Vec<BlacklistItem>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let pattern_col = column("pattern").ok_or_else(|| PromptMixError::ImportFormat {
        message: "CSV header has no 'pattern' column".to_string(),
    })?;
    let enabled_col = column("enabled");
    let regex_col = column("use_regex");
    let boundary_col = column("use_word_boundary");

    let mut items = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(row = row + 1, error = %e, "skipping unreadable CSV row");
                continue;
            }
        };

        let Some(pattern) = record.get(pattern_col) else {
            warn!(row = row + 1, "skipping CSV row without a pattern field");
            continue;
        };

        let flags = (
            csv_flag(&record, enabled_col, true),
            csv_flag(&record, regex_col, false),
            csv_flag(&record, boundary_col, true),
        );
        match flags {
            (Some(enabled), Some(use_regex), Some(use_word_boundary)) => {
                items.push(BlacklistItem::with_flags(
                    pattern,
                    enabled,
                    use_regex,
                    use_word_boundary,
                ));
            }
            _ => warn!(row = row + 1, pattern, "skipping CSV row with invalid flag"),
        }
    }

    debug!(count = items.len(), "parsed CSV blacklist");
    Ok(items)
}

/// Read a boolean column; an absent column or empty cell yields `default`.
fn csv_flag(record: &StringRecord, col: Option<usize>, default: bool) -> Option<bool> {
    let Some(value) = col.and_then(|c| record.get(c)) else {
        return Some(default);
    };

    match value.to_lowercase().as_str() {
        "" => Some(default),
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn render_csv(items: &[BlacklistItem]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for item in items {
        writer.write_record([
            item.pattern(),
            bool_str(item.is_enabled()),
            bool_str(item.use_regex()),
            bool_str(item.use_word_boundary()),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PromptMixError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn parse_json(content: &str) -> Result<Vec<BlacklistItem>> {
    let value: Value = serde_json::from_str(content).map_err(|e| PromptMixError::ImportFormat {
        message: format!("invalid JSON: {}", e),
    })?;

    let Value::Array(elements) = value else {
        return Err(PromptMixError::ImportFormat {
            message: "expected a JSON list of patterns or items".to_string(),
        });
    };

    let mut items = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        match element {
            Value::String(pattern) => items.push(BlacklistItem::from_bare(pattern, true)),
            Value::Object(_) => match serde_json::from_value::<BlacklistRecord>(element) {
                Ok(record) => items.push(BlacklistItem::from(record)),
                Err(e) => warn!(index, error = %e, "skipping malformed blacklist item"),
            },
            other => warn!(index, value = %other, "skipping unsupported blacklist element"),
        }
    }

    debug!(count = items.len(), "parsed JSON blacklist");
    Ok(items)
}

fn render_json(items: &[BlacklistItem]) -> Result<String> {
    let records: Vec<BlacklistRecord> = items.iter().map(BlacklistItem::to_record).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
