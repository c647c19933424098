use super::EdgeRow;
use crate::error::Result;
use crate::properties::{Attributes, Value};

const SOURCE: &str = "source";
const TARGET: &str = "target";
const SOURCE_LEVEL: &str = "source_level";
const TARGET_LEVEL: &str = "target_level";
const SOURCE_ROLE: &str = "source_role";
const TARGET_ROLE: &str = "target_role";

/// Turns raw tabular content into edge rows.
pub trait Extractor {
    fn extract(&self, content: &[u8]) -> Result<Vec<EdgeRow>>;
}

pub struct CsvExtractor {
    pub delimiter: u8,
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExtractor {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

/// Column positions resolved from the header row.
#[derive(Default)]
struct Columns {
    source: Option<usize>,
    target: Option<usize>,
    source_level: Option<usize>,
    target_level: Option<usize>,
    source_role: Option<usize>,
    target_role: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Self {
        let mut columns = Columns::default();
        for (i, header) in headers.iter().enumerate() {
            let name = header.trim();
            // First occurrence wins for a repeated known column.
            let slot = match name.to_ascii_lowercase().as_str() {
                SOURCE => &mut columns.source,
                TARGET => &mut columns.target,
                SOURCE_LEVEL => &mut columns.source_level,
                TARGET_LEVEL => &mut columns.target_level,
                SOURCE_ROLE => &mut columns.source_role,
                TARGET_ROLE => &mut columns.target_role,
                _ => {
                    if !name.is_empty() {
                        columns.extra.push((i, name.to_string()));
                    }
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(i);
            }
        }
        columns
    }
}

fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    let value = record.get(index?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl Extractor for CsvExtractor {
    fn extract(&self, content: &[u8]) -> Result<Vec<EdgeRow>> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(content);

        let headers = rdr.headers()?.clone();
        let columns = Columns::resolve(&headers);
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let mut extra = Attributes::new();
            for (i, name) in &columns.extra {
                if let Some(value) = cell(&record, Some(*i)) {
                    extra.insert(name.clone(), Value::parse_cell(&value));
                }
            }

            rows.push(EdgeRow {
                line,
                source: cell(&record, columns.source),
                target: cell(&record, columns.target),
                source_level: cell(&record, columns.source_level),
                target_level: cell(&record, columns.target_level),
                source_role: cell(&record, columns.source_role),
                target_role: cell(&record, columns.target_role),
                extra,
            });
        }

        Ok(rows)
    }
}
