use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::errors::LoadError;
use crate::model::{line_of, ColumnKey, DISPLAY_COLUMN, TIMESTAMP_COLUMN};

// Order matters: `%Y` accepts "90" as year 0090 and `%Y/%m/%d` accepts "01/02/03",
// so two-digit-year and month-first layouts are tried before them.
static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%y %I:%M:%S %p",
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M",
];

static DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d %Y",
    "%B %d, %Y",
];

pub(crate) fn parse_generic_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

pub(crate) fn coerce_cell(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|parsed| !parsed.is_nan())
}

pub(crate) fn cell(record: &StringRecord, column: usize) -> &str {
    record.get(column).unwrap_or("")
}

pub(crate) fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|value| value.trim().is_empty())
}

// Empty labels become `column_<position>`; repeats get `.1`, `.2`, ... in column order.
pub(crate) fn disambiguate_keys(labels: Vec<(usize, String)>) -> Vec<ColumnKey> {
    let mut taken: HashSet<String> = [TIMESTAMP_COLUMN, DISPLAY_COLUMN]
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut keys = Vec::with_capacity(labels.len());

    for (position, label) in labels {
        let base = if label.is_empty() {
            format!("column_{position}")
        } else {
            label
        };

        let key = if taken.contains(&base) {
            let counter = counters.entry(base.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{base}.{counter}");
                if !taken.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };

        taken.insert(key.clone());
        keys.push(ColumnKey::new(key));
    }

    keys
}

pub(crate) fn index_with<F>(
    path: &Path,
    rows: &[&StringRecord],
    column: usize,
    parse: F,
) -> Result<Vec<NaiveDateTime>, LoadError>
where
    F: Fn(&str) -> Option<NaiveDateTime>,
{
    rows.iter()
        .map(|record| {
            let value = cell(record, column);
            parse(value).ok_or_else(|| LoadError::InvalidTimestamp {
                path: path.to_path_buf(),
                line: line_of(record),
                value: value.to_string(),
            })
        })
        .collect()
}
