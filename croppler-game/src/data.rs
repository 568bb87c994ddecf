//! Trade records as supplied by the external export feed.
use log::{debug, warn};
use num_traits::cast::cast;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// One (State, Year, Commodity, Value) data point from the raw dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradeRecord {
    pub state: String,
    pub year: i32,
    pub commodity: String,
    #[serde(default, deserialize_with = "lenient_value")]
    pub value: Option<f64>,
}

impl TradeRecord {
    #[must_use]
    pub fn new(
        state: impl Into<String>,
        year: i32,
        commodity: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self {
            state: state.into(),
            year,
            commodity: commodity.into(),
            value,
        }
    }
}

/// Errors raised while parsing a dataset into a [`TradeTable`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("dataset JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// Ordered, read-only table of trade records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeTable {
    records: Vec<TradeRecord>,
}

impl TradeTable {
    /// Create an empty table (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_records(records: Vec<TradeRecord>) -> Self {
        Self { records }
    }

    /// Load records from a JSON array of `{State, Year, Commodity, Value}` objects.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON array.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Self::from_json_counted(json).map(|(table, _)| table)
    }

    /// Same as [`TradeTable::from_json`], also returning how many rows were skipped
    /// because they lacked a state, a commodity or an integral year.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON array.
    pub fn from_json_counted(json: &str) -> Result<(Self, usize), DataError> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let total = rows.len();
        let records: Vec<TradeRecord> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<JsonRow>(row).ok())
            .filter_map(JsonRow::into_record)
            .collect();
        let skipped = total - records.len();
        if skipped > 0 {
            warn!("skipped {skipped} malformed dataset rows");
        }
        debug!("parsed {} trade records from JSON", records.len());
        Ok((Self { records }, skipped))
    }

    /// Load records from CSV text with a `State,Year,Commodity,Value` header.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing from the header.
    pub fn from_csv(text: &str) -> Result<Self, DataError> {
        Self::from_csv_counted(text).map(|(table, _)| table)
    }

    /// Same as [`TradeTable::from_csv`], also returning how many rows were skipped
    /// because their year could not be read.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing from the header.
    pub fn from_csv_counted(text: &str) -> Result<(Self, usize), DataError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = split_csv_rows(text).into_iter();
        let header = rows.next().unwrap_or_default();
        let columns = CsvColumns::locate(&header)?;

        let mut records = Vec::new();
        let mut skipped = 0;
        for row in rows {
            match columns.record(&row) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("skipped {skipped} dataset rows with an unreadable year");
        }
        debug!("parsed {} trade records from CSV", records.len());
        Ok((Self { records }, skipped))
    }

    #[must_use]
    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradeRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a TradeTable {
    type Item = &'a TradeRecord;
    type IntoIter = std::slice::Iter<'a, TradeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Read a value cell; empty, non-numeric and non-finite cells are absent.
#[must_use]
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    // Spreadsheet exports sometimes write integral years as `2022.0`.
    year_from_f64(raw.parse::<f64>().ok()?)
}

fn year_from_f64(value: f64) -> Option<i32> {
    if value.fract() != 0.0 {
        return None;
    }
    cast::<f64, i32>(value)
}

fn json_value(value: serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(text) => parse_value(&text),
        _ => None,
    }
}

fn json_year(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .and_then(|year| i32::try_from(year).ok())
            .or_else(|| number.as_f64().and_then(year_from_f64)),
        serde_json::Value::String(text) => parse_year(text),
        _ => None,
    }
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

/// A JSON dataset row before validation; any field may be missing or mistyped.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonRow {
    #[serde(default)]
    state: serde_json::Value,
    #[serde(default)]
    year: serde_json::Value,
    #[serde(default)]
    commodity: serde_json::Value,
    #[serde(default)]
    value: serde_json::Value,
}

impl JsonRow {
    fn into_record(self) -> Option<TradeRecord> {
        Some(TradeRecord {
            state: json_text(&self.state)?,
            year: json_year(&self.year)?,
            commodity: json_text(&self.commodity)?,
            value: json_value(self.value),
        })
    }
}

fn lenient_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(json_value))
}

struct CsvColumns {
    state: usize,
    year: usize,
    commodity: usize,
    value: usize,
}

impl CsvColumns {
    fn locate(header: &[String]) -> Result<Self, DataError> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|cell| cell.trim() == name)
                .ok_or(DataError::MissingColumn(name))
        };
        Ok(Self {
            state: find("State")?,
            year: find("Year")?,
            commodity: find("Commodity")?,
            value: find("Value")?,
        })
    }

    fn record(&self, row: &[String]) -> Option<TradeRecord> {
        let cell = |index: usize| row.get(index).map(String::as_str);
        let year = parse_year(cell(self.year)?)?;
        Some(TradeRecord {
            state: cell(self.state)?.trim().to_string(),
            year,
            commodity: cell(self.commodity)?.trim().to_string(),
            value: cell(self.value).and_then(parse_value),
        })
    }
}

/// Split CSV text into rows of fields, honouring double-quoted fields.
fn split_csv_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows.retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    rows
}
