use crate::api_client::VideoSource;
use crate::batch::BatchReport;
use crate::error::{Error, RowError};
use csv::{ReaderBuilder, StringRecord, Writer};
use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

pub const COLUMN_FILENAME: &str = "Filename";
pub const COLUMN_FILE_URL: &str = "File URL";
pub const COLUMN_CREATIVE_NAME: &str = "Creative name";
pub const COLUMN_TARGET_ZIP_CODE: &str = "ZIP";
pub const COLUMN_LANDING_URL: &str = "Landing URL";

pub const COLUMN_AD_ID: &str = "Ad ID";
pub const COLUMN_FAILURE_REASON: &str = "Failure reason";

const VIDEO_FILE_EXTENSION: &str = ".mp4";

static FORBIDDEN_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z.=\-_]+").expect("valid creative name pattern"));

/// Column name to position, built once from the header row.
#[derive(Debug)]
pub struct Columns {
    headers: StringRecord,
    index: HashMap<String, usize>,
}

impl Columns {
    /// Indexes the header by trimmed name. Returns the offending name when two
    /// columns trim to the same one.
    fn new(headers: StringRecord) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(headers.len());
        for (position, name) in headers.iter().enumerate() {
            let name = name.trim();
            if index.insert(name.to_string(), position).is_some() {
                return Err(name.to_string());
            }
        }
        Ok(Columns { headers, index })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
}

/// One data line of the creatives CSV. The raw record is kept untouched so it
/// can be written back verbatim to the success or failure file.
#[derive(Debug, Clone)]
pub struct CreativeRow {
    pub line: u64,
    pub record: StringRecord,
    columns: Arc<Columns>,
}

impl CreativeRow {
    /// Trimmed value of `column`, or `None` when the column is absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .index
            .get(column)
            .and_then(|&position| self.record.get(position))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn require(&self, column: &str) -> Result<&str, RowError> {
        self.get(column)
            .ok_or_else(|| RowError::InvalidRow(format!("missing value for '{}'", column)))
    }

    /// The local file wins over the URL when both are given.
    pub fn video_source(&self) -> Result<VideoSource, RowError> {
        if let Some(filename) = self.get(COLUMN_FILENAME) {
            return Ok(VideoSource::File(filename.into()));
        }

        match self.get(COLUMN_FILE_URL) {
            Some(url) => Url::parse(url).map(VideoSource::Url).map_err(|err| {
                RowError::InvalidRow(format!("invalid '{}' '{}': {}", COLUMN_FILE_URL, url, err))
            }),
            None => Err(RowError::InvalidRow(format!(
                "missing value for '{}' and '{}'",
                COLUMN_FILENAME, COLUMN_FILE_URL
            ))),
        }
    }

    /// The creative name as DCM will accept it: `<Creative name>.mp4`, cleaned up.
    pub fn creative_name(&self) -> Result<String, RowError> {
        let name = self.require(COLUMN_CREATIVE_NAME)?;
        Ok(clean_up_creative_name(&format!(
            "{}{}",
            name, VIDEO_FILE_EXTENSION
        )))
    }

    pub fn landing_url(&self) -> Result<&str, RowError> {
        self.require(COLUMN_LANDING_URL)
    }
}

/// A fully read and validated creatives CSV.
#[derive(Debug)]
pub struct CreativeTable {
    pub columns: Arc<Columns>,
    pub rows: Vec<CreativeRow>,
}

/// Reads the whole creatives CSV, checking its header before handing out any row.
///
/// # Arguments
/// * `path` - Location of the CSV file
/// * `required_columns` - Extra columns needed on top of the video and creative
///   columns, typically the targeting columns
///
/// # Returns
/// The rows in file order, or an [`Error::Input`] when the file cannot be used
pub fn read_creatives(path: &Path, required_columns: &[&str]) -> Result<CreativeTable, Error> {
    let input_error = |reason: String| Error::Input {
        path: path.display().to_string(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| input_error(err.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|err| input_error(err.to_string()))?
        .clone();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(input_error("missing header row".to_string()));
    }

    let columns = Columns::new(headers)
        .map_err(|name| input_error(format!("duplicate column '{}'", name)))?;
    let columns = Arc::new(columns);

    if !columns.contains(COLUMN_FILENAME) && !columns.contains(COLUMN_FILE_URL) {
        return Err(input_error(format!(
            "expected a '{}' or '{}' column",
            COLUMN_FILENAME, COLUMN_FILE_URL
        )));
    }

    let missing: Vec<&str> = [COLUMN_CREATIVE_NAME, COLUMN_LANDING_URL]
        .iter()
        .chain(required_columns)
        .copied()
        .filter(|column| !columns.contains(column))
        .collect();
    if !missing.is_empty() {
        return Err(input_error(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut rows = vec![];
    for record in reader.records() {
        let record = record.map_err(|err| input_error(err.to_string()))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        rows.push(CreativeRow {
            line,
            record,
            columns: columns.clone(),
        });
    }

    Ok(CreativeTable { columns, rows })
}

/// Writes the success and failure files. Both get the input header plus one
/// extra column, and both keep the order in which rows were processed.
pub fn write_report(
    headers: &StringRecord,
    report: &BatchReport,
    success_file: &Path,
    failure_file: &Path,
) -> Result<(), Error> {
    // Open both files before writing so a bad destination leaves no partial output.
    let mut success_writer = Writer::from_path(success_file)?;
    let mut failure_writer = Writer::from_path(failure_file)?;

    success_writer.write_record(headers.iter().chain([COLUMN_AD_ID]))?;
    for success in &report.successes {
        let ad_id = success.ad_id.to_string();
        success_writer.write_record(success.row.record.iter().chain([ad_id.as_str()]))?;
    }
    success_writer.flush()?;

    failure_writer.write_record(headers.iter().chain([COLUMN_FAILURE_REASON]))?;
    for failure in &report.failures {
        failure_writer.write_record(
            failure
                .row
                .record
                .iter()
                .chain([failure.reason.as_str()]),
        )?;
    }
    failure_writer.flush()?;

    Ok(())
}

/// Replaces every run of characters DCM rejects in creative names with `_`.
pub fn clean_up_creative_name(name: &str) -> String {
    FORBIDDEN_NAME_CHARS.replace_all(name, "_").into_owned()
}
