//! Data loading utilities

use crate::error::{PredictorError, Result};
use super::columns::{is_missing_marker, number_label, MISSING_MARKERS};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Tabular file formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    JsonLines,
    Excel,
    Unknown,
}

impl FileFormat {
    /// Detect file format from extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => FileFormat::Csv,
            "tsv" | "tab" => FileFormat::Tsv,
            "parquet" | "pq" => FileFormat::Parquet,
            "json" => FileFormat::Json,
            "jsonl" | "ndjson" => FileFormat::JsonLines,
            "xlsx" | "xls" => FileFormat::Excel,
            _ => FileFormat::Unknown,
        }
    }
}

/// Data loader for the supported file formats
pub struct DataLoader {
    /// Rows sampled for schema inference in text formats
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Set how many rows are scanned to infer column types
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a delimited text file with a header row
    pub fn load_csv(&self, path: &Path, delimiter: u8) -> Result<DataFrame> {
        let file = File::open(path)?;

        let null_values = NullValues::AllColumns(MISSING_MARKERS.iter().map(|s| (*s).into()).collect());
        let parse_opts = CsvParseOptions::default()
            .with_separator(delimiter)
            .with_null_values(Some(null_values));

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PredictorError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| PredictorError::DataError(e.to_string()))
    }

    /// Load a JSON array or line-delimited JSON file
    pub fn load_json(&self, path: &Path, lines: bool) -> Result<DataFrame> {
        let file = File::open(path)?;
        let format = if lines { JsonFormat::JsonLines } else { JsonFormat::Json };

        JsonReader::new(file)
            .with_json_format(format)
            .finish()
            .map_err(|e| PredictorError::DataError(e.to_string()))
    }

    /// Load the first worksheet of a spreadsheet workbook.
    ///
    /// The first row names the columns. A column whose cells are all numbers
    /// (or empty) becomes `Float64`, any other column becomes `String`.
    /// Empty cells, error cells and missing markers are null.
    pub fn load_excel(&self, path: &Path) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| PredictorError::DataError(format!("{}: {}", path.display(), e)))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| PredictorError::DataError(format!("{} has no worksheets", path.display())))?
            .map_err(|e| PredictorError::DataError(e.to_string()))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
            .unwrap_or_default();
        let body: Vec<&[Data]> = rows.collect();

        let columns: Vec<Column> = header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(j, name)| {
                let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(j)).collect();
                excel_column(name, &cells)
            })
            .collect();

        if columns.is_empty() {
            return Err(PredictorError::DataError(format!(
                "{} has no header row in its first worksheet",
                path.display()
            )));
        }

        DataFrame::new(columns).map_err(|e| PredictorError::DataError(e.to_string()))
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        match FileFormat::from_path(path) {
            FileFormat::Csv | FileFormat::Unknown => self.load_csv(path, b','),
            FileFormat::Tsv => self.load_csv(path, b'\t'),
            FileFormat::Parquet => self.load_parquet(path),
            FileFormat::Json => self.load_json(path, false),
            FileFormat::JsonLines => self.load_json(path, true),
            FileFormat::Excel => self.load_excel(path),
        }
    }

    /// Get file info without loading the full data
    pub fn get_file_info(&self, path: &Path) -> Result<FileInfo> {
        let file_size = std::fs::metadata(path)?.len();
        let format = FileFormat::from_path(path);

        // Header-only peek for delimited text; other formats are read fully
        let columns = match format {
            FileFormat::Csv | FileFormat::Tsv | FileFormat::Unknown => {
                let delimiter = if format == FileFormat::Tsv { '\t' } else { ',' };
                let reader = BufReader::new(File::open(path)?);
                let header = reader.lines().next().transpose()?.unwrap_or_default();
                header
                    .split(delimiter)
                    .map(|s| s.trim().trim_matches('"').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            _ => self
                .load_auto(path)?
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(FileInfo {
            path: path.display().to_string(),
            format,
            file_size,
            columns,
        })
    }
}

fn is_missing_cell(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => true,
        Some(Data::String(s)) => is_missing_marker(s),
        Some(_) => false,
    }
}

fn excel_column(name: &str, cells: &[Option<&Data>]) -> Column {
    let numeric = cells
        .iter()
        .all(|&cell| is_missing_cell(cell) || matches!(cell, Some(Data::Int(_)) | Some(Data::Float(_))));

    if numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Some(Data::Int(v)) => Some(*v as f64),
                Some(Data::Float(v)) => Some(*v),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|&cell| match cell {
                _ if is_missing_cell(cell) => None,
                Some(Data::Float(v)) => Some(number_label(*v)),
                Some(other) => Some(other.to_string().trim().to_string()),
                None => None,
            })
            .collect();
        Column::new(name.into(), values)
    }
}

/// File information
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub format: FileFormat,
    pub file_size: u64,
    pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.CSV")), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("rows.ndjson")), FileFormat::JsonLines);
        assert_eq!(FileFormat::from_path(Path::new("Rofaydeh.xlsx")), FileFormat::Excel);
        assert_eq!(FileFormat::from_path(Path::new("noext")), FileFormat::Unknown);
    }

    #[test]
    fn test_load_excel_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Age").unwrap();
        sheet.write_string(0, 1, "Laser Type").unwrap();
        sheet.write_string(0, 2, "Relaxation Time (µs)").unwrap();
        sheet.write_number(1, 0, 60).unwrap();
        sheet.write_string(1, 1, "CW").unwrap();
        sheet.write_number(1, 2, 80.5).unwrap();
        sheet.write_string(2, 0, "NA").unwrap();
        sheet.write_string(2, 1, "PW").unwrap();
        sheet.write_number(2, 2, 290.0).unwrap();
        sheet.write_number(3, 0, 45).unwrap();
        sheet.write_number(3, 2, 300.0).unwrap();
        workbook.save(&path).unwrap();

        let loader = DataLoader::new();
        let df = loader.load_auto(&path).unwrap();
        assert_eq!(df.shape(), (3, 3));

        let age = df.column("Age").unwrap();
        assert_eq!(age.dtype(), &DataType::Float64);
        assert_eq!(age.f64().unwrap().get(0), Some(60.0));
        assert_eq!(age.null_count(), 1);

        let laser = df.column("Laser Type").unwrap();
        assert_eq!(laser.dtype(), &DataType::String);
        assert_eq!(laser.str().unwrap().get(1), Some("PW"));
        assert_eq!(laser.str().unwrap().get(2), None);

        let info = loader.get_file_info(&path).unwrap();
        assert_eq!(info.format, FileFormat::Excel);
        assert_eq!(info.columns, vec!["Age", "Laser Type", "Relaxation Time (µs)"]);
    }

    #[test]
    fn test_unreadable_workbook_is_data_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(file, "not a workbook").unwrap();
        let err = DataLoader::new().load_auto(file.path()).unwrap_err();
        assert!(matches!(err, PredictorError::DataError(_)));
    }

    #[test]
    fn test_csv_missing_markers_are_null() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Age,Laser Type").unwrap();
        for (age, laser) in [("60", "CW"), ("NaN", "PW"), ("NA", "CW"), ("N/A", "null"), ("#N/A", "PW"), ("null", "#N/A")] {
            writeln!(file, "{},{}", age, laser).unwrap();
        }

        let df = DataLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(df.height(), 6);
        assert_eq!(df.column("Age").unwrap().null_count(), 5);
        assert_eq!(df.column("Laser Type").unwrap().null_count(), 2);
    }

    #[test]
    fn test_load_csv_and_info() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Age,Relaxation Time (µs)").unwrap();
        writeln!(file, "60,120.5").unwrap();
        writeln!(file, "45,").unwrap();

        let loader = DataLoader::new();
        let df = loader.load_auto(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("Relaxation Time (µs)").is_ok());

        let info = loader.get_file_info(file.path()).unwrap();
        assert_eq!(info.format, FileFormat::Csv);
        assert_eq!(info.columns, vec!["Age", "Relaxation Time (µs)"]);
    }
}
