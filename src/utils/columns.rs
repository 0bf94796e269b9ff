//! Typed column access on polars frames

use crate::error::{PredictorError, Result};
use polars::prelude::*;

/// Read a column as optional floats, parsing text and widening integers.
///
/// Values that cannot be represented as a float are a `DataError`; a
/// missing column is a `SchemaMismatch`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = as_f64_series(df, name)?;
    let ca = series
        .f64()
        .map_err(|e| PredictorError::DataError(e.to_string()))?;
    Ok(ca.into_iter().collect())
}

/// Read a column as optional strings; non-text columns are rendered
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = as_string_series(df, name)?;
    let ca = series
        .str()
        .map_err(|e| PredictorError::DataError(e.to_string()))?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Cell texts read as missing values
pub const MISSING_MARKERS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A"];

pub fn is_missing_marker(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || MISSING_MARKERS.contains(&value)
}

/// Text form of a number used as a category. Integral floats drop the
/// fraction so `2.0` and `2` name the same category.
pub fn number_label(value: f64) -> String {
    value.to_string()
}

/// Column cast to `Float64`.
///
/// Missing markers in text columns, NaN and infinities all become null.
pub fn as_f64_series(df: &DataFrame, name: &str) -> Result<Series> {
    let column = df
        .column(name)
        .map_err(|_| PredictorError::SchemaMismatch(name.to_string()))?;
    let series = column.as_materialized_series();

    let source = if series.dtype() == &DataType::String {
        without_markers(series)?
    } else {
        series.clone()
    };

    let cast = if source.dtype() == &DataType::Float64 {
        source
    } else {
        let cast = source.cast(&DataType::Float64).map_err(|e| {
            PredictorError::DataError(format!("column '{}' cannot be read as numbers: {}", name, e))
        })?;
        // Non-strict casts turn unparseable values into nulls
        if cast.null_count() > source.null_count() {
            return Err(PredictorError::DataError(format!(
                "column '{}' ({}) has values that cannot be read as numbers",
                name,
                series.dtype()
            )));
        }
        cast
    };

    finite_or_null(&cast)
}

/// Column cast to `String`; floats are rendered with [`number_label`]
pub fn as_string_series(df: &DataFrame, name: &str) -> Result<Series> {
    let column = df
        .column(name)
        .map_err(|_| PredictorError::SchemaMismatch(name.to_string()))?;
    let series = column.as_materialized_series();

    match series.dtype() {
        DataType::String => without_markers(series),
        dtype if dtype.is_float() => {
            let floats = series
                .cast(&DataType::Float64)
                .map_err(|e| PredictorError::DataError(e.to_string()))?;
            let labels: StringChunked = floats
                .f64()
                .map_err(|e| PredictorError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()).map(number_label))
                .collect();
            Ok(labels.with_name(series.name().clone()).into_series())
        }
        _ => series
            .cast(&DataType::String)
            .map_err(|e| PredictorError::DataError(e.to_string())),
    }
}

fn without_markers(series: &Series) -> Result<Series> {
    let ca = series
        .str()
        .map_err(|e| PredictorError::DataError(e.to_string()))?;
    if !ca.into_iter().flatten().any(is_missing_marker) {
        return Ok(series.clone());
    }
    let cleaned: StringChunked = ca
        .into_iter()
        .map(|v| v.filter(|s| !is_missing_marker(s)))
        .collect();
    Ok(cleaned.with_name(series.name().clone()).into_series())
}

fn finite_or_null(series: &Series) -> Result<Series> {
    let ca = series
        .f64()
        .map_err(|e| PredictorError::DataError(e.to_string()))?;
    if ca.into_iter().flatten().all(f64::is_finite) {
        return Ok(series.clone());
    }
    let cleaned: Float64Chunked = ca
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(cleaned.with_name(series.name().clone()).into_series())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_column_widens() {
        let df = df!("Age" => &[60i64, 45]).unwrap();
        assert_eq!(f64_values(&df, "Age").unwrap(), vec![Some(60.0), Some(45.0)]);
    }

    #[test]
    fn test_text_numbers_parse() {
        let df = df!("Power (mW)" => &[Some("400"), None]).unwrap();
        assert_eq!(f64_values(&df, "Power (mW)").unwrap(), vec![Some(400.0), None]);
    }

    #[test]
    fn test_non_numeric_text_is_data_error() {
        let df = df!("Age" => &["sixty"]).unwrap();
        assert!(matches!(f64_values(&df, "Age"), Err(PredictorError::DataError(_))));
    }

    #[test]
    fn test_non_finite_values_become_null() {
        let df = df!("Age" => &[Some(60.0), Some(f64::NAN), Some(f64::INFINITY), None]).unwrap();
        assert_eq!(f64_values(&df, "Age").unwrap(), vec![Some(60.0), None, None, None]);
    }

    #[test]
    fn test_text_markers_become_null() {
        let df = df!(
            "Age" => &["60", "NA", "N/A", "NaN", "null", "#N/A", " "],
            "Laser Type" => &["CW", "NA", "PW", "#N/A", "CW", "null", "PW"]
        )
        .unwrap();
        let ages = f64_values(&df, "Age").unwrap();
        assert_eq!(ages[0], Some(60.0));
        assert!(ages[1..].iter().all(Option::is_none));

        let types = string_values(&df, "Laser Type").unwrap();
        assert_eq!(types.iter().filter(|v| v.is_none()).count(), 3);
    }

    #[test]
    fn test_float_categories_match_number_labels() {
        let df = df!("Laser Type" => &[1.0, 2.0, 2.5]).unwrap();
        let labels = string_values(&df, "Laser Type").unwrap();
        assert_eq!(labels, vec![Some("1".to_string()), Some("2".to_string()), Some("2.5".to_string())]);
        assert_eq!(number_label(2.0), "2");

        let ints = df!("Laser Type" => &[2i64]).unwrap();
        assert_eq!(string_values(&ints, "Laser Type").unwrap(), vec![Some(number_label(2.0))]);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let df = df!("Age" => &[1.0]).unwrap();
        assert!(matches!(
            string_values(&df, "Laser Type"),
            Err(PredictorError::SchemaMismatch(ref c)) if c == "Laser Type"
        ));
    }
}
