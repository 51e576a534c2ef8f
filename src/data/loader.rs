use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::data::record::{expected_header, Dataset, Outcome, Record, NUM_FEATURES};
use crate::error::{PipelineError, Result};

/// Loads the diabetes table from a comma-delimited file with a header row.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let source = path.display().to_string();
    info!("Loading data from {:?}", path);

    let file = std::fs::File::open(path)
        .map_err(|e| PipelineError::data_load(&source, e.to_string()))?;
    let dataset = parse_dataset(file, &source)?;

    info!("Loaded {} records", dataset.len());
    Ok(dataset)
}

/// Parses CSV text from any reader. `source` names the input in errors.
pub fn parse_dataset<R: Read>(reader: R, source: &str) -> Result<Dataset> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()
        .map_err(|e| PipelineError::data_load(source, e.to_string()))?
        .clone();
    check_header(&headers, source)?;
    debug!("Headers: {:?}", headers);

    let mut records = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let line = row + 2;
        let record = result
            .map_err(|e| PipelineError::data_load(source, format!("line {}: {}", line, e)))?;
        records.push(parse_record(&record, row, line, source)?);
    }

    if records.is_empty() {
        return Err(PipelineError::data_load(source, "file contains no data rows"));
    }

    Ok(Dataset::new(records))
}

fn check_header(headers: &StringRecord, source: &str) -> Result<()> {
    let expected = expected_header();
    let actual: Vec<&str> = headers.iter().collect();
    if actual != expected {
        return Err(PipelineError::data_load(
            source,
            format!("unexpected header {:?}, expected {:?}", actual, expected),
        ));
    }
    Ok(())
}

fn parse_record(record: &StringRecord, id: usize, line: usize, source: &str) -> Result<Record> {
    let parse_cell = |idx: usize| -> Result<f64> {
        let cell = record.get(idx).unwrap_or("");
        cell.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PipelineError::data_load(
                source,
                format!("line {}: '{}' is not a valid number", line, cell),
            ))
    };

    let mut features = [0.0; NUM_FEATURES];
    for (idx, value) in features.iter_mut().enumerate() {
        *value = parse_cell(idx)?;
    }

    let outcome_value = parse_cell(NUM_FEATURES)?;
    let outcome = Outcome::from_value(outcome_value).ok_or_else(|| PipelineError::data_load(
        source,
        format!("line {}: outcome must be 0 or 1, got {}", line, outcome_value),
    ))?;

    Ok(Record { id, features, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome";

    #[test]
    fn test_parse_simple_csv() {
        let csv_data = format!("{HEADER}\n6,148,72,35,0,33.6,0.627,50,1\n1,85,66,29,0,26.6,0.351,31,0\n");
        let dataset = parse_dataset(Cursor::new(csv_data), "inline").unwrap();

        assert_eq!(dataset.len(), 2);
        let first = &dataset.records()[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.features[1], 148.0);
        assert_eq!(first.outcome, Outcome::Positive);
        assert_eq!(dataset.records()[1].outcome, Outcome::Negative);
    }

    #[test]
    fn test_reordered_header_rejected() {
        let csv_data = "Glucose,Pregnancies,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n148,6,72,35,0,33.6,0.627,50,1\n";
        let err = parse_dataset(Cursor::new(csv_data), "inline").unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn test_malformed_rows_rejected() {
        for row in ["6,148,72,35,0,33.6,0.627,50", "6,abc,72,35,0,33.6,0.627,50,1", "6,148,72,35,0,33.6,0.627,50,2"] {
            let csv_data = format!("{HEADER}\n{row}\n");
            let err = parse_dataset(Cursor::new(csv_data), "inline").unwrap_err();
            assert!(matches!(err, PipelineError::DataLoad { .. }), "row {row} accepted");
        }
    }

    #[test]
    fn test_header_only_rejected() {
        let err = parse_dataset(Cursor::new(format!("{HEADER}\n")), "inline").unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_dataset("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }
}
