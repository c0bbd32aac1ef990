//! Scoring a whole file of patients.
//!
//! Input and output are CSV or Parquet, picked by extension. The output is
//! the input frame with `prediction` and `diagnosis` columns appended.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use polars::prelude::*;
use polars_io::parquet::{ParquetReader, ParquetWriter};
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

use crate::assessor::Assessor;
use crate::error::{ChdError, Result};
use crate::form::PatientForm;
use crate::predictor::Predictor;
use crate::records::PatientRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("parquet") | Some("pq") => Ok(FileFormat::Parquet),
            _ => Err(ChdError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub positives: usize,
    pub elapsed: Duration,
    pub memory_bytes: Option<u64>,
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path)?;

    let df = CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Some(Arc::new(PatientRecord::raw_schema())))
        .finish()?;
    Ok(df)
}

pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path)?;

    Ok(ParquetReader::new(file).finish()?)
}

pub fn write_csv<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

pub fn write_parquet<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;

    ParquetWriter::new(&mut file).finish(df)?;
    Ok(())
}

pub fn read_frame(path: &Path) -> Result<DataFrame> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => read_csv(path),
        FileFormat::Parquet => read_parquet(path),
    }
}

pub fn write_frame(path: &Path, df: &mut DataFrame) -> Result<()> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => write_csv(path, df),
        FileFormat::Parquet => write_parquet(path, df),
    }
}

fn missing(row: usize, column: &'static str) -> ChdError {
    ChdError::MissingValue { row, column }
}

/// Turn each frame row into a form. Rows are numbered from 1 in errors.
pub fn frame_to_forms(df: &DataFrame) -> Result<Vec<PatientForm>> {
    let age = df.column("age")?.cast(&DataType::Int64)?;
    let sex = df.column("sex")?.cast(&DataType::Utf8)?;
    let is_smoking = df.column("is_smoking")?.cast(&DataType::Utf8)?;
    let diabetes = df.column("diabetes")?.cast(&DataType::Utf8)?;
    let tot_chol = df.column("totChol")?.cast(&DataType::Float64)?;
    let bmi = df.column("BMI")?.cast(&DataType::Float64)?;
    let heart_rate = df.column("heartRate")?.cast(&DataType::Float64)?;

    let ages: Vec<Option<i64>> = age.i64()?.into_iter().collect();
    let sexes: Vec<Option<&str>> = sex.utf8()?.into_iter().collect();
    let smoking: Vec<Option<&str>> = is_smoking.utf8()?.into_iter().collect();
    let diabetes: Vec<Option<&str>> = diabetes.utf8()?.into_iter().collect();
    let tot_chol: Vec<Option<f64>> = tot_chol.f64()?.into_iter().collect();
    let bmi: Vec<Option<f64>> = bmi.f64()?.into_iter().collect();
    let heart_rate: Vec<Option<f64>> = heart_rate.f64()?.into_iter().collect();

    let mut forms = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let row = idx + 1;
        let age = ages[idx].ok_or_else(|| missing(row, "age"))?;
        let age = u32::try_from(age).map_err(|_| ChdError::InvalidField {
            field: "age",
            reason: format!("{} in row {} is outside 1..=100", age, row),
        })?;
        forms.push(PatientForm {
            age,
            sex: sexes[idx].ok_or_else(|| missing(row, "sex"))?.to_string(),
            is_smoking: smoking[idx]
                .ok_or_else(|| missing(row, "is_smoking"))?
                .to_string(),
            diabetes: diabetes[idx]
                .ok_or_else(|| missing(row, "diabetes"))?
                .to_string(),
            tot_chol: tot_chol[idx].ok_or_else(|| missing(row, "totChol"))?,
            bmi: bmi[idx].ok_or_else(|| missing(row, "BMI"))?,
            heart_rate: heart_rate[idx].ok_or_else(|| missing(row, "heartRate"))?,
        });
    }
    Ok(forms)
}

/// Predict every row of `df` and append the result columns.
pub fn score_frame<P: Predictor>(assessor: &Assessor<P>, df: &mut DataFrame) -> Result<usize> {
    let forms = frame_to_forms(df)?;
    let assessments = assessor.assess_batch(&forms)?;

    let predictions: Vec<i32> = assessments.iter().map(|a| a.label.as_i32()).collect();
    let diagnosis: Vec<&str> = assessments
        .iter()
        .map(|a| if a.label.is_positive() { "Yes" } else { "No" })
        .collect();
    let positives = assessments.iter().filter(|a| a.label.is_positive()).count();

    df.with_column(Series::new("prediction", predictions))?;
    df.with_column(Series::new("diagnosis", diagnosis))?;
    Ok(positives)
}

pub fn score_file<P: Predictor>(
    assessor: &Assessor<P>,
    input: &Path,
    output: &Path,
) -> Result<BatchSummary> {
    let start_time = Instant::now();
    // Fail on a bad output extension before doing any work.
    FileFormat::from_path(output)?;

    let mut df = read_frame(input)?;
    debug!("Read {} rows from {}", df.height(), input.display());

    let positives = score_frame(assessor, &mut df)?;
    write_frame(output, &mut df)?;

    let summary = BatchSummary {
        rows: df.height(),
        positives,
        elapsed: start_time.elapsed(),
        memory_bytes: resident_memory(),
    };
    info!(
        "Scored {} rows ({} positive) into {} in {:?}",
        summary.rows,
        summary.positives,
        output.display(),
        summary.elapsed
    );
    match summary.memory_bytes {
        Some(bytes) => info!("Resident memory: {} KiB", bytes / 1024),
        None => warn!("Could not read process memory"),
    }
    Ok(summary)
}

fn resident_memory() -> Option<u64> {
    let pid = get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|process| process.memory())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/b.CSV")).unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            FileFormat::from_path(Path::new("out.parquet")).unwrap(),
            FileFormat::Parquet
        );
        assert!(matches!(
            FileFormat::from_path(Path::new("out.xlsx")),
            Err(ChdError::UnsupportedFormat { .. })
        ));
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_frame_to_forms() {
        let df = df!(
            "age" => &[30i64, 71],
            "sex" => &["Male", "Female"],
            "is_smoking" => &["Smoker", "Non-Smoker"],
            "diabetes" => &["Yes", "No"],
            "totChol" => &[200.0, 245.5],
            "BMI" => &[25.0, 28.1],
            "heartRate" => &[75.0, 66.0]
        )
        .unwrap();
        let forms = frame_to_forms(&df).unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0], PatientForm::default());
        assert_eq!(forms[1].age, 71);
        assert_eq!(forms[1].sex, "Female");
        assert_eq!(forms[1].tot_chol, 245.5);
    }

    #[test]
    fn test_missing_cell_reports_row_and_column() {
        let df = df!(
            "age" => &[Some(30i64), Some(45)],
            "sex" => &["Male", "Female"],
            "is_smoking" => &["Smoker", "Smoker"],
            "diabetes" => &["Yes", "No"],
            "totChol" => &[Some(200.0), None],
            "BMI" => &[25.0, 22.0],
            "heartRate" => &[75.0, 70.0]
        )
        .unwrap();
        match frame_to_forms(&df) {
            Err(ChdError::MissingValue { row, column }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "totChol");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
