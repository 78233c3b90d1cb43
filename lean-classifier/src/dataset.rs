use calamine::{open_workbook_auto, Reader};
use corpus_store::Table;
use leanscope_core::{ClassifierError, CoreError, Label, TrainingRecord};
use std::path::Path;
use tracing::{debug, info};

pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 22;

/// Reads the labeled corpus: one column per label, empty cells skipped.
/// `.xlsx`/`.xls`/`.ods` go through calamine, `.csv` through the csv reader.
pub fn load_training_data(path: &Path) -> Result<Vec<TrainingRecord>, CoreError> {
    if !path.exists() {
        return Err(ClassifierError::TrainingDataNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (headers, rows) = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => read_spreadsheet(path)?,
        "csv" => {
            let table = Table::read(path)?;
            (table.headers().to_vec(), table.rows().to_vec())
        }
        _ => return Err(ClassifierError::UnsupportedFormat { extension }.into()),
    };

    let records = records_from_columns(&headers, &rows)?;
    info!("Loaded {} training records from {}", records.len(), path.display());
    Ok(records)
}

fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), ClassifierError> {
    let spreadsheet = |reason: String| ClassifierError::Spreadsheet { reason };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| spreadsheet("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| spreadsheet(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = rows.collect();

    debug!("Read {} rows from sheet {}", rows.len(), sheet);
    Ok((headers, rows))
}

/// All non-empty Conservative cells, then all non-empty Liberal cells.
pub fn records_from_columns(
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<TrainingRecord>, ClassifierError> {
    let mut records = Vec::new();
    for label in Label::ALL {
        let column = headers
            .iter()
            .position(|h| h.trim() == label.as_str())
            .ok_or_else(|| ClassifierError::MissingLabelColumn {
                column: label.as_str().to_string(),
            })?;

        records.extend(
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .map(|cell| TrainingRecord::new(cell, label)),
        );
    }
    Ok(records)
}

#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train: Vec<TrainingRecord>,
    pub test: Vec<TrainingRecord>,
}

/// Holds out `test_fraction` of each label, at least one example of each
/// label on both sides. Deterministic for a given seed.
pub fn stratified_split(
    records: &[TrainingRecord],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, ClassifierError> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut split = Split::default();

    for label in Label::ALL {
        let mut members: Vec<&TrainingRecord> =
            records.iter().filter(|r| r.label == label).collect();
        let count = members.len();
        if count < 2 {
            return Err(ClassifierError::NotEnoughExamples {
                label: label.to_string(),
                count,
            });
        }

        let n_test = ((count as f64 * test_fraction).round() as usize).clamp(1, count - 1);
        rng.shuffle(&mut members);
        split.test.extend(members[..n_test].iter().map(|r| (*r).clone()));
        split.train.extend(members[n_test..].iter().map(|r| (*r).clone()));
    }

    rng.shuffle(&mut split.train);
    rng.shuffle(&mut split.test);
    Ok(split)
}
