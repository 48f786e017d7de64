//! Excel support: calamine for reading, rust_xlsxwriter for writing.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::error::{MetaGenError, Result};

static EMPTY_CELL: Data = Data::Empty;

/// Dtype shared by every non-empty cell of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellKind {
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

fn cell_kind(cell: &Data) -> Option<CellKind> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(_) => Some(CellKind::Int),
        Data::Float(_) => Some(CellKind::Float),
        Data::Bool(_) => Some(CellKind::Bool),
        Data::DateTime(_) => Some(CellKind::DateTime),
        Data::String(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => Some(CellKind::Text),
    }
}

fn merge_kinds(a: CellKind, b: CellKind) -> CellKind {
    match (a, b) {
        (a, b) if a == b => a,
        (CellKind::Int, CellKind::Float) | (CellKind::Float, CellKind::Int) => CellKind::Float,
        _ => CellKind::Text,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn build_column(name: &str, cells: &[&Data]) -> Result<Column> {
    let kind = cells
        .iter()
        .filter_map(|cell| cell_kind(cell))
        .reduce(merge_kinds)
        .unwrap_or(CellKind::Text);

    let series = match kind {
        CellKind::Int => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        CellKind::Float => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        CellKind::Bool => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        CellKind::DateTime => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Data::DateTime(dt) => dt.as_datetime().map(|dt| dt.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        CellKind::Text => Series::new(
            name.into(),
            cells.iter().map(|cell| cell_text(cell)).collect::<Vec<_>>(),
        ),
    };
    Ok(series.into())
}

/// Read one sheet (the first when `sheet_name` is `None`). The first row
/// holds the column names.
pub fn read_excel(path: &Path, sheet_name: Option<&str>) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| MetaGenError::FileTypeUnsupported(path.display().to_string()))?,
    };
    let range = workbook.worksheet_range(&sheet)?;
    debug!(sheet = %sheet, rows = range.height(), cols = range.width(), "reading excel sheet");

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = cell_text(cell).unwrap_or_else(|| format!("column_{}", idx + 1));
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
                .collect();
            build_column(&name, &cells)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Write a frame to a single sheet, header row first.
pub fn write_excel(df: &DataFrame, path: &Path, sheet_name: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col_idx = col_idx as u16;
        worksheet.write_string(0, col_idx, column.name().as_str())?;

        let series = column.as_materialized_series();
        for (row_idx, value) in series.iter().enumerate() {
            let row = row_idx as u32 + 1;
            match value {
                AnyValue::Null => {}
                AnyValue::Boolean(v) => {
                    worksheet.write_boolean(row, col_idx, v)?;
                }
                AnyValue::String(s) => {
                    worksheet.write_string(row, col_idx, s)?;
                }
                ref v if v.dtype().is_numeric() => {
                    if let Some(number) = v.extract::<f64>() {
                        worksheet.write_number(row, col_idx, number)?;
                    }
                }
                other => {
                    worksheet.write_string(row, col_idx, other.to_string())?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
