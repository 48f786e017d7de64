//! The metadata engine: one fixed-schema row per input column.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::datatypes::{FileExtension, LoadingMode, MetaGenDataType, MetadataColumn};
use crate::describe::{ColumnStats, Describable, any_value_to_string};
use crate::descriptions::Descriptions;
use crate::error::{MetaGenError, Result};
use crate::excel;
use crate::filter;
use crate::inspect::{self, InspectionMode, SampleOptions};
use crate::loader::{DataLoader, Dataset, LoadOptions};
use crate::writer;

/// Columns with at least this many distinct values get no `Values` sample.
pub const MAX_UNIQUE_VALUES: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub name: String,
    pub long_name: String,
    pub metagen_type: MetaGenDataType,
    pub description: String,
    pub min: Option<String>,
    pub max: Option<String>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub nulls: u64,
    pub empty_or_zero: u64,
    pub positive: Option<u64>,
    pub negative: Option<u64>,
    pub unique: u64,
    pub values: Option<Vec<Value>>,
}

impl MetadataRow {
    fn field(&self, column: MetadataColumn) -> Value {
        match column {
            MetadataColumn::Name => json!(self.name),
            MetadataColumn::LongName => json!(self.long_name),
            MetadataColumn::Type => json!(self.metagen_type.as_str()),
            MetadataColumn::Description => json!(self.description),
            MetadataColumn::Min => json!(self.min),
            MetadataColumn::Max => json!(self.max),
            MetadataColumn::Mean => json!(self.mean),
            MetadataColumn::Std => json!(self.std),
            MetadataColumn::MinLength => json!(self.min_length),
            MetadataColumn::MaxLength => json!(self.max_length),
            MetadataColumn::NumberNulls => json!(self.nulls),
            MetadataColumn::NumberEmptyZero => json!(self.empty_or_zero),
            MetadataColumn::NumberPositive => json!(self.positive),
            MetadataColumn::NumberNegative => json!(self.negative),
            MetadataColumn::NumberUnique => json!(self.unique),
            MetadataColumn::Values => json!(self.values),
        }
    }
}

/// The computed metadata, in the column order of the input data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    pub rows: Vec<MetadataRow>,
}

impl MetadataTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<&MetadataRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    /// Flat frame with one column per [`MetadataColumn`]. `Values` is
    /// rendered as a JSON array string.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let strings = |f: fn(&MetadataRow) -> Option<String>| -> Vec<Option<String>> {
            self.rows.iter().map(f).collect()
        };
        let floats = |f: fn(&MetadataRow) -> Option<f64>| -> Vec<Option<f64>> {
            self.rows.iter().map(f).collect()
        };
        let counts = |f: fn(&MetadataRow) -> Option<u64>| -> Vec<Option<u64>> {
            self.rows.iter().map(f).collect()
        };

        let columns: Vec<Column> = MetadataColumn::ALL
            .into_iter()
            .map(|column| {
                let name = column.as_str().into();
                let series = match column {
                    MetadataColumn::Name => Series::new(name, strings(|r| Some(r.name.clone()))),
                    MetadataColumn::LongName => {
                        Series::new(name, strings(|r| Some(r.long_name.clone())))
                    }
                    MetadataColumn::Type => {
                        Series::new(name, strings(|r| Some(r.metagen_type.to_string())))
                    }
                    MetadataColumn::Description => {
                        Series::new(name, strings(|r| Some(r.description.clone())))
                    }
                    MetadataColumn::Min => Series::new(name, strings(|r| r.min.clone())),
                    MetadataColumn::Max => Series::new(name, strings(|r| r.max.clone())),
                    MetadataColumn::Mean => Series::new(name, floats(|r| r.mean)),
                    MetadataColumn::Std => Series::new(name, floats(|r| r.std)),
                    MetadataColumn::MinLength => Series::new(name, counts(|r| r.min_length)),
                    MetadataColumn::MaxLength => Series::new(name, counts(|r| r.max_length)),
                    MetadataColumn::NumberNulls => Series::new(name, counts(|r| Some(r.nulls))),
                    MetadataColumn::NumberEmptyZero => {
                        Series::new(name, counts(|r| Some(r.empty_or_zero)))
                    }
                    MetadataColumn::NumberPositive => Series::new(name, counts(|r| r.positive)),
                    MetadataColumn::NumberNegative => Series::new(name, counts(|r| r.negative)),
                    MetadataColumn::NumberUnique => Series::new(name, counts(|r| Some(r.unique))),
                    MetadataColumn::Values => Series::new(
                        name,
                        strings(|r| r.values.as_ref().map(|v| Value::from(v.clone()).to_string())),
                    ),
                };
                series.into()
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// `{"fields": {<name>: {<column>: <value>, ...}}}`
    pub fn to_json(&self) -> Value {
        let fields: Map<String, Value> = self
            .rows
            .iter()
            .map(|row| {
                let entry: Map<String, Value> = MetadataColumn::ALL[1..]
                    .iter()
                    .map(|column| (column.as_str().to_string(), row.field(*column)))
                    .collect();
                (row.name.clone(), Value::Object(entry))
            })
            .collect();
        json!({ "fields": fields })
    }

    /// Column name to description, in column order.
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        self.rows
            .iter()
            .map(|row| (row.name.as_str(), row.description.as_str()))
            .collect()
    }

    pub fn columns_without_description(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.description.is_empty())
            .map(|row| row.name.as_str())
            .collect()
    }

    /// Write to `path`, the format chosen by its suffix.
    pub fn write(&self, path: &Path) -> Result<()> {
        let extension = FileExtension::from_path(path)?;
        info!(path = %path.display(), columns = self.len(), "writing metadata");
        match extension {
            FileExtension::Json => {
                let writer = BufWriter::new(File::create(path)?);
                serde_json::to_writer_pretty(writer, &self.to_json())?;
            }
            FileExtension::Xlsx => excel::write_excel(&self.to_dataframe()?, path, "Fields")?,
            FileExtension::Csv | FileExtension::Parquet => {
                writer::write_data(&mut self.to_dataframe()?, path)?
            }
        }
        Ok(())
    }
}

/// Convert a sampled value to JSON, keeping numbers and booleans typed.
fn any_value_to_json(value: AnyValue<'_>) -> Value {
    let dtype = value.dtype();
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        v if dtype.is_integer() => v
            .extract::<i64>()
            .map(Value::from)
            .or_else(|| v.extract::<u64>().map(Value::from))
            .unwrap_or(Value::Null),
        v if dtype.is_float() || dtype.is_decimal() => {
            let Some(number) = v
                .extract::<f64>()
                .or_else(|| v.to_string().parse::<f64>().ok())
            else {
                return Value::Null;
            };
            // NaN and infinities have no JSON number form.
            serde_json::Number::from_f64(number)
                .map_or_else(|| Value::String(number.to_string()), Value::Number)
        }
        v => any_value_to_string(v).map_or(Value::Null, Value::String),
    }
}

/// Generates metadata for a dataset and provides the inspect, extract and
/// filter operations on top of it.
pub struct MetaGen {
    data: Dataset,
    descriptions: Descriptions,
}

impl MetaGen {
    pub fn new(data: impl Into<Dataset>) -> Self {
        Self {
            data: data.into(),
            descriptions: Descriptions::default(),
        }
    }

    pub fn with_descriptions(mut self, descriptions: Descriptions) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// Load `path` in `mode`, with optional descriptions from a `.json` or
    /// `.csv` file.
    pub fn from_path(
        path: &Path,
        mode: LoadingMode,
        descriptions_path: Option<&Path>,
    ) -> Result<Self> {
        Self::from_path_with_options(path, mode, descriptions_path, LoadOptions::default())
    }

    pub fn from_path_with_options(
        path: &Path,
        mode: LoadingMode,
        descriptions_path: Option<&Path>,
        options: LoadOptions,
    ) -> Result<Self> {
        let data = DataLoader::new(path, mode).with_options(options).load()?;
        let descriptions = match descriptions_path {
            Some(path) => Descriptions::from_path(path)?,
            None => Descriptions::default(),
        };
        Ok(Self { data, descriptions })
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn descriptions(&self) -> &Descriptions {
        &self.descriptions
    }

    /// Sorted distinct values (nulls last) when there are fewer than
    /// [`MAX_UNIQUE_VALUES`] of them.
    fn sample_values(&self, stats: &ColumnStats) -> Result<Option<Vec<Value>>> {
        if stats.is_all_null() {
            return Ok(Some(vec![Value::Null]));
        }
        if stats.n_unique >= MAX_UNIQUE_VALUES {
            return Ok(None);
        }

        let mut unique = col(stats.name.as_str());
        if matches!(stats.dtype, DataType::Categorical(..) | DataType::Enum(..)) {
            unique = unique.cast(DataType::String);
        }
        // Nested values have no ordering, so they keep first-seen order.
        let mut unique = unique.unique_stable();
        if !stats.dtype.is_nested() {
            unique = unique.sort(SortOptions {
                nulls_last: true,
                ..Default::default()
            });
        }
        let df = self.data.lazy().select([unique]).collect()?;
        let values = df
            .column(&stats.name)?
            .as_materialized_series()
            .iter()
            .map(any_value_to_json)
            .collect();
        Ok(Some(values))
    }

    pub fn compute_metadata(&self) -> Result<MetadataTable> {
        let stats = self.data.describe()?;
        let n_columns = self.data.schema()?.len();
        if stats.len() != n_columns {
            return Err(MetaGenError::Internal("describe".to_string()));
        }

        let rows = stats
            .iter()
            .map(|stats| {
                debug!(column = %stats.name, kind = %stats.metagen_type, "building metadata row");
                let numeric = stats.metagen_type.is_numeric();
                let zeros = if numeric { stats.zero_count.unwrap_or(0) } else { 0 };
                Ok(MetadataRow {
                    name: stats.name.clone(),
                    long_name: self.descriptions.long_name(&stats.name).to_string(),
                    metagen_type: stats.metagen_type,
                    description: self.descriptions.description(&stats.name).to_string(),
                    min: stats.min.clone(),
                    max: stats.max.clone(),
                    mean: stats.mean,
                    std: stats.std,
                    min_length: stats.min_length,
                    max_length: stats.max_length,
                    nulls: stats.null_count,
                    empty_or_zero: stats.null_count + zeros,
                    positive: stats.positive_count.filter(|_| numeric),
                    negative: stats.negative_count.filter(|_| numeric),
                    unique: if stats.is_all_null() { 1 } else { stats.n_unique },
                    values: self.sample_values(stats)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if rows.len() != n_columns {
            return Err(MetaGenError::Internal("metadata rows".to_string()));
        }
        let missing = rows.iter().filter(|r| r.description.is_empty()).count();
        if !self.descriptions.is_empty() && missing > 0 {
            warn!(missing, "some columns have no description");
        }
        Ok(MetadataTable { rows })
    }

    /// Write metadata to `outpath`. When `metadata` is `None` it is computed
    /// first. Unsupported suffixes are rejected before any computation.
    pub fn write_metadata(&self, outpath: &Path, metadata: Option<&MetadataTable>) -> Result<()> {
        FileExtension::from_path(outpath)?;
        match metadata {
            Some(metadata) => metadata.write(outpath),
            None => self.compute_metadata()?.write(outpath),
        }
    }

    pub fn extract_data(
        &self,
        inspection_mode: InspectionMode,
        n: usize,
        sample: SampleOptions,
    ) -> Result<DataFrame> {
        inspect::extract_data(&self.data, inspection_mode, n, sample)
    }

    /// Write one extract per inspection mode and format. Returns the written
    /// paths.
    pub fn write_extracts(
        &self,
        output: &Path,
        inspection_modes: &[InspectionMode],
        extra_formats: &[FileExtension],
        n: usize,
        sample: SampleOptions,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for &mode in inspection_modes {
            let mut extract = self.extract_data(mode, n, sample)?;
            for path in writer::extract_paths(output, mode, extra_formats)? {
                writer::write_data(&mut extract, &path)?;
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Replace the data with the result of an SQL query. `query` may be a
    /// path to a file holding the SQL.
    pub fn filter_data(&mut self, table_name: &str, query: &str, eager: bool) -> Result<()> {
        let sql = filter::resolve_query(query)?;
        self.data = filter::filter_by_sql(&self.data, table_name, &sql, eager)?;
        Ok(())
    }

    /// Replace the data with an extract of it.
    pub fn set_data(&mut self, data: impl Into<Dataset>) {
        self.data = data.into();
    }

    /// Write `data`, or the current data when `None`.
    pub fn write_data(&self, outpath: &Path, data: Option<DataFrame>) -> Result<()> {
        let mut df = match data {
            Some(df) => df,
            None => self.data.collect()?,
        };
        writer::write_data(&mut df, outpath)
    }

    /// Render the current data for the console.
    pub fn inspect_data(&self) -> Result<String> {
        Ok(self.data.collect()?.to_string())
    }
}
