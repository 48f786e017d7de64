//! Column statistics for Polars frames.
//!
//! This module provides a `describe()` method for `DataFrame`, `LazyFrame` and
//! [`Dataset`]. Every statistic the metadata table needs (null counts, min/max,
//! mean/std, sign counts, string lengths and distinct counts) is computed in a
//! single aggregate query over the lazy plan. Eager frames are converted to a
//! lazy frame first, so both loading modes run exactly the same plan.

use polars::lazy::dsl;
use polars::prelude::*;
use tracing::debug;

use crate::datatypes::MetaGenDataType;
use crate::error::Result;
use crate::loader::Dataset;

/// Aggregates for one input column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub dtype: DataType,
    pub metagen_type: MetaGenDataType,
    /// Number of rows, nulls included.
    pub count: u64,
    pub null_count: u64,
    pub min: Option<String>,
    pub max: Option<String>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub zero_count: Option<u64>,
    pub positive_count: Option<u64>,
    pub negative_count: Option<u64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    /// Distinct values, null counted as one value.
    pub n_unique: u64,
}

impl ColumnStats {
    pub fn is_all_null(&self) -> bool {
        self.null_count == self.count
    }
}

/// Trait for types that can produce per-column statistics
pub trait Describable {
    /// Compute [`ColumnStats`] for every column, in schema order.
    ///
    /// Type dependent statistics are `None` when they do not apply:
    /// - sign counts only for numeric columns
    /// - string lengths only for string/categorical columns
    /// - mean for numeric and boolean columns, std for numeric columns only
    ///
    /// # Example
    /// ```rust
    /// use polars::prelude::*;
    /// use metagen::Describable;
    ///
    /// let df = df! {
    ///     "ints" => [1, -2, 0],
    ///     "strings" => ["a", "bb", "ccc"],
    /// }.unwrap();
    ///
    /// let stats = df.describe().unwrap();
    /// assert_eq!(stats[0].positive_count, Some(1));
    /// assert_eq!(stats[1].max_length, Some(3));
    /// ```
    fn describe(&self) -> Result<Vec<ColumnStats>>;
}

impl Describable for DataFrame {
    fn describe(&self) -> Result<Vec<ColumnStats>> {
        describe_lazy_impl(&self.clone().lazy())
    }
}

impl Describable for LazyFrame {
    fn describe(&self) -> Result<Vec<ColumnStats>> {
        describe_lazy_impl(self)
    }
}

impl Describable for Dataset {
    fn describe(&self) -> Result<Vec<ColumnStats>> {
        describe_lazy_impl(&self.lazy())
    }
}

const METRICS: [&str; 12] = [
    "count",
    "null_count",
    "min",
    "max",
    "mean",
    "std",
    "zero",
    "positive",
    "negative",
    "min_len",
    "max_len",
    "n_unique",
];

fn metric_alias(metric: &str, column: &str) -> String {
    format!("{metric}:{column}")
}

fn null_of(dtype: DataType) -> Expr {
    dsl::lit(NULL).cast(dtype)
}

/// Min/max make no sense (or are unsupported) for these dtypes.
fn skip_minmax(dtype: &DataType) -> bool {
    dtype.is_nested()
        || matches!(
            dtype,
            DataType::Null | DataType::Unknown(_) | DataType::Binary | DataType::BinaryOffset
        )
}

fn column_exprs(name: &str, dtype: &DataType) -> Vec<Expr> {
    let kind = MetaGenDataType::from_dtype(dtype);
    let col = dsl::col(name);
    // Categoricals are profiled through their string values.
    let values = if matches!(dtype, DataType::Categorical(..) | DataType::Enum(..)) {
        col.clone().cast(DataType::String)
    } else {
        col.clone()
    };

    // Min/max keep their native dtype and are rendered after collection.
    let (min, max) = if skip_minmax(dtype) {
        (null_of(DataType::String), null_of(DataType::String))
    } else {
        (values.clone().min(), values.clone().max())
    };

    let mean = if kind.is_numeric() || kind == MetaGenDataType::Bool {
        values.clone().cast(DataType::Float64).mean()
    } else {
        null_of(DataType::Float64)
    };

    let std = if kind.is_numeric() {
        values.clone().cast(DataType::Float64).std(1)
    } else {
        null_of(DataType::Float64)
    };

    let sign_count = |cmp: fn(Expr, Expr) -> Expr| {
        if kind.is_numeric() {
            cmp(values.clone().cast(DataType::Float64), dsl::lit(0.0))
                .sum()
                .cast(DataType::UInt64)
        } else {
            null_of(DataType::UInt64)
        }
    };
    let zero = sign_count(|a, b| a.eq(b));
    let positive = sign_count(|a, b| a.gt(b));
    let negative = sign_count(|a, b| a.lt(b));

    let (min_len, max_len) = if kind.is_textual() {
        let len = values.clone().cast(DataType::String).str().len_bytes();
        (
            len.clone().min().cast(DataType::UInt64),
            len.max().cast(DataType::UInt64),
        )
    } else {
        (null_of(DataType::UInt64), null_of(DataType::UInt64))
    };

    let exprs = [
        dsl::len().cast(DataType::UInt64),
        col.clone().null_count().cast(DataType::UInt64),
        min,
        max,
        mean,
        std,
        zero,
        positive,
        negative,
        min_len,
        max_len,
        if dtype == &DataType::Null {
            dsl::lit(1).cast(DataType::UInt64)
        } else {
            col.n_unique().cast(DataType::UInt64)
        },
    ];
    exprs
        .into_iter()
        .zip(METRICS)
        .map(|(expr, metric)| expr.alias(metric_alias(metric, name)))
        .collect()
}

/// Render a scalar for the `Min`/`Max` columns.
pub(crate) fn any_value_to_string(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

fn metric_value<'a>(df_metrics: &'a DataFrame, metric: &str, name: &str) -> Result<AnyValue<'a>> {
    Ok(df_metrics.column(&metric_alias(metric, name))?.get(0)?)
}

/// Internal implementation that works purely with LazyFrame
fn describe_lazy_impl(lazy_frame: &LazyFrame) -> Result<Vec<ColumnStats>> {
    let mut lf = lazy_frame.clone();
    let schema = lf.collect_schema()?;

    if schema.is_empty() {
        return Ok(Vec::new());
    }

    let metric_exprs: Vec<Expr> = schema
        .iter()
        .flat_map(|(name, dtype)| column_exprs(name.as_str(), dtype))
        .collect();
    debug!(columns = schema.len(), exprs = metric_exprs.len(), "describing frame");

    // Execute all aggregations in a single pass
    let df_metrics = lazy_frame.clone().select(metric_exprs).collect()?;

    let count = |m: &str, name: &str| -> Result<Option<u64>> {
        Ok(metric_value(&df_metrics, m, name)?.extract::<u64>())
    };
    let float = |m: &str, name: &str| -> Result<Option<f64>> {
        Ok(metric_value(&df_metrics, m, name)?.extract::<f64>())
    };
    let text = |m: &str, name: &str| -> Result<Option<String>> {
        Ok(any_value_to_string(metric_value(&df_metrics, m, name)?))
    };

    schema
        .iter()
        .map(|(name, dtype)| {
            let name = name.as_str();
            Ok(ColumnStats {
                name: name.to_string(),
                dtype: dtype.clone(),
                metagen_type: MetaGenDataType::from_dtype(dtype),
                count: count("count", name)?.unwrap_or(0),
                null_count: count("null_count", name)?.unwrap_or(0),
                min: text("min", name)?,
                max: text("max", name)?,
                mean: float("mean", name)?,
                std: float("std", name)?,
                zero_count: count("zero", name)?,
                positive_count: count("positive", name)?,
                negative_count: count("negative", name)?,
                min_length: count("min_len", name)?,
                max_length: count("max_len", name)?,
                n_unique: count("n_unique", name)?.unwrap_or(0),
            })
        })
        .collect()
}
