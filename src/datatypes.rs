//! Enumerations shared across the crate: the reduced metadata type system,
//! loading modes, supported file extensions and the metadata table columns.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use polars::prelude::DataType;

use crate::error::{MetaGenError, Result};

/// Reduced type reported in the `Type` column of the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaGenDataType {
    String,
    Float,
    Integer,
    Bool,
    Date,
    Datetime,
    Duration,
    Time,
    List,
    Dict,
    Array,
    Binary,
    Category,
    Object,
    Unknown,
    Null,
}

impl MetaGenDataType {
    /// Map a native polars dtype onto the reduced type.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String | DataType::Categorical(..) => Self::String,
            DataType::Enum(..) => Self::Category,
            DataType::Boolean => Self::Bool,
            DataType::Date => Self::Date,
            DataType::Datetime(..) => Self::Datetime,
            DataType::Duration(_) => Self::Duration,
            DataType::Time => Self::Time,
            DataType::List(_) => Self::List,
            DataType::Array(..) => Self::Array,
            DataType::Struct(_) => Self::Dict,
            DataType::Binary | DataType::BinaryOffset => Self::Binary,
            DataType::Null => Self::Null,
            DataType::Decimal(..) => Self::Float,
            DataType::Unknown(_) => Self::Unknown,
            dt if dt.is_integer() => Self::Integer,
            dt if dt.is_float() => Self::Float,
            _ => Self::Object,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Types whose values have a string length.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Category)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Datetime | Self::Duration | Self::Time
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Duration => "duration",
            Self::Time => "time",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Array => "array",
            Self::Binary => "binary",
            Self::Category => "category",
            Self::Object => "object",
            Self::Unknown => "unknown",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for MetaGenDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether data is materialized up front or kept as a query plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LoadingMode {
    #[default]
    Lazy,
    Eager,
}

impl LoadingMode {
    pub const ALL: [LoadingMode; 2] = [LoadingMode::Lazy, LoadingMode::Eager];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lazy => "lazy",
            Self::Eager => "eager",
        }
    }
}

impl FromStr for LoadingMode {
    type Err = MetaGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "eager" => Ok(Self::Eager),
            _ => Err(MetaGenError::LoadingModeUnsupported(s.to_string())),
        }
    }
}

impl fmt::Display for LoadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File formats that can be read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileExtension {
    Csv,
    Json,
    Parquet,
    Xlsx,
}

impl FileExtension {
    pub const ALL: [FileExtension; 4] = [
        FileExtension::Csv,
        FileExtension::Json,
        FileExtension::Parquet,
        FileExtension::Xlsx,
    ];

    /// Suffix including the leading dot, e.g. `.csv`.
    pub fn as_suffix(self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::Json => ".json",
            Self::Parquet => ".parquet",
            Self::Xlsx => ".xlsx",
        }
    }

    /// Extension without the dot, for use with `Path::with_extension`.
    pub fn as_extension(self) -> &'static str {
        &self.as_suffix()[1..]
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    /// Parse a comma separated list such as `.csv,.json`.
    pub fn parse_list(formats: &str) -> Result<Vec<Self>> {
        formats
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for FileExtension {
    type Err = MetaGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "parquet" => Ok(Self::Parquet),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(MetaGenError::FileTypeUnsupported(s.to_string())),
        }
    }
}

impl fmt::Display for FileExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_suffix())
    }
}

/// Columns of the metadata table, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataColumn {
    Name,
    LongName,
    Type,
    Description,
    Min,
    Max,
    Mean,
    Std,
    MinLength,
    MaxLength,
    NumberNulls,
    NumberEmptyZero,
    NumberPositive,
    NumberNegative,
    NumberUnique,
    Values,
}

impl MetadataColumn {
    pub const ALL: [MetadataColumn; 16] = [
        MetadataColumn::Name,
        MetadataColumn::LongName,
        MetadataColumn::Type,
        MetadataColumn::Description,
        MetadataColumn::Min,
        MetadataColumn::Max,
        MetadataColumn::Mean,
        MetadataColumn::Std,
        MetadataColumn::MinLength,
        MetadataColumn::MaxLength,
        MetadataColumn::NumberNulls,
        MetadataColumn::NumberEmptyZero,
        MetadataColumn::NumberPositive,
        MetadataColumn::NumberNegative,
        MetadataColumn::NumberUnique,
        MetadataColumn::Values,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::LongName => "Long Name",
            Self::Type => "Type",
            Self::Description => "Description",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Mean => "Mean",
            Self::Std => "Std",
            Self::MinLength => "Min Length",
            Self::MaxLength => "Max Length",
            Self::NumberNulls => "# nulls",
            Self::NumberEmptyZero => "# empty/zero",
            Self::NumberPositive => "# positive",
            Self::NumberNegative => "# negative",
            Self::NumberUnique => "# unique",
            Self::Values => "Values",
        }
    }
}
