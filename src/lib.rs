//! Metadata generation for tabular data.
//!
//! Loads CSV, Parquet (including hive partitioned directories), Excel and
//! JSON files into eager or lazy Polars frames and computes one metadata row
//! per column: type, min/max, mean/std, null/zero/sign counts, string
//! lengths, distinct counts and a small sample of distinct values. Also
//! provides head/tail/sample extracts and SQL filtering of the data.

pub mod datatypes;
pub mod describe;
pub mod descriptions;
pub mod error;
pub mod excel;
pub mod filter;
pub mod inspect;
pub mod loader;
pub mod metagen;
pub mod writer;

pub use datatypes::{FileExtension, LoadingMode, MetaGenDataType, MetadataColumn};
pub use describe::{ColumnStats, Describable};
pub use descriptions::{ColumnDescription, Descriptions};
pub use error::{MetaGenError, Result};
pub use inspect::{InspectionMode, SampleOptions, TableFormat};
pub use loader::{DataLoader, Dataset, LoadOptions};
pub use metagen::{MAX_UNIQUE_VALUES, MetaGen, MetadataRow, MetadataTable};
