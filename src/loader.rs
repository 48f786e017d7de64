//! Loading tabular files into eager or lazy Polars frames.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::io::HiveOptions;
use polars::io::csv::read::NullValues;
use polars::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::datatypes::{FileExtension, LoadingMode};
use crate::error::{MetaGenError, Result};
use crate::excel;

/// Data loaded either fully into memory or as a deferred query plan.
#[derive(Clone)]
pub enum Dataset {
    Eager(DataFrame),
    Lazy(LazyFrame),
}

impl Dataset {
    /// Lazy view of the data. Cheap for eager frames.
    pub fn lazy(&self) -> LazyFrame {
        match self {
            Self::Eager(df) => df.clone().lazy(),
            Self::Lazy(lf) => lf.clone(),
        }
    }

    /// Materialize the data.
    pub fn collect(&self) -> Result<DataFrame> {
        match self {
            Self::Eager(df) => Ok(df.clone()),
            Self::Lazy(lf) => Ok(lf.clone().collect()?),
        }
    }

    pub fn schema(&self) -> Result<SchemaRef> {
        Ok(self.lazy().collect_schema()?)
    }

    pub fn column_names(&self) -> Result<Vec<String>> {
        Ok(self
            .schema()?
            .iter_names()
            .map(|name| name.to_string())
            .collect())
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }
}

impl From<DataFrame> for Dataset {
    fn from(df: DataFrame) -> Self {
        Self::Eager(df)
    }
}

impl From<LazyFrame> for Dataset {
    fn from(lf: LazyFrame) -> Self {
        Self::Lazy(lf)
    }
}

/// Read options, applied the same way in both loading modes.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub separator: u8,
    pub has_header: bool,
    pub quote_char: Option<u8>,
    pub skip_rows: usize,
    pub infer_schema_length: Option<usize>,
    pub try_parse_dates: bool,
    pub ignore_errors: bool,
    pub null_values: Option<Vec<String>>,
    pub comment_prefix: Option<String>,
    /// Excel sheet to read, the first sheet when `None`.
    pub sheet_name: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            has_header: true,
            quote_char: Some(b'"'),
            skip_rows: 0,
            infer_schema_length: Some(100),
            try_parse_dates: false,
            ignore_errors: false,
            null_values: None,
            comment_prefix: None,
            sheet_name: None,
        }
    }
}

impl LoadOptions {
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: Option<String>) -> Self {
        self.sheet_name = sheet_name;
        self
    }

    pub fn with_null_values(mut self, null_values: Option<Vec<String>>) -> Self {
        self.null_values = null_values;
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_comment_prefix(mut self, comment_prefix: Option<String>) -> Self {
        self.comment_prefix = comment_prefix;
        self
    }

    pub fn with_try_parse_dates(mut self, try_parse_dates: bool) -> Self {
        self.try_parse_dates = try_parse_dates;
        self
    }

    fn polars_null_values(&self) -> Option<NullValues> {
        self.null_values.as_ref().map(|values| {
            NullValues::AllColumns(values.iter().map(|v| v.as_str().into()).collect())
        })
    }
}

/// Resolve the path polars should read for parquet input.
///
/// Files are returned as is. A directory of hive partitions
/// (`data.parquet/a=1/b=2/part.parquet`) becomes a glob with one `*` per
/// partition level, e.g. `data.parquet/*/*/*.parquet`. `None` when the
/// directory holds no parquet files.
pub fn nested_parquet_path(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return Some(path.to_path_buf());
    }
    let first = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("parquet")
        })?;

    let mut nested = path.to_path_buf();
    for _ in 1..first.depth() {
        nested.push("*");
    }
    nested.push("*.parquet");
    Some(nested)
}

/// Loads a file in the requested [`LoadingMode`].
pub struct DataLoader {
    path: PathBuf,
    mode: LoadingMode,
    options: LoadOptions,
}

impl DataLoader {
    pub fn new(path: impl Into<PathBuf>, mode: LoadingMode) -> Self {
        Self {
            path: path.into(),
            mode,
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    fn file_extension(&self) -> Result<FileExtension> {
        match FileExtension::from_path(&self.path) {
            Ok(ext) => Ok(ext),
            // Partitioned parquet datasets are often plain directories.
            Err(err) if self.path.is_dir() => {
                if nested_parquet_path(&self.path).is_some() {
                    Ok(FileExtension::Parquet)
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    pub fn load(&self) -> Result<Dataset> {
        let extension = self.file_extension()?;
        info!(path = %self.path.display(), mode = %self.mode, format = %extension, "loading data");

        match (extension, self.mode) {
            (FileExtension::Csv, LoadingMode::Eager) => self.read_csv().map(Dataset::Eager),
            (FileExtension::Csv, LoadingMode::Lazy) => self.scan_csv().map(Dataset::Lazy),
            (FileExtension::Parquet, LoadingMode::Eager) => self.read_parquet().map(Dataset::Eager),
            (FileExtension::Parquet, LoadingMode::Lazy) => self.scan_parquet().map(Dataset::Lazy),
            (FileExtension::Json, LoadingMode::Eager) => self.read_json().map(Dataset::Eager),
            (FileExtension::Json, LoadingMode::Lazy) => {
                Ok(Dataset::Lazy(self.read_json()?.lazy()))
            }
            (FileExtension::Xlsx, mode) => {
                if mode == LoadingMode::Lazy {
                    warn!("Excel files are not supported in lazy mode, switching to eager mode");
                }
                let df = excel::read_excel(&self.path, self.options.sheet_name.as_deref())?;
                Ok(Dataset::Eager(df))
            }
        }
    }

    fn read_csv(&self) -> Result<DataFrame> {
        let opts = &self.options;
        let df = CsvReadOptions::default()
            .with_has_header(opts.has_header)
            .with_skip_rows(opts.skip_rows)
            .with_infer_schema_length(opts.infer_schema_length)
            .with_ignore_errors(opts.ignore_errors)
            .map_parse_options(|parse| {
                parse
                    .with_separator(opts.separator)
                    .with_quote_char(opts.quote_char)
                    .with_try_parse_dates(opts.try_parse_dates)
                    .with_null_values(opts.polars_null_values())
                    .with_comment_prefix(opts.comment_prefix.as_deref())
            })
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;
        Ok(df)
    }

    fn scan_csv(&self) -> Result<LazyFrame> {
        let opts = &self.options;
        let lf = LazyCsvReader::new(PlPath::new(&self.path.to_string_lossy()))
            .with_has_header(opts.has_header)
            .with_separator(opts.separator)
            .with_quote_char(opts.quote_char)
            .with_skip_rows(opts.skip_rows)
            .with_infer_schema_length(opts.infer_schema_length)
            .with_try_parse_dates(opts.try_parse_dates)
            .with_ignore_errors(opts.ignore_errors)
            .with_null_values(opts.polars_null_values())
            .with_comment_prefix(opts.comment_prefix.as_deref().map(Into::into))
            .finish()?;
        Ok(lf)
    }

    fn parquet_source(&self) -> Result<PathBuf> {
        nested_parquet_path(&self.path)
            .ok_or_else(|| MetaGenError::FileTypeUnsupported(self.path.display().to_string()))
    }

    fn read_parquet(&self) -> Result<DataFrame> {
        if self.path.is_dir() {
            return Ok(self.scan_parquet()?.collect()?);
        }
        let file = File::open(&self.path)?;
        Ok(ParquetReader::new(file).finish()?)
    }

    /// Reading the same data with different partition layouts does not
    /// preserve column order.
    fn scan_parquet(&self) -> Result<LazyFrame> {
        let source = self.parquet_source()?;
        let is_glob = source.to_string_lossy().contains('*');
        debug!(source = %source.display(), is_glob, "scanning parquet");
        let args = ScanArgsParquet {
            hive_options: if is_glob {
                HiveOptions::new_enabled()
            } else {
                HiveOptions::new_disabled()
            },
            glob: is_glob,
            ..Default::default()
        };
        Ok(LazyFrame::scan_parquet(PlPath::new(&source.to_string_lossy()), args)?)
    }

    fn read_json(&self) -> Result<DataFrame> {
        let file = File::open(&self.path)?;
        Ok(JsonReader::new(file)
            .with_json_format(JsonFormat::Json)
            .finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir) -> Result<PathBuf> {
        let path = dir.path().join("input.csv");
        fs::write(
            &path,
            "id,name,score\n1,alpha,1.5\n2,beta,-2.0\n3,gamma,0.0\n4,,3.5\n",
        )?;
        Ok(path)
    }

    fn write_partitioned(dir: &TempDir) -> Result<PathBuf> {
        let root = dir.path().join("input_ab_partition.parquet");
        for (a, b) in [(1, "x"), (1, "y"), (2, "x")] {
            let part = root.join(format!("a={a}")).join(format!("b={b}"));
            fs::create_dir_all(&part)?;
            let mut df = df! {
                "value" => [a * 10, a * 20],
                "label" => ["p", "q"],
            }?;
            let file = File::create(part.join("part-0.parquet"))?;
            ParquetWriter::new(file).finish(&mut df)?;
        }
        Ok(root)
    }

    #[test]
    fn test_load_csv_both_modes() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_csv(&dir)?;

        for mode in LoadingMode::ALL {
            let data = DataLoader::new(&path, mode).load()?;
            assert_eq!(data.is_lazy(), mode == LoadingMode::Lazy);
            assert_eq!(data.column_names()?, vec!["id", "name", "score"]);
            assert_eq!(data.collect()?.height(), 4);
        }
        Ok(())
    }

    #[test]
    fn test_load_csv_with_separator() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("semi.csv");
        fs::write(&path, "a;b\n1;2\n3;4\n")?;

        for mode in LoadingMode::ALL {
            let options = LoadOptions::default().with_separator(b';');
            let df = DataLoader::new(&path, mode)
                .with_options(options)
                .load()?
                .collect()?;
            assert_eq!(df.shape(), (2, 2));
        }
        Ok(())
    }

    #[test]
    fn test_load_csv_options_match_across_modes() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("export.csv");
        fs::write(
            &path,
            "exported by a reporting tool\n\
             id,name,score,day\n\
             1,alpha,NA,2024-01-01\n\
             # corrected below\n\
             2,NA,2.5,2024-01-02\n\
             3,gamma,-1.0,2024-01-03\n",
        )?;

        let options = LoadOptions::default()
            .with_skip_rows(1)
            .with_comment_prefix(Some("#".to_string()))
            .with_null_values(Some(vec!["NA".to_string()]))
            .with_try_parse_dates(true);

        let mut frames = Vec::new();
        for mode in LoadingMode::ALL {
            let df = DataLoader::new(&path, mode)
                .with_options(options.clone())
                .load()?
                .collect()?;
            assert_eq!(df.shape(), (3, 4));
            assert_eq!(df.column("name")?.null_count(), 1);
            assert_eq!(df.column("score")?.null_count(), 1);
            assert_eq!(df.column("day")?.dtype(), &DataType::Date);
            frames.push(df);
        }
        assert!(frames[0].equals_missing(&frames[1]));
        Ok(())
    }

    #[test]
    fn test_load_excel_sheet_by_name() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("workbook.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let first = workbook.add_worksheet();
        first.set_name("summary")?;
        first.write_string(0, 0, "total")?;
        first.write_string(1, 0, "all")?;
        let second = workbook.add_worksheet();
        second.set_name("cities")?;
        second.write_string(0, 0, "city")?;
        second.write_string(1, 0, "Faro")?;
        second.write_string(2, 0, "Porto")?;
        workbook.save(&path)?;

        let df = DataLoader::new(&path, LoadingMode::Eager).load()?.collect()?;
        assert_eq!(df.get_column_names_str(), vec!["total"]);

        let options = LoadOptions::default().with_sheet_name(Some("cities".to_string()));
        for mode in LoadingMode::ALL {
            let data = DataLoader::new(&path, mode)
                .with_options(options.clone())
                .load()?;
            assert!(!data.is_lazy());
            let df = data.collect()?;
            let cities: Vec<_> = df.column("city")?.str()?.into_iter().flatten().collect();
            assert_eq!(cities, vec!["Faro", "Porto"]);
        }
        Ok(())
    }

    #[test]
    fn test_load_json_records() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("input.json");
        fs::write(&path, r#"[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]"#)?;

        for mode in LoadingMode::ALL {
            let df = DataLoader::new(&path, mode).load()?.collect()?;
            assert_eq!(df.shape(), (2, 2));
        }
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        for mode in LoadingMode::ALL {
            let result = DataLoader::new("test.unsupported", mode).load();
            assert!(matches!(result, Err(MetaGenError::FileTypeUnsupported(_))));

            let result = DataLoader::new("test", mode).load();
            assert!(matches!(result, Err(MetaGenError::FileTypeUnsupported(_))));
        }
    }

    #[test]
    fn test_nested_parquet_path() -> Result<()> {
        let dir = TempDir::new()?;
        let root = write_partitioned(&dir)?;

        let nested = nested_parquet_path(&root).unwrap();
        assert_eq!(nested, root.join("*").join("*").join("*.parquet"));

        let file = root.join("a=1").join("b=x").join("part-0.parquet");
        assert_eq!(nested_parquet_path(&file), Some(file.clone()));
        Ok(())
    }

    #[test]
    fn test_directory_without_parquet_files() -> Result<()> {
        let dir = TempDir::new()?;
        let empty = dir.path().join("directory_without_parquet");
        fs::create_dir_all(&empty)?;
        fs::write(empty.join("notes.txt"), "nothing here")?;

        assert_eq!(nested_parquet_path(&empty), None);
        let result = DataLoader::new(&empty, LoadingMode::Lazy).load();
        assert!(matches!(result, Err(MetaGenError::FileTypeUnsupported(_))));
        Ok(())
    }

    #[test]
    fn test_load_partitioned_parquet() -> Result<()> {
        let dir = TempDir::new()?;
        let root = write_partitioned(&dir)?;

        for mode in LoadingMode::ALL {
            let df = DataLoader::new(&root, mode).load()?.collect()?;
            assert_eq!(df.height(), 6);
            assert!(df.column("value").is_ok());
        }
        Ok(())
    }
}
