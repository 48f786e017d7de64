//! Writing frames to csv, json, parquet and xlsx, chosen by file suffix.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::datatypes::FileExtension;
use crate::error::Result;
use crate::excel;
use crate::inspect::InspectionMode;

pub fn write_data(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = FileExtension::from_path(path)?;
    info!(path = %path.display(), rows = df.height(), "writing data");
    match extension {
        FileExtension::Csv => {
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        FileExtension::Parquet => {
            let file = File::create(path)?;
            ParquetWriter::new(file).finish(df)?;
        }
        FileExtension::Json => {
            let mut file = File::create(path)?;
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(df)?;
        }
        FileExtension::Xlsx => excel::write_excel(df, path, "Sheet1")?,
    }
    Ok(())
}

/// Output paths for an extract: `<stem>-<mode><suffix>` for each format.
/// The suffix of `output` is always included, after the extra formats.
pub fn extract_paths(
    output: &Path,
    mode: InspectionMode,
    extra_formats: &[FileExtension],
) -> Result<Vec<PathBuf>> {
    let own = FileExtension::from_path(output)?;
    let mut formats = extra_formats.to_vec();
    if !formats.contains(&own) {
        formats.push(own);
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(formats
        .into_iter()
        .map(|format| output.with_file_name(format!("{stem}-{mode}{}", format.as_suffix())))
        .collect())
}
