//! Human supplied column descriptions, merged into the metadata by name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::datatypes::FileExtension;
use crate::error::{MetaGenError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColumnDescription {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptions(HashMap<String, ColumnDescription>);

#[derive(Deserialize)]
struct DescriptionsFile {
    descriptions: HashMap<String, ColumnDescription>,
}

#[derive(Deserialize)]
struct DescriptionRecord {
    column_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
}

impl Descriptions {
    /// Load from a `.json` file with a top level `descriptions` object, or a
    /// `.csv` file with `column_name,description,long_name` columns.
    pub fn from_path(path: &Path) -> Result<Self> {
        let descriptions = match FileExtension::from_path(path)? {
            FileExtension::Json => Self::from_json(&fs::read_to_string(path)?)?,
            FileExtension::Csv => Self::from_csv_reader(fs::File::open(path)?)?,
            _ => {
                return Err(MetaGenError::FileTypeUnsupported(
                    path.display().to_string(),
                ));
            }
        };
        info!(path = %path.display(), columns = descriptions.len(), "loaded column descriptions");
        Ok(descriptions)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: DescriptionsFile = serde_json::from_str(content)?;
        Ok(Self(file.descriptions))
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut map = HashMap::new();
        for record in reader.deserialize() {
            let record: DescriptionRecord = record?;
            map.insert(
                record.column_name,
                ColumnDescription {
                    description: record.description.unwrap_or_default(),
                    long_name: record.long_name.unwrap_or_default(),
                },
            );
        }
        Ok(Self(map))
    }

    pub fn insert(&mut self, column: impl Into<String>, description: ColumnDescription) {
        self.0.insert(column.into(), description);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnDescription> {
        self.0.get(column)
    }

    pub fn description(&self, column: &str) -> &str {
        self.get(column).map_or("", |d| d.description.as_str())
    }

    pub fn long_name(&self, column: &str) -> &str {
        self.get(column).map_or("", |d| d.long_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
