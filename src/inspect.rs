//! Head, tail and random-sample previews of a dataset.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{MetaGenError, Result};
use crate::loader::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum InspectionMode {
    Head,
    Tail,
    Sample,
}

impl InspectionMode {
    pub const ALL: [InspectionMode; 3] = [
        InspectionMode::Head,
        InspectionMode::Tail,
        InspectionMode::Sample,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Tail => "tail",
            Self::Sample => "sample",
        }
    }

    /// Parse a list of mode names, rejecting the whole list on any unknown name.
    pub fn parse_all<S: AsRef<str>>(modes: &[S]) -> Result<Vec<Self>> {
        modes.iter().map(|m| m.as_ref().parse()).collect()
    }

    /// Parse a comma separated list. `None` selects every mode.
    pub fn parse_list(modes: Option<&str>) -> Result<Vec<Self>> {
        match modes {
            None => Ok(Self::ALL.to_vec()),
            Some(modes) => Self::parse_all(&modes.split(',').map(str::trim).collect::<Vec<_>>()),
        }
    }

    /// Every mode except the ignored ones, in canonical order.
    pub fn without(ignored: &[InspectionMode]) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|mode| !ignored.contains(mode))
            .collect()
    }
}

impl FromStr for InspectionMode {
    type Err = MetaGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "head" => Ok(Self::Head),
            "tail" => Ok(Self::Tail),
            "sample" => Ok(Self::Sample),
            _ => Err(MetaGenError::InspectionModeUnsupported(s.to_string())),
        }
    }
}

impl fmt::Display for InspectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for the random sample inspection mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleOptions {
    pub seed: Option<u64>,
    pub with_replacement: bool,
}

/// Take `n` rows from `data` according to `mode`. Head and tail are pushed
/// into the query plan of lazy data; sampling needs the full frame.
pub fn extract_data(
    data: &Dataset,
    mode: InspectionMode,
    n: usize,
    sample: SampleOptions,
) -> Result<DataFrame> {
    debug!(%mode, n, lazy = data.is_lazy(), "extracting rows");
    let df = match (mode, data) {
        (InspectionMode::Head, Dataset::Eager(df)) => df.head(Some(n)),
        (InspectionMode::Head, Dataset::Lazy(lf)) => lf.clone().limit(n as IdxSize).collect()?,
        (InspectionMode::Tail, Dataset::Eager(df)) => df.tail(Some(n)),
        (InspectionMode::Tail, Dataset::Lazy(lf)) => lf.clone().tail(n as IdxSize).collect()?,
        (InspectionMode::Sample, data) => {
            let df = data.collect()?;
            let n = if sample.with_replacement {
                n
            } else {
                n.min(df.height())
            };
            df.sample_n_literal(n, sample.with_replacement, true, sample.seed)?
        }
    };
    Ok(df)
}

/// Console rendering limits for printed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    pub rows: usize,
    /// `None` shows every column.
    pub cols: Option<usize>,
    pub str_len: usize,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: Some(200),
            str_len: 50,
        }
    }
}

impl TableFormat {
    /// Polars reads its table formatting from these variables. A negative
    /// column limit means no limit.
    pub fn env_vars(&self) -> [(&'static str, String); 3] {
        let cols = self.cols.map_or_else(|| "-1".to_string(), |cols| cols.to_string());
        [
            ("POLARS_FMT_MAX_ROWS", self.rows.to_string()),
            ("POLARS_FMT_MAX_COLS", cols),
            ("POLARS_FMT_STR_LEN", self.str_len.to_string()),
        ]
    }
}

/// Open `path` in the macOS Quick Look previewer.
pub fn quick_look_preview(path: &Path) -> Result<()> {
    if !cfg!(target_os = "macos") {
        return Err(MetaGenError::PreviewUnsupported);
    }
    info!(path = %path.display(), "opening quick look preview");
    Command::new("qlmanage")
        .arg("-p")
        .arg(path)
        .stdout(Stdio::null())
        .status()?;
    Ok(())
}
