use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetaGenError>;

#[derive(Debug, Error)]
pub enum MetaGenError {
    #[error("file type {0:?} is not supported, supported extensions: .csv, .json, .parquet, .xlsx")]
    FileTypeUnsupported(String),

    #[error("loading mode {0:?} is not supported, supported modes: lazy, eager")]
    LoadingModeUnsupported(String),

    #[error("inspection_modes must be one of [\"head\", \"tail\", \"sample\"], got {0:?}")]
    InspectionModeUnsupported(String),

    #[error("quick look preview is only available on macOS")]
    PreviewUnsupported,

    #[error("internal error while calculating {0:?} metadata")]
    Internal(String),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    #[error("excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),
}
