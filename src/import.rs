//! Spreadsheet collaborator interface, upload validation and export naming.

use chrono::NaiveDate;

use crate::{core::roster::RosterError, winner::ExportRow};

pub use crate::core::extract::SheetRow;

/// Upload extensions accepted for name import.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Import and export failures. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// No file was supplied.
    #[error("请选择Excel文件")]
    NoFile,
    /// The file name does not end in an accepted extension.
    #[error("请选择Excel文件(.xlsx或.xls)")]
    UnsupportedExtension(String),
    /// The workbook could not be read.
    #[error("导入失败，请检查Excel文件格式: {0}")]
    Parse(String),
    /// The workbook held no usable names.
    #[error("未找到有效名字")]
    NoValidNames,
    /// Names cannot be replaced while a draw is spinning.
    #[error("抽奖进行中，无法导入")]
    DrawInProgress,
    /// The export workbook could not be produced.
    #[error("导出失败: {0}")]
    Write(String),
}

impl From<RosterError> for ImportError {
    fn from(value: RosterError) -> Self {
        match value {
            RosterError::NoValidNames => Self::NoValidNames,
        }
    }
}

/// Converts between workbook bytes and rows.
///
/// Implementations read only the first sheet and use its header row as field
/// labels.
pub trait SpreadsheetAdapter: Send {
    /// Parses the first sheet of `bytes` into labeled rows.
    fn parse_rows(&self, bytes: &[u8]) -> Result<Vec<SheetRow>, ImportError>;

    /// Writes export rows into a new workbook.
    fn write_workbook(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ImportError>;
}

/// Checks that an upload was supplied and carries a workbook extension.
pub fn validate_upload(file_name: Option<&str>) -> Result<&str, ImportError> {
    let name = file_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ImportError::NoFile)?;
    let lower = name.to_lowercase();
    if ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(name)
    } else {
        Err(ImportError::UnsupportedExtension(name.to_string()))
    }
}

/// Export filename `<label>_<YYYYMMDD>.xlsx`.
pub fn export_file_name(label: &str, date: NaiveDate) -> String {
    format!("{label}_{}.xlsx", date.format("%Y%m%d"))
}

/// Workbook produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Suggested download filename.
    pub file_name: String,
    /// Workbook bytes.
    pub bytes: Vec<u8>,
}
