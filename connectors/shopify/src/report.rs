//! Spreadsheet report of missing metafields.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{info, instrument};

use crate::error::{AuditError, AuditResult};
use crate::types::MissingRecord;

const SHEET_NAME: &str = "Faltan Metafields";

/// Column headers and widths, in column order.
const COLUMNS: [(&str, f64); 6] = [
    ("Tipo", 12.0),
    ("Estado", 14.0),
    ("ID", 36.0),
    ("Handle", 30.0),
    ("Título", 40.0),
    ("Metafields faltantes", 50.0),
];

/// Renders scan records into a report file.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    /// Write `records` in the given order and return the file path.
    async fn write(&self, records: &[MissingRecord], run_date: NaiveDate) -> AuditResult<PathBuf>;
}

/// Writes `.xlsx` workbooks into a directory.
#[derive(Debug, Clone)]
pub struct XlsxReporter {
    dir: PathBuf,
}

impl XlsxReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, run_date: NaiveDate) -> PathBuf {
        self.dir.join(report_file_name(run_date))
    }
}

/// `missing-metafields_<YYYY-MM-DD>.xlsx`
#[must_use]
pub fn report_file_name(run_date: NaiveDate) -> String {
    format!("missing-metafields_{}.xlsx", run_date.format("%Y-%m-%d"))
}

#[async_trait]
impl ReportWriter for XlsxReporter {
    #[instrument(skip_all, fields(rows = records.len()))]
    async fn write(&self, records: &[MissingRecord], run_date: NaiveDate) -> AuditResult<PathBuf> {
        let path = self.path_for(run_date);
        let rows = records.to_vec();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_workbook(&rows, &target))
            .await
            .map_err(|err| AuditError::Report(format!("report task failed: {err}")))??;

        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

fn write_workbook(records: &[MissingRecord], path: &Path) -> AuditResult<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in (0_u16..).zip(COLUMNS) {
        worksheet.set_column_width(col, width)?;
        worksheet.write_string_with_format(0, col, title, &header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row, record) in (1_u32..).zip(records) {
        let missing = record.missing.join(", ");
        let cells = [
            record.resource_type.as_str(),
            record.status.as_str(),
            record.id.as_str(),
            record.handle.as_str(),
            record.title.as_str(),
            missing.as_str(),
        ];
        for (col, value) in (0_u16..).zip(cells) {
            worksheet.write_string(row, col, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
