//! 报告写入服务 - 业务能力层
//!
//! 只负责把 `BatchReport` 落盘（文本 + JSON），不关心报告如何产生

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::BatchReport;

/// 文本报告的默认文件名
pub const TEXT_REPORT_NAME: &str = "conversion_report.txt";

/// 报告写入服务
pub struct ReportWriter {
    text_path: PathBuf,
    json_path: PathBuf,
}

impl ReportWriter {
    /// 文本报告与 JSON 报告的路径
    pub fn with_paths(text_path: impl Into<PathBuf>, json_path: impl Into<PathBuf>) -> Self {
        Self {
            text_path: text_path.into(),
            json_path: json_path.into(),
        }
    }

    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// 写入两份报告
    pub async fn write(&self, report: &BatchReport) -> AppResult<()> {
        self.write_text(report).await?;
        self.write_json(report).await
    }

    /// 写入人类可读的摘要
    pub async fn write_text(&self, report: &BatchReport) -> AppResult<()> {
        debug!("写入文本报告: {}", self.text_path.display());
        write_file(&self.text_path, report.to_string().into_bytes()).await
    }

    /// 写入机器可读的 JSON
    pub async fn write_json(&self, report: &BatchReport) -> AppResult<()> {
        debug!("写入 JSON 报告: {}", self.json_path.display());
        let json = serde_json::to_vec_pretty(report).map_err(|e| AppError::Report {
            path: self.json_path.clone(),
            source: e.into(),
        })?;
        write_file(&self.json_path, json).await
    }
}

async fn write_file(path: &Path, content: Vec<u8>) -> AppResult<()> {
    let report_error = |source| AppError::Report {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(report_error)?;
    }
    fs::write(path, content).await.map_err(report_error)
}
