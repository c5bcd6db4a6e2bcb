//! 转换任务
//!
//! 一个 Job 对应"一个源文件 → 一个输出文件"，创建后不可修改。

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::models::options::ConversionOptions;

/// 外部引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 通用文档转换器（Markdown / DOCX / EPUB → PDF / DOCX / HTML）
    Pandoc,
    /// 无头浏览器打印（HTML → PDF）
    Chromium,
    /// HTML/CSS 排版引擎（HTML → PDF）
    Weasyprint,
    /// 配置文件中声明的任意命令行工具
    Command,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Pandoc => "pandoc",
            EngineKind::Chromium => "chromium",
            EngineKind::Weasyprint => "weasyprint",
            EngineKind::Command => "command",
        }
    }

    pub fn all() -> [EngineKind; 4] {
        [
            EngineKind::Pandoc,
            EngineKind::Chromium,
            EngineKind::Weasyprint,
            EngineKind::Command,
        ]
    }
}

impl Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Docx,
    Html,
}

impl OutputFormat {
    /// 输出文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 转换任务
#[derive(Debug, Clone)]
pub struct Job {
    index: usize,
    source: PathBuf,
    output: PathBuf,
    engine: EngineKind,
    format: OutputFormat,
    options: ConversionOptions,
}

impl Job {
    /// 创建新的转换任务
    ///
    /// `index` 是枚举顺序（从 0 开始），报告按它排序。
    pub fn new(
        index: usize,
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        engine: EngineKind,
        format: OutputFormat,
        options: ConversionOptions,
    ) -> Self {
        Self {
            index,
            source: source.into(),
            output: output.into(),
            engine,
            format,
            options,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// 源文件名（用于日志和报告）
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 源文件名去掉扩展名
    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

impl Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[任务 #{} {} → {}]",
            self.index + 1,
            self.file_name(),
            self.output
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        )
    }
}
