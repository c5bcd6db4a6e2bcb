//! 转换选项
//!
//! 所有引擎能识别的选项都在这里显式列出，配置文件中出现未知字段会直接报错。

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 单次转换的选项
///
/// 每个引擎只使用与自己相关的字段：
/// - pandoc：字体、字号、页边距、纸张、目录、章节编号、样式表、模板变量
/// - chromium：纸张、页边距、横向、背景、页眉页脚模板
/// - weasyprint：样式表
///
/// `extra_args` 原样追加到外部命令末尾（chromium 不使用）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionOptions {
    /// Pandoc 的 PDF 引擎（xelatex / pdflatex / lualatex / typst ...）
    pub pdf_engine: Option<String>,
    pub main_font: Option<String>,
    pub sans_font: Option<String>,
    pub mono_font: Option<String>,
    /// 字号，例如 "11pt"
    pub font_size: Option<String>,
    /// 页边距，例如 "1in"、"2.5cm"、"20mm"
    pub margin: Option<String>,
    pub paper: Option<PaperSize>,
    pub landscape: Option<bool>,
    pub toc: Option<bool>,
    pub toc_depth: Option<u8>,
    pub number_sections: Option<bool>,
    /// HTML 输出是否生成完整文档（默认开启）
    pub standalone: Option<bool>,
    #[serde(default)]
    pub stylesheets: Vec<PathBuf>,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub print_background: Option<bool>,
    /// 模板变量（pandoc `-V key=value`）
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl ConversionOptions {
    /// 以 `self` 为基础，叠加 `over` 中设置过的字段
    pub fn merged(&self, over: &ConversionOptions) -> ConversionOptions {
        let mut variables = self.variables.clone();
        variables.extend(over.variables.clone());

        ConversionOptions {
            pdf_engine: over.pdf_engine.clone().or_else(|| self.pdf_engine.clone()),
            main_font: over.main_font.clone().or_else(|| self.main_font.clone()),
            sans_font: over.sans_font.clone().or_else(|| self.sans_font.clone()),
            mono_font: over.mono_font.clone().or_else(|| self.mono_font.clone()),
            font_size: over.font_size.clone().or_else(|| self.font_size.clone()),
            margin: over.margin.clone().or_else(|| self.margin.clone()),
            paper: over.paper.or(self.paper),
            landscape: over.landscape.or(self.landscape),
            toc: over.toc.or(self.toc),
            toc_depth: over.toc_depth.or(self.toc_depth),
            number_sections: over.number_sections.or(self.number_sections),
            standalone: over.standalone.or(self.standalone),
            stylesheets: if over.stylesheets.is_empty() {
                self.stylesheets.clone()
            } else {
                over.stylesheets.clone()
            },
            header_template: over
                .header_template
                .clone()
                .or_else(|| self.header_template.clone()),
            footer_template: over
                .footer_template
                .clone()
                .or_else(|| self.footer_template.clone()),
            print_background: over.print_background.or(self.print_background),
            variables,
            extra_args: if over.extra_args.is_empty() {
                self.extra_args.clone()
            } else {
                over.extra_args.clone()
            },
        }
    }

    /// 页边距换算为英寸（chromium 打印参数使用英寸）
    pub fn margin_inches(&self) -> Result<Option<f64>, ConfigError> {
        self.margin.as_deref().map(parse_length_inches).transpose()
    }

    /// 检查可以在加载时发现的问题
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.margin_inches()?;
        if let Some(depth) = self.toc_depth {
            if !(1..=6).contains(&depth) {
                return Err(ConfigError::Invalid {
                    field: "toc_depth",
                    reason: format!("应在 1 到 6 之间，实际为 {}", depth),
                });
            }
        }
        Ok(())
    }
}

/// 纸张尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// 纸张宽高（英寸）
    pub fn inches(&self) -> (f64, f64) {
        match self {
            PaperSize::A3 => (11.69, 16.54),
            PaperSize::A4 => (8.27, 11.69),
            PaperSize::A5 => (5.83, 8.27),
            PaperSize::Letter => (8.5, 11.0),
            PaperSize::Legal => (8.5, 14.0),
        }
    }

    /// Pandoc / LaTeX 的 papersize 变量值
    pub fn latex_name(&self) -> &'static str {
        match self {
            PaperSize::A3 => "a3",
            PaperSize::A4 => "a4",
            PaperSize::A5 => "a5",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }
}

/// 解析带单位的长度并换算为英寸
///
/// 支持 `in`、`cm`、`mm`、`pt`、`px`（96 px = 1 in）。
pub fn parse_length_inches(value: &str) -> Result<f64, ConfigError> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let invalid = |reason: String| ConfigError::Invalid {
        field: "margin",
        reason,
    };

    let number: f64 = number
        .trim()
        .parse()
        .map_err(|_| invalid(format!("无法解析长度 '{}'", value)))?;
    if number < 0.0 {
        return Err(invalid(format!("长度不能为负数: '{}'", value)));
    }

    let inches = match unit.trim() {
        "in" => number,
        "cm" => number / 2.54,
        "mm" => number / 25.4,
        "pt" => number / 72.0,
        "px" => number / 96.0,
        "" => return Err(invalid(format!("缺少单位: '{}'", value))),
        other => return Err(invalid(format!("不支持的单位 '{}'", other))),
    };

    Ok(inches)
}
