//! Pandoc 转换器
//!
//! Markdown / DOCX / EPUB → PDF / DOCX / HTML。PDF 通过 LaTeX 引擎排版。

use std::ffi::OsString;

use tracing::{debug, info};

use crate::converters::Converter;
use crate::error::ConvertError;
use crate::infrastructure::ToolCommand;
use crate::models::{Job, OutputFormat};

const PROGRAM: &str = "pandoc";

/// 未指定时使用的 PDF 引擎（支持系统字体）
pub const DEFAULT_PDF_ENGINE: &str = "xelatex";

/// Pandoc 转换器
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
    /// 预检时一并检查的 PDF 引擎（输出 PDF 时才需要）
    probe_pdf_engine: Option<String>,
}

impl PandocConverter {
    /// 输出 PDF 时，预检还要确认 LaTeX 引擎存在
    pub fn for_format(format: OutputFormat, pdf_engine: Option<&str>) -> Self {
        let probe_pdf_engine = (format == OutputFormat::Pdf)
            .then(|| pdf_engine.unwrap_or(DEFAULT_PDF_ENGINE).to_string());
        Self {
            program: PROGRAM.to_string(),
            probe_pdf_engine,
        }
    }

    /// 构建命令行参数
    pub fn build_args(job: &Job) -> Vec<OsString> {
        let options = job.options();
        let mut args: Vec<OsString> = vec![
            job.source().as_os_str().to_os_string(),
            "-o".into(),
            job.output().as_os_str().to_os_string(),
        ];

        if job.format() == OutputFormat::Pdf {
            let engine = options.pdf_engine.as_deref().unwrap_or(DEFAULT_PDF_ENGINE);
            args.push(format!("--pdf-engine={}", engine).into());

            if let Some(margin) = &options.margin {
                push_variable(&mut args, "geometry", &format!("margin={}", margin));
            }
            if let Some(paper) = options.paper {
                push_variable(&mut args, "papersize", paper.latex_name());
            }
            if options.landscape == Some(true) {
                push_variable(&mut args, "geometry", "landscape");
            }
        }

        if let Some(size) = &options.font_size {
            push_variable(&mut args, "fontsize", size);
        }
        if let Some(font) = &options.main_font {
            push_variable(&mut args, "mainfont", font);
        }
        if let Some(font) = &options.sans_font {
            push_variable(&mut args, "sansfont", font);
        }
        if let Some(font) = &options.mono_font {
            push_variable(&mut args, "monofont", font);
        }
        for (key, value) in &options.variables {
            push_variable(&mut args, key, value);
        }

        if options.toc == Some(true) {
            args.push("--toc".into());
            if let Some(depth) = options.toc_depth {
                args.push(format!("--toc-depth={}", depth).into());
            }
        }
        if options.number_sections == Some(true) {
            args.push("--number-sections".into());
        }

        if job.format() == OutputFormat::Html {
            if options.standalone != Some(false) {
                args.push("--standalone".into());
            }
            for css in &options.stylesheets {
                let mut arg = OsString::from("--css=");
                arg.push(css.as_os_str());
                args.push(arg);
            }
        }

        args.extend(options.extra_args.iter().map(OsString::from));
        args
    }
}

fn push_variable(args: &mut Vec<OsString>, key: &str, value: &str) {
    args.push("--variable".into());
    args.push(format!("{}={}", key, value).into());
}

impl Converter for PandocConverter {
    fn name(&self) -> &str {
        PROGRAM
    }

    async fn probe(&self) -> Result<(), ConvertError> {
        let version = ToolCommand::new(&self.program).arg("--version").probe().await?;
        info!("✓ {}", version);

        if let Some(engine) = &self.probe_pdf_engine {
            let version = ToolCommand::new(engine).arg("--version").probe().await?;
            info!("✓ PDF 引擎: {}", version);
        }
        Ok(())
    }

    async fn convert(&self, job: &Job) -> Result<(), ConvertError> {
        let args = Self::build_args(job);
        debug!("{} 🔧 pandoc 参数: {:?}", job, args);

        ToolCommand::new(&self.program).args(args).run().await?;
        Ok(())
    }
}
